//!
//! The browser DOM, through `web-sys`.
//!

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::InjectorConfig;
use crate::definition::ShadowRootOptions;
use crate::error::Error;
use crate::injector::ShadowRootInjector;
use crate::{AsNode, BatchCallback, Dom, ShadowRootMode};

mod observer;

pub use observer::WebObserver;

pub struct WebDom {
    document: web_sys::Document,
}

impl WebDom {
    pub fn new() -> Result<Self, Error> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| Error::Js("no document available".to_string()))?;

        Ok(Self { document })
    }

    pub fn from_document(document: web_sys::Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }

    /// Whether the running script, or any script in the document, carries `attribute`.
    pub fn has_autostart_script(&self, attribute: &str) -> bool {
        if let Some(script) = self.document.current_script() {
            if script.has_attribute(attribute) {
                return true;
            }
        }

        matches!(
            self.document.query_selector(&format!("script[{}]", attribute)),
            Ok(Some(_))
        )
    }
}

impl AsNode<WebDom> for web_sys::Element {
    #[inline]
    fn as_node(&self) -> &web_sys::Node {
        self
    }
}

impl From<ShadowRootMode> for web_sys::ShadowRootMode {
    fn from(mode: ShadowRootMode) -> Self {
        match mode {
            ShadowRootMode::Open => web_sys::ShadowRootMode::Open,
            ShadowRootMode::Closed => web_sys::ShadowRootMode::Closed,
        }
    }
}

impl Dom for WebDom {
    type Node = web_sys::Node;
    type Element = web_sys::Element;
    type Fragment = web_sys::DocumentFragment;
    type ShadowRoot = web_sys::ShadowRoot;
    type Observer = WebObserver;

    fn document_element(&self) -> web_sys::Node {
        match self.document.document_element() {
            Some(element) => element.into(),
            None => self.document.clone().into(),
        }
    }

    fn observe_child_list(
        &self,
        root: &web_sys::Node,
        callback: BatchCallback<Self>,
    ) -> Result<WebObserver, Error> {
        WebObserver::observe(root, callback)
    }

    fn as_element(node: &web_sys::Node) -> Option<web_sys::Element> {
        node.dyn_ref::<web_sys::Element>().cloned()
    }

    fn tag_name(element: &web_sys::Element) -> String {
        element.tag_name()
    }

    fn previous_sibling(node: &web_sys::Node) -> Option<web_sys::Node> {
        node.previous_sibling()
    }

    fn is_template(element: &web_sys::Element) -> bool {
        element.is_instance_of::<web_sys::HtmlTemplateElement>()
    }

    fn get_attribute(element: &web_sys::Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn has_attribute(element: &web_sys::Element, name: &str) -> bool {
        element.has_attribute(name)
    }

    fn set_attribute(element: &web_sys::Element, name: &str, value: &str) -> Result<(), Error> {
        Ok(element.set_attribute(name, value)?)
    }

    fn remove_attribute(element: &web_sys::Element, name: &str) {
        if let Err(error) = element.remove_attribute(name) {
            tracing::warn!(name, error = %Error::from(error), "failed to remove attribute");
        }
    }

    fn clone_element(element: &web_sys::Element) -> Result<web_sys::Element, Error> {
        element
            .clone_node_with_deep(true)?
            .dyn_into::<web_sys::Element>()
            .map_err(|_| Error::NotAnElement)
    }

    fn template_content(template: &web_sys::Element) -> Option<web_sys::DocumentFragment> {
        template
            .dyn_ref::<web_sys::HtmlTemplateElement>()
            .map(|template| template.content())
    }

    fn clone_fragment(
        fragment: &web_sys::DocumentFragment,
    ) -> Result<web_sys::DocumentFragment, Error> {
        fragment
            .clone_node_with_deep(true)?
            .dyn_into::<web_sys::DocumentFragment>()
            .map_err(|_| Error::MissingContent)
    }

    /// Closed shadow roots are not visible here. Attaching to their hosts
    /// again fails in the browser, which the injector treats as a no-op.
    fn has_shadow_root(element: &web_sys::Element) -> bool {
        element.shadow_root().is_some()
    }

    fn attach_shadow(
        element: &web_sys::Element,
        options: &ShadowRootOptions,
    ) -> Result<web_sys::ShadowRoot, Error> {
        let init = web_sys::ShadowRootInit::new(options.mode.into());
        init.set_delegates_focus(options.delegates_focus);

        // Not every web-sys version exposes these as setters
        js_sys::Reflect::set(&init, &"clonable".into(), &options.clonable.into())?;
        js_sys::Reflect::set(&init, &"serializable".into(), &options.serializable.into())?;

        Ok(element.attach_shadow(&init)?)
    }

    fn append_fragment(
        shadow_root: &web_sys::ShadowRoot,
        fragment: web_sys::DocumentFragment,
    ) -> Result<(), Error> {
        shadow_root.append_child(&fragment)?;
        Ok(())
    }
}

impl From<JsValue> for Error {
    fn from(js_error: JsValue) -> Self {
        let message = js_error
            .dyn_ref::<js_sys::Error>()
            .map(|error| String::from(error.message()))
            .or_else(|| js_error.as_string())
            .unwrap_or_else(|| format!("{:?}", js_error));

        Error::Js(message)
    }
}

thread_local! {
    static GLOBAL_INJECTOR: RefCell<Option<ShadowRootInjector<WebDom>>> = RefCell::new(None);
}

///
/// Start a document-wide injector if a script carries the autostart
/// attribute, e.g. `<script src="..." sr-autostart></script>`.
///
/// The injector is kept for the lifetime of the thread and can be reached
/// through [with_global_injector]. Returns whether an injector was started.
///
pub fn autostart() -> Result<bool, Error> {
    let dom = WebDom::new()?;
    let config = InjectorConfig::default();

    if !dom.has_autostart_script(&config.autostart_attribute) {
        return Ok(false);
    }

    let mut injector = ShadowRootInjector::with_config(dom, config);
    injector.start(None)?;

    GLOBAL_INJECTOR.with(|global| *global.borrow_mut() = Some(injector));
    tracing::debug!("autostarted global injector");

    Ok(true)
}

pub fn with_global_injector<R>(
    func: impl FnOnce(Option<&mut ShadowRootInjector<WebDom>>) -> R,
) -> R {
    GLOBAL_INJECTOR.with(|global| func(global.borrow_mut().as_mut()))
}
