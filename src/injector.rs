use std::rc::Rc;

use crate::config::InjectorConfig;
use crate::detect::MarkerDetection;
use crate::error::Error;
use crate::materialize::{self, Injection};
use crate::registry::TemplateRegistry;
use crate::watcher::{DefinitionHandler, DefinitionWatcher, InjectionHandler, InjectionWatcher};
use crate::{Dom, TagName};

///
/// Owns the registry and both watchers.
///
/// Stopping disconnects both watchers but keeps registered definitions
/// and attached shadow roots. Starting again resumes with that state.
///
/// A definition registered after a matching element was inserted does
/// not reach back to that element; only later insertions are injected.
///
pub struct ShadowRootInjector<D: Dom> {
    dom: D,
    config: Rc<InjectorConfig>,
    registry: TemplateRegistry<D>,
    definitions: DefinitionWatcher<D>,
    injections: InjectionWatcher<D>,
}

impl<D: Dom> ShadowRootInjector<D> {
    pub fn new(dom: D) -> Self {
        Self::with_config(dom, InjectorConfig::default())
    }

    pub fn with_config(dom: D, config: InjectorConfig) -> Self {
        let detection = config.detection.strategy::<D>();
        Self::with_detection(dom, config, detection)
    }

    /// Use a custom marker detection strategy instead of `config.detection`.
    pub fn with_detection(
        dom: D,
        config: InjectorConfig,
        detection: Rc<dyn MarkerDetection<D>>,
    ) -> Self {
        let config = Rc::new(config);
        let registry = TemplateRegistry::new();

        Self {
            dom,
            definitions: DefinitionWatcher::new(DefinitionHandler::new(
                registry.clone(),
                config.clone(),
                detection,
            )),
            injections: InjectionWatcher::new(InjectionHandler::new(registry.clone())),
            config,
            registry,
        }
    }

    ///
    /// Begin observing `root` and all of its descendants, or the document
    /// element when no root is given.
    ///
    /// Calling this while already running does nothing.
    ///
    pub fn start(&mut self, root: Option<&D::Node>) -> Result<(), Error> {
        if self.is_running() {
            tracing::debug!("injector already running");
            return Ok(());
        }

        let root = match root {
            Some(root) => root.clone(),
            None => self.dom.document_element(),
        };

        // Observers are notified in creation order where the DOM defines one,
        // so definitions see each batch before injections do.
        self.definitions.watch(&self.dom, &root)?;
        if let Err(error) = self.injections.watch(&self.dom, &root) {
            self.definitions.unwatch();
            return Err(error);
        }

        tracing::debug!(registered = self.registry.len(), "injector started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }

        self.definitions.unwatch();
        self.injections.unwatch();

        tracing::debug!("injector stopped");
    }

    pub fn is_running(&self) -> bool {
        self.definitions.is_watching() || self.injections.is_watching()
    }

    /// Register a marker built by hand rather than found in the document.
    pub fn register_template_definition(&self, marker: &D::Element) -> Option<TagName> {
        self.registry.register_marker(marker, &self.config)
    }

    /// Materialize the registered template for an element, at most once.
    pub fn inject_registered_template(&self, host: &D::Element) -> Injection {
        materialize::inject(&self.registry, host)
    }

    pub fn registry(&self) -> &TemplateRegistry<D> {
        &self.registry
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }
}

impl<D: Dom> Drop for ShadowRootInjector<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
