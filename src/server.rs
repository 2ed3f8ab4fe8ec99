//!
//! An in-memory DOM.
//!
//! Mutation records are queued as the tree changes and delivered on
//! [ServerDom::flush], which stands in for the microtask checkpoint of a
//! browser. Everything that happens between two flushes is one batch.
//!

use std::rc::Rc;

use crate::definition::ShadowRootOptions;
use crate::error::Error;
use crate::{AsNode, BatchCallback, Dom};

mod observer;
mod server_dom;

pub use observer::ServerObserver;
pub use server_dom::{Node, NodeKind, RcNode};

use observer::DocumentShared;

impl AsNode<ServerDom> for RcNode {
    #[inline]
    fn as_node(&self) -> &RcNode {
        self
    }
}

pub struct ServerDom {
    document_element: RcNode,
    body: RcNode,
    shared: Rc<DocumentShared>,
}

impl ServerDom {
    /// A document consisting of `<html><body/></html>`.
    pub fn new() -> Self {
        let document_element = Node::create_element("html");
        let body = Node::create_element("body");
        document_element.link_before(&body, None);

        Self {
            document_element,
            body,
            shared: Rc::new(DocumentShared::new()),
        }
    }

    pub fn body(&self) -> RcNode {
        self.body.clone()
    }

    /// Deliver all pending mutation records.
    pub fn flush(&self) {
        self.shared.flush();
    }

    pub fn render(&self) -> String {
        self.document_element.to_string()
    }
}

impl Default for ServerDom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom for ServerDom {
    type Node = RcNode;
    type Element = RcNode;
    type Fragment = RcNode;
    type ShadowRoot = RcNode;
    type Observer = ServerObserver;

    fn document_element(&self) -> RcNode {
        self.document_element.clone()
    }

    fn observe_child_list(
        &self,
        root: &RcNode,
        callback: BatchCallback<Self>,
    ) -> Result<ServerObserver, Error> {
        Ok(self.shared.observe(root, callback))
    }

    fn as_element(node: &RcNode) -> Option<RcNode> {
        if node.is_element() {
            Some(node.clone())
        } else {
            None
        }
    }

    /// Uppercase, like `tagName` in an HTML document.
    fn tag_name(element: &RcNode) -> String {
        element
            .tag_name()
            .map(str::to_ascii_uppercase)
            .unwrap_or_default()
    }

    fn previous_sibling(node: &RcNode) -> Option<RcNode> {
        node.prev_sibling()
    }

    fn is_template(element: &RcNode) -> bool {
        element.is_template()
    }

    fn get_attribute(element: &RcNode, name: &str) -> Option<String> {
        element.attribute(name)
    }

    fn set_attribute(element: &RcNode, name: &str, value: &str) -> Result<(), Error> {
        if !element.is_element() {
            return Err(Error::NotAnElement);
        }
        element.set_attribute(name, value);
        Ok(())
    }

    fn remove_attribute(element: &RcNode, name: &str) {
        element.remove_attribute(name);
    }

    fn clone_element(element: &RcNode) -> Result<RcNode, Error> {
        if !element.is_element() {
            return Err(Error::NotAnElement);
        }
        Ok(element.deep_clone())
    }

    fn template_content(template: &RcNode) -> Option<RcNode> {
        template.template_content()
    }

    fn clone_fragment(fragment: &RcNode) -> Result<RcNode, Error> {
        Ok(fragment.deep_clone())
    }

    fn has_shadow_root(element: &RcNode) -> bool {
        element.shadow_root().is_some()
    }

    fn attach_shadow(element: &RcNode, options: &ShadowRootOptions) -> Result<RcNode, Error> {
        element.attach_shadow(*options)
    }

    fn append_fragment(shadow_root: &RcNode, fragment: RcNode) -> Result<(), Error> {
        shadow_root.append_child(fragment).map(|_| ())
    }
}
