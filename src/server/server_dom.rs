use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::observer::{ObserverShared, Registration};
use crate::definition::{
    ShadowRootOptions, SHADOWROOTCLONABLE, SHADOWROOTDELEGATESFOCUS, SHADOWROOTMODE,
    SHADOWROOTSERIALIZABLE,
};
use crate::error::Error;
use crate::{MutationRecord, ShadowRootMode};

pub type RcNode = Rc<Node>;

/// Elements other than autonomous custom elements that may host a shadow root.
const SHADOW_HOST_ELEMENTS: [&str; 18] = [
    "article",
    "aside",
    "blockquote",
    "body",
    "div",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "main",
    "nav",
    "p",
    "section",
    "span",
];

/// Hyphenated names that are not valid custom element names.
const RESERVED_NAMES: [&str; 8] = [
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

pub struct Node {
    pub kind: NodeKind,

    links: RefCell<Links>,
    registrations: RefCell<Vec<Registration>>,
}

pub enum NodeKind {
    Text(RefCell<String>),
    Element(Element),
    Fragment,
    ShadowRoot {
        options: ShadowRootOptions,
        host: Weak<Node>,
    },
}

pub struct Element {
    tag_name: String,
    attributes: RefCell<Vec<(String, String)>>,
    shadow_root: RefCell<Option<RcNode>>,

    /// Inert contents, only present on `<template>`
    content: Option<RcNode>,
}

#[derive(Default)]
struct Links {
    pub parent: Option<Weak<Node>>,

    pub next_sibling: Option<RcNode>,
    pub prev_sibling: Option<Weak<Node>>,

    pub first_child: Option<RcNode>,
    pub last_child: Option<Weak<Node>>,
}

impl Node {
    fn new(kind: NodeKind) -> RcNode {
        Rc::new(Node {
            kind,
            links: RefCell::new(Links::default()),
            registrations: RefCell::new(vec![]),
        })
    }

    pub fn is(&self, other: &Node) -> bool {
        self as *const _ == other as *const _
    }

    pub fn create_element(tag_name: &str) -> RcNode {
        let content = if tag_name.eq_ignore_ascii_case("template") {
            Some(Node::create_fragment())
        } else {
            None
        };

        Node::new(NodeKind::Element(Element {
            tag_name: tag_name.to_string(),
            attributes: RefCell::new(vec![]),
            shadow_root: RefCell::new(None),
            content,
        }))
    }

    pub fn create_text(text: String) -> RcNode {
        Node::new(NodeKind::Text(RefCell::new(text)))
    }

    pub fn create_fragment() -> RcNode {
        Node::new(NodeKind::Fragment)
    }

    fn element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        self.element().is_some()
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.kind, NodeKind::Fragment)
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.element().map(|element| element.tag_name.as_str())
    }

    pub fn is_template(&self) -> bool {
        self.element()
            .map_or(false, |element| element.content.is_some())
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.element()?
            .attributes
            .borrow()
            .iter()
            .find(|(attribute, _)| attribute.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    /// Attribute names are stored lowercase. Does nothing on non-elements.
    pub fn set_attribute(&self, name: &str, value: &str) {
        if let Some(element) = self.element() {
            let name = name.to_ascii_lowercase();
            let mut attributes = element.attributes.borrow_mut();

            match attributes.iter_mut().find(|(attribute, _)| *attribute == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attributes.push((name, value.to_string())),
            }
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let Some(element) = self.element() {
            element
                .attributes
                .borrow_mut()
                .retain(|(attribute, _)| !attribute.eq_ignore_ascii_case(name));
        }
    }

    pub fn set_text(&self, text: &str) {
        match &self.kind {
            NodeKind::Text(self_text) => {
                *self_text.borrow_mut() = text.to_string();
            }
            _ => {
                tracing::warn!("tried to set text on something which is not a text node");
            }
        }
    }

    /// Concatenated text of all descendant text nodes, not looking into shadow trees.
    pub fn text_content(&self) -> String {
        match &self.kind {
            NodeKind::Text(text) => text.borrow().clone(),
            _ => self
                .children()
                .iter()
                .map(|child| child.text_content())
                .collect(),
        }
    }

    pub fn template_content(&self) -> Option<RcNode> {
        self.element()?.content.clone()
    }

    pub fn shadow_root(&self) -> Option<RcNode> {
        self.element()?.shadow_root.borrow().clone()
    }

    pub fn shadow_root_options(&self) -> Option<ShadowRootOptions> {
        match &self.kind {
            NodeKind::ShadowRoot { options, .. } => Some(*options),
            _ => None,
        }
    }

    pub fn shadow_root_mode(&self) -> Option<ShadowRootMode> {
        self.shadow_root_options().map(|options| options.mode)
    }

    /// The host of a shadow root.
    pub fn host(&self) -> Option<RcNode> {
        match &self.kind {
            NodeKind::ShadowRoot { host, .. } => host.upgrade(),
            _ => None,
        }
    }

    pub fn is_valid_shadow_host(&self) -> bool {
        match self.tag_name() {
            Some(tag_name) => {
                let tag_name = tag_name.to_ascii_lowercase();
                SHADOW_HOST_ELEMENTS.contains(&tag_name.as_str())
                    || is_valid_custom_element_name(&tag_name)
            }
            None => false,
        }
    }

    pub fn attach_shadow(self: &Rc<Self>, options: ShadowRootOptions) -> Result<RcNode, Error> {
        let element = self.element().ok_or(Error::NotAnElement)?;

        if !self.is_valid_shadow_host() {
            return Err(Error::InvalidShadowHost(element.tag_name.clone()));
        }

        let mut shadow_root = element.shadow_root.borrow_mut();
        if shadow_root.is_some() {
            return Err(Error::ShadowRootExists);
        }

        let root = Node::new(NodeKind::ShadowRoot {
            options,
            host: Rc::downgrade(self),
        });
        *shadow_root = Some(root.clone());

        Ok(root)
    }

    pub fn parent(&self) -> Option<RcNode> {
        self.links
            .borrow()
            .parent
            .as_ref()
            .and_then(|parent| parent.upgrade())
    }

    pub fn first_child(&self) -> Option<RcNode> {
        self.links.borrow().first_child.clone()
    }

    pub fn last_child(&self) -> Option<RcNode> {
        self.links
            .borrow()
            .last_child
            .as_ref()
            .and_then(|weak| weak.upgrade())
    }

    pub fn next_sibling(&self) -> Option<RcNode> {
        self.links.borrow().next_sibling.clone()
    }

    pub fn prev_sibling(&self) -> Option<RcNode> {
        self.links
            .borrow()
            .prev_sibling
            .as_ref()
            .and_then(|weak| weak.upgrade())
    }

    pub fn children(&self) -> Vec<RcNode> {
        let mut children = vec![];
        let mut next = self.first_child();

        while let Some(child) = next {
            next = child.next_sibling();
            children.push(child);
        }

        children
    }

    pub fn append_child(self: &Rc<Self>, child: RcNode) -> Result<RcNode, Error> {
        self.insert_before(child, None)
    }

    ///
    /// Insert `child` before `reference`, or last when there is no reference.
    ///
    /// A fragment is emptied into this node, producing one record for all of
    /// its children. A node that already has a parent is removed from it first.
    ///
    pub fn insert_before(
        self: &Rc<Self>,
        child: RcNode,
        reference: Option<RcNode>,
    ) -> Result<RcNode, Error> {
        self.ensure_pre_insertion_validity(&child, reference.as_ref())?;

        let reference = match reference {
            Some(reference) if reference.is(&child) => child.next_sibling(),
            reference => reference,
        };

        let nodes = if child.is_fragment() {
            let nodes = child.children();
            for node in &nodes {
                node.detach();
            }
            nodes
        } else {
            child.remove();
            vec![child.clone()]
        };

        if nodes.is_empty() {
            return Ok(child);
        }

        for node in &nodes {
            self.link_before(node, reference.as_ref());
        }
        self.queue_child_list(nodes, vec![]);

        Ok(child)
    }

    pub fn remove_child(self: &Rc<Self>, child: &RcNode) -> Result<RcNode, Error> {
        match child.parent() {
            Some(parent) if parent.is(self) => {
                child.remove();
                Ok(child.clone())
            }
            _ => Err(Error::NotFound),
        }
    }

    /// Remove from the current parent, if any.
    pub fn remove(self: &Rc<Self>) {
        if let Some(parent) = self.detach() {
            parent.queue_child_list(vec![], vec![self.clone()]);
        }
    }

    fn ensure_pre_insertion_validity(
        self: &Rc<Self>,
        child: &RcNode,
        reference: Option<&RcNode>,
    ) -> Result<(), Error> {
        if matches!(self.kind, NodeKind::Text(_))
            || matches!(child.kind, NodeKind::ShadowRoot { .. })
        {
            return Err(Error::HierarchyRequest);
        }

        // child must not be a host-including inclusive ancestor of self
        let mut ancestor = Some(self.clone());
        while let Some(node) = ancestor {
            if node.is(child) {
                return Err(Error::HierarchyRequest);
            }
            ancestor = node.parent().or_else(|| node.host());
        }

        match reference {
            Some(reference) if !reference.parent().map_or(false, |parent| parent.is(self)) => {
                Err(Error::NotFound)
            }
            _ => Ok(()),
        }
    }

    /// Link a detached node into the child list, without notifying observers.
    pub(super) fn link_before(self: &Rc<Self>, child: &RcNode, reference: Option<&RcNode>) {
        let mut parent_links = self.links.borrow_mut();
        let mut child_links = child.links.borrow_mut();

        child_links.parent = Some(Rc::downgrade(self));

        if let Some(reference) = reference {
            // Set up next sibling owned pointer
            child_links.next_sibling = Some(reference.clone());

            let mut next_links = reference.links.borrow_mut();

            match next_links.prev_sibling.take().and_then(|prev| prev.upgrade()) {
                // first child
                None => {
                    parent_links.first_child = Some(child.clone());
                }
                // not first
                Some(old_prev) => {
                    old_prev.links.borrow_mut().next_sibling = Some(child.clone());
                    child_links.prev_sibling = Some(Rc::downgrade(&old_prev));
                }
            }

            next_links.prev_sibling = Some(Rc::downgrade(child));
        } else {
            // Append
            match parent_links.last_child.take().and_then(|last| last.upgrade()) {
                Some(last_child) => {
                    child_links.prev_sibling = Some(Rc::downgrade(&last_child));
                    last_child.links.borrow_mut().next_sibling = Some(child.clone());
                }
                None => {
                    // Add the first child
                    parent_links.first_child = Some(child.clone());
                }
            }

            parent_links.last_child = Some(Rc::downgrade(child));
        }
    }

    /// Unlink from current child list, without notifying observers.
    /// Returns the former parent.
    fn detach(&self) -> Option<RcNode> {
        let mut self_links = self.links.borrow_mut();
        let parent = self_links.parent.take()?.upgrade();

        let prev = self_links.prev_sibling.take().and_then(|prev| prev.upgrade());
        let next = self_links.next_sibling.take();

        let parent = parent?;
        let mut parent_links = parent.links.borrow_mut();

        match (prev, next) {
            // only child:
            (None, None) => {
                parent_links.last_child = None;
                parent_links.first_child = None;
            }
            // first child:
            (None, Some(next)) => {
                next.links.borrow_mut().prev_sibling = None;
                parent_links.first_child = Some(next);
            }
            // last child:
            (Some(prev), None) => {
                prev.links.borrow_mut().next_sibling = None;
                parent_links.last_child = Some(Rc::downgrade(&prev));
            }
            // internal child:
            (Some(prev), Some(next)) => {
                next.links.borrow_mut().prev_sibling = Some(Rc::downgrade(&prev));
                prev.links.borrow_mut().next_sibling = Some(next);
            }
        }

        drop(parent_links);
        Some(parent)
    }

    ///
    /// Deep clone. Template content is cloned along, shadow roots only
    /// when they were attached as clonable. Observers are not.
    ///
    pub fn deep_clone(&self) -> RcNode {
        let clone = match &self.kind {
            NodeKind::Text(text) => Node::create_text(text.borrow().clone()),
            NodeKind::Element(element) => {
                let clone = Node::new(NodeKind::Element(Element {
                    tag_name: element.tag_name.clone(),
                    attributes: RefCell::new(element.attributes.borrow().clone()),
                    shadow_root: RefCell::new(None),
                    content: element.content.as_ref().map(|content| content.deep_clone()),
                }));

                if let Some(shadow_root) = self.shadow_root() {
                    match shadow_root.shadow_root_options() {
                        Some(options) if options.clonable => {
                            if let Ok(cloned_root) = clone.attach_shadow(options) {
                                for child in shadow_root.children() {
                                    cloned_root.link_before(&child.deep_clone(), None);
                                }
                            }
                        }
                        _ => {}
                    }
                }

                clone
            }
            NodeKind::Fragment | NodeKind::ShadowRoot { .. } => Node::create_fragment(),
        };

        for child in self.children() {
            clone.link_before(&child.deep_clone(), None);
        }

        clone
    }

    pub(super) fn register_observer(&self, registration: Registration) {
        self.registrations.borrow_mut().push(registration);
    }

    pub(super) fn unregister_observer(&self, observer: &Rc<ObserverShared>) {
        self.registrations
            .borrow_mut()
            .retain(|registration| registration.observer.as_ptr() != Rc::as_ptr(observer));
    }

    /// Queue a child-list record for every observer interested in this node.
    fn queue_child_list(self: &Rc<Self>, added_nodes: Vec<RcNode>, removed_nodes: Vec<RcNode>) {
        let mut interested: Vec<Rc<ObserverShared>> = vec![];
        let mut is_target = true;
        let mut next = Some(self.clone());

        // Shadow roots have no parent, so shadow trees stay invisible
        // to observers of the host's tree
        while let Some(node) = next {
            for registration in node.registrations.borrow().iter() {
                if !is_target && !registration.subtree {
                    continue;
                }
                if let Some(observer) = registration.observer.upgrade() {
                    if !interested.iter().any(|other| Rc::ptr_eq(other, &observer)) {
                        interested.push(observer);
                    }
                }
            }

            is_target = false;
            next = node.parent();
        }

        for observer in interested {
            observer.enqueue(MutationRecord {
                target: self.clone(),
                added_nodes: added_nodes.clone(),
                removed_nodes: removed_nodes.clone(),
            });
        }
    }
}

fn is_valid_custom_element_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase())
        && name.contains('-')
        && !name.chars().any(|c| c.is_ascii_uppercase())
        && !RESERVED_NAMES.contains(&name)
}

impl Drop for Node {
    // Unlink all the nodes in the direct child list
    fn drop(&mut self) {
        let mut next_sibling = {
            let self_links = self.links.borrow_mut();
            self_links.first_child.clone()
        };

        while let Some(sibling) = next_sibling.take() {
            next_sibling = {
                let mut links = sibling.links.borrow_mut();

                links.parent = None;
                links.prev_sibling = None;
                links.next_sibling.take()
            }
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str, attribute: bool) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '<' if !attribute => f.write_str("&lt;")?,
            '>' if !attribute => f.write_str("&gt;")?,
            '"' if attribute => f.write_str("&quot;")?,
            c => write!(f, "{}", c)?,
        }
    }
    Ok(())
}

fn write_children(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    let mut child = node.first_child();

    while let Some(current) = child {
        write!(f, "{}", current)?;
        child = current.next_sibling();
    }

    Ok(())
}

/// A shadow root is written as a declarative shadow root, the first child of its host.
fn write_shadow_root(f: &mut fmt::Formatter<'_>, shadow_root: &Node) -> fmt::Result {
    write!(f, "<template {}=\"", SHADOWROOTMODE)?;
    if let Some(options) = shadow_root.shadow_root_options() {
        f.write_str(options.mode.as_str())?;
        f.write_str("\"")?;

        for (flag, name) in [
            (options.delegates_focus, SHADOWROOTDELEGATESFOCUS),
            (options.clonable, SHADOWROOTCLONABLE),
            (options.serializable, SHADOWROOTSERIALIZABLE),
        ] {
            if flag {
                write!(f, " {}=\"\"", name)?;
            }
        }
    }
    f.write_str(">")?;
    write_children(f, shadow_root)?;
    f.write_str("</template>")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Element(element) => {
                write!(f, "<{}", element.tag_name)?;
                for (name, value) in element.attributes.borrow().iter() {
                    write!(f, " {}=\"", name)?;
                    write_escaped(f, value, true)?;
                    f.write_str("\"")?;
                }

                let shadow_root = element.shadow_root.borrow().clone();
                let content = element.content.as_ref();

                if self.first_child().is_none()
                    && shadow_root.is_none()
                    && content.map_or(true, |content| content.first_child().is_none())
                {
                    return f.write_str("/>");
                }

                f.write_str(">")?;
                if let Some(shadow_root) = shadow_root {
                    write_shadow_root(f, &shadow_root)?;
                }
                if let Some(content) = content {
                    write_children(f, content)?;
                }
                write_children(f, self)?;
                write!(f, "</{}>", element.tag_name)
            }
            NodeKind::Text(text) => write_escaped(f, text.borrow().as_str(), false),
            NodeKind::Fragment | NodeKind::ShadowRoot { .. } => write_children(f, self),
        }
    }
}
