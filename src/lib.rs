#![forbid(unsafe_code)]

//!
//! The shadowroot-injector crate lets HTML authors declare a shadow root once,
//! as a `<template>` marker, and have it attached to every matching element
//! that later enters the document.
//!
//! ```html
//! <template sr-tagname="x-box" sr-mode="open">
//!     <p><slot></slot></p>
//! </template>
//!
//! <x-box>hi</x-box>
//! ```
//!
//! Two watchers observe structural changes below a root node. One registers
//! template markers in a [TemplateRegistry], the other materializes shadow
//! roots for inserted elements whose tag name has a registered definition.
//!
//! We abstract over the type of DOM we are targeting, see [Dom]. The `server` feature provides an in-memory
//! DOM, the `web` feature targets the browser through `web-sys`.
//!

use std::fmt;
use std::str::FromStr;

pub mod config;
pub mod definition;
pub mod detect;
pub mod error;
pub mod injector;
pub mod materialize;
pub mod prelude;
pub mod registry;
pub mod watcher;

#[cfg(feature = "server")]
pub mod server;
#[cfg(feature = "web")]
pub mod web;

pub use config::{Detection, InjectorConfig};
pub use definition::{ShadowRootOptions, TemplateDefinition};
pub use error::Error;
pub use injector::ShadowRootInjector;
pub use materialize::Injection;
pub use registry::TemplateRegistry;

///
/// "upcast" a DOM node of a specific type to its generic type
///
pub trait AsNode<D: Dom> {
    fn as_node(&self) -> &D::Node;
}

///
/// The DOM the injector operates on.
///
/// Most operations are plain associated functions on nodes. Only the
/// document-level operations, observing and finding the default root,
/// need an instance.
///
pub trait Dom: Sized + 'static {
    type Node: Clone;
    type Element: Clone + AsNode<Self>;

    /// An inert, cloneable piece of markup, e.g. the content of a `<template>`.
    type Fragment;
    type ShadowRoot;

    type Observer: Observer;

    /// The default observation scope.
    fn document_element(&self) -> Self::Node;

    /// Start delivering child-list mutations in the subtree of `root`.
    ///
    /// Records are delivered in batches, in the order the mutations happened.
    /// Delivery stops when the returned observer is disconnected or dropped.
    fn observe_child_list(
        &self,
        root: &Self::Node,
        callback: BatchCallback<Self>,
    ) -> Result<Self::Observer, Error>;

    fn as_element(node: &Self::Node) -> Option<Self::Element>;

    /// The element's tag name, in whatever case the DOM reports it.
    fn tag_name(element: &Self::Element) -> String;

    fn previous_sibling(node: &Self::Node) -> Option<Self::Node>;

    fn is_template(element: &Self::Element) -> bool;

    fn get_attribute(element: &Self::Element, name: &str) -> Option<String>;

    fn has_attribute(element: &Self::Element, name: &str) -> bool {
        Self::get_attribute(element, name).is_some()
    }

    fn set_attribute(element: &Self::Element, name: &str, value: &str) -> Result<(), Error>;

    fn remove_attribute(element: &Self::Element, name: &str);

    /// Deep clone, including template content.
    fn clone_element(element: &Self::Element) -> Result<Self::Element, Error>;

    /// The live content fragment of a template element.
    fn template_content(template: &Self::Element) -> Option<Self::Fragment>;

    fn clone_fragment(fragment: &Self::Fragment) -> Result<Self::Fragment, Error>;

    fn has_shadow_root(element: &Self::Element) -> bool;

    fn attach_shadow(
        element: &Self::Element,
        options: &ShadowRootOptions,
    ) -> Result<Self::ShadowRoot, Error>;

    /// Move the fragment's children to the end of the shadow root.
    fn append_fragment(shadow_root: &Self::ShadowRoot, fragment: Self::Fragment)
        -> Result<(), Error>;
}

pub type BatchCallback<D> = Box<dyn FnMut(&[MutationRecord<D>])>;

///
/// A live subscription to child-list mutations.
///
pub trait Observer {
    /// Stop delivery. Records queued but not yet delivered are dropped.
    fn disconnect(&mut self);
}

///
/// One child-list change below an observed root.
///
pub struct MutationRecord<D: Dom> {
    /// The node whose children changed.
    pub target: D::Node,
    pub added_nodes: Vec<D::Node>,
    pub removed_nodes: Vec<D::Node>,
}

impl<D: Dom> Clone for MutationRecord<D> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            added_nodes: self.added_nodes.clone(),
            removed_nodes: self.removed_nodes.clone(),
        }
    }
}

///
/// Whether a shadow root's internals are reachable from outside its host.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShadowRootMode {
    Open,
    Closed,
}

impl ShadowRootMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for ShadowRootMode {
    type Err = Error;

    /// Enumerated attribute semantics: ASCII case-insensitive, no trimming.
    fn from_str(value: &str) -> Result<Self, Error> {
        if value.eq_ignore_ascii_case("open") {
            Ok(Self::Open)
        } else if value.eq_ignore_ascii_case("closed") {
            Ok(Self::Closed)
        } else {
            Err(Error::InvalidMode(value.to_string()))
        }
    }
}

impl fmt::Display for ShadowRootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// A tag name canonicalized to ASCII uppercase, the way HTML documents
/// report `tagName`. Registration and lookup both go through this type,
/// so matching is case-insensitive.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagName(String);

impl TagName {
    pub fn new(tag_name: &str) -> Self {
        Self(tag_name.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TagName {
    fn from(tag_name: &str) -> Self {
        Self::new(tag_name)
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
