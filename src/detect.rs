//!
//! Finding template markers among inserted nodes.
//!
//! A marker is a `<template>` carrying both the mode attribute and the
//! tag name attribute. Which nodes are inspected for each insertion is
//! up to the [MarkerDetection] strategy.
//!

use crate::config::InjectorConfig;
use crate::Dom;

pub trait MarkerDetection<D: Dom> {
    /// Marker elements to register because `added` was inserted.
    fn detect(&self, added: &D::Node, config: &InjectorConfig) -> Vec<D::Element>;
}

pub fn is_marker<D: Dom>(element: &D::Element, config: &InjectorConfig) -> bool {
    D::is_template(element)
        && D::has_attribute(element, &config.mode_attribute)
        && D::has_attribute(element, &config.tag_name_attribute)
}

fn marker_at<D: Dom>(node: Option<D::Node>, config: &InjectorConfig) -> Option<D::Element> {
    node.as_ref()
        .and_then(D::as_element)
        .filter(|element| is_marker::<D>(element, config))
}

///
/// Inspect only the previous sibling of the inserted node.
///
/// Markup is usually parsed in chunks, and the node following a marker
/// (typically whitespace text) is what gets reported as inserted. A marker
/// without a following sibling is therefore never detected.
///
pub struct PreviousSibling;

impl<D: Dom> MarkerDetection<D> for PreviousSibling {
    fn detect(&self, added: &D::Node, config: &InjectorConfig) -> Vec<D::Element> {
        marker_at::<D>(D::previous_sibling(added), config)
            .into_iter()
            .collect()
    }
}

///
/// Like [PreviousSibling], but the inserted node is a candidate as well.
///
pub struct InsertedOrPreviousSibling;

impl<D: Dom> MarkerDetection<D> for InsertedOrPreviousSibling {
    fn detect(&self, added: &D::Node, config: &InjectorConfig) -> Vec<D::Element> {
        marker_at::<D>(D::previous_sibling(added), config)
            .into_iter()
            .chain(marker_at::<D>(Some(added.clone()), config))
            .collect()
    }
}
