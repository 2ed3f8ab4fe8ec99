use std::rc::Rc;

use crate::detect::{InsertedOrPreviousSibling, MarkerDetection, PreviousSibling};
use crate::Dom;

/// Attribute on a `<template>` naming the encapsulation mode of the shadow root.
pub const MODE_ATTRIBUTE: &str = "sr-mode";

/// Attribute on a `<template>` naming the custom element it applies to.
pub const TAG_NAME_ATTRIBUTE: &str = "sr-tagname";

/// Attribute on a `<script>` requesting a global injector at load time.
pub const AUTOSTART_ATTRIBUTE: &str = "sr-autostart";

///
/// How newly inserted nodes are checked for template markers.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Detection {
    /// Only the previous sibling of each inserted node is inspected.
    /// A marker inserted as the last child of its parent is never seen.
    #[default]
    PreviousSibling,

    /// The inserted node itself is inspected too, so trailing markers
    /// register as well.
    InsertedOrPreviousSibling,
}

impl Detection {
    pub fn strategy<D: Dom>(self) -> Rc<dyn MarkerDetection<D>> {
        match self {
            Self::PreviousSibling => Rc::new(PreviousSibling),
            Self::InsertedOrPreviousSibling => Rc::new(InsertedOrPreviousSibling),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectorConfig {
    pub mode_attribute: String,
    pub tag_name_attribute: String,
    pub autostart_attribute: String,
    pub detection: Detection,
}

impl InjectorConfig {
    pub fn with_mode_attribute(mut self, name: impl Into<String>) -> Self {
        self.mode_attribute = name.into();
        self
    }

    pub fn with_tag_name_attribute(mut self, name: impl Into<String>) -> Self {
        self.tag_name_attribute = name.into();
        self
    }

    pub fn with_autostart_attribute(mut self, name: impl Into<String>) -> Self {
        self.autostart_attribute = name.into();
        self
    }

    pub fn with_detection(mut self, detection: Detection) -> Self {
        self.detection = detection;
        self
    }
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            mode_attribute: MODE_ATTRIBUTE.to_string(),
            tag_name_attribute: TAG_NAME_ATTRIBUTE.to_string(),
            autostart_attribute: AUTOSTART_ATTRIBUTE.to_string(),
            detection: Detection::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_sr_attributes() {
        let config = InjectorConfig::default();
        assert_eq!(config.mode_attribute, "sr-mode");
        assert_eq!(config.tag_name_attribute, "sr-tagname");
        assert_eq!(config.autostart_attribute, "sr-autostart");
        assert_eq!(config.detection, Detection::PreviousSibling);
    }

    #[test]
    fn builders_override_fields() {
        let config = InjectorConfig::default()
            .with_mode_attribute("data-mode")
            .with_tag_name_attribute("data-tag")
            .with_detection(Detection::InsertedOrPreviousSibling);

        assert_eq!(config.mode_attribute, "data-mode");
        assert_eq!(config.tag_name_attribute, "data-tag");
        assert_eq!(config.detection, Detection::InsertedOrPreviousSibling);
    }
}
