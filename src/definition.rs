use crate::config::InjectorConfig;
use crate::error::Error;
use crate::{Dom, ShadowRootMode, TagName};

/// Declarative shadow DOM attributes. A registered template carries these,
/// so the stored clone has the same shape as a parsed declarative shadow root.
pub const SHADOWROOTMODE: &str = "shadowrootmode";
pub const SHADOWROOTDELEGATESFOCUS: &str = "shadowrootdelegatesfocus";
pub const SHADOWROOTCLONABLE: &str = "shadowrootclonable";
pub const SHADOWROOTSERIALIZABLE: &str = "shadowrootserializable";

///
/// Everything `attachShadow` needs to know.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowRootOptions {
    pub mode: ShadowRootMode,
    pub delegates_focus: bool,
    pub clonable: bool,
    pub serializable: bool,
}

impl ShadowRootOptions {
    pub fn new(mode: ShadowRootMode) -> Self {
        Self {
            mode,
            delegates_focus: false,
            clonable: false,
            serializable: false,
        }
    }

    /// Read the boolean declarative attributes of a template.
    fn read<D: Dom>(template: &D::Element, mode: ShadowRootMode) -> Self {
        Self {
            mode,
            delegates_focus: D::has_attribute(template, SHADOWROOTDELEGATESFOCUS),
            clonable: D::has_attribute(template, SHADOWROOTCLONABLE),
            serializable: D::has_attribute(template, SHADOWROOTSERIALIZABLE),
        }
    }
}

///
/// A template registered for one tag name.
///
/// Never mutated after creation. Registering the same tag name again
/// replaces the whole definition.
///
pub struct TemplateDefinition<D: Dom> {
    tag_name: TagName,
    options: ShadowRootOptions,

    /// Detached clone of the marker, with the marker attributes stripped
    /// and `shadowrootmode` set.
    template: D::Element,
}

impl<D: Dom> TemplateDefinition<D> {
    ///
    /// Build a definition from a template marker.
    ///
    /// Returns None when the element is not a marker: not a template,
    /// a missing or empty tag name, or a mode other than open/closed.
    /// The marker itself is left untouched.
    ///
    pub fn from_marker(marker: &D::Element, config: &InjectorConfig) -> Option<Self> {
        if !D::is_template(marker) {
            return None;
        }

        let mode = D::get_attribute(marker, &config.mode_attribute)?;
        let tag_name = TagName::new(&D::get_attribute(marker, &config.tag_name_attribute)?);

        if tag_name.is_empty() {
            tracing::debug!("ignoring template marker with an empty tag name");
            return None;
        }

        let mode: ShadowRootMode = match mode.parse() {
            Ok(mode) => mode,
            Err(error) => {
                tracing::debug!(%tag_name, %error, "ignoring template marker");
                return None;
            }
        };

        let template = match D::clone_element(marker) {
            Ok(template) => template,
            Err(error) => {
                tracing::warn!(%tag_name, %error, "failed to clone template marker");
                return None;
            }
        };

        if let Err(error) = D::set_attribute(&template, SHADOWROOTMODE, mode.as_str()) {
            tracing::warn!(%tag_name, %error, "failed to prepare template clone");
            return None;
        }
        D::remove_attribute(&template, &config.tag_name_attribute);
        D::remove_attribute(&template, &config.mode_attribute);

        Some(Self {
            tag_name,
            options: ShadowRootOptions::read::<D>(&template, mode),
            template,
        })
    }

    pub fn tag_name(&self) -> &TagName {
        &self.tag_name
    }

    pub fn options(&self) -> &ShadowRootOptions {
        &self.options
    }

    pub fn mode(&self) -> ShadowRootMode {
        self.options.mode
    }

    /// The stored template. Must not be inserted into a live document.
    pub fn template(&self) -> &D::Element {
        &self.template
    }

    /// A fresh deep copy of the template content, ready to be moved into a shadow root.
    pub fn instantiate(&self) -> Result<D::Fragment, Error> {
        let content = D::template_content(&self.template).ok_or(Error::MissingContent)?;
        D::clone_fragment(&content)
    }
}
