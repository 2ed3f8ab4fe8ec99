use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::InjectorConfig;
use crate::definition::TemplateDefinition;
use crate::{Dom, TagName};

///
/// Tag name to template definition, last write wins.
///
/// Cloning the registry yields another handle to the same map. Everything
/// runs on one thread, and no borrow is held across a call out of this
/// type, so a RefCell is all the synchronization needed.
///
pub struct TemplateRegistry<D: Dom> {
    definitions: Rc<RefCell<HashMap<TagName, Rc<TemplateDefinition<D>>>>>,
}

impl<D: Dom> TemplateRegistry<D> {
    pub fn new() -> Self {
        Self {
            definitions: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Store a definition, returning the one it replaced.
    pub fn register(
        &self,
        definition: TemplateDefinition<D>,
    ) -> Option<Rc<TemplateDefinition<D>>> {
        let tag_name = definition.tag_name().clone();
        tracing::debug!(%tag_name, mode = %definition.mode(), "registered template");

        self.definitions
            .borrow_mut()
            .insert(tag_name, Rc::new(definition))
    }

    /// Extract a definition from a marker and store it.
    /// Malformed markers are ignored.
    pub fn register_marker(&self, marker: &D::Element, config: &InjectorConfig) -> Option<TagName> {
        let definition = TemplateDefinition::from_marker(marker, config)?;
        let tag_name = definition.tag_name().clone();
        self.register(definition);
        Some(tag_name)
    }

    pub fn lookup(&self, tag_name: &str) -> Option<Rc<TemplateDefinition<D>>> {
        self.definitions
            .borrow()
            .get(&TagName::new(tag_name))
            .cloned()
    }

    pub fn contains(&self, tag_name: &str) -> bool {
        self.definitions
            .borrow()
            .contains_key(&TagName::new(tag_name))
    }

    pub fn remove(&self, tag_name: &str) -> Option<Rc<TemplateDefinition<D>>> {
        self.definitions.borrow_mut().remove(&TagName::new(tag_name))
    }

    /// Teardown. Shadow roots already attached are not affected.
    pub fn clear(&self) {
        self.definitions.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.definitions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.borrow().is_empty()
    }

    /// Registered tag names, sorted.
    pub fn tag_names(&self) -> Vec<TagName> {
        let mut tag_names: Vec<_> = self.definitions.borrow().keys().cloned().collect();
        tag_names.sort();
        tag_names
    }
}

impl<D: Dom> Clone for TemplateRegistry<D> {
    fn clone(&self) -> Self {
        Self {
            definitions: self.definitions.clone(),
        }
    }
}

impl<D: Dom> Default for TemplateRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}
