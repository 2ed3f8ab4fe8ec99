//!
//! The two observation units.
//!
//! A [Watcher] owns one DOM observer and feeds every batch it receives to
//! a [BatchHandler]. Both watchers of an injector observe the same root;
//! which of them sees a batch first is up to the DOM.
//!

use std::rc::Rc;

use crate::config::InjectorConfig;
use crate::detect::MarkerDetection;
use crate::error::Error;
use crate::materialize::{self, Injection};
use crate::registry::TemplateRegistry;
use crate::{Dom, MutationRecord, Observer};

pub trait BatchHandler<D: Dom>: 'static {
    /// Process one batch of records, in order. Must not fail.
    fn handle(&self, records: &[MutationRecord<D>]);
}

pub struct Watcher<D: Dom, H: BatchHandler<D>> {
    handler: Rc<H>,
    observer: Option<D::Observer>,
}

impl<D: Dom, H: BatchHandler<D>> Watcher<D, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Rc::new(handler),
            observer: None,
        }
    }

    /// Start observing `root`. Does nothing if already watching.
    pub fn watch(&mut self, dom: &D, root: &D::Node) -> Result<(), Error> {
        if self.observer.is_some() {
            return Ok(());
        }

        let handler = self.handler.clone();
        let observer = dom.observe_child_list(
            root,
            Box::new(move |records: &[MutationRecord<D>]| handler.handle(records)),
        )?;
        self.observer = Some(observer);

        Ok(())
    }

    pub fn unwatch(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.observer.is_some()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

///
/// Registers template markers found next to inserted nodes.
///
pub struct DefinitionHandler<D: Dom> {
    registry: TemplateRegistry<D>,
    config: Rc<InjectorConfig>,
    detection: Rc<dyn MarkerDetection<D>>,
}

impl<D: Dom> DefinitionHandler<D> {
    pub fn new(
        registry: TemplateRegistry<D>,
        config: Rc<InjectorConfig>,
        detection: Rc<dyn MarkerDetection<D>>,
    ) -> Self {
        Self {
            registry,
            config,
            detection,
        }
    }
}

impl<D: Dom> BatchHandler<D> for DefinitionHandler<D> {
    fn handle(&self, records: &[MutationRecord<D>]) {
        for added in records.iter().flat_map(|record| record.added_nodes.iter()) {
            for marker in self.detection.detect(added, &self.config) {
                self.registry.register_marker(&marker, &self.config);
            }
        }
    }
}

///
/// Materializes shadow roots for inserted elements with a registered tag name.
///
pub struct InjectionHandler<D: Dom> {
    registry: TemplateRegistry<D>,
}

impl<D: Dom> InjectionHandler<D> {
    pub fn new(registry: TemplateRegistry<D>) -> Self {
        Self { registry }
    }
}

impl<D: Dom> BatchHandler<D> for InjectionHandler<D> {
    fn handle(&self, records: &[MutationRecord<D>]) {
        for added in records.iter().flat_map(|record| record.added_nodes.iter()) {
            let element = match D::as_element(added) {
                Some(element) => element,
                None => continue,
            };

            if !self.registry.contains(&D::tag_name(&element)) {
                continue;
            }

            if materialize::inject(&self.registry, &element) == Injection::AlreadyHosting {
                tracing::trace!("skipping element that already hosts a shadow root");
            }
        }
    }
}

pub type DefinitionWatcher<D> = Watcher<D, DefinitionHandler<D>>;
pub type InjectionWatcher<D> = Watcher<D, InjectionHandler<D>>;
