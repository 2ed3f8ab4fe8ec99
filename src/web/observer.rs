use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::WebDom;
use crate::error::Error;
use crate::{BatchCallback, MutationRecord, Observer};

type ObserverClosure = Closure<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>;

///
/// A browser `MutationObserver` watching `childList` changes in a subtree.
///
/// The observer owns the closure the browser calls into, so the closure
/// lives exactly as long as the subscription.
///
pub struct WebObserver {
    observer: web_sys::MutationObserver,
    _closure: ObserverClosure,
}

impl WebObserver {
    pub(crate) fn observe(
        root: &web_sys::Node,
        mut callback: BatchCallback<WebDom>,
    ) -> Result<Self, Error> {
        let closure: ObserverClosure = Closure::wrap(Box::new(
            move |records: js_sys::Array, _observer: web_sys::MutationObserver| {
                let batch: Vec<MutationRecord<WebDom>> = records
                    .iter()
                    .filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
                    .filter_map(|record| convert_record(&record))
                    .collect();

                callback(&batch);
            },
        ));

        let observer = web_sys::MutationObserver::new(closure.as_ref().unchecked_ref())?;

        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(root, &init)?;

        Ok(Self {
            observer,
            _closure: closure,
        })
    }
}

fn convert_record(record: &web_sys::MutationRecord) -> Option<MutationRecord<WebDom>> {
    Some(MutationRecord {
        target: record.target()?,
        added_nodes: node_list(&record.added_nodes()),
        removed_nodes: node_list(&record.removed_nodes()),
    })
}

fn node_list(list: &web_sys::NodeList) -> Vec<web_sys::Node> {
    (0..list.length()).filter_map(|index| list.get(index)).collect()
}

impl Observer for WebObserver {
    fn disconnect(&mut self) {
        self.observer.disconnect();
    }
}

impl Drop for WebObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
