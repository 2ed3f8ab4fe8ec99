use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::server_dom::{Node, RcNode};
use super::ServerDom;
use crate::{BatchCallback, MutationRecord, Observer};

pub(crate) struct Registration {
    pub observer: Weak<ObserverShared>,
    pub subtree: bool,
}

pub(crate) struct ObserverShared {
    callback: RefCell<BatchCallback<ServerDom>>,
    records: RefCell<Vec<MutationRecord<ServerDom>>>,
    observed: RefCell<Vec<Weak<Node>>>,
}

impl ObserverShared {
    pub fn enqueue(&self, record: MutationRecord<ServerDom>) {
        self.records.borrow_mut().push(record);
    }

    /// Invoke the callback with every pending record. Returns whether it was called.
    fn deliver(&self) -> bool {
        let records = std::mem::take(&mut *self.records.borrow_mut());
        if records.is_empty() {
            return false;
        }

        match self.callback.try_borrow_mut() {
            Ok(mut callback) => {
                callback(&records);
                true
            }
            Err(_) => {
                tracing::warn!("flush called from within a mutation callback");
                self.records.borrow_mut().splice(0..0, records);
                false
            }
        }
    }
}

///
/// The document-wide list of observers, in creation order.
///
pub(crate) struct DocumentShared {
    observers: RefCell<Vec<Weak<ObserverShared>>>,
}

impl DocumentShared {
    pub fn new() -> Self {
        Self {
            observers: RefCell::new(vec![]),
        }
    }

    pub fn observe(&self, root: &RcNode, callback: BatchCallback<ServerDom>) -> ServerObserver {
        let shared = Rc::new(ObserverShared {
            callback: RefCell::new(callback),
            records: RefCell::new(vec![]),
            observed: RefCell::new(vec![Rc::downgrade(root)]),
        });

        root.register_observer(Registration {
            observer: Rc::downgrade(&shared),
            subtree: true,
        });
        self.observers.borrow_mut().push(Rc::downgrade(&shared));

        ServerObserver { shared }
    }

    ///
    /// Deliver pending records until there are none left.
    ///
    /// Observers are visited in creation order and each receives its whole
    /// pending batch. Mutations made by a callback are delivered in a later
    /// round of the same flush.
    ///
    pub fn flush(&self) {
        loop {
            let observers: Vec<Rc<ObserverShared>> = {
                let mut observers = self.observers.borrow_mut();
                observers.retain(|observer| observer.strong_count() > 0);
                observers.iter().filter_map(Weak::upgrade).collect()
            };

            let mut delivered = false;
            for observer in observers {
                delivered |= observer.deliver();
            }

            if !delivered {
                break;
            }
        }
    }
}

///
/// Child-list subscription on the in-memory DOM.
///
pub struct ServerObserver {
    shared: Rc<ObserverShared>,
}

impl ServerObserver {
    /// Take the pending records without delivering them.
    pub fn take_records(&self) -> Vec<MutationRecord<ServerDom>> {
        std::mem::take(&mut *self.shared.records.borrow_mut())
    }
}

impl Observer for ServerObserver {
    fn disconnect(&mut self) {
        for node in self.shared.observed.borrow_mut().drain(..) {
            if let Some(node) = node.upgrade() {
                node.unregister_observer(&self.shared);
            }
        }
        self.shared.records.borrow_mut().clear();
    }
}

impl Drop for ServerObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
