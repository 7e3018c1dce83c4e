//! Per-document change notification bus.
//!
//! Decouples the document and selection manager from the views observing
//! them. The bus is an explicit object owned alongside the document — never
//! a process global — so multiple documents (and multiple outliner panels
//! per document) cannot cross-talk.
//!
//! Two topics exist: *structural change* (a batch of [`ChangeRecord`]s,
//! published once per committed transaction) and *selection change* (the
//! added/removed diff of the selection set). Subscribers are invoked
//! synchronously, in subscription order.

use crate::document::{ChangeRecord, NodeId};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// The added/removed diff of one selection change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionDiff {
    /// Nodes that entered the selection.
    pub added: Vec<NodeId>,
    /// Nodes that left the selection.
    pub removed: Vec<NodeId>,
}

impl SelectionDiff {
    /// Whether this diff changes nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Token returned by the subscribe methods; pass to
/// [`NotificationBus::unsubscribe`] to stop receiving events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription(u64);

type StructuralCallback = Rc<dyn Fn(&[ChangeRecord])>;
type SelectionCallback = Rc<dyn Fn(&SelectionDiff)>;

#[derive(Default)]
struct BusInner {
    next_token: u64,
    structural: BTreeMap<u64, StructuralCallback>,
    selection: BTreeMap<u64, SelectionCallback>,
}

/// Publish/subscribe channel for document and selection events.
///
/// Cheap to share: hold it in an `Rc` next to the document.
#[derive(Default)]
pub struct NotificationBus {
    inner: RefCell<BusInner>,
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("NotificationBus")
            .field("structural_subscribers", &inner.structural.len())
            .field("selection_subscribers", &inner.selection.len())
            .finish()
    }
}

impl NotificationBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to structural-change batches.
    pub fn subscribe_structural(&self, callback: impl Fn(&[ChangeRecord]) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_token += 1;
        let token = inner.next_token;
        inner.structural.insert(token, Rc::new(callback));
        Subscription(token)
    }

    /// Subscribe to selection-change diffs.
    pub fn subscribe_selection(&self, callback: impl Fn(&SelectionDiff) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_token += 1;
        let token = inner.next_token;
        inner.selection.insert(token, Rc::new(callback));
        Subscription(token)
    }

    /// Remove a subscription. Unsubscribing a token twice, or one that was
    /// never issued, is a no-op.
    pub fn unsubscribe(&self, subscription: Subscription) {
        let mut inner = self.inner.borrow_mut();
        inner.structural.remove(&subscription.0);
        inner.selection.remove(&subscription.0);
    }

    /// Deliver a structural-change batch to all structural subscribers.
    ///
    /// Callbacks run outside the bus borrow, so a subscriber may subscribe
    /// or unsubscribe while handling an event.
    pub fn publish_structural(&self, records: &[ChangeRecord]) {
        let callbacks: Vec<StructuralCallback> =
            self.inner.borrow().structural.values().cloned().collect();
        for callback in callbacks {
            callback(records);
        }
    }

    /// Deliver a selection diff to all selection subscribers.
    pub fn publish_selection(&self, diff: &SelectionDiff) {
        let callbacks: Vec<SelectionCallback> =
            self.inner.borrow().selection.values().cloned().collect();
        for callback in callbacks {
            callback(diff);
        }
    }
}
