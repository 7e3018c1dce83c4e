//! Selection state shared across views of one document.
//!
//! [`SelectionManager`] tracks the selected node set and the current
//! (active) group context. All mutation goes through [`SelectionManager::select`],
//! which computes the added/removed diff and publishes exactly one
//! selection-change event per effective call on the document's
//! [`NotificationBus`] — never a no-op event.
//!
//! Clone the manager to share it across callbacks; clones share state.

use crate::bus::{NotificationBus, SelectionDiff};
use crate::document::NodeId;
use slint::{Model, VecModel};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Selection set and active-group context for one document.
#[derive(Clone)]
pub struct SelectionManager {
    bus: Rc<NotificationBus>,
    selected: Rc<RefCell<HashSet<NodeId>>>,
    current: Rc<RefCell<Option<NodeId>>>,
}

impl fmt::Debug for SelectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionManager")
            .field("selected", &self.selected.borrow().len())
            .field("current", &*self.current.borrow())
            .finish()
    }
}

impl SelectionManager {
    /// Create an empty selection over the given bus.
    pub fn new(bus: Rc<NotificationBus>) -> Self {
        Self {
            bus,
            selected: Rc::new(RefCell::new(HashSet::new())),
            current: Rc::new(RefCell::new(None)),
        }
    }

    /// Apply a selection change and publish the resulting diff.
    ///
    /// With `additive = true` each given node's membership is toggled;
    /// otherwise the selection is replaced by exactly the given nodes.
    /// Returns the published diff; an empty diff means the selection was
    /// already in the requested state and no event was published.
    pub fn select(&self, nodes: &[NodeId], additive: bool) -> SelectionDiff {
        let diff = {
            let mut selected = self.selected.borrow_mut();
            let mut diff = SelectionDiff::default();
            if additive {
                let mut seen = HashSet::new();
                for &node in nodes {
                    if !seen.insert(node) {
                        continue;
                    }
                    if selected.remove(&node) {
                        diff.removed.push(node);
                    } else {
                        selected.insert(node);
                        diff.added.push(node);
                    }
                }
            } else {
                let requested: HashSet<NodeId> = nodes.iter().copied().collect();
                let mut removed: Vec<NodeId> = selected
                    .iter()
                    .copied()
                    .filter(|n| !requested.contains(n))
                    .collect();
                removed.sort();
                for &node in nodes {
                    if selected.insert(node) {
                        diff.added.push(node);
                    }
                }
                for &node in &removed {
                    selected.remove(&node);
                }
                diff.removed = removed;
            }
            diff
        };
        // The set borrow is released before publishing so subscribers may
        // query the selection.
        if !diff.is_empty() {
            self.bus.publish_selection(&diff);
        }
        diff
    }

    /// Clear the selection (equivalent to a non-additive empty select).
    pub fn clear(&self) {
        self.select(&[], false);
    }

    /// Whether a node is selected.
    pub fn contains(&self, node: NodeId) -> bool {
        self.selected.borrow().contains(&node)
    }

    /// Snapshot of the selected set, sorted by id.
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.selected.borrow().iter().copied().collect();
        nodes.sort();
        nodes
    }

    /// Number of selected nodes.
    pub fn len(&self) -> usize {
        self.selected.borrow().len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.borrow().is_empty()
    }

    /// The current (active) group context, set by the view from the most
    /// recent click: the clicked group itself, otherwise its parent.
    pub fn current(&self) -> Option<NodeId> {
        *self.current.borrow()
    }

    /// Update the current group context.
    pub fn set_current(&self, node: Option<NodeId>) {
        *self.current.borrow_mut() = node;
    }

    /// Sync the selected ids into a Slint `VecModel` for UI binding.
    pub fn sync_to_model(&self, model: &VecModel<i32>) {
        while model.row_count() > 0 {
            model.remove(0);
        }
        for node in self.selected_nodes() {
            model.push(node.0);
        }
    }
}
