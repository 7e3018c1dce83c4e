//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use slint_outliner::{ChangeRecord, SelectionDiff};
use std::cell::RefCell;
use std::rc::Rc;

/// Tracks bus events for testing.
///
/// Each field records published events with their payloads.
#[derive(Default, Clone)]
pub struct EventTracker {
    /// One entry per structural-change batch.
    pub structural: Rc<RefCell<Vec<Vec<ChangeRecord>>>>,
    /// One entry per selection-change diff.
    pub selection: Rc<RefCell<Vec<SelectionDiff>>>,
}

impl EventTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of structural batches seen.
    pub fn structural_count(&self) -> usize {
        self.structural.borrow().len()
    }

    /// Number of selection diffs seen.
    pub fn selection_count(&self) -> usize {
        self.selection.borrow().len()
    }

    /// Clear all recorded events.
    pub fn clear(&self) {
        self.structural.borrow_mut().clear();
        self.selection.borrow_mut().clear();
    }
}
