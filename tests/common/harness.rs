//! Test harness wiring a document, bus, selection, history and outliner
//! together, with event tracking and helpers for simulating user input.

#![allow(dead_code)]

use super::EventTracker;
use slint_outliner::{
    ClickModifiers, Document, History, NodeId, NotificationBus, Outliner, SelectionManager,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Node ids of the standard sample assembly:
///
/// ```text
/// Document
/// ├── G1
/// │   ├── A
/// │   └── B
/// ├── G2
/// │   └── C
/// └── M
/// ```
pub struct SampleAssembly {
    pub g1: NodeId,
    pub g2: NodeId,
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
    pub m: NodeId,
}

/// Fully wired outliner test setup.
pub struct OutlinerHarness {
    pub document: Rc<RefCell<Document>>,
    pub bus: Rc<NotificationBus>,
    pub selection: SelectionManager,
    pub history: Rc<History>,
    pub outliner: Outliner,
    pub tracker: EventTracker,
}

impl OutlinerHarness {
    /// Harness over an empty document (root only).
    pub fn new() -> Self {
        let document = Rc::new(RefCell::new(Document::new("Document")));
        let bus = Rc::new(NotificationBus::new());
        let selection = SelectionManager::new(bus.clone());
        let history = Rc::new(History::new(document.clone(), bus.clone()));

        let tracker = EventTracker::new();
        let structural = tracker.structural.clone();
        bus.subscribe_structural(move |records| structural.borrow_mut().push(records.to_vec()));
        let diffs = tracker.selection.clone();
        bus.subscribe_selection(move |diff| diffs.borrow_mut().push(diff.clone()));

        let outliner = Outliner::new(
            document.clone(),
            selection.clone(),
            history.clone(),
            bus.clone(),
        );
        Self {
            document,
            bus,
            selection,
            history,
            outliner,
            tracker,
        }
    }

    /// Harness pre-populated with the standard sample assembly.
    pub fn with_sample_assembly() -> (Self, SampleAssembly) {
        let harness = Self::new();
        let ids = harness
            .history
            .run_atomically("Build sample", |doc| {
                let root = doc.root();
                let g1 = doc.add_group(root, "G1")?;
                let a = doc.add_model(g1, "A", 101)?;
                let b = doc.add_model(g1, "B", 102)?;
                let g2 = doc.add_group(root, "G2")?;
                let c = doc.add_model(g2, "C", 103)?;
                let m = doc.add_model(root, "M", 104)?;
                Ok(SampleAssembly { g1, g2, a, b, c, m })
            })
            .expect("sample assembly builds");
        harness.tracker.clear();
        (harness, ids)
    }

    /// Plain click on a row.
    pub fn click(&self, node: NodeId) {
        self.outliner.row_clicked(node, ClickModifiers::default());
    }

    /// Ctrl/Cmd-click on a row.
    pub fn ctrl_click(&self, node: NodeId) {
        self.outliner.row_clicked(
            node,
            ClickModifiers {
                ctrl: true,
                shift: false,
            },
        );
    }

    /// Shift-click on a row.
    pub fn shift_click(&self, node: NodeId) {
        self.outliner.row_clicked(
            node,
            ClickModifiers {
                ctrl: false,
                shift: true,
            },
        );
    }

    /// Full drag gesture: start on `node`, drop on `target`.
    pub fn drag_and_drop(&self, node: NodeId, target: NodeId) -> Result<(), slint_outliner::DocumentError> {
        self.outliner.drag_started(node);
        assert!(
            self.outliner.drag_over(target),
            "drop target unexpectedly rejected"
        );
        self.outliner.drop_on(target)
    }

    /// Assert the view's parent/child/order relations equal the document's
    /// for every node reachable from the root.
    pub fn assert_mirrors(&self) {
        let doc = self.document.borrow();
        let mut stack = vec![doc.root()];
        while let Some(node) = stack.pop() {
            let doc_children: Vec<NodeId> = doc.children(node).collect();
            let view_children = self.outliner.view_children(node);
            assert_eq!(
                view_children, doc_children,
                "view diverged from document under {node:?}"
            );
            stack.extend(doc_children);
        }
    }
}
