//! The outliner view controller.
//!
//! [`Outliner`] maintains a live visual projection of a [`Document`]: one
//! element per node, patched incrementally from the structural-change
//! batches and selection diffs on the [`NotificationBus`], never rebuilt
//! wholesale. It also owns the pointer-side state machine: click /
//! ctrl-click / shift-click selection, the last-clicked anchor, and
//! drag-and-drop reparenting wrapped in one undoable transaction.
//!
//! The controller is headless. Wire its callback factories to the `on_*`
//! callbacks of a Slint `ListView`-based outliner component and bind the
//! row model via [`Outliner::sync_rows`]; the component is expected to stop
//! pointer-event propagation per row so nested rows do not re-trigger
//! ancestor handlers.
//!
//! Clone the controller to share it across callbacks; clones share state.

use crate::bus::{NotificationBus, SelectionDiff, Subscription};
use crate::document::{ChangeRecord, Document, DocumentError, NodeId};
use crate::history::History;
use crate::selection::SelectionManager;
use crate::view::{sync_rows, ElementId, ElementTree, RowData, ViewEntry};
use slint::VecModel;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Desynchronization errors between the view and the document.
///
/// These indicate an upstream bug (a change record referencing a node the
/// view has never seen); the reconciliation pass aborts loudly rather than
/// leaving a half-patched view behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlinerError {
    /// A change record references a node with no view entry and no creation
    /// record in the same batch.
    MissingEntry(NodeId),
    /// A recorded sibling anchor is not attached where the record claims.
    MisplacedSibling(NodeId),
}

impl fmt::Display for OutlinerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEntry(id) => {
                write!(f, "change record references node {} with no view entry", id)
            }
            Self::MisplacedSibling(id) => {
                write!(f, "recorded sibling {} is not attached under the recorded parent", id)
            }
        }
    }
}

impl std::error::Error for OutlinerError {}

/// Keyboard modifiers accompanying a row click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickModifiers {
    /// Ctrl (or Cmd) held: additive toggle.
    pub ctrl: bool,
    /// Shift held: range selection from the anchor.
    pub shift: bool,
}

struct OutlinerState {
    elements: ElementTree,
    entries: HashMap<NodeId, ViewEntry>,
    root_element: ElementId,
    last_clicked: Option<NodeId>,
    /// Local mirror of the selection set, kept for drag-gesture queries.
    selected: HashSet<NodeId>,
    drag_set: Vec<NodeId>,
    scroll_request: Option<NodeId>,
    subscriptions: Vec<Subscription>,
}

impl OutlinerState {
    fn element_of(&self, node: NodeId) -> Option<ElementId> {
        self.entries.get(&node).map(|e| e.element)
    }

    /// Phase 1 of reconciliation: make sure every record's node has a view
    /// entry before any structure is touched. A record may reference a node
    /// created by an earlier record of the same batch, or one that has
    /// already left the document again (created and removed in one batch).
    ///
    /// A record node unknown to this view may carry a whole linked subtree:
    /// a detached group keeps its children, and a view constructed while it
    /// was detached has never seen them. The record names only the subtree
    /// root, so entries and elements for the current descendants are built
    /// here as well.
    fn ensure_entries(&mut self, doc: &Document, records: &[ChangeRecord]) {
        for rec in records {
            if !self.entries.contains_key(&rec.node) {
                self.build_subtree(doc, rec.node);
            }
        }
    }

    fn build_subtree(&mut self, doc: &Document, node: NodeId) -> ElementId {
        let label = doc.name(node).unwrap_or_default();
        let element = self.elements.create(node, label, doc.is_group(node));
        self.entries.insert(node, ViewEntry { node, element });
        let children: Vec<NodeId> = doc.children(node).collect();
        for child in children {
            let child_element = match self.element_of(child) {
                Some(el) => el,
                None => self.build_subtree(doc, child),
            };
            self.elements.append_child(element, child_element);
        }
        element
    }

    /// Phase 2: replay each record against the element tree, in batch
    /// order. The view mirrors the pre-batch document, so the recorded
    /// parent and previous sibling are attached exactly where each record
    /// expects them.
    fn apply_records(&mut self, records: &[ChangeRecord]) -> Result<(), OutlinerError> {
        for rec in records {
            let element = self
                .element_of(rec.node)
                .ok_or(OutlinerError::MissingEntry(rec.node))?;
            if rec.old_parent.is_some() {
                self.elements.detach(element);
            }
            let Some(new_parent) = rec.new_parent else {
                // Removal: the element stays in the arena, inert.
                self.elements.detach(element);
                continue;
            };
            let parent_element = self
                .element_of(new_parent)
                .ok_or(OutlinerError::MissingEntry(new_parent))?;
            match rec.new_prev {
                Some(prev) => {
                    let prev_element = self
                        .element_of(prev)
                        .ok_or(OutlinerError::MissingEntry(prev))?;
                    if !self.elements.insert_after(parent_element, prev_element, element) {
                        return Err(OutlinerError::MisplacedSibling(prev));
                    }
                }
                None => self.elements.insert_first(parent_element, element),
            }
        }
        Ok(())
    }

    fn apply_structural(
        &mut self,
        doc: &Document,
        records: &[ChangeRecord],
    ) -> Result<(), OutlinerError> {
        self.ensure_entries(doc, records);
        self.apply_records(records)
    }

    fn apply_selection(&mut self, diff: &SelectionDiff) {
        for &node in &diff.removed {
            self.selected.remove(&node);
            if self.last_clicked == Some(node) {
                self.last_clicked = None;
            }
            if let Some(element) = self.element_of(node) {
                self.elements.set_selected(element, false);
                self.elements.set_anchor(element, false);
            }
        }
        for &node in &diff.added {
            self.selected.insert(node);
            if let Some(element) = self.element_of(node) {
                self.elements.set_selected(element, true);
            }
        }
        // Reveal the first newly selected node: expand every collapsed
        // ancestor group, all the way to the root, then ask the UI to
        // scroll the row into view.
        if let Some(&first) = diff.added.first() {
            if let Some(element) = self.element_of(first) {
                let ancestors: Vec<ElementId> = self.elements.ancestors(element).collect();
                for ancestor in ancestors {
                    if self.elements.is_group(ancestor) && !self.elements.is_expanded(ancestor) {
                        self.elements.set_expanded(ancestor, true);
                    }
                }
                self.scroll_request = Some(first);
            }
        }
    }
}

/// Live tree-outliner controller over one document.
#[derive(Clone)]
pub struct Outliner {
    document: Rc<RefCell<Document>>,
    selection: SelectionManager,
    history: Rc<History>,
    bus: Rc<NotificationBus>,
    state: Rc<RefCell<OutlinerState>>,
}

impl fmt::Debug for Outliner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Outliner")
            .field("entries", &state.entries.len())
            .field("connected", &!state.subscriptions.is_empty())
            .finish()
    }
}

impl Outliner {
    /// Build an outliner over `document` and connect it to the bus.
    ///
    /// Performs the initial depth-first walk: one element per node, attached
    /// under its parent's element, mirroring the current selection state.
    pub fn new(
        document: Rc<RefCell<Document>>,
        selection: SelectionManager,
        history: Rc<History>,
        bus: Rc<NotificationBus>,
    ) -> Self {
        let mut elements = ElementTree::new();
        let mut entries = HashMap::new();
        let root_element;
        {
            let doc = document.borrow();
            let root = doc.root();
            root_element = elements.create(root, doc.name(root).unwrap_or_default(), true);
            entries.insert(
                root,
                ViewEntry {
                    node: root,
                    element: root_element,
                },
            );
            for node in doc.flatten() {
                if node == root {
                    continue;
                }
                let element =
                    elements.create(node, doc.name(node).unwrap_or_default(), doc.is_group(node));
                entries.insert(node, ViewEntry { node, element });
                if let Some(parent_element) =
                    doc.parent(node).and_then(|p| entries.get(&p)).map(|e| e.element)
                {
                    elements.append_child(parent_element, element);
                }
            }
        }

        let mut selected = HashSet::new();
        for node in selection.selected_nodes() {
            if let Some(entry) = entries.get(&node) {
                elements.set_selected(entry.element, true);
                selected.insert(node);
            }
        }

        let outliner = Self {
            document,
            selection,
            history,
            bus,
            state: Rc::new(RefCell::new(OutlinerState {
                elements,
                entries,
                root_element,
                last_clicked: None,
                selected,
                drag_set: Vec::new(),
                scroll_request: None,
                subscriptions: Vec::new(),
            })),
        };
        outliner.connect();
        outliner
    }

    // === Subscription lifecycle ===

    /// Subscribe to the bus. Safe to call repeatedly (e.g. from a UI
    /// re-attach); an already connected outliner is left untouched.
    pub fn connect(&self) {
        if !self.state.borrow().subscriptions.is_empty() {
            return;
        }
        let structural = {
            let state = Rc::downgrade(&self.state);
            let document = Rc::downgrade(&self.document);
            self.bus.subscribe_structural(move |records| {
                let (Some(state), Some(document)) = (state.upgrade(), document.upgrade()) else {
                    return;
                };
                let doc = document.borrow();
                let applied = state.borrow_mut().apply_structural(&doc, records);
                if let Err(err) = applied {
                    // A missing entry means the document emitted a record the
                    // view cannot interpret; skipping it would desynchronize
                    // the projection permanently.
                    panic!("outliner out of sync with document: {err}");
                }
            })
        };
        let selection = {
            let state = Rc::downgrade(&self.state);
            self.bus.subscribe_selection(move |diff| {
                if let Some(state) = state.upgrade() {
                    state.borrow_mut().apply_selection(diff);
                }
            })
        };
        self.state.borrow_mut().subscriptions = vec![structural, selection];
    }

    /// Drop the bus subscriptions. Idempotent: disconnecting twice, or an
    /// outliner that never connected, is a no-op.
    pub fn disconnect(&self) {
        let subscriptions = std::mem::take(&mut self.state.borrow_mut().subscriptions);
        for subscription in subscriptions {
            self.bus.unsubscribe(subscription);
        }
    }

    /// Tear the view down. Equivalent to [`Outliner::disconnect`]; kept as
    /// the explicit end-of-life call so UI detach and teardown can both be
    /// wired without tracking which ran first.
    pub fn dispose(&self) {
        self.disconnect();
    }

    /// Whether the outliner currently listens on the bus.
    pub fn is_connected(&self) -> bool {
        !self.state.borrow().subscriptions.is_empty()
    }

    // === Click state machine ===

    /// Handle a pointer-down on the row of `node`.
    ///
    /// A shift-click without an existing anchor changes no selection, but
    /// like every click it still seeds the anchor and the current group, so
    /// the next shift-click ranges from it.
    pub fn row_clicked(&self, node: NodeId, modifiers: ClickModifiers) {
        let (anchor, known) = {
            let state = self.state.borrow();
            (state.last_clicked, state.entries.contains_key(&node))
        };
        if !known {
            return;
        }

        // No state borrow is held here: select() publishes synchronously
        // and the selection subscriber patches the element flags.
        if modifiers.shift {
            if let Some(anchor) = anchor {
                let between = self.document.borrow().nodes_between(anchor, node);
                self.selection.select(&between, false);
            }
        } else {
            self.selection.select(&[node], modifiers.ctrl);
        }

        {
            let mut state = self.state.borrow_mut();
            if let Some(previous) = state.last_clicked {
                if previous != node {
                    if let Some(element) = state.element_of(previous) {
                        state.elements.set_anchor(element, false);
                    }
                }
            }
            if let Some(element) = state.element_of(node) {
                state.elements.set_anchor(element, true);
            }
            state.last_clicked = Some(node);
        }

        let current = {
            let doc = self.document.borrow();
            if doc.is_group(node) {
                Some(node)
            } else {
                doc.parent(node)
            }
        };
        self.selection.set_current(current);
    }

    /// The last-clicked anchor, if any.
    pub fn last_clicked(&self) -> Option<NodeId> {
        self.state.borrow().last_clicked
    }

    /// Returns a callback for row pointer-down:
    /// `(node_id, ctrl_held, shift_held)`.
    pub fn row_clicked_callback(&self) -> impl Fn(i32, bool, bool) {
        let outliner = self.clone();
        move |node_id, ctrl, shift| {
            outliner.row_clicked(NodeId(node_id), ClickModifiers { ctrl, shift });
        }
    }

    // === Drag & drop ===

    /// Begin a drag on the row of `node` and compute the drag set.
    ///
    /// When the node is part of the selection the set is the selection's
    /// minimal roots, in document order: a selected node is dropped when its
    /// parent is selected too, so a subtree moves once, as a whole. When the
    /// node is not selected, it is dragged alone and the selection is left
    /// untouched.
    pub fn drag_started(&self, node: NodeId) {
        let drag_set = {
            let doc = self.document.borrow();
            let state = self.state.borrow();
            if state.selected.contains(&node) {
                doc.flatten()
                    .into_iter()
                    .filter(|&n| {
                        state.selected.contains(&n)
                            && !doc.parent(n).is_some_and(|p| state.selected.contains(&p))
                    })
                    .collect()
            } else {
                vec![node]
            }
        };
        self.state.borrow_mut().drag_set = drag_set;
    }

    /// Whether `target` accepts the current drag.
    ///
    /// A target is rejected when it is in the drag set itself, or when any
    /// of its ancestors is: dropping a node into its own subtree would
    /// create a cycle.
    pub fn drag_over(&self, target: NodeId) -> bool {
        let doc = self.document.borrow();
        let state = self.state.borrow();
        if state.drag_set.is_empty() || !doc.contains(target) {
            return false;
        }
        !state
            .drag_set
            .iter()
            .any(|&d| d == target || doc.is_ancestor_of(d, target))
    }

    /// Drop the drag set onto `target`, as one undoable transaction.
    ///
    /// A group target receives the nodes appended at the end of its
    /// children; a model target resolves to its parent, with the nodes
    /// inserted immediately after the model row. If the document refuses
    /// any individual move the whole transaction rolls back. The drag set
    /// is cleared either way.
    pub fn drop_on(&self, target: NodeId) -> Result<(), DocumentError> {
        let drag_set = std::mem::take(&mut self.state.borrow_mut().drag_set);
        if drag_set.is_empty() {
            return Ok(());
        }
        let (new_parent, mut anchor) = {
            let doc = self.document.borrow();
            if let Some(&node) = drag_set
                .iter()
                .find(|&&d| d == target || doc.is_ancestor_of(d, target))
            {
                // Race guard: drag_over already rejects these targets.
                return Err(DocumentError::WouldCreateCycle { node, target });
            }
            if doc.is_group(target) {
                (target, None)
            } else {
                let parent = doc.parent(target).ok_or(DocumentError::NodeNotFound(target))?;
                (parent, Some(target))
            }
        };
        self.history.run_atomically("Move nodes", |doc| {
            for &node in &drag_set {
                let mut before = match anchor {
                    Some(a) => doc.next_sibling(a),
                    None => None,
                };
                if before == Some(node) {
                    // The node already sits right after the anchor; keep it
                    // there instead of anchoring the move on itself.
                    before = doc.next_sibling(node);
                }
                doc.move_node(node, new_parent, before)?;
                anchor = Some(node);
            }
            Ok(())
        })
    }

    /// Abort the current drag gesture.
    pub fn drag_canceled(&self) {
        self.state.borrow_mut().drag_set.clear();
    }

    /// Snapshot of the current drag set, in drag order.
    pub fn drag_set(&self) -> Vec<NodeId> {
        self.state.borrow().drag_set.clone()
    }

    /// Returns a callback for drag start: `(node_id)`.
    pub fn drag_started_callback(&self) -> impl Fn(i32) {
        let outliner = self.clone();
        move |node_id| outliner.drag_started(NodeId(node_id))
    }

    /// Returns a callback for drag-over validity: `(node_id) -> accepted`.
    pub fn drag_over_callback(&self) -> impl Fn(i32) -> bool {
        let outliner = self.clone();
        move |node_id| outliner.drag_over(NodeId(node_id))
    }

    /// Returns a callback for drop: `(node_id) -> applied`.
    pub fn drop_callback(&self) -> impl Fn(i32) -> bool {
        let outliner = self.clone();
        move |node_id| outliner.drop_on(NodeId(node_id)).is_ok()
    }

    // === Expansion and rows ===

    /// Toggle a group row's expander.
    pub fn toggle_expanded(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        if let Some(element) = state.element_of(node) {
            if state.elements.is_group(element) {
                let expanded = state.elements.is_expanded(element);
                state.elements.set_expanded(element, !expanded);
            }
        }
    }

    /// Expander state of a group row.
    pub fn is_expanded(&self, node: NodeId) -> bool {
        let state = self.state.borrow();
        state
            .element_of(node)
            .map(|el| state.elements.is_expanded(el))
            .unwrap_or(false)
    }

    /// Returns a callback for the expander toggle: `(node_id)`.
    pub fn expander_toggled_callback(&self) -> impl Fn(i32) {
        let outliner = self.clone();
        move |node_id| outliner.toggle_expanded(NodeId(node_id))
    }

    /// The currently visible rows, in display order.
    pub fn visible_rows(&self) -> Vec<RowData> {
        let state = self.state.borrow();
        state.elements.visible_rows(state.root_element)
    }

    /// Replace a row model's contents with the current visible rows.
    pub fn sync_rows(&self, model: &VecModel<RowData>) {
        sync_rows(model, self.visible_rows());
    }

    /// Visible-row index of a node, for scroll positioning.
    pub fn row_index_of(&self, node: NodeId) -> Option<usize> {
        self.visible_rows().iter().position(|r| r.node_id == node.0)
    }

    /// Take the pending scroll-into-view request, if any. Set whenever a
    /// selection change added nodes; the UI consumes it after re-syncing
    /// the row model.
    pub fn take_scroll_request(&self) -> Option<NodeId> {
        self.state.borrow_mut().scroll_request.take()
    }

    // === Structure queries (used by the UI and by tests) ===

    /// The view's child order under `node`, as node ids.
    ///
    /// After reconciliation this always equals the document's child order;
    /// divergence means a missed or misapplied change batch.
    pub fn view_children(&self, node: NodeId) -> Vec<NodeId> {
        let state = self.state.borrow();
        let Some(element) = state.element_of(node) else {
            return Vec::new();
        };
        state
            .elements
            .children(element)
            .iter()
            .filter_map(|&c| state.elements.node(c))
            .collect()
    }

    /// Whether the node currently has a view entry.
    pub fn has_entry(&self, node: NodeId) -> bool {
        self.state.borrow().entries.contains_key(&node)
    }

    /// Selected visual state of a row.
    pub fn is_row_selected(&self, node: NodeId) -> bool {
        let state = self.state.borrow();
        state
            .element_of(node)
            .map(|el| state.elements.is_selected(el))
            .unwrap_or(false)
    }
}
