//! Visual element arena backing the outliner.
//!
//! Each document node the outliner has seen owns one [`Element`]: a
//! lightweight visual record with an ordered child list and the per-row
//! display flags (`selected`, `anchor`, `expanded`). The arena is a
//! non-owning side table: elements of nodes that leave the document are
//! simply left detached and inert, never blocking document-side cleanup.
//!
//! [`ElementTree::visible_rows`] flattens the expanded part of the tree
//! into [`RowData`] rows, which [`sync_rows`] pushes into a Slint
//! `VecModel` for a `ListView` to render.

use crate::document::NodeId;
use slint::{SharedString, VecModel};
use std::fmt;

/// Handle of an element in an [`ElementTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

/// One rendered row of the outliner, ready for model binding.
#[derive(Clone, Debug, PartialEq)]
pub struct RowData {
    /// Id of the document node this row shows.
    pub node_id: i32,
    /// Display label.
    pub label: SharedString,
    /// Indentation depth (top-level nodes are 0; the root is implicit).
    pub depth: i32,
    /// Whether the row is a group (shows an expander).
    pub is_group: bool,
    /// Expander state (groups only).
    pub expanded: bool,
    /// Selected visual state.
    pub selected: bool,
    /// Last-clicked anchor marker, drawn distinctly from `selected`.
    pub anchor: bool,
}

/// Mapping entry from a document node to its visual element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewEntry {
    /// The document node (back-pointer by value, non-owning).
    pub node: NodeId,
    /// The node's visual element.
    pub element: ElementId,
}

#[derive(Clone, Debug)]
struct Element {
    node: NodeId,
    label: SharedString,
    is_group: bool,
    expanded: bool,
    selected: bool,
    anchor: bool,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// Arena of visual elements with ordered children.
#[derive(Default)]
pub struct ElementTree {
    slots: Vec<Element>,
}

impl fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementTree")
            .field("elements", &self.slots.len())
            .finish()
    }
}

impl ElementTree {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element for `node`. Groups start expanded.
    pub fn create(&mut self, node: NodeId, label: SharedString, is_group: bool) -> ElementId {
        let id = ElementId(self.slots.len());
        self.slots.push(Element {
            node,
            label,
            is_group,
            expanded: is_group,
            selected: false,
            anchor: false,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Number of elements ever created (detached ones included).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // === Structure ===

    /// The element's parent, if attached.
    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.slots.get(el.0).and_then(|e| e.parent)
    }

    /// Ordered children of an element.
    pub fn children(&self, el: ElementId) -> &[ElementId] {
        self.slots.get(el.0).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Iterator over strict ancestors, nearest first.
    pub fn ancestors(&self, el: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.parent(el), move |&e| self.parent(e))
    }

    /// Detach `el` from its parent's child list. Detaching a detached
    /// element is a no-op.
    pub fn detach(&mut self, el: ElementId) {
        let Some(parent) = self.slots.get(el.0).and_then(|e| e.parent) else {
            return;
        };
        if let Some(p) = self.slots.get_mut(parent.0) {
            p.children.retain(|&c| c != el);
        }
        if let Some(e) = self.slots.get_mut(el.0) {
            e.parent = None;
        }
    }

    /// Append `el` at the end of `parent`'s child list.
    pub fn append_child(&mut self, parent: ElementId, el: ElementId) {
        self.detach(el);
        if let Some(p) = self.slots.get_mut(parent.0) {
            p.children.push(el);
        }
        if let Some(e) = self.slots.get_mut(el.0) {
            e.parent = Some(parent);
        }
    }

    /// Insert `el` as the first child of `parent`.
    pub fn insert_first(&mut self, parent: ElementId, el: ElementId) {
        self.detach(el);
        if let Some(p) = self.slots.get_mut(parent.0) {
            p.children.insert(0, el);
        }
        if let Some(e) = self.slots.get_mut(el.0) {
            e.parent = Some(parent);
        }
    }

    /// Insert `el` immediately after sibling `after` under `parent`.
    ///
    /// Returns `false` (without mutating) when `after` is not currently a
    /// child of `parent`.
    pub fn insert_after(&mut self, parent: ElementId, after: ElementId, el: ElementId) -> bool {
        if after == el || !self.children(parent).contains(&after) {
            return false;
        }
        self.detach(el);
        // Look the anchor up again: the detach may have shifted positions
        // when el already sat under the same parent.
        let Some(pos) = self
            .slots
            .get(parent.0)
            .and_then(|p| p.children.iter().position(|&c| c == after))
        else {
            return false;
        };
        if let Some(p) = self.slots.get_mut(parent.0) {
            p.children.insert(pos + 1, el);
        }
        if let Some(e) = self.slots.get_mut(el.0) {
            e.parent = Some(parent);
        }
        true
    }

    // === Per-element state ===

    /// The document node this element shows.
    pub fn node(&self, el: ElementId) -> Option<NodeId> {
        self.slots.get(el.0).map(|e| e.node)
    }

    /// Display label.
    pub fn label(&self, el: ElementId) -> SharedString {
        self.slots.get(el.0).map(|e| e.label.clone()).unwrap_or_default()
    }

    /// Whether the element shows a group.
    pub fn is_group(&self, el: ElementId) -> bool {
        self.slots.get(el.0).map(|e| e.is_group).unwrap_or(false)
    }

    /// Expander state.
    pub fn is_expanded(&self, el: ElementId) -> bool {
        self.slots.get(el.0).map(|e| e.expanded).unwrap_or(false)
    }

    /// Set the expander state (meaningful for groups only).
    pub fn set_expanded(&mut self, el: ElementId, expanded: bool) {
        if let Some(e) = self.slots.get_mut(el.0) {
            e.expanded = expanded;
        }
    }

    /// Selected visual state.
    pub fn is_selected(&self, el: ElementId) -> bool {
        self.slots.get(el.0).map(|e| e.selected).unwrap_or(false)
    }

    /// Set the selected visual state.
    pub fn set_selected(&mut self, el: ElementId, selected: bool) {
        if let Some(e) = self.slots.get_mut(el.0) {
            e.selected = selected;
        }
    }

    /// Anchor marker state.
    pub fn is_anchor(&self, el: ElementId) -> bool {
        self.slots.get(el.0).map(|e| e.anchor).unwrap_or(false)
    }

    /// Set the anchor marker.
    pub fn set_anchor(&mut self, el: ElementId, anchor: bool) {
        if let Some(e) = self.slots.get_mut(el.0) {
            e.anchor = anchor;
        }
    }

    // === Row projection ===

    /// Flatten the expanded subtrees below `root` into display rows.
    ///
    /// The root element itself is not listed; its children appear at depth
    /// zero. Children of collapsed groups are skipped.
    pub fn visible_rows(&self, root: ElementId) -> Vec<RowData> {
        let mut rows = Vec::new();
        let mut stack: Vec<(ElementId, i32)> = self
            .children(root)
            .iter()
            .rev()
            .map(|&c| (c, 0))
            .collect();
        while let Some((el, depth)) = stack.pop() {
            let Some(e) = self.slots.get(el.0) else {
                continue;
            };
            rows.push(RowData {
                node_id: e.node.0,
                label: e.label.clone(),
                depth,
                is_group: e.is_group,
                expanded: e.expanded,
                selected: e.selected,
                anchor: e.anchor,
            });
            if e.expanded {
                for &child in e.children.iter().rev() {
                    stack.push((child, depth + 1));
                }
            }
        }
        rows
    }
}

/// Replace a `VecModel`'s contents with the given rows.
pub fn sync_rows(model: &VecModel<RowData>, rows: Vec<RowData>) {
    model.set_vec(rows);
}
