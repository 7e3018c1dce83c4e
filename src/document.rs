//! Hierarchical document model: the node graph.
//!
//! A [`Document`] owns a tree of nodes rooted at a distinguished group node.
//! Nodes come in exactly two kinds: *groups* (containers that may have
//! children) and *models* (leaves wrapping an opaque geometry body handle).
//! Structure is stored as first-child / sibling links so that sibling order
//! is explicit and cheap to patch.
//!
//! Every structural mutation emits a [`ChangeRecord`] into the currently
//! open batch. Batches are opened and collected by the transaction layer
//! (see [`crate::history`]); mutating outside an open batch is an error.

use slint::SharedString;
use std::collections::HashMap;
use std::fmt;

/// Identity of a node in a [`Document`].
///
/// Plain value identity: two `NodeId`s are the same node iff they are equal.
/// Ids are never reused within one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two node kinds of the document tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Container node; may have children.
    Group,
    /// Leaf node wrapping a geometry body owned by the shape kernel.
    Model {
        /// Opaque handle into the application's geometry kernel.
        body_id: i32,
    },
}

#[derive(Clone, Debug)]
struct NodeData {
    name: SharedString,
    kind: NodeKind,
    parent: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    first_child: Option<NodeId>,
}

/// One structural edit, as delivered on the notification bus.
///
/// An absent `old_parent` means the node was just created; an absent
/// `new_parent` means it was removed from the tree. `*_prev` is the
/// previous sibling at the respective end of the edit (`None` = first
/// child).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeRecord {
    /// The node that moved.
    pub node: NodeId,
    /// Parent before the edit (`None`: newly created).
    pub old_parent: Option<NodeId>,
    /// Previous sibling before the edit.
    pub old_prev: Option<NodeId>,
    /// Parent after the edit (`None`: removed).
    pub new_parent: Option<NodeId>,
    /// Previous sibling after the edit.
    pub new_prev: Option<NodeId>,
}

impl ChangeRecord {
    /// The record describing the opposite edit (used for rollback and undo).
    pub fn inverted(self) -> Self {
        Self {
            node: self.node,
            old_parent: self.new_parent,
            old_prev: self.new_prev,
            new_parent: self.old_parent,
            new_prev: self.old_prev,
        }
    }
}

/// Reasons a document mutation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentError {
    /// Referenced node does not exist in this document.
    NodeNotFound(NodeId),
    /// The move would make a node its own ancestor.
    WouldCreateCycle {
        /// Node being moved.
        node: NodeId,
        /// Requested new parent.
        target: NodeId,
    },
    /// New parent is a model node; only groups have children.
    NotAGroup(NodeId),
    /// The root group cannot be moved or removed.
    RootImmovable,
    /// The `before` anchor is not a child of the requested parent.
    InvalidAnchor(NodeId),
    /// Mutation attempted outside an open transaction batch.
    NoOpenTransaction,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {} not found", id),
            Self::WouldCreateCycle { node, target } => {
                write!(f, "moving {} under {} would create a cycle", node, target)
            }
            Self::NotAGroup(id) => write!(f, "node {} is not a group", id),
            Self::RootImmovable => write!(f, "the root group cannot be moved or removed"),
            Self::InvalidAnchor(id) => {
                write!(f, "anchor {} is not a child of the requested parent", id)
            }
            Self::NoOpenTransaction => write!(f, "mutation outside an open transaction"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// The document tree.
///
/// Read access is free-form; structural mutation must happen inside a
/// transaction batch so that every edit lands in exactly one change-record
/// batch (see [`crate::history::History::run_atomically`]).
pub struct Document {
    nodes: HashMap<NodeId, NodeData>,
    root: NodeId,
    next_id: i32,
    batch: Option<Vec<ChangeRecord>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("in_batch", &self.batch.is_some())
            .finish()
    }
}

impl Document {
    /// Create a document containing only the root group.
    pub fn new(root_name: &str) -> Self {
        let root = NodeId(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeData {
                name: SharedString::from(root_name),
                kind: NodeKind::Group,
                parent: None,
                prev: None,
                next: None,
                first_child: None,
            },
        );
        Self {
            nodes,
            root,
            next_id: 2,
            batch: None,
        }
    }

    /// The root group.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether the node exists in this document.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of nodes, including the root and detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds only the root group.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    // === Batching (driven by the transaction layer) ===

    /// Open a change-record batch. Records of subsequent mutations
    /// accumulate until [`Document::take_batch`].
    pub fn begin_batch(&mut self) {
        if self.batch.is_none() {
            self.batch = Some(Vec::new());
        }
    }

    /// Close the current batch and return its records (empty if none open).
    pub fn take_batch(&mut self) -> Vec<ChangeRecord> {
        self.batch.take().unwrap_or_default()
    }

    /// Whether a batch is currently open.
    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    fn record(&mut self, rec: ChangeRecord) {
        if let Some(batch) = self.batch.as_mut() {
            batch.push(rec);
        }
    }

    fn require_batch(&self) -> Result<(), DocumentError> {
        if self.batch.is_some() {
            Ok(())
        } else {
            Err(DocumentError::NoOpenTransaction)
        }
    }

    // === Read-only traversal ===

    fn data(&self, node: NodeId) -> Result<&NodeData, DocumentError> {
        self.nodes.get(&node).ok_or(DocumentError::NodeNotFound(node))
    }

    /// Display name of a node.
    pub fn name(&self, node: NodeId) -> Option<SharedString> {
        self.nodes.get(&node).map(|d| d.name.clone())
    }

    /// Kind tag of a node.
    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.get(&node).map(|d| d.kind)
    }

    /// Whether the node is a group (container).
    pub fn is_group(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::Group))
    }

    /// Whether the node is a model (leaf).
    pub fn is_model(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::Model { .. }))
    }

    /// Geometry body handle of a model node.
    pub fn body_id(&self, node: NodeId) -> Option<i32> {
        match self.kind(node)? {
            NodeKind::Model { body_id } => Some(body_id),
            NodeKind::Group => None,
        }
    }

    /// Parent of a node (`None` for the root and for detached nodes).
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|d| d.parent)
    }

    /// First child of a group (`None` for models and empty groups).
    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|d| d.first_child)
    }

    /// Next sibling in document order.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|d| d.next)
    }

    /// Previous sibling in document order.
    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|d| d.prev)
    }

    /// Last child of a group.
    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        let mut child = self.first_child(node)?;
        while let Some(next) = self.next_sibling(child) {
            child = next;
        }
        Some(child)
    }

    /// Iterator over the children of a node, in sibling order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.first_child(node), move |&n| self.next_sibling(n))
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }

    /// All nodes reachable from the root, in depth-first document order
    /// (root first).
    pub fn flatten(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            out.push(node);
            // Push children in reverse so the first child is visited first.
            let children: Vec<NodeId> = self.children(node).collect();
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// The inclusive span of nodes between `a` and `b` in flattened
    /// document order, in either click order.
    ///
    /// This is the range-selection primitive: shift-clicking `b` with
    /// anchor `a` selects exactly this sequence.
    pub fn nodes_between(&self, a: NodeId, b: NodeId) -> Vec<NodeId> {
        let order = self.flatten();
        let pos_a = order.iter().position(|&n| n == a);
        let pos_b = order.iter().position(|&n| n == b);
        match (pos_a, pos_b) {
            (Some(i), Some(j)) => {
                let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
                order[lo..=hi].to_vec()
            }
            _ => Vec::new(),
        }
    }

    // === Structural mutation (batch required) ===

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_new(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
    ) -> Result<NodeId, DocumentError> {
        self.require_batch()?;
        if !self.is_group(parent) {
            return Err(if self.contains(parent) {
                DocumentError::NotAGroup(parent)
            } else {
                DocumentError::NodeNotFound(parent)
            });
        }
        let id = self.alloc_id();
        self.nodes.insert(
            id,
            NodeData {
                name: SharedString::from(name),
                kind,
                parent: None,
                prev: None,
                next: None,
                first_child: None,
            },
        );
        let prev = self.last_child(parent);
        self.attach(id, parent, prev);
        self.record(ChangeRecord {
            node: id,
            old_parent: None,
            old_prev: None,
            new_parent: Some(parent),
            new_prev: prev,
        });
        Ok(id)
    }

    /// Append a new group under `parent`.
    pub fn add_group(&mut self, parent: NodeId, name: &str) -> Result<NodeId, DocumentError> {
        self.insert_new(parent, name, NodeKind::Group)
    }

    /// Append a new model node under `parent`, wrapping `body_id`.
    pub fn add_model(
        &mut self,
        parent: NodeId,
        name: &str,
        body_id: i32,
    ) -> Result<NodeId, DocumentError> {
        self.insert_new(parent, name, NodeKind::Model { body_id })
    }

    /// Relink `node` under `new_parent`, before sibling `before` or at the
    /// end of the child list when `before` is `None`.
    ///
    /// Rejects cycles (`new_parent` being the node itself or one of its
    /// descendants) and non-group parents. Detached nodes may be moved back
    /// into the tree; no new identity is created.
    pub fn move_node(
        &mut self,
        node: NodeId,
        new_parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DocumentError> {
        self.require_batch()?;
        self.data(node)?;
        if node == self.root {
            return Err(DocumentError::RootImmovable);
        }
        if !self.is_group(new_parent) {
            return Err(if self.contains(new_parent) {
                DocumentError::NotAGroup(new_parent)
            } else {
                DocumentError::NodeNotFound(new_parent)
            });
        }
        if new_parent == node || self.is_ancestor_of(node, new_parent) {
            return Err(DocumentError::WouldCreateCycle {
                node,
                target: new_parent,
            });
        }
        if let Some(anchor) = before {
            if anchor == node || self.parent(anchor) != Some(new_parent) {
                return Err(DocumentError::InvalidAnchor(anchor));
            }
        }

        let old_parent = self.parent(node);
        let old_prev = self.prev_sibling(node);
        self.detach(node);
        let new_prev = match before {
            Some(anchor) => self.prev_sibling(anchor),
            None => self.last_child(new_parent),
        };
        self.attach(node, new_parent, new_prev);
        self.record(ChangeRecord {
            node,
            old_parent,
            old_prev,
            new_parent: Some(new_parent),
            new_prev,
        });
        Ok(())
    }

    /// Detach `node` (and its whole subtree) from the tree.
    ///
    /// The node keeps its identity and children; a later
    /// [`Document::move_node`] may reinsert it.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), DocumentError> {
        self.require_batch()?;
        self.data(node)?;
        if node == self.root {
            return Err(DocumentError::RootImmovable);
        }
        let old_parent = self.parent(node);
        let old_prev = self.prev_sibling(node);
        self.detach(node);
        self.record(ChangeRecord {
            node,
            old_parent,
            old_prev,
            new_parent: None,
            new_prev: None,
        });
        Ok(())
    }

    /// Re-apply a single change record (used for rollback, undo and redo).
    ///
    /// Unlike [`Document::move_node`] this bypasses validation: records in
    /// a committed batch were validated when first applied.
    pub(crate) fn apply_record(&mut self, rec: ChangeRecord) -> Result<(), DocumentError> {
        self.data(rec.node)?;
        self.detach(rec.node);
        if let Some(parent) = rec.new_parent {
            self.data(parent)?;
            self.attach(rec.node, parent, rec.new_prev);
        }
        self.record(rec);
        Ok(())
    }

    // === Link surgery ===

    fn detach(&mut self, node: NodeId) {
        let Some((parent, prev, next)) = self
            .nodes
            .get(&node)
            .map(|d| (d.parent, d.prev, d.next))
        else {
            return;
        };
        if let Some(d) = prev.and_then(|p| self.nodes.get_mut(&p)) {
            d.next = next;
        } else if let Some(d) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            d.first_child = next;
        }
        if let Some(d) = next.and_then(|n| self.nodes.get_mut(&n)) {
            d.prev = prev;
        }
        if let Some(d) = self.nodes.get_mut(&node) {
            d.parent = None;
            d.prev = None;
            d.next = None;
        }
    }

    fn attach(&mut self, node: NodeId, parent: NodeId, prev: Option<NodeId>) {
        let next = match prev {
            Some(p) => self.nodes.get(&p).and_then(|d| d.next),
            None => self.nodes.get(&parent).and_then(|d| d.first_child),
        };
        if let Some(d) = self.nodes.get_mut(&node) {
            d.parent = Some(parent);
            d.prev = prev;
            d.next = next;
        }
        match prev {
            Some(p) => {
                if let Some(d) = self.nodes.get_mut(&p) {
                    d.next = Some(node);
                }
            }
            None => {
                if let Some(d) = self.nodes.get_mut(&parent) {
                    d.first_child = Some(node);
                }
            }
        }
        if let Some(d) = next.and_then(|n| self.nodes.get_mut(&n)) {
            d.prev = Some(node);
        }
    }
}
