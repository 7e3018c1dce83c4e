//! # Slint Outliner Library
//!
//! A flexible, headless Slint helper library for building tree outliners
//! over hierarchical CAD-style documents: scene trees, assembly browsers,
//! layer panels, and any view that must stay live against a mutable node
//! graph.
//!
//! ## Features
//!
//! - **Live projection** - The outliner patches itself from structural
//!   change batches instead of re-rendering; the visual tree stays
//!   isomorphic to the document
//! - **Transactional mutation** - Drag-and-drop reparenting commits as one
//!   undoable step, with full rollback on failure
//! - **Familiar selection** - Click, ctrl-click toggle, and shift-click
//!   range selection with a last-clicked anchor
//! - **Explicit wiring** - A per-document notification bus instead of
//!   hidden globals; multiple documents and multiple panels do not
//!   cross-talk
//!
//! ## Quick Start
//!
//! ```
//! use slint_outliner::{Document, History, NotificationBus, Outliner, SelectionManager};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let document = Rc::new(RefCell::new(Document::new("Assembly")));
//! let bus = Rc::new(NotificationBus::new());
//! let selection = SelectionManager::new(bus.clone());
//! let history = Rc::new(History::new(document.clone(), bus.clone()));
//!
//! let frame = history
//!     .run_atomically("Add frame", |doc| {
//!         let root = doc.root();
//!         let frame = doc.add_group(root, "Frame")?;
//!         doc.add_model(frame, "Beam001", 1)?;
//!         Ok(frame)
//!     })
//!     .unwrap();
//!
//! let outliner = Outliner::new(document, selection, history, bus);
//! assert_eq!(outliner.visible_rows().len(), 2);
//! # let _ = frame;
//! ```
//!
//! Wire the callback factories ([`Outliner::row_clicked_callback`],
//! [`Outliner::drag_started_callback`], [`Outliner::drop_callback`], ...)
//! to your Slint component's `on_*` callbacks and bind the row model via
//! [`Outliner::sync_rows`].
//!
//! ## Core Components
//!
//! - [`Document`] - The node graph: group and model nodes with ordered
//!   siblings, emitting [`ChangeRecord`] batches
//! - [`NotificationBus`] - Per-document publish/subscribe channel
//! - [`SelectionManager`] - Selection set with added/removed diff events
//! - [`History`] - `run_atomically` transaction scope plus undo/redo
//! - [`Outliner`] - The live tree-view controller

pub mod bus;
pub mod document;
pub mod history;
pub mod outliner;
pub mod selection;
pub mod view;

pub use bus::{NotificationBus, SelectionDiff, Subscription};
pub use document::{ChangeRecord, Document, DocumentError, NodeId, NodeKind};
pub use history::History;
pub use outliner::{ClickModifiers, Outliner, OutlinerError};
pub use selection::SelectionManager;
pub use view::{sync_rows, ElementId, ElementTree, RowData, ViewEntry};
