//! Transactional mutation and the undo/redo log.
//!
//! [`History::run_atomically`] is the only sanctioned way to mutate a
//! [`Document`]: it opens a change-record batch, runs the mutation closure,
//! and either commits the batch as one undoable step (publishing it on the
//! bus as a single structural-change event) or rolls every applied record
//! back, leaving no observable partial state. Events are published only
//! after the document borrow is released, so subscribers may freely read
//! the document.

use crate::bus::NotificationBus;
use crate::document::{ChangeRecord, Document, DocumentError};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One committed transaction: its UI label and the records to replay.
#[derive(Clone, Debug)]
struct UndoStep {
    label: String,
    records: Vec<ChangeRecord>,
}

/// Transaction scope and undo/redo stacks for one document.
pub struct History {
    document: Rc<RefCell<Document>>,
    bus: Rc<NotificationBus>,
    undo: RefCell<Vec<UndoStep>>,
    redo: RefCell<Vec<UndoStep>>,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("undo_depth", &self.undo.borrow().len())
            .field("redo_depth", &self.redo.borrow().len())
            .finish()
    }
}

impl History {
    /// Create an empty history over the given document and bus.
    pub fn new(document: Rc<RefCell<Document>>, bus: Rc<NotificationBus>) -> Self {
        Self {
            document,
            bus,
            undo: RefCell::new(Vec::new()),
            redo: RefCell::new(Vec::new()),
        }
    }

    /// Run `body` as one atomic, undoable mutation of the document.
    ///
    /// On success the emitted change records are committed as a single undo
    /// step labeled `label`, the redo stack is cleared, and the batch is
    /// published once on the bus. On failure every record applied so far is
    /// rolled back in reverse order and nothing is published.
    pub fn run_atomically<T>(
        &self,
        label: &str,
        body: impl FnOnce(&mut Document) -> Result<T, DocumentError>,
    ) -> Result<T, DocumentError> {
        let outcome = {
            let mut doc = self.document.borrow_mut();
            doc.begin_batch();
            let result = body(&mut doc);
            let records = doc.take_batch();
            match result {
                Ok(value) => Ok((value, records)),
                Err(err) => {
                    // No batch is open here, so rollback re-application does
                    // not record anything.
                    for rec in records.iter().rev() {
                        doc.apply_record(rec.inverted())?;
                    }
                    Err(err)
                }
            }
        };
        let (value, records) = outcome?;
        if !records.is_empty() {
            self.undo.borrow_mut().push(UndoStep {
                label: label.to_owned(),
                records: records.clone(),
            });
            self.redo.borrow_mut().clear();
            self.bus.publish_structural(&records);
        }
        Ok(value)
    }

    /// Whether an undo step is available.
    pub fn can_undo(&self) -> bool {
        !self.undo.borrow().is_empty()
    }

    /// Whether a redo step is available.
    pub fn can_redo(&self) -> bool {
        !self.redo.borrow().is_empty()
    }

    /// Label of the next undo step, for menu display.
    pub fn undo_label(&self) -> Option<String> {
        self.undo.borrow().last().map(|s| s.label.clone())
    }

    /// Label of the next redo step, for menu display.
    pub fn redo_label(&self) -> Option<String> {
        self.redo.borrow().last().map(|s| s.label.clone())
    }

    /// Revert the most recent transaction. Returns `false` when the undo
    /// stack is empty.
    pub fn undo(&self) -> Result<bool, DocumentError> {
        let Some(step) = self.undo.borrow_mut().pop() else {
            return Ok(false);
        };
        let records = self.replay(step.records.iter().rev().map(|r| r.inverted()))?;
        self.redo.borrow_mut().push(step);
        if !records.is_empty() {
            self.bus.publish_structural(&records);
        }
        Ok(true)
    }

    /// Re-apply the most recently undone transaction. Returns `false` when
    /// the redo stack is empty.
    pub fn redo(&self) -> Result<bool, DocumentError> {
        let Some(step) = self.redo.borrow_mut().pop() else {
            return Ok(false);
        };
        let records = self.replay(step.records.iter().copied())?;
        self.undo.borrow_mut().push(step);
        if !records.is_empty() {
            self.bus.publish_structural(&records);
        }
        Ok(true)
    }

    fn replay(
        &self,
        records: impl Iterator<Item = ChangeRecord>,
    ) -> Result<Vec<ChangeRecord>, DocumentError> {
        let mut doc = self.document.borrow_mut();
        doc.begin_batch();
        for rec in records {
            if let Err(err) = doc.apply_record(rec) {
                doc.take_batch();
                return Err(err);
            }
        }
        Ok(doc.take_batch())
    }
}
