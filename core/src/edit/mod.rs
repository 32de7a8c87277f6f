//! Undoable edits and the history that owns them.
//!
//! - [`Edit`]: an ordered batch of applied [`Change`](crate::change::Change)s,
//!   replayed as one unit
//! - [`UndoManager`]: bounded undo/redo history of completed edits
//!
//! # Replay order
//!
//! Both directions replay an edit's changes in the order they were recorded.
//! This is only correct because every built-in change is its own inverse and
//! later changes may depend on the side effects of earlier ones (a reparent
//! followed by a terminal fix, for instance). A custom change whose undo is not
//! a pure state swap must take that order into account.

mod history;
mod undoable;

pub use history::{DEFAULT_MAX_UNDO, HistoryError, UndoManager};
pub use undoable::{Edit, EditError};
