//! Changes outside the built-in set.
//!
//! The eight built-in changes are self-inverting: one `execute` both applies
//! and reverts. Collaborators that need something else implement
//! [`UndoableChange`] with explicit `undo` and `redo` directions and record it
//! as [`Change::Custom`](super::Change::Custom).

use std::any::Any;
use std::fmt;

use super::Model;

/// Helper trait for downcasting trait objects to concrete types.
///
/// Automatically implemented for all `'static` types. Observers receive a
/// `&dyn UndoableChange<M>` in `executed` events and use this to get back to
/// the concrete type.
pub trait AsAny: 'static {
    /// Returns a reference to `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A change with explicit undo and redo directions.
///
/// Unlike the built-in changes, a custom change is *not* applied on
/// construction by the engine: whoever records it is expected to have applied
/// it already, or to record it through [`Change::execute`](super::Change::execute),
/// which runs [`redo`](Self::redo).
///
/// # Example
///
/// ```ignore
/// #[derive(Debug)]
/// struct Renumber {
///     cells: Vec<CellId>,
/// }
///
/// impl UndoableChange<GraphModel> for Renumber {
///     fn undo(&mut self, model: &mut GraphModel) -> Result<(), ModelError> {
///         /* restore the old numbering */
///         Ok(())
///     }
///
///     fn redo(&mut self, model: &mut GraphModel) -> Result<(), ModelError> {
///         /* apply the new numbering */
///         Ok(())
///     }
///
///     fn description(&self) -> &str {
///         "Renumber cells"
///     }
/// }
/// ```
pub trait UndoableChange<M: Model>: fmt::Debug + AsAny {
    /// Reverts the change.
    fn undo(&mut self, model: &mut M) -> Result<(), M::Error>;

    /// Reapplies the change.
    fn redo(&mut self, model: &mut M) -> Result<(), M::Error>;

    /// A short, human-readable description.
    fn description(&self) -> &str;
}
