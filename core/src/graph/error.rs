use thiserror::Error;

use super::CellId;
use crate::edit::EditError;

/// Errors raised by [`GraphModel`](super::GraphModel) mutators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("cell {0} does not exist")]
    CellNotFound(CellId),

    /// Reparenting would make a cell its own ancestor.
    #[error("cannot move {child} under {parent}: {parent} is {child} or one of its descendants")]
    InvalidParent { child: CellId, parent: CellId },

    #[error("cell {0} has no element value to hold attributes")]
    NotAnElement(CellId),

    #[error(transparent)]
    Edit(#[from] EditError),
}
