//! Self-inverting change commands.
//!
//! A [`Change`] wraps one field of one entity in a [`Model`]. Calling
//! [`execute`](Change::execute) swaps the value stored in the change with the
//! value live in the model, so the same call both applies and reverts:
//!
//! ```text
//! construct      current = previous = new value    (no-op baseline)
//! execute #1     model gets new value, previous = old value
//! execute #2     model gets old value, previous = new value
//! ...
//! ```
//!
//! - [`Model`]: the mutable object graph changes act on
//! - [`Change`]: closed set of change kinds, dispatched by one `match`
//! - [`UndoableChange`]: escape hatch for changes with explicit directions

mod attribute;
mod cell;
mod child;
mod custom;
mod model;
mod root;
mod terminal;

use std::fmt;

pub use attribute::AttributeChange;
pub use cell::{GeometryChange, StyleChange, ValueChange, VisibleChange};
pub use child::ChildChange;
pub use custom::{AsAny, UndoableChange};
pub use model::Model;
pub use root::RootChange;
pub use terminal::TerminalChange;

/// Which way an edit is being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Replay {
    Undo,
    Redo,
}

impl Replay {
    /// The opposite direction.
    pub(crate) fn reversed(self) -> Self {
        match self {
            Self::Undo => Self::Redo,
            Self::Redo => Self::Undo,
        }
    }
}

impl fmt::Display for Replay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
        }
    }
}

/// One recorded mutation.
#[derive(Debug)]
pub enum Change<M: Model> {
    Geometry(GeometryChange<M>),
    Value(ValueChange<M>),
    Style(StyleChange<M>),
    Visible(VisibleChange<M>),
    Terminal(TerminalChange<M>),
    Root(RootChange<M>),
    Attribute(AttributeChange<M>),
    Child(ChildChange<M>),
    Custom(Box<dyn UndoableChange<M>>),
}

impl<M: Model> Change<M> {
    /// Applies the change if it is at its baseline, reverts it otherwise.
    ///
    /// Custom changes have no symmetric form; for them this runs
    /// [`UndoableChange::redo`].
    pub fn execute(&mut self, model: &mut M) -> Result<(), M::Error> {
        match self {
            Self::Geometry(change) => change.execute(model),
            Self::Value(change) => change.execute(model),
            Self::Style(change) => change.execute(model),
            Self::Visible(change) => change.execute(model),
            Self::Terminal(change) => change.execute(model),
            Self::Root(change) => change.execute(model),
            Self::Attribute(change) => change.execute(model),
            Self::Child(change) => change.execute(model),
            Self::Custom(change) => change.redo(model),
        }
    }

    /// Replays the change as part of an edit's undo or redo.
    pub(crate) fn replay(&mut self, model: &mut M, direction: Replay) -> Result<(), M::Error> {
        if let Self::Custom(change) = self {
            return match direction {
                Replay::Undo => change.undo(model),
                Replay::Redo => change.redo(model),
            };
        }
        self.execute(model)
    }

    /// Clears the target reference; later executions do nothing.
    ///
    /// Used when the target entity has been destroyed independently of the
    /// edit holding this change. Custom changes are unaffected.
    pub fn detach(&mut self) {
        match self {
            Self::Geometry(change) => change.detach(),
            Self::Value(change) => change.detach(),
            Self::Style(change) => change.detach(),
            Self::Visible(change) => change.detach(),
            Self::Terminal(change) => change.detach(),
            Self::Root(change) => change.detach(),
            Self::Attribute(change) => change.detach(),
            Self::Child(change) => change.detach(),
            Self::Custom(_) => {}
        }
    }

    /// The cell this change acts on, if it targets a single cell.
    pub fn cell(&self) -> Option<&M::Cell> {
        match self {
            Self::Geometry(change) => change.cell(),
            Self::Value(change) => change.cell(),
            Self::Style(change) => change.cell(),
            Self::Visible(change) => change.cell(),
            Self::Terminal(change) => change.cell(),
            Self::Attribute(change) => change.cell(),
            Self::Child(change) => change.child(),
            Self::Root(_) | Self::Custom(_) => None,
        }
    }

    /// A short, human-readable description.
    pub fn description(&self) -> &str {
        match self {
            Self::Geometry(_) => "Change geometry",
            Self::Value(_) => "Change value",
            Self::Style(_) => "Change style",
            Self::Visible(_) => "Change visibility",
            Self::Terminal(_) => "Change terminal",
            Self::Root(_) => "Change root",
            Self::Attribute(_) => "Change attribute",
            Self::Child(_) => "Change parent",
            Self::Custom(change) => change.description(),
        }
    }
}

impl<M: Model> From<GeometryChange<M>> for Change<M> {
    fn from(change: GeometryChange<M>) -> Self {
        Self::Geometry(change)
    }
}

impl<M: Model> From<ValueChange<M>> for Change<M> {
    fn from(change: ValueChange<M>) -> Self {
        Self::Value(change)
    }
}

impl<M: Model> From<StyleChange<M>> for Change<M> {
    fn from(change: StyleChange<M>) -> Self {
        Self::Style(change)
    }
}

impl<M: Model> From<VisibleChange<M>> for Change<M> {
    fn from(change: VisibleChange<M>) -> Self {
        Self::Visible(change)
    }
}

impl<M: Model> From<TerminalChange<M>> for Change<M> {
    fn from(change: TerminalChange<M>) -> Self {
        Self::Terminal(change)
    }
}

impl<M: Model> From<RootChange<M>> for Change<M> {
    fn from(change: RootChange<M>) -> Self {
        Self::Root(change)
    }
}

impl<M: Model> From<AttributeChange<M>> for Change<M> {
    fn from(change: AttributeChange<M>) -> Self {
        Self::Attribute(change)
    }
}

impl<M: Model> From<ChildChange<M>> for Change<M> {
    fn from(change: ChildChange<M>) -> Self {
        Self::Child(change)
    }
}
