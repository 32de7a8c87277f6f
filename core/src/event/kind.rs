use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Names of the events emitted by edits, models and the undo history.
///
/// The string spellings returned by [`as_str`](Self::as_str) are an external
/// contract shared with observers and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A single change was replayed during undo or redo.
    Executed,
    /// An edit is about to replay its changes.
    StartEdit,
    /// An edit finished replaying its changes.
    EndEdit,
    /// A model applied a change while recording.
    Execute,
    /// A model opened a (possibly nested) update.
    BeginUpdate,
    /// A model closed a (possibly nested) update.
    EndUpdate,
    /// A completed edit is about to be handed off.
    BeforeUndo,
    /// An edit was completed, or undone by the history.
    Undo,
    /// An edit was redone by the history.
    Redo,
    /// The history recorded an edit.
    Add,
    /// The history was cleared.
    Clear,
    /// The model content changed.
    Change,
    /// An edit's notify hook ran.
    Notify,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 13] = [
        Self::Executed,
        Self::StartEdit,
        Self::EndEdit,
        Self::Execute,
        Self::BeginUpdate,
        Self::EndUpdate,
        Self::BeforeUndo,
        Self::Undo,
        Self::Redo,
        Self::Add,
        Self::Clear,
        Self::Change,
        Self::Notify,
    ];

    /// Returns the wire spelling of this event name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Executed => "executed",
            Self::StartEdit => "startEdit",
            Self::EndEdit => "endEdit",
            Self::Execute => "execute",
            Self::BeginUpdate => "beginUpdate",
            Self::EndUpdate => "endUpdate",
            Self::BeforeUndo => "beforeUndo",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Add => "add",
            Self::Clear => "clear",
            Self::Change => "change",
            Self::Notify => "notify",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a name that is not a known [`EventKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind `{0}`")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_owned()))
    }
}
