//! Undo/redo history of completed edits.
//!
//! [`UndoManager`] keeps a bounded, linear list of sealed [`Edit`]s and a
//! cursor into it. Recording a new edit after undoing discards the redo
//! branch (standard editor behavior).

use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;

use super::Edit;
use crate::change::Model;
use crate::config::EngineConfig;
use crate::event::{EventBus, EventKind, EventObject, Property};
use crate::identity::{Identified, IdentityToken, ObjectId};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Errors returned by [`UndoManager::undo`] and [`UndoManager::redo`].
#[derive(Debug, Error)]
pub enum HistoryError<E: std::error::Error + 'static> {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    /// The model rejected a replayed change.
    #[error("model error during replay: {0}")]
    Model(#[source] E),
}

/// Manages the undo/redo history of a model.
///
/// Edits in front of the cursor are applied and can be undone; edits behind
/// it were undone and can be redone. When the history holds `max_undo` edits
/// the oldest is evicted. A `max_undo` of `0` disables the bound.
///
/// Insignificant edits are undone and redone together with the next
/// significant one, so a single [`undo`](Self::undo) always reverts at least
/// one significant edit if there is one.
///
/// # Example
///
/// ```ignore
/// let mut history = UndoManager::new(50);
/// let mut model = GraphModel::new();
///
/// let vertex = model.create_vertex(CellValue::text("A"), Geometry::new(0.0, 0.0, 80.0, 30.0), None);
/// let parent = model.default_parent().expect("new models have a default layer");
/// if let Some(edit) = model.add(parent, vertex, None)? {
///     history.record(edit);
/// }
///
/// history.undo(&mut model)?;
/// history.redo(&mut model)?;
/// ```
pub struct UndoManager<M: Model> {
    object_id: ObjectId,
    history: VecDeque<Edit<M>>,
    /// Number of applied edits; `history[..cursor]` can be undone.
    cursor: usize,
    max_undo: usize,
    /// Tracks distance from the saved state.
    ///
    /// - `Some(0)`: the current state matches the last save.
    /// - `Some(n)` where `n > 0`: `n` undos needed to reach the saved state.
    /// - `Some(n)` where `n < 0`: `|n|` redos needed to reach the saved state.
    /// - `None`: the save point is permanently unreachable (its branch was
    ///   discarded, or eviction dropped it).
    save_distance: Option<i64>,
    events: EventBus,
}

impl<M: Model> UndoManager<M> {
    /// Creates an empty history holding at most `max_undo` edits.
    pub fn new(max_undo: usize) -> Self {
        let object_id = ObjectId::new("UndoManager");
        let events = EventBus::with_source(object_id.token());
        Self {
            object_id,
            history: VecDeque::new(),
            cursor: 0,
            max_undo,
            save_distance: Some(0),
            events,
        }
    }

    /// Creates a history bounded and gated by `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        let manager = Self::new(config.history.max_undo);
        manager.events.set_events_enabled(config.events.enabled);
        manager
    }

    /// The bus `add`, `undo`, `redo` and `clear` events are fired on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Seals `edit` and makes it the most recent undoable entry.
    ///
    /// Edits that were undone and not redone are discarded first, then the
    /// oldest edit is evicted if the history is full. Discarded edits are
    /// [`die`](Edit::die)d.
    pub fn record(&mut self, mut edit: Edit<M>) {
        edit.seal();

        let trimmed = self.history.len() - self.cursor;
        if trimmed > 0 {
            log::debug!("discarding {trimmed} redoable edits");
            for discarded in self.history.drain(self.cursor..) {
                discarded.die();
            }
            if let Some(d) = self.save_distance
                && d < 0
            {
                self.save_distance = None;
            }
        }

        if self.max_undo > 0
            && self.history.len() >= self.max_undo
            && let Some(oldest) = self.history.pop_front()
        {
            log::debug!("evicting {}", oldest.identity());
            oldest.die();
            self.cursor -= 1;
        }

        self.history.push_back(edit);
        self.cursor += 1;
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        if let Some(d) = self.save_distance
            && d > self.history.len() as i64
        {
            self.save_distance = None;
        }

        if let Some(edit) = self.history.back() {
            log::debug!("recorded {} ({} changes)", edit.identity(), edit.len());
            self.fire(EventKind::Add, edit);
        }
    }

    /// Undoes edits until a significant one has been undone.
    ///
    /// On a model error the failing edit stays in front of the cursor and the
    /// error is returned; edits undone before it stay undone.
    pub fn undo(&mut self, model: &mut M) -> Result<(), HistoryError<M::Error>> {
        if self.cursor == 0 {
            return Err(HistoryError::NothingToUndo);
        }
        while self.cursor > 0 {
            let edit = &mut self.history[self.cursor - 1];
            edit.undo(model).map_err(HistoryError::Model)?;
            self.cursor -= 1;
            if let Some(d) = &mut self.save_distance {
                *d -= 1;
            }
            if edit.is_significant() {
                break;
            }
        }
        self.fire(EventKind::Undo, &self.history[self.cursor]);
        Ok(())
    }

    /// Redoes edits until a significant one has been redone.
    pub fn redo(&mut self, model: &mut M) -> Result<(), HistoryError<M::Error>> {
        if self.cursor == self.history.len() {
            return Err(HistoryError::NothingToRedo);
        }
        while self.cursor < self.history.len() {
            let edit = &mut self.history[self.cursor];
            edit.redo(model).map_err(HistoryError::Model)?;
            self.cursor += 1;
            if let Some(d) = &mut self.save_distance {
                *d += 1;
            }
            if edit.is_significant() {
                break;
            }
        }
        self.fire(EventKind::Redo, &self.history[self.cursor - 1]);
        Ok(())
    }

    /// Discards every edit and fires `clear`.
    ///
    /// If the current state was the saved state it remains so. Otherwise the
    /// save point is permanently lost.
    pub fn clear(&mut self) {
        for edit in self.history.drain(..) {
            edit.die();
        }
        self.cursor = 0;
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
        self.events
            .fire_event(&EventObject::new(EventKind::Clear), None);
    }

    /// Returns `true` if at least one edit can be undone.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Returns `true` if at least one edit can be redone.
    pub fn can_redo(&self) -> bool {
        self.cursor < self.history.len()
    }

    /// Returns the number of edits in front of the cursor.
    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    /// Returns the number of undone edits behind the cursor.
    pub fn redo_count(&self) -> usize {
        self.history.len() - self.cursor
    }

    /// Returns the number of recorded edits.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns `true` if no edits are recorded.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Returns the history bound; `0` means unbounded.
    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    /// Every recorded edit, oldest first.
    pub fn edits(&self) -> impl Iterator<Item = &Edit<M>> {
        self.history.iter()
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Returns `true` if the current state differs from the last saved state,
    /// or the save point can no longer be reached.
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    fn fire(&self, kind: EventKind, edit: &Edit<M>) {
        let event = EventObject::new(kind).with("edit", Property::object(edit));
        self.events.fire_event(&event, None);
    }
}

impl<M: Model> Default for UndoManager<M> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl<M: Model> Identified for UndoManager<M> {
    fn identity(&self) -> IdentityToken {
        self.object_id.token()
    }
}

impl<M: Model> fmt::Debug for UndoManager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoManager")
            .field("undo_count", &self.undo_count())
            .field("redo_count", &self.redo_count())
            .field("max_undo", &self.max_undo)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}
