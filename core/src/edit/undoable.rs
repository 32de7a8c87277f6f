use std::fmt;

use thiserror::Error;

use crate::change::{Change, Model, Replay};
use crate::event::{EventKind, EventObject, Property};
use crate::identity::{Identified, IdentityKeyedMap, IdentityToken, ObjectId};

/// Errors raised while recording into an [`Edit`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The edit was handed off or already replayed.
    #[error("edit is sealed; changes can only be added while recording")]
    Sealed,
}

type NotifyHook<M> = Box<dyn Fn(&Edit<M>, &M)>;
type DieHook<M> = Box<dyn FnOnce(&Edit<M>)>;

/// An ordered batch of changes undone and redone as one unit.
///
/// Changes are appended while the edit is recording; each one has already
/// been applied to the model by the time it is added. Both [`undo`](Self::undo)
/// and [`redo`](Self::redo) replay the batch in append order, relying on each
/// change being its own inverse. Every replay is bracketed by
/// [`EventKind::StartEdit`] and [`EventKind::EndEdit`] on the model's bus, with
/// one [`EventKind::Executed`] per change in between, and ends with the
/// [`notify`](Self::notify) hook.
///
/// Undoing an undone edit or redoing a redone one does nothing.
pub struct Edit<M: Model> {
    object_id: ObjectId,
    source: Option<IdentityToken>,
    changes: Vec<Change<M>>,
    significant: bool,
    undone: bool,
    redone: bool,
    sealed: bool,
    notify_hook: Option<NotifyHook<M>>,
    die_hook: Option<DieHook<M>>,
}

impl<M: Model> Edit<M> {
    /// Creates an empty, recording edit.
    ///
    /// `source` is reported as the sender of replay events; `None` lets the
    /// model's bus pick its own default.
    pub fn new(source: Option<IdentityToken>, significant: bool) -> Self {
        Self {
            object_id: ObjectId::new("Edit"),
            source,
            changes: Vec::new(),
            significant,
            undone: false,
            redone: false,
            sealed: false,
            notify_hook: None,
            die_hook: None,
        }
    }

    /// Installs the hook run at the end of every replay.
    pub fn with_notify<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Edit<M>, &M) + 'static,
    {
        self.notify_hook = Some(Box::new(hook));
        self
    }

    /// Installs the hook run when the edit is discarded by its history.
    pub fn with_die<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&Edit<M>) + 'static,
    {
        self.die_hook = Some(Box::new(hook));
        self
    }

    /// Appends an already applied change.
    pub fn add(&mut self, change: impl Into<Change<M>>) -> Result<(), EditError> {
        if self.sealed {
            return Err(EditError::Sealed);
        }
        self.changes.push(change.into());
        Ok(())
    }

    /// Ends recording. Later [`add`](Self::add) calls are rejected.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Returns `true` once recording has ended.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Returns the sender reported in replay events, if one was set.
    pub fn source(&self) -> Option<&IdentityToken> {
        self.source.as_ref()
    }

    /// Returns `true` if undoing this edit counts as an undo step of its own.
    pub fn is_significant(&self) -> bool {
        self.significant
    }

    /// Returns `true` if the last replay was an undo.
    pub fn is_undone(&self) -> bool {
        self.undone
    }

    /// Returns `true` if the last replay was a redo.
    pub fn is_redone(&self) -> bool {
        self.redone
    }

    /// Returns `true` if no changes were recorded.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of recorded changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns the recorded changes in append order.
    pub fn changes(&self) -> &[Change<M>] {
        &self.changes
    }

    /// Reverts the edit.
    ///
    /// A model error stops the replay. The changes already replayed are
    /// reverted, the edit keeps its state flags and the error is returned, so
    /// the call can be retried.
    pub fn undo(&mut self, model: &mut M) -> Result<(), M::Error> {
        if self.undone {
            return Ok(());
        }
        self.replay(model, Replay::Undo)?;
        self.undone = true;
        self.redone = false;
        self.finish(model);
        Ok(())
    }

    /// Reapplies the edit. Symmetric to [`undo`](Self::undo).
    pub fn redo(&mut self, model: &mut M) -> Result<(), M::Error> {
        if self.redone {
            return Ok(());
        }
        self.replay(model, Replay::Redo)?;
        self.redone = true;
        self.undone = false;
        self.finish(model);
        Ok(())
    }

    /// Runs the notify hook, if any.
    pub fn notify(&self, model: &M) {
        if let Some(hook) = &self.notify_hook {
            hook(self, model);
        }
    }

    /// Consumes the edit, running the die hook, if any.
    pub fn die(mut self) {
        log::debug!("{} discarded with {} changes", self.identity(), self.changes.len());
        if let Some(hook) = self.die_hook.take() {
            hook(&self);
        }
    }

    /// The distinct cells touched by this edit, in first-seen order.
    pub fn affected_cells(&self) -> Vec<M::Cell> {
        let mut seen = IdentityKeyedMap::new();
        let mut cells = Vec::new();
        for cell in self.changes.iter().filter_map(Change::cell) {
            if seen.put(cell, ()).is_none() {
                cells.push(cell.clone());
            }
        }
        cells
    }

    fn replay(&mut self, model: &mut M, direction: Replay) -> Result<(), M::Error> {
        self.sealed = true;
        log::debug!("{} {direction} of {} changes", self.object_id.token(), self.changes.len());

        let start = EventObject::new(EventKind::StartEdit).with("edit", self.object_id.token());
        model.events().fire_event(&start, self.source.as_ref());

        for index in 0..self.changes.len() {
            let change = &mut self.changes[index];
            log::trace!("replaying {}", change.description());
            if let Err(e) = change.replay(model, direction) {
                self.rewind(model, index, direction);
                return Err(e);
            }
            let executed = EventObject::new(EventKind::Executed).with("change", Property::object(&*change));
            model.events().fire_event(&executed, self.source.as_ref());
        }
        Ok(())
    }

    /// Reverts the first `count` changes of an interrupted replay, newest first.
    fn rewind(&mut self, model: &mut M, count: usize, direction: Replay) {
        log::warn!("{} {direction} failed at change {count}, rewinding", self.object_id.token());
        for change in self.changes[..count].iter_mut().rev() {
            if let Err(e) = change.replay(model, direction.reversed()) {
                log::warn!("could not rewind {}: {e}", change.description());
            }
        }
    }

    fn finish(&self, model: &M) {
        let end = EventObject::new(EventKind::EndEdit).with("edit", self.object_id.token());
        model.events().fire_event(&end, self.source.as_ref());
        self.notify(model);
    }
}

impl<M: Model> Identified for Edit<M> {
    fn identity(&self) -> IdentityToken {
        self.object_id.token()
    }
}

impl<M: Model> fmt::Debug for Edit<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edit")
            .field("id", &self.object_id)
            .field("source", &self.source)
            .field("changes", &self.changes)
            .field("significant", &self.significant)
            .field("undone", &self.undone)
            .field("redone", &self.redone)
            .field("sealed", &self.sealed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::change::{GeometryChange, StyleChange, VisibleChange};
    use crate::testing::{Node, RecordingModel};

    /// Applies a visibility change and records it, the way a model does.
    fn hide(model: &mut RecordingModel, edit: &mut Edit<RecordingModel>, cell: u32) {
        let mut change = VisibleChange::new(Node(cell), false);
        change.execute(model).unwrap();
        edit.add(change).unwrap();
    }

    fn event_log(model: &RecordingModel) -> Rc<RefCell<Vec<&'static str>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        model.events.listen(None, move |_, event| sink.borrow_mut().push(event.name()));
        log
    }

    #[test]
    fn undo_twice_replays_once() {
        let mut model = RecordingModel::default();
        let mut edit = Edit::new(None, true);
        hide(&mut model, &mut edit, 1);
        assert_eq!(model.calls("visible"), 1);

        edit.undo(&mut model).unwrap();
        edit.undo(&mut model).unwrap();
        assert_eq!(model.calls("visible"), 2);
        assert!(!model.hidden.contains(&Node(1)));
        assert!(edit.is_undone());
        assert!(!edit.is_redone());
    }

    #[test]
    fn redo_after_undo_restores_applied_state() {
        let mut model = RecordingModel::default();
        model.styles.insert(Node(1), "plain".into());
        let mut edit = Edit::new(None, true);
        let mut style = StyleChange::new(Node(1), Some("bold".into()));
        style.execute(&mut model).unwrap();
        edit.add(style).unwrap();
        hide(&mut model, &mut edit, 2);

        edit.undo(&mut model).unwrap();
        assert_eq!(model.styles[&Node(1)], "plain");
        assert!(!model.hidden.contains(&Node(2)));

        edit.redo(&mut model).unwrap();
        assert_eq!(model.styles[&Node(1)], "bold");
        assert!(model.hidden.contains(&Node(2)));
        edit.redo(&mut model).unwrap();
        assert_eq!(model.calls("style"), 3);
    }

    #[test]
    fn replay_events_bracket_each_change() {
        let mut model = RecordingModel::default();
        let mut edit = Edit::new(None, true);
        hide(&mut model, &mut edit, 1);
        hide(&mut model, &mut edit, 2);
        let log = event_log(&model);

        edit.undo(&mut model).unwrap();
        assert_eq!(
            *log.borrow(),
            ["startEdit", "executed", "executed", "endEdit"]
        );
    }

    #[test]
    fn executed_event_carries_the_change() {
        let mut model = RecordingModel::default();
        let mut edit = Edit::new(None, true);
        hide(&mut model, &mut edit, 7);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        model.events.listen(Some(EventKind::Executed), move |_, event| {
            let change = event.object::<Change<RecordingModel>>("change");
            sink.borrow_mut().push(change.and_then(Change::cell).copied());
        });

        edit.undo(&mut model).unwrap();
        assert_eq!(*seen.borrow(), [Some(Node(7))]);
    }

    #[test]
    fn source_is_reported_as_sender() {
        let mut model = RecordingModel::default();
        let source = IdentityToken::new("Graph#1");
        let mut edit = Edit::new(Some(source.clone()), true);
        hide(&mut model, &mut edit, 1);
        let senders = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&senders);
        model.events.listen(None, move |sender, _| sink.borrow_mut().push(sender.clone()));

        edit.redo(&mut model).unwrap();
        assert!(senders.borrow().iter().all(|sender| *sender == source));
        assert_eq!(senders.borrow().len(), 3);
    }

    #[test]
    fn notify_runs_after_end_edit() {
        let mut model = RecordingModel::default();
        let log = event_log(&model);
        let notified = Rc::clone(&log);
        let mut edit = Edit::<RecordingModel>::new(None, true)
            .with_notify(move |_, _| notified.borrow_mut().push("notify-hook"));

        edit.undo(&mut model).unwrap();
        assert_eq!(*log.borrow(), ["startEdit", "endEdit", "notify-hook"]);
    }

    #[test]
    fn add_after_replay_is_rejected() {
        let mut model = RecordingModel::default();
        let mut edit = Edit::new(None, true);
        edit.undo(&mut model).unwrap();
        let change = GeometryChange::<RecordingModel>::new(Node(1), Some((1, 1)));
        assert_eq!(edit.add(change), Err(EditError::Sealed));
        assert!(edit.is_empty());
    }

    #[test]
    fn add_after_seal_is_rejected() {
        let mut edit = Edit::<RecordingModel>::new(None, false);
        edit.seal();
        let result = edit.add(VisibleChange::new(Node(1), true));
        assert_eq!(result, Err(EditError::Sealed));
        assert!(!edit.is_significant());
    }

    #[test]
    fn failure_mid_replay_keeps_flags() {
        let mut model = RecordingModel::default();
        let mut edit = Edit::new(None, true);
        hide(&mut model, &mut edit, 1);
        let mut geometry = GeometryChange::new(Node(2), Some((3, 4)));
        geometry.execute(&mut model).unwrap();
        edit.add(geometry).unwrap();

        model.fail_on("geometry");
        assert!(edit.undo(&mut model).is_err());
        assert!(!edit.is_undone());
        // The change before the failing one was rewound.
        assert!(model.hidden.contains(&Node(1)));
        assert_eq!(model.geometries.get(&Node(2)), Some(&(3, 4)));
    }

    #[test]
    fn undo_retried_after_transient_failure() {
        let mut model = RecordingModel::default();
        model.styles.insert(Node(2), "plain".into());
        let mut edit = Edit::new(None, true);
        hide(&mut model, &mut edit, 1);
        let mut style = StyleChange::new(Node(2), Some("bold".into()));
        style.execute(&mut model).unwrap();
        edit.add(style).unwrap();

        model.fail_on("style");
        assert!(edit.undo(&mut model).is_err());
        model.clear_failures();

        edit.undo(&mut model).unwrap();
        assert!(edit.is_undone());
        assert!(!model.hidden.contains(&Node(1)));
        assert_eq!(model.styles[&Node(2)], "plain");

        edit.redo(&mut model).unwrap();
        assert!(model.hidden.contains(&Node(1)));
        assert_eq!(model.styles[&Node(2)], "bold");
    }

    #[test]
    fn affected_cells_are_distinct_and_ordered() {
        let mut model = RecordingModel::default();
        let mut edit = Edit::new(None, true);
        hide(&mut model, &mut edit, 3);
        hide(&mut model, &mut edit, 1);
        hide(&mut model, &mut edit, 3);
        assert_eq!(edit.affected_cells(), [Node(3), Node(1)]);
        assert_eq!(edit.len(), 3);
    }

    #[test]
    fn die_runs_hook_once() {
        let died = Rc::new(Cell::new(0));
        let counter = Rc::clone(&died);
        let edit = Edit::<RecordingModel>::new(None, true).with_die(move |_| counter.set(counter.get() + 1));
        edit.die();
        assert_eq!(died.get(), 1);
    }

    #[test]
    fn edits_have_distinct_identities() {
        let a = Edit::<RecordingModel>::new(None, true);
        let b = Edit::<RecordingModel>::new(None, true);
        assert_ne!(a.identity(), b.identity());
        assert!(a.identity().as_str().starts_with("Edit#"));
    }
}
