//! Structural reattachment of a cell under a new parent.

use super::Model;

/// Moves a cell to a new parent and position, or out of the tree.
///
/// Besides swapping the parent, the change keeps the model's connection
/// bookkeeping honest. Before a subtree leaves the tree, every terminal of
/// every edge in it is disconnected. After it is attached under a real parent,
/// they are connected again. The edges keep their own terminal references
/// throughout, so the round trip is lossless.
///
/// Index history is swapped alongside the parent: each execution records the
/// position the child actually occupied, so repeated executions also walk
/// index history back and forth.
#[derive(Debug)]
pub struct ChildChange<M: Model> {
    child: Option<M::Cell>,
    parent: Option<M::Cell>,
    previous: Option<M::Cell>,
    index: usize,
    previous_index: usize,
}

impl<M: Model> ChildChange<M> {
    /// `parent == None` removes the child from the tree; `index` is then ignored.
    pub fn new(child: M::Cell, parent: Option<M::Cell>, index: usize) -> Self {
        Self {
            child: Some(child),
            previous: parent.clone(),
            parent,
            index,
            previous_index: index,
        }
    }

    /// Returns the moved cell, unless detached.
    pub fn child(&self) -> Option<&M::Cell> {
        self.child.as_ref()
    }

    /// Returns the parent the last execution moved the child under.
    pub fn parent(&self) -> Option<&M::Cell> {
        self.parent.as_ref()
    }

    /// Returns the parent the next execution moves the child under.
    pub fn previous(&self) -> Option<&M::Cell> {
        self.previous.as_ref()
    }

    /// Returns the position matching [`parent`](Self::parent).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the position matching [`previous`](Self::previous).
    pub fn previous_index(&self) -> usize {
        self.previous_index
    }

    pub(crate) fn detach(&mut self) {
        self.child = None;
    }

    /// Swaps the child between its current and previous parent.
    pub fn execute(&mut self, model: &mut M) -> Result<(), M::Error> {
        let Some(child) = self.child.clone() else {
            return Ok(());
        };

        let actual_index = model
            .parent(&child)
            .and_then(|parent| model.index_of(&parent, &child))
            .unwrap_or(0);

        let detaching = self.previous.is_none();
        if detaching {
            connect_subtree(model, &child, false)?;
        }
        let prior = match model.parent_for_cell_changed(&child, self.previous.clone(), self.previous_index) {
            Ok(prior) => prior,
            Err(e) => {
                if detaching {
                    restore(connect_subtree(model, &child, true));
                }
                return Err(e);
            }
        };
        if !detaching && let Err(e) = connect_subtree(model, &child, true) {
            // Put the child back where it was before returning the error.
            restore(model.parent_for_cell_changed(&child, prior.clone(), actual_index).map(drop));
            if prior.is_none() {
                restore(connect_subtree(model, &child, false));
            }
            return Err(e);
        }

        self.parent = std::mem::replace(&mut self.previous, prior);
        self.index = std::mem::replace(&mut self.previous_index, actual_index);
        Ok(())
    }
}

/// Logs a failed attempt to undo a partial execution.
fn restore<E: std::error::Error>(result: Result<(), E>) {
    if let Err(e) = result {
        log::warn!("could not restore cell after a failed reparent: {e}");
    }
}

/// Connects or disconnects both terminals of `cell` and of every descendant.
fn connect_subtree<M: Model>(model: &mut M, cell: &M::Cell, connect: bool) -> Result<(), M::Error> {
    for is_source in [true, false] {
        if let Some(terminal) = model.terminal(cell, is_source) {
            if connect {
                model.connect_terminal(cell, &terminal, is_source)?;
            } else {
                model.disconnect_terminal(cell, &terminal, is_source)?;
            }
        }
    }
    for child in model.children(cell) {
        connect_subtree(model, &child, connect)?;
    }
    Ok(())
}
