use super::Model;

/// Replaces the root of the cell tree.
///
/// Unlike the per-cell changes this one has no target cell to lose: `None` is
/// a legitimate root. It executes unconditionally until detached.
#[derive(Debug)]
pub struct RootChange<M: Model> {
    root: Option<M::Cell>,
    previous: Option<M::Cell>,
    detached: bool,
}

impl<M: Model> RootChange<M> {
    /// Creates a change that installs `root`.
    pub fn new(root: Option<M::Cell>) -> Self {
        Self {
            previous: root.clone(),
            root,
            detached: false,
        }
    }

    /// Returns the root the last execution installed.
    pub fn root(&self) -> Option<&M::Cell> {
        self.root.as_ref()
    }

    /// Returns the root the next execution installs.
    pub fn previous(&self) -> Option<&M::Cell> {
        self.previous.as_ref()
    }

    pub(crate) fn detach(&mut self) {
        self.detached = true;
    }

    /// Swaps the model root with [`previous`](Self::previous).
    pub fn execute(&mut self, model: &mut M) -> Result<(), M::Error> {
        if self.detached {
            return Ok(());
        }
        let prior = model.root_changed(self.previous.clone())?;
        self.root = std::mem::replace(&mut self.previous, prior);
        Ok(())
    }
}
