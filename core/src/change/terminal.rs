use super::Model;

/// Connects one end of an edge to a terminal, or disconnects it.
#[derive(Debug)]
pub struct TerminalChange<M: Model> {
    cell: Option<M::Cell>,
    terminal: Option<M::Cell>,
    previous: Option<M::Cell>,
    source: bool,
}

impl<M: Model> TerminalChange<M> {
    /// `source` selects the edge end: `true` for source, `false` for target.
    pub fn new(edge: M::Cell, terminal: Option<M::Cell>, source: bool) -> Self {
        Self {
            cell: Some(edge),
            previous: terminal.clone(),
            terminal,
            source,
        }
    }

    /// Returns the edge, unless detached.
    pub fn cell(&self) -> Option<&M::Cell> {
        self.cell.as_ref()
    }

    /// Returns the terminal the last execution connected.
    pub fn terminal(&self) -> Option<&M::Cell> {
        self.terminal.as_ref()
    }

    /// Returns the terminal the next execution connects.
    pub fn previous(&self) -> Option<&M::Cell> {
        self.previous.as_ref()
    }

    /// Returns `true` if this change targets the source end.
    pub fn is_source(&self) -> bool {
        self.source
    }

    pub(crate) fn detach(&mut self) {
        self.cell = None;
    }

    /// Swaps the terminal at this end with [`previous`](Self::previous).
    pub fn execute(&mut self, model: &mut M) -> Result<(), M::Error> {
        let Some(edge) = &self.cell else {
            return Ok(());
        };
        let prior = model.terminal_for_cell_changed(edge, self.previous.clone(), self.source)?;
        self.terminal = std::mem::replace(&mut self.previous, prior);
        Ok(())
    }
}
