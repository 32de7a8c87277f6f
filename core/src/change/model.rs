//! The contract a mutable object graph must satisfy to be edited.

use std::error::Error;
use std::fmt;

use crate::event::EventBus;
use crate::identity::Identified;

/// A mutable cell graph that [`Change`](super::Change)s can be recorded against.
///
/// Each `*_changed` mutator applies a new value to one field of one entity and
/// returns the value that was in effect immediately before the call. Changes
/// rely on that return value to flip themselves: calling a mutator with the
/// value it just returned restores the original state.
///
/// Mutators may fail. Errors are passed through the change, edit and history
/// layers untouched.
///
/// The structural queries (`parent`, `children`, `terminal`, ...) and the
/// connection bookkeeping hooks are used by [`ChildChange`](super::ChildChange)
/// to detach a subtree's edges before it leaves the graph and to reattach them
/// when it comes back.
pub trait Model: Sized + fmt::Debug + 'static {
    /// Handle to one cell. Cheap to clone.
    type Cell: Clone + PartialEq + Identified + fmt::Debug + 'static;
    /// Geometry attached to a cell.
    type Geometry: Clone + fmt::Debug + 'static;
    /// User object attached to a cell.
    type Value: Clone + fmt::Debug + 'static;
    /// Error raised by mutators.
    type Error: Error + 'static;

    /// The bus edits fire their replay events on.
    fn events(&self) -> &EventBus;

    fn geometry_for_cell_changed(
        &mut self,
        cell: &Self::Cell,
        geometry: Option<Self::Geometry>,
    ) -> Result<Option<Self::Geometry>, Self::Error>;

    fn value_for_cell_changed(
        &mut self,
        cell: &Self::Cell,
        value: Option<Self::Value>,
    ) -> Result<Option<Self::Value>, Self::Error>;

    fn style_for_cell_changed(
        &mut self,
        cell: &Self::Cell,
        style: Option<String>,
    ) -> Result<Option<String>, Self::Error>;

    fn visible_state_for_cell_changed(
        &mut self,
        cell: &Self::Cell,
        visible: bool,
    ) -> Result<bool, Self::Error>;

    /// Connects `edge` to `terminal` at its source (`is_source`) or target end.
    fn terminal_for_cell_changed(
        &mut self,
        edge: &Self::Cell,
        terminal: Option<Self::Cell>,
        is_source: bool,
    ) -> Result<Option<Self::Cell>, Self::Error>;

    /// Installs `root` as the root of the cell tree.
    fn root_changed(&mut self, root: Option<Self::Cell>) -> Result<Option<Self::Cell>, Self::Error>;

    /// Moves `cell` under `parent` at `index`, or out of the tree when
    /// `parent` is `None`. Returns the previous parent.
    fn parent_for_cell_changed(
        &mut self,
        cell: &Self::Cell,
        parent: Option<Self::Cell>,
        index: usize,
    ) -> Result<Option<Self::Cell>, Self::Error>;

    /// Reads a named attribute of the cell's user object.
    fn attribute(&self, cell: &Self::Cell, name: &str) -> Option<String>;

    fn set_attribute(&mut self, cell: &Self::Cell, name: &str, value: &str) -> Result<(), Self::Error>;

    fn remove_attribute(&mut self, cell: &Self::Cell, name: &str) -> Result<(), Self::Error>;

    fn parent(&self, cell: &Self::Cell) -> Option<Self::Cell>;

    /// Position of `child` among the children of `parent`.
    fn index_of(&self, parent: &Self::Cell, child: &Self::Cell) -> Option<usize>;

    fn children(&self, cell: &Self::Cell) -> Vec<Self::Cell>;

    /// The terminal `edge` points at, at its source or target end.
    fn terminal(&self, edge: &Self::Cell, is_source: bool) -> Option<Self::Cell>;

    /// Restores the connection bookkeeping between `edge` and `terminal`.
    fn connect_terminal(
        &mut self,
        edge: &Self::Cell,
        terminal: &Self::Cell,
        is_source: bool,
    ) -> Result<(), Self::Error>;

    /// Drops the connection bookkeeping between `edge` and `terminal` while
    /// leaving the edge's own terminal reference intact, so a later
    /// [`connect_terminal`](Self::connect_terminal) can restore it.
    fn disconnect_terminal(
        &mut self,
        edge: &Self::Cell,
        terminal: &Self::Cell,
        is_source: bool,
    ) -> Result<(), Self::Error>;
}
