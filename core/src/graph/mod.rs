//! In-memory cell graph implementing [`Model`].
//!
//! [`GraphModel`] stores cells in an arena. Every public mutator goes through
//! [`GraphModel::execute`], which applies a [`Change`] and records it into the
//! edit of the current transaction. Closing the outermost transaction hands
//! the finished [`Edit`] back to the caller, ready for an
//! [`UndoManager`](crate::edit::UndoManager).
//!
//! ```
//! use cellflow_core::edit::UndoManager;
//! use cellflow_core::graph::{CellValue, Geometry, GraphModel};
//!
//! let mut model = GraphModel::new();
//! let mut history = UndoManager::default();
//! let layer = model.default_parent().unwrap();
//!
//! let vertex = model.create_vertex(CellValue::text("A"), Geometry::new(0.0, 0.0, 80.0, 30.0), None);
//! if let Some(edit) = model.add(layer, vertex, None).unwrap() {
//!     history.record(edit);
//! }
//! assert!(model.contains(vertex));
//!
//! history.undo(&mut model).unwrap();
//! assert!(!model.contains(vertex));
//! ```

mod cell;
mod error;

use std::fmt;

pub use cell::{CellId, CellValue, Geometry, UserObject};
pub use error::ModelError;

use crate::change::{
    AttributeChange, Change, ChildChange, GeometryChange, Model, RootChange, StyleChange, TerminalChange,
    ValueChange, VisibleChange,
};
use crate::config::EngineConfig;
use crate::edit::Edit;
use crate::event::{EventBus, EventKind, EventObject, Property};
use crate::identity::{Identified, IdentityToken, ObjectId};

/// Result of a recording mutator: the finished edit when the call closed the
/// outermost transaction and changed something.
pub type Recorded = Result<Option<Edit<GraphModel>>, ModelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Plain,
    Vertex,
    Edge,
}

/// Slot of an edge end in the per-edge arrays.
const fn end(is_source: bool) -> usize {
    if is_source { 0 } else { 1 }
}

#[derive(Debug, Clone)]
struct CellData {
    kind: CellKind,
    value: Option<CellValue>,
    geometry: Option<Geometry>,
    style: Option<String>,
    visible: bool,
    parent: Option<CellId>,
    children: Vec<CellId>,
    /// Edges connected to this cell.
    edges: Vec<CellId>,
    /// Source and target terminals of an edge.
    terminals: [Option<CellId>; 2],
    /// Whether each end is registered in its terminal's `edges`.
    connected: [bool; 2],
}

impl CellData {
    fn new(kind: CellKind, value: Option<CellValue>, geometry: Option<Geometry>, style: Option<String>) -> Self {
        Self {
            kind,
            value,
            geometry,
            style,
            visible: true,
            parent: None,
            children: Vec::new(),
            edges: Vec::new(),
            terminals: [None, None],
            connected: [false, false],
        }
    }
}

fn new_edit(source: IdentityToken) -> Edit<GraphModel> {
    Edit::new(Some(source), true).with_notify(notify_listeners)
}

/// Notify hook of every edit the model creates.
fn notify_listeners(edit: &Edit<GraphModel>, model: &GraphModel) {
    for kind in [EventKind::Change, EventKind::Notify] {
        let event = EventObject::new(kind)
            .with("edit", Property::object(edit))
            .with("changes", edit.len() as i64);
        model.fire(&event);
    }
}

/// A tree of cells with edges connecting them.
///
/// A new model has a root cell holding one default layer. Cells are created
/// detached with [`create_vertex`](Self::create_vertex) and
/// [`create_edge`](Self::create_edge) and enter the tree through
/// [`add`](Self::add). Removed cells stay allocated so edits can bring them
/// back.
///
/// Transactions nest: [`begin_update`](Self::begin_update) and
/// [`end_update`](Self::end_update) bracket any number of mutations, and only
/// the outermost `end_update` returns the edit.
pub struct GraphModel {
    object_id: ObjectId,
    cells: Vec<CellData>,
    root: Option<CellId>,
    events: EventBus,
    update_level: usize,
    current_edit: Edit<GraphModel>,
}

impl GraphModel {
    /// Creates a model with a root and one default layer.
    pub fn new() -> Self {
        let object_id = ObjectId::new("GraphModel");
        let token = object_id.token();
        let mut model = Self {
            object_id,
            cells: Vec::new(),
            root: None,
            events: EventBus::with_source(token.clone()),
            update_level: 0,
            current_edit: new_edit(token),
        };
        let root = model.allocate(CellKind::Plain, None, None, None);
        let layer = model.allocate(CellKind::Plain, None, None, None);
        model.cells[root.index()].children.push(layer);
        model.cells[layer.index()].parent = Some(root);
        model.root = Some(root);
        model
    }

    /// Creates a model whose bus is gated by `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        let model = Self::new();
        model.events.set_events_enabled(config.events.enabled);
        model
    }

    /// Returns the bus model and replay events are fired on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // --- Queries ---

    /// Returns `true` if `cell` was allocated by this model.
    pub fn cell_exists(&self, cell: CellId) -> bool {
        cell.index() < self.cells.len()
    }

    /// Returns the root cell, if any.
    pub fn root(&self) -> Option<CellId> {
        self.root
    }

    /// The first child of the root, where new cells usually go.
    pub fn default_parent(&self) -> Option<CellId> {
        self.root
            .and_then(|root| self.children(root).first().copied())
    }

    /// Returns the parent of `cell`.
    pub fn parent(&self, cell: CellId) -> Option<CellId> {
        self.cells.get(cell.index())?.parent
    }

    /// Returns the children of `cell` in order.
    pub fn children(&self, cell: CellId) -> &[CellId] {
        self.cells
            .get(cell.index())
            .map(|data| data.children.as_slice())
            .unwrap_or_default()
    }

    /// Returns the number of children of `cell`.
    pub fn child_count(&self, cell: CellId) -> usize {
        self.children(cell).len()
    }

    /// Returns the position of `child` among the children of `parent`.
    pub fn index_of(&self, parent: CellId, child: CellId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Returns the source (`is_source`) or target terminal of `edge`.
    pub fn terminal(&self, edge: CellId, is_source: bool) -> Option<CellId> {
        self.cells.get(edge.index())?.terminals[end(is_source)]
    }

    /// Edges currently connected to `cell`.
    pub fn edges(&self, cell: CellId) -> &[CellId] {
        self.cells
            .get(cell.index())
            .map(|data| data.edges.as_slice())
            .unwrap_or_default()
    }

    /// Returns `true` if `cell` was created as an edge.
    pub fn is_edge(&self, cell: CellId) -> bool {
        self.cells
            .get(cell.index())
            .is_some_and(|data| data.kind == CellKind::Edge)
    }

    /// Returns `true` if `cell` was created as a vertex.
    pub fn is_vertex(&self, cell: CellId) -> bool {
        self.cells
            .get(cell.index())
            .is_some_and(|data| data.kind == CellKind::Vertex)
    }

    /// Returns `true` if `parent` is `child` or one of its ancestors.
    pub fn is_ancestor(&self, parent: CellId, child: CellId) -> bool {
        let mut current = Some(child);
        while let Some(cell) = current {
            if cell == parent {
                return true;
            }
            current = self.parent(cell);
        }
        false
    }

    /// Returns `true` if `cell` is part of the tree under the root.
    pub fn contains(&self, cell: CellId) -> bool {
        self.root.is_some_and(|root| self.is_ancestor(root, cell))
    }

    /// Returns the user object of `cell`.
    pub fn value(&self, cell: CellId) -> Option<&CellValue> {
        self.cells.get(cell.index())?.value.as_ref()
    }

    /// Returns the geometry of `cell`.
    pub fn geometry(&self, cell: CellId) -> Option<Geometry> {
        self.cells.get(cell.index())?.geometry
    }

    /// Returns the style string of `cell`.
    pub fn style(&self, cell: CellId) -> Option<&str> {
        self.cells.get(cell.index())?.style.as_deref()
    }

    /// Returns `true` unless `cell` is hidden or unknown.
    pub fn is_visible(&self, cell: CellId) -> bool {
        self.cells
            .get(cell.index())
            .is_some_and(|data| data.visible)
    }

    /// Returns a named attribute of an element value.
    pub fn attribute(&self, cell: CellId, name: &str) -> Option<&str> {
        self.value(cell)?.as_element()?.attribute(name)
    }

    /// Current transaction depth; `0` outside any transaction.
    pub fn update_level(&self) -> usize {
        self.update_level
    }

    // --- Transactions ---

    /// Opens a (possibly nested) transaction.
    pub fn begin_update(&mut self) {
        self.update_level += 1;
        self.fire(&EventObject::new(EventKind::BeginUpdate));
        if self.update_level == 1 {
            self.fire(&EventObject::new(EventKind::StartEdit));
        }
    }

    /// Closes a transaction.
    ///
    /// Closing the outermost level hands back the recorded edit, sealed and
    /// already notified, unless nothing was recorded.
    pub fn end_update(&mut self) -> Option<Edit<GraphModel>> {
        if self.update_level == 0 {
            log::warn!("end_update without a matching begin_update");
            return None;
        }
        self.update_level -= 1;
        if self.update_level == 0 {
            self.fire(&EventObject::new(EventKind::EndEdit));
        }
        let closing = EventObject::new(EventKind::EndUpdate).with("edit", Property::object(&self.current_edit));
        self.fire(&closing);

        if self.update_level > 0 || self.current_edit.is_empty() {
            return None;
        }

        let before = EventObject::new(EventKind::BeforeUndo).with("edit", Property::object(&self.current_edit));
        self.fire(&before);

        let mut edit = std::mem::replace(&mut self.current_edit, new_edit(self.object_id.token()));
        edit.seal();
        log::debug!("{} closed {} with {} changes", self.object_id.token(), edit.identity(), edit.len());
        edit.notify(self);
        self.fire(&EventObject::new(EventKind::Undo).with("edit", Property::object(&edit)));
        Some(edit)
    }

    /// Applies `change` and records it into the current transaction.
    ///
    /// Returns the edit when this call opened and closed the outermost
    /// transaction. If the change fails nothing is recorded and the
    /// transaction depth is restored.
    pub fn execute(&mut self, change: impl Into<Change<GraphModel>>) -> Recorded {
        let mut change = change.into();
        self.begin_update();
        if let Err(e) = change.execute(self) {
            // The failed change was not recorded, so no edit can come back.
            let _ = self.end_update();
            return Err(e);
        }
        self.fire(&EventObject::new(EventKind::Execute).with("change", Property::object(&change)));
        let recorded = self.current_edit.add(change);
        let edit = self.end_update();
        recorded?;
        Ok(edit)
    }

    /// Runs `update` inside one transaction.
    ///
    /// When this closes the outermost level and `update` fails, the changes it
    /// already made are rolled back before the error is returned.
    pub fn transaction<F>(&mut self, update: F) -> Recorded
    where
        F: FnOnce(&mut Self) -> Result<(), ModelError>,
    {
        self.begin_update();
        let result = update(self);
        let edit = self.end_update();
        match result {
            Ok(()) => Ok(edit),
            Err(e) => {
                if let Some(mut partial) = edit {
                    log::debug!("rolling back {} changes after: {e}", partial.len());
                    if let Err(rollback) = partial.undo(self) {
                        log::warn!("rollback of {} failed: {rollback}", partial.identity());
                    }
                    partial.die();
                }
                Err(e)
            }
        }
    }

    // --- Mutators ---

    /// Allocates a detached vertex.
    pub fn create_vertex(&mut self, value: CellValue, geometry: Geometry, style: Option<&str>) -> CellId {
        self.allocate(CellKind::Vertex, Some(value), Some(geometry), style)
    }

    /// Allocates a detached, unconnected edge with a relative geometry.
    pub fn create_edge(&mut self, value: Option<CellValue>, style: Option<&str>) -> CellId {
        self.allocate(CellKind::Edge, value, Some(Geometry::relative()), style)
    }

    /// Moves `child` under `parent` at `index`, appending when `index` is
    /// `None`.
    pub fn add(&mut self, parent: CellId, child: CellId, index: Option<usize>) -> Recorded {
        self.data(parent)?;
        self.data(child)?;
        if self.is_ancestor(child, parent) {
            return Err(ModelError::InvalidParent { child, parent });
        }
        let index = index.unwrap_or_else(|| self.child_count(parent));
        if self.parent(child) == Some(parent) {
            let last = self.child_count(parent).saturating_sub(1);
            if self.index_of(parent, child) == Some(index.min(last)) {
                return Ok(None);
            }
        }
        self.execute(ChildChange::new(child, Some(parent), index))
    }

    /// Takes `cell` out of the tree. Removing the root clears it.
    pub fn remove(&mut self, cell: CellId) -> Recorded {
        self.data(cell)?;
        if self.root == Some(cell) {
            return self.set_root(None);
        }
        if self.parent(cell).is_none() {
            return Ok(None);
        }
        self.execute(ChildChange::new(cell, None, 0))
    }

    /// Replaces the root; `None` empties the model.
    pub fn set_root(&mut self, root: Option<CellId>) -> Recorded {
        if let Some(root) = root {
            self.data(root)?;
        }
        if self.root == root {
            return Ok(None);
        }
        self.execute(RootChange::new(root))
    }

    /// Replaces the geometry of `cell`.
    pub fn set_geometry(&mut self, cell: CellId, geometry: Option<Geometry>) -> Recorded {
        if self.data(cell)?.geometry == geometry {
            return Ok(None);
        }
        self.execute(GeometryChange::new(cell, geometry))
    }

    /// Replaces the user object of `cell`.
    pub fn set_value(&mut self, cell: CellId, value: Option<CellValue>) -> Recorded {
        if self.data(cell)?.value == value {
            return Ok(None);
        }
        self.execute(ValueChange::new(cell, value))
    }

    /// Replaces the style of `cell`; `None` clears it.
    pub fn set_style(&mut self, cell: CellId, style: Option<&str>) -> Recorded {
        if self.data(cell)?.style.as_deref() == style {
            return Ok(None);
        }
        self.execute(StyleChange::new(cell, style.map(str::to_owned)))
    }

    /// Shows or hides `cell`.
    pub fn set_visible(&mut self, cell: CellId, visible: bool) -> Recorded {
        if self.data(cell)?.visible == visible {
            return Ok(None);
        }
        self.execute(VisibleChange::new(cell, visible))
    }

    /// Connects the source (`is_source`) or target end of `edge` to
    /// `terminal`, or disconnects it.
    pub fn set_terminal(&mut self, edge: CellId, terminal: Option<CellId>, is_source: bool) -> Recorded {
        if let Some(terminal) = terminal {
            self.data(terminal)?;
        }
        if self.data(edge)?.terminals[end(is_source)] == terminal {
            return Ok(None);
        }
        self.execute(TerminalChange::new(edge, terminal, is_source))
    }

    /// Sets both ends of `edge` in one transaction.
    pub fn set_terminals(&mut self, edge: CellId, source: Option<CellId>, target: Option<CellId>) -> Recorded {
        self.transaction(|model| {
            model.set_terminal(edge, source, true)?;
            model.set_terminal(edge, target, false)?;
            Ok(())
        })
    }

    /// Sets or, with `None`, removes an attribute of an element value.
    pub fn set_attribute(&mut self, cell: CellId, name: &str, value: Option<&str>) -> Recorded {
        let element = self
            .data(cell)?
            .value
            .as_ref()
            .and_then(CellValue::as_element)
            .ok_or(ModelError::NotAnElement(cell))?;
        if element.attribute(name) == value {
            return Ok(None);
        }
        self.execute(AttributeChange::new(cell, name, value.map(str::to_owned)))
    }

    // --- Internals ---

    fn allocate(
        &mut self,
        kind: CellKind,
        value: Option<CellValue>,
        geometry: Option<Geometry>,
        style: Option<&str>,
    ) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells
            .push(CellData::new(kind, value, geometry, style.map(str::to_owned)));
        id
    }

    fn data(&self, cell: CellId) -> Result<&CellData, ModelError> {
        self.cells
            .get(cell.index())
            .ok_or(ModelError::CellNotFound(cell))
    }

    fn data_mut(&mut self, cell: CellId) -> Result<&mut CellData, ModelError> {
        self.cells
            .get_mut(cell.index())
            .ok_or(ModelError::CellNotFound(cell))
    }

    fn element_mut(&mut self, cell: CellId) -> Result<&mut UserObject, ModelError> {
        self.data_mut(cell)?
            .value
            .as_mut()
            .and_then(CellValue::as_element_mut)
            .ok_or(ModelError::NotAnElement(cell))
    }

    fn fire(&self, event: &EventObject<'_>) {
        self.events.fire_event(event, None);
    }

    /// Registers one end of `edge` with `terminal`.
    fn link(&mut self, edge: CellId, terminal: CellId, is_source: bool) -> Result<(), ModelError> {
        self.data(terminal)?;
        self.data_mut(edge)?.connected[end(is_source)] = true;
        let edges = &mut self.data_mut(terminal)?.edges;
        if !edges.contains(&edge) {
            edges.push(edge);
        }
        Ok(())
    }

    /// Unregisters one end of `edge` from `terminal`. A loop edge stays listed
    /// while its other end is still connected.
    fn unlink(&mut self, edge: CellId, terminal: CellId, is_source: bool) -> Result<(), ModelError> {
        self.data(terminal)?;
        let data = self.data_mut(edge)?;
        data.connected[end(is_source)] = false;
        let other = end(!is_source);
        let still_linked = data.terminals[other] == Some(terminal) && data.connected[other];
        if !still_linked {
            self.data_mut(terminal)?.edges.retain(|e| *e != edge);
        }
        Ok(())
    }
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Identified for GraphModel {
    fn identity(&self) -> IdentityToken {
        self.object_id.token()
    }
}

impl fmt::Debug for GraphModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphModel")
            .field("id", &self.object_id)
            .field("cells", &self.cells.len())
            .field("root", &self.root)
            .field("update_level", &self.update_level)
            .field("pending_changes", &self.current_edit.len())
            .finish()
    }
}

impl Model for GraphModel {
    type Cell = CellId;
    type Geometry = Geometry;
    type Value = CellValue;
    type Error = ModelError;

    fn events(&self) -> &EventBus {
        &self.events
    }

    fn geometry_for_cell_changed(
        &mut self,
        cell: &CellId,
        geometry: Option<Geometry>,
    ) -> Result<Option<Geometry>, ModelError> {
        Ok(std::mem::replace(&mut self.data_mut(*cell)?.geometry, geometry))
    }

    fn value_for_cell_changed(
        &mut self,
        cell: &CellId,
        value: Option<CellValue>,
    ) -> Result<Option<CellValue>, ModelError> {
        Ok(std::mem::replace(&mut self.data_mut(*cell)?.value, value))
    }

    fn style_for_cell_changed(&mut self, cell: &CellId, style: Option<String>) -> Result<Option<String>, ModelError> {
        Ok(std::mem::replace(&mut self.data_mut(*cell)?.style, style))
    }

    fn visible_state_for_cell_changed(&mut self, cell: &CellId, visible: bool) -> Result<bool, ModelError> {
        Ok(std::mem::replace(&mut self.data_mut(*cell)?.visible, visible))
    }

    fn terminal_for_cell_changed(
        &mut self,
        edge: &CellId,
        terminal: Option<CellId>,
        is_source: bool,
    ) -> Result<Option<CellId>, ModelError> {
        let edge = *edge;
        if let Some(terminal) = terminal {
            self.data(terminal)?;
        }
        let data = self.data(edge)?;
        let previous = data.terminals[end(is_source)];
        if let Some(previous) = previous
            && data.connected[end(is_source)]
        {
            self.unlink(edge, previous, is_source)?;
        }
        self.data_mut(edge)?.terminals[end(is_source)] = terminal;
        if let Some(terminal) = terminal {
            self.link(edge, terminal, is_source)?;
        }
        Ok(previous)
    }

    fn root_changed(&mut self, root: Option<CellId>) -> Result<Option<CellId>, ModelError> {
        if let Some(root) = root {
            self.data(root)?;
        }
        Ok(std::mem::replace(&mut self.root, root))
    }

    fn parent_for_cell_changed(
        &mut self,
        cell: &CellId,
        parent: Option<CellId>,
        index: usize,
    ) -> Result<Option<CellId>, ModelError> {
        let cell = *cell;
        let previous = self.data(cell)?.parent;
        if let Some(parent) = parent {
            self.data(parent)?;
            if self.is_ancestor(cell, parent) {
                return Err(ModelError::InvalidParent { child: cell, parent });
            }
        }
        if let Some(old) = previous {
            self.data_mut(old)?.children.retain(|c| *c != cell);
        }
        if let Some(parent) = parent {
            let siblings = &mut self.data_mut(parent)?.children;
            let at = index.min(siblings.len());
            siblings.insert(at, cell);
        }
        self.data_mut(cell)?.parent = parent;
        Ok(previous)
    }

    fn attribute(&self, cell: &CellId, name: &str) -> Option<String> {
        GraphModel::attribute(self, *cell, name).map(str::to_owned)
    }

    fn set_attribute(&mut self, cell: &CellId, name: &str, value: &str) -> Result<(), ModelError> {
        self.element_mut(*cell)?.set_attribute(name, value);
        Ok(())
    }

    fn remove_attribute(&mut self, cell: &CellId, name: &str) -> Result<(), ModelError> {
        self.element_mut(*cell)?.remove_attribute(name);
        Ok(())
    }

    fn parent(&self, cell: &CellId) -> Option<CellId> {
        GraphModel::parent(self, *cell)
    }

    fn index_of(&self, parent: &CellId, child: &CellId) -> Option<usize> {
        GraphModel::index_of(self, *parent, *child)
    }

    fn children(&self, cell: &CellId) -> Vec<CellId> {
        GraphModel::children(self, *cell).to_vec()
    }

    fn terminal(&self, edge: &CellId, is_source: bool) -> Option<CellId> {
        GraphModel::terminal(self, *edge, is_source)
    }

    fn connect_terminal(&mut self, edge: &CellId, terminal: &CellId, is_source: bool) -> Result<(), ModelError> {
        self.link(*edge, *terminal, is_source)
    }

    fn disconnect_terminal(&mut self, edge: &CellId, terminal: &CellId, is_source: bool) -> Result<(), ModelError> {
        self.unlink(*edge, *terminal, is_source)
    }
}
