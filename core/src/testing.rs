//! In-memory [`Model`] used by unit tests.
//!
//! Stores every field in plain maps, counts mutator calls by name and can be
//! told to fail a named mutator.

use std::collections::{HashMap, HashSet};

use crate::change::Model;
use crate::event::EventBus;
use crate::identity::{Identified, IdentityToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node(pub u32);

impl Identified for Node {
    fn identity(&self) -> IdentityToken {
        IdentityToken::new(format!("Node#{}", self.0))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("mutator `{0}` failed")]
pub struct RecordingError(pub &'static str);

#[derive(Debug, Default)]
pub struct RecordingModel {
    pub events: EventBus,
    pub geometries: HashMap<Node, (i32, i32)>,
    pub values: HashMap<Node, String>,
    pub styles: HashMap<Node, String>,
    pub hidden: HashSet<Node>,
    pub terminals: HashMap<(Node, bool), Node>,
    pub connections: Vec<(Node, Node, bool)>,
    pub parents: HashMap<Node, Node>,
    pub children: HashMap<Node, Vec<Node>>,
    pub attributes: HashMap<(Node, String), String>,
    pub root: Option<Node>,
    log: Vec<&'static str>,
    failing: HashSet<&'static str>,
}

impl RecordingModel {
    /// Number of successful calls to the named mutator.
    pub fn calls(&self, name: &str) -> usize {
        self.log.iter().filter(|call| **call == name).count()
    }

    pub fn fail_on(&mut self, name: &'static str) {
        self.failing.insert(name);
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    /// Places `cell` under `parent` without going through the mutators.
    pub fn attach(&mut self, cell: Node, parent: Node, index: usize) {
        self.parents.insert(cell, parent);
        let siblings = self.children.entry(parent).or_default();
        let at = index.min(siblings.len());
        siblings.insert(at, cell);
    }

    /// Sets an edge terminal and records the connection without going
    /// through the mutators.
    pub fn link(&mut self, edge: Node, terminal: Node, is_source: bool) {
        self.terminals.insert((edge, is_source), terminal);
        self.connections.push((edge, terminal, is_source));
    }

    fn call(&mut self, name: &'static str) -> Result<(), RecordingError> {
        if self.failing.contains(name) {
            return Err(RecordingError(name));
        }
        self.log.push(name);
        Ok(())
    }
}

fn swap<K: std::hash::Hash + Eq, V>(map: &mut HashMap<K, V>, key: K, value: Option<V>) -> Option<V> {
    match value {
        Some(value) => map.insert(key, value),
        None => map.remove(&key),
    }
}

impl Model for RecordingModel {
    type Cell = Node;
    type Geometry = (i32, i32);
    type Value = String;
    type Error = RecordingError;

    fn events(&self) -> &EventBus {
        &self.events
    }

    fn geometry_for_cell_changed(
        &mut self,
        cell: &Node,
        geometry: Option<(i32, i32)>,
    ) -> Result<Option<(i32, i32)>, RecordingError> {
        self.call("geometry")?;
        Ok(swap(&mut self.geometries, *cell, geometry))
    }

    fn value_for_cell_changed(
        &mut self,
        cell: &Node,
        value: Option<String>,
    ) -> Result<Option<String>, RecordingError> {
        self.call("value")?;
        Ok(swap(&mut self.values, *cell, value))
    }

    fn style_for_cell_changed(
        &mut self,
        cell: &Node,
        style: Option<String>,
    ) -> Result<Option<String>, RecordingError> {
        self.call("style")?;
        Ok(swap(&mut self.styles, *cell, style))
    }

    fn visible_state_for_cell_changed(&mut self, cell: &Node, visible: bool) -> Result<bool, RecordingError> {
        self.call("visible")?;
        let was_visible = if visible {
            !self.hidden.remove(cell)
        } else {
            self.hidden.insert(*cell)
        };
        Ok(was_visible)
    }

    fn terminal_for_cell_changed(
        &mut self,
        edge: &Node,
        terminal: Option<Node>,
        is_source: bool,
    ) -> Result<Option<Node>, RecordingError> {
        self.call("terminal")?;
        Ok(swap(&mut self.terminals, (*edge, is_source), terminal))
    }

    fn root_changed(&mut self, root: Option<Node>) -> Result<Option<Node>, RecordingError> {
        self.call("root")?;
        Ok(std::mem::replace(&mut self.root, root))
    }

    fn parent_for_cell_changed(
        &mut self,
        cell: &Node,
        parent: Option<Node>,
        index: usize,
    ) -> Result<Option<Node>, RecordingError> {
        self.call("parent")?;
        let previous = self.parents.remove(cell);
        if let Some(old) = previous
            && let Some(siblings) = self.children.get_mut(&old)
        {
            siblings.retain(|sibling| sibling != cell);
        }
        if let Some(parent) = parent {
            self.attach(*cell, parent, index);
        }
        Ok(previous)
    }

    fn attribute(&self, cell: &Node, name: &str) -> Option<String> {
        self.attributes.get(&(*cell, name.to_owned())).cloned()
    }

    fn set_attribute(&mut self, cell: &Node, name: &str, value: &str) -> Result<(), RecordingError> {
        self.call("set_attribute")?;
        self.attributes.insert((*cell, name.to_owned()), value.to_owned());
        Ok(())
    }

    fn remove_attribute(&mut self, cell: &Node, name: &str) -> Result<(), RecordingError> {
        self.call("remove_attribute")?;
        self.attributes.remove(&(*cell, name.to_owned()));
        Ok(())
    }

    fn parent(&self, cell: &Node) -> Option<Node> {
        self.parents.get(cell).copied()
    }

    fn index_of(&self, parent: &Node, child: &Node) -> Option<usize> {
        self.children.get(parent)?.iter().position(|c| c == child)
    }

    fn children(&self, cell: &Node) -> Vec<Node> {
        self.children.get(cell).cloned().unwrap_or_default()
    }

    fn terminal(&self, edge: &Node, is_source: bool) -> Option<Node> {
        self.terminals.get(&(*edge, is_source)).copied()
    }

    fn connect_terminal(&mut self, edge: &Node, terminal: &Node, is_source: bool) -> Result<(), RecordingError> {
        self.call("connect")?;
        self.connections.push((*edge, *terminal, is_source));
        Ok(())
    }

    fn disconnect_terminal(
        &mut self,
        edge: &Node,
        terminal: &Node,
        is_source: bool,
    ) -> Result<(), RecordingError> {
        self.call("disconnect")?;
        self.connections
            .retain(|connection| *connection != (*edge, *terminal, is_source));
        Ok(())
    }
}
