//! Changes to a single field of a single cell.
//!
//! All four types follow the same pattern. Construction stores the new value
//! in both slots. Each `execute` hands the `previous` slot to the model, moves
//! it into the current slot, and keeps what the model returns as the new
//! `previous`. Executing twice restores both the model and the change.

use super::Model;

/// Replaces a cell's geometry.
#[derive(Debug)]
pub struct GeometryChange<M: Model> {
    cell: Option<M::Cell>,
    geometry: Option<M::Geometry>,
    previous: Option<M::Geometry>,
}

impl<M: Model> GeometryChange<M> {
    /// Creates a change that applies `geometry` to `cell`.
    pub fn new(cell: M::Cell, geometry: Option<M::Geometry>) -> Self {
        Self {
            cell: Some(cell),
            previous: geometry.clone(),
            geometry,
        }
    }

    /// Returns the target cell, unless detached.
    pub fn cell(&self) -> Option<&M::Cell> {
        self.cell.as_ref()
    }

    /// Returns the geometry the last execution applied.
    pub fn geometry(&self) -> Option<&M::Geometry> {
        self.geometry.as_ref()
    }

    /// Returns the geometry the next execution applies.
    pub fn previous(&self) -> Option<&M::Geometry> {
        self.previous.as_ref()
    }

    pub(crate) fn detach(&mut self) {
        self.cell = None;
    }

    /// Swaps the cell's geometry with [`previous`](Self::previous).
    pub fn execute(&mut self, model: &mut M) -> Result<(), M::Error> {
        let Some(cell) = &self.cell else {
            return Ok(());
        };
        let prior = model.geometry_for_cell_changed(cell, self.previous.clone())?;
        self.geometry = std::mem::replace(&mut self.previous, prior);
        Ok(())
    }
}

/// Replaces a cell's user object.
#[derive(Debug)]
pub struct ValueChange<M: Model> {
    cell: Option<M::Cell>,
    value: Option<M::Value>,
    previous: Option<M::Value>,
}

impl<M: Model> ValueChange<M> {
    /// Creates a change that applies `value` to `cell`.
    pub fn new(cell: M::Cell, value: Option<M::Value>) -> Self {
        Self {
            cell: Some(cell),
            previous: value.clone(),
            value,
        }
    }

    /// Returns the target cell, unless detached.
    pub fn cell(&self) -> Option<&M::Cell> {
        self.cell.as_ref()
    }

    /// Returns the user object the last execution applied.
    pub fn value(&self) -> Option<&M::Value> {
        self.value.as_ref()
    }

    /// Returns the user object the next execution applies.
    pub fn previous(&self) -> Option<&M::Value> {
        self.previous.as_ref()
    }

    pub(crate) fn detach(&mut self) {
        self.cell = None;
    }

    /// Swaps the cell's user object with [`previous`](Self::previous).
    pub fn execute(&mut self, model: &mut M) -> Result<(), M::Error> {
        let Some(cell) = &self.cell else {
            return Ok(());
        };
        let prior = model.value_for_cell_changed(cell, self.previous.clone())?;
        self.value = std::mem::replace(&mut self.previous, prior);
        Ok(())
    }
}

/// Replaces a cell's style string.
#[derive(Debug)]
pub struct StyleChange<M: Model> {
    cell: Option<M::Cell>,
    style: Option<String>,
    previous: Option<String>,
}

impl<M: Model> StyleChange<M> {
    /// Creates a change that applies `style` to `cell`.
    pub fn new(cell: M::Cell, style: Option<String>) -> Self {
        Self {
            cell: Some(cell),
            previous: style.clone(),
            style,
        }
    }

    /// Returns the target cell, unless detached.
    pub fn cell(&self) -> Option<&M::Cell> {
        self.cell.as_ref()
    }

    /// Returns the style the last execution applied.
    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// Returns the style the next execution applies.
    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub(crate) fn detach(&mut self) {
        self.cell = None;
    }

    /// Swaps the cell's style with [`previous`](Self::previous).
    pub fn execute(&mut self, model: &mut M) -> Result<(), M::Error> {
        let Some(cell) = &self.cell else {
            return Ok(());
        };
        let prior = model.style_for_cell_changed(cell, self.previous.clone())?;
        self.style = std::mem::replace(&mut self.previous, prior);
        Ok(())
    }
}

/// Shows or hides a cell.
#[derive(Debug)]
pub struct VisibleChange<M: Model> {
    cell: Option<M::Cell>,
    visible: bool,
    previous: bool,
}

impl<M: Model> VisibleChange<M> {
    /// Creates a change that applies `visible` to `cell`.
    pub fn new(cell: M::Cell, visible: bool) -> Self {
        Self {
            cell: Some(cell),
            visible,
            previous: visible,
        }
    }

    /// Returns the target cell, unless detached.
    pub fn cell(&self) -> Option<&M::Cell> {
        self.cell.as_ref()
    }

    /// Returns the visibility the last execution applied.
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Returns the visibility the next execution applies.
    pub fn previous(&self) -> bool {
        self.previous
    }

    pub(crate) fn detach(&mut self) {
        self.cell = None;
    }

    /// Swaps the cell's visibility with [`previous`](Self::previous).
    pub fn execute(&mut self, model: &mut M) -> Result<(), M::Error> {
        let Some(cell) = &self.cell else {
            return Ok(());
        };
        let prior = model.visible_state_for_cell_changed(cell, self.previous)?;
        self.visible = std::mem::replace(&mut self.previous, prior);
        Ok(())
    }
}
