//! Cell handles and the plain data a cell carries.

use std::fmt;

use crate::identity::{Identified, IdentityToken};

/// Handle to one cell of a [`GraphModel`](super::GraphModel).
///
/// Handles are only meaningful for the model that allocated them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) u32);

impl CellId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell#{}", self.0)
    }
}

impl Identified for CellId {
    fn identity(&self) -> IdentityToken {
        IdentityToken::new(self.to_string())
    }
}

/// An element-like user object: a tag plus ordered named attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserObject {
    tag: String,
    attributes: Vec<(String, String)>,
}

impl UserObject {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Returns the element tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the value of a named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute in place, or appends it if it is new.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name.to_owned(), value)),
        }
    }

    /// Removes a named attribute, returning its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let position = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(position).1)
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// The user object stored in a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Element(UserObject),
}

impl CellValue {
    /// Creates a plain text value.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Returns the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }

    /// Returns the element, if this is an element value.
    pub fn as_element(&self) -> Option<&UserObject> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    /// Returns the element mutably, if this is an element value.
    pub fn as_element_mut(&mut self) -> Option<&mut UserObject> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<UserObject> for CellValue {
    fn from(element: UserObject) -> Self {
        Self::Element(element)
    }
}

/// Bounds of a cell. Edge geometries are usually `relative`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub relative: bool,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            relative: false,
        }
    }

    /// Returns an empty geometry marked as relative.
    pub fn relative() -> Self {
        Self {
            relative: true,
            ..Self::default()
        }
    }

    /// Returns a copy moved by `(dx, dy)`.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}
