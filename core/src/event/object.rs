use std::any::Any;
use std::cell::Cell;
use std::fmt;

use super::EventKind;
use crate::identity::IdentityToken;

/// One payload value attached to an [`EventObject`].
///
/// [`Object`](Property::Object) borrows an arbitrary value (a change, an edit)
/// for the duration of the dispatch; observers recover the concrete type with
/// [`downcast`](Property::downcast).
#[derive(Clone)]
pub enum Property<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Token(IdentityToken),
    Object(&'a dyn Any),
}

impl<'a> Property<'a> {
    /// Borrows `value` as an [`Object`](Property::Object) payload.
    pub fn object<T: Any>(value: &'a T) -> Self {
        Self::Object(value)
    }

    /// Returns the value if this is a [`Bool`](Property::Bool).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value if this is an [`Int`](Property::Int).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value if this is a [`Float`](Property::Float).
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the value if this is a [`Text`](Property::Text).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value if this is a [`Token`](Property::Token).
    pub fn as_token(&self) -> Option<&IdentityToken> {
        match self {
            Self::Token(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the borrowed object if it is a `T`.
    pub fn downcast<T: Any>(&self) -> Option<&'a T> {
        match *self {
            Self::Object(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Property<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Token(t) => f.debug_tuple("Token").field(t).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl From<bool> for Property<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Property<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Property<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Property<'_> {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Property<'_> {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<IdentityToken> for Property<'_> {
    fn from(value: IdentityToken) -> Self {
        Self::Token(value)
    }
}

/// A named signal with an ordered key/value payload.
///
/// Events are built by the emitter and only read by listeners. The one piece
/// of shared state is the `consumed` flag, which listeners may raise to tell
/// the emitter that the event was handled; it does not stop the dispatch.
///
/// ```
/// use cellflow_core::event::{EventKind, EventObject};
///
/// let event = EventObject::new(EventKind::Change).with("count", 3_i64);
/// assert_eq!(event.name(), "change");
/// assert_eq!(event.property("count").and_then(|p| p.as_int()), Some(3));
/// ```
#[derive(Debug)]
pub struct EventObject<'a> {
    kind: EventKind,
    properties: Vec<(String, Property<'a>)>,
    consumed: Cell<bool>,
}

impl<'a> EventObject<'a> {
    /// Creates an event with an empty payload.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
            consumed: Cell::new(false),
        }
    }

    /// Adds a payload entry, replacing an earlier entry with the same key in place.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Property<'a>>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((key, value)),
        }
        self
    }

    /// Returns the event kind.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the wire spelling of the event name.
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Looks up a payload entry by key.
    pub fn property(&self, key: &str) -> Option<&Property<'a>> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterates over the payload in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property<'a>)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Shorthand for looking up an [`Object`](Property::Object) entry of type `T`.
    pub fn object<T: std::any::Any>(&self, key: &str) -> Option<&'a T> {
        self.property(key).and_then(Property::downcast)
    }

    /// Marks the event as handled.
    pub fn consume(&self) {
        self.consumed.set(true);
    }

    /// Returns `true` once a listener has called [`consume`](Self::consume).
    pub fn is_consumed(&self) -> bool {
        self.consumed.get()
    }
}
