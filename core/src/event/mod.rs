//! Synchronous publish/subscribe event dispatch.
//!
//! - [`EventKind`]: closed set of event names the engine emits
//! - [`EventObject`]: a named signal with an ordered key/value payload
//! - [`EventBus`]: registration list plus dispatcher
//!
//! Dispatch is synchronous and reentrant: a listener may fire further events,
//! register new listeners or remove existing ones while a dispatch is running.

mod bus;
mod kind;
mod object;

pub use bus::{EventBus, Listener, listener};
pub use kind::{EventKind, UnknownEventKind};
pub use object::{EventObject, Property};
