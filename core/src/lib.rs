//! # cellflow core
//!
//! Transactional change and undo engine for mutable cell graphs.
//!
//! - [`identity`]: stable identity tokens and an identity-keyed map
//! - [`event`]: synchronous publish/subscribe bus
//! - [`change`]: self-inverting change commands and the [`Model`](change::Model) contract
//! - [`edit`]: undoable edits and the undo history
//! - [`graph`]: an in-memory cell graph implementing the model contract
//! - [`config`]: TOML engine configuration
//!
//! Everything here is single-threaded and synchronous. Hosts that share an
//! edit, bus or model between threads must provide their own locking.

pub mod change;
pub mod config;
pub mod edit;
pub mod event;
pub mod graph;
pub mod identity;

#[cfg(test)]
mod testing;

pub use change::{Change, Model};
pub use config::EngineConfig;
pub use edit::{Edit, UndoManager};
pub use event::{EventBus, EventKind, EventObject};
pub use graph::GraphModel;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
