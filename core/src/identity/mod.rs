//! Object identity and identity-keyed storage.
//!
//! Rust values have no notion of reference identity that survives a move, so
//! objects that need one embed an [`ObjectId`] slot. The slot hands out an
//! [`IdentityToken`] lazily, the first time somebody asks for it, and keeps
//! returning the same token afterwards.
//!
//! - [`Identified`]: anything that can name itself with a token
//! - [`ObjectId`]: embeddable, lazily assigned identity slot
//! - [`IdentityKeyedMap`]: a map keyed by identity rather than by equality
//!
//! Two structurally equal objects carry two different tokens, so they occupy
//! two different slots in an [`IdentityKeyedMap`].

mod dictionary;
mod object_id;

pub use dictionary::IdentityKeyedMap;
pub use object_id::{Identified, IdentityToken, ObjectId};
