use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter behind every lazily assigned token.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(0);

/// A stable, unique label for one object, of the form `Kind#N`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityToken(Arc<str>);

impl IdentityToken {
    /// Wraps an existing label. The caller is responsible for uniqueness.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    /// Allocates a fresh token for an object of the given kind.
    fn allocate(kind: &str) -> Self {
        let n = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        Self(format!("{kind}#{n}").into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentityToken").field(&&*self.0).finish()
    }
}

/// Anything that can name itself with an [`IdentityToken`].
///
/// Implementations must return the same token for the same object for as long
/// as it lives, and distinct tokens for distinct objects.
pub trait Identified {
    /// Returns this object's identity token.
    fn identity(&self) -> IdentityToken;
}

impl<T: Identified + ?Sized> Identified for &T {
    fn identity(&self) -> IdentityToken {
        (**self).identity()
    }
}

impl<T: Identified + ?Sized> Identified for Rc<T> {
    fn identity(&self) -> IdentityToken {
        (**self).identity()
    }
}

impl<T: Identified + ?Sized> Identified for Box<T> {
    fn identity(&self) -> IdentityToken {
        (**self).identity()
    }
}

/// An identity slot embedded in an object.
///
/// The token is assigned on first use. Cloning an `ObjectId` yields an
/// unassigned slot of the same kind: a copy of an object is a different object.
///
/// # Example
///
/// ```
/// use cellflow_core::identity::{Identified, ObjectId};
///
/// struct Shape {
///     id: ObjectId,
/// }
///
/// impl Identified for Shape {
///     fn identity(&self) -> cellflow_core::identity::IdentityToken {
///         self.id.token()
///     }
/// }
///
/// let a = Shape { id: ObjectId::new("Shape") };
/// let b = Shape { id: ObjectId::new("Shape") };
/// assert_eq!(a.identity(), a.identity());
/// assert_ne!(a.identity(), b.identity());
/// ```
pub struct ObjectId {
    kind: &'static str,
    token: OnceCell<IdentityToken>,
}

impl ObjectId {
    /// Creates an unassigned slot for an object of the given kind.
    pub const fn new(kind: &'static str) -> Self {
        Self {
            kind,
            token: OnceCell::new(),
        }
    }

    /// Returns the token, assigning one if this is the first request.
    pub fn token(&self) -> IdentityToken {
        self.token
            .get_or_init(|| IdentityToken::allocate(self.kind))
            .clone()
    }

    /// Returns `true` once a token has been handed out.
    pub fn is_assigned(&self) -> bool {
        self.token.get().is_some()
    }

    /// Returns the kind used as the token prefix.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Releases the token. The next request assigns a fresh one.
    pub fn clear(&mut self) {
        self.token.take();
    }
}

impl Clone for ObjectId {
    fn clone(&self) -> Self {
        Self::new(self.kind)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token.get() {
            Some(token) => write!(f, "ObjectId({token})"),
            None => write!(f, "ObjectId({}#?)", self.kind),
        }
    }
}

impl Identified for ObjectId {
    fn identity(&self) -> IdentityToken {
        self.token()
    }
}
