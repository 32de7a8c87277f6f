//! The synchronous event dispatcher.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::{EventKind, EventObject};
use crate::identity::{Identified, IdentityToken, ObjectId};

/// A registered callback, invoked with `(sender, event)`.
///
/// Listener handles are compared by pointer identity: clone the handle to
/// register the same callback several times, and pass any clone to
/// [`EventBus::remove_listener`] to drop every registration at once.
pub type Listener = Rc<dyn Fn(&IdentityToken, &EventObject<'_>)>;

/// Wraps a closure into a [`Listener`] handle.
pub fn listener<F>(callback: F) -> Listener
where
    F: Fn(&IdentityToken, &EventObject<'_>) + 'static,
{
    Rc::new(callback)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// One `(name, callback)` pair. `name == None` is the wildcard.
struct Registration {
    name: Option<EventKind>,
    listener: Listener,
    /// Cleared on removal so an in-flight dispatch skips it.
    live: Cell<bool>,
}

impl Registration {
    fn matches(&self, kind: EventKind) -> bool {
        self.name.is_none_or(|name| name == kind)
    }
}

/// Synchronous publish/subscribe dispatcher.
///
/// Registrations are kept in a flat list in registration order; the same
/// callback may appear any number of times under the same or different names.
///
/// All methods take `&self`, so a listener holding an `Rc<EventBus>` may call
/// back into the bus while it is dispatching:
///
/// - a nested [`fire_event`](Self::fire_event) runs to completion before the
///   outer dispatch resumes;
/// - a listener removed mid-dispatch is not invoked for the rest of it;
/// - a listener added mid-dispatch is first invoked by the next dispatch.
///
/// The bus is single-threaded and does no locking.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use cellflow_core::event::{EventBus, EventKind, EventObject};
///
/// let bus = EventBus::new();
/// let hits = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&hits);
/// bus.listen(Some(EventKind::Change), move |_sender, _event| {
///     counter.set(counter.get() + 1);
/// });
///
/// bus.fire_event(&EventObject::new(EventKind::Change), None);
/// bus.fire_event(&EventObject::new(EventKind::Undo), None);
/// assert_eq!(hits.get(), 1);
/// ```
pub struct EventBus {
    object_id: ObjectId,
    registrations: RefCell<Vec<Rc<Registration>>>,
    enabled: Cell<bool>,
    source: RefCell<Option<IdentityToken>>,
}

impl EventBus {
    /// Creates an enabled bus with no configured source.
    pub fn new() -> Self {
        Self {
            object_id: ObjectId::new("EventBus"),
            registrations: RefCell::new(Vec::new()),
            enabled: Cell::new(true),
            source: RefCell::new(None),
        }
    }

    /// Creates a bus that reports `source` as the sender by default.
    pub fn with_source(source: IdentityToken) -> Self {
        let bus = Self::new();
        bus.set_source(Some(source));
        bus
    }

    /// Returns the configured default sender.
    pub fn source(&self) -> Option<IdentityToken> {
        self.source.borrow().clone()
    }

    /// Sets the default sender. `None` makes the bus report itself.
    pub fn set_source(&self, source: Option<IdentityToken>) {
        *self.source.borrow_mut() = source;
    }

    /// Returns `true` while dispatch is enabled.
    pub fn is_events_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Opens or closes the dispatch gate. Registration is unaffected.
    pub fn set_events_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Registers `listener` for events named `name`, or for every event when
    /// `name` is `None`.
    pub fn add_listener(&self, name: Option<EventKind>, listener: Listener) {
        self.registrations.borrow_mut().push(Rc::new(Registration {
            name,
            listener,
            live: Cell::new(true),
        }));
    }

    /// Registers a closure and returns its handle for later removal.
    pub fn listen<F>(&self, name: Option<EventKind>, callback: F) -> Listener
    where
        F: Fn(&IdentityToken, &EventObject<'_>) + 'static,
    {
        let handle = listener(callback);
        self.add_listener(name, Rc::clone(&handle));
        handle
    }

    /// Removes every registration of `listener`, whatever name it was
    /// registered under. Returns how many registrations were dropped.
    pub fn remove_listener(&self, listener: &Listener) -> usize {
        let mut registrations = self.registrations.borrow_mut();
        let before = registrations.len();
        registrations.retain(|registration| {
            if same_listener(&registration.listener, listener) {
                registration.live.set(false);
                false
            } else {
                true
            }
        });
        before - registrations.len()
    }

    /// Returns the number of registrations.
    pub fn listener_count(&self) -> usize {
        self.registrations.borrow().len()
    }

    /// Dispatches `event` to every matching registration, in registration order.
    ///
    /// The sender passed to listeners is `sender` if given, otherwise the
    /// configured source, otherwise this bus. Does nothing while events are
    /// disabled.
    pub fn fire_event(&self, event: &EventObject<'_>, sender: Option<&IdentityToken>) {
        if !self.enabled.get() {
            return;
        }

        let sender = match sender {
            Some(sender) => sender.clone(),
            None => self.source().unwrap_or_else(|| self.object_id.token()),
        };

        // Dispatch from a snapshot so listeners can re-enter the bus.
        let snapshot: Vec<Rc<Registration>> = self.registrations.borrow().clone();
        log::trace!(
            "dispatching `{}` from {} to {} registrations",
            event.name(),
            sender,
            snapshot.len()
        );

        for registration in &snapshot {
            if registration.live.get() && registration.matches(event.kind()) {
                (registration.listener)(&sender, event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Identified for EventBus {
    fn identity(&self) -> IdentityToken {
        self.object_id.token()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("enabled", &self.enabled.get())
            .field("source", &self.source.borrow())
            .finish()
    }
}
