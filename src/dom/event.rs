//! Host document events.
//!
//! Events carry a name and a set of modifier flags. Handlers are shared
//! `Rc` closures so the same handler can be attached, compared by identity,
//! and detached again - the update pass relies on identity comparison to
//! decide whether a listener needs re-attaching.

use std::rc::Rc;

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held while an event fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventModifiers: u8 {
        const SHIFT   = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT     = 1 << 2;
        const META    = 1 << 3;
    }
}

/// An event dispatched against a host element.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    modifiers: EventModifiers,
}

impl Event {
    /// Create an event with no modifiers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: EventModifiers::empty(),
        }
    }

    /// Create an event with the given modifier flags.
    pub fn with_modifiers(name: impl Into<String>, modifiers: EventModifiers) -> Self {
        Self {
            name: name.into(),
            modifiers,
        }
    }

    /// The event name ("click", "input", ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Modifier keys held while the event fired.
    pub fn modifiers(&self) -> EventModifiers {
        self.modifiers
    }
}

/// Event callback type (Rc for shared ownership in closures).
///
/// Using `Rc<dyn Fn>` instead of `Box<dyn Fn>` allows cloning callbacks
/// into closures without ownership issues, and gives handlers a stable
/// identity for listener diffing.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Wrap a closure as a shareable [`EventHandler`].
pub fn handler(f: impl Fn(&Event) + 'static) -> EventHandler {
    Rc::new(f)
}

/// Compare two handlers by identity.
pub fn handler_eq(a: &EventHandler, b: &EventHandler) -> bool {
    Rc::ptr_eq(a, b)
}
