//! Render context - lifecycle registration and ambient bindings.
//!
//! Every component closure receives a [`ComponentCtx`] for the duration of
//! its synchronous execution. It carries two things:
//!
//! - the component's mount/unmount registration surface
//!   ([`ComponentCtx::on_mount`] / [`ComponentCtx::on_unmount`]), and
//! - the ambient context bindings ([`Context::provide`] /
//!   [`Context::read`]) inherited from the enclosing component.
//!
//! The context is threaded as an explicit argument through every build and
//! re-execution path instead of living in a process-wide stack. Hook calls
//! outside a component are therefore unrepresentable, and a panic inside a
//! component body cannot corrupt shared bookkeeping for later renders.
//!
//! # Bindings are copy-on-write
//!
//! Bindings are an `Rc`-shared map. Providing a value clones the map and
//! overrides one entry, so a binding added in one component is visible to
//! its descendants but never to sibling branches. Deferred re-executions
//! (update-pass renders, keyed-list item creation) capture the bindings
//! that were current when the subscription was created, not whatever is
//! ambient at update time.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::mem;
use std::rc::Rc;

use crate::error::ContextError;
use crate::node::{Tree, component};

thread_local! {
    /// Counter for generating unique context ids.
    static NEXT_CONTEXT_ID: Cell<u64> = const { Cell::new(0) };
}

fn next_context_id() -> u64 {
    NEXT_CONTEXT_ID.with(|counter| {
        let id = counter.get();
        counter.set(id + 1);
        id
    })
}

// =============================================================================
// Teardown
// =============================================================================

/// Cleanup returned by a mount callback.
///
/// A mount callback that returns a [`Teardown`] has it registered
/// automatically as an unmount callback for the same component - the only
/// implicit registration rule. Returning `()` registers nothing.
pub struct Teardown(Option<Box<dyn FnOnce()>>);

impl Teardown {
    /// A teardown that does nothing.
    pub fn none() -> Self {
        Self(None)
    }

    /// Wrap a cleanup closure.
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    pub(crate) fn into_inner(self) -> Option<Box<dyn FnOnce()>> {
        self.0
    }
}

/// Shorthand for [`Teardown::new`].
pub fn teardown(f: impl FnOnce() + 'static) -> Teardown {
    Teardown::new(f)
}

/// Conversion for mount-callback return values.
pub trait IntoTeardown {
    /// Convert into an optional cleanup.
    fn into_teardown(self) -> Teardown;
}

impl IntoTeardown for () {
    fn into_teardown(self) -> Teardown {
        Teardown::none()
    }
}

impl IntoTeardown for Teardown {
    fn into_teardown(self) -> Teardown {
        self
    }
}

// =============================================================================
// Callback registry
// =============================================================================

pub(crate) type MountCallback = Box<dyn FnOnce() -> Teardown>;
pub(crate) type UnmountCallback = Box<dyn FnOnce()>;

/// Mount/unmount callbacks for one executed node. Cheap-clone handle.
#[derive(Clone, Default)]
pub(crate) struct CallbackRegistry {
    inner: Rc<RefCell<CallbackSets>>,
}

#[derive(Default)]
struct CallbackSets {
    mount: Vec<MountCallback>,
    unmount: Vec<UnmountCallback>,
}

impl CallbackRegistry {
    pub(crate) fn add_mount(&self, callback: MountCallback) {
        self.inner.borrow_mut().mount.push(callback);
    }

    pub(crate) fn add_unmount(&self, callback: UnmountCallback) {
        self.inner.borrow_mut().unmount.push(callback);
    }

    /// Drain and run mount callbacks; returned teardowns become unmount
    /// callbacks. Loops so callbacks registered during the drain still run.
    pub(crate) fn fire_mount(&self) {
        loop {
            let batch = mem::take(&mut self.inner.borrow_mut().mount);
            if batch.is_empty() {
                break;
            }
            for callback in batch {
                if let Some(cleanup) = callback().into_inner() {
                    self.add_unmount(cleanup);
                }
            }
        }
    }

    /// Drain and run unmount callbacks in registration order.
    pub(crate) fn fire_unmount(&self) {
        loop {
            let batch = mem::take(&mut self.inner.borrow_mut().unmount);
            if batch.is_empty() {
                break;
            }
            for callback in batch {
                callback();
            }
        }
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// Ambient context bindings: context id -> value.
#[derive(Clone, Default)]
pub(crate) struct Bindings {
    map: Rc<HashMap<u64, Rc<dyn Any>>>,
}

impl Bindings {
    fn lookup(&self, id: u64) -> Option<Rc<dyn Any>> {
        self.map.get(&id).cloned()
    }

    /// Copy-on-write insert. The shared ancestor map is never mutated.
    fn with(&self, id: u64, value: Rc<dyn Any>) -> Bindings {
        let mut map: HashMap<u64, Rc<dyn Any>> = (*self.map).clone();
        map.insert(id, value);
        Bindings { map: Rc::new(map) }
    }
}

// =============================================================================
// Component context
// =============================================================================

/// The execution context of a component closure.
///
/// Exists only while the component body runs; lifecycle registration and
/// context reads go through it.
pub struct ComponentCtx {
    pub(crate) hooks: CallbackRegistry,
    pub(crate) bindings: Bindings,
}

impl ComponentCtx {
    pub(crate) fn new(bindings: Bindings) -> Self {
        Self {
            hooks: CallbackRegistry::default(),
            bindings,
        }
    }

    /// Register a callback to run when this component mounts.
    ///
    /// The callback may return a [`Teardown`], which is registered as an
    /// unmount callback for the same component:
    ///
    /// ```ignore
    /// ctx.on_mount(|| {
    ///     let timer = start_timer();
    ///     teardown(move || timer.stop())
    /// });
    /// ```
    pub fn on_mount<R, F>(&self, callback: F)
    where
        F: FnOnce() -> R + 'static,
        R: IntoTeardown,
    {
        self.hooks
            .add_mount(Box::new(move || callback().into_teardown()));
    }

    /// Register a callback to run when this component unmounts.
    pub fn on_unmount(&self, callback: impl FnOnce() + 'static) {
        self.hooks.add_unmount(Box::new(callback));
    }
}

// =============================================================================
// Context
// =============================================================================

/// A typed ambient value flowing from providers to descendant components,
/// independent of props.
///
/// ```ignore
/// let theme: Context<String> = create_context();
///
/// let app = component(move |ctx| {
///     theme.provide(ctx, "dark".to_string());
///     // ... children read it with `theme.read(ctx)`
///     child_tree
/// });
/// ```
pub struct Context<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Context<T> {}

/// Create a fresh context capability with a unique id.
pub fn create_context<T: Clone + 'static>() -> Context<T> {
    Context::new()
}

impl<T: Clone + 'static> Context<T> {
    /// Create a fresh context capability with a unique id.
    pub fn new() -> Self {
        Self {
            id: next_context_id(),
            _marker: PhantomData,
        }
    }

    /// Bind a value for the executing component and its descendants.
    pub fn provide(&self, ctx: &mut ComponentCtx, value: T) {
        ctx.bindings = ctx.bindings.with(self.id, Rc::new(value));
    }

    /// Read the nearest provided value.
    ///
    /// Panics if no enclosing component provided one - reading an unbound
    /// context is a programming error, not a silent `None`. Use
    /// [`Context::try_read`] to probe.
    pub fn read(&self, ctx: &ComponentCtx) -> T {
        match self.try_read(ctx) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Read the nearest provided value, or report why there is none.
    pub fn try_read(&self, ctx: &ComponentCtx) -> Result<T, ContextError> {
        let bound = ctx
            .bindings
            .lookup(self.id)
            .ok_or(ContextError::Unbound { id: self.id })?;
        match bound.downcast_ref::<T>() {
            Some(value) => Ok(value.clone()),
            None => Err(ContextError::TypeMismatch { id: self.id }),
        }
    }

    /// A component that provides `value` and renders `child` beneath it.
    pub fn provider(self, value: T, child: Tree) -> Tree {
        component(move |ctx| {
            self.provide(ctx, value);
            child
        })
    }
}

impl<T: Clone + 'static> Default for Context<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
