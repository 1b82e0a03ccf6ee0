//! Reactive state container.
//!
//! [`State<T>`] holds a value and a set of fine-grained subscriptions.
//! Consumers subscribe by value ([`State::use_value`]), by derived value
//! ([`State::use_value_selector`]), by side effect ([`State::track_value`]),
//! by attribute ([`State::bind_attribute`]) or by keyed list membership
//! ([`State::use_value_iterator`]). A mutation diffs old against new
//! subscriptions and performs the minimum DOM surgery - there is no
//! virtual-DOM pass and no whole-tree re-render.
//!
//! # Equality gating
//!
//! `set` compares the new value against the current one with `PartialEq`
//! and does nothing when they are equal. Selector subscriptions compare
//! the selected value the same way (or with an explicit comparator), so a
//! mutation that leaves a selection unchanged never rebuilds that node.
//!
//! # Liveness
//!
//! A subscription is live only between the owning component's mount and
//! its unmount: hook methods register the subscription in a mount callback
//! and remove it in the paired unmount callback. State changes before
//! mount or after unmount never touch the subscription's node - no update
//! ever reaches a detached node.
//!
//! # Update ordering
//!
//! One update pass runs per value-changing `set`, in a fixed group order:
//! value selectors, then attributes, then effects, then iterators; within
//! a group, registration order. Groups are snapshotted before running, and
//! a subscription removed mid-pass (its subtree was unmounted by an
//! earlier callback) is skipped.

mod attribute;
mod iterator;

pub use iterator::IteratorItem;

use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::build;
use crate::context::{ComponentCtx, Teardown};
use crate::node::{NodeSlot, Tree, text};

// =============================================================================
// Subscription bookkeeping
// =============================================================================

/// The four subscription groups, in update order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum SubscriptionGroup {
    Selector,
    Attribute,
    Effect,
    Iterator,
}

const GROUP_ORDER: [SubscriptionGroup; 4] = [
    SubscriptionGroup::Selector,
    SubscriptionGroup::Attribute,
    SubscriptionGroup::Effect,
    SubscriptionGroup::Iterator,
];

pub(crate) type UpdateRunner<T> = Rc<dyn Fn(&T)>;

struct SubscriptionTable<T> {
    selectors: IndexMap<u64, UpdateRunner<T>>,
    attributes: IndexMap<u64, UpdateRunner<T>>,
    effects: IndexMap<u64, UpdateRunner<T>>,
    iterators: IndexMap<u64, UpdateRunner<T>>,
}

impl<T> SubscriptionTable<T> {
    fn new() -> Self {
        Self {
            selectors: IndexMap::new(),
            attributes: IndexMap::new(),
            effects: IndexMap::new(),
            iterators: IndexMap::new(),
        }
    }

    fn group(&self, group: SubscriptionGroup) -> &IndexMap<u64, UpdateRunner<T>> {
        match group {
            SubscriptionGroup::Selector => &self.selectors,
            SubscriptionGroup::Attribute => &self.attributes,
            SubscriptionGroup::Effect => &self.effects,
            SubscriptionGroup::Iterator => &self.iterators,
        }
    }

    fn group_mut(&mut self, group: SubscriptionGroup) -> &mut IndexMap<u64, UpdateRunner<T>> {
        match group {
            SubscriptionGroup::Selector => &mut self.selectors,
            SubscriptionGroup::Attribute => &mut self.attributes,
            SubscriptionGroup::Effect => &mut self.effects,
            SubscriptionGroup::Iterator => &mut self.iterators,
        }
    }
}

// =============================================================================
// State
// =============================================================================

struct StateInner<T: 'static> {
    value: RefCell<T>,
    previous: RefCell<Option<T>>,
    subscriptions: RefCell<SubscriptionTable<T>>,
    next_subscription_id: Cell<u64>,
}

/// A reactive value with fine-grained subscriptions. Cheap-clone handle;
/// clones share the value and its subscriptions.
pub struct State<T: 'static> {
    inner: Rc<StateInner<T>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Create a new [`State`] holding `value`.
pub fn create_state<T: Clone + PartialEq + 'static>(value: T) -> State<T> {
    State::new(value)
}

/// Options for [`State::track_value_with`] and friends.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct TrackOptions {
    /// Suppress the immediate invocation at registration time.
    pub skip_first_call: bool,
    /// Defer the immediate invocation until the owning component mounts.
    pub call_on_mount: bool,
}

impl<T: Clone + PartialEq + 'static> State<T> {
    /// Create a new state holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(StateInner {
                value: RefCell::new(value),
                previous: RefCell::new(None),
                subscriptions: RefCell::new(SubscriptionTable::new()),
                next_subscription_id: Cell::new(0),
            }),
        }
    }

    /// The current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// The value before the last change, if any change has happened.
    pub fn get_previous(&self) -> Option<T> {
        self.inner.previous.borrow().clone()
    }

    /// Replace the value and run the update pass.
    ///
    /// A no-op when `new_value == current` - equal values trigger no
    /// subscription work at all.
    pub fn set(&self, new_value: T) {
        if *self.inner.value.borrow() == new_value {
            return;
        }
        let old = self.inner.value.replace(new_value);
        *self.inner.previous.borrow_mut() = Some(old);
        self.run_update_pass();
    }

    /// Compute the next value from the current one, then [`set`](State::set).
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.get());
        self.set(next);
    }

    fn run_update_pass(&self) {
        let value = self.get();
        for group in GROUP_ORDER {
            let snapshot: Vec<(u64, UpdateRunner<T>)> = self
                .inner
                .subscriptions
                .borrow()
                .group(group)
                .iter()
                .map(|(id, runner)| (*id, runner.clone()))
                .collect();
            for (id, runner) in snapshot {
                // A subscription removed mid-pass belongs to a subtree an
                // earlier callback unmounted; it must not fire.
                let live = self
                    .inner
                    .subscriptions
                    .borrow()
                    .group(group)
                    .contains_key(&id);
                if live {
                    (*runner)(&value);
                }
            }
        }
    }

    pub(crate) fn add_subscription(
        &self,
        group: SubscriptionGroup,
        runner: UpdateRunner<T>,
    ) -> u64 {
        let id = self.inner.next_subscription_id.get();
        self.inner.next_subscription_id.set(id + 1);
        self.inner
            .subscriptions
            .borrow_mut()
            .group_mut(group)
            .insert(id, runner);
        id
    }

    pub(crate) fn remove_subscription(&self, group: SubscriptionGroup, id: u64) {
        // shift_remove keeps registration order for the survivors.
        self.inner
            .subscriptions
            .borrow_mut()
            .group_mut(group)
            .shift_remove(&id);
    }

    /// Register `runner` when the calling component mounts; remove it again
    /// on unmount.
    fn register_on_mount(
        &self,
        ctx: &ComponentCtx,
        group: SubscriptionGroup,
        runner: UpdateRunner<T>,
    ) {
        let state = self.clone();
        ctx.on_mount(move || {
            let id = state.add_subscription(group, runner);
            Teardown::new(move || state.remove_subscription(group, id))
        });
    }

    #[cfg(test)]
    pub(crate) fn subscription_count(&self, group: SubscriptionGroup) -> usize {
        self.inner.subscriptions.borrow().group(group).len()
    }

    // =========================================================================
    // Value subscriptions
    // =========================================================================

    /// Render the current value now and keep the rendered node in sync.
    ///
    /// `render` runs synchronously to produce the returned tree, and again
    /// on every value change after the calling component mounts, replacing
    /// the previously rendered node in place.
    pub fn use_value<R, F>(&self, ctx: &ComponentCtx, render: F) -> Tree
    where
        F: Fn(&T) -> R + 'static,
        R: Into<Tree>,
    {
        self.use_value_selector_with(ctx, T::clone, render, T::eq)
    }

    /// [`use_value`](State::use_value) with an explicit comparator over the
    /// stored value.
    pub fn use_value_with<R, F, C>(&self, ctx: &ComponentCtx, render: F, comparator: C) -> Tree
    where
        F: Fn(&T) -> R + 'static,
        R: Into<Tree>,
        C: Fn(&T, &T) -> bool + 'static,
    {
        self.use_value_selector_with(ctx, T::clone, render, comparator)
    }

    /// Render a derived value now and keep the rendered node in sync.
    ///
    /// The node is replaced only when the selected value changes
    /// (`PartialEq`); mutations that leave the selection equal keep the
    /// previously rendered node untouched, identity included.
    pub fn use_value_selector<S, SF, R, F>(
        &self,
        ctx: &ComponentCtx,
        selector: SF,
        render: F,
    ) -> Tree
    where
        SF: Fn(&T) -> S + 'static,
        S: PartialEq + 'static,
        F: Fn(&S) -> R + 'static,
        R: Into<Tree>,
    {
        self.use_value_selector_with(ctx, selector, render, S::eq)
    }

    /// [`use_value_selector`](State::use_value_selector) with an explicit
    /// comparator over the selected value.
    pub fn use_value_selector_with<S, SF, R, F, C>(
        &self,
        ctx: &ComponentCtx,
        selector: SF,
        render: F,
        comparator: C,
    ) -> Tree
    where
        SF: Fn(&T) -> S + 'static,
        S: 'static,
        F: Fn(&S) -> R + 'static,
        R: Into<Tree>,
        C: Fn(&S, &S) -> bool + 'static,
    {
        let selected = selector(&self.get());
        let mut tree: Tree = render(&selected).into();
        let slot: NodeSlot = Rc::new(RefCell::new(None));
        tree.slot = Some(slot.clone());

        // Replacements render under the bindings captured here, not under
        // whatever is ambient at update time.
        let bindings = ctx.bindings.clone();
        let last_selected = RefCell::new(selected);
        let runner: UpdateRunner<T> = Rc::new(move |value: &T| {
            let next = selector(value);
            if comparator(&last_selected.borrow(), &next) {
                return;
            }
            let current = slot.borrow().clone();
            let current = match current {
                Some(node) => node,
                None => {
                    panic!("value subscription updated before its rendered node was materialized")
                }
            };
            let replacement: Tree = render(&next).into();
            let swapped = build::swap(&current, replacement, &bindings);
            *slot.borrow_mut() = Some(swapped);
            *last_selected.borrow_mut() = next;
        });
        self.register_on_mount(ctx, SubscriptionGroup::Selector, runner);
        tree
    }

    /// The render-callback-omitted form: the value's display string as a
    /// text node, kept in sync.
    pub fn use_display(&self, ctx: &ComponentCtx) -> Tree
    where
        T: Display,
    {
        self.use_value(ctx, |value: &T| text(value.to_string()))
    }

    // =========================================================================
    // Effect subscriptions
    // =========================================================================

    /// Run a side effect for the current value and on every change.
    ///
    /// The effect is invoked immediately and synchronously at registration,
    /// then once per value change after the calling component mounts.
    pub fn track_value<F>(&self, ctx: &ComponentCtx, effect: F)
    where
        F: Fn(&T) + 'static,
    {
        self.track_value_selector_with(ctx, T::clone, effect, T::eq, TrackOptions::default());
    }

    /// [`track_value`](State::track_value) with [`TrackOptions`].
    pub fn track_value_with<F>(&self, ctx: &ComponentCtx, effect: F, options: TrackOptions)
    where
        F: Fn(&T) + 'static,
    {
        self.track_value_selector_with(ctx, T::clone, effect, T::eq, options);
    }

    /// Run a side effect for a derived value; skipped when the selection
    /// compares equal across a change.
    pub fn track_value_selector<S, SF, F>(&self, ctx: &ComponentCtx, selector: SF, effect: F)
    where
        SF: Fn(&T) -> S + 'static,
        S: PartialEq + 'static,
        F: Fn(&S) + 'static,
    {
        self.track_value_selector_with(ctx, selector, effect, S::eq, TrackOptions::default());
    }

    /// [`track_value_selector`](State::track_value_selector) with an
    /// explicit comparator and [`TrackOptions`].
    pub fn track_value_selector_with<S, SF, F, C>(
        &self,
        ctx: &ComponentCtx,
        selector: SF,
        effect: F,
        comparator: C,
        options: TrackOptions,
    ) where
        SF: Fn(&T) -> S + 'static,
        S: 'static,
        F: Fn(&S) + 'static,
        C: Fn(&S, &S) -> bool + 'static,
    {
        let selector = Rc::new(selector);
        let effect = Rc::new(effect);
        let selected = (*selector)(&self.get());
        let last_selected = Rc::new(RefCell::new(selected));

        if !options.skip_first_call {
            if options.call_on_mount {
                let state = self.clone();
                let selector = selector.clone();
                let effect = effect.clone();
                let last_selected = last_selected.clone();
                ctx.on_mount(move || {
                    // Deferred first call sees the value current at mount.
                    let current = (*selector)(&state.get());
                    (*effect)(&current);
                    *last_selected.borrow_mut() = current;
                });
            } else {
                (*effect)(&last_selected.borrow());
            }
        }

        let runner: UpdateRunner<T> = {
            let selector = selector.clone();
            let effect = effect.clone();
            let last_selected = last_selected.clone();
            Rc::new(move |value: &T| {
                let next = (*selector)(value);
                if comparator(&last_selected.borrow(), &next) {
                    return;
                }
                (*effect)(&next);
                *last_selected.borrow_mut() = next;
            })
        };
        self.register_on_mount(ctx, SubscriptionGroup::Effect, runner);
    }
}

// =============================================================================
// Tests
// =============================================================================
