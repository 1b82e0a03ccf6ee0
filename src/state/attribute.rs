//! Attribute subscriptions.
//!
//! [`State::bind_attribute`] returns an attribute helper the tree builder
//! evaluates instead of setting literally: it computes the initial value
//! for the element being built and arms a subscription gated on that
//! element's mount. State changes before the element mounts never touch
//! the host node; the binding re-syncs to the latest value when mount
//! fires, then follows every change until unmount.

use std::cell::RefCell;
use std::rc::Rc;

use crate::build::apply_attr_value;
use crate::context::Teardown;
use crate::node::{Attr, AttrValue, BoundAttr, MountedElement, attr_value_eq};

use super::{State, SubscriptionGroup, UpdateRunner};

impl<T: Clone + PartialEq + 'static> State<T> {
    /// Bind an attribute to this state's value directly.
    pub fn bind_attribute(&self) -> Attr
    where
        T: Into<AttrValue>,
    {
        self.bind_attribute_selector(T::clone)
    }

    /// Bind an attribute to a value derived from this state.
    ///
    /// Boolean selections toggle attribute presence; handler selections are
    /// re-attached as listeners only when the handler identity changes;
    /// string selections set the attribute value.
    ///
    /// ```ignore
    /// element("input", ElementProps {
    ///     attrs: vec![
    ///         ("disabled".into(), busy.bind_attribute()),
    ///         ("data-step".into(), step.bind_attribute_selector(|s: &u32| s.to_string())),
    ///     ],
    ///     ..Default::default()
    /// })
    /// ```
    pub fn bind_attribute_selector<V, SF>(&self, selector: SF) -> Attr
    where
        V: Into<AttrValue>,
        SF: Fn(&T) -> V + 'static,
    {
        let state = self.clone();
        Attr::Bound(BoundAttr::new(move |element: &MountedElement, name: &str| {
            let selector = Rc::new(selector);
            let initial: AttrValue = (*selector)(&state.get()).into();
            let dom = element.dom();
            let attr_name = name.to_string();
            let last_applied = Rc::new(RefCell::new(initial.clone()));

            let runner: UpdateRunner<T> = {
                let selector = selector.clone();
                let dom = dom.clone();
                let attr_name = attr_name.clone();
                let last_applied = last_applied.clone();
                Rc::new(move |value: &T| {
                    let next: AttrValue = (*selector)(value).into();
                    let previous = last_applied.borrow().clone();
                    apply_attr_value(&dom, &attr_name, &next, Some(&previous));
                    *last_applied.borrow_mut() = next;
                })
            };

            element.hooks().add_mount(Box::new(move || {
                // Changes between build and mount were not applied; catch
                // up to the latest value exactly once.
                let current: AttrValue = (*selector)(&state.get()).into();
                let previous = last_applied.borrow().clone();
                if !attr_value_eq(&current, &previous) {
                    apply_attr_value(&dom, &attr_name, &current, Some(&previous));
                    *last_applied.borrow_mut() = current;
                }
                let id = state.add_subscription(SubscriptionGroup::Attribute, runner);
                Teardown::new(move || state.remove_subscription(SubscriptionGroup::Attribute, id))
            }));

            initial
        }))
    }
}
