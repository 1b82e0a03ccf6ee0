//! # weft
//!
//! Reactive UI rendering library with fine-grained state subscriptions.
//!
//! weft builds a tree of renderable nodes (elements, text, components,
//! fragments, portals), mounts it into a host document, and keeps it
//! synchronized with application state through per-subscription updates.
//! There is no virtual-DOM diff pass and no whole-tree re-render: a state
//! change re-invokes exactly the render callbacks subscribed to it and
//! patches the affected host nodes in place.
//!
//! The pipeline is two explicit passes:
//! ```text
//! Component Tree (intermediate) → materialize → Executed Tree → mount callbacks
//!                                                    ↑
//!                                  State change → update pass (in-place patch)
//! ```
//!
//! ## Modules
//!
//! - [`dom`] - In-memory host document (elements, text, listeners, dispatch)
//! - [`node`] - Node model: intermediate trees and executed nodes
//! - [`context`] - Component execution context, lifecycle hooks, ambient bindings
//! - [`state`] - Reactive state container and subscriptions
//! - [`mount`] - Mount entry point and teardown handle
//!
//! ## Example
//!
//! ```ignore
//! let count = create_state(0);
//! let host = HostElement::new("body");
//!
//! let handle = attach(&host, component(move |ctx| {
//!     element("div", ElementProps {
//!         children: vec![
//!             count.use_value(ctx, |c| text(format!("count: {c}"))),
//!         ],
//!         ..Default::default()
//!     })
//! }));
//!
//! count.update(|c| c + 1);
//! ```

pub mod context;
pub mod dom;
pub mod error;
pub mod mount;
pub mod node;
pub mod state;

mod build;
mod lifecycle;

// Re-export commonly used items

pub use context::{
    ComponentCtx, Context, IntoTeardown, Teardown, create_context, teardown,
};

pub use dom::{
    Event, EventHandler, EventModifiers, HostElement, HostNode, HostText, handler, handler_eq,
};

pub use error::ContextError;

pub use mount::{MountHandle, attach};

pub use node::{
    Attr, AttrValue, ElementProps, ElementRef, Tree, component, element, fragment, text,
};

pub use state::{IteratorItem, State, TrackOptions, create_state};
