//! Mount entry point - attach a tree to a host container.
//!
//! [`attach`] wraps the tree in an internal container element so top-level
//! conditional rendering and mount callbacks work uniformly, builds the
//! executed tree, appends it to the host, and fires mount callbacks. The
//! returned [`MountHandle`] detaches the whole thing again; teardown is
//! symmetric with mount - every descendant's unmount callbacks fire before
//! the container leaves the host. Dropping a still-attached handle runs
//! the same teardown.

use crate::build::{self, DomPosition};
use crate::context::Bindings;
use crate::dom::{HostElement, HostNode};
use crate::lifecycle::{fire_mount, fire_unmount};
use crate::node::{MountedElement, MountedNode, Tree};

/// Handle returned by [`attach`] that allows detaching.
pub struct MountHandle {
    root: MountedElement,
    node: Option<MountedNode>,
}

impl MountHandle {
    /// The internal container element holding the mounted tree.
    pub fn container(&self) -> HostElement {
        self.root.dom()
    }

    /// Fire unmount for the entire subtree, then remove the container from
    /// the host.
    pub fn detach(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(node) = self.node.take() {
            fire_unmount(&node);
            HostNode::Element(self.root.dom()).detach();
        }
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Build `tree`, append it to `host` inside an internal container element,
/// and fire mount callbacks top-down.
///
/// ```ignore
/// let host = HostElement::new("body");
/// let handle = attach(&host, component(app));
/// // ...
/// handle.detach();
/// ```
pub fn attach(host: &HostElement, tree: impl Into<Tree>) -> MountHandle {
    let container = HostElement::new("div");
    let root = MountedElement::new(container.clone(), false, None);
    let node = build::materialize(tree.into(), &Bindings::default());
    build::insert(&node, &root, DomPosition::Append);
    host.append_child(&HostNode::Element(container));
    fire_mount(&node);
    MountHandle {
        root,
        node: Some(node),
    }
}
