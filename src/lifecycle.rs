//! Mount/unmount dispatch over executed trees.
//!
//! Mount runs top-down: a node's own callbacks fire before its children's,
//! so a parent's mount callback observes its subtree attached but not yet
//! notified. Unmount runs bottom-up: children tear down before the parent,
//! so a parent's unmount callback can assume its children are already gone.
//! Structural flags (phantom, portal) affect DOM placement only - dispatch
//! reaches every descendant uniformly.

use crate::node::MountedNode;

pub(crate) fn fire_mount(node: &MountedNode) {
    match node {
        MountedNode::Text(text) => text.hooks().fire_mount(),
        MountedNode::Element(element) => {
            element.hooks().fire_mount();
            for child in element.children() {
                fire_mount(&child);
            }
        }
        MountedNode::Component(component) => {
            component.hooks().fire_mount();
            fire_mount(&component.child());
        }
    }
}

pub(crate) fn fire_unmount(node: &MountedNode) {
    match node {
        MountedNode::Text(text) => text.hooks().fire_unmount(),
        MountedNode::Element(element) => {
            for child in element.children() {
                fire_unmount(&child);
            }
            element.hooks().fire_unmount();
        }
        MountedNode::Component(component) => {
            fire_unmount(&component.child());
            component.hooks().fire_unmount();
        }
    }
}
