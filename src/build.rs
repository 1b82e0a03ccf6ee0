//! Tree builder - materialization, insertion and in-place patching.
//!
//! Building is two explicit operations. [`materialize`] turns an
//! intermediate tree into its executed counterpart: components run their
//! closure once inside a fresh [`ComponentCtx`], elements create their
//! host node and assign attributes, children are built depth-first. The
//! executed tree is the return value - intermediate trees are consumed,
//! never flagged or mutated in place.
//!
//! [`insert`] then splices a built node's host handles into a parent at a
//! position. A phantom element defers its children's host attachment until
//! it is inserted itself, at which point they splice directly into the
//! parent's effective container, in order, with no wrapper between them. A
//! portal element contributes nothing to the logical parent; its host node
//! enters the portal target when its mount callback fires and leaves on
//! unmount, so structural updates elsewhere never need to walk portals.
//!
//! [`swap`] is the update-pass primitive: replace one executed node with a
//! freshly built tree at the same DOM position, fire unmount on the old
//! subtree after the replacement is in place, fire mount on the new one,
//! and re-link the parent so later teardowns see the replacement.
//!
//! A panic inside a component closure propagates to the caller; there is
//! no partial-tree recovery.

use crate::context::{Bindings, ComponentCtx, Teardown};
use crate::dom::{HostElement, HostNode};
use crate::lifecycle::{fire_mount, fire_unmount};
use crate::node::{
    Attr, AttrValue, MountedComponent, MountedElement, MountedNode, MountedText, ParentLink, Tree,
    TreeKind,
};

/// Where to place host handles inside a container.
pub(crate) enum DomPosition {
    Append,
    After(HostNode),
    Before(HostNode),
}

// =============================================================================
// Materialization
// =============================================================================

/// Build the executed form of an intermediate tree.
///
/// The node is fully built (host nodes created and wired inside its own
/// subtree) but not yet attached to any parent; pair with [`insert`].
pub(crate) fn materialize(tree: Tree, bindings: &Bindings) -> MountedNode {
    let Tree { kind, slot } = tree;
    let node = match kind {
        TreeKind::Text(desc) => {
            MountedNode::Text(MountedText::new(crate::dom::HostText::new(desc.content)))
        }
        TreeKind::Component(desc) => {
            let mut ctx = ComponentCtx::new(bindings.clone());
            let result = (desc.render)(&mut ctx);
            // Bindings provided during the body flow into the subtree.
            let child = materialize(result, &ctx.bindings);
            MountedNode::Component(MountedComponent::new(child, ctx.hooks))
        }
        TreeKind::Element(desc) => {
            let dom = HostElement::new(desc.tag);
            if let Some(element_ref) = &desc.element_ref {
                element_ref.set(&dom);
            }
            let element = MountedElement::new(dom.clone(), desc.phantom, desc.portal.clone());
            for (name, attr) in desc.attrs {
                apply_attr_prop(&element, &name, attr);
            }
            if let Some(target) = desc.portal {
                let portal_dom = dom.clone();
                element.hooks().add_mount(Box::new(move || {
                    target.append_child(&HostNode::Element(portal_dom.clone()));
                    Teardown::new(move || HostNode::Element(portal_dom).detach())
                }));
            }
            for child_tree in desc.children {
                let child = materialize(child_tree, bindings);
                link_parent(&child, &element);
                element.push_child(child.clone());
                if !element.phantom() {
                    place_handles(&child.dom_handles(), &dom, DomPosition::Append);
                }
            }
            MountedNode::Element(element)
        }
    };
    if let Some(slot) = slot {
        *slot.borrow_mut() = Some(node.clone());
    }
    node
}

// =============================================================================
// Insertion
// =============================================================================

/// Point a built node at its logical parent element.
pub(crate) fn link_parent(node: &MountedNode, parent: &MountedElement) {
    node.set_parent_link(Some(parent.downgrade_link()));
}

/// Splice host handles into a container at a position, preserving order.
pub(crate) fn place_handles(handles: &[HostNode], container: &HostElement, position: DomPosition) {
    match position {
        DomPosition::Append => {
            for handle in handles {
                container.append_child(handle);
            }
        }
        DomPosition::After(anchor) => {
            let mut cursor = anchor;
            for handle in handles {
                container.insert_after(handle, &cursor);
                cursor = handle.clone();
            }
        }
        DomPosition::Before(anchor) => {
            for handle in handles {
                container.insert_before(handle, &anchor);
            }
        }
    }
}

/// Attach a built node under a parent: parent link, child list entry, and
/// host handles spliced into the parent's effective container.
pub(crate) fn insert(node: &MountedNode, parent: &MountedElement, position: DomPosition) {
    link_parent(node, parent);
    parent.push_child(node.clone());
    let container = parent.container_for_children();
    place_handles(&node.dom_handles(), &container, position);
}

// =============================================================================
// Patching
// =============================================================================

/// Replace an executed node in place with a freshly built tree.
///
/// The new handles enter at the old node's position before the old ones
/// leave, unmount fires on the old subtree after the replacement is
/// visible, mount fires on the new subtree, and the parent is re-linked so
/// a later ancestor unmount tears down the replacement rather than a stale
/// reference. An old node that resolved to no host handles (an empty
/// phantom) has lost its position; the replacement is appended.
pub(crate) fn swap(old: &MountedNode, replacement: Tree, bindings: &Bindings) -> MountedNode {
    let container = old.patch_container();
    let new_node = materialize(replacement, bindings);
    let old_handles = old.dom_handles();
    let new_handles = new_node.dom_handles();
    match old_handles.first() {
        Some(anchor) => place_handles(&new_handles, &container, DomPosition::Before(anchor.clone())),
        None => place_handles(&new_handles, &container, DomPosition::Append),
    }
    for handle in &old_handles {
        handle.detach();
    }
    fire_unmount(old);
    fire_mount(&new_node);
    relink(old, &new_node);
    new_node
}

fn relink(old: &MountedNode, new: &MountedNode) {
    let link = match old.parent_link() {
        Some(link) => link,
        None => panic!("cannot replace a node that has no parent"),
    };
    match &link {
        ParentLink::Element(weak) => {
            let element = MountedElement::from_weak(weak);
            element.replace_child(old, new);
            new.set_parent_link(Some(link.clone()));
        }
        ParentLink::Component(weak) => {
            MountedComponent::from_weak(weak).set_child(new.clone());
        }
    }
}

// =============================================================================
// Attributes
// =============================================================================

fn apply_attr_prop(element: &MountedElement, name: &str, attr: Attr) {
    let dom = element.dom();
    match attr {
        Attr::Text(value) => apply_attr_value(&dom, name, &AttrValue::Text(value), None),
        Attr::Flag(value) => apply_attr_value(&dom, name, &AttrValue::Flag(value), None),
        Attr::Handler(value) => apply_attr_value(&dom, name, &AttrValue::Handler(value), None),
        Attr::Bound(bound) => {
            let initial = (bound.0)(element, name);
            apply_attr_value(&dom, name, &initial, None);
        }
    }
}

/// Write one attribute value to the host element.
///
/// Flags toggle attribute presence. Handlers diff against the previous
/// handler by identity and re-attach the listener only when it changed.
/// Everything else goes through the plain attribute-set primitive.
pub(crate) fn apply_attr_value(
    dom: &HostElement,
    name: &str,
    value: &AttrValue,
    previous: Option<&AttrValue>,
) {
    match value {
        AttrValue::Flag(true) => dom.set_attribute(name, ""),
        AttrValue::Flag(false) => dom.remove_attribute(name),
        AttrValue::Handler(next) => {
            let event = event_name(name);
            if let Some(AttrValue::Handler(prev)) = previous {
                if crate::dom::handler_eq(prev, next) {
                    return;
                }
                dom.remove_event_listener(&event, prev);
            }
            dom.add_event_listener(&event, next.clone());
        }
        AttrValue::Text(text) => dom.set_attribute(name, text),
    }
}

/// Event name for a handler prop: strip the `on` prefix and lowercase, so
/// `onClick` and `onclick` both wire a `click` listener.
pub(crate) fn event_name(attr_name: &str) -> String {
    match attr_name.strip_prefix("on") {
        Some(rest) => rest.to_ascii_lowercase(),
        None => attr_name.to_ascii_lowercase(),
    }
}
