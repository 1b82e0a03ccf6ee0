//! Node model - renderable units in intermediate and executed form.
//!
//! A renderable unit is one of exactly three kinds:
//!
//! - **Element** - wraps one host element; ordered children; may be
//!   `phantom` (contributes no container of its own, its children splice
//!   into the logical parent - fragment semantics) and may declare a
//!   `portal` target (an external, already-mounted container that receives
//!   its host node instead of the logical parent).
//! - **Text** - wraps one host text node, present even for empty content
//!   so there is always a stable attachment point.
//! - **Component** - a closure executed once per mount, wrapping exactly
//!   one child; it never owns DOM of its own.
//!
//! The same three kinds exist in two forms. The intermediate [`Tree`] is
//! unattached data produced by component execution. The executed
//! `MountedNode` is attached to real host nodes, carries parent links and
//! lifecycle callback registries, and is what the update pass patches in
//! place. Building never mutates the intermediate form; the executed tree
//! is an explicit return value of materialization.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::context::{CallbackRegistry, ComponentCtx};
use crate::dom::{Event, EventHandler, HostElement, HostNode, HostText, handler_eq};

// =============================================================================
// Intermediate tree
// =============================================================================

/// An unattached description of a renderable unit and its subtree.
pub struct Tree {
    pub(crate) kind: TreeKind,
    /// Filled with the executed node when this tree materializes; lets the
    /// subscription that produced the tree find its mounted counterpart.
    pub(crate) slot: Option<NodeSlot>,
}

pub(crate) enum TreeKind {
    Element(ElementTree),
    Text(TextTree),
    Component(ComponentTree),
}

pub(crate) struct ElementTree {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, Attr)>,
    pub(crate) children: Vec<Tree>,
    pub(crate) phantom: bool,
    pub(crate) portal: Option<HostElement>,
    pub(crate) element_ref: Option<ElementRef>,
}

pub(crate) struct TextTree {
    pub(crate) content: String,
}

pub(crate) struct ComponentTree {
    pub(crate) render: Box<dyn FnOnce(&mut ComponentCtx) -> Tree>,
}

pub(crate) type NodeSlot = Rc<RefCell<Option<MountedNode>>>;

/// Structural properties of an element node.
///
/// `children`, `element_ref`, `phantom` and `portal` are consumed by the
/// builder and never forwarded to the host document as attributes.
#[derive(Default)]
pub struct ElementProps {
    /// Ordered attribute/event props.
    pub attrs: Vec<(String, Attr)>,
    /// Ordered child trees.
    pub children: Vec<Tree>,
    /// Render no container of its own; children splice into the logical
    /// parent's DOM position.
    pub phantom: bool,
    /// Attach this element's host node to an external container instead of
    /// the logical parent. Insertion happens at mount, removal at unmount.
    pub portal: Option<HostElement>,
    /// Receives the host element at creation time, before children attach.
    pub element_ref: Option<ElementRef>,
}

/// Create an element tree.
pub fn element(tag: impl Into<String>, props: ElementProps) -> Tree {
    Tree {
        kind: TreeKind::Element(ElementTree {
            tag: tag.into(),
            attrs: props.attrs,
            children: props.children,
            phantom: props.phantom,
            portal: props.portal,
            element_ref: props.element_ref,
        }),
        slot: None,
    }
}

/// Create a text tree.
pub fn text(content: impl Into<String>) -> Tree {
    Tree {
        kind: TreeKind::Text(TextTree {
            content: content.into(),
        }),
        slot: None,
    }
}

/// Group children without a wrapper element (phantom element).
pub fn fragment(children: Vec<Tree>) -> Tree {
    element(
        "fragment",
        ElementProps {
            children,
            phantom: true,
            ..Default::default()
        },
    )
}

/// Create a component tree from a closure executed once at mount.
pub fn component<F, R>(render: F) -> Tree
where
    F: FnOnce(&mut ComponentCtx) -> R + 'static,
    R: Into<Tree>,
{
    Tree {
        kind: TreeKind::Component(ComponentTree {
            render: Box::new(move |ctx| render(ctx).into()),
        }),
        slot: None,
    }
}

impl From<&str> for Tree {
    fn from(content: &str) -> Self {
        text(content)
    }
}

impl From<String> for Tree {
    fn from(content: String) -> Self {
        text(content)
    }
}

/// `None` renders as an empty text node: present in the document, empty
/// content. This keeps a stable position for later non-empty renders.
impl From<Option<Tree>> for Tree {
    fn from(tree: Option<Tree>) -> Self {
        match tree {
            Some(tree) => tree,
            None => text(""),
        }
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// An attribute/event prop value on an element.
pub enum Attr {
    /// Plain attribute value.
    Text(String),
    /// Presence toggle: `true` sets the attribute to the empty string,
    /// `false` removes it.
    Flag(bool),
    /// Event listener; the prop name selects the event (an `on` prefix is
    /// stripped: `onClick` wires a `click` listener).
    Handler(EventHandler),
    /// Attribute helper produced by a state binding; the builder evaluates
    /// it instead of setting it literally.
    Bound(BoundAttr),
}

impl Attr {
    /// Plain attribute value.
    pub fn text(value: impl Into<String>) -> Self {
        Attr::Text(value.into())
    }

    /// Presence toggle.
    pub fn flag(value: bool) -> Self {
        Attr::Flag(value)
    }

    /// Event listener.
    pub fn on(handler: impl Fn(&Event) + 'static) -> Self {
        Attr::Handler(Rc::new(handler))
    }
}

/// The evaluated form of a dynamic attribute.
#[derive(Clone)]
pub enum AttrValue {
    /// Plain attribute value.
    Text(String),
    /// Presence toggle.
    Flag(bool),
    /// Event listener, re-attached only when its identity changes.
    Handler(EventHandler),
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

impl From<EventHandler> for AttrValue {
    fn from(value: EventHandler) -> Self {
        AttrValue::Handler(value)
    }
}

pub(crate) fn attr_value_eq(a: &AttrValue, b: &AttrValue) -> bool {
    match (a, b) {
        (AttrValue::Text(a), AttrValue::Text(b)) => a == b,
        (AttrValue::Flag(a), AttrValue::Flag(b)) => a == b,
        (AttrValue::Handler(a), AttrValue::Handler(b)) => handler_eq(a, b),
        _ => false,
    }
}

/// Attribute helper: called by the builder with the executed element and
/// attribute name; returns the initial value and registers its own
/// mount-gated subscription.
pub struct BoundAttr(pub(crate) Box<dyn FnOnce(&MountedElement, &str) -> AttrValue>);

impl BoundAttr {
    pub(crate) fn new(f: impl FnOnce(&MountedElement, &str) -> AttrValue + 'static) -> Self {
        Self(Box::new(f))
    }
}

// =============================================================================
// Element ref
// =============================================================================

/// A handle populated with the host element when it is created, before any
/// children attach. Readable from mount callbacks onward.
#[derive(Clone, Default)]
pub struct ElementRef {
    current: Rc<RefCell<Option<HostElement>>>,
}

impl ElementRef {
    /// Create an empty ref.
    pub fn new() -> Self {
        Self::default()
    }

    /// The host element, once the owning tree has been built.
    pub fn get(&self) -> Option<HostElement> {
        self.current.borrow().clone()
    }

    pub(crate) fn set(&self, element: &HostElement) {
        *self.current.borrow_mut() = Some(element.clone());
    }
}

// =============================================================================
// Executed tree
// =============================================================================

/// An executed node attached to the host document. Cheap-clone handle.
#[derive(Clone)]
pub(crate) enum MountedNode {
    Element(MountedElement),
    Text(MountedText),
    Component(MountedComponent),
}

/// Parent link of an executed node. Weak, so subtrees drop cleanly once
/// detached and unreferenced.
#[derive(Clone)]
pub(crate) enum ParentLink {
    Element(Weak<RefCell<MountedElementData>>),
    Component(Weak<RefCell<MountedComponentData>>),
}

#[derive(Clone)]
pub(crate) struct MountedElement {
    inner: Rc<RefCell<MountedElementData>>,
}

pub(crate) struct MountedElementData {
    dom: HostElement,
    phantom: bool,
    portal: Option<HostElement>,
    children: Vec<MountedNode>,
    parent: Option<ParentLink>,
    hooks: CallbackRegistry,
}

#[derive(Clone)]
pub(crate) struct MountedText {
    inner: Rc<RefCell<MountedTextData>>,
}

struct MountedTextData {
    dom: HostText,
    parent: Option<ParentLink>,
    hooks: CallbackRegistry,
}

#[derive(Clone)]
pub(crate) struct MountedComponent {
    inner: Rc<RefCell<MountedComponentData>>,
}

pub(crate) struct MountedComponentData {
    child: MountedNode,
    parent: Option<ParentLink>,
    hooks: CallbackRegistry,
}

impl MountedElement {
    pub(crate) fn new(dom: HostElement, phantom: bool, portal: Option<HostElement>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MountedElementData {
                dom,
                phantom,
                portal,
                children: Vec::new(),
                parent: None,
                hooks: CallbackRegistry::default(),
            })),
        }
    }

    pub(crate) fn from_weak(weak: &Weak<RefCell<MountedElementData>>) -> Self {
        match weak.upgrade() {
            Some(inner) => Self { inner },
            None => panic!("parent element of an executed node was dropped"),
        }
    }

    pub(crate) fn dom(&self) -> HostElement {
        self.inner.borrow().dom.clone()
    }

    pub(crate) fn phantom(&self) -> bool {
        self.inner.borrow().phantom
    }

    pub(crate) fn portal(&self) -> Option<HostElement> {
        self.inner.borrow().portal.clone()
    }

    pub(crate) fn hooks(&self) -> CallbackRegistry {
        self.inner.borrow().hooks.clone()
    }

    pub(crate) fn children(&self) -> Vec<MountedNode> {
        self.inner.borrow().children.clone()
    }

    pub(crate) fn push_child(&self, child: MountedNode) {
        self.inner.borrow_mut().children.push(child);
    }

    pub(crate) fn set_children(&self, children: Vec<MountedNode>) {
        self.inner.borrow_mut().children = children;
    }

    /// Swap `old` for `new` in the child list, keeping its position. The
    /// old node must still be listed; a stale reference here would mean a
    /// later ancestor unmount tears down the wrong subtree.
    pub(crate) fn replace_child(&self, old: &MountedNode, new: &MountedNode) {
        let mut inner = self.inner.borrow_mut();
        match inner.children.iter().position(|child| child.ptr_eq(old)) {
            Some(index) => inner.children[index] = new.clone(),
            None => panic!("stale child reference: node to replace is not in its parent's child list"),
        }
    }

    pub(crate) fn parent_link(&self) -> Option<ParentLink> {
        self.inner.borrow().parent.clone()
    }

    pub(crate) fn set_parent_link(&self, link: Option<ParentLink>) {
        self.inner.borrow_mut().parent = link;
    }

    pub(crate) fn downgrade_link(&self) -> ParentLink {
        ParentLink::Element(Rc::downgrade(&self.inner))
    }

    /// The host container this element's children insert into: its own
    /// host element, or the nearest genuine ancestor's when phantom.
    pub(crate) fn container_for_children(&self) -> HostElement {
        if !self.phantom() {
            return self.dom();
        }
        resolve_container(self.parent_link())
    }
}

impl MountedText {
    pub(crate) fn new(dom: HostText) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MountedTextData {
                dom,
                parent: None,
                hooks: CallbackRegistry::default(),
            })),
        }
    }

    pub(crate) fn dom(&self) -> HostText {
        self.inner.borrow().dom.clone()
    }

    pub(crate) fn hooks(&self) -> CallbackRegistry {
        self.inner.borrow().hooks.clone()
    }

    fn parent_link(&self) -> Option<ParentLink> {
        self.inner.borrow().parent.clone()
    }

    fn set_parent_link(&self, link: Option<ParentLink>) {
        self.inner.borrow_mut().parent = link;
    }
}

impl MountedComponent {
    /// Wrap a materialized child. The child's parent link points back at
    /// the component so patches inside it can find their way out.
    pub(crate) fn new(child: MountedNode, hooks: CallbackRegistry) -> Self {
        let component = Self {
            inner: Rc::new(RefCell::new(MountedComponentData {
                child: child.clone(),
                parent: None,
                hooks,
            })),
        };
        child.set_parent_link(Some(ParentLink::Component(Rc::downgrade(&component.inner))));
        component
    }

    pub(crate) fn from_weak(weak: &Weak<RefCell<MountedComponentData>>) -> Self {
        match weak.upgrade() {
            Some(inner) => Self { inner },
            None => panic!("parent component of an executed node was dropped"),
        }
    }

    pub(crate) fn child(&self) -> MountedNode {
        self.inner.borrow().child.clone()
    }

    /// Replace the wrapped child, relinking its parent pointer.
    pub(crate) fn set_child(&self, child: MountedNode) {
        child.set_parent_link(Some(ParentLink::Component(Rc::downgrade(&self.inner))));
        self.inner.borrow_mut().child = child;
    }

    pub(crate) fn hooks(&self) -> CallbackRegistry {
        self.inner.borrow().hooks.clone()
    }

    pub(crate) fn parent_link(&self) -> Option<ParentLink> {
        self.inner.borrow().parent.clone()
    }

    fn set_parent_link(&self, link: Option<ParentLink>) {
        self.inner.borrow_mut().parent = link;
    }
}

impl MountedNode {
    pub(crate) fn hooks(&self) -> CallbackRegistry {
        match self {
            MountedNode::Element(element) => element.hooks(),
            MountedNode::Text(text) => text.hooks(),
            MountedNode::Component(component) => component.hooks(),
        }
    }

    pub(crate) fn parent_link(&self) -> Option<ParentLink> {
        match self {
            MountedNode::Element(element) => element.parent_link(),
            MountedNode::Text(text) => text.parent_link(),
            MountedNode::Component(component) => component.parent_link(),
        }
    }

    pub(crate) fn set_parent_link(&self, link: Option<ParentLink>) {
        match self {
            MountedNode::Element(element) => element.set_parent_link(link),
            MountedNode::Text(text) => text.set_parent_link(link),
            MountedNode::Component(component) => component.set_parent_link(link),
        }
    }

    pub(crate) fn ptr_eq(&self, other: &MountedNode) -> bool {
        match (self, other) {
            (MountedNode::Element(a), MountedNode::Element(b)) => Rc::ptr_eq(&a.inner, &b.inner),
            (MountedNode::Text(a), MountedNode::Text(b)) => Rc::ptr_eq(&a.inner, &b.inner),
            (MountedNode::Component(a), MountedNode::Component(b)) => {
                Rc::ptr_eq(&a.inner, &b.inner)
            }
            _ => false,
        }
    }

    /// The host nodes this node occupies in its logical parent's container.
    ///
    /// Components resolve through their child; phantom elements resolve
    /// through all of their children in order; portal elements occupy no
    /// position in the logical parent at all (their host node lives in the
    /// portal target).
    pub(crate) fn dom_handles(&self) -> Vec<HostNode> {
        match self {
            MountedNode::Text(text) => vec![HostNode::Text(text.dom())],
            MountedNode::Component(component) => component.child().dom_handles(),
            MountedNode::Element(element) => {
                if element.portal().is_some() {
                    return Vec::new();
                }
                if element.phantom() {
                    element
                        .children()
                        .iter()
                        .flat_map(|child| child.dom_handles())
                        .collect()
                } else {
                    vec![HostNode::Element(element.dom())]
                }
            }
        }
    }

    /// The host container this node's handles belong in, found by walking
    /// parent links to the nearest genuine (non-phantom) element.
    pub(crate) fn patch_container(&self) -> HostElement {
        resolve_container(self.parent_link())
    }
}

/// Walk parent links until a genuine element provides a container.
pub(crate) fn resolve_container(start: Option<ParentLink>) -> HostElement {
    let mut link = start;
    loop {
        match link {
            None => panic!("node chain has no parent element to resolve a DOM container from"),
            Some(ParentLink::Component(weak)) => {
                link = MountedComponent::from_weak(&weak).parent_link();
            }
            Some(ParentLink::Element(weak)) => {
                let element = MountedElement::from_weak(&weak);
                if element.phantom() {
                    link = element.parent_link();
                } else {
                    return element.dom();
                }
            }
        }
    }
}
