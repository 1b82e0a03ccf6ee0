//! In-memory host document.
//!
//! The rendering core consumes the host document through a deliberately
//! narrow contract: create elements and text nodes, mutate attributes,
//! attach/detach event listeners, splice ordered children, read text
//! content. This module implements that contract in memory so the library
//! runs and tests headlessly. There is no layout and no styling.
//!
//! Handles ([`HostElement`], [`HostText`]) are cheap `Rc` clones; two
//! handles compare equal with `ptr_eq` when they refer to the same node.
//! Parent links are weak, children are strong, so dropping a detached
//! subtree frees it.

mod event;

pub use event::{Event, EventHandler, EventModifiers, handler, handler_eq};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

// =============================================================================
// Element
// =============================================================================

/// A host document element: tag, attributes, listeners, ordered children.
#[derive(Clone)]
pub struct HostElement {
    inner: Rc<RefCell<ElementData>>,
}

struct ElementData {
    tag: String,
    attributes: BTreeMap<String, String>,
    listeners: Vec<(String, EventHandler)>,
    children: Vec<HostNode>,
    parent: Option<Weak<RefCell<ElementData>>>,
}

impl HostElement {
    /// Create a detached element with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ElementData {
                tag: tag.into(),
                attributes: BTreeMap::new(),
                listeners: Vec::new(),
                children: Vec::new(),
                parent: None,
            })),
        }
    }

    /// The element's tag name.
    pub fn tag(&self) -> String {
        self.inner.borrow().tag.clone()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &HostElement) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.inner
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    /// Remove an attribute if present.
    pub fn remove_attribute(&self, name: &str) {
        self.inner.borrow_mut().attributes.remove(name);
    }

    /// Read an attribute value.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.borrow().attributes.get(name).cloned()
    }

    /// Whether the attribute is present (including empty-string values).
    pub fn has_attribute(&self, name: &str) -> bool {
        self.inner.borrow().attributes.contains_key(name)
    }

    // -------------------------------------------------------------------------
    // Event listeners
    // -------------------------------------------------------------------------

    /// Attach a listener for the named event.
    pub fn add_event_listener(&self, event: &str, handler: EventHandler) {
        self.inner
            .borrow_mut()
            .listeners
            .push((event.to_string(), handler));
    }

    /// Detach a previously attached listener, matched by identity.
    pub fn remove_event_listener(&self, event: &str, handler: &EventHandler) {
        self.inner
            .borrow_mut()
            .listeners
            .retain(|(name, attached)| !(name == event && handler_eq(attached, handler)));
    }

    /// Number of listeners attached for the named event.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    /// Synchronously invoke every listener registered for the event's name.
    ///
    /// Listeners are snapshotted before the first call, so a handler that
    /// attaches or detaches listeners does not affect the current dispatch.
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, event: &Event) -> usize {
        let handlers: Vec<EventHandler> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event.name())
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in &handlers {
            (*handler)(event);
        }
        handlers.len()
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    /// Append a node as the last child. Detaches it from any previous parent.
    pub fn append_child(&self, child: &HostNode) {
        child.detach();
        let index = self.inner.borrow().children.len();
        self.insert_at(child, index);
    }

    /// Insert a node as the first child. Detaches it from any previous parent.
    pub fn prepend_child(&self, child: &HostNode) {
        child.detach();
        self.insert_at(child, 0);
    }

    /// Insert a node immediately before the reference child.
    pub fn insert_before(&self, child: &HostNode, reference: &HostNode) {
        child.detach();
        let index = match self.index_of(reference) {
            Some(index) => index,
            None => panic!("insert_before: reference node is not a child of this element"),
        };
        self.insert_at(child, index);
    }

    /// Insert a node immediately after the reference child.
    pub fn insert_after(&self, child: &HostNode, reference: &HostNode) {
        child.detach();
        let index = match self.index_of(reference) {
            Some(index) => index,
            None => panic!("insert_after: reference node is not a child of this element"),
        };
        self.insert_at(child, index + 1);
    }

    /// Remove a child if present. Clears its parent link.
    pub fn remove_child(&self, child: &HostNode) {
        let mut inner = self.inner.borrow_mut();
        let before = inner.children.len();
        inner.children.retain(|existing| !existing.ptr_eq(child));
        let removed = inner.children.len() != before;
        drop(inner);
        if removed {
            child.set_parent(None);
        }
    }

    /// Snapshot of the ordered child list.
    pub fn children(&self) -> Vec<HostNode> {
        self.inner.borrow().children.clone()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.inner.borrow().children.len()
    }

    /// Concatenated text content of the subtree.
    pub fn text_content(&self) -> String {
        let children = self.children();
        let mut out = String::new();
        for child in &children {
            out.push_str(&child.text_content());
        }
        out
    }

    /// The parent element, if attached.
    pub fn parent(&self) -> Option<HostElement> {
        let weak = self.inner.borrow().parent.clone()?;
        weak.upgrade().map(|inner| HostElement { inner })
    }

    fn index_of(&self, node: &HostNode) -> Option<usize> {
        self.inner
            .borrow()
            .children
            .iter()
            .position(|child| child.ptr_eq(node))
    }

    fn insert_at(&self, child: &HostNode, index: usize) {
        self.inner.borrow_mut().children.insert(index, child.clone());
        child.set_parent(Some(self));
    }

    fn downgrade(&self) -> Weak<RefCell<ElementData>> {
        Rc::downgrade(&self.inner)
    }
}

// =============================================================================
// Text
// =============================================================================

/// A host document text node.
#[derive(Clone)]
pub struct HostText {
    inner: Rc<RefCell<TextData>>,
}

struct TextData {
    content: String,
    parent: Option<Weak<RefCell<ElementData>>>,
}

impl HostText {
    /// Create a detached text node. Empty content is valid - an empty text
    /// node still occupies a position among its siblings.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TextData {
                content: content.into(),
                parent: None,
            })),
        }
    }

    /// The node's text content.
    pub fn text(&self) -> String {
        self.inner.borrow().content.clone()
    }

    /// Replace the node's text content.
    pub fn set_text(&self, content: impl Into<String>) {
        self.inner.borrow_mut().content = content.into();
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &HostText) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The parent element, if attached.
    pub fn parent(&self) -> Option<HostElement> {
        let weak = self.inner.borrow().parent.clone()?;
        weak.upgrade().map(|inner| HostElement { inner })
    }
}

// =============================================================================
// Node
// =============================================================================

/// Either kind of host node, as stored in an element's child list.
#[derive(Clone)]
pub enum HostNode {
    /// An element node.
    Element(HostElement),
    /// A text node.
    Text(HostText),
}

impl HostNode {
    /// Identity comparison; nodes of different kinds are never equal.
    pub fn ptr_eq(&self, other: &HostNode) -> bool {
        match (self, other) {
            (HostNode::Element(a), HostNode::Element(b)) => a.ptr_eq(b),
            (HostNode::Text(a), HostNode::Text(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// The parent element, if attached.
    pub fn parent(&self) -> Option<HostElement> {
        match self {
            HostNode::Element(element) => element.parent(),
            HostNode::Text(text) => text.parent(),
        }
    }

    /// Remove this node from its parent, if it has one.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Text content of this node (recursive for elements).
    pub fn text_content(&self) -> String {
        match self {
            HostNode::Element(element) => element.text_content(),
            HostNode::Text(text) => text.text(),
        }
    }

    /// Borrow as an element, if this is one.
    pub fn as_element(&self) -> Option<&HostElement> {
        match self {
            HostNode::Element(element) => Some(element),
            HostNode::Text(_) => None,
        }
    }

    /// Borrow as a text node, if this is one.
    pub fn as_text(&self) -> Option<&HostText> {
        match self {
            HostNode::Element(_) => None,
            HostNode::Text(text) => Some(text),
        }
    }

    fn set_parent(&self, parent: Option<&HostElement>) {
        let weak = parent.map(HostElement::downgrade);
        match self {
            HostNode::Element(element) => element.inner.borrow_mut().parent = weak,
            HostNode::Text(text) => text.inner.borrow_mut().parent = weak,
        }
    }
}

impl From<HostElement> for HostNode {
    fn from(element: HostElement) -> Self {
        HostNode::Element(element)
    }
}

impl From<HostText> for HostNode {
    fn from(text: HostText) -> Self {
        HostNode::Text(text)
    }
}

// =============================================================================
// Tests
// =============================================================================
