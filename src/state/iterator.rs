//! Keyed list rendering with fine-grained updates.
//!
//! [`State::use_value_iterator`] renders a dynamic collection with per-item
//! identity. Items are tracked by key:
//!
//! - New keys: create an item state + index state, render one component.
//! - Existing keys: update the states only (NO node recreation!).
//! - Removed keys: remove DOM, fire unmount through the subtree.
//!
//! Reordering is a single sweep over the new order, carrying a DOM cursor
//! and a signed position offset so unchanged runs are recognized without
//! touching the DOM. The per-item key lookup is O(1); the sweep is O(n)
//! with local position patching rather than an edit-distance diff, so
//! pathological reorderings (a full reversal) may move more nodes than a
//! minimal-edit algorithm would.
//!
//! The list lives inside a phantom wrapper whose first child is an empty
//! text node. That marker is the stable attachment point: insertions at
//! position 0 and empty→non-empty transitions always have an anchor.
//!
//! # Keys
//!
//! The key function returns `Option<String>`. An item with a `None` key is
//! skipped (not rendered), which is the documented policy, not an
//! oversight. Duplicate keys are skipped with a warning; only the first
//! occurrence is tracked.
//!
//! # Context
//!
//! Items created during later updates render under the context bindings
//! captured when the iterator was created, not whatever is ambient at
//! update time.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::build::{self, DomPosition};
use crate::context::ComponentCtx;
use crate::lifecycle::{fire_mount, fire_unmount};
use crate::node::{MountedNode, NodeSlot, Tree, component, fragment, text};

use super::{State, SubscriptionGroup, UpdateRunner};

/// The per-item handles passed to an iterator's render callback.
///
/// `state` holds the item value and `index` its current position; both are
/// ordinary [`State`]s, so item components subscribe to them with the
/// usual hooks and receive fine-grained updates without the list item
/// being re-rendered.
pub struct IteratorItem<I: Clone + PartialEq + 'static> {
    /// The item's value.
    pub state: State<I>,
    /// The item's position in the rendered list.
    pub index: State<usize>,
}

impl<I: Clone + PartialEq + 'static> Clone for IteratorItem<I> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            index: self.index.clone(),
        }
    }
}

type RenderFn<I> = Rc<dyn Fn(&mut ComponentCtx, &IteratorItem<I>) -> Tree>;

struct IterEntry<I: Clone + PartialEq + 'static> {
    item: State<I>,
    index: State<usize>,
    last_index: usize,
    node: NodeSlot,
}

/// Wrap one item render in its own component so lifecycle registration
/// made during the render attaches to that item alone.
fn item_component<I: Clone + PartialEq + 'static>(
    render: RenderFn<I>,
    handle: IteratorItem<I>,
) -> (Tree, NodeSlot) {
    let mut tree = component(move |ctx: &mut ComponentCtx| (*render)(ctx, &handle));
    let slot: NodeSlot = Rc::new(RefCell::new(None));
    tree.slot = Some(slot.clone());
    (tree, slot)
}

fn resolve_slot(slot: &NodeSlot) -> MountedNode {
    match &*slot.borrow() {
        Some(node) => node.clone(),
        None => panic!("keyed list entry has no materialized node"),
    }
}

impl<T: Clone + PartialEq + 'static> State<T> {
    /// Render a keyed list derived from this state.
    ///
    /// `selector` projects the stored value to the source items, `key`
    /// derives each item's identity, and `render` produces one item's tree
    /// from its [`IteratorItem`] handles.
    ///
    /// ```ignore
    /// let todos = create_state(vec![Todo { id: 1, label: "first".into() }]);
    ///
    /// let list = component(move |ctx| {
    ///     todos.use_value_iterator(
    ///         ctx,
    ///         |todos: &Vec<Todo>| todos.clone(),
    ///         |todo, _index| Some(todo.id.to_string()),
    ///         |ctx, item| {
    ///             item.state
    ///                 .use_value_selector(ctx, |t| t.label.clone(), |label| text(label))
    ///         },
    ///     )
    /// });
    /// ```
    pub fn use_value_iterator<I, SF, KF, RF>(
        &self,
        ctx: &ComponentCtx,
        selector: SF,
        key: KF,
        render: RF,
    ) -> Tree
    where
        I: Clone + PartialEq + 'static,
        SF: Fn(&T) -> Vec<I> + 'static,
        KF: Fn(&I, usize) -> Option<String> + 'static,
        RF: Fn(&mut ComponentCtx, &IteratorItem<I>) -> Tree + 'static,
    {
        let selector = Rc::new(selector);
        let key = Rc::new(key);
        let render: RenderFn<I> = Rc::new(render);
        let bindings = ctx.bindings.clone();
        let book: Rc<RefCell<IndexMap<String, IterEntry<I>>>> =
            Rc::new(RefCell::new(IndexMap::new()));

        // Synchronous initial render: the marker anchor first, one item
        // component per usable key after it.
        let marker_slot: NodeSlot = Rc::new(RefCell::new(None));
        let mut marker = text("");
        marker.slot = Some(marker_slot.clone());
        let mut children = vec![marker];
        {
            let items = (*selector)(&self.get());
            let mut initial = book.borrow_mut();
            for (index, item) in items.iter().enumerate() {
                let Some(entry_key) = (*key)(item, index) else {
                    continue;
                };
                if initial.contains_key(&entry_key) {
                    log::warn!("duplicate key `{entry_key}` in keyed list; entry skipped");
                    continue;
                }
                let handle = IteratorItem {
                    state: State::new(item.clone()),
                    index: State::new(index),
                };
                let (tree, node_slot) = item_component(render.clone(), handle.clone());
                children.push(tree);
                initial.insert(
                    entry_key,
                    IterEntry {
                        item: handle.state,
                        index: handle.index,
                        last_index: index,
                        node: node_slot,
                    },
                );
            }
        }
        let mut wrapper = fragment(children);
        let wrapper_slot: NodeSlot = Rc::new(RefCell::new(None));
        wrapper.slot = Some(wrapper_slot.clone());

        let runner: UpdateRunner<T> = Rc::new(move |value: &T| {
            let items = (*selector)(value);
            let wrapper = match &*wrapper_slot.borrow() {
                Some(MountedNode::Element(element)) => element.clone(),
                _ => panic!("keyed list updated before its wrapper was materialized"),
            };
            let marker = match &*marker_slot.borrow() {
                Some(node) => node.clone(),
                None => panic!("keyed list updated before its marker was materialized"),
            };
            let container = wrapper.container_for_children();
            let marker_handle = match marker.dom_handles().into_iter().next() {
                Some(handle) => handle,
                None => panic!("keyed list marker has no DOM handle"),
            };

            // Pass 1: match keys. Surviving entries keep their node and
            // states (values and indices propagate through the states'
            // own equality gates); fresh keys materialize immediately,
            // under the bindings captured at iterator creation.
            let mut previous = std::mem::take(&mut *book.borrow_mut());
            let mut next_book: IndexMap<String, IterEntry<I>> =
                IndexMap::with_capacity(items.len());
            let mut order: Vec<(String, bool)> = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let Some(entry_key) = (*key)(item, index) else {
                    continue;
                };
                if next_book.contains_key(&entry_key) {
                    log::warn!("duplicate key `{entry_key}` in keyed list; entry skipped");
                    continue;
                }
                if let Some(entry) = previous.shift_remove(&entry_key) {
                    entry.item.set(item.clone());
                    entry.index.set(index);
                    next_book.insert(entry_key.clone(), entry);
                    order.push((entry_key, false));
                } else {
                    let handle = IteratorItem {
                        state: State::new(item.clone()),
                        index: State::new(index),
                    };
                    let (tree, node_slot) = item_component(render.clone(), handle.clone());
                    let node = build::materialize(tree, &bindings);
                    build::link_parent(&node, &wrapper);
                    next_book.insert(
                        entry_key.clone(),
                        IterEntry {
                            item: handle.state,
                            index: handle.index,
                            last_index: index,
                            node: node_slot,
                        },
                    );
                    order.push((entry_key, true));
                }
            }

            // Pass 2: one positional sweep. The cursor trails the last
            // handle placed; the offset keeps earlier moves and insertions
            // from skewing later comparisons. Entries whose adjusted
            // previous position equals their new index stay put.
            let mut cursor = marker_handle;
            let mut offset: i64 = 0;
            for (new_index, (entry_key, is_new)) in order.iter().enumerate() {
                let entry = match next_book.get_mut(entry_key) {
                    Some(entry) => entry,
                    None => continue,
                };
                let node = resolve_slot(&entry.node);
                let handles = node.dom_handles();
                if *is_new {
                    build::place_handles(&handles, &container, DomPosition::After(cursor.clone()));
                    if let Some(last) = handles.last() {
                        cursor = last.clone();
                    }
                    fire_mount(&node);
                    offset += 1;
                } else {
                    let adjusted = entry.last_index as i64 + offset;
                    let target = new_index as i64;
                    if adjusted == target {
                        if let Some(last) = handles.last() {
                            cursor = last.clone();
                        }
                    } else {
                        for handle in &handles {
                            handle.detach();
                        }
                        build::place_handles(
                            &handles,
                            &container,
                            DomPosition::After(cursor.clone()),
                        );
                        if let Some(last) = handles.last() {
                            cursor = last.clone();
                        }
                        if adjusted > target {
                            offset += 1;
                        } else {
                            offset -= 1;
                        }
                    }
                }
                entry.last_index = new_index;
            }

            // Pass 3: keys absent from the new set leave the DOM and get
            // their unmount, through the whole subtree.
            for (_removed_key, entry) in previous {
                let node = resolve_slot(&entry.node);
                for handle in node.dom_handles() {
                    handle.detach();
                }
                fire_unmount(&node);
            }

            // The wrapper's child list mirrors the new order, so an
            // ancestor unmount tears down exactly the current entries.
            let mut wrapper_children = vec![marker.clone()];
            for entry in next_book.values() {
                wrapper_children.push(resolve_slot(&entry.node));
            }
            wrapper.set_children(wrapper_children);
            *book.borrow_mut() = next_book;
        });
        self.register_on_mount(ctx, SubscriptionGroup::Iterator, runner);
        wrapper
    }
}

impl<I: Clone + PartialEq + 'static> State<Vec<I>> {
    /// [`use_value_iterator`](State::use_value_iterator) over the stored
    /// vector itself.
    pub fn use_iterator<KF, RF>(&self, ctx: &ComponentCtx, key: KF, render: RF) -> Tree
    where
        KF: Fn(&I, usize) -> Option<String> + 'static,
        RF: Fn(&mut ComponentCtx, &IteratorItem<I>) -> Tree + 'static,
    {
        self.use_value_iterator(ctx, |items: &Vec<I>| items.clone(), key, render)
    }
}
