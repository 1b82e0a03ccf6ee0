//! Keyed list reconciliation scenarios.
//!
//! Items are tracked by id. Creation, unmount and render counts are logged
//! through shared cells so the tests can assert that surviving keys keep
//! their node and state identity while the DOM order follows the source.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use weft::{
    Attr, ComponentCtx, ElementProps, ElementRef, HostElement, IteratorItem, State, Tree, attach,
    component, create_state, element, text,
};

// =============================================================================
// HELPERS
// =============================================================================

#[derive(Clone, PartialEq)]
struct Item {
    id: u32,
}

fn item(id: u32) -> Item {
    Item { id }
}

/// `data-id` attributes of the container's element children, in DOM order.
fn data_ids(container: &HostElement) -> Vec<String> {
    container
        .children()
        .iter()
        .filter_map(|child| child.as_element().and_then(|el| el.attribute("data-id")))
        .collect()
}

/// Bookkeeping shared between a test and its item render callback.
#[derive(Clone, Default)]
struct ItemLog {
    created: Rc<RefCell<Vec<u32>>>,
    unmounted: Rc<RefCell<Vec<u32>>>,
    refs: Rc<RefCell<HashMap<u32, ElementRef>>>,
}

impl ItemLog {
    /// Render one item as `<li data-id=..>` containing its index, recording
    /// creation, unmount and the element handle.
    fn render(&self, ctx: &mut ComponentCtx, entry: &IteratorItem<Item>) -> Tree {
        let id = entry.state.get().id;
        self.created.borrow_mut().push(id);
        let element_ref = ElementRef::new();
        self.refs.borrow_mut().insert(id, element_ref.clone());
        let unmounted = self.unmounted.clone();
        ctx.on_unmount(move || unmounted.borrow_mut().push(id));
        element(
            "li",
            ElementProps {
                attrs: vec![("data-id".into(), Attr::text(id.to_string()))],
                element_ref: Some(element_ref),
                children: vec![entry.index.use_display(ctx)],
                ..Default::default()
            },
        )
    }

    fn element_of(&self, id: u32) -> HostElement {
        self.refs.borrow()[&id].get().expect("item element built")
    }
}

/// Mount a keyed list of `items` rendered through `log`.
fn mount_list(host: &HostElement, items: &State<Vec<Item>>, log: &ItemLog) -> weft::MountHandle {
    let items = items.clone();
    let log = log.clone();
    attach(
        host,
        component(move |ctx| {
            items.use_iterator(
                ctx,
                |it: &Item, _index| Some(it.id.to_string()),
                move |ctx, entry| log.render(ctx, entry),
            )
        }),
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[test]
fn test_initial_render_in_source_order() {
    let host = HostElement::new("body");
    let items = create_state(vec![item(1), item(3), item(4)]);
    let log = ItemLog::default();
    let handle = mount_list(&host, &items, &log);

    let container = handle.container();
    assert_eq!(data_ids(&container), vec!["1", "3", "4"]);
    assert_eq!(*log.created.borrow(), vec![1, 3, 4]);
    // Each item renders its own index.
    assert_eq!(host.text_content(), "012");
}

#[test]
fn test_reorder_and_remove_preserves_identity() {
    let host = HostElement::new("body");
    let items = create_state(vec![item(1), item(3), item(4)]);
    let log = ItemLog::default();
    let handle = mount_list(&host, &items, &log);

    let li_1 = log.element_of(1);
    let li_3 = log.element_of(3);

    // id 4 removed, order of the survivors flipped.
    items.set(vec![item(3), item(1)]);

    let container = handle.container();
    assert_eq!(data_ids(&container), vec!["3", "1"]);
    assert_eq!(
        *log.created.borrow(),
        vec![1, 3, 4],
        "surviving keys must not re-render"
    );
    assert!(
        log.element_of(3).ptr_eq(&li_3) && log.element_of(1).ptr_eq(&li_1),
        "surviving keys keep their element instance"
    );
    assert_eq!(
        *log.unmounted.borrow(),
        vec![4],
        "exactly one unmount for the removed key"
    );

    // Index states followed the reorder without node recreation.
    assert_eq!(li_3.text_content(), "0");
    assert_eq!(li_1.text_content(), "1");
}

#[test]
fn test_insert_at_front_and_back() {
    let host = HostElement::new("body");
    let items = create_state(vec![item(2), item(3)]);
    let log = ItemLog::default();
    let handle = mount_list(&host, &items, &log);

    items.set(vec![item(1), item(2), item(3), item(4)]);

    assert_eq!(data_ids(&handle.container()), vec!["1", "2", "3", "4"]);
    assert_eq!(*log.created.borrow(), vec![2, 3, 1, 4]);
    assert!(log.unmounted.borrow().is_empty());
    // Existing entries shifted; their index states caught up.
    assert_eq!(log.element_of(2).text_content(), "1");
    assert_eq!(log.element_of(4).text_content(), "3");
}

#[test]
fn test_full_reversal() {
    let host = HostElement::new("body");
    let items = create_state(vec![item(1), item(2), item(3), item(4)]);
    let log = ItemLog::default();
    let handle = mount_list(&host, &items, &log);

    items.set(vec![item(4), item(3), item(2), item(1)]);

    assert_eq!(data_ids(&handle.container()), vec!["4", "3", "2", "1"]);
    assert_eq!(*log.created.borrow(), vec![1, 2, 3, 4]);
    assert!(log.unmounted.borrow().is_empty());
}

#[test]
fn test_empty_to_nonempty_and_back() {
    let host = HostElement::new("body");
    let items = create_state(Vec::<Item>::new());
    let log = ItemLog::default();
    let handle = mount_list(&host, &items, &log);

    assert!(data_ids(&handle.container()).is_empty());

    items.set(vec![item(1), item(2)]);
    assert_eq!(data_ids(&handle.container()), vec!["1", "2"]);

    items.set(Vec::new());
    assert!(data_ids(&handle.container()).is_empty());
    assert_eq!(*log.unmounted.borrow(), vec![1, 2]);

    // The anchor survives, so the list can fill again.
    items.set(vec![item(3)]);
    assert_eq!(data_ids(&handle.container()), vec!["3"]);
}

#[test]
fn test_items_without_keys_are_skipped() {
    let host = HostElement::new("body");
    let items = create_state(vec![item(1), item(2), item(3), item(4)]);
    let log = ItemLog::default();

    let items_in = items.clone();
    let log_in = log.clone();
    let handle = attach(
        &host,
        component(move |ctx| {
            items_in.use_iterator(
                ctx,
                // Odd ids yield no key and are not rendered.
                |it: &Item, _index| (it.id % 2 == 0).then(|| it.id.to_string()),
                move |ctx, entry| log_in.render(ctx, entry),
            )
        }),
    );

    assert_eq!(data_ids(&handle.container()), vec!["2", "4"]);
    assert_eq!(*log.created.borrow(), vec![2, 4]);
}

#[test]
fn test_duplicate_keys_first_occurrence_wins() {
    let host = HostElement::new("body");
    let items = create_state(vec![item(1), item(1), item(2)]);
    let log = ItemLog::default();
    let handle = mount_list(&host, &items, &log);

    assert_eq!(data_ids(&handle.container()), vec!["1", "2"]);
    assert_eq!(*log.created.borrow(), vec![1, 2]);
}

#[test]
fn test_value_change_propagates_through_item_state() {
    #[derive(Clone, PartialEq)]
    struct Todo {
        id: u32,
        label: String,
    }
    fn todo(id: u32, label: &str) -> Todo {
        Todo {
            id,
            label: label.into(),
        }
    }

    let host = HostElement::new("body");
    let todos = create_state(vec![todo(1, "first"), todo(2, "second")]);
    let created: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

    let todos_in = todos.clone();
    let created_in = created.clone();
    let _handle = attach(
        &host,
        component(move |ctx| {
            let created = created_in.clone();
            todos_in.use_iterator(
                ctx,
                |t: &Todo, _index| Some(t.id.to_string()),
                move |ctx, entry| {
                    created.borrow_mut().push(entry.state.get().id);
                    entry.state.use_value_selector(
                        ctx,
                        |t: &Todo| t.label.clone(),
                        |label| text(label.clone()),
                    )
                },
            )
        }),
    );

    assert_eq!(host.text_content(), "firstsecond");

    // Editing one label updates through the item state; the item component
    // is not recreated.
    todos.set(vec![todo(1, "first (edited)"), todo(2, "second")]);
    assert_eq!(host.text_content(), "first (edited)second");
    assert_eq!(*created.borrow(), vec![1, 2]);
}

#[test]
fn test_context_reaches_items_created_after_mount() {
    let host = HostElement::new("body");
    let theme: weft::Context<String> = weft::create_context();
    let items = create_state(vec![item(1)]);

    let items_in = items.clone();
    let _handle = attach(
        &host,
        component(move |ctx| {
            theme.provide(ctx, "dark".to_string());
            items_in.use_iterator(
                ctx,
                |it: &Item, _index| Some(it.id.to_string()),
                move |ctx, entry| {
                    let mode = theme.read(ctx);
                    element(
                        "li",
                        ElementProps {
                            attrs: vec![
                                ("data-id".into(), Attr::text(entry.state.get().id.to_string())),
                                ("data-theme".into(), Attr::text(mode)),
                            ],
                            ..Default::default()
                        },
                    )
                },
            )
        }),
    );

    // An item created by a later update renders under the bindings captured
    // when the iterator was created.
    items.set(vec![item(1), item(2)]);
    let themes: Vec<String> = host.children()[0]
        .as_element()
        .expect("container")
        .children()
        .iter()
        .filter_map(|child| child.as_element().and_then(|el| el.attribute("data-theme")))
        .collect();
    assert_eq!(themes, vec!["dark", "dark"]);
}
