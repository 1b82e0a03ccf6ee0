//! Mounting scenarios: static trees, components, fragments, portals, refs.
//!
//! Everything runs against the in-memory host document, so assertions
//! inspect real child lists and attributes rather than render output.

use std::cell::Cell;
use std::rc::Rc;

use weft::{
    Attr, ElementProps, ElementRef, Event, HostElement, HostNode, MountHandle, attach, component,
    element, fragment, text,
};

// =============================================================================
// HELPERS
// =============================================================================

/// Tag names of an element's children, text nodes as `#content`.
fn tags(element: &HostElement) -> Vec<String> {
    element
        .children()
        .iter()
        .map(|child| match child {
            HostNode::Element(el) => el.tag(),
            HostNode::Text(t) => format!("#{}", t.text()),
        })
        .collect()
}

/// The single element the mounted tree placed inside the container.
fn mounted_root(handle: &MountHandle) -> HostElement {
    handle.container().children()[0]
        .as_element()
        .expect("mounted root should be an element")
        .clone()
}

fn div(children: Vec<weft::Tree>) -> weft::Tree {
    element(
        "div",
        ElementProps {
            children,
            ..Default::default()
        },
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[test]
fn test_mounts_static_tree() {
    let host = HostElement::new("body");
    let handle = attach(
        &host,
        div(vec![
            text("hello "),
            element(
                "span",
                ElementProps {
                    children: vec![text("world")],
                    ..Default::default()
                },
            ),
        ]),
    );

    assert_eq!(host.child_count(), 1, "host holds the internal container");
    assert_eq!(host.text_content(), "hello world");

    let root = mounted_root(&handle);
    assert_eq!(root.tag(), "div");
    assert_eq!(tags(&root), vec!["#hello ", "span"]);
}

#[test]
fn test_component_contributes_no_wrapper_dom() {
    let host = HostElement::new("body");
    let handle = attach(&host, component(|_ctx| div(vec![text("inner")])));

    // The component's rendered element attaches directly; no extra node.
    assert_eq!(handle.container().child_count(), 1);
    assert_eq!(mounted_root(&handle).tag(), "div");
    assert_eq!(host.text_content(), "inner");
}

#[test]
fn test_string_and_none_render_as_text() {
    let host = HostElement::new("body");
    let _handle = attach(&host, component(|_ctx| "plain"));
    assert_eq!(host.text_content(), "plain");

    let empty_host = HostElement::new("body");
    let handle = attach(&empty_host, component(|_ctx| None::<weft::Tree>));
    // None mounts as an empty text node: present, empty content.
    assert_eq!(handle.container().child_count(), 1);
    assert_eq!(
        handle.container().children()[0]
            .as_text()
            .expect("null render should be a text node")
            .text(),
        ""
    );
}

#[test]
fn test_fragment_splices_children_in_order() {
    let host = HostElement::new("body");
    let handle = attach(
        &host,
        div(vec![
            element("x", ElementProps::default()),
            fragment(vec![
                text("a"),
                element("y", ElementProps::default()),
                text("b"),
            ]),
            element("z", ElementProps::default()),
        ]),
    );

    // The fragment's children land between the siblings with no wrapper.
    assert_eq!(tags(&mounted_root(&handle)), vec!["x", "#a", "y", "#b", "z"]);
}

#[test]
fn test_nested_fragments_flatten() {
    let host = HostElement::new("body");
    let handle = attach(
        &host,
        div(vec![fragment(vec![
            text("a"),
            fragment(vec![text("b"), text("c")]),
            text("d"),
        ])]),
    );

    assert_eq!(tags(&mounted_root(&handle)), vec!["#a", "#b", "#c", "#d"]);
}

#[test]
fn test_portal_content_attaches_to_target() {
    let host = HostElement::new("body");
    let target = HostElement::new("aside");

    let handle = attach(
        &host,
        div(vec![element(
            "p",
            ElementProps {
                portal: Some(target.clone()),
                children: vec![text("floating")],
                ..Default::default()
            },
        )]),
    );

    // The portal element lives in the target, not the logical parent.
    assert_eq!(mounted_root(&handle).child_count(), 0);
    assert_eq!(tags(&target), vec!["p"]);
    assert_eq!(target.text_content(), "floating");

    handle.detach();
    assert_eq!(target.child_count(), 0, "portal content leaves on unmount");
}

#[test]
fn test_ref_populated_before_mount() {
    let host = HostElement::new("body");
    let input_ref = ElementRef::new();
    let seen_at_mount = Rc::new(Cell::new(false));

    let input_ref_in = input_ref.clone();
    let seen_in = seen_at_mount.clone();
    let _handle = attach(
        &host,
        component(move |ctx| {
            let input_ref_mount = input_ref_in.clone();
            let seen = seen_in.clone();
            ctx.on_mount(move || {
                seen.set(input_ref_mount.get().is_some());
            });
            element(
                "input",
                ElementProps {
                    element_ref: Some(input_ref_in.clone()),
                    ..Default::default()
                },
            )
        }),
    );

    assert!(seen_at_mount.get(), "ref must be readable from mount callbacks");
    assert_eq!(input_ref.get().expect("ref populated").tag(), "input");
}

#[test]
fn test_static_attrs_and_event_handler() {
    let host = HostElement::new("body");
    let clicks = Rc::new(Cell::new(0));
    let clicks_in = clicks.clone();

    let handle = attach(
        &host,
        element(
            "button",
            ElementProps {
                attrs: vec![
                    ("id".into(), Attr::text("main")),
                    ("disabled".into(), Attr::flag(true)),
                    ("hidden".into(), Attr::flag(false)),
                    (
                        "onClick".into(),
                        Attr::on(move |_| clicks_in.set(clicks_in.get() + 1)),
                    ),
                ],
                ..Default::default()
            },
        ),
    );

    let button = mounted_root(&handle);
    assert_eq!(button.attribute("id"), Some("main".into()));
    assert!(button.has_attribute("disabled"));
    assert_eq!(button.attribute("disabled"), Some(String::new()));
    assert!(!button.has_attribute("hidden"));

    assert_eq!(button.dispatch(&Event::new("click")), 1);
    assert_eq!(clicks.get(), 1);
}

#[test]
fn test_detach_removes_dom() {
    let host = HostElement::new("body");
    let handle = attach(&host, div(vec![text("gone soon")]));
    assert_eq!(host.child_count(), 1);

    handle.detach();
    assert_eq!(host.child_count(), 0);
    assert_eq!(host.text_content(), "");
}
