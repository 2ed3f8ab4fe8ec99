use pretty_assertions::assert_eq;

use shadowroot_injector::prelude::*;
use shadowroot_injector::server::{Node, RcNode, ServerDom};

fn text(text: &str) -> RcNode {
    Node::create_text(text.to_string())
}

fn element(tag_name: &str, children: Vec<RcNode>) -> RcNode {
    let element = Node::create_element(tag_name);
    for child in children {
        element.append_child(child).unwrap();
    }
    element
}

fn marker(tag_name: &str, mode: &str, content: Vec<RcNode>) -> RcNode {
    let template = Node::create_element("template");
    template.set_attribute("sr-tagname", tag_name);
    template.set_attribute("sr-mode", mode);

    let fragment = template.template_content().unwrap();
    for child in content {
        fragment.append_child(child).unwrap();
    }
    template
}

/// Insert a marker followed by whitespace, the way parsed markup arrives.
fn define(parent: &RcNode, marker: RcNode) -> RcNode {
    parent.append_child(marker.clone()).unwrap();
    parent.append_child(text("\n")).unwrap();
    marker
}

fn x_box_marker() -> RcNode {
    marker("x-box", "open", vec![element("p", vec![text("hi")])])
}

fn started() -> ShadowRootInjector<ServerDom> {
    let mut injector = ShadowRootInjector::new(ServerDom::new());
    injector.start(None).unwrap();
    injector
}

fn shadow_html(host: &RcNode) -> Option<String> {
    host.shadow_root().map(|shadow_root| shadow_root.to_string())
}

#[test]
fn registered_template_is_materialized() {
    let injector = started();
    let dom = injector.dom();

    define(&dom.body(), x_box_marker());
    dom.flush();

    let host = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();

    let shadow_root = host.shadow_root().unwrap();
    assert_eq!(shadow_root.shadow_root_mode(), Some(ShadowRootMode::Open));
    assert_eq!(shadow_root.to_string(), "<p>hi</p>");
    assert_eq!(shadow_root.first_child().unwrap().tag_name(), Some("p"));
    assert_eq!(shadow_root.text_content(), "hi");
}

#[test]
fn materialized_document_reads_like_declarative_shadow_dom() {
    let injector = started();
    let dom = injector.dom();

    define(&dom.body(), x_box_marker());
    dom.flush();
    dom.body()
        .append_child(element("x-box", vec![text("light")]))
        .unwrap();
    dom.flush();

    // The marker stays in place with its annotations
    assert_eq!(
        dom.render(),
        "<html><body>\
         <template sr-tagname=\"x-box\" sr-mode=\"open\"><p>hi</p></template>\n\
         <x-box><template shadowrootmode=\"open\"><p>hi</p></template>light</x-box>\
         </body></html>"
    );
}

#[test]
fn definitions_do_not_reach_back_to_earlier_hosts() {
    let injector = started();
    let dom = injector.dom();

    let host = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();
    assert!(host.shadow_root().is_none());

    define(&dom.body(), x_box_marker());
    dom.flush();
    assert!(injector.registry().contains("x-box"));
    assert!(host.shadow_root().is_none());

    // A later mutation involving the host triggers injection
    dom.body().append_child(host.clone()).unwrap();
    dom.flush();
    assert_eq!(shadow_html(&host).as_deref(), Some("<p>hi</p>"));
}

#[test]
fn stop_and_restart() {
    let mut injector = started();
    let body = injector.dom().body();

    define(&body, x_box_marker());
    injector.dom().flush();
    assert!(injector.registry().contains("x-box"));

    injector.stop();
    assert!(!injector.is_running());

    define(
        &body,
        marker("y-box", "open", vec![element("span", vec![])]),
    );
    let stopped_x = body.append_child(Node::create_element("x-box")).unwrap();
    injector.dom().flush();

    assert!(!injector.registry().contains("y-box"));
    assert!(stopped_x.shadow_root().is_none());

    injector.start(None).unwrap();
    assert!(injector.is_running());

    let resumed_x = body.append_child(Node::create_element("x-box")).unwrap();
    let resumed_y = body.append_child(Node::create_element("y-box")).unwrap();
    injector.dom().flush();

    // Registrations from before the stop survive, the marker inserted while
    // stopped was never seen
    assert_eq!(shadow_html(&resumed_x).as_deref(), Some("<p>hi</p>"));
    assert!(resumed_y.shadow_root().is_none());
    assert!(stopped_x.shadow_root().is_none());
}

#[test]
fn stop_keeps_materialized_shadow_roots() {
    let mut injector = started();
    let body = injector.dom().body();

    define(&body, x_box_marker());
    injector.dom().flush();
    let host = body.append_child(Node::create_element("x-box")).unwrap();
    injector.dom().flush();

    injector.stop();
    assert_eq!(shadow_html(&host).as_deref(), Some("<p>hi</p>"));
    assert_eq!(injector.registry().len(), 1);
}

#[test]
fn last_registration_wins() {
    let injector = started();
    let dom = injector.dom();

    define(
        &dom.body(),
        marker("x-box", "open", vec![text("first")]),
    );
    define(
        &dom.body(),
        marker("X-BOX", "closed", vec![text("second")]),
    );
    dom.flush();

    let definition = injector.registry().lookup("x-box").unwrap();
    assert_eq!(definition.mode(), ShadowRootMode::Closed);
    assert_eq!(definition.instantiate().unwrap().to_string(), "second");

    let host = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();
    assert_eq!(shadow_html(&host).as_deref(), Some("second"));
}

#[test]
fn materialization_happens_at_most_once() {
    let injector = started();
    let dom = injector.dom();

    define(&dom.body(), x_box_marker());
    dom.flush();

    let host = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();

    // Observed again through moves, and injected by hand
    let div = dom.body().append_child(Node::create_element("div")).unwrap();
    div.append_child(host.clone()).unwrap();
    dom.body().append_child(host.clone()).unwrap();
    dom.flush();

    assert_eq!(
        injector.inject_registered_template(&host),
        Injection::AlreadyHosting
    );
    assert_eq!(shadow_html(&host).as_deref(), Some("<p>hi</p>"));
}

#[test]
fn hosts_get_independent_copies() {
    let injector = started();
    let dom = injector.dom();

    define(&dom.body(), x_box_marker());
    dom.flush();

    let first = dom.body().append_child(Node::create_element("x-box")).unwrap();
    let second = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();

    let first_p = first.shadow_root().unwrap().first_child().unwrap();
    let second_p = second.shadow_root().unwrap().first_child().unwrap();
    assert!(!first_p.is(&second_p));

    first_p.first_child().unwrap().set_text("changed");

    assert_eq!(shadow_html(&first).as_deref(), Some("<p>changed</p>"));
    assert_eq!(shadow_html(&second).as_deref(), Some("<p>hi</p>"));

    // The registered template is untouched as well
    let definition = injector.registry().lookup("x-box").unwrap();
    assert_eq!(definition.instantiate().unwrap().to_string(), "<p>hi</p>");
}

#[test]
fn tag_names_match_case_insensitively() {
    let injector = started();
    let dom = injector.dom();

    define(
        &dom.body(),
        marker("my-widget", "open", vec![element("b", vec![])]),
    );
    dom.flush();

    let upper = dom.body().append_child(Node::create_element("MY-WIDGET")).unwrap();
    let mixed = dom.body().append_child(Node::create_element("My-Widget")).unwrap();
    dom.flush();

    assert_eq!(shadow_html(&upper).as_deref(), Some("<b/>"));
    assert_eq!(shadow_html(&mixed).as_deref(), Some("<b/>"));
}

#[test]
fn unregistered_elements_are_left_alone() {
    let injector = started();
    let dom = injector.dom();

    let unknown = dom.body().append_child(Node::create_element("z-box")).unwrap();
    dom.flush();

    assert!(unknown.shadow_root().is_none());
    assert!(injector.registry().is_empty());
}

#[test]
fn failing_host_does_not_disturb_the_batch() {
    let injector = started();
    let dom = injector.dom();

    define(&dom.body(), marker("input", "open", vec![text("no")]));
    define(&dom.body(), x_box_marker());
    dom.flush();

    let input = dom.body().append_child(Node::create_element("input")).unwrap();
    let host = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();

    assert!(input.shadow_root().is_none());
    assert_eq!(shadow_html(&host).as_deref(), Some("<p>hi</p>"));

    // The watchers keep going afterwards
    let later = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();
    assert!(later.shadow_root().is_some());
}

#[test]
fn malformed_markers_are_ignored() {
    let injector = started();
    let dom = injector.dom();

    let no_mode = Node::create_element("template");
    no_mode.set_attribute("sr-tagname", "a-box");
    define(&dom.body(), no_mode);

    define(&dom.body(), marker("b-box", "sideways", vec![]));

    let not_a_template = Node::create_element("div");
    not_a_template.set_attribute("sr-tagname", "c-box");
    not_a_template.set_attribute("sr-mode", "open");
    define(&dom.body(), not_a_template);

    dom.flush();
    assert!(injector.registry().is_empty());
}

#[test]
fn trailing_marker_is_missed_by_default() {
    let injector = started();
    let dom = injector.dom();

    dom.body().append_child(x_box_marker()).unwrap();
    dom.flush();

    assert!(!injector.registry().contains("x-box"));
}

#[test]
fn trailing_marker_is_found_when_inserted_nodes_are_inspected() {
    let config = InjectorConfig::default().with_detection(Detection::InsertedOrPreviousSibling);
    let mut injector = ShadowRootInjector::with_config(ServerDom::new(), config);
    injector.start(None).unwrap();
    let dom = injector.dom();

    dom.body().append_child(x_box_marker()).unwrap();
    dom.flush();
    assert!(injector.registry().contains("x-box"));

    let host = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();
    assert_eq!(shadow_html(&host).as_deref(), Some("<p>hi</p>"));
}

#[test]
fn custom_attribute_names() {
    let config = InjectorConfig::default()
        .with_mode_attribute("data-mode")
        .with_tag_name_attribute("data-for");
    let mut injector = ShadowRootInjector::with_config(ServerDom::new(), config);
    injector.start(None).unwrap();
    let dom = injector.dom();

    let template = Node::create_element("template");
    template.set_attribute("data-for", "x-box");
    template.set_attribute("data-mode", "open");
    define(&dom.body(), template.clone());
    define(&dom.body(), x_box_marker());
    dom.flush();

    assert_eq!(injector.registry().tag_names(), vec![TagName::new("x-box")]);
    // Custom attributes are stripped from the stored clone
    assert_eq!(
        injector
            .registry()
            .lookup("x-box")
            .unwrap()
            .template()
            .to_string(),
        "<template shadowrootmode=\"open\"/>"
    );
}

#[test]
fn nested_insertions_are_handled() {
    let injector = started();
    let dom = injector.dom();

    let section = element("section", vec![element("div", vec![])]);
    dom.body().append_child(section.clone()).unwrap();
    define(&dom.body(), x_box_marker());
    dom.flush();

    let deep = section.first_child().unwrap();
    let host = deep.append_child(Node::create_element("x-box")).unwrap();
    dom.flush();

    assert_eq!(shadow_html(&host).as_deref(), Some("<p>hi</p>"));
}

#[test]
fn descendants_of_an_inserted_subtree_are_not_scanned() {
    let injector = started();
    let dom = injector.dom();

    define(&dom.body(), x_box_marker());
    dom.flush();

    // Only the wrapper is reported as added
    let host = Node::create_element("x-box");
    dom.body()
        .append_child(element("div", vec![host.clone()]))
        .unwrap();
    dom.flush();

    assert!(host.shadow_root().is_none());
}

#[test]
fn marker_and_host_in_one_batch() {
    let injector = started();
    let dom = injector.dom();

    define(&dom.body(), x_box_marker());
    let host = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();

    // The server DOM notifies observers in creation order, definitions first
    assert_eq!(shadow_html(&host).as_deref(), Some("<p>hi</p>"));
}

#[test]
fn observation_is_scoped_to_the_root() {
    let dom = ServerDom::new();
    let inside = dom.body().append_child(Node::create_element("main")).unwrap();
    let outside = dom.body().append_child(Node::create_element("aside")).unwrap();

    let mut injector = ShadowRootInjector::new(dom);
    injector.start(Some(&inside)).unwrap();

    define(&outside, x_box_marker());
    injector.dom().flush();
    assert!(injector.registry().is_empty());

    define(&inside, x_box_marker());
    let outside_host = outside.append_child(Node::create_element("x-box")).unwrap();
    let inside_host = inside.append_child(Node::create_element("x-box")).unwrap();
    injector.dom().flush();

    assert!(outside_host.shadow_root().is_none());
    assert!(inside_host.shadow_root().is_some());
}

#[test]
fn repeated_start_does_not_duplicate_subscriptions() {
    let mut injector = started();
    injector.start(None).unwrap();
    injector.start(None).unwrap();

    injector.stop();

    let body = injector.dom().body();
    define(&body, x_box_marker());
    let host = body.append_child(Node::create_element("x-box")).unwrap();
    injector.dom().flush();

    assert!(injector.registry().is_empty());
    assert!(host.shadow_root().is_none());
}

#[test]
fn manual_registration_and_injection() {
    let injector = ShadowRootInjector::new(ServerDom::new());

    let template = marker("x-card", "closed", vec![element("slot", vec![])]);
    assert_eq!(
        injector.register_template_definition(&template),
        Some(TagName::new("X-CARD"))
    );
    assert_eq!(
        injector.register_template_definition(&Node::create_element("template")),
        None
    );

    let host = Node::create_element("x-card");
    assert_eq!(
        injector.inject_registered_template(&host),
        Injection::Materialized
    );
    assert_eq!(
        injector.inject_registered_template(&host),
        Injection::AlreadyHosting
    );
    assert_eq!(
        injector.inject_registered_template(&Node::create_element("x-other")),
        Injection::Unregistered
    );

    assert_eq!(
        host.to_string(),
        "<x-card><template shadowrootmode=\"closed\"><slot/></template></x-card>"
    );
}

#[test]
fn registry_teardown_stops_new_injections() {
    let injector = started();
    let dom = injector.dom();

    define(&dom.body(), x_box_marker());
    dom.flush();
    let before = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();

    injector.registry().clear();

    let after = dom.body().append_child(Node::create_element("x-box")).unwrap();
    dom.flush();

    assert!(before.shadow_root().is_some());
    assert!(after.shadow_root().is_none());
}

#[test]
fn dropping_the_injector_stops_observation() {
    let dom = ServerDom::new();
    let body = dom.body();
    let document_element = dom.document_element();

    {
        let mut injector = ShadowRootInjector::new(dom);
        injector.start(Some(&document_element)).unwrap();
    }

    // Nothing left to deliver to, and nothing panics
    define(&body, x_box_marker());
    body.append_child(Node::create_element("x-box")).unwrap();
}
