use arbor_app_shell::{describe_tree, AppShell, Program};
use arbor_core::html::{button, div, input, on_click, on_input, span, text, value};
use arbor_core::{MemorySurface, Surface, VNode};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
enum Msg {
    Increment,
    Decrement,
    Rename(String),
}

#[derive(Debug, Default)]
struct Model {
    count: i64,
    name: String,
}

struct Counter;

impl Program for Counter {
    type Model = Model;
    type Msg = Msg;

    fn init(&self) -> Model {
        Model::default()
    }

    fn update(&self, model: &mut Model, msg: Msg) {
        match msg {
            Msg::Increment => model.count += 1,
            Msg::Decrement => model.count -= 1,
            Msg::Rename(name) => model.name = name,
        }
    }

    fn view(&self, model: &Model) -> VNode<Msg> {
        div(
            vec![],
            vec![
                button(vec![on_click(Msg::Decrement)], vec![text("-")]),
                span(vec![], vec![text(model.count.to_string())]),
                button(vec![on_click(Msg::Increment)], vec![text("+")]),
                input(vec![value(&model.name), on_input(Msg::Rename)], vec![]),
            ],
        )
    }
}

fn child(shell: &AppShell<MemorySurface, Counter>, position: usize) -> usize {
    let root = shell.root().expect("root");
    shell
        .surface()
        .child_at(root, position)
        .expect("lookup")
        .expect("child")
}

#[test]
fn initial_view_is_rendered() {
    let shell = AppShell::new(MemorySurface::new(), Counter);
    assert!(!shell.should_render());
    assert_eq!(
        shell.surface().dump_tree(shell.root()),
        "<div>\n  <button @click>\n    \"-\"\n  <span>\n    \"0\"\n  <button @click>\n    \"+\"\n  <input @input>\n"
    );
}

#[test]
fn clicks_are_queued_until_update() {
    let mut shell = AppShell::new(MemorySurface::new(), Counter);
    let plus = child(&shell, 2);
    let label = child(&shell, 1);

    shell.fire(plus, "click", &json!({})).expect("dispatched");
    shell.fire(plus, "click", &json!({})).expect("dispatched");
    assert!(shell.should_render());
    assert_eq!(shell.model().count, 0);

    shell.update();
    assert!(!shell.should_render());
    assert_eq!(shell.model().count, 2);
    let digits = shell.surface().child_at(label, 0).expect("lookup").expect("text");
    assert_eq!(shell.surface().text(digits), Some("2"));
}

#[test]
fn synchronous_events_apply_immediately() {
    let mut shell = AppShell::new(MemorySurface::new(), Counter);
    let field = child(&shell, 3);

    shell
        .fire(field, "input", &json!({ "target": { "value": "ada" } }))
        .expect("dispatched");
    assert!(!shell.should_render());
    assert_eq!(shell.model().name, "ada");
    assert_eq!(
        shell.surface().property(field, "value").expect("property"),
        Some(json!("ada"))
    );
}

#[test]
fn sent_messages_update_the_view() {
    let mut shell = AppShell::new(MemorySurface::new(), Counter);
    shell.send(Msg::Decrement);
    shell.update();
    assert_eq!(shell.model().count, -1);
    assert!(shell.surface().dump_tree(shell.root()).contains("\"-1\""));
}

#[test]
fn firing_at_a_missing_node_is_reported() {
    let mut shell = AppShell::new(MemorySurface::new(), Counter);
    assert_eq!(shell.fire(999, "click", &json!({})), None);
}

#[test]
fn existing_markup_is_adopted() {
    let mut surface = MemorySurface::new();
    let root = surface.create_element("div", None);
    let minus = surface.create_element("button", None);
    let sign = surface.create_text("-");
    surface.append_child(minus, sign).expect("append");
    surface.append_child(root, minus).expect("append");

    let mut shell = AppShell::adopt(surface, Counter, root);
    assert_eq!(shell.root(), Some(root));
    assert_eq!(child(&shell, 0), minus);
    assert_eq!(
        shell.surface().dump_tree(shell.root()),
        "<div>\n  <button @click>\n    \"-\"\n  <span>\n    \"0\"\n  <button @click>\n    \"+\"\n  <input @input>\n"
    );

    shell.fire(minus, "click", &json!({})).expect("dispatched");
    shell.update();
    assert_eq!(shell.model().count, -1);
}

#[test]
fn describe_tree_walks_in_document_order() {
    let shell = AppShell::new(MemorySurface::new(), Counter);
    let dump = describe_tree(shell.surface(), shell.root().expect("root")).expect("describe");
    assert_eq!(
        dump,
        "<div>\n  <button>\n    \"-\"\n  <span>\n    \"0\"\n  <button>\n    \"+\"\n  <input>\n"
    );
}
