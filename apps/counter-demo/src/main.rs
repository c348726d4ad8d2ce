//! Drives a counter and a keyed todo list on the in-memory surface with a
//! scripted sequence of events, printing the tree after each step.

use arbor_app_shell::{AppShell, Program};
use arbor_core::html::{
    button, checked, class, div, header, input, label, li, on_check, on_click, on_input, section,
    span, text, value,
};
use arbor_core::{MemorySurface, NodeId, Surface, VNode};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
enum Msg {
    Increment,
    Decrement,
    Draft(String),
    Add,
    Toggle(u32, bool),
    Remove(u32),
    Reverse,
}

#[derive(Debug, Clone, PartialEq)]
struct Todo {
    id: u32,
    title: String,
    done: bool,
}

#[derive(Debug, Default)]
struct Model {
    count: i64,
    draft: String,
    next_id: u32,
    todos: Vec<Todo>,
}

struct Demo;

impl Program for Demo {
    type Model = Model;
    type Msg = Msg;

    fn init(&self) -> Model {
        Model::default()
    }

    fn update(&self, model: &mut Model, msg: Msg) {
        match msg {
            Msg::Increment => model.count += 1,
            Msg::Decrement => model.count -= 1,
            Msg::Draft(text) => model.draft = text,
            Msg::Add => {
                let title = model.draft.trim().to_owned();
                if !title.is_empty() {
                    model.todos.push(Todo {
                        id: model.next_id,
                        title,
                        done: false,
                    });
                    model.next_id += 1;
                    model.draft.clear();
                }
            }
            Msg::Toggle(id, done) => {
                if let Some(todo) = model.todos.iter_mut().find(|todo| todo.id == id) {
                    todo.done = done;
                }
            }
            Msg::Remove(id) => model.todos.retain(|todo| todo.id != id),
            Msg::Reverse => model.todos.reverse(),
        }
    }

    fn view(&self, model: &Model) -> VNode<Msg> {
        div(
            vec![class("app")],
            vec![counter_view(model.count), todo_view(model)],
        )
    }
}

fn counter_view(count: i64) -> VNode<Msg> {
    header(
        vec![],
        vec![
            button(vec![on_click(Msg::Decrement)], vec![text("-")]),
            span(vec![], vec![text(count.to_string())]),
            button(vec![on_click(Msg::Increment)], vec![text("+")]),
        ],
    )
}

fn todo_row(todo: &Todo) -> VNode<Msg> {
    let id = todo.id;
    li(
        vec![class(if todo.done { "done" } else { "open" })],
        vec![
            input(
                vec![
                    checked(todo.done),
                    on_check(move |done| Msg::Toggle(id, done)),
                ],
                vec![],
            ),
            label(vec![], vec![text(todo.title.clone())]),
            button(vec![on_click(Msg::Remove(id))], vec![text("x")]),
        ],
    )
}

fn todo_view(model: &Model) -> VNode<Msg> {
    let items = model
        .todos
        .iter()
        .map(|todo| (todo.id.to_string(), VNode::lazy(todo_row, todo.clone())))
        .collect();
    section(
        vec![],
        vec![
            input(vec![value(&model.draft), on_input(Msg::Draft)], vec![]),
            button(vec![on_click(Msg::Add)], vec![text("add")]),
            button(vec![on_click(Msg::Reverse)], vec![text("reverse")]),
            VNode::keyed("ul", vec![], items),
        ],
    )
}

struct Session {
    shell: AppShell<MemorySurface, Demo>,
}

impl Session {
    fn node(&self, path: &[usize]) -> Option<NodeId> {
        let mut node = self.shell.root()?;
        for &position in path {
            node = self.shell.surface().child_at(node, position).ok()??;
        }
        Some(node)
    }

    fn fire(&mut self, path: &[usize], event: &str, payload: serde_json::Value) {
        let Some(target) = self.node(path) else {
            log::error!("no node at {path:?}");
            return;
        };
        self.shell.fire(target, event, &payload);
        if self.shell.should_render() {
            self.shell.update();
        }
    }

    fn show(&self, step: &str) {
        println!("== {step}");
        print!("{}", self.shell.surface().dump_tree(self.shell.root()));
    }
}

// Paths from the root `div`.
const PLUS: &[usize] = &[0, 2];
const MINUS: &[usize] = &[0, 0];
const DRAFT: &[usize] = &[1, 0];
const ADD: &[usize] = &[1, 1];
const REVERSE: &[usize] = &[1, 2];
const LIST: usize = 3;

fn main() {
    env_logger::init();

    let mut session = Session {
        shell: AppShell::new(MemorySurface::new(), Demo),
    };
    session.show("initial");

    session.fire(PLUS, "click", json!({}));
    session.fire(PLUS, "click", json!({}));
    session.fire(MINUS, "click", json!({}));
    session.show("counter at 1");

    for title in ["write docs", "fix bug", "ship"] {
        session.fire(DRAFT, "input", json!({ "target": { "value": title } }));
        session.fire(ADD, "click", json!({}));
    }
    session.show("three todos");

    session.fire(&[1, LIST, 1, 0], "change", json!({ "target": { "checked": true } }));
    session.show("second todo done");

    session.fire(REVERSE, "click", json!({}));
    session.show("reversed");

    session.fire(&[1, LIST, 0, 2], "click", json!({}));
    session.show("first todo removed");
}
