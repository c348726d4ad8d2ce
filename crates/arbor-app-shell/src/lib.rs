use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::rc::Rc;

use arbor_core::{
    diff, virtualize, DispatchOutcome, Dispatcher, EventSource, NodeError, NodeId, NodeView,
    Surface, VNode, VirtualDom, VirtualDomOptions,
};
use serde_json::Value;

/// Environment variable that makes the shell log the surface tree after
/// every update.
pub const DEBUG_ENV: &str = "ARBOR_DEBUG";

/// An application in model/update/view form.
pub trait Program {
    type Model;
    type Msg: 'static;

    fn init(&self) -> Self::Model;
    fn update(&self, model: &mut Self::Model, msg: Self::Msg);
    fn view(&self, model: &Self::Model) -> VNode<Self::Msg>;
}

struct Mailbox<M> {
    queue: RefCell<VecDeque<M>>,
    synchronous: Cell<bool>,
}

impl<M> Mailbox<M> {
    fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            synchronous: Cell::new(false),
        }
    }

    fn post(&self, msg: M, synchronous: bool) {
        self.queue.borrow_mut().push_back(msg);
        if synchronous {
            self.synchronous.set(true);
        }
    }

    fn drain(&self) -> Vec<M> {
        self.synchronous.set(false);
        self.queue.borrow_mut().drain(..).collect()
    }
}

/// Owns a surface, a program's model and the engine, and keeps the surface
/// in step with `view(model)`.
pub struct AppShell<S, P>
where
    S: Surface + EventSource,
    P: Program,
{
    surface: S,
    program: P,
    model: P::Model,
    dom: VirtualDom<P::Msg>,
    mailbox: Rc<Mailbox<P::Msg>>,
    tree: VNode<P::Msg>,
    root: Option<NodeId>,
    debug: bool,
}

fn mailbox_dispatcher<M: 'static>(mailbox: &Rc<Mailbox<M>>) -> Dispatcher<M> {
    let mailbox = Rc::clone(mailbox);
    Rc::new(move |msg: M, synchronous: bool| mailbox.post(msg, synchronous))
}

impl<S, P> AppShell<S, P>
where
    S: Surface + EventSource,
    P: Program,
{
    /// Renders the program's initial view onto `surface`. The caller
    /// attaches [`AppShell::root`] wherever the surface needs it.
    pub fn new(surface: S, program: P) -> Self {
        Self::with_options(surface, program, VirtualDomOptions::default())
    }

    pub fn with_options(surface: S, program: P, options: VirtualDomOptions) -> Self {
        let mut shell = Self::empty(surface, program, options);
        match shell.dom.render(&mut shell.surface, &shell.tree) {
            Ok(root) => shell.root = Some(root),
            Err(err) => log::error!("initial render failed: {err}"),
        }
        shell.log_tree();
        shell
    }

    /// Takes over markup that already exists under `node`, patching it to
    /// match the program's initial view instead of rendering from scratch.
    pub fn adopt(surface: S, program: P, node: NodeId) -> Self {
        let mut shell = Self::empty(surface, program, VirtualDomOptions::default());
        match virtualize(&shell.surface, node) {
            Ok(existing) => {
                let patches = diff(&existing, &shell.tree);
                match shell.dom.patch(&mut shell.surface, node, &existing, patches) {
                    Ok(root) => shell.root = Some(root),
                    Err(err) => log::error!("adopting node {node} failed: {err}"),
                }
            }
            Err(err) => log::error!("failed to read existing node {node}: {err}"),
        }
        shell.log_tree();
        shell
    }

    fn empty(surface: S, program: P, options: VirtualDomOptions) -> Self {
        let mailbox = Rc::new(Mailbox::new());
        let dom = VirtualDom::with_options(mailbox_dispatcher(&mailbox), options);
        let model = program.init();
        let tree = program.view(&model);
        Self {
            surface,
            program,
            model,
            dom,
            mailbox,
            tree,
            root: None,
            debug: std::env::var_os(DEBUG_ENV).is_some(),
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn model(&self) -> &P::Model {
        &self.model
    }

    pub fn tree(&self) -> &VNode<P::Msg> {
        &self.tree
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Posts a message as if a listener had produced it.
    pub fn send(&self, msg: P::Msg) {
        self.mailbox.post(msg, false);
    }

    pub fn should_render(&self) -> bool {
        !self.mailbox.queue.borrow().is_empty()
    }

    /// Runs every queued message through the program and patches the
    /// surface to the resulting view.
    pub fn update(&mut self) {
        let messages = self.mailbox.drain();
        if messages.is_empty() {
            return;
        }
        for msg in messages {
            self.program.update(&mut self.model, msg);
        }

        let next = self.program.view(&self.model);
        let Some(root) = self.root else {
            log::error!("no root to patch; rendering from scratch");
            match self.dom.render(&mut self.surface, &next) {
                Ok(root) => self.root = Some(root),
                Err(err) => log::error!("render failed: {err}"),
            }
            self.tree = next;
            self.log_tree();
            return;
        };

        let patches = diff(&self.tree, &next);
        match self.dom.patch(&mut self.surface, root, &self.tree, patches) {
            Ok(root) => self.root = Some(root),
            Err(err) => log::error!("patch failed: {err}"),
        }
        self.tree = next;
        self.log_tree();
    }

    /// Delivers a native event. Applies the resulting messages right away
    /// when a handler asked for synchronous handling.
    pub fn fire(
        &mut self,
        target: NodeId,
        event: &str,
        payload: &Value,
    ) -> Option<DispatchOutcome> {
        match self.surface.dispatch_event(target, event, payload) {
            Ok(outcome) => {
                if self.mailbox.synchronous.get() {
                    self.update();
                }
                Some(outcome)
            }
            Err(err) => {
                log::error!("dispatching {event} to node {target} failed: {err}");
                None
            }
        }
    }

    fn log_tree(&self) {
        if !self.debug {
            return;
        }
        match self.root {
            Some(root) => match describe_tree(&self.surface, root) {
                Ok(dump) => log::debug!("surface after update:\n{dump}"),
                Err(err) => log::error!("failed to describe surface: {err}"),
            },
            None => log::debug!("surface after update: (no root)"),
        }
    }
}

/// Renders the real subtree under `root` as indented text using only the
/// [`Surface`] interface.
pub fn describe_tree(surface: &dyn Surface, root: NodeId) -> Result<String, NodeError> {
    let mut output = String::new();
    let mut pending = vec![(root, 0usize)];
    while let Some((node, depth)) = pending.pop() {
        let indent = "  ".repeat(depth);
        match surface.describe(node)? {
            NodeView::Text(text) => {
                let _ = writeln!(output, "{indent}{text:?}");
            }
            NodeView::Other => {
                let _ = writeln!(output, "{indent}<?>");
            }
            NodeView::Element {
                tag, attributes, ..
            } => {
                let _ = write!(output, "{indent}<{tag}");
                for (name, value) in attributes {
                    let _ = write!(output, " {name}={value:?}");
                }
                output.push_str(">\n");
                let children = surface.children(node)?;
                pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
            }
        }
    }
    Ok(output)
}
