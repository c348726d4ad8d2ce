//! Event bridge: handlers, decoders and the context chain that carries a
//! decoded message up through message mappers to the root dispatcher.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::surface::{Listener, ListenerResponse};

/// Rewrites a message as it bubbles out of a mapped subtree.
pub type Mapper<M> = Rc<dyn Fn(M) -> M>;

/// Receives every message produced by an event, together with whether the
/// event asked to be applied synchronously.
pub type Dispatcher<M> = Rc<dyn Fn(M, bool)>;

/// Turns a raw event payload into a value.
pub type Decoder<T> = Rc<dyn Fn(&Value) -> Result<T, DecodeError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MissingField(String),
    Expected { expected: &'static str, found: String },
    Failure(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingField(name) => write!(f, "missing field `{name}`"),
            DecodeError::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            DecodeError::Failure(reason) => f.write_str(reason),
        }
    }
}

impl std::error::Error for DecodeError {}

pub struct CustomResponse<M> {
    pub message: M,
    pub stop_propagation: bool,
    pub prevent_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Normal,
    MayStopPropagation,
    MayPreventDefault,
    Custom,
}

pub enum Handler<M> {
    Normal(Decoder<M>),
    MayStopPropagation(Decoder<(M, bool)>),
    MayPreventDefault(Decoder<(M, bool)>),
    Custom(Decoder<CustomResponse<M>>),
}

impl<M> Clone for Handler<M> {
    fn clone(&self) -> Self {
        match self {
            Handler::Normal(d) => Handler::Normal(Rc::clone(d)),
            Handler::MayStopPropagation(d) => Handler::MayStopPropagation(Rc::clone(d)),
            Handler::MayPreventDefault(d) => Handler::MayPreventDefault(Rc::clone(d)),
            Handler::Custom(d) => Handler::Custom(Rc::clone(d)),
        }
    }
}

impl<M> fmt::Debug for Handler<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{:?}", self.kind())
    }
}

pub(crate) struct Decoded<M> {
    pub message: M,
    pub stop_propagation: bool,
    pub prevent_default: bool,
}

impl<M> Handler<M> {
    pub fn kind(&self) -> HandlerKind {
        match self {
            Handler::Normal(_) => HandlerKind::Normal,
            Handler::MayStopPropagation(_) => HandlerKind::MayStopPropagation,
            Handler::MayPreventDefault(_) => HandlerKind::MayPreventDefault,
            Handler::Custom(_) => HandlerKind::Custom,
        }
    }

    /// Same kind and the very same decoder.
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Handler::Normal(a), Handler::Normal(b)) => Rc::ptr_eq(a, b),
            (Handler::MayStopPropagation(a), Handler::MayStopPropagation(b)) => Rc::ptr_eq(a, b),
            (Handler::MayPreventDefault(a), Handler::MayPreventDefault(b)) => Rc::ptr_eq(a, b),
            (Handler::Custom(a), Handler::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Handlers that can never prevent the default action.
    pub fn is_passive(&self) -> bool {
        matches!(self, Handler::Normal(_) | Handler::MayStopPropagation(_))
    }

    pub(crate) fn decode(&self, event: &Value) -> Result<Decoded<M>, DecodeError> {
        Ok(match self {
            Handler::Normal(decoder) => Decoded {
                message: decoder(event)?,
                stop_propagation: false,
                prevent_default: false,
            },
            Handler::MayStopPropagation(decoder) => {
                let (message, stop) = decoder(event)?;
                Decoded {
                    message,
                    stop_propagation: stop,
                    prevent_default: false,
                }
            }
            Handler::MayPreventDefault(decoder) => {
                let (message, prevent) = decoder(event)?;
                Decoded {
                    message,
                    stop_propagation: false,
                    prevent_default: prevent,
                }
            }
            Handler::Custom(decoder) => {
                let response = decoder(event)?;
                Decoded {
                    message: response.message,
                    stop_propagation: response.stop_propagation,
                    prevent_default: response.prevent_default,
                }
            }
        })
    }
}

impl<M: 'static> Handler<M> {
    /// Wraps the decoder so every produced message passes through `mapper`.
    pub fn map(self, mapper: Mapper<M>) -> Self {
        match self {
            Handler::Normal(decoder) => {
                Handler::Normal(Rc::new(move |event: &Value| {
                    decoder(event).map(|m| mapper(m))
                }))
            }
            Handler::MayStopPropagation(decoder) => Handler::MayStopPropagation(Rc::new(
                move |event: &Value| decoder(event).map(|(m, stop)| (mapper(m), stop)),
            )),
            Handler::MayPreventDefault(decoder) => Handler::MayPreventDefault(Rc::new(
                move |event: &Value| decoder(event).map(|(m, prevent)| (mapper(m), prevent)),
            )),
            Handler::Custom(decoder) => Handler::Custom(Rc::new(move |event: &Value| {
                decoder(event).map(|response| CustomResponse {
                    message: mapper(response.message),
                    stop_propagation: response.stop_propagation,
                    prevent_default: response.prevent_default,
                })
            })),
        }
    }
}

/// A link in the chain from a real node up to the root dispatcher.
///
/// Nodes that begin a mapped subtree own a `Mapped` context whose parent is
/// the context they were rendered under. Mapper lists are stored outermost
/// first and applied innermost first.
pub enum EventContext<M> {
    Root {
        dispatcher: RefCell<Dispatcher<M>>,
    },
    Mapped {
        mappers: RefCell<Vec<Mapper<M>>>,
        parent: Rc<EventContext<M>>,
    },
}

impl<M> fmt::Debug for EventContext<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventContext::Root { .. } => f.write_str("EventContext::Root"),
            EventContext::Mapped { mappers, parent } => f
                .debug_struct("EventContext::Mapped")
                .field("mappers", &mappers.borrow().len())
                .field("parent", parent)
                .finish(),
        }
    }
}

impl<M> EventContext<M> {
    pub fn root(dispatcher: Dispatcher<M>) -> Rc<Self> {
        Rc::new(EventContext::Root {
            dispatcher: RefCell::new(dispatcher),
        })
    }

    pub fn mapped(mappers: Vec<Mapper<M>>, parent: Rc<EventContext<M>>) -> Rc<Self> {
        Rc::new(EventContext::Mapped {
            mappers: RefCell::new(mappers),
            parent,
        })
    }

    pub(crate) fn replace_mappers(&self, chain: Vec<Mapper<M>>) {
        match self {
            EventContext::Mapped { mappers, .. } => *mappers.borrow_mut() = chain,
            EventContext::Root { .. } => panic!("cannot replace mappers on the root context"),
        }
    }

    pub(crate) fn set_dispatcher(&self, next: Dispatcher<M>) {
        if let EventContext::Root { dispatcher } = self {
            *dispatcher.borrow_mut() = next;
        }
    }

    /// Maps `message` through every context up to the root and hands it to
    /// the dispatcher.
    pub fn dispatch(&self, mut message: M, synchronous: bool) {
        let mut current = self;
        loop {
            match current {
                EventContext::Mapped { mappers, parent } => {
                    let chain = mappers.borrow().clone();
                    for mapper in chain.iter().rev() {
                        message = mapper(message);
                    }
                    current = &**parent;
                }
                EventContext::Root { dispatcher } => {
                    let dispatcher = dispatcher.borrow().clone();
                    dispatcher(message, synchronous);
                    return;
                }
            }
        }
    }
}

pub(crate) type HandlerSlot<M> = Rc<RefCell<Handler<M>>>;

/// Builds the native listener for one event name on one node. The handler
/// lives in `slot` so later renders can swap it without re-registering.
pub(crate) fn make_listener<M: 'static>(
    context: Rc<EventContext<M>>,
    slot: HandlerSlot<M>,
) -> Listener {
    Rc::new(move |event: &Value| {
        let handler = slot.borrow().clone();
        match handler.decode(event) {
            Ok(decoded) => {
                context.dispatch(decoded.message, decoded.stop_propagation);
                ListenerResponse {
                    stop_propagation: decoded.stop_propagation,
                    prevent_default: decoded.prevent_default,
                }
            }
            Err(err) => {
                log::debug!("dropping event that failed to decode: {err}");
                ListenerResponse::default()
            }
        }
    })
}

/// Building blocks for event decoders.
pub mod decode {
    use std::rc::Rc;

    use serde_json::Value;

    use super::{DecodeError, Decoder};

    fn describe(value: &Value) -> String {
        match value {
            Value::Null => "null".to_owned(),
            Value::Bool(b) => format!("boolean {b}"),
            Value::Number(n) => format!("number {n}"),
            Value::String(s) => format!("string {s:?}"),
            Value::Array(_) => "an array".to_owned(),
            Value::Object(_) => "an object".to_owned(),
        }
    }

    pub fn succeed<T: Clone + 'static>(value: T) -> Decoder<T> {
        Rc::new(move |_: &Value| Ok(value.clone()))
    }

    pub fn fail<T>(reason: &str) -> Decoder<T> {
        let reason = reason.to_owned();
        Rc::new(move |_: &Value| Err(DecodeError::Failure(reason.clone())))
    }

    pub fn string() -> Decoder<String> {
        Rc::new(|value: &Value| match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(DecodeError::Expected {
                expected: "a string",
                found: describe(other),
            }),
        })
    }

    pub fn boolean() -> Decoder<bool> {
        Rc::new(|value: &Value| match value {
            Value::Bool(b) => Ok(*b),
            other => Err(DecodeError::Expected {
                expected: "a boolean",
                found: describe(other),
            }),
        })
    }

    pub fn float() -> Decoder<f64> {
        Rc::new(|value: &Value| {
            value.as_f64().ok_or_else(|| DecodeError::Expected {
                expected: "a number",
                found: describe(value),
            })
        })
    }

    pub fn field<T: 'static>(name: &str, inner: Decoder<T>) -> Decoder<T> {
        let name = name.to_owned();
        Rc::new(move |value: &Value| match value.get(&name) {
            Some(found) => inner(found),
            None => Err(DecodeError::MissingField(name.clone())),
        })
    }

    pub fn at<T: 'static>(path: &[&str], inner: Decoder<T>) -> Decoder<T> {
        path.iter()
            .rev()
            .fold(inner, |decoder, name| field(name, decoder))
    }

    pub fn map<A: 'static, B: 'static>(
        decoder: Decoder<A>,
        f: impl Fn(A) -> B + 'static,
    ) -> Decoder<B> {
        Rc::new(move |value: &Value| decoder(value).map(&f))
    }

    pub fn target_value() -> Decoder<String> {
        at(&["target", "value"], string())
    }

    pub fn target_checked() -> Decoder<bool> {
        at(&["target", "checked"], boolean())
    }
}

#[cfg(test)]
#[path = "tests/event_tests.rs"]
mod tests;
