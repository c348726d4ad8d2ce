//! Shorthand constructors for common HTML elements, attributes and events.

use serde_json::Value;

use crate::event::{decode, Handler};
use crate::facts::Fact;
use crate::vnode::VNode;

pub fn text<M>(content: impl Into<String>) -> VNode<M> {
    VNode::text(content)
}

macro_rules! elements {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name<M>(facts: Vec<Fact<M>>, children: Vec<VNode<M>>) -> VNode<M> {
                VNode::element(stringify!($name), facts, children)
            }
        )*
    };
}

elements!(div, span, p, ul, ol, li, button, input, label, section, header, footer);

pub fn class<M>(name: &str) -> Fact<M> {
    Fact::attribute("class", name)
}

pub fn id<M>(name: &str) -> Fact<M> {
    Fact::attribute("id", name)
}

pub fn href<M>(url: &str) -> Fact<M> {
    Fact::attribute("href", url)
}

pub fn style<M>(name: &str, value: &str) -> Fact<M> {
    Fact::style(name, value)
}

pub fn value<M>(text: &str) -> Fact<M> {
    Fact::property("value", Value::String(text.to_owned()))
}

pub fn checked<M>(on: bool) -> Fact<M> {
    Fact::property("checked", Value::Bool(on))
}

pub fn on_click<M: Clone + 'static>(message: M) -> Fact<M> {
    Fact::on("click", Handler::Normal(decode::succeed(message)))
}

/// Reports the input's current text. Stops propagation so the update is
/// applied synchronously and the caret does not jump.
pub fn on_input<M: 'static>(tagger: impl Fn(String) -> M + 'static) -> Fact<M> {
    let decoder = decode::map(decode::target_value(), move |text| (tagger(text), true));
    Fact::on("input", Handler::MayStopPropagation(decoder))
}

pub fn on_check<M: 'static>(tagger: impl Fn(bool) -> M + 'static) -> Fact<M> {
    Fact::on(
        "change",
        Handler::Normal(decode::map(decode::target_checked(), tagger)),
    )
}
