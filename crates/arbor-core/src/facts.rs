//! Facts: the normalized attribute, property, style and event map attached
//! to element-like nodes, and the diff between two of them.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::event::{Handler, Mapper};
use crate::sanitize;

/// One declaration, as written in a view function.
pub enum Fact<M> {
    Event {
        name: String,
        handler: Handler<M>,
    },
    Style {
        name: String,
        value: String,
    },
    Property {
        name: String,
        value: Value,
    },
    Attribute {
        name: String,
        value: String,
    },
    AttributeNs {
        namespace: String,
        name: String,
        value: String,
    },
}

impl<M> Fact<M> {
    pub fn on(name: &str, handler: Handler<M>) -> Self {
        Fact::Event {
            name: name.to_owned(),
            handler,
        }
    }

    pub fn style(name: &str, value: &str) -> Self {
        Fact::Style {
            name: name.to_owned(),
            value: value.to_owned(),
        }
    }

    pub fn property(name: &str, value: Value) -> Self {
        Fact::Property {
            name: sanitize::no_inner_html_or_form_action(name),
            value: sanitize::no_javascript_or_html_json(value),
        }
    }

    pub fn attribute(name: &str, value: &str) -> Self {
        Fact::Attribute {
            name: sanitize::no_on_or_form_action(name),
            value: sanitize::no_javascript_or_html_uri(value),
        }
    }

    pub fn attribute_ns(namespace: &str, name: &str, value: &str) -> Self {
        Fact::AttributeNs {
            namespace: namespace.to_owned(),
            name: sanitize::no_on_or_form_action(name),
            value: sanitize::no_javascript_or_html_uri(value),
        }
    }
}

impl<M: 'static> Fact<M> {
    /// Routes messages produced by this fact's handler through `mapper`.
    /// Non-event facts are returned unchanged.
    pub fn map_message(self, mapper: Mapper<M>) -> Self {
        match self {
            Fact::Event { name, handler } => Fact::Event {
                name,
                handler: handler.map(mapper),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsValue {
    pub namespace: String,
    pub value: String,
}

pub struct Facts<M> {
    pub events: IndexMap<String, Handler<M>>,
    pub styles: IndexMap<String, String>,
    pub attributes: IndexMap<String, String>,
    pub namespaced: IndexMap<String, NsValue>,
    pub properties: IndexMap<String, Value>,
}

impl<M> Default for Facts<M> {
    fn default() -> Self {
        Self {
            events: IndexMap::new(),
            styles: IndexMap::new(),
            attributes: IndexMap::new(),
            namespaced: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }
}

impl<M> fmt::Debug for Facts<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facts")
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field("styles", &self.styles)
            .field("attributes", &self.attributes)
            .field("namespaced", &self.namespaced)
            .field("properties", &self.properties)
            .finish()
    }
}

fn add_class(existing: Option<&String>, class: &str) -> String {
    match existing {
        Some(classes) if !classes.is_empty() => format!("{classes} {class}"),
        _ => class.to_owned(),
    }
}

impl<M> Facts<M> {
    /// Folds declarations in order. Later declarations win, except `class`
    /// attributes and `className` properties, which accumulate.
    pub fn from_declarations(declarations: impl IntoIterator<Item = Fact<M>>) -> Self {
        let mut facts = Facts::default();
        for fact in declarations {
            match fact {
                Fact::Event { name, handler } => {
                    facts.events.insert(name, handler);
                }
                Fact::Style { name, value } => {
                    facts.styles.insert(name, value);
                }
                Fact::Property { name, value } => {
                    let value = match (name.as_str(), value) {
                        ("className", Value::String(class)) => {
                            let existing = match facts.properties.get(&name) {
                                Some(Value::String(classes)) => Some(classes.clone()),
                                _ => None,
                            };
                            Value::String(add_class(existing.as_ref(), &class))
                        }
                        (_, value) => value,
                    };
                    facts.properties.insert(name, value);
                }
                Fact::Attribute { name, value } => {
                    let value = if name == "class" {
                        add_class(facts.attributes.get(&name), &value)
                    } else {
                        value
                    };
                    facts.attributes.insert(name, value);
                }
                Fact::AttributeNs {
                    namespace,
                    name,
                    value,
                } => {
                    facts.namespaced.insert(name, NsValue { namespace, value });
                }
            }
        }
        facts
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.styles.is_empty()
            && self.attributes.is_empty()
            && self.namespaced.is_empty()
            && self.properties.is_empty()
    }

    /// Every fact expressed as a change from an empty node.
    pub(crate) fn to_changes(&self) -> FactsDiff<M> {
        FactsDiff {
            events: self
                .events
                .iter()
                .map(|(name, handler)| (name.clone(), Some(handler.clone())))
                .collect(),
            styles: self.styles.clone(),
            attributes: self
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), Some(value.clone())))
                .collect(),
            namespaced: self
                .namespaced
                .iter()
                .map(|(name, ns)| {
                    let change = NsChange {
                        namespace: ns.namespace.clone(),
                        value: Some(ns.value.clone()),
                    };
                    (name.clone(), change)
                })
                .collect(),
            properties: self.properties.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsChange {
    pub namespace: String,
    pub value: Option<String>,
}

/// Changes between two fact sets. `None` removes; an empty style removes
/// the style; removed properties become `""` or `null`.
pub struct FactsDiff<M> {
    pub events: IndexMap<String, Option<Handler<M>>>,
    pub styles: IndexMap<String, String>,
    pub attributes: IndexMap<String, Option<String>>,
    pub namespaced: IndexMap<String, NsChange>,
    pub properties: IndexMap<String, Value>,
}

impl<M> fmt::Debug for FactsDiff<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<_> = self
            .events
            .iter()
            .map(|(name, handler)| (name, handler.is_some()))
            .collect();
        f.debug_struct("FactsDiff")
            .field("events", &events)
            .field("styles", &self.styles)
            .field("attributes", &self.attributes)
            .field("namespaced", &self.namespaced)
            .field("properties", &self.properties)
            .finish()
    }
}

impl<M> FactsDiff<M> {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.styles.is_empty()
            && self.attributes.is_empty()
            && self.namespaced.is_empty()
            && self.properties.is_empty()
    }
}

fn always_reapplied(name: &str) -> bool {
    name == "value" || name == "checked"
}

/// Returns `None` when nothing changed.
pub fn diff_facts<M>(old: &Facts<M>, new: &Facts<M>) -> Option<FactsDiff<M>> {
    let mut diff = FactsDiff {
        events: IndexMap::new(),
        styles: IndexMap::new(),
        attributes: IndexMap::new(),
        namespaced: IndexMap::new(),
        properties: IndexMap::new(),
    };

    for (name, handler) in &old.events {
        match new.events.get(name) {
            None => {
                diff.events.insert(name.clone(), None);
            }
            Some(next) if !handler.same(next) => {
                diff.events.insert(name.clone(), Some(next.clone()));
            }
            Some(_) => {}
        }
    }
    for (name, handler) in &new.events {
        if !old.events.contains_key(name) {
            diff.events.insert(name.clone(), Some(handler.clone()));
        }
    }

    for (name, value) in &old.styles {
        match new.styles.get(name) {
            None => {
                diff.styles.insert(name.clone(), String::new());
            }
            Some(next) if next != value => {
                diff.styles.insert(name.clone(), next.clone());
            }
            Some(_) => {}
        }
    }
    for (name, value) in &new.styles {
        if !old.styles.contains_key(name) {
            diff.styles.insert(name.clone(), value.clone());
        }
    }

    for (name, value) in &old.attributes {
        match new.attributes.get(name) {
            None => {
                diff.attributes.insert(name.clone(), None);
            }
            Some(next) if next != value => {
                diff.attributes.insert(name.clone(), Some(next.clone()));
            }
            Some(_) => {}
        }
    }
    for (name, value) in &new.attributes {
        if !old.attributes.contains_key(name) {
            diff.attributes.insert(name.clone(), Some(value.clone()));
        }
    }

    for (name, ns) in &old.namespaced {
        match new.namespaced.get(name) {
            None => {
                let change = NsChange {
                    namespace: ns.namespace.clone(),
                    value: None,
                };
                diff.namespaced.insert(name.clone(), change);
            }
            Some(next) if next != ns => {
                let change = NsChange {
                    namespace: next.namespace.clone(),
                    value: Some(next.value.clone()),
                };
                diff.namespaced.insert(name.clone(), change);
            }
            Some(_) => {}
        }
    }
    for (name, ns) in &new.namespaced {
        if !old.namespaced.contains_key(name) {
            let change = NsChange {
                namespace: ns.namespace.clone(),
                value: Some(ns.value.clone()),
            };
            diff.namespaced.insert(name.clone(), change);
        }
    }

    for (name, value) in &old.properties {
        match new.properties.get(name) {
            None => {
                let cleared = match value {
                    Value::String(_) => Value::String(String::new()),
                    _ => Value::Null,
                };
                diff.properties.insert(name.clone(), cleared);
            }
            Some(next) if next != value || always_reapplied(name) => {
                diff.properties.insert(name.clone(), next.clone());
            }
            Some(_) => {}
        }
    }
    for (name, value) in &new.properties {
        if !old.properties.contains_key(name) {
            diff.properties.insert(name.clone(), value.clone());
        }
    }

    if diff.is_empty() {
        None
    } else {
        Some(diff)
    }
}

#[cfg(test)]
#[path = "tests/facts_tests.rs"]
mod tests;
