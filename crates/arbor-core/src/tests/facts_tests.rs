use super::*;
use crate::event::decode;
use serde_json::json;
use std::rc::Rc;

type Msg = u32;

#[test]
fn later_declarations_overwrite_earlier_ones() {
    let facts: Facts<Msg> = Facts::from_declarations(vec![
        Fact::attribute("title", "first"),
        Fact::style("color", "red"),
        Fact::attribute("title", "second"),
        Fact::style("color", "blue"),
    ]);
    assert_eq!(facts.attributes.get("title").map(String::as_str), Some("second"));
    assert_eq!(facts.styles.get("color").map(String::as_str), Some("blue"));
}

#[test]
fn class_declarations_accumulate() {
    let facts: Facts<Msg> = Facts::from_declarations(vec![
        Fact::attribute("class", "a"),
        Fact::attribute("class", "b"),
        Fact::property("className", json!("x")),
        Fact::property("className", json!("y")),
    ]);
    assert_eq!(facts.attributes.get("class").map(String::as_str), Some("a b"));
    assert_eq!(facts.properties.get("className"), Some(&json!("x y")));
}

#[test]
fn unsafe_declarations_are_neutralized() {
    let facts: Facts<Msg> = Facts::from_declarations(vec![
        Fact::attribute("onclick", "steal()"),
        Fact::attribute("href", "javascript:steal()"),
        Fact::property("innerHTML", json!("<b>")),
    ]);
    assert!(facts.attributes.contains_key("data-onclick"));
    assert_eq!(facts.attributes.get("href").map(String::as_str), Some(""));
    assert!(facts.properties.contains_key("data-innerHTML"));
}

#[test]
fn identical_facts_have_no_diff() {
    let decoder = decode::succeed(1);
    let build = || {
        Facts::<Msg>::from_declarations(vec![
            Fact::attribute("id", "a"),
            Fact::on("click", Handler::Normal(Rc::clone(&decoder))),
        ])
    };
    assert!(diff_facts(&build(), &build()).is_none());
}

#[test]
fn removals_use_category_specific_markers() {
    let old: Facts<Msg> = Facts::from_declarations(vec![
        Fact::attribute("id", "a"),
        Fact::attribute_ns("urn:x", "href", "#a"),
        Fact::style("color", "red"),
        Fact::property("title", json!("t")),
        Fact::property("tabIndex", json!(2)),
        Fact::on("click", Handler::Normal(decode::succeed(1))),
    ]);
    let new: Facts<Msg> = Facts::default();

    let changes = diff_facts(&old, &new).expect("changes");
    assert_eq!(changes.attributes.get("id"), Some(&None));
    assert_eq!(
        changes.namespaced.get("href"),
        Some(&NsChange {
            namespace: "urn:x".to_owned(),
            value: None
        })
    );
    assert_eq!(changes.styles.get("color").map(String::as_str), Some(""));
    assert_eq!(changes.properties.get("title"), Some(&json!("")));
    assert_eq!(changes.properties.get("tabIndex"), Some(&Value::Null));
    assert!(matches!(changes.events.get("click"), Some(None)));
}

#[test]
fn value_and_checked_are_always_carried() {
    let old: Facts<Msg> = Facts::from_declarations(vec![
        Fact::property("value", json!("same")),
        Fact::property("checked", json!(true)),
        Fact::property("title", json!("same")),
    ]);
    let new: Facts<Msg> = Facts::from_declarations(vec![
        Fact::property("value", json!("same")),
        Fact::property("checked", json!(true)),
        Fact::property("title", json!("same")),
    ]);

    let changes = diff_facts(&old, &new).expect("changes");
    assert_eq!(changes.properties.len(), 2);
    assert!(changes.properties.contains_key("value"));
    assert!(changes.properties.contains_key("checked"));
}

#[test]
fn additions_and_updates_are_reported() {
    let old: Facts<Msg> = Facts::from_declarations(vec![Fact::attribute("id", "a")]);
    let handler = Handler::Normal(decode::succeed(2));
    let new: Facts<Msg> = Facts::from_declarations(vec![
        Fact::attribute("id", "b"),
        Fact::style("width", "1px"),
        Fact::on("click", handler.clone()),
    ]);

    let changes = diff_facts(&old, &new).expect("changes");
    assert_eq!(changes.attributes.get("id"), Some(&Some("b".to_owned())));
    assert_eq!(changes.styles.get("width").map(String::as_str), Some("1px"));
    match changes.events.get("click") {
        Some(Some(added)) => assert!(added.same(&handler)),
        other => panic!("unexpected event change {other:?}"),
    }
}

#[test]
fn mapped_event_fact_wraps_decoder() {
    let fact: Fact<Msg> = Fact::on("click", Handler::Normal(decode::succeed(1)))
        .map_message(Rc::new(|n: Msg| n + 100));
    let Fact::Event { handler, .. } = fact else {
        panic!("expected an event fact");
    };
    let decoded = handler.decode(&json!(null)).expect("decodes");
    assert_eq!(decoded.message, 101);
}
