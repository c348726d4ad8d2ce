//! Filters applied to fact declarations before they reach the surface.
//!
//! Virtual trees are often built from untrusted data. These filters keep
//! that data from smuggling script into the page through tag names, inline
//! handler attributes or `javascript:` URLs.

use serde_json::Value;

pub fn no_script(tag: &str) -> &str {
    if tag == "script" {
        "p"
    } else {
        tag
    }
}

/// Renames `on*` and `formAction` attributes so they become inert data.
pub fn no_on_or_form_action(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("on") || name == "formAction" {
        format!("data-{name}")
    } else {
        name.to_owned()
    }
}

pub fn no_inner_html_or_form_action(name: &str) -> String {
    if name == "innerHTML" || name == "formAction" {
        format!("data-{name}")
    } else {
        name.to_owned()
    }
}

/// Blanks `javascript:` and `data:text/html` URIs. Whitespace and case are
/// ignored when matching, as browsers do.
pub fn no_javascript_or_html_uri(value: &str) -> String {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if compact.starts_with("javascript:") || compact.starts_with("data:text/html") {
        String::new()
    } else {
        value.to_owned()
    }
}

pub fn no_javascript_or_html_json(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(no_javascript_or_html_uri(&text)),
        other => other,
    }
}
