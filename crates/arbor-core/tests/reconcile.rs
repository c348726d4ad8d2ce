use arbor_core::html::{class, div, li, p, span, text};
use arbor_core::{diff, Fact, VNode};
use arbor_testing::{assert_confluent, keyed_list, render_to_string, ReconcileTestRule};

type Msg = ();

/// Every ordering of every subset of `keys`.
fn arrangements<'a>(keys: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut out = vec![Vec::new()];
    for (i, key) in keys.iter().enumerate() {
        let rest: Vec<&str> = keys
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, k)| *k)
            .collect();
        for mut tail in arrangements(&rest) {
            tail.insert(0, *key);
            out.push(tail);
        }
    }
    out.sort();
    out.dedup();
    out
}

/// Keyed items that also carry their position, so moved items get patched.
fn positioned(keys: &[&str]) -> VNode<Msg> {
    let children = keys
        .iter()
        .enumerate()
        .map(|(position, key)| {
            let item = li(
                vec![class(&position.to_string())],
                vec![text(*key), span(vec![], vec![text(format!("#{position}"))])],
            );
            ((*key).to_owned(), item)
        })
        .collect();
    VNode::keyed("ul", vec![], children)
}

#[test]
fn keyed_lists_reach_the_rendered_state_for_every_arrangement() {
    let all = arrangements(&["a", "b", "c", "d"]);
    assert_eq!(all.len(), 65);
    for old in &all {
        for new in &all {
            assert_confluent(&positioned(old), &positioned(new));
        }
    }
}

#[test]
fn duplicate_keys_still_reconcile() {
    let cases: [(&[&str], &[&str]); 6] = [
        (&["a", "a", "b"], &["b", "a", "a"]),
        (&["a", "b"], &["a", "a", "a"]),
        (&["x", "x"], &["x"]),
        (&["a", "b", "a"], &["a", "a", "b"]),
        (&[], &["q", "q"]),
        (&["q", "q", "q"], &[]),
    ];
    for (old, new) in cases {
        assert_confluent(&positioned(old), &positioned(new));
    }
}

#[test]
fn element_trees_reach_the_rendered_state() {
    let trees: Vec<VNode<Msg>> = vec![
        div(vec![], vec![]),
        div(vec![class("a")], vec![text("one")]),
        div(vec![class("b")], vec![text("one"), text("two")]),
        div(
            vec![Fact::style("color", "red")],
            vec![p(vec![], vec![text("x")]), text("two")],
        ),
        div(vec![], vec![span(vec![], vec![text("y")]), p(vec![], vec![])]),
        span(vec![], vec![text("other root")]),
        text("bare"),
        keyed_list(&["a", "b"]),
        VNode::keyed("div", vec![class("a")], vec![("k".to_owned(), text("one"))]),
    ];
    for old in &trees {
        for new in &trees {
            assert_confluent(old, new);
        }
    }
}

#[test]
fn structurally_equal_trees_produce_no_patches() {
    let build = || {
        div(
            vec![class("card"), Fact::style("margin", "0")],
            vec![positioned(&["a", "b", "c"]), text("footer")],
        )
    };
    assert!(diff(&build(), &build()).is_empty());

    let mut rule = ReconcileTestRule::<Msg>::new();
    rule.set_content(build()).expect("render");
    let before = rule.dump();
    rule.update(build()).expect("update");
    assert_eq!(rule.dump(), before);
}

#[test]
fn moved_children_keep_their_real_nodes() {
    let mut rule = ReconcileTestRule::<Msg>::new();
    rule.set_content(keyed_list(&["a", "b", "c"])).expect("render");
    let a = rule.node_at(&[0]).expect("a");
    let b = rule.node_at(&[1]).expect("b");
    let c = rule.node_at(&[2]).expect("c");

    rule.update(keyed_list(&["b", "c", "a"])).expect("rotate");
    assert_eq!(rule.node_at(&[0]).expect("first"), b);
    assert_eq!(rule.node_at(&[1]).expect("second"), c);
    assert_eq!(rule.node_at(&[2]).expect("third"), a);

    rule.update(keyed_list(&["c", "b", "a"])).expect("swap");
    assert_eq!(rule.node_at(&[0]).expect("first"), c);
    assert_eq!(rule.node_at(&[1]).expect("second"), b);
    assert_eq!(rule.node_at(&[2]).expect("third"), a);
    assert_eq!(rule.dump(), render_to_string(&keyed_list::<Msg>(&["c", "b", "a"])));
}

#[test]
fn reversing_a_long_list_moves_every_item() {
    let keys: Vec<String> = (0..100).map(|i| format!("k{i}")).collect();
    let forward: Vec<&str> = keys.iter().map(String::as_str).collect();
    let backward: Vec<&str> = forward.iter().rev().copied().collect();

    let mut rule = ReconcileTestRule::<Msg>::new();
    rule.set_content(keyed_list(&forward)).expect("render");
    let first = rule.node_at(&[0]).expect("first");
    let before = rule.surface().len();

    rule.update(keyed_list(&backward)).expect("reverse");
    assert_eq!(rule.node_at(&[99]).expect("last"), first);
    assert_eq!(rule.surface().len(), before);
    assert_eq!(rule.dump(), render_to_string(&keyed_list::<Msg>(&backward)));
}

#[test]
fn redrawing_the_root_returns_the_new_root() {
    let mut rule = ReconcileTestRule::<Msg>::new();
    let old_root = rule
        .set_content(div(vec![], vec![text("a")]))
        .expect("render");
    let new_root = rule
        .update(span(vec![], vec![text("a")]))
        .expect("update");

    assert_ne!(old_root, new_root);
    assert!(!rule.surface().contains(old_root));
    assert_eq!(rule.dump(), "<span>\n  \"a\"\n");
}

#[test]
fn shrinking_and_growing_children_frees_and_creates_nodes() {
    let mut rule = ReconcileTestRule::<Msg>::new();
    rule.set_content(div(vec![], vec![text("1"), text("2"), text("3")]))
        .expect("render");
    let live = rule.surface().len();

    rule.update(div(vec![], vec![text("1")])).expect("shrink");
    assert_eq!(rule.surface().len(), live - 2);

    rule.update(div(vec![], vec![text("1"), text("b"), text("c"), text("d")]))
        .expect("grow");
    assert_eq!(rule.surface().len(), live + 1);
    assert_eq!(
        rule.dump(),
        "<div>\n  \"1\"\n  \"b\"\n  \"c\"\n  \"d\"\n"
    );
}
