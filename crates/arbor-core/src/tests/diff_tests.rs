use super::*;
use crate::event::{decode, Handler};
use crate::facts::Fact;

type Msg = u8;

fn text(content: &str) -> VNode<Msg> {
    VNode::text(content)
}

fn div(children: Vec<VNode<Msg>>) -> VNode<Msg> {
    VNode::element("div", vec![], children)
}

fn indices(patches: &[Patch<Msg>]) -> Vec<usize> {
    patches.iter().map(|patch| patch.index).collect()
}

#[test]
fn same_reference_yields_nothing() {
    let tree = div(vec![text("a"), div(vec![text("b")])]);
    assert!(diff(&tree, &tree).is_empty());
}

#[test]
fn equal_but_distinct_trees_yield_nothing() {
    let old = div(vec![text("a"), div(vec![text("b")])]);
    let new = div(vec![text("a"), div(vec![text("b")])]);
    assert!(diff(&old, &new).is_empty());
}

#[test]
fn text_change_is_addressed_in_preorder() {
    let old = div(vec![div(vec![text("a"), text("b")]), text("c")]);
    let new = div(vec![div(vec![text("a"), text("B")]), text("C")]);
    let patches = diff(&old, &new);
    assert_eq!(indices(&patches), vec![3, 4]);
    assert!(matches!(&patches[0].kind, PatchKind::Text(t) if t == "B"));
    assert!(matches!(&patches[1].kind, PatchKind::Text(t) if t == "C"));
}

#[test]
fn shape_or_tag_mismatch_redraws() {
    let patches = diff(&text("a"), &div(vec![]));
    assert_eq!(indices(&patches), vec![0]);
    assert!(matches!(patches[0].kind, PatchKind::Redraw(_)));

    let old = div(vec![]);
    let new = VNode::element("span", vec![], vec![]);
    assert!(matches!(diff(&old, &new)[0].kind, PatchKind::Redraw(_)));

    let old: VNode<Msg> = VNode::element_ns("urn:a", "g", vec![], vec![]);
    let new = VNode::element_ns("urn:b", "g", vec![], vec![]);
    assert!(matches!(diff(&old, &new)[0].kind, PatchKind::Redraw(_)));
}

#[test]
fn shorter_list_trims_and_longer_list_appends() {
    let old = div(vec![text("a"), text("b"), text("c")]);
    let new = div(vec![text("a")]);
    let patches = diff(&old, &new);
    assert_eq!(patches.len(), 1);
    assert!(matches!(
        patches[0].kind,
        PatchKind::RemoveLast { from: 1, count: 2 }
    ));

    let patches = diff(&new, &old);
    assert_eq!(patches.len(), 1);
    match &patches[0].kind {
        PatchKind::Append { from, children } => {
            assert_eq!(*from, 1);
            assert_eq!(children.len(), 2);
        }
        other => panic!("unexpected patch {other:?}"),
    }
}

#[test]
fn facts_patch_precedes_child_patches() {
    let old = VNode::element("div", vec![Fact::attribute("id", "a")], vec![text("x")]);
    let new = VNode::element("div", vec![Fact::attribute("id", "b")], vec![text("y")]);
    let patches = diff(&old, &new);
    assert_eq!(indices(&patches), vec![0, 1]);
    assert!(matches!(patches[0].kind, PatchKind::Facts(_)));
}

#[test]
fn element_against_keyed_is_compared_as_plain_children() {
    let old = VNode::element("ul", vec![], vec![text("a"), text("b")]);
    let new = VNode::keyed(
        "ul",
        vec![],
        vec![("a".to_owned(), text("a")), ("b".to_owned(), text("B"))],
    );
    let patches = diff(&old, &new);
    assert_eq!(indices(&patches), vec![2]);
    assert!(matches!(patches[0].kind, PatchKind::Text(_)));

    let patches = diff(&new, &old);
    assert!(matches!(patches[0].kind, PatchKind::Redraw(_)));
}

#[test]
fn mapped_children_are_offset_by_mapper_layers() {
    let keep: Mapper<Msg> = Rc::new(|m: Msg| m + 1);
    let old = div(vec![
        text("a").map(Rc::clone(&keep)).map(Rc::clone(&keep)),
        text("b"),
    ]);
    let new = div(vec![
        text("A").map(Rc::clone(&keep)).map(Rc::clone(&keep)),
        text("B"),
    ]);
    let patches = diff(&old, &new);
    assert_eq!(indices(&patches), vec![3, 4]);
}

#[test]
fn changed_mappers_emit_one_patch() {
    let old = text("a").map(Rc::new(|m: Msg| m + 1));
    let new = text("a").map(Rc::new(|m: Msg| m + 2));
    let patches = diff(&old, &new);
    assert_eq!(patches.len(), 1);
    assert!(matches!(&patches[0].kind, PatchKind::Mappers(chain) if chain.len() == 1));

    let deeper = text("a").map(Rc::new(|m: Msg| m)).map(Rc::new(|m: Msg| m));
    assert!(matches!(diff(&old, &deeper)[0].kind, PatchKind::Redraw(_)));
}

fn counter_view(count: &u32) -> VNode<Msg> {
    div(vec![VNode::text(count.to_string())])
}

#[test]
fn equal_cache_identity_reuses_previous_result() {
    let old = VNode::lazy(counter_view, 1);
    let new = VNode::lazy(counter_view, 1);
    assert!(diff(&old, &new).is_empty());

    let (VNodeKind::Cached(a), VNodeKind::Cached(b)) = (old.kind(), new.kind()) else {
        panic!("expected cached nodes");
    };
    assert!(a.force().ptr_eq(b.force()));
}

#[test]
fn changed_cache_identity_nests_patches_from_zero() {
    let old = div(vec![text("x"), VNode::lazy(counter_view, 1)]);
    let new = div(vec![text("x"), VNode::lazy(counter_view, 2)]);
    let patches = diff(&old, &new);
    assert_eq!(indices(&patches), vec![2]);
    match &patches[0].kind {
        PatchKind::Cached(nested) => {
            assert_eq!(indices(nested), vec![1]);
            assert!(matches!(&nested[0].kind, PatchKind::Text(t) if t == "2"));
        }
        other => panic!("unexpected patch {other:?}"),
    }
}

#[test]
fn changed_handler_produces_facts_patch() {
    let old = VNode::element(
        "button",
        vec![Fact::on("click", Handler::Normal(decode::succeed(1)))],
        vec![],
    );
    let new = VNode::element(
        "button",
        vec![Fact::on("click", Handler::Normal(decode::succeed(2)))],
        vec![],
    );
    let patches = diff(&old, &new);
    assert!(matches!(&patches[0].kind, PatchKind::Facts(f) if f.events.len() == 1));
}
