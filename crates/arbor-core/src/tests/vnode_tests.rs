use super::*;
use std::cell::Cell;

type Msg = ();

fn leaf(text: &str) -> VNode<Msg> {
    VNode::text(text)
}

fn view_count(count: &u32) -> VNode<Msg> {
    VNode::text(count.to_string())
}

fn view_pair(label: &String, count: &u32) -> VNode<Msg> {
    VNode::text(format!("{label}: {count}"))
}

#[test]
fn descendant_counts_cover_whole_subtree() {
    let inner = VNode::element("span", vec![], vec![leaf("a"), leaf("b")]);
    let outer = VNode::element("div", vec![], vec![inner, leaf("c")]);
    assert_eq!(outer.descendants(), 4);

    let keyed = VNode::keyed(
        "ul",
        vec![],
        vec![
            ("x".to_owned(), VNode::element("li", vec![], vec![leaf("1")])),
            ("y".to_owned(), leaf("2")),
        ],
    );
    assert_eq!(keyed.descendants(), 3);
}

#[test]
fn mapped_and_cached_counts() {
    let mapped = VNode::element("p", vec![], vec![leaf("a")]).map(Rc::new(|m: Msg| m));
    assert_eq!(mapped.descendants(), 2);
    let twice = mapped.clone().map(Rc::new(|m: Msg| m));
    assert_eq!(twice.descendants(), 3);

    let cached = VNode::cached(vec![], || VNode::element("p", vec![], vec![leaf("a")]));
    assert_eq!(cached.descendants(), 0);
    let parent = VNode::element("div", vec![], vec![cached, mapped]);
    assert_eq!(parent.descendants(), 1 + 3);
}

#[test]
fn script_tags_are_renamed() {
    let node: VNode<Msg> = VNode::element("script", vec![], vec![]);
    match node.kind() {
        VNodeKind::Element(element) => assert_eq!(element.tag, "p"),
        _ => panic!("expected element"),
    }
}

#[test]
fn clones_share_identity() {
    let node = leaf("a");
    assert!(node.ptr_eq(&node.clone()));
    assert!(!node.ptr_eq(&leaf("a")));
}

#[test]
fn cached_thunk_runs_once() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let node: VNode<Msg> = VNode::cached(vec![Rc::new(1u8)], move || {
        counter.set(counter.get() + 1);
        VNode::text("body")
    });
    let VNodeKind::Cached(cached) = node.kind() else {
        panic!("expected cached node");
    };
    assert!(!cached.is_forced());
    let first = cached.force().clone();
    let second = cached.force().clone();
    assert!(first.ptr_eq(&second));
    assert_eq!(calls.get(), 1);
}

#[test]
fn lazy_identity_compares_view_and_arguments() {
    let identity = |node: &VNode<Msg>| match node.kind() {
        VNodeKind::Cached(cached) => cached.identity.len(),
        _ => 0,
    };
    let a = VNode::lazy(view_count, 3);
    let b = VNode::lazy(view_count, 3);
    let c = VNode::lazy(view_count, 4);
    let d = VNode::lazy2(view_pair, "n".to_owned(), 3);
    assert_eq!(identity(&a), 2);
    assert_eq!(identity(&d), 3);

    let (VNodeKind::Cached(a), VNodeKind::Cached(b), VNodeKind::Cached(c), VNodeKind::Cached(d)) =
        (a.kind(), b.kind(), c.kind(), d.kind())
    else {
        panic!("expected cached nodes");
    };
    assert!(a.same_identity(b));
    assert!(!a.same_identity(c));
    assert!(!a.same_identity(d));
}

#[test]
fn cache_args_compare_by_type_and_value() {
    let one: Rc<dyn CacheArg> = Rc::new(1u32);
    let also_one: Rc<dyn CacheArg> = Rc::new(1u32);
    let other_type: Rc<dyn CacheArg> = Rc::new(1u64);
    assert!(one.same_as(&*also_one));
    assert!(!one.same_as(&*other_type));
}

#[test]
fn widget_patch_downcasts_to_its_payload() {
    let patch = WidgetPatch::new(7u16);
    assert_eq!(patch.downcast::<u16>(), Some(7));
    assert!(WidgetPatch::new("x").downcast::<u16>().is_none());
}
