use super::*;
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
enum Msg {
    Clicked,
    Typed(String),
    Wrapped(Box<Msg>),
    Tagged(&'static str, Box<Msg>),
}

fn recording_dispatcher() -> (Dispatcher<Msg>, Rc<RefCell<Vec<(Msg, bool)>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let dispatcher: Dispatcher<Msg> =
        Rc::new(move |msg: Msg, sync: bool| sink.borrow_mut().push((msg, sync)));
    (dispatcher, log)
}

fn tag(label: &'static str) -> Mapper<Msg> {
    Rc::new(move |msg: Msg| Msg::Tagged(label, Box::new(msg)))
}

#[test]
fn decoders_follow_paths_into_payload() {
    let payload = json!({ "target": { "value": "abc", "checked": true } });
    assert_eq!(decode::target_value()(&payload), Ok("abc".to_owned()));
    assert_eq!(decode::target_checked()(&payload), Ok(true));
    assert_eq!(
        decode::field("missing", decode::string())(&payload),
        Err(DecodeError::MissingField("missing".to_owned()))
    );
    assert_eq!(
        decode::at(&["target", "checked"], decode::string())(&payload),
        Err(DecodeError::Expected {
            expected: "a string",
            found: "boolean true".to_owned()
        })
    );
    assert_eq!(decode::float()(&json!(2.5)), Ok(2.5));
    assert!(decode::fail::<u8>("nope")(&payload).is_err());
}

#[test]
fn handler_kinds_decode_their_flags() {
    let payload = json!({ "target": { "value": "x" } });
    let stop = Handler::MayStopPropagation(decode::map(decode::target_value(), |v| {
        (Msg::Typed(v), true)
    }));
    let decoded = stop.decode(&payload).expect("decodes");
    assert_eq!(decoded.message, Msg::Typed("x".to_owned()));
    assert!(decoded.stop_propagation);
    assert!(!decoded.prevent_default);

    let custom = Handler::Custom(Rc::new(|_: &Value| {
        Ok(CustomResponse {
            message: Msg::Clicked,
            stop_propagation: false,
            prevent_default: true,
        })
    }));
    let decoded = custom.decode(&payload).expect("decodes");
    assert!(decoded.prevent_default);
    assert!(!custom.is_passive());
    assert!(stop.is_passive());
}

#[test]
fn same_requires_identical_decoder() {
    let decoder = decode::succeed(Msg::Clicked);
    let a = Handler::Normal(Rc::clone(&decoder));
    let b = Handler::Normal(decoder);
    let c = Handler::Normal(decode::succeed(Msg::Clicked));
    assert!(a.same(&b));
    assert!(!a.same(&c));
    assert_eq!(a.kind(), HandlerKind::Normal);
}

#[test]
fn mapped_handler_wraps_message() {
    let handler = Handler::Normal(decode::succeed(Msg::Clicked))
        .map(Rc::new(|msg: Msg| Msg::Wrapped(Box::new(msg))));
    let decoded = handler.decode(&json!(null)).expect("decodes");
    assert_eq!(decoded.message, Msg::Wrapped(Box::new(Msg::Clicked)));
}

#[test]
fn dispatch_applies_innermost_mapper_first() {
    let (dispatcher, log) = recording_dispatcher();
    let root = EventContext::root(dispatcher);
    let outer = EventContext::mapped(vec![tag("outer")], Rc::clone(&root));
    let inner = EventContext::mapped(vec![tag("a"), tag("b")], Rc::clone(&outer));

    inner.dispatch(Msg::Clicked, false);

    let expected = Msg::Tagged(
        "outer",
        Box::new(Msg::Tagged(
            "a",
            Box::new(Msg::Tagged("b", Box::new(Msg::Clicked))),
        )),
    );
    assert_eq!(*log.borrow(), vec![(expected, false)]);
}

#[test]
fn replaced_mappers_apply_to_later_dispatches() {
    let (dispatcher, log) = recording_dispatcher();
    let root = EventContext::root(dispatcher);
    let mapped = EventContext::mapped(vec![tag("old")], Rc::clone(&root));
    mapped.replace_mappers(vec![tag("new")]);
    mapped.dispatch(Msg::Clicked, true);
    assert_eq!(
        *log.borrow(),
        vec![(Msg::Tagged("new", Box::new(Msg::Clicked)), true)]
    );
}

#[test]
fn listener_reads_current_slot_and_drops_bad_payloads() {
    let (dispatcher, log) = recording_dispatcher();
    let root = EventContext::root(dispatcher);
    let slot: HandlerSlot<Msg> = Rc::new(RefCell::new(Handler::MayStopPropagation(
        decode::map(decode::target_value(), |v| (Msg::Typed(v), true)),
    )));
    let listener = make_listener(root, Rc::clone(&slot));

    let response = listener(&json!({ "target": { "value": "hi" } }));
    assert!(response.stop_propagation);

    let response = listener(&json!({ "target": 3 }));
    assert_eq!(response, ListenerResponse::default());

    *slot.borrow_mut() = Handler::Normal(decode::succeed(Msg::Clicked));
    listener(&json!({}));

    assert_eq!(
        *log.borrow(),
        vec![(Msg::Typed("hi".to_owned()), true), (Msg::Clicked, false)]
    );
}

#[test]
fn swapped_dispatcher_receives_later_events() {
    let (first, first_log) = recording_dispatcher();
    let (second, second_log) = recording_dispatcher();
    let root = EventContext::root(first);
    root.dispatch(Msg::Clicked, false);
    root.set_dispatcher(second);
    root.dispatch(Msg::Clicked, false);
    assert_eq!(first_log.borrow().len(), 1);
    assert_eq!(second_log.borrow().len(), 1);
}
