//! End-to-end binding scenarios over instrumented fake host objects.

use std::cell::RefCell;
use std::rc::Rc;

use pathbind_core::testkit::{
    TestDictionary, TestElement, TestList, TestObject, ValidatingObject, object,
};
use pathbind_core::value::{ErrorKind, Value};
use pathbind_core::{Keyed, NameScope, ValueCell};
use pathbind_runtime::{
    BindingBuilder, Converted, PathSegment, TargetShape, ValueConverter,
};

/// Collect every published value.
fn collect() -> (Rc<RefCell<Vec<Value>>>, impl Fn(&Value) + 'static) {
    let seen: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |value: &Value| {
        sink.borrow_mut().push(value.clone())
    })
}

fn person_with_pet(name: &str) -> (Rc<TestObject>, Rc<TestObject>) {
    let pet = TestObject::new("Dog");
    pet.insert("Name", name);
    let person = TestObject::new("Person");
    person.insert("Pet", Value::object(&pet));
    (person, pet)
}

#[test]
fn pet_name_publishes_immediately_and_on_host_mutation() {
    let (person, pet) = person_with_pet("Fido");
    let session = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::from("Fido")]);

    pet.set("Name", "Rover");
    assert_eq!(
        *seen.borrow(),
        vec![Value::from("Fido"), Value::from("Rover")]
    );
}

#[test]
fn replacing_an_intermediate_object_reresolves_the_suffix() {
    let (person, _pet) = person_with_pet("Fido");
    let session = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);

    let new_pet = TestObject::new("Cat");
    new_pet.insert("Name", "Whiskers");
    person.set("Pet", Value::object(&new_pet));

    assert_eq!(
        *seen.borrow(),
        vec![Value::from("Fido"), Value::from("Whiskers")]
    );
}

#[test]
fn broken_chain_publishes_fallback_once_and_rejects_writes() {
    let (person, pet) = person_with_pet("Fido");
    let session = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .fallback("no pet")
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);

    person.set("Pet", Value::Null);
    assert_eq!(
        *seen.borrow(),
        vec![Value::from("Fido"), Value::from("no pet")],
        "exactly one publish for the whole broken-chain cascade"
    );

    assert!(!session.set_value("X"), "no write through a broken chain");
    assert_eq!(pet.get("Name"), Some(Value::from("Fido")));
}

#[test]
fn broken_chain_without_fallback_publishes_null() {
    let (person, _pet) = person_with_pet("Fido");
    let session = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);

    person.set("Pet", Value::Null);
    assert_eq!(*seen.borrow(), vec![Value::from("Fido"), Value::Null]);
}

#[test]
fn deep_break_cascades_to_exactly_one_publish() {
    // a.B.C.D with the break applied at the root's own property.
    let d = TestObject::new("D");
    d.insert("Leaf", 1);
    let c = TestObject::new("C");
    c.insert("D", Value::object(&d));
    let b = TestObject::new("B");
    b.insert("C", Value::object(&c));
    let a = TestObject::new("A");
    a.insert("B", Value::object(&b));

    let session = BindingBuilder::for_root(Value::object(&a))
        .path([
            PathSegment::property("B"),
            PathSegment::property("C"),
            PathSegment::property("D"),
            PathSegment::property("Leaf"),
        ])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(seen.borrow().len(), 1);

    a.set("B", Value::Null);
    assert_eq!(
        seen.borrow().len(),
        2,
        "one publish per upstream change, not one per node"
    );
    assert_eq!(seen.borrow()[1], Value::Null);
}

#[test]
fn write_round_trip() {
    let (person, pet) = person_with_pet("Fido");
    let session = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);

    assert!(session.set_value("Rover"));
    assert_eq!(pet.get("Name"), Some(Value::from("Rover")));

    // The host's own change notification re-resolves the chain.
    assert_eq!(
        *seen.borrow(),
        vec![Value::from("Fido"), Value::from("Rover")]
    );
}

#[test]
fn negation_scenarios() {
    let model = TestObject::new("Model");
    model.insert("Flag", true);

    let session = BindingBuilder::for_root(Value::object(&model))
        .path([PathSegment::property("Flag"), PathSegment::Not])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::Bool(false)]);

    model.set("Flag", Value::Null);
    assert_eq!(
        seen.borrow()[1],
        Value::Null,
        "null input publishes null when no fallback is configured"
    );

    model.set("Flag", "not-a-bool");
    match &seen.borrow()[2] {
        Value::Error(e) => assert_eq!(e.kind(), ErrorKind::Conversion),
        other => panic!("expected a conversion error, got {other:?}"),
    }
}

#[test]
fn negation_with_fallback_substitutes_for_null_input() {
    let model = TestObject::new("Model");
    model.insert("Flag", Value::Null);

    let session = BindingBuilder::for_root(Value::object(&model))
        .path([PathSegment::property("Flag"), PathSegment::Not])
        .fallback("unknown")
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::from("unknown")]);
}

#[test]
fn short_list_indexing_publishes_an_error_value() {
    let list = TestList::new(vec![Value::Int(10), Value::Int(20)]);
    let model = TestObject::new("Model");
    model.insert("Items", Value::object(&list));

    let session = BindingBuilder::for_root(Value::object(&model))
        .path([PathSegment::property("Items"), PathSegment::index(2)])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);

    match &seen.borrow()[0] {
        Value::Error(e) => assert_eq!(e.kind(), ErrorKind::Resolution),
        other => panic!("expected an error value, got {other:?}"),
    }
}

#[test]
fn list_growth_resolves_a_previous_index_error() {
    let list = TestList::new(vec![Value::Int(10)]);
    let session = BindingBuilder::for_root(Value::object(&list))
        .path([PathSegment::index(1)])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert!(seen.borrow()[0].is_error());

    // An upstream fix re-resolves normally: swap in a longer list.
    let longer = TestList::new(vec![Value::Int(10), Value::Int(20)]);
    let holder = TestObject::new("Holder");
    holder.insert("Items", Value::object(&longer));
    drop(session);

    let session = BindingBuilder::for_root(Value::object(&holder))
        .path([PathSegment::property("Items"), PathSegment::index(1)])
        .finish();
    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(seen.borrow()[0], Value::Int(20));
}

#[test]
fn dictionary_entries_bind_like_properties() {
    let dict = TestDictionary::new();
    dict.set_key("Name", Value::from("Frank")).expect("insert");

    let session = BindingBuilder::for_root(Value::object(&dict))
        .path([PathSegment::property("Name")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::from("Frank")]);

    dict.set_key("Name", Value::from("Kups")).expect("write");
    assert_eq!(seen.borrow()[1], Value::from("Kups"));
}

#[test]
fn stream_root_feeds_the_chain() {
    let (person, pet) = person_with_pet("Fido");
    let cell = ValueCell::new(Value::object(&person));

    let session = BindingBuilder::for_stream(&cell)
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::from("Fido")]);

    let (other_person, _other_pet) = person_with_pet("Rex");
    cell.set(Value::object(&other_person));
    assert_eq!(seen.borrow()[1], Value::from("Rex"));

    // Pushing null through the root must update the leaf node too, so a
    // later write cannot touch the previously bound object.
    cell.set(Value::Null);
    assert_eq!(seen.borrow()[2], Value::Null);
    assert!(!session.set_value("Rover"));
    assert_eq!(pet.get("Name"), Some(Value::from("Fido")));
}

#[test]
fn empty_chain_on_stream_root_publishes_each_value_converted() {
    let cell = ValueCell::new(Value::Int(1));
    let session = BindingBuilder::for_stream(&cell)
        .target(TargetShape::Text)
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    cell.set(Value::Int(2));

    assert_eq!(*seen.borrow(), vec![Value::from("1"), Value::from("2")]);
}

#[test]
fn converter_runs_and_can_suppress() {
    struct Doubler;
    impl ValueConverter for Doubler {
        fn convert(
            &self,
            value: &Value,
            _target: TargetShape,
            _parameter: Option<&Value>,
        ) -> Converted {
            match value {
                Value::Int(i) if *i < 0 => Converted::Suppress,
                Value::Int(i) => Converted::Value(Value::Int(i * 2)),
                other => Converted::Value(other.clone()),
            }
        }
    }

    let model = TestObject::new("Model");
    model.insert("N", 5);
    let session = BindingBuilder::for_root(Value::object(&model))
        .path([PathSegment::property("N")])
        .converter(Rc::new(Doubler))
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::Int(10)]);

    model.set("N", -3);
    assert_eq!(seen.borrow().len(), 1, "suppressed publish is skipped entirely");

    model.set("N", 7);
    assert_eq!(seen.borrow()[1], Value::Int(14));
}

#[test]
fn string_format_applies_to_text_targets() {
    let model = TestObject::new("Model");
    model.insert("Count", 3);
    let session = BindingBuilder::for_root(Value::object(&model))
        .path([PathSegment::property("Count")])
        .target(TargetShape::Text)
        .format("{} items")
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::from("3 items")]);
}

#[test]
fn target_coercion_failure_publishes_a_conversion_error() {
    let model = TestObject::new("Model");
    model.insert("Count", "many");
    let session = BindingBuilder::for_root(Value::object(&model))
        .path([PathSegment::property("Count")])
        .target(TargetShape::Integer)
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    match &seen.borrow()[0] {
        Value::Error(e) => assert_eq!(e.kind(), ErrorKind::Conversion),
        other => panic!("expected a conversion error, got {other:?}"),
    }
}

#[test]
fn transform_segment_composes_with_properties() {
    let model = TestObject::new("Model");
    model.insert("N", 4);
    let session = BindingBuilder::for_root(Value::object(&model))
        .path([
            PathSegment::property("N"),
            PathSegment::Transform(Rc::new(|v: &Value| match v {
                Value::Int(i) => Value::Int(i * i),
                other => other.clone(),
            })),
        ])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::Int(16)]);

    model.set("N", 5);
    assert_eq!(seen.borrow()[1], Value::Int(25));
}

#[test]
fn data_context_binding_follows_context_changes() {
    let element = TestElement::new("Widget");
    let model = TestObject::new("Model");
    model.insert("Title", "first");
    element.set_data_context(Value::object(&model));

    let session = BindingBuilder::for_root(Value::object(&element))
        .path([PathSegment::DataContext, PathSegment::property("Title")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::from("first")]);

    let other = TestObject::new("Model");
    other.insert("Title", "second");
    element.set_data_context(Value::object(&other));
    assert_eq!(seen.borrow()[1], Value::from("second"));
}

#[test]
fn ancestor_binding_tracks_reparenting() {
    let window = TestElement::new("Window");
    window.insert("Title", "main");
    let panel = TestElement::new("Panel");
    let button = TestElement::new("Button");
    panel.set_parent(Some(&object(&window)));
    button.set_parent(Some(&object(&panel)));

    let session = BindingBuilder::for_root(Value::object(&button))
        .path([
            PathSegment::Ancestor {
                type_name: Some("Window".into()),
                level: 0,
            },
            PathSegment::property("Title"),
        ])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::from("main")]);

    let other_window = TestElement::new("Window");
    other_window.insert("Title", "detached");
    panel.set_parent(Some(&object(&other_window)));
    assert_eq!(seen.borrow()[1], Value::from("detached"));
}

#[test]
fn named_element_binding_follows_registry_changes() {
    let scope = NameScope::new();
    let host = TestObject::new("Host");

    let session = BindingBuilder::for_root(Value::object(&host))
        .name_scope(&scope)
        .path([PathSegment::Named("status".into()), PathSegment::property("Text")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::Null]);

    let label = TestObject::new("Label");
    label.insert("Text", "ready");
    scope.register("status", &object(&label));
    assert_eq!(seen.borrow()[1], Value::from("ready"));
}

#[test]
fn write_fault_surfaces_as_validation_error_when_enabled() {
    let model = TestObject::new("Model");
    model.insert("Id", 1);
    model.mark_read_only("Id");

    let session = BindingBuilder::for_root(Value::object(&model))
        .path([PathSegment::property("Id")])
        .validate(true)
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(seen.borrow().len(), 1);

    assert!(!session.set_value(Value::Int(2)));
    match &seen.borrow()[1] {
        Value::Error(e) => assert_eq!(e.kind(), ErrorKind::Validation),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn write_fault_is_swallowed_without_validation() {
    let model = TestObject::new("Model");
    model.insert("Id", 1);
    model.mark_read_only("Id");

    let session = BindingBuilder::for_root(Value::object(&model))
        .path([PathSegment::property("Id")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);

    assert!(!session.set_value(Value::Int(2)));
    assert_eq!(seen.borrow().len(), 1, "no validation echo when disabled");
}

#[test]
fn host_validation_errors_reach_the_subscriber() {
    let form = ValidatingObject::new("Form");
    form.insert("Age", 30);

    let session = BindingBuilder::for_root(Value::object(&form))
        .path([PathSegment::property("Age")])
        .validate(true)
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![Value::Int(30)]);

    form.set_errors("Age", vec!["too old".into()]);
    match &seen.borrow()[1] {
        Value::Error(e) => {
            assert_eq!(e.kind(), ErrorKind::Validation);
            assert_eq!(e.message(), "too old");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn stopping_releases_every_observation_hook() {
    let (person, pet) = person_with_pet("Fido");
    let session = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();

    let handle = session.subscribe(|_| {});
    assert_eq!(person.live_property_subscriptions(), 1);
    assert_eq!(pet.live_property_subscriptions(), 1);

    handle.stop();
    assert_eq!(person.live_property_subscriptions(), 0);
    assert_eq!(pet.live_property_subscriptions(), 0);
}

#[test]
fn dropping_the_handle_stops_the_session() {
    let (person, pet) = person_with_pet("Fido");
    let session = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();

    {
        let _handle = session.subscribe(|_| {});
        assert_eq!(pet.live_property_subscriptions(), 1);
    }
    assert!(session.is_stopped());
    assert_eq!(person.live_property_subscriptions(), 0);
    assert_eq!(pet.live_property_subscriptions(), 0);
}

#[test]
fn validation_observer_detaches_on_stop() {
    let form = ValidatingObject::new("Form");
    form.insert("Age", 30);

    let session = BindingBuilder::for_root(Value::object(&form))
        .path([PathSegment::property("Age")])
        .validate(true)
        .finish();

    let handle = session.subscribe(|_| {});
    assert_eq!(form.live_error_subscriptions(), 1);

    handle.stop();
    assert_eq!(form.live_error_subscriptions(), 0);
    assert_eq!(form.live_property_subscriptions(), 0);
}

#[test]
fn independent_sessions_do_not_disturb_each_other() {
    let (person, pet) = person_with_pet("Fido");

    let first = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();
    let second = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();

    let (seen_first, observer_first) = collect();
    let (seen_second, observer_second) = collect();
    let first_handle = first.subscribe(observer_first);
    let _second_handle = second.subscribe(observer_second);
    assert_eq!(pet.live_property_subscriptions(), 2);

    first_handle.stop();
    assert_eq!(pet.live_property_subscriptions(), 1);

    pet.set("Name", "Rover");
    assert_eq!(seen_first.borrow().len(), 1, "stopped session sees nothing");
    assert_eq!(seen_second.borrow()[1], Value::from("Rover"));
}

#[test]
fn equal_value_mutations_do_not_republish() {
    let (person, pet) = person_with_pet("Fido");
    let session = BindingBuilder::for_root(Value::object(&person))
        .path([PathSegment::property("Pet"), PathSegment::property("Name")])
        .finish();

    let (seen, observer) = collect();
    let _handle = session.subscribe(observer);

    pet.set("Name", "Fido");
    assert_eq!(seen.borrow().len(), 1, "unchanged value is coalesced");
}
