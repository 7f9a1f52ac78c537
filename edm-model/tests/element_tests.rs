use edm_model::education::{activity, activity_type, course, enrolment, grade, user};
use edm_model::{Element, ModelError, Value};
use edm_types::{ElementId, ElementKey, StoreId};
use pretty_assertions::assert_eq;

fn key(store: StoreId, id: u64) -> ElementKey {
    ElementKey::new(store, ElementId::new(id))
}

fn course_in(store: StoreId) -> Element {
    let mut c = Element::new(course::definition(), store);
    c.set(course::COURSE_NAME, "Databases").unwrap();
    c.set(course::SEMESTER, "fall").unwrap();
    c.set(course::YEAR, 2024).unwrap();
    c
}

// ── Identity ─────────────────────────────────────────────────────

#[test]
fn new_element_is_draft() {
    let e = Element::new(course::definition(), StoreId::new());
    assert!(e.is_draft());
    assert_eq!(e.key(), None);
    assert_eq!(e.to_string(), "course(draft)");
}

#[test]
fn with_key_has_identity() {
    let store = StoreId::new();
    let e = Element::with_key(course::definition(), key(store, 4));
    assert_eq!(e.key(), Some(key(store, 4)));
    assert_eq!(e.to_string(), format!("course({store}/4)"));
}

#[test]
fn set_id_assigns_key() {
    let store = StoreId::new();
    let mut e = Element::new(course::definition(), store);
    e.set_id(ElementId::new(9));
    assert_eq!(e.key(), Some(key(store, 9)));
}

// ── Values ───────────────────────────────────────────────────────

#[test]
fn typed_getters() {
    let c = course_in(StoreId::new());
    assert_eq!(c.text(course::COURSE_NAME), Some("Databases"));
    assert_eq!(c.integer(course::YEAR), Some(2024));
    assert_eq!(c.boolean(course::YEAR), None);
    assert_eq!(c.get("missing"), None);
}

#[test]
fn set_unknown_property_fails() {
    let mut c = course_in(StoreId::new());
    assert!(matches!(c.set("colour", "red"), Err(ModelError::UnknownProperty { .. })));
}

#[test]
fn set_out_of_range_leaves_value_untouched() {
    let mut c = course_in(StoreId::new());
    assert!(c.set(course::YEAR, 1200).is_err());
    assert_eq!(c.integer(course::YEAR), Some(2024));
}

#[test]
fn foreign_reference_rejected() {
    let mut a = Element::new(activity::definition(), StoreId::new());
    let err = a.set(activity::COURSE, key(StoreId::new(), 1)).unwrap_err();
    assert_eq!(
        err,
        ModelError::ForeignReference {
            element: "activity",
            property: "course",
        }
    );
}

#[test]
fn multi_valued_set_drops_duplicates() {
    let store = StoreId::new();
    let mut c = course_in(store);
    c.set(course::ACTIVITIES, vec![key(store, 2), key(store, 1), key(store, 2)])
        .unwrap();
    assert_eq!(c.references(course::ACTIVITIES), &[key(store, 2), key(store, 1)]);
}

#[test]
fn add_reference_appends_once() {
    let store = StoreId::new();
    let mut c = course_in(store);
    c.add_reference(course::ACTIVITIES, key(store, 1)).unwrap();
    c.add_reference(course::ACTIVITIES, key(store, 1)).unwrap();
    c.add_reference(course::ACTIVITIES, key(store, 3)).unwrap();
    assert_eq!(c.references(course::ACTIVITIES), &[key(store, 1), key(store, 3)]);
}

#[test]
fn add_reference_on_single_valued_fails() {
    let store = StoreId::new();
    let mut a = Element::new(activity::definition(), store);
    assert!(a.add_reference(activity::COURSE, key(store, 1)).is_err());
}

#[test]
fn unset_returns_previous_value() {
    let mut c = course_in(StoreId::new());
    assert_eq!(c.unset(course::SEMESTER).unwrap(), Some(Value::from("fall")));
    assert_eq!(c.unset(course::SEMESTER).unwrap(), None);
    assert_eq!(c.missing_required(), vec![course::SEMESTER]);
}

#[test]
fn values_serialize_with_type_tag() {
    assert_eq!(
        serde_json::to_value(Value::Integer(5)).unwrap(),
        serde_json::json!({ "type": "integer", "value": 5 })
    );
    assert_eq!(
        serde_json::to_value(Value::from("fall")).unwrap(),
        serde_json::json!({ "type": "text", "value": "fall" })
    );

    let store = StoreId::new();
    let values = vec![
        Value::from("Databases"),
        Value::Integer(-3),
        Value::Decimal(2.5),
        Value::Bool(true),
        Value::Ref(key(store, 7)),
        Value::Refs(vec![key(store, 1), key(store, 2)]),
    ];
    let json = serde_json::to_string(&values).unwrap();
    let back: Vec<Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, values);
}

// ── Graph ────────────────────────────────────────────────────────

#[test]
fn associations_and_dependencies() {
    let store = StoreId::new();
    let mut u = Element::new(user::definition(), store);
    u.set(user::USERNAME, "ada").unwrap();
    u.set(user::ENROLMENTS, vec![key(store, 5)]).unwrap();
    assert_eq!(u.associations(), vec![key(store, 5)]);
    assert!(u.dependencies().is_empty());

    let mut g = Element::new(grade::definition(), store);
    g.set(grade::ACTIVITY, key(store, 1)).unwrap();
    g.set(grade::ENROLMENT, key(store, 2)).unwrap();
    assert_eq!(g.dependencies(), vec![key(store, 1), key(store, 2)]);
    assert_eq!(g.associations(), g.dependencies());
}

#[test]
fn changed_properties_lists_differences() {
    let store = StoreId::new();
    let mut a = Element::new(enrolment::definition(), store);
    a.set(enrolment::USER_NAME, "ada").unwrap();
    a.set(enrolment::FINAL_GRADE, 70).unwrap();
    let mut b = a.clone();
    assert!(a.changed_properties(&b).is_empty());
    b.set(enrolment::FINAL_GRADE, 85).unwrap();
    b.set(enrolment::USABLE, false).unwrap();
    assert_eq!(a.changed_properties(&b), vec![enrolment::FINAL_GRADE, enrolment::USABLE]);
}

#[test]
fn sort_key_follows_rank_then_name() {
    let store = StoreId::new();
    let t = Element::with_key(activity_type::definition(), key(store, 9));
    let c = Element::with_key(course::definition(), key(store, 1));
    let g = Element::with_key(grade::definition(), key(store, 0));
    let mut all = vec![g.sort_key(), c.sort_key(), t.sort_key()];
    all.sort();
    assert_eq!(all, vec![t.sort_key(), c.sort_key(), g.sort_key()]);
}
