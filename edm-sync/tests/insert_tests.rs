use edm_model::education::{activity, activity_source, activity_type, course};
use edm_model::{Definition, Element, ErrorKind, Property};
use edm_storage::{MemStore, Store, Transaction, TranslationTable};
use edm_sync::{InsertProcessor, SyncError};
use pretty_assertions::assert_eq;
use std::sync::LazyLock;

fn open() -> MemStore {
    let mut store = MemStore::new();
    store.begin().unwrap();
    store
}

fn insert(store: &mut MemStore, mut e: Element) -> Element {
    e.set_id(store.generate_id(None).unwrap());
    store.insert(e).unwrap()
}

struct Catalogue {
    moodle: Element,
    quiz: Element,
    cs101: Element,
    first: Element,
}

/// A course whose activity list points back at its only activity.
fn catalogue(store: &mut MemStore) -> Catalogue {
    let mut moodle = Element::new(activity_source::definition(), store.id());
    moodle.set(activity_source::SOURCE_NAME, "moodle").unwrap();
    let moodle = insert(store, moodle);

    let mut quiz = Element::new(activity_type::definition(), store.id());
    quiz.set(activity_type::TYPE_NAME, "quiz").unwrap();
    quiz.set(activity_type::SOURCE, moodle.key().unwrap()).unwrap();
    let quiz = insert(store, quiz);

    let mut cs101 = Element::new(course::definition(), store.id());
    cs101.set(course::COURSE_NAME, "CS101").unwrap();
    cs101.set(course::SEMESTER, "S1").unwrap();
    cs101.set(course::YEAR, 2024).unwrap();
    let cs101 = insert(store, cs101);

    let mut first = Element::new(activity::definition(), store.id());
    first.set(activity::COURSE, cs101.key().unwrap()).unwrap();
    first.set(activity::ACTIVITY_TYPE, quiz.key().unwrap()).unwrap();
    first.set(activity::ACTIVITY_NAME, "quiz 1").unwrap();
    let first = insert(store, first);

    store
        .attach(cs101.key().unwrap(), course::ACTIVITIES, first.key().unwrap())
        .unwrap();
    let cs101 = store.get(cs101.key().unwrap()).unwrap().unwrap();
    Catalogue {
        moodle,
        quiz,
        cs101,
        first,
    }
}

// ── Dependencies ─────────────────────────────────────────────────

#[test]
fn builds_dependencies_first() {
    let mut src = open();
    let cat = catalogue(&mut src);
    let mut dst = open();
    let mut table = TranslationTable::new();

    let (built, inserted) = {
        let mut processor = InsertProcessor::new(&src, &mut dst, &mut table);
        let built = processor.process_element(&cat.quiz).unwrap();
        (built, processor.report().inserted)
    };

    assert_eq!(inserted, 2);
    assert_eq!(built.store(), dst.id());
    let local_source = table.get(cat.moodle.key().unwrap(), dst.id()).unwrap();
    assert_eq!(built.reference(activity_type::SOURCE), Some(local_source));
    assert_eq!(table.get(cat.quiz.key().unwrap(), dst.id()), built.key());
    assert_eq!(dst.len(), 2);
}

#[test]
fn processed_element_is_not_rebuilt() {
    let mut src = open();
    let cat = catalogue(&mut src);
    let mut dst = open();
    let mut table = TranslationTable::new();

    let mut processor = InsertProcessor::new(&src, &mut dst, &mut table);
    let first = processor.process_element(&cat.quiz).unwrap();
    let second = processor.process_element(&cat.quiz).unwrap();
    assert_eq!(first, second);
    assert_eq!(processor.report().inserted, 2);
    assert_eq!(processor.take_built().len(), 2);
}

#[test]
fn process_elements_keeps_order() {
    let mut src = open();
    let cat = catalogue(&mut src);
    let mut dst = open();
    let mut table = TranslationTable::new();

    let mut processor = InsertProcessor::new(&src, &mut dst, &mut table);
    let built = processor.process_elements([&cat.quiz, &cat.moodle]).unwrap();
    let names: Vec<_> = built.iter().map(|e| e.type_name()).collect();
    assert_eq!(names, vec!["activity_type", "activity_source"]);
}

#[test]
fn existing_counterparts_are_adopted() {
    let mut src = open();
    let cat = catalogue(&mut src);
    let mut dst = open();
    let mut moodle = Element::new(activity_source::definition(), dst.id());
    moodle.set(activity_source::SOURCE_NAME, "moodle").unwrap();
    let existing = insert(&mut dst, moodle);
    let mut table = TranslationTable::new();

    let report = {
        let mut processor = InsertProcessor::new(&src, &mut dst, &mut table);
        processor.process_element(&cat.quiz).unwrap();
        processor.report().clone()
    };
    assert_eq!(report.adopted, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(table.get(cat.moodle.key().unwrap(), dst.id()), existing.key());
}

// ── Optional associations ────────────────────────────────────────

#[test]
fn optional_cycle_is_linked_after_both_ends_exist() {
    let mut src = open();
    let cat = catalogue(&mut src);
    let mut dst = open();
    let mut table = TranslationTable::new();

    let (course_key, queued_after) = {
        let mut processor = InsertProcessor::new(&src, &mut dst, &mut table);
        let course = processor.process_element(&cat.cs101).unwrap();
        assert_eq!(processor.queued(), 1);
        assert_eq!(processor.links().len(), 1);
        assert!(processor.links().is_waiting_for(cat.first.key().unwrap()));

        assert_eq!(processor.process_queue().unwrap(), 1);
        assert!(processor.links().is_empty());
        assert_eq!(processor.report().links_completed, 1);
        assert_eq!(processor.take_attached(), vec![course.key().unwrap()]);
        (course.key().unwrap(), processor.queued())
    };

    assert_eq!(queued_after, 0);
    let local_activity = table.get(cat.first.key().unwrap(), dst.id()).unwrap();
    let course = dst.get(course_key).unwrap().unwrap();
    assert_eq!(course.references(course::ACTIVITIES), &[local_activity]);
    assert_eq!(dst.len(), 4);
}

#[test]
fn clear_drops_queued_associations() {
    let mut src = open();
    let cat = catalogue(&mut src);
    let mut dst = open();
    let mut table = TranslationTable::new();

    let mut processor = InsertProcessor::new(&src, &mut dst, &mut table);
    processor.process_element(&cat.cs101).unwrap();
    processor.clear();
    assert_eq!(processor.queued(), 0);
    assert_eq!(processor.process_queue().unwrap(), 0);
    // the link still completes when the target is built later
    processor.process_element(&cat.first).unwrap();
    assert!(processor.links().is_empty());
}

static LEAF: LazyLock<Definition> = LazyLock::new(|| {
    Definition::builder("leaf")
        .property(Property::text("label").required())
        .selector("label", &["label"])
        .identity_key("label")
        .build()
        .unwrap()
});

static HUB: LazyLock<Definition> = LazyLock::new(|| {
    Definition::builder("hub")
        .property(Property::text("label").required())
        .property(Property::relationship("other", "leaf"))
        .property(Property::relationship("preferred", "leaf").recommended())
        .selector("label", &["label"])
        .identity_key("label")
        .build()
        .unwrap()
});

#[test]
fn recommended_targets_are_built_before_plain_optional_ones() {
    let mut src = open();
    let mut other = Element::new(&LEAF, src.id());
    other.set("label", "other").unwrap();
    let other = insert(&mut src, other);
    let mut preferred = Element::new(&LEAF, src.id());
    preferred.set("label", "preferred").unwrap();
    let preferred = insert(&mut src, preferred);
    let mut hub = Element::new(&HUB, src.id());
    hub.set("label", "hub").unwrap();
    hub.set("other", other.key().unwrap()).unwrap();
    hub.set("preferred", preferred.key().unwrap()).unwrap();
    let hub = insert(&mut src, hub);

    let mut dst = open();
    let mut table = TranslationTable::new();
    let mut processor = InsertProcessor::new(&src, &mut dst, &mut table);
    processor.process_element(&hub).unwrap();
    assert_eq!(processor.queued(), 2);
    processor.take_built();

    assert_eq!(processor.process_queue().unwrap(), 2);
    let order: Vec<_> = processor.take_built().into_iter().map(|(from, _)| from).collect();
    assert_eq!(order, vec![preferred.key().unwrap(), other.key().unwrap()]);
    assert!(processor.links().is_empty());
}

// ── Failures ─────────────────────────────────────────────────────

static NODE: LazyLock<Definition> = LazyLock::new(|| {
    Definition::builder("node")
        .property(Property::text("label").required())
        .property(Property::relationship("next", "node").mutable())
        .selector("label", &["label"])
        .identity_key("label")
        .build()
        .unwrap()
});

#[test]
fn mutable_cycle_is_reported() {
    let mut src = open();
    let mut a = Element::new(&NODE, src.id());
    a.set("label", "a").unwrap();
    let a = insert(&mut src, a);
    let mut b = Element::new(&NODE, src.id());
    b.set("label", "b").unwrap();
    b.set("next", a.key().unwrap()).unwrap();
    let b = insert(&mut src, b);
    let mut a = a;
    a.set("next", b.key().unwrap()).unwrap();
    let a = src.update(a).unwrap();

    let mut dst = open();
    let mut table = TranslationTable::new();
    let mut processor = InsertProcessor::new(&src, &mut dst, &mut table);
    let err = processor.process_element(&a).unwrap_err();
    assert_eq!(err, SyncError::DependencyCycle(a.key().unwrap()));
    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn draft_cannot_be_processed() {
    let src = open();
    let mut dst = open();
    let mut table = TranslationTable::new();
    let mut draft = Element::new(activity_source::definition(), src.id());
    draft.set(activity_source::SOURCE_NAME, "moodle").unwrap();

    let mut processor = InsertProcessor::new(&src, &mut dst, &mut table);
    let err = processor.process_element(&draft).unwrap_err();
    assert!(matches!(err, SyncError::Unidentified(_)));
}
