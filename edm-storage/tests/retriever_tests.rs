use edm_model::education::{activity_source, activity_type};
use edm_model::{Definition, Element, ErrorKind, Property};
use edm_storage::{
    MemStore, Query, QueryRetriever, Retriever, StorageError, Store, TableRetriever, Transaction, TranslationTable,
    retriever_for,
};
use pretty_assertions::assert_eq;
use std::sync::LazyLock;

fn insert(store: &mut MemStore, mut e: Element) -> Element {
    e.set_id(store.generate_id(None).unwrap());
    store.insert(e).unwrap()
}

fn source(store: &mut MemStore, name: &str) -> Element {
    let mut e = Element::new(activity_source::definition(), store.id());
    e.set(activity_source::SOURCE_NAME, name).unwrap();
    insert(store, e)
}

fn insert_type(store: &mut MemStore, name: &str, source: &Element) -> Element {
    let mut e = Element::new(activity_type::definition(), store.id());
    e.set(activity_type::TYPE_NAME, name).unwrap();
    e.set(activity_type::SOURCE, source.key().unwrap()).unwrap();
    insert(store, e)
}

fn open() -> MemStore {
    let mut store = MemStore::new();
    store.begin().unwrap();
    store
}

// ── Query ────────────────────────────────────────────────────────

#[test]
fn query_by_selector() {
    let mut store = open();
    let moodle = source(&mut store, "moodle");
    source(&mut store, "other");

    let mut query = Query::new(&store, activity_source::definition(), activity_source::KEY).unwrap();
    query.set_value(activity_source::SOURCE_NAME, "moodle").unwrap();
    assert_eq!(query.query().unwrap(), Some(moodle));
}

#[test]
fn query_with_relationship_key() {
    let mut store = open();
    let moodle = source(&mut store, "moodle");
    let quiz = insert_type(&mut store, "quiz", &moodle);
    insert_type(&mut store, "forum", &moodle);

    let mut wanted = Element::new(activity_type::definition(), store.id());
    wanted.set(activity_type::TYPE_NAME, "quiz").unwrap();
    wanted.set(activity_type::SOURCE, moodle.key().unwrap()).unwrap();

    let mut query = Query::new(&store, activity_type::definition(), activity_type::KEY).unwrap();
    query.set_all_values(&wanted).unwrap();
    assert!(query.is_complete());
    assert_eq!(query.query().unwrap(), Some(quiz));
}

#[test]
fn incomplete_query_fails() {
    let store = open();
    let query = Query::new(&store, activity_type::definition(), activity_type::KEY).unwrap();
    let err = query.query().unwrap_err();
    assert!(matches!(err, StorageError::IncompleteQuery { property: "name", .. }));
}

#[test]
fn unknown_selector_and_property_fail() {
    let store = open();
    assert!(matches!(
        Query::new(&store, activity_type::definition(), "nope"),
        Err(StorageError::UnknownSelector { .. })
    ));
    let mut query = Query::new(&store, activity_source::definition(), activity_source::KEY).unwrap();
    assert!(query.set_value("colour", "red").is_err());
    assert!(query.set_value(activity_source::SOURCE_NAME, 5).is_err());
}

static LOOSE: LazyLock<Definition> = LazyLock::new(|| {
    Definition::builder("loose")
        .property(Property::text("label"))
        .property(Property::integer("score").mutable())
        .selector("label", &["label"])
        .build()
        .unwrap()
});

#[test]
fn non_unique_query_fails() {
    let mut store = open();
    for _ in 0..2 {
        let mut e = Element::new(&LOOSE, store.id());
        e.set("label", "same").unwrap();
        insert(&mut store, e);
    }
    let mut query = Query::new(&store, &LOOSE, "label").unwrap();
    query.set_value("label", "same").unwrap();
    assert_eq!(query.query_all().unwrap().len(), 2);
    let err = query.query().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Inconsistent);
}

// ── TableRetriever ───────────────────────────────────────────────

#[test]
fn table_retriever_returns_self_in_own_store() {
    let mut store = open();
    let moodle = source(&mut store, "moodle");
    let mut table = TranslationTable::new();
    assert_eq!(TableRetriever.fetch(&store, &mut table, &moodle).unwrap(), Some(moodle));
}

#[test]
fn table_retriever_follows_translation() {
    let mut src = open();
    let mut dst = open();
    let a = source(&mut src, "moodle");
    let b = source(&mut dst, "moodle");
    let mut table = TranslationTable::new();
    assert_eq!(TableRetriever.fetch(&dst, &mut table, &a).unwrap(), None);
    table.put(a.key().unwrap(), b.key().unwrap()).unwrap();
    assert_eq!(TableRetriever.fetch(&dst, &mut table, &a).unwrap(), Some(b));
}

#[test]
fn retriever_on_closed_store_fails() {
    let mut store = open();
    let moodle = source(&mut store, "moodle");
    store.close();
    let mut table = TranslationTable::new();
    assert_eq!(TableRetriever.fetch(&store, &mut table, &moodle), Err(StorageError::Closed));
    assert_eq!(QueryRetriever.fetch(&store, &mut table, &moodle), Err(StorageError::Closed));
}

// ── QueryRetriever ───────────────────────────────────────────────

#[test]
fn query_retriever_finds_by_key() {
    let mut store = open();
    let moodle = source(&mut store, "moodle");
    let mut wanted = Element::new(activity_source::definition(), store.id());
    wanted.set(activity_source::SOURCE_NAME, "moodle").unwrap();
    let mut table = TranslationTable::new();
    assert_eq!(QueryRetriever.fetch(&store, &mut table, &wanted).unwrap(), Some(moodle));
    assert!(table.is_empty());
}

#[test]
fn query_retriever_misses_unknown() {
    let mut store = open();
    source(&mut store, "moodle");
    let mut wanted = Element::new(activity_source::definition(), store.id());
    wanted.set(activity_source::SOURCE_NAME, "canvas").unwrap();
    let mut table = TranslationTable::new();
    assert_eq!(QueryRetriever.fetch(&store, &mut table, &wanted).unwrap(), None);
}

static KEYED: LazyLock<Definition> = LazyLock::new(|| {
    Definition::builder("keyed")
        .property(Property::text("code").required())
        .property(Property::text("title"))
        .property(Property::integer("score").mutable())
        .selector("code", &["code"])
        .identity_key("code")
        .build()
        .unwrap()
});

#[test]
fn query_retriever_reports_inconsistent_duplicate() {
    let mut store = open();
    let mut existing = Element::new(&KEYED, store.id());
    existing.set("code", "CS101").unwrap();
    existing.set("title", "Intro").unwrap();
    existing.set("score", 1).unwrap();
    insert(&mut store, existing);

    let mut wanted = Element::new(&KEYED, store.id());
    wanted.set("code", "CS101").unwrap();
    wanted.set("score", 2).unwrap();
    let mut table = TranslationTable::new();
    assert!(QueryRetriever.fetch(&store, &mut table, &wanted).unwrap().is_some());

    wanted.set("title", "Advanced").unwrap();
    let err = QueryRetriever.fetch(&store, &mut table, &wanted).unwrap_err();
    assert!(matches!(err, StorageError::Inconsistent { property: "title", .. }));
    assert_eq!(err.kind(), ErrorKind::Inconsistent);
}

#[test]
fn full_identity_matches_immutable_values() {
    let mut store = open();
    let mut e = Element::new(&LOOSE, store.id());
    e.set("label", "a").unwrap();
    e.set("score", 3).unwrap();
    let stored = insert(&mut store, e);

    let mut wanted = Element::new(&LOOSE, store.id());
    wanted.set("label", "a").unwrap();
    let mut table = TranslationTable::new();
    assert_eq!(QueryRetriever.fetch(&store, &mut table, &wanted).unwrap(), Some(stored));
}

static EMPTY: LazyLock<Definition> = LazyLock::new(|| {
    Definition::builder("tag")
        .property(Property::integer("weight").mutable())
        .build()
        .unwrap()
});

#[test]
fn retriever_for_picks_by_definition() {
    let mut store = open();
    let mut table = TranslationTable::new();
    let mut wanted = Element::new(&EMPTY, store.id());
    wanted.set("weight", 1).unwrap();
    insert(&mut store, wanted.clone());

    // nothing to query on, so only the table can match
    assert_eq!(retriever_for(&EMPTY).fetch(&store, &mut table, &wanted).unwrap(), None);
    let mut keyed = Element::new(activity_source::definition(), store.id());
    keyed.set(activity_source::SOURCE_NAME, "x").unwrap();
    let stored = insert(&mut store, keyed.clone());
    assert_eq!(
        retriever_for(activity_source::definition())
            .fetch(&store, &mut table, &keyed)
            .unwrap(),
        Some(stored)
    );
}
