use edm_model::{Definition, ElementHooks, IdentityPolicy, ModelError, NoHooks, Property};

fn sample() -> Definition {
    Definition::builder("course")
        .rank(1)
        .property(Property::text("name").required())
        .property(Property::integer("year").required())
        .property(Property::relationships("activities", "activity"))
        .selector("offering", &["name", "year"])
        .identity_key("offering")
        .build()
        .unwrap()
}

// ── Accessors ────────────────────────────────────────────────────

#[test]
fn exposes_declared_table() {
    let def = sample();
    assert_eq!(def.name(), "course");
    assert_eq!(def.rank(), 1);
    assert_eq!(def.properties().len(), 3);
    assert_eq!(def.relationships().count(), 1);
    assert_eq!(def.attributes().count(), 2);
    assert_eq!(def.identity(), IdentityPolicy::Key("offering"));
    assert_eq!(def.selector("offering").unwrap().properties, vec!["name", "year"]);
}

#[test]
fn property_lookup() {
    let def = sample();
    assert!(def.property("name").is_some());
    assert!(def.property("nope").is_none());
    let err = def.require_property("nope").unwrap_err();
    assert_eq!(
        err,
        ModelError::UnknownProperty {
            element: "course",
            property: "nope".into(),
        }
    );
}

#[test]
fn identity_defaults_to_full() {
    let def = Definition::builder("note").property(Property::text("body")).build().unwrap();
    assert_eq!(def.identity(), IdentityPolicy::Full);
}

#[test]
fn definitions_compare_by_name() {
    assert_eq!(sample(), sample());
    assert!(sample().is(&sample()));
}

#[test]
fn debug_output_names_definition() {
    assert!(format!("{:?}", sample()).contains("\"course\""));
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn duplicate_property_rejected() {
    let err = Definition::builder("x")
        .property(Property::text("a"))
        .property(Property::integer("a"))
        .build()
        .unwrap_err();
    assert_eq!(err, ModelError::DuplicateProperty { element: "x", property: "a" });
}

#[test]
fn selector_with_unknown_property_rejected() {
    let err = Definition::builder("x")
        .property(Property::text("a"))
        .selector("k", &["b"])
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("unknown property `b`"));
}

#[test]
fn selector_over_multi_valued_property_rejected() {
    let err = Definition::builder("x")
        .property(Property::relationships("items", "y"))
        .selector("k", &["items"])
        .build()
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidSelector { selector: "k", .. }));
}

#[test]
fn empty_selector_rejected() {
    assert!(Definition::builder("x").selector("k", &[]).build().is_err());
}

#[test]
fn undeclared_identity_selector_rejected() {
    let err = Definition::builder("x")
        .property(Property::text("a"))
        .identity_key("missing")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("identity selector"));
}

// ── Hooks ────────────────────────────────────────────────────────

static NO_HOOKS: NoHooks = NoHooks;

#[test]
fn hooks_default_to_noop() {
    let def = sample();
    let mut element = edm_model::Element::new(Box::leak(Box::new(sample())), edm_types::StoreId::new());
    assert!(def.hooks().pre_insert(&mut element).is_ok());
    assert!(def.hooks().post_insert(&element).is_ok());
    assert!(def.hooks().post_build(&element).is_ok());
}

#[test]
fn declared_hooks_are_returned() {
    let def = Definition::builder("x").hooks(&NO_HOOKS).build().unwrap();
    assert!(format!("{def:?}").contains("hooks: true"));
    let _: &dyn ElementHooks = def.hooks();
}
