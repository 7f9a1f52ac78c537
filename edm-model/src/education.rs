//! The educational record types: where activities come from, what kind they
//! are, the courses they belong to, who is enrolled and the grades earned.
//!
//! Each submodule exposes `definition()` plus its property names. Ranks
//! follow the required relationships: sources, roles and users first, then
//! activity types and courses, then enrolments and activities, then grades.

use crate::{Definition, Element, ElementHooks, ModelResult, Property};
use std::sync::LazyLock;

fn declare(builder: crate::DefinitionBuilder) -> Definition {
    builder
        .build()
        .unwrap_or_else(|e| panic!("invalid built-in definition: {e}"))
}

/// External system an activity type was imported from.
pub mod activity_source {
    use super::*;

    pub const NAME: &str = "activity_source";
    pub const SOURCE_NAME: &str = "name";
    pub const KEY: &str = "name";

    static DEFINITION: LazyLock<Definition> = LazyLock::new(|| {
        declare(
            Definition::builder(NAME)
                .rank(0)
                .property(Property::text(SOURCE_NAME).required())
                .selector(KEY, &[SOURCE_NAME])
                .identity_key(KEY),
        )
    });

    pub fn definition() -> &'static Definition {
        &DEFINITION
    }
}

/// Role held by an enrolled user (student, instructor, ...).
pub mod role {
    use super::*;

    pub const NAME: &str = "role";
    pub const ROLE_NAME: &str = "name";
    pub const KEY: &str = "name";

    static DEFINITION: LazyLock<Definition> = LazyLock::new(|| {
        declare(
            Definition::builder(NAME)
                .rank(0)
                .property(Property::text(ROLE_NAME).required())
                .selector(KEY, &[ROLE_NAME])
                .identity_key(KEY),
        )
    });

    pub fn definition() -> &'static Definition {
        &DEFINITION
    }
}

pub mod user {
    use super::*;

    pub const NAME: &str = "user";
    pub const USERNAME: &str = "username";
    pub const FIRSTNAME: &str = "firstname";
    pub const LASTNAME: &str = "lastname";
    pub const ENROLMENTS: &str = "enrolments";
    pub const KEY: &str = "username";

    static DEFINITION: LazyLock<Definition> = LazyLock::new(|| {
        declare(
            Definition::builder(NAME)
                .rank(0)
                .property(Property::text(USERNAME).required())
                .property(Property::text(FIRSTNAME))
                .property(Property::text(LASTNAME))
                .property(Property::relationships(ENROLMENTS, super::enrolment::NAME))
                .selector(KEY, &[USERNAME])
                .identity_key(KEY),
        )
    });

    pub fn definition() -> &'static Definition {
        &DEFINITION
    }
}

pub mod activity_type {
    use super::*;

    pub const NAME: &str = "activity_type";
    pub const TYPE_NAME: &str = "name";
    pub const SOURCE: &str = "source";
    pub const KEY: &str = "name_source";

    static DEFINITION: LazyLock<Definition> = LazyLock::new(|| {
        declare(
            Definition::builder(NAME)
                .rank(1)
                .property(Property::text(TYPE_NAME).required())
                .property(Property::relationship(SOURCE, super::activity_source::NAME).required())
                .selector(KEY, &[TYPE_NAME, SOURCE])
                .identity_key(KEY),
        )
    });

    pub fn definition() -> &'static Definition {
        &DEFINITION
    }
}

/// One offering of a course in a given semester and year.
pub mod course {
    use super::*;

    pub const NAME: &str = "course";
    pub const COURSE_NAME: &str = "name";
    pub const SEMESTER: &str = "semester";
    pub const YEAR: &str = "year";
    pub const ACTIVITIES: &str = "activities";
    pub const KEY: &str = "offering";

    static DEFINITION: LazyLock<Definition> = LazyLock::new(|| {
        declare(
            Definition::builder(NAME)
                .rank(1)
                .property(Property::text(COURSE_NAME).required())
                .property(Property::text(SEMESTER).required())
                .property(Property::integer(YEAR).required().range(1900, 2100))
                .property(Property::relationships(ACTIVITIES, super::activity::NAME))
                .selector(KEY, &[COURSE_NAME, SEMESTER, YEAR])
                .identity_key(KEY),
        )
    });

    pub fn definition() -> &'static Definition {
        &DEFINITION
    }
}

pub mod enrolment {
    use super::*;

    pub const NAME: &str = "enrolment";
    pub const COURSE: &str = "course";
    pub const ROLE: &str = "role";
    pub const USER_NAME: &str = "user_name";
    pub const FINAL_GRADE: &str = "final_grade";
    pub const USABLE: &str = "usable";
    pub const KEY: &str = "course_user";

    /// New enrolments are usable unless stated otherwise.
    struct EnrolmentHooks;

    impl ElementHooks for EnrolmentHooks {
        fn pre_insert(&self, element: &mut Element) -> ModelResult<()> {
            if element.get(USABLE).is_none() {
                element.set(USABLE, true)?;
            }
            Ok(())
        }
    }

    static HOOKS: EnrolmentHooks = EnrolmentHooks;

    static DEFINITION: LazyLock<Definition> = LazyLock::new(|| {
        declare(
            Definition::builder(NAME)
                .rank(2)
                .property(Property::relationship(COURSE, super::course::NAME).required())
                .property(Property::relationship(ROLE, super::role::NAME).required())
                .property(Property::text(USER_NAME).required())
                .property(Property::integer(FINAL_GRADE).mutable().range(0, 100))
                .property(Property::boolean(USABLE).mutable())
                .selector(KEY, &[COURSE, USER_NAME])
                .identity_key(KEY)
                .hooks(&HOOKS),
        )
    });

    pub fn definition() -> &'static Definition {
        &DEFINITION
    }
}

pub mod activity {
    use super::*;

    pub const NAME: &str = "activity";
    pub const COURSE: &str = "course";
    pub const ACTIVITY_TYPE: &str = "activity_type";
    pub const ACTIVITY_NAME: &str = "name";
    pub const KEY: &str = "course_type_name";

    static DEFINITION: LazyLock<Definition> = LazyLock::new(|| {
        declare(
            Definition::builder(NAME)
                .rank(2)
                .property(Property::relationship(COURSE, super::course::NAME).required())
                .property(Property::relationship(ACTIVITY_TYPE, super::activity_type::NAME).required())
                .property(Property::text(ACTIVITY_NAME).required())
                .selector(KEY, &[COURSE, ACTIVITY_TYPE, ACTIVITY_NAME])
                .identity_key(KEY),
        )
    });

    pub fn definition() -> &'static Definition {
        &DEFINITION
    }
}

pub mod grade {
    use super::*;

    pub const NAME: &str = "grade";
    pub const ACTIVITY: &str = "activity";
    pub const ENROLMENT: &str = "enrolment";
    pub const GRADE: &str = "grade";
    pub const KEY: &str = "activity_enrolment";

    static DEFINITION: LazyLock<Definition> = LazyLock::new(|| {
        declare(
            Definition::builder(NAME)
                .rank(3)
                .property(Property::relationship(ACTIVITY, super::activity::NAME).required())
                .property(Property::relationship(ENROLMENT, super::enrolment::NAME).required())
                .property(Property::integer(GRADE).mutable().range(0, 100))
                .selector(KEY, &[ACTIVITY, ENROLMENT])
                .identity_key(KEY),
        )
    });

    pub fn definition() -> &'static Definition {
        &DEFINITION
    }
}

/// Every educational definition, in rank order.
pub fn definitions() -> [&'static Definition; 8] {
    [
        activity_source::definition(),
        role::definition(),
        user::definition(),
        activity_type::definition(),
        course::definition(),
        activity::definition(),
        enrolment::definition(),
        grade::definition(),
    ]
}
