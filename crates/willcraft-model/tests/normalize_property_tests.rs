//! Property tests for entity normalization and name resolution.

use proptest::prelude::*;
use serde_json::json;
use willcraft_model::{normalize, Entity, Role, WireEntry};

fn name_part() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(" ".to_string()),
        "[A-Za-z]{1,8}",
        Just("  spaced  ".to_string()),
    ]
}

fn role_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Spouse".to_string()),
        Just("Former Spouse".to_string()),
        Just("Child".to_string()),
        Just("Executor".to_string()),
        Just("Godparent".to_string()),
        Just(String::new()),
    ]
}

fn parent_ref() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("__CLIENT__".to_string()),
        Just("p1".to_string()),
    ]
}

fn relationship() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Biological".to_string()),
        Just("Adopted".to_string()),
        Just("Step-child".to_string()),
        Just("Conceived with ART".to_string()),
        Just("garbage".to_string()),
    ]
}

fn wire_entry() -> impl Strategy<Value = WireEntry> {
    (
        (name_part(), name_part(), name_part(), name_part()),
        proptest::collection::vec(role_name(), 0..3),
        relationship(),
        parent_ref(),
        parent_ref(),
        any::<bool>(),
    )
        .prop_map(|((first, middle, last, suffix), roles, rel, a, b, initial_only)| {
            let value = json!({
                "id": "e1",
                "first": first,
                "middle": middle,
                "last": last,
                "suffix": suffix,
                "middleInitialOnly": initial_only,
                "roles": roles,
                "childRelationship": rel,
                "childParentAId": a,
                "childParentBId": b,
            });
            serde_json::from_value(value).unwrap()
        })
}

proptest! {
    /// Classification already normalizes, so a second pass is the identity.
    #[test]
    fn normalize_is_idempotent(entry in wire_entry()) {
        let entity = entry.into_entity();
        prop_assert_eq!(normalize(entity.clone()), entity);
    }

    /// Resolved names join parts with single spaces, never edge whitespace.
    #[test]
    fn display_names_have_clean_spacing(entry in wire_entry()) {
        let name = entry.into_entity().display_name();
        prop_assert!(!name.contains("  "), "double space in {name:?}");
        prop_assert_eq!(name.trim(), name.as_str());
    }

    /// Only Child-role persons carry a child link after normalization, and
    /// step-children never have the client slotted as their first parent.
    #[test]
    fn child_links_respect_role_and_step_rule(entry in wire_entry()) {
        if let Entity::Person(person) = entry.into_entity() {
            if person.primary_role == Role::Child {
                let link = person.child.as_ref().unwrap();
                if link.relationship == willcraft_model::ChildRelationship::StepChild {
                    prop_assert!(!link.parent_a.is_client());
                }
            } else {
                prop_assert!(person.child.is_none());
            }
        }
    }
}
