//! Property tests for the family projections.

use proptest::prelude::*;
use serde_json::json;
use willcraft_family::{suggest_family_clauses, FamilyContext, FamilyGraph};
use willcraft_model::Intake;

fn parent_ref() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("__CLIENT__".to_string()),
        Just("p1".to_string()),
        Just("p2".to_string()),
        // An id that matches nothing in the bank.
        Just("ghost".to_string()),
    ]
}

fn relationship() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Biological".to_string()),
        Just("Adopted".to_string()),
        Just("Step-child".to_string()),
        Just("Conceived with ART".to_string()),
    ]
}

fn child_entry(index: usize) -> impl Strategy<Value = serde_json::Value> {
    (parent_ref(), parent_ref(), relationship()).prop_map(move |(a, b, rel)| {
        json!({
            "id": format!("child-{index}"),
            "first": format!("Child{index}"),
            "roles": ["Child"],
            "childRelationship": rel,
            "childParentAId": a,
            "childParentBId": b,
        })
    })
}

fn bank() -> impl Strategy<Value = Vec<serde_json::Value>> {
    (0usize..8, any::<bool>(), any::<bool>()).prop_flat_map(|(n, spouse, partner)| {
        let children: Vec<_> = (0..n).map(child_entry).collect();
        children.prop_map(move |mut entries| {
            if spouse {
                entries.push(json!({ "id": "p1", "first": "Jane", "roles": ["Spouse"] }));
            }
            if partner {
                entries.push(json!({ "id": "p2", "first": "Sam", "roles": ["Partner"] }));
            }
            entries
        })
    })
}

fn context() -> impl Strategy<Value = FamilyContext> {
    (
        prop_oneof![
            Just("married".to_string()),
            Just("widowed".to_string()),
            Just("divorced".to_string()),
            Just("single".to_string()),
            Just("".to_string()),
        ],
        any::<[bool; 8]>(),
        0usize..5,
        0usize..5,
        0usize..5,
    )
        .prop_map(|(relationship, flags, children, spouse_children, art)| FamilyContext {
            relationship,
            has_spouse: flags[0],
            has_partner: flags[1],
            has_former_spouse: flags[2],
            has_guardian: flags[3],
            has_client_children: flags[4] || children > 0,
            has_step_children: flags[5],
            has_adopted_children: flags[6],
            has_art_children: art > 0,
            has_prior_children: flags[7],
            has_current_spouse_children: spouse_children > 0,
            client_children_count: children,
            current_spouse_children_count: spouse_children,
            art_children_count: art,
        })
}

proptest! {
    /// Every child lands in exactly one partner stack or the unpaired list.
    #[test]
    fn bucketing_is_complete_and_exclusive(entries in bank()) {
        let child_count = entries
            .iter()
            .filter(|e| e["roles"] == json!(["Child"]))
            .count();
        let intake = Intake::from_value(json!({ "NameBank": entries }));
        let graph = FamilyGraph::build(&intake);

        let mut seen: Vec<String> = graph
            .partner_stacks
            .iter()
            .flat_map(|stack| stack.children.iter().map(|c| c.id.as_str().to_string()))
            .chain(graph.unpaired_children.iter().map(|c| c.id.as_str().to_string()))
            .collect();
        prop_assert_eq!(seen.len(), child_count);
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), child_count);
    }

    /// The decision table always proposes at least one clause.
    #[test]
    fn suggestions_are_never_empty(ctx in context()) {
        let ids = suggest_family_clauses(&ctx);
        prop_assert!(!ids.is_empty());
        // And behave as a set: no duplicates.
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), ids.len());
    }

    /// Classification is a pure projection: same snapshot, same context.
    #[test]
    fn context_is_deterministic(entries in bank()) {
        let intake = Intake::from_value(json!({ "NameBank": entries }));
        prop_assert_eq!(FamilyContext::build(&intake), FamilyContext::build(&intake));
    }
}
