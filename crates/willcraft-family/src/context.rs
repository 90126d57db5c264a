//! Family Context: the derived flag/count record summarizing a testator's
//! relationship and children status.
//!
//! This is a stateless projection, recomputed on every read from the current
//! snapshot. It is never persisted or mutated directly.

use serde::Serialize;
use willcraft_model::{ChildRelationship, EntityId, Intake, Person, Role};

/// Flat classification of the testator's family situation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FamilyContext {
    /// Lowercased free-form relationship status ("married", "widowed", ...).
    pub relationship: String,
    pub has_spouse: bool,
    pub has_partner: bool,
    pub has_former_spouse: bool,
    pub has_guardian: bool,
    pub has_client_children: bool,
    pub has_step_children: bool,
    pub has_adopted_children: bool,
    pub has_art_children: bool,
    /// Client children with a resolvable other parent who is not the current
    /// spouse (children from a prior relationship).
    pub has_prior_children: bool,
    /// Client children whose other parent is the current spouse.
    pub has_current_spouse_children: bool,
    pub client_children_count: usize,
    pub current_spouse_children_count: usize,
    pub art_children_count: usize,
}

impl FamilyContext {
    /// Classify the snapshot. Pure; safe to call on every read.
    pub fn build(intake: &Intake) -> FamilyContext {
        let relationship = intake.relationship_status();
        let spouses = intake.people_with_role(Role::Spouse);
        let partners = intake.people_with_role(Role::Partner);
        let former_spouses = intake.people_with_role(Role::FormerSpouse);
        let guardians = intake.people_with_role(Role::Guardian);
        let children = intake.people_with_role(Role::Child);

        let rel_of = |child: &&Person| {
            child
                .child
                .as_ref()
                .map(|link| link.relationship)
                .unwrap_or_default()
        };
        let step_children: Vec<_> = children
            .iter()
            .filter(|c| rel_of(c) == ChildRelationship::StepChild)
            .collect();
        let adopted_count = children
            .iter()
            .filter(|c| rel_of(c) == ChildRelationship::Adopted)
            .count();
        let art_children_count = children
            .iter()
            .filter(|c| rel_of(c) == ChildRelationship::ConceivedWithArt)
            .count();
        // "Client children" excludes step-children.
        let client_children: Vec<_> = children
            .iter()
            .filter(|c| rel_of(c) != ChildRelationship::StepChild)
            .collect();

        let spouse_id: Option<&EntityId> = spouses.first().map(|s| &s.id);
        fn other_parent_of(child: &Person) -> Option<&EntityId> {
            child.child.as_ref().and_then(|link| link.other_parent_id())
        }
        let prior_count = client_children
            .iter()
            .filter(|c| match other_parent_of(c) {
                Some(other) => Some(other) != spouse_id,
                None => false,
            })
            .count();
        let current_spouse_children_count = client_children
            .iter()
            .filter(|c| spouse_id.is_some() && other_parent_of(c) == spouse_id)
            .count();

        // Pre-entity-creation declarations count too: the top-level flag with
        // a positive count hint says children exist before any records do.
        let has_children_flag = intake.yes("HasChildren");
        let count_hint = intake.number("ChildrenCount").unwrap_or(0).max(0) as usize;
        let client_children_count = if !client_children.is_empty() {
            client_children.len()
        } else if has_children_flag {
            count_hint.max(1)
        } else {
            0
        };

        FamilyContext {
            has_spouse: !spouses.is_empty() || relationship == "married",
            has_partner: !partners.is_empty(),
            has_former_spouse: !former_spouses.is_empty(),
            has_guardian: !guardians.is_empty(),
            has_client_children: !client_children.is_empty() || has_children_flag,
            has_step_children: !step_children.is_empty(),
            has_adopted_children: adopted_count > 0,
            has_art_children: art_children_count > 0,
            has_prior_children: prior_count > 0,
            has_current_spouse_children: current_spouse_children_count > 0,
            client_children_count,
            current_spouse_children_count,
            art_children_count,
            relationship,
        }
    }
}
