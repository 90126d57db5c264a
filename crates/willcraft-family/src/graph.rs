//! Family graph: partner-keyed child buckets for display and narrative.
//!
//! Children are grouped by their non-client parent id; the first Spouse
//! entity (or, failing that, the co-parent with the most children) becomes
//! the current partner, every other co-parent and every Former Spouse entity
//! becomes a former partner, and children with no resolvable co-parent land
//! in the unpaired list. Every client child appears in exactly one stack or
//! the unpaired list.

use serde::Serialize;
use willcraft_model::{ChildRelationship, Entity, EntityId, Intake, Person, Role};

/// Label rendered when a parent id matches nothing in the entity collection.
pub const UNRESOLVED_PARENT_LABEL: &str = "Parent not in Name Bank";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerKind {
    Client,
    Spouse,
    Partner,
    /// Referenced id matches nothing current; rendered with an explicit
    /// marker label instead of being dropped.
    Unresolved,
}

/// A partner node in the graph (the client, a spouse, or a co-parent).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerNode {
    pub id: Option<EntityId>,
    pub name: String,
    /// Role or badge caption ("Spouse", "Former Spouse", ...).
    pub caption: String,
    pub kind: PartnerKind,
}

/// A child as described in a stack: resolved name, relationship label, and
/// the treated-as-biological annotation for non-biological children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildNode {
    pub id: EntityId,
    pub name: String,
    pub relationship: ChildRelationship,
    /// `Some("treated as biological")` / `Some("not treated as biological")`
    /// for non-biological children, `None` for biological ones.
    pub annotation: Option<&'static str>,
}

/// One partner with the children bucketed under them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerStack {
    pub partner: PartnerNode,
    /// True for the current partner (the stack list orders former partners
    /// first, current partner last).
    pub current: bool,
    pub children: Vec<ChildNode>,
}

/// The display-ready family graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyGraph {
    pub client: PartnerNode,
    pub partner_stacks: Vec<PartnerStack>,
    pub unpaired_children: Vec<ChildNode>,
}

impl FamilyGraph {
    /// Build the graph from a snapshot. Pure projection; ids are resolved at
    /// read time and unresolvable references degrade to marker nodes.
    pub fn build(intake: &Intake) -> FamilyGraph {
        let children = intake.people_with_role(Role::Child);

        // Bucket children by co-parent id, preserving first-seen order of
        // both buckets and children within a bucket.
        let mut buckets: Vec<(Option<EntityId>, Vec<&Person>)> = Vec::new();
        for child in &children {
            let key = child
                .child
                .as_ref()
                .and_then(|link| link.bucket_parent_id())
                .cloned();
            match buckets.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(child),
                None => buckets.push((key, vec![child])),
            }
        }

        // Current partner: first Spouse entity, else the co-parent bucket
        // with the most children.
        let spouses = intake.people_with_role(Role::Spouse);
        let primary_id: Option<EntityId> = spouses.first().map(|s| s.id.clone()).or_else(|| {
            // First-seen bucket wins ties, so the layout stays stable as
            // children are re-linked.
            let mut best: Option<(&EntityId, usize)> = None;
            for (key, members) in &buckets {
                if let Some(id) = key {
                    if best.map_or(true, |(_, n)| members.len() > n) {
                        best = Some((id, members.len()));
                    }
                }
            }
            best.map(|(id, _)| id.clone())
        });

        // Former partners: every other co-parent bucket, plus every entity
        // carrying the Former Spouse role, deduplicated.
        let mut former: Vec<EntityId> = Vec::new();
        for (key, _) in &buckets {
            if let Some(id) = key {
                if Some(id) != primary_id.as_ref() && !former.contains(id) {
                    former.push(id.clone());
                }
            }
        }
        for person in intake.people_with_badge(Role::FormerSpouse.as_str()) {
            if Some(&person.id) != primary_id.as_ref() && !former.contains(&person.id) {
                former.push(person.id.clone());
            }
        }

        // Former partners stack before the current partner.
        let mut order: Vec<(EntityId, bool)> =
            former.into_iter().map(|id| (id, false)).collect();
        if let Some(id) = primary_id {
            order.push((id, true));
        }

        let bucket_children = |id: &EntityId| -> Vec<ChildNode> {
            buckets
                .iter()
                .find(|(key, _)| key.as_ref() == Some(id))
                .map(|(_, members)| members.iter().map(|p| describe_child(p)).collect())
                .unwrap_or_default()
        };

        let partner_stacks = order
            .into_iter()
            .map(|(id, current)| PartnerStack {
                partner: describe_partner(intake, &id),
                current,
                children: bucket_children(&id),
            })
            .collect();

        let unpaired_children = buckets
            .iter()
            .find(|(key, _)| key.is_none())
            .map(|(_, members)| members.iter().map(|p| describe_child(p)).collect())
            .unwrap_or_default();

        FamilyGraph {
            client: client_node(intake),
            partner_stacks,
            unpaired_children,
        }
    }
}

fn client_node(intake: &Intake) -> PartnerNode {
    let client = intake.client_person();
    let name = client.name.display();
    PartnerNode {
        id: None,
        name: if name.is_empty() {
            "Client / Testator".to_string()
        } else {
            name
        },
        caption: "Client".to_string(),
        kind: PartnerKind::Client,
    }
}

fn describe_partner(intake: &Intake, id: &EntityId) -> PartnerNode {
    match intake.entity_by_id(id) {
        Some(entity) => {
            let (caption, kind) = match entity {
                Entity::Person(p) => {
                    let caption = p
                        .badges
                        .first()
                        .cloned()
                        .unwrap_or_else(|| p.primary_role.as_str().to_string());
                    let kind = if p.primary_role == Role::Spouse {
                        PartnerKind::Spouse
                    } else {
                        PartnerKind::Partner
                    };
                    (caption, kind)
                }
                _ => ("Partner".to_string(), PartnerKind::Partner),
            };
            let name = entity.display_name();
            PartnerNode {
                id: Some(id.clone()),
                name: if name.is_empty() {
                    "Unnamed Person".to_string()
                } else {
                    name
                },
                caption,
                kind,
            }
        }
        None => PartnerNode {
            id: Some(id.clone()),
            name: UNRESOLVED_PARENT_LABEL.to_string(),
            caption: "Unknown".to_string(),
            kind: PartnerKind::Unresolved,
        },
    }
}

fn describe_child(person: &Person) -> ChildNode {
    let link = person.child.clone().unwrap_or_default();
    let annotation = match link.relationship {
        ChildRelationship::Biological => None,
        _ if link.treat_as_biological => Some("treated as biological"),
        _ => Some("not treated as biological"),
    };
    let name = person.name.display();
    ChildNode {
        id: person.id.clone(),
        name: if name.is_empty() {
            "Unnamed Child".to_string()
        } else {
            name
        },
        relationship: link.relationship,
        annotation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn intake(value: serde_json::Value) -> Intake {
        Intake::from_value(value)
    }

    #[test]
    fn spouse_becomes_current_partner_and_formers_stack_first() {
        let graph = FamilyGraph::build(&intake(json!({
            "ClientFirstName": "Ada",
            "ClientLastName": "Client",
            "NameBank": [
                { "id": "sp", "first": "Jane", "last": "Doe", "roles": ["Spouse"] },
                { "id": "ex", "first": "Pat", "last": "Prior", "roles": ["Former Spouse"] },
                { "id": "k1", "first": "A", "roles": ["Child"], "childParentAId": "__CLIENT__", "childParentBId": "sp" },
                { "id": "k2", "first": "B", "roles": ["Child"], "childParentAId": "__CLIENT__", "childParentBId": "ex" }
            ]
        })));
        assert_eq!(graph.partner_stacks.len(), 2);
        assert!(!graph.partner_stacks[0].current);
        assert_eq!(graph.partner_stacks[0].partner.id, Some(EntityId::new("ex")));
        assert!(graph.partner_stacks[1].current);
        assert_eq!(graph.partner_stacks[1].partner.kind, PartnerKind::Spouse);
        assert_eq!(graph.partner_stacks[1].children.len(), 1);
        assert!(graph.unpaired_children.is_empty());
    }

    #[test]
    fn without_spouse_largest_bucket_wins() {
        let graph = FamilyGraph::build(&intake(json!({
            "NameBank": [
                { "id": "p1", "first": "One", "roles": ["Partner"] },
                { "id": "p2", "first": "Two", "roles": ["Partner"] },
                { "id": "k1", "first": "A", "roles": ["Child"], "childParentAId": "__CLIENT__", "childParentBId": "p1" },
                { "id": "k2", "first": "B", "roles": ["Child"], "childParentAId": "__CLIENT__", "childParentBId": "p2" },
                { "id": "k3", "first": "C", "roles": ["Child"], "childParentAId": "__CLIENT__", "childParentBId": "p2" }
            ]
        })));
        let current = graph.partner_stacks.iter().find(|s| s.current).unwrap();
        assert_eq!(current.partner.id, Some(EntityId::new("p2")));
        assert_eq!(current.children.len(), 2);
    }

    #[test]
    fn children_without_co_parent_land_in_unpaired_list() {
        let graph = FamilyGraph::build(&intake(json!({
            "NameBank": [
                { "id": "k1", "first": "A", "roles": ["Child"] }
            ]
        })));
        assert!(graph.partner_stacks.is_empty());
        assert_eq!(graph.unpaired_children.len(), 1);
    }

    #[test]
    fn unresolved_parent_id_degrades_to_marker_node() {
        let graph = FamilyGraph::build(&intake(json!({
            "NameBank": [
                { "id": "k1", "first": "A", "roles": ["Child"], "childParentAId": "__CLIENT__", "childParentBId": "ghost" }
            ]
        })));
        let stack = &graph.partner_stacks[0];
        assert_eq!(stack.partner.kind, PartnerKind::Unresolved);
        assert_eq!(stack.partner.name, UNRESOLVED_PARENT_LABEL);
        assert_eq!(stack.children.len(), 1);
    }

    #[test]
    fn non_biological_children_carry_annotations() {
        let graph = FamilyGraph::build(&intake(json!({
            "NameBank": [
                { "id": "k1", "first": "A", "roles": ["Child"], "childRelationship": "Adopted", "childTreatAsBio": "Yes" },
                { "id": "k2", "first": "B", "roles": ["Child"], "childRelationship": "Adopted", "childTreatAsBio": "No" },
                { "id": "k3", "first": "C", "roles": ["Child"] }
            ]
        })));
        let all: Vec<&ChildNode> = graph
            .partner_stacks
            .iter()
            .flat_map(|s| &s.children)
            .chain(&graph.unpaired_children)
            .collect();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].annotation, Some("treated as biological"));
        assert_eq!(all[1].annotation, Some("not treated as biological"));
        assert_eq!(all[2].annotation, None);
    }
}
