//! Immutable snapshot of the intake form.
//!
//! The surrounding store persists one flat key -> value mapping. Two keys are
//! reserved: `NameBank` (the entity collection) and `SelectedClauses` (the
//! per-article clause selection lists). Everything else is read through the
//! typed accessors here. Core functions only ever read a snapshot; proposed
//! state changes are returned as values for the store to commit.

use ahash::AHashMap;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::entity::{Entity, EntityId, NameParts, Person, Role, WireEntry};

const NAME_BANK_KEY: &str = "NameBank";
const SELECTED_CLAUSES_KEY: &str = "SelectedClauses";

/// A persisted per-article selection, distinguishing "never stored" from
/// "stored empty" (addon-only articles render all addons until a manual
/// selection exists, but an explicit empty selection renders none).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState<'a> {
    Absent,
    Stored(&'a [String]),
}

impl<'a> SelectionState<'a> {
    pub fn ids(&self) -> &'a [String] {
        match self {
            SelectionState::Absent => &[],
            SelectionState::Stored(ids) => ids,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SelectionState::Absent)
    }
}

/// Immutable intake snapshot.
#[derive(Debug, Clone, Default)]
pub struct Intake {
    fields: BTreeMap<String, Value>,
    bank: Vec<Entity>,
    by_id: AHashMap<EntityId, usize>,
    selections: BTreeMap<String, Vec<String>>,
}

impl Intake {
    /// Build a snapshot from the store's flat JSON object. Total: malformed
    /// bank entries or selection lists degrade to empty rather than failing.
    pub fn from_value(root: Value) -> Self {
        let mut fields = match root {
            Value::Object(map) => map.into_iter().collect::<BTreeMap<_, _>>(),
            _ => BTreeMap::new(),
        };

        let bank: Vec<Entity> = match fields.remove(NAME_BANK_KEY) {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .filter_map(|raw| match serde_json::from_value::<WireEntry>(raw) {
                    Ok(entry) => Some(entry.into_entity()),
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping malformed name bank entry");
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        let selections = match fields.remove(SELECTED_CLAUSES_KEY) {
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(article, raw)| (article, selection_list(raw)))
                .collect(),
            _ => BTreeMap::new(),
        };

        let by_id = bank
            .iter()
            .enumerate()
            .map(|(idx, entity)| (entity.id().clone(), idx))
            .collect();

        Self {
            fields,
            bank,
            by_id,
            selections,
        }
    }

    /// Parse a snapshot from the store's JSON text. Unparseable text is an
    /// empty snapshot; the caller gets a best-effort view either way.
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Self::from_value(value),
            Err(err) => {
                tracing::warn!(error = %err, "intake snapshot is not valid JSON; using empty snapshot");
                Self::default()
            }
        }
    }

    // ========================================================================
    // Flat field accessors
    // ========================================================================

    /// A text field, trimmed; empty string when missing or non-text.
    pub fn text(&self, key: &str) -> &str {
        match self.fields.get(key) {
            Some(Value::String(s)) => s.trim(),
            _ => "",
        }
    }

    /// A text field that may be stored as a JSON number.
    pub fn text_or_number(&self, key: &str) -> String {
        match self.fields.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// A checkbox field: JSON `true` or the string `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        match self.fields.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    /// A "Yes"/"No" select field.
    pub fn yes(&self, key: &str) -> bool {
        self.text(key).eq_ignore_ascii_case("yes")
    }

    /// A numeric field (stored as number or numeric text).
    pub fn number(&self, key: &str) -> Option<i64> {
        match self.fields.get(key) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A list-of-objects field (e.g. `BackupCharities`), empty when missing.
    pub fn entries(&self, key: &str) -> &[Value] {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// A list-of-strings field, dropping empties.
    pub fn string_list(&self, key: &str) -> Vec<&str> {
        self.entries(key)
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Every flat field, in key order. The bank and selection keys are
    /// split out during construction and never appear here.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    // ========================================================================
    // Entity collection
    // ========================================================================

    pub fn bank(&self) -> &[Entity] {
        &self.bank
    }

    /// Arena lookup by id. Resolution happens at read time; the model never
    /// stores back-references.
    pub fn entity_by_id(&self, id: &EntityId) -> Option<&Entity> {
        self.by_id.get(id).map(|&idx| &self.bank[idx])
    }

    /// Persons whose primary role matches, in bank order.
    pub fn people_with_role(&self, role: Role) -> Vec<&Person> {
        self.bank
            .iter()
            .filter_map(Entity::as_person)
            .filter(|p| p.primary_role == role)
            .collect()
    }

    /// Persons carrying the given badge (or primary role), in bank order.
    pub fn people_with_badge(&self, badge: &str) -> Vec<&Person> {
        self.bank
            .iter()
            .filter_map(Entity::as_person)
            .filter(|p| {
                p.primary_role.as_str() == badge || p.badges.iter().any(|b| b == badge)
            })
            .collect()
    }

    /// Resolved display name for a stored entity id; `None` when the id
    /// matches nothing current.
    pub fn name_of(&self, id: &EntityId) -> Option<String> {
        self.entity_by_id(id)
            .map(Entity::display_name)
            .filter(|name| !name.is_empty())
    }

    // ========================================================================
    // Client / testator
    // ========================================================================

    /// Synthesize the testator record from the top-level profile fields.
    /// Not stored in the collection; referenced via `ParentRef::Client`.
    pub fn client_person(&self) -> Person {
        let include_middle = self.flag("ClientMiddleToggle");
        let include_suffix = self.flag("ClientSuffixToggle");
        Person {
            id: EntityId::new("__CLIENT__"),
            name: NameParts {
                first: self.text("ClientFirstName").to_string(),
                middle: if include_middle {
                    self.text("ClientMiddleName").to_string()
                } else {
                    String::new()
                },
                last: self.text("ClientLastName").to_string(),
                suffix: if include_suffix {
                    self.text("ClientSuffix").to_string()
                } else {
                    String::new()
                },
                include_first: true,
                include_middle: Some(include_middle),
                include_last: true,
                include_suffix: Some(include_suffix),
                middle_initial_only: self.flag("ClientMiddleInitialOnly"),
            },
            primary_role: Role::Other,
            badges: vec!["Testator".to_string()],
            child: None,
        }
    }

    /// Lowercased free-form relationship status ("married", "widowed", ...).
    pub fn relationship_status(&self) -> String {
        self.text("RelationshipStatus").to_lowercase()
    }

    // ========================================================================
    // Selections
    // ========================================================================

    /// The persisted selection for an article, distinguishing absent from
    /// stored-empty.
    pub fn selection(&self, article_key: &str) -> SelectionState<'_> {
        match self.selections.get(article_key) {
            Some(ids) => SelectionState::Stored(ids),
            None => SelectionState::Absent,
        }
    }

    pub fn selections(&self) -> &BTreeMap<String, Vec<String>> {
        &self.selections
    }
}

/// Coerce a stored selection value to a list. Old snapshots occasionally
/// persisted a bare string instead of a one-element list.
fn selection_list(raw: Value) -> Vec<String> {
    match raw {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> Intake {
        Intake::from_value(value)
    }

    #[test]
    fn bank_entries_are_normalized_and_indexed() {
        let intake = snapshot(json!({
            "NameBank": [
                { "id": "s1", "first": "Jane", "last": "Doe", "roles": ["Spouse"] },
                { "id": "c1", "first": "Kit", "last": "Doe", "roles": ["Child"] }
            ]
        }));
        assert_eq!(intake.bank().len(), 2);
        assert_eq!(intake.people_with_role(Role::Spouse).len(), 1);
        let child = &intake.people_with_role(Role::Child)[0];
        // Normalization defaulted the client as parent A.
        assert!(child.child.as_ref().unwrap().parent_a.is_client());
        assert!(intake.entity_by_id(&EntityId::new("s1")).is_some());
    }

    #[test]
    fn malformed_bank_entries_are_skipped_not_fatal() {
        let intake = snapshot(json!({
            "NameBank": [
                { "id": "ok", "first": "A", "roles": ["Executor"] },
                42
            ]
        }));
        assert_eq!(intake.bank().len(), 1);
    }

    #[test]
    fn selection_distinguishes_absent_from_stored_empty() {
        let intake = snapshot(json!({
            "SelectedClauses": { "powers": [] }
        }));
        assert!(matches!(intake.selection("powers"), SelectionState::Stored(&[])));
        assert!(intake.selection("misc").is_absent());
    }

    #[test]
    fn bare_string_selection_coerces_to_singleton_list() {
        let intake = snapshot(json!({
            "SelectedClauses": { "debts": "debts.primary.standard" }
        }));
        assert_eq!(
            intake.selection("debts").ids(),
            ["debts.primary.standard".to_string()]
        );
    }

    #[test]
    fn client_person_applies_name_toggles() {
        let intake = snapshot(json!({
            "ClientFirstName": "John",
            "ClientMiddleName": "Quincy",
            "ClientLastName": "Adams",
            "ClientMiddleToggle": true,
            "ClientMiddleInitialOnly": true
        }));
        assert_eq!(intake.client_person().name.display(), "John Q. Adams");
    }

    #[test]
    fn non_json_snapshot_degrades_to_empty() {
        let intake = Intake::from_json("not json at all");
        assert!(intake.bank().is_empty());
        assert_eq!(intake.text("RelationshipStatus"), "");
    }
}
