//! Typed entity records: persons, charities, and corporate fiduciaries.
//!
//! Relationships are flat id references into the entity collection (an arena
//! keyed by [`EntityId`]), never live object references; lookups resolve by
//! id at read time. The testator is not stored in the collection and is
//! referenced through the type-distinguished [`ParentRef::Client`] sentinel
//! rather than a magic string mixed into the generated-id space.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire spelling of the client sentinel in legacy intake JSON.
const CLIENT_SENTINEL: &str = "__CLIENT__";

// ============================================================================
// Identifiers
// ============================================================================

/// Process-unique identifier for a stored entity.
///
/// Ids arriving from intake JSON are opaque strings; new records minted on
/// the Rust side get a v4 uuid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Mint a fresh process-unique id.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parent slot on a child record: empty, the testator, or a stored entity.
///
/// The client sentinel is a distinct variant so it can never collide with a
/// generated id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ParentRef {
    #[default]
    Unset,
    Client,
    Entity(EntityId),
}

impl ParentRef {
    pub fn is_unset(&self) -> bool {
        matches!(self, ParentRef::Unset)
    }

    pub fn is_client(&self) -> bool {
        matches!(self, ParentRef::Client)
    }

    /// The referenced entity id, if this slot names a stored entity.
    pub fn entity_id(&self) -> Option<&EntityId> {
        match self {
            ParentRef::Entity(id) => Some(id),
            _ => None,
        }
    }

    fn as_wire(&self) -> &str {
        match self {
            ParentRef::Unset => "",
            ParentRef::Client => CLIENT_SENTINEL,
            ParentRef::Entity(id) => id.as_str(),
        }
    }

    fn from_wire(raw: &str) -> Self {
        match raw {
            "" => ParentRef::Unset,
            CLIENT_SENTINEL => ParentRef::Client,
            other => ParentRef::Entity(EntityId::new(other)),
        }
    }
}

impl Serialize for ParentRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for ParentRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(ParentRef::from_wire).unwrap_or_default())
    }
}

// ============================================================================
// Roles
// ============================================================================

/// The closed base-role set. Unrecognized wire values normalize to `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    Spouse,
    Partner,
    #[serde(rename = "Former Spouse")]
    FormerSpouse,
    Child,
    Guardian,
    Executor,
    Trustee,
    Beneficiary,
    Witness,
    Disinherited,
    #[default]
    Other,
}

impl Role {
    pub const ALL: [Role; 11] = [
        Role::Spouse,
        Role::Partner,
        Role::FormerSpouse,
        Role::Child,
        Role::Guardian,
        Role::Executor,
        Role::Trustee,
        Role::Beneficiary,
        Role::Witness,
        Role::Disinherited,
        Role::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Spouse => "Spouse",
            Role::Partner => "Partner",
            Role::FormerSpouse => "Former Spouse",
            Role::Child => "Child",
            Role::Guardian => "Guardian",
            Role::Executor => "Executor",
            Role::Trustee => "Trustee",
            Role::Beneficiary => "Beneficiary",
            Role::Witness => "Witness",
            Role::Disinherited => "Disinherited",
            Role::Other => "Other",
        }
    }

    /// Parse a wire role string; anything outside the closed set is `None`
    /// (callers decide whether that means "Other" or "badge").
    pub fn parse(raw: &str) -> Option<Role> {
        Role::ALL.iter().copied().find(|r| r.as_str() == raw)
    }
}

// ============================================================================
// Name parts
// ============================================================================

/// Name components with independent include-toggles.
///
/// `include_middle`/`include_suffix` are `None` on legacy records that
/// predate the toggles; normalization resolves them to "include when the
/// part is non-empty", matching what those records displayed before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameParts {
    pub first: String,
    pub middle: String,
    pub last: String,
    pub suffix: String,
    pub include_first: bool,
    pub include_middle: Option<bool>,
    pub include_last: bool,
    pub include_suffix: Option<bool>,
    pub middle_initial_only: bool,
}

impl Default for NameParts {
    fn default() -> Self {
        Self {
            first: String::new(),
            middle: String::new(),
            last: String::new(),
            suffix: String::new(),
            include_first: true,
            include_middle: None,
            include_last: true,
            include_suffix: None,
            middle_initial_only: false,
        }
    }
}

impl NameParts {
    /// Join the included parts with single spaces, skipping empty parts.
    ///
    /// The middle part renders as an initial (`"John"` -> `"J."`) only when
    /// both the include-toggle and the initial-only flag are set.
    pub fn display(&self) -> String {
        let first = self.include_first.then(|| self.first.trim()).unwrap_or("");
        let include_middle = self
            .include_middle
            .unwrap_or(!self.middle.trim().is_empty());
        let middle_raw = self.middle.trim();
        let middle = if include_middle && !middle_raw.is_empty() {
            if self.middle_initial_only {
                middle_initial(middle_raw)
            } else {
                middle_raw.to_string()
            }
        } else {
            String::new()
        };
        let last = self.include_last.then(|| self.last.trim()).unwrap_or("");
        let include_suffix = self
            .include_suffix
            .unwrap_or(!self.suffix.trim().is_empty());
        let suffix = if include_suffix { self.suffix.trim() } else { "" };

        [first, middle.as_str(), last, suffix]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `"John"` -> `"J."`; empty input stays empty.
pub fn middle_initial(raw: &str) -> String {
    match raw.trim().chars().next() {
        Some(c) => format!("{}.", c.to_uppercase()),
        None => String::new(),
    }
}

// ============================================================================
// Child links
// ============================================================================

/// How a child relates to the testator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ChildRelationship {
    #[default]
    Biological,
    Adopted,
    #[serde(rename = "Step-child")]
    StepChild,
    #[serde(rename = "Conceived with ART")]
    ConceivedWithArt,
}

impl ChildRelationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildRelationship::Biological => "Biological",
            ChildRelationship::Adopted => "Adopted",
            ChildRelationship::StepChild => "Step-child",
            ChildRelationship::ConceivedWithArt => "Conceived with ART",
        }
    }
}

/// Parent references plus inheritance-narrative flags for a Child-role person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildLink {
    pub relationship: ChildRelationship,
    /// Non-biological children may still be "treated as biological" for
    /// narrative purposes; biological children always are.
    pub treat_as_biological: bool,
    pub parent_a: ParentRef,
    pub parent_b: ParentRef,
}

impl Default for ChildLink {
    fn default() -> Self {
        Self {
            relationship: ChildRelationship::default(),
            treat_as_biological: true,
            parent_a: ParentRef::Unset,
            parent_b: ParentRef::Unset,
        }
    }
}

impl ChildLink {
    /// The non-client parent id, when one parent slot is the client and the
    /// other names a stored entity. This is the "other parent" used to split
    /// prior-relationship children from current-spouse children.
    pub fn other_parent_id(&self) -> Option<&EntityId> {
        let (a, b) = (&self.parent_a, &self.parent_b);
        if a.is_client() {
            b.entity_id()
        } else if b.is_client() {
            a.entity_id()
        } else {
            None
        }
    }

    /// Whichever parent slot is a real entity id, preferring the slot that
    /// is not the client. Used for partner bucketing.
    pub fn bucket_parent_id(&self) -> Option<&EntityId> {
        self.other_parent_id()
            .or_else(|| self.parent_a.entity_id())
            .or_else(|| self.parent_b.entity_id())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A natural person in the entity collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: EntityId,
    #[serde(flatten)]
    pub name: NameParts,
    pub primary_role: Role,
    /// Secondary "badge" roles; never contains a base-role value after
    /// normalization (those collide with the primary-role concept).
    pub badges: Vec<String>,
    /// Present only on Child-role persons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<ChildLink>,
}

/// Shared record shape for charities and corporate fiduciaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Organization {
    pub id: EntityId,
    pub kind: OrganizationKind,
    pub name: String,
    pub purpose: String,
    pub tax_id: String,
    pub address: String,
    pub contact: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationKind {
    #[default]
    Charity,
    CorporateFiduciary,
}

/// Any record in the entity collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Person(Person),
    Charity(Organization),
    CorporateFiduciary(Organization),
}

impl Entity {
    pub fn id(&self) -> &EntityId {
        match self {
            Entity::Person(p) => &p.id,
            Entity::Charity(o) | Entity::CorporateFiduciary(o) => &o.id,
        }
    }

    pub fn as_person(&self) -> Option<&Person> {
        match self {
            Entity::Person(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_organization(&self) -> Option<&Organization> {
        match self {
            Entity::Charity(o) | Entity::CorporateFiduciary(o) => Some(o),
            Entity::Person(_) => None,
        }
    }

    /// Display name: resolved person name, or the organization name.
    pub fn display_name(&self) -> String {
        match self {
            Entity::Person(p) => p.name.display(),
            Entity::Charity(o) | Entity::CorporateFiduciary(o) => o.name.trim().to_string(),
        }
    }
}

// ============================================================================
// Wire form
// ============================================================================

/// The flat record shape persisted by the intake store's "name bank".
///
/// Every field is optional; classification into [`Entity`] variants happens
/// in [`WireEntry::into_entity`]. This is deliberately lossy-tolerant: we
/// accept any bag of fields and normalize, never reject.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub middle: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub middle_enabled: Option<bool>,
    #[serde(default)]
    pub middle_initial_only: bool,
    #[serde(default)]
    pub suffix_enabled: Option<bool>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub primary_role: Option<String>,
    #[serde(default)]
    pub child_relationship: Option<String>,
    /// Wire spelling is "Yes"/"No".
    #[serde(default)]
    pub child_treat_as_bio: Option<String>,
    #[serde(default)]
    pub child_parent_a_id: ParentRef,
    #[serde(default)]
    pub child_parent_b_id: ParentRef,
    /// Legacy single-parent form; migrated into `parent_b` and dropped.
    #[serde(default)]
    pub child_other_parent_id: ParentRef,
    #[serde(default)]
    pub charity_name: String,
    #[serde(default)]
    pub charity_purpose: String,
    #[serde(default, rename = "charityEIN")]
    pub charity_ein: String,
    #[serde(default)]
    pub charity_street: String,
    #[serde(default)]
    pub charity_city: String,
    #[serde(default)]
    pub charity_state: String,
    #[serde(default)]
    pub charity_zip: String,
    #[serde(default)]
    pub charity_phone: String,
    #[serde(default)]
    pub charity_email: String,
}

impl WireEntry {
    /// Classify a wire record into a typed, normalized entity.
    pub fn into_entity(mut self) -> Entity {
        let id = match self.id.take() {
            Some(raw) if !raw.is_empty() => EntityId::new(raw),
            _ => EntityId::fresh(),
        };

        match self.entity_type.as_deref() {
            Some("charity") => Entity::Charity(self.into_organization(id, OrganizationKind::Charity)),
            Some("corporate") => Entity::CorporateFiduciary(
                self.into_organization(id, OrganizationKind::CorporateFiduciary),
            ),
            _ => {
                let badges: Vec<String> =
                    self.roles.iter().filter(|r| !r.is_empty()).cloned().collect();
                let primary_role = self
                    .primary_role
                    .as_deref()
                    .and_then(Role::parse)
                    .or_else(|| badges.iter().find_map(|r| Role::parse(r)))
                    .unwrap_or(Role::Other);

                // Legacy single-parent records carried one field; migrate it.
                let parent_b = if self.child_parent_b_id.is_unset() {
                    self.child_other_parent_id
                } else {
                    self.child_parent_b_id
                };
                let relationship = self
                    .child_relationship
                    .as_deref()
                    .map(parse_relationship)
                    .unwrap_or_default();
                let child = ChildLink {
                    relationship,
                    treat_as_biological: self.child_treat_as_bio.as_deref() != Some("No"),
                    parent_a: self.child_parent_a_id,
                    parent_b,
                };

                normalize(Entity::Person(Person {
                    id,
                    name: NameParts {
                        first: self.first,
                        middle: self.middle,
                        last: self.last,
                        suffix: self.suffix,
                        include_first: true,
                        include_middle: self.middle_enabled,
                        include_last: true,
                        include_suffix: self.suffix_enabled,
                        middle_initial_only: self.middle_initial_only,
                    },
                    primary_role,
                    badges,
                    child: Some(child),
                }))
            }
        }
    }

    fn into_organization(self, id: EntityId, kind: OrganizationKind) -> Organization {
        let address = [
            self.charity_street.trim(),
            self.charity_city.trim(),
            self.charity_state.trim(),
            self.charity_zip.trim(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
        let contact = [self.charity_phone.trim(), self.charity_email.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" / ");
        Organization {
            id,
            kind,
            name: self.charity_name,
            purpose: self.charity_purpose,
            tax_id: self.charity_ein,
            address,
            contact,
        }
    }
}

fn parse_relationship(raw: &str) -> ChildRelationship {
    match raw {
        "Adopted" => ChildRelationship::Adopted,
        "Step-child" => ChildRelationship::StepChild,
        "Conceived with ART" => ChildRelationship::ConceivedWithArt,
        _ => ChildRelationship::Biological,
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize an entity into its canonical form. Idempotent: calling this on
/// an already-normalized record returns an equal value.
///
/// For persons this:
/// - clamps the primary role to the closed set (`Other` fallback),
/// - strips base-role values out of the badge list,
/// - resolves the name include-toggles to concrete booleans,
/// - for Child-role persons, defaults the relationship flags and parent
///   slots (step-children must not default `parent_a` to the client; every
///   other relationship does),
/// - drops the child link entirely for non-child persons.
pub fn normalize(entity: Entity) -> Entity {
    match entity {
        Entity::Person(p) => Entity::Person(normalize_person(p)),
        other => other,
    }
}

fn normalize_person(mut person: Person) -> Person {
    // Badge list: drop empties and anything that names a base role.
    person.badges.retain(|r| !r.is_empty() && Role::parse(r).is_none());

    person.name.include_middle =
        Some(person.name.include_middle.unwrap_or(!person.name.middle.trim().is_empty()));
    person.name.include_suffix =
        Some(person.name.include_suffix.unwrap_or(!person.name.suffix.trim().is_empty()));

    if person.primary_role == Role::Child {
        let mut link = person.child.take().unwrap_or_default();
        if link.relationship == ChildRelationship::Biological {
            link.treat_as_biological = true;
        }
        let is_step = link.relationship == ChildRelationship::StepChild;
        if is_step {
            // The non-client parent is the primary link for step-children.
            if link.parent_a.is_client() {
                link.parent_a = ParentRef::Unset;
            }
        } else if link.parent_a.is_unset() {
            link.parent_a = ParentRef::Client;
        }
        person.child = Some(link);
    } else {
        person.child = None;
    }
    person
}
