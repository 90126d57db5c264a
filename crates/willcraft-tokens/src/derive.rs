//! Token derivation from an intake snapshot.
//!
//! Every token resolves through the same precedence: an explicit override
//! field on the intake, then a stored entity-reference lookup, then a
//! role-derived fallback, then a static default. The result is one flat
//! string map the hydrator substitutes into clause bodies.

use serde_json::Value;
use std::collections::BTreeMap;
use willcraft_model::{middle_initial, ChildRelationship, Entity, EntityId, Intake, Person, Role};

use crate::format;

/// Token name to rendered text.
pub type TokenMap = BTreeMap<String, String>;

/// Placeholder shown for a backup-charity slot with no charity chosen.
pub const SELECT_CHARITY_MARKER: &str = "[SELECT CHARITY]";

// Zero-width space: keeps an optional narrative token from rendering as a
// literal placeholder when there is nothing to say.
const BLANK: &str = "\u{200B}";

// Sentinel the select widgets store before a real choice is made.
const UNSELECTED: &str = "— Select —";

/// Static defaults, applied before intake fields and derived values.
/// Identity fields default to their literal placeholder so gaps stay
/// visible in the rendered document.
const DEFAULTS: &[(&str, &str)] = &[
    ("ClientFullName", "[[ClientFullName]]"),
    ("ClientAddressInline", "[[ClientAddressInline]]"),
    ("ClientCity", "[[ClientCity]]"),
    ("City", "[[City]]"),
    ("DomicileCounty", "[[DomicileCounty]]"),
    ("County", "[[County]]"),
    ("DomicileState", "[[DomicileState]]"),
    ("State", "[[State]]"),
    ("ClientZip", "[[ClientZip]]"),
    ("ZipCode", "[[ZipCode]]"),
    ("PartnerFullName", ""),
    ("FormerSpouseFullName", ""),
    ("GuardianName", "[[GuardianName]]"),
    ("RelationshipStatusDescriptor", "single"),
    ("SpousePartnerTerm", "spouse"),
    ("SpousePartnerFullName", "my spouse"),
    ("MinorTrustAge", "25"),
    ("Age1", "25"),
    ("Age2", "30"),
    ("Age3", "35"),
    ("EducationAge", "23"),
    ("DollarThreshold", "$5,000"),
    ("DollarAmount", "$1,000"),
    ("TrusteeName", "[[TrusteeName]]"),
    ("AlternateTrusteeList", ""),
    ("RemainderBeneficiary", "my heirs-at-law"),
    ("AlternateGuardianList", ""),
    ("VenueCounty", ""),
    ("VenueState", ""),
];

/// Derive the full token map for a snapshot.
pub fn derive_tokens(intake: &Intake) -> TokenMap {
    let mut tokens: TokenMap = DEFAULTS
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();

    // Scalar intake fields pass straight through as tokens; everything
    // derived below overrides them.
    for (key, value) in intake.fields() {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        tokens.insert(key.to_string(), text);
    }

    let mut set = |key: &str, value: String| {
        tokens.insert(key.to_string(), value);
    };

    // ------------------------------------------------------------------
    // Client identity
    // ------------------------------------------------------------------
    let client = intake.client_person();
    let full = client.name.display();
    let include_middle = intake.flag("ClientMiddleToggle");
    let middle_raw = intake.text("ClientMiddleName");
    let middle_applied = if include_middle { middle_raw } else { "" };
    let middle_formatted = if include_middle {
        if intake.flag("ClientMiddleInitialOnly") {
            middle_initial(middle_raw)
        } else {
            middle_raw.to_string()
        }
    } else {
        String::new()
    };
    let suffix_applied = if intake.flag("ClientSuffixToggle") {
        intake.text("ClientSuffix")
    } else {
        ""
    };

    set("ClientMiddleName", middle_applied.to_string());
    set("ClientMiddleNameFormatted", middle_formatted);
    set("ClientSuffix", suffix_applied.to_string());
    if !full.is_empty() {
        set("ClientFullName", full.clone());
        set("TestatorFullName", full.clone());
    } else {
        set("TestatorFullName", "[[ClientFullName]]".to_string());
    }

    let city = intake.text("ClientCity");
    let county = intake.text("DomicileCounty");
    let state = intake.text("DomicileState");
    let zip = intake.text("ClientZip");
    let address: Vec<&str> = [intake.text("ClientStreet1"), intake.text("ClientStreet2"), city]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    if !address.is_empty() {
        set("ClientAddressInline", address.join(", "));
    }
    if !city.is_empty() {
        set("ClientCity", city.to_string());
        set("City", city.to_string());
    }
    if !county.is_empty() {
        set("DomicileCounty", county.to_string());
        set("County", county.to_string());
    }
    if !state.is_empty() {
        set("DomicileState", state.to_string());
        set("State", state.to_string());
    }
    if !zip.is_empty() {
        set("ClientZip", zip.to_string());
        set("ZipCode", zip.to_string());
    }
    let id_mode = intake.text("IdMode");
    set(
        "idMode",
        if id_mode.is_empty() {
            "simple".to_string()
        } else {
            id_mode.to_lowercase()
        },
    );

    // ------------------------------------------------------------------
    // Family
    // ------------------------------------------------------------------
    let spouses = intake.people_with_role(Role::Spouse);
    let partners = intake.people_with_role(Role::Partner);
    let former_spouses = intake.people_with_role(Role::FormerSpouse);
    let children = intake.people_with_role(Role::Child);
    let disinherited = intake.people_with_role(Role::Disinherited);

    fn relationship(p: &Person) -> ChildRelationship {
        p.child
            .as_ref()
            .map(|link| link.relationship)
            .unwrap_or(ChildRelationship::Biological)
    }
    let step_children: Vec<&Person> = children
        .iter()
        .copied()
        .filter(|p| relationship(p) == ChildRelationship::StepChild)
        .collect();
    let adopted_children: Vec<&Person> = children
        .iter()
        .copied()
        .filter(|p| relationship(p) == ChildRelationship::Adopted)
        .collect();
    let art_children: Vec<&Person> = children
        .iter()
        .copied()
        .filter(|p| relationship(p) == ChildRelationship::ConceivedWithArt)
        .collect();
    let client_children: Vec<&Person> = children
        .iter()
        .copied()
        .filter(|p| relationship(p) != ChildRelationship::StepChild)
        .collect();

    let spouse_record = spouses.first();
    let spouse_id = spouse_record.map(|p| &p.id);
    let spouse_name = spouse_record
        .map(|p| p.name.display())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "my spouse".to_string());
    let partner_name = partners
        .first()
        .map(|p| p.name.display())
        .filter(|n| !n.is_empty())
        .unwrap_or_default();
    let former_spouse_name = former_spouses
        .first()
        .map(|p| p.name.display())
        .filter(|n| !n.is_empty())
        .unwrap_or_default();

    // Children with a client parent whose other parent is a stored entity.
    // Other parent == current spouse splits them from prior-relationship
    // children.
    fn other_parent_of(p: &Person) -> Option<&EntityId> {
        let link = p.child.as_ref()?;
        if !link.parent_a.is_client() && !link.parent_b.is_client() {
            return None;
        }
        link.other_parent_id()
    }
    let prior_children: Vec<&Person> = client_children
        .iter()
        .copied()
        .filter(|p| match other_parent_of(p) {
            Some(other) => Some(other) != spouse_id,
            None => false,
        })
        .collect();
    let current_spouse_children: Vec<&Person> = client_children
        .iter()
        .copied()
        .filter(|p| spouse_id.is_some() && other_parent_of(p) == spouse_id)
        .collect();

    let mut other_parent_ids: Vec<EntityId> = Vec::new();
    for child in &prior_children {
        if let Some(id) = other_parent_of(child).cloned() {
            if !other_parent_ids.contains(&id) {
                other_parent_ids.push(id);
            }
        }
    }
    let other_parent_names: Vec<String> = other_parent_ids
        .iter()
        .map(|id| {
            intake
                .name_of(id)
                .unwrap_or_else(|| "Unknown parent".to_string())
        })
        .collect();

    let names = |records: &[&Person]| -> Vec<String> {
        records
            .iter()
            .map(|p| p.name.display())
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    };

    let client_child_names = names(&client_children);
    let children_text = if client_child_names.is_empty() {
        "my children".to_string()
    } else {
        format::inline_with_and(&client_child_names)
    };
    let children_bullet = format::bullet(&client_child_names);
    let art_bullet = format::bullet(&names(&art_children));
    // When every client child is ART-conceived the ART list stands in for
    // the general one.
    let selected_children_list =
        if !art_children.is_empty() && art_children.len() == client_children.len() {
            art_bullet.clone()
        } else {
            children_bullet.clone()
        };
    let current_children_bullet = format::bullet(&names(&current_spouse_children));

    set("SpouseFullName", spouse_name.clone());
    if !partner_name.is_empty() {
        set("PartnerFullName", partner_name.clone());
    }
    if !former_spouse_name.is_empty() {
        set("FormerSpouseFullName", former_spouse_name);
    }
    set(
        "ChildrenList",
        if selected_children_list.is_empty() {
            children_text.clone()
        } else {
            selected_children_list.clone()
        },
    );
    set("ChildrenListInline", children_text.clone());
    set("StepchildrenList", format::bullet(&names(&step_children)));
    set("StepchildrenListInline", format::inline(&names(&step_children)));
    set("PriorChildrenList", format::bullet(&names(&prior_children)));
    set("OtherParentNamesList", with_annotation(&other_parent_names));
    set("AdoptedChildrenList", format::bullet(&names(&adopted_children)));
    set(
        "CurrentChildrenList",
        if current_children_bullet.is_empty() {
            selected_children_list
        } else {
            current_children_bullet
        },
    );
    set(
        "GuardianName",
        person_name(intake, "GuardianName", Role::Guardian, 0, "[[GuardianName]]"),
    );
    set(
        "DisinheritedPersonName",
        disinherited
            .first()
            .map(|p| p.name.display())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "None".to_string()),
    );

    let status = intake.relationship_status();
    set(
        "RelationshipStatusDescriptor",
        if status.is_empty() {
            "single".to_string()
        } else {
            status
        },
    );
    set(
        "SpousePartnerTerm",
        if spouse_record.is_some() {
            "spouse".to_string()
        } else if !partner_name.is_empty() {
            "partner".to_string()
        } else {
            "spouse".to_string()
        },
    );
    set(
        "SpousePartnerFullName",
        if spouse_record.is_some() {
            spouse_name.clone()
        } else if !partner_name.is_empty() {
            partner_name
        } else {
            "my spouse".to_string()
        },
    );

    // ------------------------------------------------------------------
    // Charities and alternate beneficiaries
    // ------------------------------------------------------------------
    set("CharityName", charity_name(intake));
    set("BackupCharitiesList", backup_charities(intake));
    set("AlternateBeneficiaries", alternate_beneficiaries(intake));
    set("AlternateSharesClause", String::new());

    // ------------------------------------------------------------------
    // Executors
    // ------------------------------------------------------------------
    let primary_executor = person_name(intake, "PrimaryExecutor", Role::Executor, 0, &spouse_name);
    set("PrimaryExecutorName", primary_executor.clone());
    set(
        "AlternateExecutorName",
        person_name(intake, "AlternateExecutor", Role::Executor, 1, &children_text),
    );

    let alternate_executors: Vec<String> = intake
        .entries("AlternateExecutors")
        .iter()
        .map(|entry| entry_person_name(intake, entry, "personId").unwrap_or_default())
        .collect();
    let first_alternate = alternate_executors.first().cloned().unwrap_or_default();
    set("ExecutorAlternate1", first_alternate.clone());
    set(
        "ExecutorAlternate1Clause",
        if first_alternate.is_empty() {
            BLANK.to_string()
        } else {
            format!(
                "\n\nIf {primary_executor} does not qualify or ceases to serve, \
                 I nominate {first_alternate} to serve as Executor of this Will."
            )
        },
    );
    let later_alternates: Vec<String> = alternate_executors
        .iter()
        .skip(1)
        .filter(|n| !n.is_empty())
        .cloned()
        .collect();
    set(
        "ExecutorAlternateListClause",
        if first_alternate.is_empty() || later_alternates.is_empty() {
            BLANK.to_string()
        } else {
            format!(
                "\n\nIf neither {primary_executor} nor {first_alternate} qualify or cease \
                 to serve, I nominate {} to serve in the order named.",
                later_alternates.join(", then ")
            )
        },
    );

    // ------------------------------------------------------------------
    // Fiduciaries, guardianship, trusts
    // ------------------------------------------------------------------
    set("CorporateFiduciaryName", corporate_fiduciary(intake));
    set(
        "MinorGuardianPrimaryName",
        person_name(intake, "MinorGuardianPrimary", Role::Guardian, 0, ""),
    );
    set(
        "MinorGuardianAlternateName",
        person_name(intake, "MinorGuardianAlternate", Role::Guardian, 1, ""),
    );
    set(
        "UTMACustodianName",
        person_name(intake, "UTMACustodian", Role::Trustee, 0, ""),
    );
    set(
        "PetCaretakerName",
        person_name(intake, "PetCaretaker", Role::Other, 0, ""),
    );

    for (token, default) in [
        ("MinorTrustAge", "25"),
        ("Age1", "25"),
        ("Age2", "30"),
        ("Age3", "35"),
        ("EducationAge", "23"),
    ] {
        let raw = intake.text_or_number(token);
        set(token, if raw.is_empty() { default.to_string() } else { raw });
    }
    set(
        "DollarThreshold",
        dollar_amount(intake, "DollarThreshold", "$5,000"),
    );
    set("DollarAmount", dollar_amount(intake, "DollarAmount", "$1,000"));

    set("TrusteeName", trustee_name(intake));
    set(
        "AlternateTrusteeList",
        role_tail_list(
            intake,
            "AlternateTrusteeListOverride",
            "AlternateTrusteeList",
            Role::Trustee,
        ),
    );
    set("RemainderBeneficiary", remainder_beneficiary(intake));
    set(
        "AlternateGuardianList",
        role_tail_list(
            intake,
            "AlternateGuardianListOverride",
            "AlternateGuardianList",
            Role::Guardian,
        ),
    );
    set(
        "SuccessorTrusteeName",
        person_name(intake, "SuccessorTrustee", Role::Trustee, 0, "Corporate Trustee LLC"),
    );

    // ------------------------------------------------------------------
    // Beneficiaries and witnesses
    // ------------------------------------------------------------------
    set(
        "PrimaryBeneficiaryName",
        person_name(intake, "PrimaryBeneficiary", Role::Beneficiary, 0, &spouse_name),
    );
    set(
        "ContingentBeneficiaryName",
        person_name(intake, "ContingentBeneficiary", Role::Beneficiary, 1, &children_text),
    );
    set(
        "UltimateBeneficiary",
        person_name(intake, "UltimateBeneficiary", Role::Beneficiary, 2, "United Way"),
    );
    set(
        "DefaultTangibleBeneficiary",
        person_name(intake, "DefaultTangibleBeneficiary", Role::Beneficiary, 0, &spouse_name),
    );
    set(
        "PersonalEffectsBeneficiaries",
        person_name(intake, "PersonalEffectsBeneficiaries", Role::Beneficiary, 0, &children_text),
    );
    set(
        "DigitalAssetsBeneficiary",
        person_name(intake, "DigitalAssetsBeneficiary", Role::Beneficiary, 0, &spouse_name),
    );
    set(
        "BeneficiaryName",
        person_name(intake, "GiftBeneficiary", Role::Beneficiary, 0, ""),
    );
    set(
        "WitnessOneName",
        person_name(intake, "WitnessOne", Role::Witness, 0, "Witness One"),
    );
    set(
        "WitnessTwoName",
        person_name(intake, "WitnessTwo", Role::Witness, 1, "Witness Two"),
    );

    // ------------------------------------------------------------------
    // Venue
    // ------------------------------------------------------------------
    let probate_county = non_empty(intake.text("CountyForProbate")).unwrap_or(county);
    let governing_state = non_empty(intake.text("GoverningState")).unwrap_or(state);
    set(
        "CountyForProbate",
        if probate_county.is_empty() {
            "[[DomicileCounty]]".to_string()
        } else {
            probate_county.to_string()
        },
    );
    set(
        "GoverningState",
        if governing_state.is_empty() {
            "[[DomicileState]]".to_string()
        } else {
            governing_state.to_string()
        },
    );
    set(
        "VenueCounty",
        non_empty(intake.text("VenueCounty"))
            .or(non_empty(probate_county))
            .map(str::to_string)
            .unwrap_or_else(|| "[[DomicileCounty]]".to_string()),
    );
    set(
        "VenueState",
        non_empty(intake.text("VenueState"))
            .or(non_empty(governing_state))
            .map(str::to_string)
            .unwrap_or_else(|| "[[DomicileState]]".to_string()),
    );

    drop(set);
    tokens
}

// ============================================================================
// Resolution helpers
// ============================================================================

fn non_empty(text: &str) -> Option<&str> {
    (!text.is_empty()).then_some(text)
}

/// Override field, else the nth person with the role, else the fallback.
fn person_name(intake: &Intake, field: &str, role: Role, index: usize, fallback: &str) -> String {
    let manual = intake.text(field);
    if !manual.is_empty() && manual != UNSELECTED {
        return manual.to_string();
    }
    intake
        .people_with_role(role)
        .get(index)
        .map(|p| p.name.display())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Resolve an id field inside a list-of-objects entry to a bank name.
/// `None` when the slot is unselected or the id matches nothing; a stored
/// entity with an empty name resolves to a visible placeholder name.
fn entry_person_name(intake: &Intake, entry: &Value, key: &str) -> Option<String> {
    let id = entry.get(key)?.as_str()?;
    if id.is_empty() {
        return None;
    }
    let entity = intake.entity_by_id(&EntityId::new(id))?;
    let name = entity.display_name();
    Some(if name.is_empty() {
        "Unnamed Person".to_string()
    } else {
        name
    })
}

/// `" (with A)"` / `" (with A, and B)"` annotation for other-parent names.
fn with_annotation(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => format!(" (with {only})"),
        _ => format!(
            " (with {}, and {})",
            names[..names.len() - 1].join(", "),
            names[names.len() - 1]
        ),
    }
}

fn charity_name(intake: &Intake) -> String {
    match non_empty(intake.text("ResiduaryCharity")) {
        Some(id) => match intake.entity_by_id(&EntityId::new(id)) {
            Some(entity) => {
                let name = entity.display_name();
                if name.is_empty() {
                    "Unnamed Charity".to_string()
                } else {
                    name
                }
            }
            None => "[[CharityName]]".to_string(),
        },
        None => "[[CharityName]]".to_string(),
    }
}

fn backup_charities(intake: &Intake) -> String {
    let entries = intake.entries("BackupCharities");
    if entries.is_empty() {
        return "[[BackupCharitiesList]]".to_string();
    }
    let total = entries.len();
    let items: Vec<String> = entries
        .iter()
        .map(|entry| {
            let percent = entry
                .get("percentage")
                .and_then(|v| match v {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                })
                .map(|p| format!(" {}", format::charity_share(p, total)))
                .unwrap_or_default();
            let name = match entry.get("charityId").and_then(Value::as_str) {
                Some(id) if !id.is_empty() => match intake.entity_by_id(&EntityId::new(id)) {
                    Some(entity) => {
                        let name = entity.display_name();
                        if name.is_empty() {
                            "Unnamed Charity".to_string()
                        } else {
                            name
                        }
                    }
                    None => "Unknown Charity".to_string(),
                },
                _ => SELECT_CHARITY_MARKER.to_string(),
            };
            format!("{name}{percent}")
        })
        .collect();
    items.join("; ")
}

fn alternate_beneficiaries(intake: &Intake) -> String {
    let names: Vec<String> = intake
        .entries("AlternateBeneficiaries")
        .iter()
        .filter_map(|entry| entry_person_name(intake, entry, "personId"))
        .collect();
    match names.as_slice() {
        [] => "[[AlternateBeneficiaries]]".to_string(),
        [only] => only.clone(),
        _ => format!(
            "{} & {}, in equal shares",
            names[..names.len() - 1].join(", "),
            names[names.len() - 1]
        ),
    }
}

fn corporate_fiduciary(intake: &Intake) -> String {
    match non_empty(intake.text("CorporateFiduciaryName")) {
        Some(id) => match intake.entity_by_id(&EntityId::new(id)) {
            Some(entity) => {
                let name = entity.display_name();
                if name.is_empty() {
                    "Unnamed Corporate Fiduciary".to_string()
                } else {
                    name
                }
            }
            None => "[[CorporateFiduciaryName]]".to_string(),
        },
        None => "[[CorporateFiduciaryName]]".to_string(),
    }
}

fn dollar_amount(intake: &Intake, field: &str, default: &str) -> String {
    let raw = intake.text_or_number(field);
    if raw.is_empty() {
        default.to_string()
    } else if raw.starts_with('$') {
        raw
    } else {
        format!("${raw}")
    }
}

fn trustee_name(intake: &Intake) -> String {
    if let Some(manual) =
        non_empty(intake.text("TrusteeNameManual")).or(non_empty(intake.text("TrusteeName")))
    {
        return manual.to_string();
    }
    if let Some(id) = non_empty(intake.text("TrusteeNameSelection")) {
        if let Some(name) = intake.name_of(&EntityId::new(id)) {
            return name;
        }
    }
    intake
        .people_with_role(Role::Trustee)
        .first()
        .map(|p| p.name.display())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "[[TrusteeName]]".to_string())
}

/// Override text, else the stored name list, else every role holder after
/// the first, comma-joined.
fn role_tail_list(intake: &Intake, override_field: &str, list_field: &str, role: Role) -> String {
    if let Some(manual) = non_empty(intake.text(override_field)) {
        return manual.to_string();
    }
    let stored = intake.string_list(list_field);
    if !stored.is_empty() {
        return stored.join(", ");
    }
    let tail: Vec<String> = intake
        .people_with_role(role)
        .iter()
        .skip(1)
        .map(|p| p.name.display())
        .filter(|n| !n.is_empty())
        .collect();
    tail.join(", ")
}

fn remainder_beneficiary(intake: &Intake) -> String {
    if let Some(manual) = non_empty(intake.text("RemainderBeneficiaryManual"))
        .or(non_empty(intake.text("RemainderBeneficiary")))
    {
        return manual.to_string();
    }
    if let Some(id) = non_empty(intake.text("RemainderBeneficiarySelection")) {
        if let Some(name) = intake.name_of(&EntityId::new(id)) {
            return name;
        }
    }
    if let Some(id) = non_empty(intake.text("ResiduaryCharity")) {
        if let Some(org) = intake
            .entity_by_id(&EntityId::new(id))
            .and_then(Entity::as_organization)
        {
            if !org.name.is_empty() {
                return org.name.clone();
            }
        }
    }
    "my heirs-at-law".to_string()
}
