//! Derived document tokens.
//!
//! A single pass over an intake snapshot produces the flat `[[Token]]` map
//! clause bodies hydrate from. Derivation is pure and total: missing input
//! falls through the precedence chain to a role-derived name or a static
//! default, never to an error.

pub mod derive;
pub mod format;

pub use derive::{derive_tokens, TokenMap, SELECT_CHARITY_MARKER};
pub use format::{bullet, charity_share, inline, inline_with_and};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use willcraft_model::Intake;

    fn intake(value: serde_json::Value) -> Intake {
        Intake::from_value(value)
    }

    #[test]
    fn client_name_applies_the_middle_initial_rule() {
        let snapshot = intake(json!({
            "ClientFirstName": "Avery",
            "ClientMiddleName": "quinn",
            "ClientMiddleToggle": true,
            "ClientMiddleInitialOnly": true,
            "ClientLastName": "Hale",
            "ClientSuffix": "Jr.",
            "ClientSuffixToggle": false
        }));
        let tokens = derive_tokens(&snapshot);
        assert_eq!(tokens["ClientFullName"], "Avery Q. Hale");
        assert_eq!(tokens["TestatorFullName"], "Avery Q. Hale");
        assert_eq!(tokens["ClientMiddleNameFormatted"], "Q.");
        assert_eq!(tokens["ClientSuffix"], "");
    }

    #[test]
    fn missing_identity_keeps_the_placeholder_visible() {
        let tokens = derive_tokens(&intake(json!({})));
        assert_eq!(tokens["ClientFullName"], "[[ClientFullName]]");
        assert_eq!(tokens["CharityName"], "[[CharityName]]");
        assert_eq!(tokens["BackupCharitiesList"], "[[BackupCharitiesList]]");
    }

    #[test]
    fn precedence_prefers_override_then_role_then_default() {
        let bank = json!([
            { "id": "w1", "first": "Jo", "last": "Park", "roles": ["Witness"] }
        ]);
        let with_override = intake(json!({
            "NameBank": bank,
            "WitnessOne": "Custom Witness"
        }));
        assert_eq!(
            derive_tokens(&with_override)["WitnessOneName"],
            "Custom Witness"
        );

        let from_role = intake(json!({ "NameBank": bank }));
        let tokens = derive_tokens(&from_role);
        assert_eq!(tokens["WitnessOneName"], "Jo Park");
        // No second witness in the bank: static default.
        assert_eq!(tokens["WitnessTwoName"], "Witness Two");
    }

    #[test]
    fn spouse_and_children_fallbacks_read_like_prose() {
        let tokens = derive_tokens(&intake(json!({})));
        assert_eq!(tokens["SpouseFullName"], "my spouse");
        assert_eq!(tokens["ChildrenListInline"], "my children");
        assert_eq!(tokens["PrimaryExecutorName"], "my spouse");
        assert_eq!(tokens["AlternateExecutorName"], "my children");
    }

    #[test]
    fn children_lists_format_inline_and_bulleted() {
        let snapshot = intake(json!({
            "NameBank": [
                { "id": "k1", "first": "Ada", "last": "Hale", "roles": ["Child"],
                  "childRelationship": "Biological", "childParentAId": "__CLIENT__" },
                { "id": "k2", "first": "Ben", "last": "Hale", "roles": ["Child"],
                  "childRelationship": "Biological", "childParentAId": "__CLIENT__" },
                { "id": "k3", "first": "Cal", "last": "Voss", "roles": ["Child"],
                  "childRelationship": "Step-child", "childParentAId": "sp1" }
            ]
        }));
        let tokens = derive_tokens(&snapshot);
        assert_eq!(tokens["ChildrenListInline"], "Ada Hale and Ben Hale");
        assert_eq!(tokens["ChildrenList"], "\n- Ada Hale\n- Ben Hale");
        assert_eq!(tokens["StepchildrenListInline"], "Cal Voss");
    }

    #[test]
    fn prior_children_carry_the_other_parent_annotation() {
        let snapshot = intake(json!({
            "NameBank": [
                { "id": "sp", "first": "Morgan", "last": "Hale", "roles": ["Spouse"] },
                { "id": "ex", "first": "Riley", "last": "Nash", "roles": ["Former Spouse"] },
                { "id": "k1", "first": "Ada", "last": "Hale", "roles": ["Child"],
                  "childRelationship": "Biological",
                  "childParentAId": "__CLIENT__", "childParentBId": "ex" },
                { "id": "k2", "first": "Ben", "last": "Hale", "roles": ["Child"],
                  "childRelationship": "Biological",
                  "childParentAId": "__CLIENT__", "childParentBId": "sp" }
            ]
        }));
        let tokens = derive_tokens(&snapshot);
        assert_eq!(tokens["PriorChildrenList"], "\n- Ada Hale");
        assert_eq!(tokens["CurrentChildrenList"], "\n- Ben Hale");
        assert_eq!(tokens["OtherParentNamesList"], " (with Riley Nash)");
    }

    #[test]
    fn three_backup_charities_display_thirds() {
        let snapshot = intake(json!({
            "NameBank": [
                { "id": "c1", "entityType": "charity", "charityName": "River Fund" },
                { "id": "c2", "entityType": "charity", "charityName": "Open Shelf" },
                { "id": "c3", "entityType": "charity", "charityName": "Northlight" }
            ],
            "BackupCharities": [
                { "charityId": "c1", "percentage": "33.33" },
                { "charityId": "c2", "percentage": "33.33" },
                { "charityId": "c3", "percentage": "33.34" }
            ]
        }));
        let tokens = derive_tokens(&snapshot);
        assert_eq!(
            tokens["BackupCharitiesList"],
            "River Fund (1/3); Open Shelf (1/3); Northlight (1/3)"
        );
    }

    #[test]
    fn unselected_backup_slot_renders_the_marker() {
        let snapshot = intake(json!({
            "NameBank": [
                { "id": "c1", "entityType": "charity", "charityName": "River Fund" }
            ],
            "BackupCharities": [
                { "charityId": "c1", "percentage": 50 },
                { "charityId": "", "percentage": 50 }
            ]
        }));
        let tokens = derive_tokens(&snapshot);
        assert_eq!(
            tokens["BackupCharitiesList"],
            "River Fund (50%); [SELECT CHARITY] (50%)"
        );
    }

    #[test]
    fn alternate_beneficiaries_share_equally() {
        let snapshot = intake(json!({
            "NameBank": [
                { "id": "p1", "first": "Ada", "last": "Hale", "roles": ["Beneficiary"] },
                { "id": "p2", "first": "Ben", "last": "Hale", "roles": ["Beneficiary"] },
                { "id": "p3", "first": "Cal", "last": "Hale", "roles": ["Beneficiary"] }
            ],
            "AlternateBeneficiaries": [
                { "personId": "p1" }, { "personId": "p2" }, { "personId": "p3" }
            ]
        }));
        let tokens = derive_tokens(&snapshot);
        assert_eq!(
            tokens["AlternateBeneficiaries"],
            "Ada Hale, Ben Hale & Cal Hale, in equal shares"
        );
    }

    #[test]
    fn executor_alternate_clauses_build_narratives() {
        let snapshot = intake(json!({
            "NameBank": [
                { "id": "e1", "first": "Morgan", "last": "Hale", "roles": ["Executor"] },
                { "id": "e2", "first": "Riley", "last": "Nash", "roles": ["Executor"] },
                { "id": "e3", "first": "Sam", "last": "Oda", "roles": ["Executor"] }
            ],
            "AlternateExecutors": [
                { "personId": "e2" }, { "personId": "e3" }
            ]
        }));
        let tokens = derive_tokens(&snapshot);
        assert_eq!(tokens["PrimaryExecutorName"], "Morgan Hale");
        assert_eq!(tokens["ExecutorAlternate1"], "Riley Nash");
        assert!(tokens["ExecutorAlternate1Clause"]
            .contains("If Morgan Hale does not qualify or ceases to serve, I nominate Riley Nash"));
        assert!(tokens["ExecutorAlternateListClause"]
            .contains("If neither Morgan Hale nor Riley Nash qualify or cease to serve, I nominate Sam Oda"));
    }

    #[test]
    fn empty_alternates_render_invisibly() {
        let tokens = derive_tokens(&intake(json!({})));
        assert_eq!(tokens["ExecutorAlternate1Clause"], "\u{200B}");
        assert_eq!(tokens["ExecutorAlternateListClause"], "\u{200B}");
    }

    #[test]
    fn dollar_fields_gain_a_currency_prefix() {
        let snapshot = intake(json!({ "DollarThreshold": "7500", "DollarAmount": "$250" }));
        let tokens = derive_tokens(&snapshot);
        assert_eq!(tokens["DollarThreshold"], "$7500");
        assert_eq!(tokens["DollarAmount"], "$250");
    }

    #[test]
    fn venue_falls_back_through_probate_then_domicile() {
        let snapshot = intake(json!({ "DomicileCounty": "Lane", "DomicileState": "Oregon" }));
        let tokens = derive_tokens(&snapshot);
        assert_eq!(tokens["CountyForProbate"], "Lane");
        assert_eq!(tokens["VenueCounty"], "Lane");
        assert_eq!(tokens["GoverningState"], "Oregon");
        assert_eq!(tokens["VenueState"], "Oregon");

        let explicit = intake(json!({
            "DomicileCounty": "Lane",
            "CountyForProbate": "Marion",
            "VenueState": "Washington"
        }));
        let tokens = derive_tokens(&explicit);
        assert_eq!(tokens["VenueCounty"], "Marion");
        assert_eq!(tokens["VenueState"], "Washington");
    }

    #[test]
    fn trustee_resolution_walks_the_precedence_chain() {
        let bank = json!([
            { "id": "t1", "first": "Jo", "last": "Park", "roles": ["Trustee"] },
            { "id": "t2", "first": "Ann", "last": "Roy", "roles": ["Trustee"] }
        ]);
        let manual = intake(json!({ "NameBank": bank, "TrusteeNameManual": "Custom Trustee" }));
        assert_eq!(derive_tokens(&manual)["TrusteeName"], "Custom Trustee");

        let by_selection = intake(json!({ "NameBank": bank, "TrusteeNameSelection": "t2" }));
        assert_eq!(derive_tokens(&by_selection)["TrusteeName"], "Ann Roy");

        let by_role = intake(json!({ "NameBank": bank }));
        let tokens = derive_tokens(&by_role);
        assert_eq!(tokens["TrusteeName"], "Jo Park");
        assert_eq!(tokens["AlternateTrusteeList"], "Ann Roy");
    }
}
