//! The family-article decision table.
//!
//! `suggest_family_clauses` maps a [`FamilyContext`] onto a set of clause
//! ids for the family statement article. The result behaves as an
//! insertion-ordered set: duplicate additions are ignored, and rendering
//! order is the order of first addition. It is never empty; when no rule
//! fires, a single default placeholder id is returned.

use crate::context::FamilyContext;

/// Fallback clause when no decision-table rule fires.
pub const DEFAULT_FAMILY_CLAUSE_ID: &str = "family.statement.default_placeholder";

/// Insertion-ordered, duplicate-insensitive id set.
#[derive(Debug, Default)]
struct IdSet(Vec<String>);

impl IdSet {
    fn add(&mut self, id: &str) {
        if !self.0.iter().any(|existing| existing == id) {
            self.0.push(id.to_string());
        }
    }
}

/// Propose family-article clauses for the given context.
pub fn suggest_family_clauses(ctx: &FamilyContext) -> Vec<String> {
    let mut out = IdSet::default();

    match ctx.relationship.as_str() {
        "widowed" => {
            if ctx.has_client_children {
                out.add("family.statement.widowed_children");
            } else {
                out.add("family.statement.widowed_no_children");
            }
        }
        "divorced" => {
            if ctx.has_client_children {
                if ctx.has_former_spouse {
                    out.add("family.statement.divorced_children_named");
                } else {
                    out.add("family.statement.divorced_children_general");
                }
            } else {
                out.add("family.statement.divorced_no_children");
            }
        }
        "married" => {
            if !ctx.has_client_children && ctx.has_step_children {
                out.add("family.statement.married_stepchildren_only");
                out.add("family.statement.remarried_with_stepchildren");
            } else if !ctx.has_client_children {
                out.add("family.statement.married_no_children");
            } else if ctx.has_prior_children && ctx.has_current_spouse_children {
                if ctx.has_former_spouse {
                    out.add("family.statement.remarried_both");
                } else {
                    out.add("family.statement.remarried_both_general");
                }
            } else if ctx.has_prior_children {
                if ctx.has_former_spouse {
                    out.add("family.statement.remarried_prior_children");
                } else {
                    out.add("family.statement.remarried_prior_children_general");
                }
            } else if ctx.art_children_count > 0
                && ctx.art_children_count == ctx.client_children_count
            {
                out.add("family.statement.married_art_children");
            } else {
                out.add("family.statement.married_children");
            }
        }
        // Single / unmarried / unknown statuses.
        _ => {
            if ctx.has_client_children {
                out.add("family.statement.unmarried_children");
            } else if !ctx.has_step_children {
                out.add("family.statement.unmarried_no_children");
            }
            if ctx.has_adopted_children && !ctx.has_spouse && !ctx.has_partner {
                out.add("family.statement.single_with_adopted_children");
            }
            if ctx.has_partner && ctx.has_client_children {
                out.add("family.statement.unmarried_with_partner_children");
            }
        }
    }

    // Unconditional additions, layered on regardless of the branch above.
    if ctx.relationship == "married" && ctx.has_step_children {
        out.add("family.statement.remarried_with_stepchildren");
    }
    if ctx.has_partner && ctx.relationship != "married" {
        out.add("family.statement.partner_cohabitation_disclaimer");
        out.add("family.statement.de_facto_relationship");
    }
    if ctx.has_former_spouse {
        out.add("family.statement.former_spouse_disclaimer");
    }
    if ctx.has_prior_children {
        out.add("family.statement.children_from_prior_relationships");
    }
    if ctx.relationship != "married" && ctx.has_client_children && ctx.has_guardian {
        out.add("family.statement.unmarried_with_named_guardian");
    }
    if ctx.relationship == "married" && ctx.has_prior_children && ctx.has_adopted_children {
        out.add("family.statement.remarried_prior_children_adopted");
    }

    if out.0.is_empty() {
        out.add(DEFAULT_FAMILY_CLAUSE_ID);
    }
    out.0
}

/// Whether a persisted family selection is still "auto-managed", i.e.
/// eligible for silent replacement by a fresh suggestion: empty, the lone
/// default placeholder, or exactly the prior suggestion set
/// (order-insensitive).
///
/// Known quirk, kept deliberately: a user who manually selects exactly the
/// set the engine would have suggested is indistinguishable from an
/// auto-managed selection and will be silently updated later.
pub fn selection_is_auto_managed(selection: &[String], prior_suggestion: &[String]) -> bool {
    if selection.is_empty() {
        return true;
    }
    if selection.len() == 1 && selection[0] == DEFAULT_FAMILY_CLAUSE_ID {
        return true;
    }
    same_set(selection, prior_suggestion)
}

/// Propose the next family selection after an intake change: `Some(next)`
/// when the stored selection is auto-managed and the fresh suggestion
/// differs, `None` when the stored value must be left untouched. The caller
/// owns the store and commits the returned value.
pub fn apply_family_suggestion(
    stored: &[String],
    prior_suggestion: &[String],
    fresh_suggestion: &[String],
) -> Option<Vec<String>> {
    if !selection_is_auto_managed(stored, prior_suggestion) {
        return None;
    }
    if same_set(stored, fresh_suggestion) {
        return None;
    }
    Some(fresh_suggestion.to_vec())
}

fn same_set(a: &[String], b: &[String]) -> bool {
    // Compare sorted copies so duplicate entries cannot mask a mismatch.
    let mut a: Vec<&String> = a.iter().collect();
    let mut b: Vec<&String> = b.iter().collect();
    a.sort();
    b.sort();
    a == b
}
