//! Family situation analysis for the will-drafting core.
//!
//! Three pure projections over an intake snapshot:
//!
//! - [`context`]: reduce the entity collection plus the relationship-status
//!   field into a flat flag/count record ([`FamilyContext`]).
//! - [`suggest`]: the decision table mapping a [`FamilyContext`] to a set of
//!   family-article clause ids, plus the "auto-managed" staleness rule that
//!   decides when a persisted selection may be silently replaced.
//! - [`graph`]: partition children into partner-keyed stacks for display and
//!   narrative purposes ([`FamilyGraph`]).

pub mod context;
pub mod graph;
pub mod suggest;

pub use context::FamilyContext;
pub use graph::{ChildNode, FamilyGraph, PartnerKind, PartnerNode, PartnerStack};
pub use suggest::{
    apply_family_suggestion, selection_is_auto_managed, suggest_family_clauses,
    DEFAULT_FAMILY_CLAUSE_ID,
};
