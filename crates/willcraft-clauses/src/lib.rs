//! Clause library: per-article catalogs, selection resolution, and the
//! template-hydration boundary.
//!
//! Catalogs are loaded once and frozen ([`ClauseLibrary`]); every resolution
//! function is then a pure projection over the frozen library and an intake
//! snapshot. There are no fatal conditions here: malformed catalogs degrade
//! to empty clause sets, unknown ids pass through or fall back visibly, and
//! ambiguous selections resolve deterministically.

pub mod catalog;
pub mod hydrate;
pub mod resolve;

pub use catalog::{
    Article, ArticleLibrary, ArticleShape, CatalogError, Clause, ClauseId, ClauseKind,
    ClauseLibrary,
};
pub use hydrate::{hydrate_body, TokenMap};
pub use resolve::{
    clauses_for_render, ensure_default_primary_selection, resolve_selection, BondPolicy,
    CompensationPolicy, ExecutorPolicies, IdMode, RenderPolicy, VotingPolicy,
};
