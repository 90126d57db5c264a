//! Selection resolution and render assembly.
//!
//! Every function here is a pure projection over a frozen [`ArticleLibrary`]
//! and an immutable selection list; nothing mutates stored state. Callers
//! decide whether to commit a proposed selection returned by
//! [`ensure_default_primary_selection`].

use crate::catalog::{Article, ArticleLibrary, ArticleShape, Clause, ClauseId, ClauseKind};
use ahash::AHashSet;
use willcraft_model::{Intake, SelectionState};

// Fixed ids the testator article keys its declaration switches on.
const WILL_TITLE_PREFIX: &str = "testator.declaration.will_title";
const WILL_TITLE_SIMPLE: &str = "testator.declaration.will_title_simple";
const WILL_TITLE_EXPANDED: &str = "testator.declaration.will_title_expanded";
const REVOCATION: &str = "testator.revocation.prior_wills";
const CAPACITY: &str = "testator.intent.independence";

// ============================================================================
// Policies
// ============================================================================

/// Testator identification style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdMode {
    #[default]
    Simple,
    Expanded,
}

/// Bond treatment for executors; each variant maps to a fixed clause id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondPolicy {
    #[default]
    Waived,
    Required,
    CourtDiscretion,
}

impl BondPolicy {
    fn clause_id(self) -> &'static str {
        match self {
            BondPolicy::Waived => "exec.bond.waived",
            BondPolicy::Required => "exec.bond.required",
            BondPolicy::CourtDiscretion => "exec.bond.court_discretion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompensationPolicy {
    #[default]
    Allowed,
    Waived,
}

impl CompensationPolicy {
    fn clause_id(self) -> &'static str {
        match self {
            CompensationPolicy::Allowed => "exec.compensation.allowed",
            CompensationPolicy::Waived => "exec.compensation.waived",
        }
    }
}

/// How co-executors act when more than one serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VotingPolicy {
    #[default]
    Majority,
    Unanimous,
    Independent,
}

impl VotingPolicy {
    fn clause_id(self) -> &'static str {
        match self {
            VotingPolicy::Majority => "exec.voting.majority",
            VotingPolicy::Unanimous => "exec.voting.unanimous",
            VotingPolicy::Independent => "exec.voting.independent",
        }
    }
}

/// Three independent switches the executors article renders from, regardless
/// of what is manually selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutorPolicies {
    pub bond: BondPolicy,
    pub compensation: CompensationPolicy,
    pub voting: VotingPolicy,
}

impl ExecutorPolicies {
    pub fn from_intake(intake: &Intake) -> ExecutorPolicies {
        let bond = match intake.text("BondPolicy") {
            "Bond required" => BondPolicy::Required,
            "Court discretion" => BondPolicy::CourtDiscretion,
            _ => BondPolicy::Waived,
        };
        let compensation = match intake.text("CompensationPolicy") {
            "No extra compensation (expenses only)" => CompensationPolicy::Waived,
            _ => CompensationPolicy::Allowed,
        };
        let voting = match intake.text("CoExecutorsActBy") {
            "Unanimous" => VotingPolicy::Unanimous,
            "Any one acting alone" => VotingPolicy::Independent,
            _ => VotingPolicy::Majority,
        };
        ExecutorPolicies {
            bond,
            compensation,
            voting,
        }
    }

    fn clause_ids(self) -> [&'static str; 3] {
        [
            self.bond.clause_id(),
            self.compensation.clause_id(),
            self.voting.clause_id(),
        ]
    }
}

/// Intake-derived switches the render assembly consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderPolicy {
    pub id_mode: IdMode,
    pub include_capacity: bool,
    pub executors: ExecutorPolicies,
}

impl RenderPolicy {
    pub fn from_intake(intake: &Intake) -> RenderPolicy {
        let id_mode = if intake.text("IdMode").eq_ignore_ascii_case("expanded") {
            IdMode::Expanded
        } else {
            IdMode::Simple
        };
        RenderPolicy {
            id_mode,
            include_capacity: intake.yes("IncludeCapacity"),
            executors: ExecutorPolicies::from_intake(intake),
        }
    }
}

// ============================================================================
// Selection resolution
// ============================================================================

/// Normalize a persisted selection list against the article library.
///
/// Steps: legacy-resolve every id, dedupe keeping first occurrences, then
/// apply the article shape. Primary/addon articles drop unknown ids, elect
/// one primary (first selected, else the library default), and emit it ahead
/// of the addons. Addon-only articles filter to known addon ids. Free-list
/// articles keep every resolved id.
///
/// The result is a fixed point: resolving it again returns it unchanged.
pub fn resolve_selection(library: &ArticleLibrary, raw: &[String]) -> Vec<ClauseId> {
    let mut resolved: Vec<ClauseId> = Vec::with_capacity(raw.len());
    let mut seen = AHashSet::new();
    for id in raw {
        let id = library.resolve_id(id);
        if seen.insert(id.clone()) {
            resolved.push(id);
        }
    }

    match library.article().shape() {
        ArticleShape::FreeList => resolved,
        ArticleShape::AddonOnly => {
            let known: AHashSet<&ClauseId> = library.addons().iter().map(|c| &c.id).collect();
            resolved.retain(|id| known.contains(id));
            resolved
        }
        ArticleShape::PrimaryAddon => {
            let primary_ids: AHashSet<&ClauseId> =
                library.primary().iter().map(|c| &c.id).collect();
            let addon_ids: AHashSet<&ClauseId> = library.addons().iter().map(|c| &c.id).collect();
            let chosen_primary = resolved
                .iter()
                .find(|id| primary_ids.contains(id))
                .cloned()
                .or_else(|| library.default_primary_id().cloned());
            let addons = resolved.into_iter().filter(|id| addon_ids.contains(id));
            match chosen_primary {
                Some(primary) => std::iter::once(primary).chain(addons).collect(),
                None => addons.collect(),
            }
        }
    }
}

/// Propose a committed selection for a primary/addon article whose stored
/// list elects no primary. Returns the list to persist (default primary
/// first, known addons retained) or `None` when the stored selection already
/// carries a primary, the article has no default, or the article shape has
/// no primary concept.
pub fn ensure_default_primary_selection(
    library: &ArticleLibrary,
    current: SelectionState<'_>,
) -> Option<Vec<ClauseId>> {
    if library.article().shape() != ArticleShape::PrimaryAddon {
        return None;
    }
    let default = library.default_primary_id()?;
    let primary_ids: AHashSet<&ClauseId> = library.primary().iter().map(|c| &c.id).collect();
    let addon_ids: AHashSet<&ClauseId> = library.addons().iter().map(|c| &c.id).collect();

    let mut addons = Vec::new();
    let mut seen = AHashSet::new();
    for id in current.ids() {
        let id = library.resolve_id(id);
        if primary_ids.contains(&id) {
            return None;
        }
        if addon_ids.contains(&id) && seen.insert(id.clone()) {
            addons.push(id);
        }
    }

    let mut proposed = Vec::with_capacity(addons.len() + 1);
    proposed.push(default.clone());
    proposed.extend(addons);
    Some(proposed)
}

// ============================================================================
// Render assembly
// ============================================================================

/// The clauses the document renders for one article, in output order.
///
/// Boilerplate always renders for the articles that carry it. The executors
/// article additionally unions the three policy-derived clause ids with the
/// primaries and the manual selection. Powers and misc render every addon
/// until a manual selection exists for the article; once one exists, even an
/// empty list, only the chosen addons render.
pub fn clauses_for_render<'a>(
    library: &'a ArticleLibrary,
    selection: SelectionState<'_>,
    policy: &RenderPolicy,
) -> Vec<&'a Clause> {
    match library.article() {
        Article::Debts | Article::Gifts | Article::Residuary => {
            let (primary, addons) = split_primary_addons(library, selection);
            let mut out: Vec<&Clause> = library.boilerplate().iter().collect();
            out.extend(primary);
            out.extend(addons);
            out
        }
        Article::Trusts => {
            let (primary, addons) = split_primary_addons(library, selection);
            let mut out: Vec<&Clause> = Vec::new();
            out.extend(primary);
            out.extend(addons);
            out.extend(library.boilerplate());
            out
        }
        Article::Powers | Article::Misc => {
            let mut out: Vec<&Clause> = library.boilerplate().iter().collect();
            if selection.is_absent() {
                out.extend(library.addons());
            } else {
                let resolved = resolve_selection(library, selection.ids());
                let chosen: AHashSet<&ClauseId> = resolved.iter().collect();
                out.extend(library.addons().iter().filter(|c| chosen.contains(&c.id)));
            }
            out
        }
        Article::Executors => {
            let resolved = resolve_selection(library, selection.ids());
            let selected: AHashSet<&ClauseId> = resolved.iter().collect();
            let policy_ids = policy.executors.clause_ids();
            library
                .clauses()
                .filter(|c| {
                    c.kind == ClauseKind::Primary
                        || selected.contains(&c.id)
                        || policy_ids.iter().any(|id| c.id == **id)
                })
                .collect()
        }
        Article::Testator => {
            let mut out: Vec<&Clause> = Vec::new();
            let title_id = match policy.id_mode {
                IdMode::Simple => WILL_TITLE_SIMPLE,
                IdMode::Expanded => WILL_TITLE_EXPANDED,
            };
            out.extend(library.clauses().find(|c| c.id == *title_id));
            out.extend(library.clauses().find(|c| c.id == *REVOCATION));
            if policy.include_capacity {
                out.extend(library.clauses().find(|c| c.id == *CAPACITY));
            }
            let resolved = resolve_selection(library, selection.ids());
            let selected: AHashSet<&ClauseId> = resolved.iter().collect();
            out.extend(library.clauses().filter(|c| {
                selected.contains(&c.id)
                    && !c.id.as_str().starts_with(WILL_TITLE_PREFIX)
                    && c.id != *REVOCATION
                    && c.id != *CAPACITY
            }));
            out
        }
        Article::Family => {
            let resolved = resolve_selection(library, selection.ids());
            let selected: AHashSet<&ClauseId> = resolved.iter().collect();
            library.clauses().filter(|c| selected.contains(&c.id)).collect()
        }
        Article::Signature => {
            let resolved = resolve_selection(library, selection.ids());
            let selected: AHashSet<&ClauseId> = resolved.iter().collect();
            library
                .clauses()
                .filter(|c| c.kind == ClauseKind::Primary || selected.contains(&c.id))
                .collect()
        }
    }
}

fn split_primary_addons<'a>(
    library: &'a ArticleLibrary,
    selection: SelectionState<'_>,
) -> (Vec<&'a Clause>, Vec<&'a Clause>) {
    let resolved = resolve_selection(library, selection.ids());
    let mut primary = Vec::new();
    let mut addons = Vec::new();
    for id in &resolved {
        if let Some(clause) = library.clause_by_id(id) {
            match clause.kind {
                ClauseKind::Primary => primary.push(clause),
                ClauseKind::Addon => addons.push(clause),
                ClauseKind::Boilerplate => {}
            }
        }
    }
    (primary, addons)
}
