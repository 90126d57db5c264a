//! Catalog loading and normalization.
//!
//! One JSON document per article, each exposing three named groups:
//! `primary_select_one`, `extras_multi`, `boilerplate_always` (older
//! catalogs use a flat `clauses` array with a per-clause `type` tag; both
//! forms normalize to the same [`ArticleLibrary`]). Loading degrades per
//! article: a missing or malformed document yields an empty library for that
//! article and never aborts the others.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Identifiers and articles
// ============================================================================

/// Identifier of a clause within the catalog namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClauseId(pub String);

impl ClauseId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClauseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ClauseId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// The document articles, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Article {
    Testator,
    Family,
    Debts,
    Gifts,
    Residuary,
    Executors,
    Powers,
    Misc,
    Trusts,
    Signature,
}

/// How selections behave for an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleShape {
    /// Mutually-exclusive primary choice plus independent addons; unknown
    /// ids are filtered out during resolution.
    PrimaryAddon,
    /// No primary concept; selections filter to known addon ids.
    AddonOnly,
    /// Free clause list; resolution only legacy-resolves and dedupes.
    FreeList,
}

impl Article {
    pub const ALL: [Article; 10] = [
        Article::Testator,
        Article::Family,
        Article::Debts,
        Article::Gifts,
        Article::Residuary,
        Article::Executors,
        Article::Powers,
        Article::Misc,
        Article::Trusts,
        Article::Signature,
    ];

    /// Key used for persisted selection lists.
    pub fn key(&self) -> &'static str {
        match self {
            Article::Testator => "testator",
            Article::Family => "family",
            Article::Debts => "debts",
            Article::Gifts => "gifts",
            Article::Residuary => "residuary",
            Article::Executors => "executors",
            Article::Powers => "powers",
            Article::Misc => "misc",
            Article::Trusts => "trusts",
            Article::Signature => "signature",
        }
    }

    /// Catalog document name (the debts article keeps its historical
    /// `debts_taxes` document name).
    pub fn catalog_name(&self) -> &'static str {
        match self {
            Article::Debts => "debts_taxes",
            other => other.key(),
        }
    }

    pub fn shape(&self) -> ArticleShape {
        match self {
            Article::Debts | Article::Gifts | Article::Residuary | Article::Trusts => {
                ArticleShape::PrimaryAddon
            }
            Article::Powers | Article::Misc => ArticleShape::AddonOnly,
            Article::Testator | Article::Family | Article::Executors | Article::Signature => {
                ArticleShape::FreeList
            }
        }
    }

    pub fn from_key(key: &str) -> Option<Article> {
        Article::ALL.iter().copied().find(|a| a.key() == key)
    }
}

// ============================================================================
// Clauses
// ============================================================================

/// Clause category; a closed set so dispatch is exhaustiveness-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    /// Mutually exclusive: at most one active per article.
    Primary,
    /// Independently toggleable: zero or many active.
    Addon,
    /// Always rendered; never stored in selections.
    Boilerplate,
}

/// A single templated paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    pub id: ClauseId,
    pub kind: ClauseKind,
    /// Effective default-primary flag; at most one primary per article
    /// carries it after catalog normalization.
    pub default: bool,
    pub title: Option<String>,
    pub tags: Vec<String>,
    /// Retired ids still found in old persisted selections.
    pub legacy_ids: Vec<ClauseId>,
    /// Placeholder tokens the body references, in appearance order.
    pub tokens: Vec<String>,
    /// Template body with `[[Token]]` placeholders.
    pub body: String,
}

// ============================================================================
// Wire form
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
struct RawClause {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    default: bool,
    #[serde(default, rename = "legacyIds")]
    legacy_ids: Vec<String>,
    #[serde(default)]
    tokens: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, alias = "body")]
    content: String,
}

impl RawClause {
    fn into_clause(self, kind: ClauseKind) -> Clause {
        Clause {
            id: ClauseId::new(self.id),
            kind,
            default: self.default,
            title: self.title,
            tags: self.tags,
            legacy_ids: self.legacy_ids.into_iter().map(ClauseId::new).collect(),
            tokens: self.tokens,
            body: self.content,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    primary_select_one: Vec<RawClause>,
    #[serde(default)]
    extras_multi: Vec<RawClause>,
    #[serde(default)]
    boilerplate_always: Vec<RawClause>,
    #[serde(default)]
    default_primary: Option<String>,
    /// Legacy flat form: one array with per-clause `type` tags.
    #[serde(default)]
    clauses: Vec<RawClause>,
}

// ============================================================================
// Article library
// ============================================================================

/// Normalized clause sets for one article.
#[derive(Debug, Clone)]
pub struct ArticleLibrary {
    article: Article,
    primary: Vec<Clause>,
    addons: Vec<Clause>,
    boilerplate: Vec<Clause>,
    /// Legacy id -> current id; first writer wins on collision.
    legacy: AHashMap<ClauseId, ClauseId>,
    default_primary: Option<ClauseId>,
}

impl ArticleLibrary {
    /// Build from a raw catalog document. Total: any malformed value yields
    /// an empty library.
    pub fn from_document(article: Article, raw: &Value) -> ArticleLibrary {
        let parsed: RawCatalog = match serde_json::from_value(raw.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(
                    article = article.key(),
                    error = %err,
                    "malformed clause catalog; degrading to empty clause set"
                );
                return ArticleLibrary::empty(article);
            }
        };

        let (mut primary, mut addons, mut boilerplate) = (Vec::new(), Vec::new(), Vec::new());
        for clause in parsed.primary_select_one {
            primary.push(clause.into_clause(ClauseKind::Primary));
        }
        for clause in parsed.extras_multi {
            addons.push(clause.into_clause(ClauseKind::Addon));
        }
        for clause in parsed.boilerplate_always {
            boilerplate.push(clause.into_clause(ClauseKind::Boilerplate));
        }
        // Legacy flat form classifies by the per-clause type tag.
        for clause in parsed.clauses {
            let kind = match clause.kind.as_deref() {
                Some("primary") => ClauseKind::Primary,
                Some("always") | Some("boilerplate") => ClauseKind::Boilerplate,
                _ => ClauseKind::Addon,
            };
            match kind {
                ClauseKind::Primary => primary.push(clause.into_clause(kind)),
                ClauseKind::Addon => addons.push(clause.into_clause(kind)),
                ClauseKind::Boilerplate => boilerplate.push(clause.into_clause(kind)),
            }
        }

        let mut legacy = AHashMap::new();
        for clause in primary.iter().chain(&addons).chain(&boilerplate) {
            for old in &clause.legacy_ids {
                legacy.entry(old.clone()).or_insert_with(|| clause.id.clone());
            }
        }

        // Effective default primary: the first default-flagged primary, else
        // the explicit catalog field, else the first primary in catalog order.
        let default_primary = primary
            .iter()
            .find(|c| c.default)
            .map(|c| c.id.clone())
            .or_else(|| parsed.default_primary.map(ClauseId::new))
            .or_else(|| primary.first().map(|c| c.id.clone()));
        // Re-derive the flags so exactly the effective default carries one.
        if let Some(default_id) = &default_primary {
            for clause in &mut primary {
                clause.default = &clause.id == default_id;
            }
        }

        ArticleLibrary {
            article,
            primary,
            addons,
            boilerplate,
            legacy,
            default_primary,
        }
    }

    pub fn empty(article: Article) -> ArticleLibrary {
        ArticleLibrary {
            article,
            primary: Vec::new(),
            addons: Vec::new(),
            boilerplate: Vec::new(),
            legacy: AHashMap::new(),
            default_primary: None,
        }
    }

    pub fn article(&self) -> Article {
        self.article
    }

    pub fn primary(&self) -> &[Clause] {
        &self.primary
    }

    pub fn addons(&self) -> &[Clause] {
        &self.addons
    }

    pub fn boilerplate(&self) -> &[Clause] {
        &self.boilerplate
    }

    pub fn default_primary_id(&self) -> Option<&ClauseId> {
        self.default_primary.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.addons.is_empty() && self.boilerplate.is_empty()
    }

    /// All clauses in catalog order (primary, addons, boilerplate).
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.primary.iter().chain(&self.addons).chain(&self.boilerplate)
    }

    pub fn clause_by_id(&self, id: &ClauseId) -> Option<&Clause> {
        self.clauses().find(|c| &c.id == id)
    }

    /// Map a possibly-legacy id forward; unknown ids pass through unchanged.
    pub fn resolve_id(&self, id: &str) -> ClauseId {
        let key = ClauseId::new(id);
        self.legacy.get(&key).cloned().unwrap_or(key)
    }
}

// ============================================================================
// Library cache
// ============================================================================

/// All article libraries, loaded once and frozen. Pass read-only references
/// into the resolution functions; nothing here mutates after construction.
#[derive(Debug, Clone, Default)]
pub struct ClauseLibrary {
    articles: BTreeMap<Article, ArticleLibrary>,
}

/// Error at the catalog-directory seam. Per-article problems never surface
/// here; only an unreadable directory does.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClauseLibrary {
    /// Build from in-memory catalog documents keyed by article. Articles
    /// without a document get an empty library.
    pub fn from_documents<I>(documents: I) -> ClauseLibrary
    where
        I: IntoIterator<Item = (Article, Value)>,
    {
        let mut articles: BTreeMap<Article, ArticleLibrary> = Article::ALL
            .iter()
            .map(|&a| (a, ArticleLibrary::empty(a)))
            .collect();
        for (article, raw) in documents {
            articles.insert(article, ArticleLibrary::from_document(article, &raw));
        }
        ClauseLibrary { articles }
    }

    /// Load `<catalog_name>.json` per article from a directory. Missing or
    /// malformed files degrade to empty libraries with a warning; only an
    /// unreadable directory is an error.
    pub fn load_dir(dir: &Path) -> Result<ClauseLibrary, CatalogError> {
        if !dir.is_dir() {
            return Err(CatalogError::Io {
                path: dir.display().to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not a directory",
                ),
            });
        }
        let mut documents = Vec::new();
        for article in Article::ALL {
            let path = dir.join(format!("{}.json", article.catalog_name()));
            match std::fs::read_to_string(&path) {
                Ok(text) => match serde_json::from_str::<Value>(&text) {
                    Ok(value) => documents.push((article, value)),
                    Err(err) => {
                        tracing::warn!(
                            article = article.key(),
                            path = %path.display(),
                            error = %err,
                            "catalog is not valid JSON; degrading to empty clause set"
                        );
                    }
                },
                Err(err) => {
                    tracing::warn!(
                        article = article.key(),
                        path = %path.display(),
                        error = %err,
                        "catalog missing; degrading to empty clause set"
                    );
                }
            }
        }
        Ok(ClauseLibrary::from_documents(documents))
    }

    pub fn article(&self, article: Article) -> &ArticleLibrary {
        // Every article is present by construction.
        &self.articles[&article]
    }

    pub fn articles(&self) -> impl Iterator<Item = (Article, &ArticleLibrary)> {
        self.articles.iter().map(|(&a, lib)| (a, lib))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn debts_doc() -> Value {
        json!({
            "primary_select_one": [
                { "id": "debts.primary.standard", "legacyIds": ["debts.pay_all"], "content": "Pay my debts." },
                { "id": "debts.primary.secured_pass", "default": true, "content": "Secured debts pass with property." }
            ],
            "extras_multi": [
                { "id": "debts.addon.tax_apportionment", "content": "Taxes apportioned." }
            ],
            "boilerplate_always": [
                { "id": "debts.always.definitions", "content": "Definitions." }
            ]
        })
    }

    #[test]
    fn groups_are_classified_by_kind() {
        let lib = ArticleLibrary::from_document(Article::Debts, &debts_doc());
        assert_eq!(lib.primary().len(), 2);
        assert_eq!(lib.addons().len(), 1);
        assert_eq!(lib.boilerplate().len(), 1);
        assert_eq!(lib.primary()[0].kind, ClauseKind::Primary);
    }

    #[test]
    fn legacy_ids_map_forward_first_writer_wins() {
        let doc = json!({
            "primary_select_one": [
                { "id": "a", "legacyIds": ["old"] },
                { "id": "b", "legacyIds": ["old"] }
            ]
        });
        let lib = ArticleLibrary::from_document(Article::Debts, &doc);
        assert_eq!(lib.resolve_id("old"), ClauseId::new("a"));
        // Unknown ids pass through unchanged.
        assert_eq!(lib.resolve_id("mystery"), ClauseId::new("mystery"));
    }

    #[test]
    fn exactly_one_primary_carries_the_default_flag() {
        let lib = ArticleLibrary::from_document(Article::Debts, &debts_doc());
        let defaults: Vec<_> = lib.primary().iter().filter(|c| c.default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, ClauseId::new("debts.primary.secured_pass"));
        assert_eq!(
            lib.default_primary_id(),
            Some(&ClauseId::new("debts.primary.secured_pass"))
        );
    }

    #[test]
    fn flagged_primary_wins_over_explicit_default_field() {
        let mut doc = debts_doc();
        doc["default_primary"] = json!("debts.primary.standard");
        let lib = ArticleLibrary::from_document(Article::Debts, &doc);
        let defaults: Vec<_> = lib.primary().iter().filter(|c| c.default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, ClauseId::new("debts.primary.secured_pass"));
    }

    #[test]
    fn explicit_default_field_applies_when_nothing_is_flagged() {
        let mut doc = debts_doc();
        doc["primary_select_one"][1]
            .as_object_mut()
            .unwrap()
            .remove("default");
        doc["default_primary"] = json!("debts.primary.secured_pass");
        let lib = ArticleLibrary::from_document(Article::Debts, &doc);
        assert_eq!(
            lib.default_primary_id(),
            Some(&ClauseId::new("debts.primary.secured_pass"))
        );
    }

    #[test]
    fn flat_legacy_catalog_classifies_by_type_tag() {
        let doc = json!({
            "clauses": [
                { "id": "p", "type": "primary" },
                { "id": "x" },
                { "id": "b", "type": "always" }
            ]
        });
        let lib = ArticleLibrary::from_document(Article::Gifts, &doc);
        assert_eq!(lib.primary().len(), 1);
        assert_eq!(lib.addons().len(), 1);
        assert_eq!(lib.boilerplate().len(), 1);
    }

    #[test]
    fn malformed_document_degrades_to_empty() {
        let lib = ArticleLibrary::from_document(Article::Debts, &json!([1, 2, 3]));
        assert!(lib.is_empty());
    }

    #[test]
    fn missing_articles_get_empty_libraries() {
        let library = ClauseLibrary::from_documents([(Article::Debts, debts_doc())]);
        assert!(!library.article(Article::Debts).is_empty());
        assert!(library.article(Article::Trusts).is_empty());
    }

    #[test]
    fn load_dir_skips_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("debts_taxes.json"),
            serde_json::to_string(&debts_doc()).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("gifts.json"), "{ not json").unwrap();
        let library = ClauseLibrary::load_dir(dir.path()).unwrap();
        assert!(!library.article(Article::Debts).is_empty());
        assert!(library.article(Article::Gifts).is_empty());
        assert!(library.article(Article::Powers).is_empty());
    }
}
