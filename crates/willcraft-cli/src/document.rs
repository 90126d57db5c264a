//! Document assembly: run every article through selection resolution and
//! render assembly, hydrate clause bodies, and collect the result in output
//! order.

use willcraft_clauses::{clauses_for_render, hydrate_body, Article, ClauseLibrary, RenderPolicy};
use willcraft_family::{suggest_family_clauses, FamilyContext};
use willcraft_model::{Intake, SelectionState};
use willcraft_tokens::{derive_tokens, TokenMap};

const TITLE_TEMPLATE: &str = "LAST WILL AND TESTAMENT OF [[ClientFullName]]";

/// One rendered article.
#[derive(Debug, Clone)]
pub struct Section {
    pub article: Article,
    pub heading: Option<&'static str>,
    pub paragraphs: Vec<String>,
}

/// The assembled document.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub generated_on: String,
    pub sections: Vec<Section>,
}

/// Fixed article heading; the opening declaration and family statement run
/// in before the numbered articles and carry none.
pub fn heading(article: Article) -> Option<&'static str> {
    match article {
        Article::Testator | Article::Family => None,
        Article::Debts => Some("ARTICLE I — PAYMENT OF DEBTS, EXPENSES, AND TAXES"),
        Article::Gifts => Some("ARTICLE II — TANGIBLE PERSONAL PROPERTY"),
        Article::Residuary => Some("ARTICLE III — RESIDUARY ESTATE"),
        Article::Executors => Some("ARTICLE IV — EXECUTORS"),
        Article::Powers => Some("ARTICLE V — FIDUCIARY POWERS"),
        Article::Misc => Some("ARTICLE VI — MISCELLANEOUS PROVISIONS"),
        Article::Trusts => Some("ARTICLE VII — TRUST PROVISIONS"),
        Article::Signature => Some("ARTICLE VIII — EXECUTION"),
    }
}

/// Assemble the document (or one article of it).
///
/// The family article falls back to the live suggestion when no manual
/// selection is stored, matching how the interactive preview behaves. With
/// `hydrate` off, clause bodies keep their `[[Token]]` placeholders.
pub fn build_document(
    library: &ClauseLibrary,
    intake: &Intake,
    only: Option<Article>,
    hydrate: bool,
) -> Document {
    let tokens: TokenMap = derive_tokens(intake);
    let policy = RenderPolicy::from_intake(intake);
    let family_suggestion = suggest_family_clauses(&FamilyContext::build(intake));

    let mut sections = Vec::new();
    for article in Article::ALL {
        if only.is_some_and(|a| a != article) {
            continue;
        }
        let selection = match (article, intake.selection(article.key())) {
            (Article::Family, SelectionState::Stored(ids)) if !ids.is_empty() => {
                SelectionState::Stored(ids)
            }
            (Article::Family, _) => SelectionState::Stored(&family_suggestion),
            (_, stored) => stored,
        };
        let clauses = clauses_for_render(library.article(article), selection, &policy);
        let paragraphs: Vec<String> = clauses
            .iter()
            .map(|clause| {
                if hydrate {
                    hydrate_body(&clause.body, &tokens)
                } else {
                    clause.body.clone()
                }
            })
            .filter(|body| !body.trim().is_empty())
            .collect();
        if paragraphs.is_empty() {
            continue;
        }
        sections.push(Section {
            article,
            heading: heading(article),
            paragraphs,
        });
    }

    Document {
        title: if hydrate {
            hydrate_body(TITLE_TEMPLATE, &tokens)
        } else {
            TITLE_TEMPLATE.to_string()
        },
        generated_on: chrono::Local::now().format("%Y-%m-%d").to_string(),
        sections,
    }
}

/// Plain-text rendering, for piping to a file.
pub fn render_text(document: &Document) -> String {
    let mut out = String::new();
    out.push_str(&document.title);
    out.push('\n');
    out.push_str(&format!("Generated on {}\n", document.generated_on));
    for section in &document.sections {
        out.push('\n');
        if let Some(heading) = section.heading {
            out.push_str(heading);
            out.push_str("\n\n");
        }
        for paragraph in &section.paragraphs {
            out.push_str(paragraph);
            out.push_str("\n\n");
        }
    }
    out
}
