//! Willcraft CLI
//!
//! Command-line driver over the will-drafting core:
//! - `render`: assemble and print the document from an intake snapshot
//! - `suggest`: show the derived family context and suggested family clauses
//! - `tokens`: dump the derived token map
//! - `tree`: print the partner-keyed family tree

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use willcraft_clauses::{Article, ClauseLibrary};
use willcraft_family::{suggest_family_clauses, FamilyContext, FamilyGraph};
use willcraft_model::Intake;
use willcraft_tokens::derive_tokens;

mod document;

#[derive(Parser)]
#[command(name = "willcraft")]
#[command(
    author,
    version,
    about = "Will drafting core: clause resolution, family analysis, token derivation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble and print the will document from an intake snapshot.
    Render {
        /// Intake snapshot JSON file
        #[arg(long)]
        intake: PathBuf,
        /// Directory of per-article clause catalogs
        #[arg(long)]
        catalogs: PathBuf,
        /// Render a single article (selection key, e.g. "debts")
        #[arg(long)]
        article: Option<String>,
        /// Keep [[Token]] placeholders instead of hydrating them
        #[arg(long)]
        raw: bool,
    },
    /// Show the derived family context and the suggested family clause ids.
    Suggest {
        /// Intake snapshot JSON file
        #[arg(long)]
        intake: PathBuf,
    },
    /// Dump the derived token map as JSON.
    Tokens {
        /// Intake snapshot JSON file
        #[arg(long)]
        intake: PathBuf,
    },
    /// Print the partner-keyed family tree.
    Tree {
        /// Intake snapshot JSON file
        #[arg(long)]
        intake: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            intake,
            catalogs,
            article,
            raw,
        } => cmd_render(&intake, &catalogs, article.as_deref(), raw),
        Commands::Suggest { intake } => cmd_suggest(&intake),
        Commands::Tokens { intake } => cmd_tokens(&intake),
        Commands::Tree { intake } => cmd_tree(&intake),
    }
}

fn load_intake(path: &Path) -> Result<Intake> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading intake snapshot {}", path.display()))?;
    Ok(Intake::from_json(&text))
}

fn cmd_render(
    intake_path: &Path,
    catalogs: &Path,
    article: Option<&str>,
    raw: bool,
) -> Result<()> {
    let library = ClauseLibrary::load_dir(catalogs)?;
    let intake = load_intake(intake_path)?;
    let only = match article {
        Some(key) => {
            Some(Article::from_key(key).ok_or_else(|| anyhow!("unknown article key: {key}"))?)
        }
        None => None,
    };

    let doc = document::build_document(&library, &intake, only, !raw);
    println!("{}", doc.title.bold());
    println!("Generated on {}", doc.generated_on);
    for section in &doc.sections {
        println!();
        if let Some(heading) = section.heading {
            println!("{}", heading.cyan().bold());
            println!();
        }
        for paragraph in &section.paragraphs {
            println!("{paragraph}");
            println!();
        }
    }
    Ok(())
}

fn cmd_suggest(intake_path: &Path) -> Result<()> {
    let intake = load_intake(intake_path)?;
    let context = FamilyContext::build(&intake);
    println!("{}", "family context".bold());
    println!("{}", serde_json::to_string_pretty(&context)?);
    println!();
    println!("{}", "suggested family clauses".bold());
    for id in suggest_family_clauses(&context) {
        println!("  {} {}", "→".cyan(), id);
    }
    Ok(())
}

fn cmd_tokens(intake_path: &Path) -> Result<()> {
    let intake = load_intake(intake_path)?;
    let tokens = derive_tokens(&intake);
    println!("{}", serde_json::to_string_pretty(&tokens)?);
    Ok(())
}

fn cmd_tree(intake_path: &Path) -> Result<()> {
    let intake = load_intake(intake_path)?;
    let graph = FamilyGraph::build(&intake);

    println!("{}", graph.client.name.bold());
    for stack in &graph.partner_stacks {
        let marker = if stack.current { " (current)" } else { "" };
        println!();
        println!("{}{}", stack.partner.name.bold(), marker);
        if !stack.partner.caption.is_empty() {
            println!("  {}", stack.partner.caption);
        }
        for child in &stack.children {
            match child.annotation {
                Some(annotation) => println!("  - {} ({annotation})", child.name),
                None => println!("  - {}", child.name),
            }
        }
    }
    if !graph.unpaired_children.is_empty() {
        println!();
        println!("{}", "children".bold());
        for child in &graph.unpaired_children {
            match child.annotation {
                Some(annotation) => println!("  - {} ({annotation})", child.name),
                None => println!("  - {}", child.name),
            }
        }
    }
    Ok(())
}
