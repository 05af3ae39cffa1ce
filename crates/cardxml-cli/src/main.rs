//! cardxml CLI
//!
//! Command-line tool for building canonical card definition files from raw
//! documents and relational exports, and for diffing two of them.

mod sources;

use cardxml_core::{
    diff, read_corpus, reconcile, write_corpus, Corpus, ReconcileConfig, ReconcileInput,
};
use clap::{Parser, Subcommand};
use sources::{build_number, find_documents, load_documents, load_table, load_textures, read_text};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cardxml")]
#[command(about = "Card definition reconciliation tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one canonical CardDefs document from raw inputs
    Build {
        /// Raw XML documents; per-locale documents are named after their locale
        #[arg(required_unless_present = "dir")]
        files: Vec<PathBuf>,

        /// Directory to search for raw XML documents
        #[arg(long)]
        dir: Option<PathBuf>,

        /// CARD export (CSV)
        #[arg(long)]
        card_table: Option<PathBuf>,

        /// CARD_TAG export (CSV)
        #[arg(long)]
        card_tag_table: Option<PathBuf>,

        /// JSON object mapping card ids to texture paths
        #[arg(long)]
        textures: Option<PathBuf>,

        /// Build number; detected from the input paths when omitted
        #[arg(long)]
        build: Option<u32>,

        /// Run configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two canonical CardDefs documents
    Diff {
        before: PathBuf,
        after: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Run configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> cardxml_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            files,
            dir,
            card_table,
            card_tag_table,
            textures,
            build,
            config,
            output,
        } => cmd_build(BuildArgs {
            files,
            dir,
            card_table,
            card_tag_table,
            textures,
            build,
            config,
            output,
        }),
        Commands::Diff {
            before,
            after,
            json,
            config,
        } => cmd_diff(&before, &after, json, config.as_deref()),
    }
}

struct BuildArgs {
    files: Vec<PathBuf>,
    dir: Option<PathBuf>,
    card_table: Option<PathBuf>,
    card_tag_table: Option<PathBuf>,
    textures: Option<PathBuf>,
    build: Option<u32>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> cardxml_core::Result<ReconcileConfig> {
    match path {
        Some(path) => ReconcileConfig::from_json_str(&read_text(path)?),
        None => Ok(ReconcileConfig::default()),
    }
}

fn cmd_build(args: BuildArgs) -> cardxml_core::Result<()> {
    let config = load_config(args.config.as_deref())?;

    let mut paths = args.files;
    if let Some(dir) = &args.dir {
        paths.extend(find_documents(dir));
    }

    let build = build_number(args.build, &paths)?;

    let input = ReconcileInput {
        build,
        documents: load_documents(&paths)?,
        card_table: args
            .card_table
            .as_deref()
            .map(|p| load_table(p, "CARD"))
            .transpose()?,
        card_tag_table: args
            .card_tag_table
            .as_deref()
            .map(|p| load_table(p, "CARD_TAG"))
            .transpose()?,
        textures: match &args.textures {
            Some(path) => load_textures(path)?,
            None => BTreeMap::new(),
        },
    };

    let staged = reconcile(input, &config)?;
    let xml = write_corpus(&staged.value)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, xml)?;
            tracing::info!("wrote {} entities to {}", staged.value.len(), path.display());
        }
        None => print!("{}", xml),
    }

    if !staged.warnings.is_empty() {
        tracing::warn!("finished with {} warnings", staged.warnings.len());
    }

    Ok(())
}

fn cmd_diff(
    before: &Path,
    after: &Path,
    json: bool,
    config: Option<&Path>,
) -> cardxml_core::Result<()> {
    let config = load_config(config)?;

    let first = read_canonical(before, &config)?;
    let other = read_canonical(after, &config)?;
    tracing::info!(
        "comparing build {} ({} entities) with build {} ({} entities)",
        first.build,
        first.len(),
        other.build,
        other.len()
    );

    let report = diff(&first, &other);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_empty() {
        println!("No changes.");
    } else {
        print!("{}", report);
    }

    Ok(())
}

fn read_canonical(path: &Path, config: &ReconcileConfig) -> cardxml_core::Result<Corpus> {
    read_corpus(&read_text(path)?, &path.display().to_string(), &config.locales)
}
