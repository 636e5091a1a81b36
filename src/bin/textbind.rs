//! textbind CLI - check templates and extract placeholder captures from text
//!
//! Extraction here is schema-free: captures are printed as `(path, value)`
//! pairs instead of being bound into a record.

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use textbind::{write_document, CaptureWriter, Matcher, Template, TemplateSet};

#[derive(Parser)]
#[command(name = "textbind")]
#[command(version, about = "Template-driven text extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the template comes from
#[derive(clap::Args)]
struct TemplateSource {
    /// Path to a template file
    #[arg(short, long, conflicts_with_all = ["set", "name"])]
    template: Option<PathBuf>,

    /// Path to a YAML template set
    #[arg(short, long, requires = "name")]
    set: Option<PathBuf>,

    /// Template name within the set
    #[arg(short, long, requires = "set")]
    name: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Ndjson,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a template and print its segments
    Check {
        #[command(flatten)]
        source: TemplateSource,
    },

    /// Match a template against text and print the captures
    Extract {
        #[command(flatten)]
        source: TemplateSource,

        /// Text to parse (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Placeholder collecting repeated lines (e.g. Record.NameServers)
        #[arg(short, long)]
        list: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { source } => check(source),
        Commands::Extract {
            source,
            input,
            list,
            format,
        } => extract(source, input, list, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_template(source: &TemplateSource) -> Result<Template, String> {
    let text = match (&source.template, &source.set, &source.name) {
        (Some(path), _, _) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read template {}: {}", path.display(), e))?,
        (None, Some(set), Some(name)) => {
            let set = TemplateSet::load_from_file(set).map_err(|e| e.to_string())?;
            set.get(name)
                .ok_or_else(|| format!("Template '{}' not found in set", name))?
                .to_string()
        }
        _ => return Err("Provide --template, or --set together with --name".to_string()),
    };

    Template::compile(&text).map_err(|e| e.to_string())
}

fn check(source: TemplateSource) -> Result<(), String> {
    let template = load_template(&source)?;
    tracing::info!(
        "Template is valid: {} placeholders",
        template.placeholder_count()
    );
    write_document(io::stdout().lock(), &template.segments).map_err(|e| e.to_string())
}

fn extract(
    source: TemplateSource,
    input: Option<PathBuf>,
    list: Vec<String>,
    format: OutputFormat,
) -> Result<(), String> {
    let template = load_template(&source)?;

    let text = match input {
        Some(path) => fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read input {}: {}", path.display(), e))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            buf
        }
    };

    let repeated: HashSet<String> = list.into_iter().collect();
    let matcher = Matcher::new(&template, |path| {
        repeated.contains(&path.raw) || repeated.contains(&path.dotted())
    })
    .map_err(|e| e.to_string())?;
    let result = matcher.extract(&text).map_err(|e| e.to_string())?;

    match format {
        OutputFormat::Json => {
            write_document(io::stdout().lock(), &result).map_err(|e| e.to_string())
        }
        OutputFormat::Ndjson => {
            let mut writer = CaptureWriter::new(io::stdout().lock());
            let count = writer.write_result(&result).map_err(|e| e.to_string())?;
            tracing::debug!("Wrote {} capture lines", count);
            writer.finish().map(|_| ()).map_err(|e| e.to_string())
        }
    }
}
