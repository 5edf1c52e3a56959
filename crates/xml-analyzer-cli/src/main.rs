#![allow(
    clippy::needless_pass_by_value,    // clap requires owned strings
    clippy::must_use_candidate,        // CLI functions don't need must_use
)]

//! xml-analyzer - list the distinct child shapes of an XML tag across a corpus
//!
//! Scans a directory (or a ZIP archive, expanded first together with any ZIP
//! archives nested inside it) for `.xml` files and prints every distinct
//! rendered child of the requested tag.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use config::Config;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use xml_analyzer_archive::{expand, is_zip_path, DestNaming, ExpandOptions, ExpandReport};
use xml_analyzer_core::{list_xml_files, scan_files, ScanSummary, TagValues};

/// Exit code for a missing input path
const EXIT_NOT_FOUND: i32 = 3;
/// Exit code for invalid arguments (matches clap)
const EXIT_USAGE: i32 = 2;

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Only errors are logged
    Quiet,
    /// Warnings and errors are logged (default)
    Normal,
    /// Debug logging, including per-file parse failures
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Default `env_logger` filter; `RUST_LOG` still takes precedence
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
enum OutputFormat {
    /// Count line followed by one value per line (default)
    Text,
    /// Single JSON object with counts and sorted values
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
enum Naming {
    /// `a.zip` expands into `azip`
    Legacy,
    /// `a.zip` expands into `a`
    Stem,
}

impl From<Naming> for DestNaming {
    fn from(naming: Naming) -> Self {
        match naming {
            Naming::Legacy => Self::Legacy,
            Naming::Stem => Self::Stem,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "xml-analyzer",
    about = "List the distinct children of an XML tag across a directory or ZIP archive",
    long_about = "Recursively scans PATH for .xml files and prints every distinct rendering of\n\
                  the children of elements named TAG, as `name(attr=value;...) = text`.\n\
                  \n\
                  If PATH is a .zip archive it is expanded first, including any archives nested\n\
                  inside it. PATH and TAG are prompted for when omitted.\n\
                  \n\
                  Defaults can be set via .xml-analyzer.toml configuration file.",
    version
)]
struct Args {
    /// Directory or .zip archive to analyze
    path: Option<PathBuf>,

    /// XML tag whose children are listed
    tag: Option<String>,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,

    /// Log per-file details, including files that failed to parse
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Print values in sorted order
    #[arg(long)]
    sort: bool,

    /// How directories for nested archives are named
    #[arg(long, value_enum)]
    naming: Option<Naming>,

    /// Deepest nested archive level that is expanded
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Directory to expand a top-level archive into (default: derived from the archive name)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

/// JSON document printed by `--format json`
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    files: usize,
    matched_files: usize,
    failed_files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    archive: Option<&'a ExpandReport>,
    values: Vec<&'a str>,
}

/// Resolve output format from CLI, config, or default
fn resolve_output_format(cli_value: Option<OutputFormat>, config_value: Option<&str>) -> OutputFormat {
    if let Some(format) = cli_value {
        return format;
    }

    match config_value.map(str::to_lowercase).as_deref() {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Text,
    }
}

/// Resolve nested archive naming from CLI, config, or default
fn resolve_naming(cli_value: Option<Naming>, config_value: Option<&str>) -> DestNaming {
    if let Some(naming) = cli_value {
        return naming.into();
    }

    config_value
        .and_then(|value| match value.parse::<DestNaming>() {
            Ok(naming) => Some(naming),
            Err(e) => {
                log::warn!("Ignoring archive.naming from config: {e}");
                None
            }
        })
        .unwrap_or_default()
}

fn init_logging(verbosity: Verbosity) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

/// Print `label` and read one line from stdin, without its line terminator.
fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        anyhow::bail!("No input provided for: {}", label.trim_end_matches(&[':', ' '][..]));
    }

    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

/// Expand `path` if it is an archive; return the directory to scan.
fn prepare_scan_root(
    path: &Path,
    output_dir: Option<PathBuf>,
    options: &ExpandOptions,
) -> Result<(PathBuf, Option<ExpandReport>)> {
    if !(path.is_file() && is_zip_path(path)) {
        return Ok((path.to_path_buf(), None));
    }

    let dest = output_dir.unwrap_or_else(|| options.naming.sibling_dest(path));
    let report = expand(path, &dest, options)
        .with_context(|| format!("Failed to expand archive {}", path.display()))?;

    Ok((dest, Some(report)))
}

fn print_text(values: &TagValues, summary: &ScanSummary, sort: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "Files count: {}", summary.files)?;
    writeln!(out, "Values:")?;
    if sort {
        for value in values.sorted() {
            writeln!(out, "{value}")?;
        }
    } else {
        for value in &values.values {
            writeln!(out, "{value}")?;
        }
    }

    Ok(())
}

fn print_json(values: &TagValues, summary: &ScanSummary, archive: Option<&ExpandReport>) -> Result<()> {
    let report = JsonReport {
        files: summary.files,
        matched_files: summary.matched_files,
        failed_files: summary.failed_files.len(),
        archive,
        values: values.sorted(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);
    init_logging(verbosity);

    // Load configuration files; broken ones are logged, so -q silences them
    let (user_config, project_config) = Config::discover_configs();
    let config = Config::merge(user_config, project_config);

    let path = match args.path {
        Some(path) => path,
        None => PathBuf::from(prompt("Enter the path to the directory to analyze: ")?),
    };
    let tag = match args.tag {
        Some(tag) => tag,
        None => prompt("Enter the XML tag to analyze: ")?,
    };

    if tag.is_empty() {
        eprintln!("{} The XML tag must not be empty", "Error:".red().bold());
        std::process::exit(EXIT_USAGE);
    }

    if !path.exists() {
        eprintln!(
            "{} Directory '{}' does not exist",
            "Error:".red().bold(),
            path.display()
        );
        std::process::exit(EXIT_NOT_FOUND);
    }

    let options = ExpandOptions {
        naming: resolve_naming(args.naming, config.naming()),
        max_depth: args
            .max_depth
            .or_else(|| config.max_depth())
            .unwrap_or(xml_analyzer_archive::MAX_NESTING_DEPTH),
    };
    let format = resolve_output_format(args.format, config.format());
    let sort = args.sort || config.sort().unwrap_or(false);

    let (root, archive) = prepare_scan_root(&path, args.output_dir, &options)?;

    let files = list_xml_files(&root);
    log::debug!("Found {} XML files under {}", files.len(), root.display());

    let (values, summary) = scan_files(&files, &tag);
    if !summary.failed_files.is_empty() {
        log::info!(
            "{} of {} files could not be parsed",
            summary.failed_files.len(),
            summary.files
        );
    }

    match format {
        OutputFormat::Text => print_text(&values, &summary, sort),
        OutputFormat::Json => print_json(&values, &summary, archive.as_ref()),
    }
}
