//! `yaml2toml` CLI — convert YAML configuration files to TOML.
//!
//! ## Usage
//!
//! ```sh
//! # Convert every .yml/.yaml file below ./config into a sibling .toml file
//! yaml2toml ./config
//!
//! # Only .yml files, and never replace an existing .toml
//! yaml2toml --ext yml --no-clobber ./config
//!
//! # See what would be written without touching the disk
//! yaml2toml --dry-run ./config
//!
//! # Convert YAML to JSON instead
//! yaml2toml --to json ./config
//!
//! # Single document: stdin → stdout, or file → file
//! echo 'name: example' | yaml2toml
//! yaml2toml -i app.yml -o app.toml
//! ```

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use yaml2toml_core::{run_batch, BatchEvent, BatchOptions, Format, FsWorkspace, Workspace};

#[derive(Parser)]
#[command(
    name = "yaml2toml",
    version,
    about = "Recursively convert YAML configuration files to TOML"
)]
struct Cli {
    /// Directory to search recursively. Omit to convert a single document.
    #[arg(conflicts_with_all = ["input", "output"])]
    dir: Option<PathBuf>,

    /// Source format (yaml, toml, json)
    #[arg(long, default_value = "yaml")]
    from: Format,

    /// Target format (yaml, toml, json)
    #[arg(long, default_value = "toml")]
    to: Format,

    /// Input file extension to convert; repeatable. Defaults to the source
    /// format's extensions (yml and yaml for YAML).
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Skip inputs whose output file already exists
    #[arg(long)]
    no_clobber: bool,

    /// Convert and report without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Stop at the first file that fails to convert
    #[arg(long)]
    fail_fast: bool,

    /// Input file for single-document mode (reads stdin if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file for single-document mode (writes stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.dir.as_deref() {
        Some(dir) => {
            let failed = convert_tree(dir, &cli)?;
            if failed > 0 {
                eprintln!("{failed} file(s) failed to convert");
                process::exit(1);
            }
        }
        None => convert_single(&cli)?,
    }
    Ok(())
}

/// Structured logs go to stderr so stdout only carries results. Per-file
/// failures are already printed, so the default level hides their warnings.
/// `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

/// Convert every matching file below `dir`. Returns the number of failures.
fn convert_tree(dir: &Path, cli: &Cli) -> Result<usize> {
    let mut options = BatchOptions::new(cli.from, cli.to);
    if !cli.extensions.is_empty() {
        options = options.with_extensions(&cli.extensions);
    }
    options.overwrite = !cli.no_clobber;
    options.dry_run = cli.dry_run;
    options.fail_fast = cli.fail_fast;
    debug!(?options, "batch options");

    let report = run_batch(&mut FsWorkspace, dir, &options, |event| match event {
        BatchEvent::Converted { output, .. } if options.dry_run => {
            println!("Would save {}", output.display());
        }
        BatchEvent::Converted { output, .. } => println!("Saved {}", output.display()),
        BatchEvent::Skipped { output, reason, .. } => {
            println!("Skipped {} ({reason})", output.display());
        }
        BatchEvent::Failed { error, .. } => eprintln!("error: {error}"),
    })
    .with_context(|| format!("Failed to scan directory: {}", dir.display()))?;

    Ok(report.failed.len())
}

fn convert_single(cli: &Cli) -> Result<()> {
    let source = read_input(cli.input.as_deref())?;
    let converted = yaml2toml_core::convert(&source, cli.from, cli.to)
        .with_context(|| format!("Failed to convert {} to {}", cli.from, cli.to))?;
    write_output(cli.output.as_deref(), &converted)
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// File output goes through [`FsWorkspace`] so a failed write never leaves a
/// truncated document behind.
fn write_output(path: Option<&Path>, content: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            FsWorkspace
                .write(path, content)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
        }
        None => {
            use std::io::Write;
            io::stdout()
                .write_all(content)
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
