#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

mod logging;

use clap::Parser;
use miette::{miette, IntoDiagnostic, Result};
use pyshade_parser::{LineIndex, ObfuscateError, ObfuscateOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pyshade")]
#[command(author, version, about = "A deterministic Python source obfuscator", long_about = None)]
struct Cli {
    /// Python source file to obfuscate
    input: PathBuf,

    /// Output file (default: <input stem>.obf.py next to the input)
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Function name to never rename (repeatable, e.g. --reserve main)
    #[arg(long = "reserve", value_name = "NAME")]
    reserved: Vec<String>,

    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit a JSON summary to stdout (stable, machine-readable)
    #[arg(long)]
    json: bool,
}

/// Summary of one invocation, printed to stdout.
#[derive(Debug, Serialize)]
struct Summary {
    input: PathBuf,
    output: PathBuf,
    functions_renamed: usize,
    literals_encoded: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let source = std::fs::read_to_string(&cli.input)
        .map_err(|e| miette!("cannot read {}: {e}", cli.input.display()))?;

    let mut options = ObfuscateOptions::default();
    for name in &cli.reserved {
        options.rename.reserved.insert(name.clone());
    }

    tracing::debug!(
        input = %cli.input.display(),
        bytes = source.len(),
        reserved = cli.reserved.len(),
        "obfuscating"
    );

    let report = pyshade_parser::obfuscate_with_report(&source, &options)
        .map_err(|e| render_error(&cli.input, &source, &e))?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));
    std::fs::write(&output, &report.code)
        .map_err(|e| miette!("cannot write {}: {e}", output.display()))?;

    let summary = Summary {
        input: cli.input,
        output,
        functions_renamed: report.functions_renamed,
        literals_encoded: report.literals_encoded,
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).into_diagnostic()?;
        println!("{json}");
    } else {
        println!(
            "{} -> {} ({} functions renamed, {} literals encoded)",
            summary.input.display(),
            summary.output.display(),
            summary.functions_renamed,
            summary.literals_encoded
        );
    }

    Ok(())
}

/// `foo.py` becomes `foo.obf.py`; an extensionless input gains `.obf.py`.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "out".to_string(), |s| s.to_string_lossy().into_owned());
    input.with_file_name(format!("{stem}.obf.py"))
}

/// Attach file position to a pipeline error.
fn render_error(input: &Path, source: &str, err: &ObfuscateError) -> miette::Report {
    match err {
        ObfuscateError::Syntax(parse_err) => {
            let index = LineIndex::new(source);
            let (line, col) = index.line_col(parse_err.span.start);
            // line_col is 0-indexed; editors count from 1.
            let (line, col) = (line + 1, col + 1);
            miette!(
                "{}:{line}:{col}: syntax error: {}",
                input.display(),
                parse_err.message
            )
        }
        ObfuscateError::Encoding(msg) => {
            miette!("{}: literal cannot be encoded: {msg}", input.display())
        }
    }
}
