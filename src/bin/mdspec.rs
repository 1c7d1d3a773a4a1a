//! mdspec CLI
//!
//! Command-line interface for converting, rendering, and linting
//! API documentation exports.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mdspec::{
    lint, load_document, parse, to_flat_markdown, to_structured_spec, Diagnostic, FileStatus,
    Severity,
};

#[derive(Parser)]
#[command(name = "mdspec")]
#[command(about = "Convert API documentation Markdown into OpenAPI-style specs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a documentation export into a structured spec (JSON)
    Convert {
        /// Path to the Markdown document
        document: PathBuf,

        /// Title for the generated spec
        #[arg(long, default_value = "API")]
        title: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Render a documentation export as flattened Markdown
    Render {
        /// Path to the Markdown document
        document: PathBuf,

        /// Title for the rendered document
        #[arg(long, default_value = "API")]
        title: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Lint documentation exports (depth jumps, broken references, duplicates)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show findings
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            document,
            title,
            output,
            pretty,
        } => run_convert(&document, &title, output, pretty),

        Commands::Render {
            document,
            title,
            output,
        } => run_render(&document, &title, output),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_convert(
    document: &Path,
    title: &str,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let text = load_document(document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let outcome = parse(&text);
    report_diagnostics(&outcome.diagnostics);

    let spec = to_structured_spec(&outcome.endpoints, title);
    let json_output = if pretty {
        serde_json::to_string_pretty(&spec)
    } else {
        serde_json::to_string(&spec)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    write_output(output, &json_output)
}

fn run_render(document: &Path, title: &str, output: Option<PathBuf>) -> Result<(), u8> {
    let text = load_document(document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let outcome = parse(&text);
    report_diagnostics(&outcome.diagnostics);

    write_output(output, &to_flat_markdown(&outcome.endpoints, title))
}

/// Parser findings go to stderr; they never block conversion.
fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        let label = match diag.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        eprintln!("{}[{}]: {} - {}", label, diag.code, diag.location, diag.message);
    }
}

fn write_output(output: Option<PathBuf>, content: &str) -> Result<(), u8> {
    match output {
        Some(path) => std::fs::write(&path, content).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result).unwrap());
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let color = match diag.severity {
                    Severity::Error => "\x1b[31m",
                    Severity::Warning => "\x1b[33m",
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color,
                        match diag.severity {
                            Severity::Error => "error",
                            Severity::Warning => "warning",
                        },
                        diag.code,
                        diag.location,
                        diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
