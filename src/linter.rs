//! Document linting - static analysis of documentation exports.
//!
//! The parser is permissive by design, so problems that would otherwise be
//! silent surface here:
//! - `W001` schema-table rows that jump more than one nesting level
//! - `E002` references to schema names missing from the registry
//! - `W003` duplicate path/method pairs (the later definition wins on export)
//! - `E001` files that cannot be read (file-level)

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::loader::load_document;
use crate::parser::parse;
use crate::types::{Diagnostic, SchemaNode, SchemaRegistry, Severity};

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a file or directory.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a document's text.
///
/// Combines the parser's own findings (depth jumps) with cross checks over
/// the parsed model: unresolved references and duplicate operations.
pub fn lint_document(document: &str) -> Vec<Diagnostic> {
    let outcome = parse(document);
    let mut diagnostics = outcome.diagnostics;

    for (name, node) in outcome.registry.iter() {
        check_references(
            node,
            &outcome.registry,
            &format!("schemas/{}", name),
            &mut diagnostics,
        );
    }

    let mut seen: Vec<(String, String)> = Vec::new();
    for record in &outcome.endpoints {
        let context = format!("{}/{} {}", record.folder, record.method, record.path);

        if let Some(body) = &record.request_body {
            check_references(
                &body.schema,
                &record.schemas,
                &format!("{}/body", context),
                &mut diagnostics,
            );
        }
        for (status, response) in &record.responses {
            if let Some(node) = &response.content {
                check_references(
                    node,
                    &record.schemas,
                    &format!("{}/responses/{}", context, status),
                    &mut diagnostics,
                );
            }
        }

        let pair = (record.path.clone(), record.method.clone());
        if seen.contains(&pair) {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                code: "W003".into(),
                location: context,
                message: format!(
                    "duplicate operation {} {}; the later definition wins on export",
                    record.method, record.path
                ),
            });
        } else {
            seen.push(pair);
        }
    }

    diagnostics
}

/// Recursively flag reference nodes whose target is absent from the registry.
fn check_references(
    node: &SchemaNode,
    registry: &SchemaRegistry,
    location: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match node {
        SchemaNode::Reference { reference } => {
            if registry.resolve(reference).is_none() {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    code: "E002".into(),
                    location: location.to_string(),
                    message: format!("unresolved schema reference: {}", reference),
                });
            }
        }
        SchemaNode::Object { properties, .. } => {
            for (name, child) in properties {
                check_references(
                    child,
                    registry,
                    &format!("{}/{}", location, name),
                    diagnostics,
                );
            }
        }
        SchemaNode::Array { items } => {
            check_references(items, registry, &format!("{}/items", location), diagnostics);
        }
        SchemaNode::Scalar { .. } => {}
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .md files.
/// If `strict` is true, warnings count as failures.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_markdown_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single document file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let display = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();
    let document = match load_document(file) {
        Ok(text) => text,
        Err(e) => {
            return FileResult {
                file: display,
                status: FileStatus::Error,
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    code: "E001".into(),
                    location: "/".into(),
                    message: format!("cannot read file: {}", e),
                }],
            };
        }
    };

    let diagnostics = lint_document(&document);
    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);
    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: display,
        status,
        diagnostics,
    }
}

/// Collect all .md files in a path (file or directory).
fn collect_markdown_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files = Vec::new();
    collect_into(path, &mut files);
    files.sort();
    files
}

fn collect_into(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_into(&path, files);
        } else if path.extension().is_some_and(|e| e == "md") {
            files.push(path);
        }
    }
}
