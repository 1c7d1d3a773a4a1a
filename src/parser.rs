//! Document parsing - segments a Markdown export into endpoint records and a
//! schema registry.
//!
//! The parser is deliberately permissive: a section or table it cannot match
//! is treated as absent, never as an error. The only internal failure site is
//! the JSON parse of an example body block, which is caught and discarded.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::table::{
    collect_rows, header_matches, is_separator, reconstruct, schema_ref, split_cells,
    RequiredPolicy,
};
use crate::types::{
    json_type_name, Diagnostic, EndpointRecord, ParamLocation, ParameterDescriptor,
    RequestBodyDescriptor, ResponseDescriptor, SchemaNode, SchemaRegistry, AUTH_FOLDER,
    PARAMS_TABLE_HEADER, RESPONSES_TABLE_HEADER, SCHEMA_TABLE_HEADER,
};

/// Matches a schema-definition anchor like `<a id="schemaUser"></a>`.
static RE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a\s+id="schema_?([A-Za-z0-9][A-Za-z0-9_]*)"\s*>\s*</a>"#).unwrap()
});

/// Matches the status code tagging a per-status schema table.
static RE_STATUS_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-5][0-9]{2})\b").unwrap());

/// Result of parsing one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// Endpoints in document order.
    pub endpoints: Vec<EndpointRecord>,
    /// Reusable schema fragments extracted from definition anchors.
    pub registry: SchemaRegistry,
    /// Non-fatal findings collected along the way.
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a documentation export into endpoint records and a schema registry.
///
/// Never fails: unrecognized input is omitted and findings surface in
/// `diagnostics`. Safe to call concurrently - no shared state is touched.
pub fn parse(document: &str) -> ParseOutcome {
    let mut diagnostics = Vec::new();
    let registry = extract_registry(document, &mut diagnostics);
    let endpoints = extract_endpoints(document, &registry, &mut diagnostics);
    ParseOutcome {
        endpoints,
        registry,
        diagnostics,
    }
}

// --- Registry extraction ---

/// Scan for schema-definition anchors and rebuild each section's first
/// six-column table into a registry entry.
fn extract_registry(document: &str, diagnostics: &mut Vec<Diagnostic>) -> SchemaRegistry {
    let lines: Vec<&str> = document.lines().collect();
    let mut registry = SchemaRegistry::new();

    let anchors: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| RE_ANCHOR.captures(line).map(|caps| (i, caps[1].to_string())))
        .collect();

    for (position, (start, name)) in anchors.iter().enumerate() {
        let end = anchors
            .get(position + 1)
            .map(|(next, _)| *next)
            .unwrap_or(lines.len());
        let section = &lines[*start..end];

        let Some(header) = section.iter().position(|line| {
            split_cells(line).is_some_and(|cells| header_matches(&cells, SCHEMA_TABLE_HEADER))
        }) else {
            continue;
        };

        let (rows, _) = collect_rows(section, header);
        let context = format!("schemas/{}", name.to_lowercase());
        let root = reconstruct(&rows, RequiredPolicy::Exact, &context, diagnostics);
        registry.register(name, root);
    }

    registry
}

// --- Folder and endpoint segmentation ---

fn extract_endpoints(
    document: &str,
    registry: &SchemaRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<EndpointRecord> {
    let mut endpoints = Vec::new();
    for (folder, body) in folder_sections(document) {
        if folder == AUTH_FOLDER {
            continue;
        }
        for section in endpoint_sections(&body) {
            if let Some(record) = parse_endpoint(&folder, &section, registry, diagnostics) {
                endpoints.push(record);
            }
        }
    }
    endpoints
}

/// Split the document on top-level headings. Text before the first heading
/// is skipped.
fn folder_sections(document: &str) -> Vec<(String, String)> {
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in document.lines() {
        if let Some(name) = heading(line, 1) {
            if let Some((folder, body)) = current.take() {
                sections.push((folder, body.join("\n")));
            }
            current = Some((name.to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((folder, body)) = current {
        sections.push((folder, body.join("\n")));
    }
    sections
}

/// Split a folder body on second-level headings, keeping the heading line
/// with its section. Folder narrative before the first endpoint is skipped.
fn endpoint_sections(body: &str) -> Vec<String> {
    let mut sections: Vec<Vec<&str>> = Vec::new();
    for line in body.lines() {
        if heading(line, 2).is_some() {
            sections.push(vec![line]);
        } else if let Some(current) = sections.last_mut() {
            current.push(line);
        }
    }
    sections.into_iter().map(|s| s.join("\n")).collect()
}

/// The text of a heading at exactly `level`, if this line is one.
fn heading(line: &str, level: usize) -> Option<&str> {
    let mut rest = line;
    for _ in 0..level {
        rest = rest.strip_prefix('#')?;
    }
    if rest.starts_with('#') {
        return None;
    }
    Some(rest.strip_prefix(' ')?.trim())
}

/// The text of a heading line at any level.
fn label_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed.trim_start_matches('#').trim())
}

/// Index of the heading line whose text equals `label`, case-insensitive.
fn find_label(lines: &[&str], label: &str) -> Option<usize> {
    lines
        .iter()
        .position(|line| label_text(line).is_some_and(|text| text.eq_ignore_ascii_case(label)))
}

/// Index of the first line after `label` whose cells match `header`, stopping
/// at the next sub-heading.
fn table_header_after(lines: &[&str], label: usize, header: &[&str]) -> Option<usize> {
    for (offset, line) in lines[label + 1..].iter().enumerate() {
        if label_text(line).is_some() {
            return None;
        }
        if let Some(cells) = split_cells(line) {
            if header_matches(&cells, header) {
                return Some(label + 1 + offset);
            }
        }
    }
    None
}

// --- Endpoint parsing ---

fn parse_endpoint(
    folder: &str,
    section: &str,
    registry: &SchemaRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<EndpointRecord> {
    let lines: Vec<&str> = section.lines().collect();
    let head = heading(lines.first()?, 2)?;

    // First two tokens are the method and path; anything after is a summary.
    let mut tokens = head.split_whitespace();
    let method = tokens.next()?.to_uppercase();
    let path = tokens.next()?.to_string();
    let rest: Vec<&str> = tokens.collect();
    let summary = if rest.is_empty() {
        format!("{} {}", method, path)
    } else {
        rest.join(" ")
    };

    let description = lines
        .get(1)
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('>') && !line.starts_with('#'))
        .unwrap_or("")
        .to_string();

    let context = format!("{}/{} {}", folder, method, path);
    let (parameters, mut request_body) = extract_params(&lines);
    if request_body.is_none() {
        request_body = extract_body_example(&lines);
    }
    let responses = extract_responses(&lines, &context, diagnostics);

    Some(EndpointRecord {
        method,
        path,
        summary,
        description,
        folder: folder.to_string(),
        parameters,
        request_body,
        responses,
        schemas: registry.clone(),
        source: section.to_string(),
    })
}

/// Walk the params table. A row whose location is `body` seeds the request
/// body instead of becoming a parameter.
fn extract_params(lines: &[&str]) -> (Vec<ParameterDescriptor>, Option<RequestBodyDescriptor>) {
    let mut parameters = Vec::new();
    let mut body = None;

    let Some(label) = find_label(lines, "Params") else {
        return (parameters, body);
    };
    let Some(header) = table_header_after(lines, label, PARAMS_TABLE_HEADER) else {
        return (parameters, body);
    };

    let mut index = header + 1;
    while index < lines.len() {
        let Some(cells) = split_cells(lines[index]) else {
            break;
        };
        index += 1;
        if is_separator(&cells) || cells.len() < 2 {
            continue;
        }
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        let (name, location, type_col) = (cell(0), cell(1), cell(2));

        if location.eq_ignore_ascii_case("body") {
            let schema = match schema_ref(&type_col) {
                Some(target) => SchemaNode::reference(target),
                None => SchemaNode::scalar(type_col.trim().to_lowercase()),
            };
            body = Some(RequestBodyDescriptor { schema });
            continue;
        }

        let description = cell(4);
        let description = if description.eq_ignore_ascii_case("none") {
            String::new()
        } else {
            description
        };
        parameters.push(ParameterDescriptor {
            name,
            location: ParamLocation::parse(&location).unwrap_or(ParamLocation::Query),
            schema_type: type_col.trim().to_lowercase(),
            required: RequiredPolicy::Lenient.is_required(&cell(3)),
            description,
        });
    }

    (parameters, body)
}

/// Fall back to a fenced example-JSON block under a `> Body ...` marker and
/// synthesize a flat object schema from the runtime type of each value.
///
/// A malformed example degrades to "no request body inferred".
fn extract_body_example(lines: &[&str]) -> Option<RequestBodyDescriptor> {
    let marker = lines.iter().position(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with('>') && trimmed.to_lowercase().contains("body")
    })?;
    let open = marker + lines[marker..].iter().position(|l| l.trim() == "```json")?;
    let close = open + 1 + lines[open + 1..].iter().position(|l| l.trim() == "```")?;

    let value: Value = serde_json::from_str(&lines[open + 1..close].join("\n")).ok()?;
    let example = value.as_object()?;

    let mut schema = SchemaNode::object();
    if let SchemaNode::Object { properties, .. } = &mut schema {
        for (key, sample) in example {
            // Never nested: composite values become empty shells.
            let node = match sample {
                Value::Object(_) => SchemaNode::object(),
                Value::Array(_) => SchemaNode::array(SchemaNode::object()),
                other => SchemaNode::scalar(json_type_name(other)),
            };
            properties.insert(key.clone(), node);
        }
    }
    Some(RequestBodyDescriptor { schema })
}

/// Walk the responses summary table, then let per-status schema tables under
/// the data-schema label overwrite its content (last-write-wins: the summary
/// form and the full form routinely both appear).
fn extract_responses(
    lines: &[&str],
    context: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> IndexMap<String, ResponseDescriptor> {
    let mut responses = IndexMap::new();

    if let Some(label) = find_label(lines, "Responses") {
        if let Some(header) = table_header_after(lines, label, RESPONSES_TABLE_HEADER) {
            let mut index = header + 1;
            while index < lines.len() {
                let Some(cells) = split_cells(lines[index]) else {
                    break;
                };
                index += 1;
                if is_separator(&cells) || cells.len() < 2 {
                    continue;
                }
                let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
                responses.insert(
                    cell(0),
                    ResponseDescriptor {
                        description: cell(2),
                        content: response_content(&cell(3)),
                    },
                );
            }
        }
    }

    if let Some(label) = find_label(lines, "Responses Data Schema") {
        let mut pending: Option<String> = None;
        let mut index = label + 1;
        while index < lines.len() {
            let line = lines[index];
            if let Some(cells) = split_cells(line) {
                if header_matches(&cells, SCHEMA_TABLE_HEADER) {
                    let (rows, next) = collect_rows(lines, index);
                    if let Some(status) = pending.take() {
                        let tree = reconstruct(
                            &rows,
                            RequiredPolicy::Exact,
                            &format!("{}/responses/{}", context, status),
                            diagnostics,
                        );
                        let entry =
                            responses
                                .entry(status)
                                .or_insert_with(|| ResponseDescriptor {
                                    description: String::new(),
                                    content: None,
                                });
                        entry.content = Some(tree);
                    }
                    index = next;
                    continue;
                }
            } else if label_text(line).is_some() {
                break;
            } else if let Some(caps) = RE_STATUS_TAG.captures(line) {
                pending = Some(caps[1].to_string());
            }
            index += 1;
        }
    }

    responses
}

/// Content for a responses-table schema cell: `none` and empty mean no body,
/// `inline` an anonymous object, a reference marker points at the registry.
fn response_content(schema_col: &str) -> Option<SchemaNode> {
    if schema_col.is_empty() || schema_col.eq_ignore_ascii_case("none") {
        return None;
    }
    if schema_col.eq_ignore_ascii_case("inline") {
        return Some(SchemaNode::object());
    }
    schema_ref(schema_col).map(SchemaNode::reference)
}
