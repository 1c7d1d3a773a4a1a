//! Schema-table reconstruction - rebuilds nested schema trees from the flat,
//! indentation-encoded rows of a pipe-delimited table.
//!
//! The source format linearizes an arbitrarily nested object/array tree into
//! rows ordered by visual indentation: a row's parent is the most recent row
//! at a strictly lower depth, not the immediately preceding row. Rebuilding
//! the tree therefore walks an ancestor stack.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Diagnostic, SchemaNode, Severity, ADDITIONAL_PROPERTIES_NAME, DEPTH_MARKER};

/// Matches a `#schemaName` reference marker anywhere in a type cell.
static RE_SCHEMA_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#schema_?([A-Za-z0-9][A-Za-z0-9_]*)").unwrap());

/// Extract the referenced schema name from a type cell, if present.
pub fn schema_ref(cell: &str) -> Option<&str> {
    RE_SCHEMA_REF
        .captures(cell)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Split a pipe-delimited table line into trimmed cells.
///
/// Returns `None` for lines that are not table rows.
pub fn split_cells(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') {
        return None;
    }
    let mut cells: Vec<String> = trimmed.split('|').map(|c| c.trim().to_string()).collect();
    // Leading and trailing pipes produce empty edge fragments.
    cells.remove(0);
    if trimmed.ends_with('|') && !cells.is_empty() {
        cells.pop();
    }
    Some(cells)
}

/// True for delimiter rows like `|---|:---:|`.
pub fn is_separator(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells
            .iter()
            .all(|c| !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':'))
}

/// True when cells equal the fixed header exactly (case-insensitive).
pub fn header_matches(cells: &[String], header: &[&str]) -> bool {
    cells.len() == header.len()
        && cells
            .iter()
            .zip(header)
            .all(|(cell, want)| cell.eq_ignore_ascii_case(want))
}

/// One pre-split six-column schema-table row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub name: String,
    pub type_col: String,
    pub required: String,
    pub restrictions: String,
    pub title: String,
    pub description: String,
}

impl TableRow {
    /// Build a row from already-split cells. Columns beyond the sixth are
    /// ignored; fewer than two usable columns yields `None`.
    pub fn from_cells(cells: Vec<String>) -> Option<TableRow> {
        if cells.len() < 2 {
            return None;
        }
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        Some(TableRow {
            name: cell(0),
            type_col: cell(1),
            required: cell(2),
            restrictions: cell(3),
            title: cell(4),
            description: cell(5),
        })
    }

    /// Split a pipe-delimited line into a six-column row.
    pub fn from_line(line: &str) -> Option<TableRow> {
        let cells = split_cells(line)?;
        if is_separator(&cells) {
            return None;
        }
        TableRow::from_cells(cells)
    }

    /// Nesting depth: the count of depth markers in the name column.
    pub fn depth(&self) -> usize {
        self.name.matches(DEPTH_MARKER).count()
    }

    /// Property name with depth markers, asterisks, and whitespace stripped.
    pub fn clean_name(&self) -> String {
        self.name
            .chars()
            .filter(|c| *c != DEPTH_MARKER && *c != '*')
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Vocabulary accepted in a required cell.
///
/// Schema tables accept only the literal `true`; parameter tables also accept
/// `yes` anywhere in the cell. Two observed dialects, kept distinct on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredPolicy {
    /// Exact match on `true`, any case.
    Exact,
    /// Cell contains `yes` or `true`, any case.
    Lenient,
}

impl RequiredPolicy {
    pub fn is_required(&self, cell: &str) -> bool {
        match self {
            RequiredPolicy::Exact => cell.trim().eq_ignore_ascii_case("true"),
            RequiredPolicy::Lenient => {
                let lower = cell.to_lowercase();
                lower.contains("yes") || lower.contains("true")
            }
        }
    }
}

/// Collect the body rows of a table whose header sits at `header` in `lines`.
///
/// Skips separator rows; stops at the first non-table line. Returns the rows
/// and the index of the first line past the table.
pub fn collect_rows(lines: &[&str], header: usize) -> (Vec<TableRow>, usize) {
    let mut rows = Vec::new();
    let mut index = header + 1;
    while index < lines.len() {
        let Some(cells) = split_cells(lines[index]) else {
            break;
        };
        if !is_separator(&cells) {
            if let Some(row) = TableRow::from_cells(cells) {
                rows.push(row);
            }
        }
        index += 1;
    }
    (rows, index)
}

struct Frame {
    depth: isize,
    /// Property name this node attaches under when popped.
    name: String,
    required: bool,
    node: SchemaNode,
}

/// Rebuild a nested schema tree from pre-order rows.
///
/// Rows must be in pre-order (a parent row precedes its children); that is an
/// input precondition, not something this verifies. Rows whose cleaned name
/// is empty or equals the additional-properties sentinel are discarded. Depth
/// jumps of more than one level still attach to the nearest open ancestor,
/// but surface a `W001` diagnostic in `context`.
pub fn reconstruct(
    rows: &[TableRow],
    policy: RequiredPolicy,
    context: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> SchemaNode {
    let mut stack = vec![Frame {
        depth: -1,
        name: String::new(),
        required: false,
        node: SchemaNode::object(),
    }];
    let mut prev_depth: isize = -1;

    for (index, row) in rows.iter().enumerate() {
        let name = row.clean_name();
        if name.is_empty() || name == ADDITIONAL_PROPERTIES_NAME {
            continue;
        }

        let depth = row.depth() as isize;
        if depth > prev_depth + 1 {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                code: "W001".into(),
                location: format!("{}/row {}", context, index + 1),
                message: format!(
                    "nesting depth jumps from {} to {}; row attaches to the nearest open ancestor",
                    prev_depth.max(0),
                    depth
                ),
            });
        }
        prev_depth = depth;

        // A row's parent is the most recent row at a strictly lower depth.
        while stack.len() > 1 && stack.last().is_some_and(|f| f.depth >= depth) {
            pop_into_parent(&mut stack);
        }

        let type_col = row.type_col.trim();
        let is_array = is_array_type(type_col);
        let required = policy.is_required(&row.required);

        if let Some(target) = schema_ref(type_col) {
            // Reference rows carry no shape of their own and are never pushed.
            let reference = SchemaNode::reference(target);
            let node = if is_array {
                SchemaNode::array(reference)
            } else {
                reference
            };
            if let Some(parent) = stack.last_mut() {
                attach(&mut parent.node, &name, node, required);
            }
            continue;
        }

        let base = base_type(type_col);
        if base == "object" && !is_array {
            stack.push(Frame {
                depth,
                name,
                required,
                node: SchemaNode::object(),
            });
        } else if is_array {
            let items = if base.is_empty() || base == "object" || base == "array" {
                SchemaNode::object()
            } else {
                SchemaNode::scalar(base)
            };
            stack.push(Frame {
                depth,
                name,
                required,
                node: SchemaNode::array(items),
            });
        } else if let Some(parent) = stack.last_mut() {
            attach(&mut parent.node, &name, SchemaNode::scalar(base), required);
        }
    }

    while stack.len() > 1 {
        pop_into_parent(&mut stack);
    }
    stack
        .pop()
        .map(|frame| frame.node)
        .unwrap_or_else(SchemaNode::object)
}

fn pop_into_parent(stack: &mut Vec<Frame>) {
    if let Some(frame) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            attach(&mut parent.node, &frame.name, frame.node, frame.required);
        }
    }
}

/// Insert `child` under `name` in `parent`'s property map, redirecting into
/// the items object when the parent is an array. The required flag lands in
/// the required set of whichever object actually receives the property.
fn attach(parent: &mut SchemaNode, name: &str, child: SchemaNode, required: bool) {
    let slot = match parent {
        SchemaNode::Array { items } => {
            if !items.is_object() {
                **items = SchemaNode::object();
            }
            items.as_mut()
        }
        other => other,
    };
    if let SchemaNode::Object {
        properties,
        required: required_names,
        ..
    } = slot
    {
        properties.insert(name.to_string(), child);
        if required && !required_names.iter().any(|n| n == name) {
            required_names.push(name.to_string());
        }
    }
}

/// A type cell denotes an array when it carries a bracket pair or an `array` token.
fn is_array_type(type_col: &str) -> bool {
    if type_col.contains('[') && type_col.contains(']') {
        return true;
    }
    type_col
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token.eq_ignore_ascii_case("array"))
}

/// The type cell with any bracketed segment stripped, lower-cased.
fn base_type(type_col: &str) -> String {
    let mut base = type_col.to_string();
    if let (Some(open), Some(close)) = (base.find('['), base.rfind(']')) {
        if open < close {
            base.replace_range(open..=close, "");
        }
    }
    base.trim().to_lowercase()
}
