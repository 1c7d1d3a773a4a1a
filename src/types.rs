//! Core model types for the documentation interchange engine.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Marker character counted in a schema-table name column to encode nesting depth.
pub const DEPTH_MARKER: char = '»';

/// Reserved row name denoting an open-ended additional-properties slot.
///
/// Rows carrying this name are recognized and discarded: the slot is not
/// representable in the output tree.
pub const ADDITIONAL_PROPERTIES_NAME: &str = "additionalProperties";

/// Media type used for request and response content.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Top-level heading reserved for authentication narrative; never a folder.
pub const AUTH_FOLDER: &str = "Authentication";

/// Header cells of a six-column schema table, compared case-insensitively.
pub const SCHEMA_TABLE_HEADER: &[&str] = &[
    "name",
    "type",
    "required",
    "restrictions",
    "title",
    "description",
];

/// Header cells of a five-column parameter table.
pub const PARAMS_TABLE_HEADER: &[&str] = &["name", "in", "type", "required", "description"];

/// Header cells of a four-column responses table.
pub const RESPONSES_TABLE_HEADER: &[&str] = &["status", "meaning", "description", "schema"];

/// Returns the JSON type name of an example value, used when inferring a
/// body schema from a fenced example block.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One node of a schema tree.
///
/// The variants are mutually exclusive by construction: a node is either a
/// reference to a registry entry or a concrete shape, never both. An array
/// always carries exactly one `items` child and never a properties map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaNode {
    /// Points at a named registry entry instead of carrying its own shape.
    Reference {
        /// Normalized target, e.g. `schemas/user`.
        reference: String,
    },
    /// An object with named properties.
    Object {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        properties: IndexMap<String, SchemaNode>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
    },
    /// An array of one element shape.
    Array { items: Box<SchemaNode> },
    /// A scalar leaf. `kind` is an open string so unknown base types pass
    /// through opaquely.
    Scalar { kind: String },
}

impl SchemaNode {
    /// Fresh object node with no properties.
    pub fn object() -> Self {
        SchemaNode::Object {
            title: None,
            properties: IndexMap::new(),
            required: Vec::new(),
        }
    }

    /// Scalar node of the given kind.
    pub fn scalar(kind: impl Into<String>) -> Self {
        SchemaNode::Scalar { kind: kind.into() }
    }

    /// Array node wrapping the given element shape.
    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
        }
    }

    /// Reference node targeting the registry entry for `name`.
    ///
    /// The target is normalized to `schemas/<name lower-cased>`.
    pub fn reference(name: &str) -> Self {
        SchemaNode::Reference {
            reference: format!("schemas/{}", name.to_lowercase()),
        }
    }

    /// The bare registry name of a reference node, if this is one.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            SchemaNode::Reference { reference } => {
                Some(reference.strip_prefix("schemas/").unwrap_or(reference))
            }
            _ => None,
        }
    }

    /// True for object nodes.
    pub fn is_object(&self) -> bool {
        matches!(self, SchemaNode::Object { .. })
    }
}

/// Map of reusable named schema trees, keyed by lower-cased name.
///
/// Built once per document parse; exporters only read it. Iteration follows
/// registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaRegistry(IndexMap<String, SchemaNode>);

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root node under `name`. The key is lower-cased; the node's
    /// `title` is set to the original-case name when the root is an object.
    pub fn register(&mut self, name: &str, mut root: SchemaNode) {
        if let SchemaNode::Object { title, .. } = &mut root {
            *title = Some(name.to_string());
        }
        self.0.insert(name.to_lowercase(), root);
    }

    /// Look up an entry by bare name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.0.get(&name.to_lowercase())
    }

    /// Resolve a normalized reference target like `schemas/user`.
    pub fn resolve(&self, target: &str) -> Option<&SchemaNode> {
        self.get(target.strip_prefix("schemas/").unwrap_or(target))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where a parameter lives in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    /// Parse a location cell. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "cookie" => Some(ParamLocation::Cookie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
        }
    }
}

/// A single endpoint parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub location: ParamLocation,
    /// Flat scalar type name, lower-cased.
    pub schema_type: String,
    pub required: bool,
    pub description: String,
}

/// Request body of an endpoint; always JSON content in this dialect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBodyDescriptor {
    pub schema: SchemaNode,
}

/// One response entry, keyed externally by its status-code string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDescriptor {
    pub description: String,
    /// JSON content schema; `None` when the response declares no body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<SchemaNode>,
}

/// A parsed endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointRecord {
    /// Upper-cased HTTP method.
    pub method: String,
    pub path: String,
    pub summary: String,
    pub description: String,
    /// Grouping label from the enclosing top-level heading; doubles as a tag.
    pub folder: String,
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyDescriptor>,
    pub responses: IndexMap<String, ResponseDescriptor>,
    /// Registry fragment parsed alongside this endpoint.
    pub schemas: SchemaRegistry,
    /// Verbatim section text the record was derived from. Display only.
    #[serde(skip)]
    pub source: String,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A non-fatal finding surfaced by the parser or linter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    /// Slash-separated context, e.g. `schemas/user/row 3`.
    pub location: String,
    pub message: String,
}
