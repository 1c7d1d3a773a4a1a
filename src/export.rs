//! Document exporters - render the parsed model as a structured spec or as
//! flattened Markdown.
//!
//! Both exporters are pure functions over the same model the parser emits;
//! they have no awareness of provenance and render whatever is present,
//! never erroring on structurally incomplete records.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::ExportError;
use crate::types::{
    EndpointRecord, ParameterDescriptor, ResponseDescriptor, SchemaNode, JSON_MEDIA_TYPE,
};

/// How same-named schema fragments from different endpoints combine in the
/// exported components map.
pub trait MergeStrategy {
    /// Fold `node` into `schemas` under `name`.
    fn merge(
        &self,
        schemas: &mut IndexMap<String, SchemaNode>,
        name: &str,
        node: &SchemaNode,
    ) -> Result<(), ExportError>;
}

/// Later endpoints overwrite earlier ones. Matches the observed exporter
/// behavior; merge order across re-exports is not guaranteed stable.
pub struct LastWriteWins;

impl MergeStrategy for LastWriteWins {
    fn merge(
        &self,
        schemas: &mut IndexMap<String, SchemaNode>,
        name: &str,
        node: &SchemaNode,
    ) -> Result<(), ExportError> {
        schemas.insert(name.to_string(), node.clone());
        Ok(())
    }
}

/// Rejects when two endpoints register different shapes under one name.
/// Re-registering an identical fragment is not a conflict.
pub struct RejectOnConflict;

impl MergeStrategy for RejectOnConflict {
    fn merge(
        &self,
        schemas: &mut IndexMap<String, SchemaNode>,
        name: &str,
        node: &SchemaNode,
    ) -> Result<(), ExportError> {
        match schemas.get(name) {
            Some(existing) if existing != node => Err(ExportError::SchemaConflict {
                name: name.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                schemas.insert(name.to_string(), node.clone());
                Ok(())
            }
        }
    }
}

/// Render endpoints as a structured specification object.
///
/// Produces `{ title, version, paths, components.schemas }` with one
/// `paths[path][method]` entry per distinct pair; duplicate pairs collapse to
/// the later record. Schema fragments merge last-write-wins.
pub fn to_structured_spec(endpoints: &[EndpointRecord], title: &str) -> Value {
    // LastWriteWins never conflicts.
    to_structured_spec_with(endpoints, title, &LastWriteWins).unwrap_or_default()
}

/// Like [`to_structured_spec`] but with an explicit schema-merge strategy.
///
/// # Errors
///
/// Returns whatever the strategy raises, e.g. `ExportError::SchemaConflict`
/// from [`RejectOnConflict`].
pub fn to_structured_spec_with(
    endpoints: &[EndpointRecord],
    title: &str,
    strategy: &dyn MergeStrategy,
) -> Result<Value, ExportError> {
    let mut paths: Map<String, Value> = Map::new();
    let mut schemas: IndexMap<String, SchemaNode> = IndexMap::new();

    for record in endpoints {
        let item = paths
            .entry(record.path.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(operations) = item {
            operations.insert(record.method.to_lowercase(), operation_object(record));
        }
        for (name, node) in record.schemas.iter() {
            strategy.merge(&mut schemas, name, node)?;
        }
    }

    let mut schema_map = Map::new();
    for (name, node) in &schemas {
        schema_map.insert(name.clone(), node.to_openapi());
    }

    Ok(json!({
        "title": title,
        "version": "1.0.0",
        "paths": paths,
        "components": { "schemas": schema_map }
    }))
}

fn operation_object(record: &EndpointRecord) -> Value {
    let mut operation = Map::new();
    operation.insert("summary".into(), json!(record.summary));
    operation.insert("description".into(), json!(record.description));
    operation.insert("tags".into(), json!([record.folder]));
    operation.insert(
        "parameters".into(),
        Value::Array(record.parameters.iter().map(parameter_object).collect()),
    );
    if let Some(body) = &record.request_body {
        operation.insert("requestBody".into(), media_content(&body.schema));
    }

    let mut responses = Map::new();
    for (status, response) in &record.responses {
        let mut entry = Map::new();
        entry.insert("description".into(), json!(response.description));
        if let Some(node) = &response.content {
            if let Value::Object(content) = media_content(node) {
                entry.extend(content);
            }
        }
        responses.insert(status.clone(), Value::Object(entry));
    }
    operation.insert("responses".into(), Value::Object(responses));

    Value::Object(operation)
}

/// `{ "content": { "application/json": { "schema": ... } } }`
fn media_content(node: &SchemaNode) -> Value {
    let mut media = Map::new();
    media.insert(JSON_MEDIA_TYPE.to_string(), json!({ "schema": node.to_openapi() }));
    let mut wrapper = Map::new();
    wrapper.insert("content".into(), Value::Object(media));
    Value::Object(wrapper)
}

fn parameter_object(param: &ParameterDescriptor) -> Value {
    json!({
        "name": param.name,
        "in": param.location.as_str(),
        "required": param.required,
        "description": param.description,
        "schema": { "type": param.schema_type }
    })
}

impl SchemaNode {
    /// Render this node as an OpenAPI-style schema value.
    pub fn to_openapi(&self) -> Value {
        match self {
            SchemaNode::Reference { reference } => {
                let name = reference.strip_prefix("schemas/").unwrap_or(reference);
                json!({ "$ref": format!("#/components/schemas/{}", name) })
            }
            SchemaNode::Object {
                title,
                properties,
                required,
            } => {
                let mut map = Map::new();
                map.insert("type".into(), json!("object"));
                if let Some(title) = title {
                    map.insert("title".into(), json!(title));
                }
                let mut props = Map::new();
                for (name, child) in properties {
                    props.insert(name.clone(), child.to_openapi());
                }
                map.insert("properties".into(), Value::Object(props));
                if !required.is_empty() {
                    map.insert("required".into(), json!(required));
                }
                Value::Object(map)
            }
            SchemaNode::Array { items } => json!({ "type": "array", "items": items.to_openapi() }),
            SchemaNode::Scalar { kind } => json!({ "type": kind }),
        }
    }
}

/// Render endpoints as a flattened Markdown document grouped by folder.
pub fn to_flat_markdown(endpoints: &[EndpointRecord], title: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", title));

    let mut folders: IndexMap<&str, Vec<&EndpointRecord>> = IndexMap::new();
    for record in endpoints {
        folders.entry(record.folder.as_str()).or_default().push(record);
    }

    for (folder, records) in &folders {
        output.push_str(&format!("## {}\n\n", folder));
        for record in records {
            render_endpoint(&mut output, record);
        }
    }
    output
}

fn render_endpoint(output: &mut String, record: &EndpointRecord) {
    output.push_str(&format!("### {} {}\n\n", record.method, record.path));
    if !record.description.is_empty() {
        output.push_str(&format!("{}\n\n", record.description));
    }

    if !record.parameters.is_empty() {
        output.push_str("#### Params\n\n");
        output.push_str("|Name|In|Type|Required|Description|\n");
        output.push_str("|---|---|---|---|---|\n");
        for param in &record.parameters {
            output.push_str(&format!(
                "|{}|{}|{}|{}|{}|\n",
                param.name,
                param.location.as_str(),
                param.schema_type,
                param.required,
                param.description
            ));
        }
        output.push('\n');
    }

    if let Some(body) = &record.request_body {
        output.push_str("#### Request Body\n\n");
        match &body.schema {
            SchemaNode::Object {
                properties,
                required,
                ..
            } => {
                output.push_str("|Name|Type|Required|Description|\n");
                output.push_str("|---|---|---|---|\n");
                for (name, child) in properties {
                    output.push_str(&format!(
                        "|{}|{}|{}||\n",
                        name,
                        type_label(child),
                        required.iter().any(|r| r == name)
                    ));
                }
                output.push('\n');
            }
            // Reference and scalar bodies render as a one-line type label.
            other => output.push_str(&format!("{}\n\n", type_label(other))),
        }
    }

    if !record.responses.is_empty() {
        output.push_str("#### Responses\n\n");
        output.push_str("|Status|Meaning|Description|Schema|\n");
        output.push_str("|---|---|---|---|\n");
        for (status, response) in &record.responses {
            output.push_str(&format!(
                "|{}|{}|{}|{}|\n",
                status,
                status_reason(status),
                response.description,
                content_label(response)
            ));
        }
        output.push('\n');
    }
}

/// Short label for a schema node in a table cell.
fn type_label(node: &SchemaNode) -> String {
    match node {
        SchemaNode::Reference { .. } => node.reference_name().unwrap_or("ref").to_string(),
        SchemaNode::Object { .. } => "object".to_string(),
        SchemaNode::Array { items } => format!("{}[]", type_label(items)),
        SchemaNode::Scalar { kind } => kind.clone(),
    }
}

/// Heuristic schema-column label: reference name, `inline`, or `none`.
fn content_label(response: &ResponseDescriptor) -> String {
    match &response.content {
        None => "none".to_string(),
        Some(node) => match node.reference_name() {
            Some(name) => name.to_string(),
            None => "inline".to_string(),
        },
    }
}

fn status_reason(status: &str) -> &'static str {
    match status {
        "200" => "OK",
        "201" => "Created",
        "202" => "Accepted",
        "204" => "No Content",
        "301" => "Moved Permanently",
        "304" => "Not Modified",
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not Found",
        "409" => "Conflict",
        "422" => "Unprocessable Entity",
        "500" => "Internal Server Error",
        "503" => "Service Unavailable",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParamLocation, SchemaRegistry};
    use indexmap::IndexMap;

    fn record(method: &str, path: &str, folder: &str) -> EndpointRecord {
        EndpointRecord {
            method: method.to_string(),
            path: path.to_string(),
            summary: format!("{} {}", method, path),
            description: String::new(),
            folder: folder.to_string(),
            parameters: Vec::new(),
            request_body: None,
            responses: IndexMap::new(),
            schemas: SchemaRegistry::new(),
            source: String::new(),
        }
    }

    #[test]
    fn spec_envelope_shape() {
        let spec = to_structured_spec(&[record("GET", "/users", "Users")], "Demo");
        assert_eq!(spec["title"], "Demo");
        assert_eq!(spec["version"], "1.0.0");
        assert!(spec["paths"]["/users"]["get"].is_object());
        assert!(spec["components"]["schemas"].is_object());
        assert_eq!(spec["paths"]["/users"]["get"]["tags"], json!(["Users"]));
    }

    #[test]
    fn one_entry_per_path_method_pair() {
        let records = [
            record("GET", "/users", "Users"),
            record("POST", "/users", "Users"),
            record("GET", "/orders", "Orders"),
        ];
        let spec = to_structured_spec(&records, "Demo");
        let paths = spec["paths"].as_object().unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths["/users"].as_object().unwrap().len(), 2);
        assert!(paths["/orders"]["get"].is_object());
    }

    #[test]
    fn parameter_rendering() {
        let mut rec = record("GET", "/users/{id}", "Users");
        rec.parameters.push(ParameterDescriptor {
            name: "id".into(),
            location: ParamLocation::Path,
            schema_type: "string".into(),
            required: true,
            description: "User id".into(),
        });
        let spec = to_structured_spec(&[rec], "Demo");
        let params = &spec["paths"]["/users/{id}"]["get"]["parameters"];
        assert_eq!(params[0]["name"], "id");
        assert_eq!(params[0]["in"], "path");
        assert_eq!(params[0]["required"], true);
        assert_eq!(params[0]["schema"]["type"], "string");
    }

    #[test]
    fn reference_body_and_response_rendering() {
        let mut rec = record("POST", "/users", "Users");
        rec.request_body = Some(crate::types::RequestBodyDescriptor {
            schema: SchemaNode::reference("User"),
        });
        rec.responses.insert(
            "201".into(),
            ResponseDescriptor {
                description: "Created".into(),
                content: Some(SchemaNode::reference("User")),
            },
        );
        rec.responses.insert(
            "204".into(),
            ResponseDescriptor {
                description: "Empty".into(),
                content: None,
            },
        );
        let spec = to_structured_spec(&[rec], "Demo");
        let op = &spec["paths"]["/users"]["post"];
        assert_eq!(
            op["requestBody"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/user"
        );
        assert_eq!(
            op["responses"]["201"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/user"
        );
        assert!(op["responses"]["204"].get("content").is_none());
        assert_eq!(op["responses"]["204"]["description"], "Empty");
    }

    #[test]
    fn registry_fragments_merge_into_components() {
        let mut rec = record("GET", "/users", "Users");
        rec.schemas.register("User", SchemaNode::object());
        let spec = to_structured_spec(&[rec], "Demo");
        let user = &spec["components"]["schemas"]["user"];
        assert_eq!(user["type"], "object");
        assert_eq!(user["title"], "User");
    }

    #[test]
    fn last_write_wins_merge() {
        let mut first = record("GET", "/a", "A");
        first.schemas.register("User", SchemaNode::object());
        let mut second = record("GET", "/b", "B");
        let mut conflicting = SchemaNode::object();
        if let SchemaNode::Object { properties, .. } = &mut conflicting {
            properties.insert("id".into(), SchemaNode::scalar("string"));
        }
        second.schemas.register("User", conflicting);

        let spec = to_structured_spec(&[first, second], "Demo");
        assert!(spec["components"]["schemas"]["user"]["properties"]["id"].is_object());
    }

    #[test]
    fn reject_on_conflict_errors_on_mismatch() {
        let mut first = record("GET", "/a", "A");
        first.schemas.register("User", SchemaNode::object());
        let mut second = record("GET", "/b", "B");
        let mut conflicting = SchemaNode::object();
        if let SchemaNode::Object { properties, .. } = &mut conflicting {
            properties.insert("id".into(), SchemaNode::scalar("string"));
        }
        second.schemas.register("User", conflicting);

        let result = to_structured_spec_with(&[first, second], "Demo", &RejectOnConflict);
        assert!(matches!(
            result,
            Err(ExportError::SchemaConflict { name }) if name == "user"
        ));
    }

    #[test]
    fn reject_on_conflict_allows_identical_fragments() {
        let mut first = record("GET", "/a", "A");
        first.schemas.register("User", SchemaNode::object());
        let mut second = record("GET", "/b", "B");
        second.schemas.register("User", SchemaNode::object());

        let result = to_structured_spec_with(&[first, second], "Demo", &RejectOnConflict);
        assert!(result.is_ok());
    }

    #[test]
    fn schema_node_openapi_rendering() {
        let mut node = SchemaNode::object();
        if let SchemaNode::Object {
            properties,
            required,
            ..
        } = &mut node
        {
            properties.insert("id".into(), SchemaNode::scalar("string"));
            properties.insert(
                "tags".into(),
                SchemaNode::array(SchemaNode::scalar("string")),
            );
            required.push("id".into());
        }
        let value = node.to_openapi();
        assert_eq!(value["type"], "object");
        assert_eq!(value["properties"]["id"]["type"], "string");
        assert_eq!(value["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(value["required"], json!(["id"]));
    }

    #[test]
    fn flat_markdown_groups_by_folder() {
        let records = [
            record("GET", "/users", "Users"),
            record("GET", "/orders", "Orders"),
            record("POST", "/users", "Users"),
        ];
        let text = to_flat_markdown(&records, "Demo API");

        assert!(text.starts_with("# Demo API\n"));
        let users = text.find("## Users").unwrap();
        let orders = text.find("## Orders").unwrap();
        // First-seen folder order, one heading per folder.
        assert!(users < orders);
        assert_eq!(text.matches("## Users").count(), 1);
        assert!(text.contains("### GET /users"));
        assert!(text.contains("### POST /users"));
    }

    #[test]
    fn flat_markdown_response_labels() {
        let mut rec = record("GET", "/users", "Users");
        rec.responses.insert(
            "200".into(),
            ResponseDescriptor {
                description: "The users".into(),
                content: Some(SchemaNode::reference("User")),
            },
        );
        rec.responses.insert(
            "204".into(),
            ResponseDescriptor {
                description: "Nothing".into(),
                content: None,
            },
        );
        rec.responses.insert(
            "400".into(),
            ResponseDescriptor {
                description: "Bad".into(),
                content: Some(SchemaNode::object()),
            },
        );
        let text = to_flat_markdown(&[rec], "Demo");
        assert!(text.contains("|200|OK|The users|user|"));
        assert!(text.contains("|204|No Content|Nothing|none|"));
        assert!(text.contains("|400|Bad Request|Bad|inline|"));
    }

    #[test]
    fn flat_markdown_reference_body_is_one_line() {
        let mut rec = record("POST", "/users", "Users");
        rec.request_body = Some(crate::types::RequestBodyDescriptor {
            schema: SchemaNode::reference("User"),
        });
        let text = to_flat_markdown(&[rec], "Demo");
        assert!(text.contains("#### Request Body\n\nuser\n"));
        assert!(!text.contains("|Name|Type|Required|Description|"));
    }
}
