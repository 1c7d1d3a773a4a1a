//! API documentation interchange engine.
//!
//! Parses the Markdown dialect exported by API-design tools into a normalized
//! model - endpoint records plus a registry of reusable schema fragments -
//! and renders that model back out as an OpenAPI-style spec or a flattened
//! Markdown document.
//!
//! # Example
//!
//! ```
//! use mdspec::{parse, to_structured_spec};
//!
//! let doc = "\
//! ## Users
//!
//! ### GET /users/{id}
//!
//! #### Params
//!
//! |Name|In|Type|Required|Description|
//! |---|---|---|---|---|
//! |id|path|string|yes|User id|
//! ";
//!
//! let outcome = parse(doc);
//! assert_eq!(outcome.endpoints.len(), 1);
//! assert_eq!(outcome.endpoints[0].method, "GET");
//! assert!(outcome.endpoints[0].parameters[0].required);
//!
//! let spec = to_structured_spec(&outcome.endpoints, "Demo API");
//! assert!(spec["paths"]["/users/{id}"]["get"].is_object());
//! ```
//!
//! # Design
//!
//! The parser is deliberately permissive: sections and tables it cannot
//! recognize are omitted rather than rejected, and non-fatal findings are
//! collected as [`Diagnostic`]s instead of errors. Schema tables linearize
//! nested trees into rows whose depth is encoded by a marker character in
//! the name column; [`reconstruct`] rebuilds the tree with an ancestor
//! stack. Everything is synchronous and side-effect-free - concurrent calls
//! are safe because no shared state exists.

mod error;
mod export;
mod linter;
mod loader;
mod parser;
mod table;
mod types;

pub use error::{ExportError, LoadError};
pub use export::{
    to_flat_markdown, to_structured_spec, to_structured_spec_with, LastWriteWins, MergeStrategy,
    RejectOnConflict,
};
pub use linter::{lint, lint_document, lint_file, FileResult, FileStatus, LintResult};
pub use loader::load_document;
pub use parser::{parse, ParseOutcome};
pub use table::{reconstruct, schema_ref, RequiredPolicy, TableRow};
pub use types::{
    Diagnostic, EndpointRecord, ParamLocation, ParameterDescriptor, RequestBodyDescriptor,
    ResponseDescriptor, SchemaNode, SchemaRegistry, Severity,
};
