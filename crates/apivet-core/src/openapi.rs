//! OpenAPI document loading and validation.
//!
//! This module turns raw text into an `OpenApiContext` (JSON or YAML), and checks
//! that context through the `DocumentValidator` seam. The default validator,
//! `OpenApiValidator`, accepts OpenAPI 3.0/3.1 and Swagger 2.0 definitions and
//! returns the document with its local `$ref`s inlined.
//!
//! # Examples
//!
//! ```
//! use apivet_core::openapi::{DocumentValidator, OpenApiContext, OpenApiValidator};
//!
//! # fn main() -> apivet_core::Result<()> {
//! let spec = OpenApiContext::parse_content(
//!     "openapi: 3.0.0\ninfo:\n  title: Test\n  version: 1.0.0\npaths: {}",
//! )?;
//! let normalized = OpenApiValidator.validate(spec)?;
//! assert_eq!(normalized.title(), Some("Test"));
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::Path;

use crate::Error;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use serde_yaml::Value as YamlValue;
use tokio::fs;

/// Upper bound on the number of values produced while inlining `$ref`s.
const MAX_DEREFERENCED_NODES: usize = 1_000_000;

/// Upper bound on nesting (mappings, sequences and followed `$ref`s) while inlining.
/// Each level is one stack frame of `dereference`.
const MAX_DEREFERENCE_DEPTH: usize = 512;

/// A loaded (not yet validated) API definition
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct OpenApiContext {
    /// The raw JSON value of the document
    pub json: JsonValue,
}

impl OpenApiContext {
    /// Load a document from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).await?;
        Self::parse_content(&content)
    }

    /// Parse content as either JSON or YAML
    pub fn parse_content(content: &str) -> crate::Result<Self> {
        if content.trim().is_empty() {
            return Err(Error::syntax("The document is empty"));
        }

        // Try to parse as JSON first
        if let Ok(json) = serde_json::from_str::<JsonValue>(content) {
            return Ok(Self { json });
        }

        // JSON is a subset of YAML, so the YAML error is the one worth reporting
        let yaml: YamlValue = serde_yaml::from_str(content).map_err(|e| match e.location() {
            Some(location) => {
                let (line, column) = (location.line(), location.column());
                // serde_yaml appends the same position to its message
                let message = e
                    .to_string()
                    .replace(&format!(" at line {} column {}", line, column), "");
                Error::syntax_at(line, column, message)
            }
            None => Error::syntax(e.to_string()),
        })?;
        let json = yaml_to_json(yaml)?;
        Ok(Self { json })
    }

    /// The `openapi` version string, if present
    pub fn openapi_version(&self) -> Option<&str> {
        self.json.get("openapi")?.as_str()
    }

    /// The `swagger` version string, if present
    pub fn swagger_version(&self) -> Option<&str> {
        self.json.get("swagger")?.as_str()
    }

    /// Get the title of the API
    pub fn title(&self) -> Option<&str> {
        self.json.get("info")?.get("title")?.as_str()
    }

    /// Get the version of the API
    pub fn version(&self) -> Option<&str> {
        self.json.get("info")?.get("version")?.as_str()
    }

    /// Get the path map of the API
    pub fn paths(&self) -> Option<&JsonMap<String, JsonValue>> {
        self.json.get("paths")?.as_object()
    }

    /// Extract the fields reported back to the caller
    pub fn summary(&self) -> crate::Result<ApiSummary> {
        let title = self
            .title()
            .ok_or_else(|| Error::validation("Missing required field `info.title`"))?;
        let version = self
            .version()
            .ok_or_else(|| Error::validation("Missing required field `info.version`"))?;
        Ok(ApiSummary {
            openapi: self.openapi_version().map(String::from),
            swagger: self.swagger_version().map(String::from),
            info: ApiInfo {
                title: title.to_string(),
                version: version.to_string(),
            },
            paths: self.paths().cloned().unwrap_or_default(),
        })
    }
}

/// Summary of a validated API definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSummary {
    /// OpenAPI version (3.x documents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,
    /// Swagger version (2.0 documents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,
    pub info: ApiInfo,
    /// Path strings mapped to their (dereferenced) path items
    #[serde(default)]
    pub paths: JsonMap<String, JsonValue>,
}

impl ApiSummary {
    /// The format version, whichever of `openapi`/`swagger` is set
    pub fn spec_version(&self) -> &str {
        self.openapi
            .as_deref()
            .or(self.swagger.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
}

/// Checks a loaded document and returns its normalized form.
pub trait DocumentValidator: Send + Sync {
    fn validate(&self, document: OpenApiContext) -> crate::Result<OpenApiContext>;
}

/// Structural validator for OpenAPI 3.x and Swagger 2.0 definitions
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApiValidator;

impl DocumentValidator for OpenApiValidator {
    fn validate(&self, document: OpenApiContext) -> crate::Result<OpenApiContext> {
        let root = document.json.as_object().ok_or_else(|| {
            Error::validation(format!(
                "Expected an API definition object, found {}",
                describe(&document.json)
            ))
        })?;

        match (root.get("openapi"), root.get("swagger")) {
            (Some(version), _) => check_openapi3(&document.json, version)?,
            (None, Some(version)) => check_swagger2(&document.json, version)?,
            (None, None) => {
                return Err(Error::validation(
                    "Not a valid OpenAPI or Swagger definition: missing `openapi` or `swagger` version field",
                ));
            }
        }

        let mut budget = MAX_DEREFERENCED_NODES;
        let json = dereference(
            &document.json,
            &document.json,
            &mut Vec::new(),
            &mut budget,
            0,
        )?;
        Ok(OpenApiContext { json })
    }
}

fn check_openapi3(json: &JsonValue, version: &JsonValue) -> crate::Result<()> {
    let version = version
        .as_str()
        .ok_or_else(|| Error::validation("`openapi` must be a version string such as \"3.0.3\""))?;

    if version.starts_with("3.0.") {
        serde_json::from_value::<openapiv3::OpenAPI>(json.clone()).map_err(|e| {
            Error::validation(format!("Invalid OpenAPI {} definition: {}", version, e))
        })?;
        check_paths(json, true)
    } else if version.starts_with("3.1.") {
        check_info(json)?;
        let has_content = ["paths", "components", "webhooks"]
            .iter()
            .any(|key| json.get(key).is_some());
        if !has_content {
            return Err(Error::validation(
                "An OpenAPI 3.1 definition must contain at least one of `paths`, `components` or `webhooks`",
            ));
        }
        check_paths(json, false)
    } else {
        Err(Error::validation(format!(
            "Unsupported OpenAPI version: {}. Supported versions are 3.0.x and 3.1.x",
            version
        )))
    }
}

fn check_swagger2(json: &JsonValue, version: &JsonValue) -> crate::Result<()> {
    match version.as_str() {
        Some("2.0") => {}
        Some(other) => {
            return Err(Error::validation(format!(
                "Unsupported Swagger version: {}. Only 2.0 is supported",
                other
            )));
        }
        None => {
            return Err(Error::validation(
                "`swagger` must be the string \"2.0\"",
            ));
        }
    }
    check_info(json)?;
    check_paths(json, true)
}

fn check_info(json: &JsonValue) -> crate::Result<()> {
    let info = json
        .get("info")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| Error::validation("Missing required object `info`"))?;
    for field in ["title", "version"] {
        match info.get(field) {
            Some(JsonValue::String(_)) => {}
            Some(other) => {
                return Err(Error::validation(format!(
                    "`info.{}` must be a string, found {}",
                    field,
                    describe(other)
                )));
            }
            None => {
                return Err(Error::validation(format!(
                    "Missing required field `info.{}`",
                    field
                )));
            }
        }
    }
    Ok(())
}

fn check_paths(json: &JsonValue, required: bool) -> crate::Result<()> {
    let paths = match json.get("paths") {
        Some(JsonValue::Object(paths)) => paths,
        Some(other) => {
            return Err(Error::validation(format!(
                "`paths` must be an object, found {}",
                describe(other)
            )));
        }
        None if required => return Err(Error::validation("Missing required object `paths`")),
        None => return Ok(()),
    };
    for key in paths.keys() {
        if !key.starts_with('/') && !key.starts_with("x-") {
            return Err(Error::validation(format!(
                "Path `{}` must begin with a slash",
                key
            )));
        }
    }
    Ok(())
}

/// Inline local `$ref`s. References already being expanded further up the
/// current branch are left in place, so circular schemas terminate.
fn dereference(
    root: &JsonValue,
    node: &JsonValue,
    active: &mut Vec<String>,
    budget: &mut usize,
    depth: usize,
) -> crate::Result<JsonValue> {
    if depth > MAX_DEREFERENCE_DEPTH {
        return Err(Error::validation(format!(
            "$ref chain too deep: the document nests more than {} levels once references are resolved",
            MAX_DEREFERENCE_DEPTH
        )));
    }
    *budget = budget.checked_sub(1).ok_or_else(|| {
        Error::validation(format!(
            "Document expands to more than {} values once references are resolved",
            MAX_DEREFERENCED_NODES
        ))
    })?;

    match node {
        JsonValue::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(JsonValue::as_str) {
                if active.iter().any(|r| r == reference) {
                    return Ok(node.clone());
                }
                let target = resolve_ref(root, reference)?;
                active.push(reference.to_string());
                let resolved = dereference(root, target, active, budget, depth + 1);
                active.pop();
                return resolved;
            }
            let mut out = JsonMap::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), dereference(root, value, active, budget, depth + 1)?);
            }
            Ok(JsonValue::Object(out))
        }
        JsonValue::Array(items) => items
            .iter()
            .map(|item| dereference(root, item, active, budget, depth + 1))
            .collect::<crate::Result<Vec<_>>>()
            .map(JsonValue::Array),
        other => Ok(other.clone()),
    }
}

fn resolve_ref<'a>(root: &'a JsonValue, reference: &str) -> crate::Result<&'a JsonValue> {
    let pointer = reference.strip_prefix('#').ok_or_else(|| {
        Error::validation(format!(
            "Cannot resolve $ref `{}`: only references within the document are supported",
            reference
        ))
    })?;
    root.pointer(pointer).ok_or_else(|| {
        Error::validation(format!(
            "Cannot resolve $ref `{}`: no such location in the document",
            reference
        ))
    })
}

/// Convert a YAML tree into JSON, stringifying scalar mapping keys such as the
/// unquoted `200:` of a responses map.
fn yaml_to_json(value: YamlValue) -> crate::Result<JsonValue> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                JsonNumber::from_f64(f)
                    .map(JsonValue::Number)
                    .ok_or_else(|| Error::syntax(format!("Unsupported number `{}`", n)))?
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<crate::Result<Vec<_>>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut out = JsonMap::with_capacity(mapping.len());
            for (key, value) in mapping {
                out.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            JsonValue::Object(out)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_key(key: YamlValue) -> crate::Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => yaml_key(tagged.value),
        YamlValue::Sequence(_) | YamlValue::Mapping(_) => Err(Error::syntax(
            "Mapping keys must be scalars, found a sequence or mapping",
        )),
    }
}

fn describe(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
