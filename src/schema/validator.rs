//! Schema validation with detailed error reporting

use jsonschema::error::ValidationErrorKind;
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::schema::registry::SchemaRegistry;
use crate::store::{Collection, Document};

/// Validation error with source location information
#[derive(Debug, Error, Diagnostic)]
#[error("Schema validation failed: {summary}")]
#[diagnostic(code(dwalk::schema::validation_error))]
pub struct ValidationError {
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaViolation {
    fn new(message: String, hint: &str, span: SourceSpan, help: Option<String>) -> Self {
        Self {
            span,
            message,
            hint: hint.to_string(),
            help,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ValidationError {
    fn new(filename: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let summary = match violations.len() {
            1 => "1 error".to_string(),
            n => format!("{} errors", n),
        };
        Self {
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

/// Compiled schemas for every collection
pub struct Validator {
    compiled: HashMap<Collection, JsonValidator>,
}

impl Validator {
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut compiled = HashMap::new();

        for collection in Collection::all() {
            let Some(schema_str) = registry.get(*collection) else {
                continue;
            };
            match serde_json::from_str::<JsonValue>(schema_str)
                .map_err(|e| e.to_string())
                .and_then(|json| validator_for(&json).map_err(|e| e.to_string()))
            {
                Ok(validator) => {
                    compiled.insert(*collection, validator);
                }
                Err(e) => tracing::warn!(%collection, error = %e, "schema failed to compile"),
            }
        }

        Self { compiled }
    }

    /// Check YAML text against a collection's schema, collecting every violation
    pub fn validate(
        &self,
        content: &str,
        filename: &str,
        collection: Collection,
    ) -> Result<(), ValidationError> {
        let yaml_value: serde_yml::Value = serde_yml::from_str(content).map_err(|e| {
            let violation = SchemaViolation::new(
                format!("YAML parse error: {}", e),
                "invalid YAML",
                find_error_span(content, e.location()),
                Some("Check YAML syntax - proper indentation, colons, quotes".to_string()),
            );
            ValidationError::new(filename, content, vec![violation])
        })?;

        let json_value: JsonValue = serde_json::to_value(&yaml_value).map_err(|e| {
            let violation = SchemaViolation::new(
                format!("Failed to convert YAML to JSON: {}", e),
                "conversion error",
                (0, content.len()).into(),
                None,
            );
            ValidationError::new(filename, content, vec![violation])
        })?;

        let Some(schema) = self.compiled.get(&collection) else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = schema
            .iter_errors(&json_value)
            .map(|e| error_to_violation(content, &e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(filename, content, violations))
        }
    }

    /// Validate an in-memory document, rendered as YAML for the report
    pub fn validate_document(
        &self,
        doc: &Document,
        name: &str,
        collection: Collection,
    ) -> Result<(), ValidationError> {
        let content = serde_yml::to_string(doc).unwrap_or_default();
        self.validate(&content, name, collection)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&SchemaRegistry::default())
    }
}

fn error_to_violation(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = error.instance_path.to_string();
    SchemaViolation::new(
        format_schema_error(error),
        format_error_hint(error),
        find_path_span(content, &path),
        generate_help_message(error),
    )
}

fn format_schema_error(error: &JsonSchemaError) -> String {
    let path = if error.instance_path.as_str().is_empty() {
        "document root".to_string()
    } else {
        format!("'{}'", error.instance_path)
    };

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            format!("Missing required field: {} at {}", value_text(property), path)
        }
        ValidationErrorKind::Type { kind } => format!("Wrong type at {}: expected {:?}", path, kind),
        ValidationErrorKind::Enum { options } => format!(
            "Invalid value at {}: must be one of: {}",
            path,
            format_enum_options(options)
        ),
        ValidationErrorKind::Pattern { pattern } => {
            format!("Value at {} doesn't match pattern: {}", path, pattern)
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            format!("Unknown field(s) at {}: {}", path, unexpected.join(", "))
        }
        _ => format!("Validation error at {}: {}", path, error),
    }
}

fn value_text(value: &JsonValue) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

fn format_enum_options(options: &JsonValue) -> String {
    match options.as_array() {
        Some(arr) => arr.iter().map(value_text).collect::<Vec<_>>().join(", "),
        None => options.to_string(),
    }
}

fn format_error_hint(error: &JsonSchemaError) -> &'static str {
    match &error.kind {
        ValidationErrorKind::Required { .. } => "required field missing",
        ValidationErrorKind::Type { .. } => "wrong type",
        ValidationErrorKind::Enum { .. } => "invalid value",
        ValidationErrorKind::Pattern { .. } => "pattern mismatch",
        ValidationErrorKind::AdditionalProperties { .. } => "unknown field",
        _ => "validation error",
    }
}

fn generate_help_message(error: &JsonSchemaError) -> Option<String> {
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            Some(format!("Add the '{}' field to the document", value_text(property)))
        }
        ValidationErrorKind::Enum { options } => {
            Some(format!("Valid values: {}", format_enum_options(options)))
        }
        ValidationErrorKind::Pattern { pattern } if pattern.contains(r"\d{4}-\d{2}-\d{2}T") => {
            Some("Timestamps look like 2024-05-01T09:30:00.000Z".to_string())
        }
        ValidationErrorKind::Pattern { pattern } if pattern.contains(r"\d{2}:\d{2}") => {
            Some("Times are 24-hour HH:MM, e.g. 14:05".to_string())
        }
        ValidationErrorKind::Pattern { .. } => Some("Dates are YYYY-MM-DD".to_string()),
        ValidationErrorKind::AdditionalProperties { unexpected } if unexpected.len() == 1 => {
            Some(format!("Remove the '{}' field or check spelling", unexpected[0]))
        }
        ValidationErrorKind::AdditionalProperties { .. } => {
            Some("Remove unknown fields or check spelling".to_string())
        }
        _ => None,
    }
}

fn first_line_span(content: &str) -> SourceSpan {
    let len = content.find('\n').unwrap_or(content.len()).max(1);
    (0, len).into()
}

/// Span for a YAML parser error location
fn find_error_span(content: &str, location: Option<serde_yml::Location>) -> SourceSpan {
    let Some(loc) = location else {
        return first_line_span(content);
    };
    let line = loc.line().saturating_sub(1);
    let column = loc.column().saturating_sub(1);

    let offset: usize = content
        .lines()
        .take(line)
        .map(|l| l.len() + 1)
        .sum::<usize>()
        + column;
    let offset = offset.min(content.len());

    let rest = &content[offset..];
    let len = rest.find('\n').unwrap_or(rest.len()).max(1);
    (offset, len).into()
}

/// Span for a JSON pointer such as `/items/3/passed`
fn find_path_span(content: &str, json_path: &str) -> SourceSpan {
    let parts: Vec<&str> = json_path.split('/').filter(|s| !s.is_empty()).collect();

    // Array indices have no key of their own; fall back to the parent
    let key = parts
        .iter()
        .rev()
        .find(|p| p.parse::<usize>().is_err())
        .copied();

    key.and_then(|k| find_key_span(content, k))
        .unwrap_or_else(|| first_line_span(content))
}

/// Span of the first line starting with `key:`
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let pattern = format!("{}:", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start().trim_start_matches("- ");
        if trimmed.starts_with(&pattern) {
            let start = offset + (line.len() - trimmed.len());
            return Some((start, trimmed.len()).into());
        }
        offset += line.len() + 1;
    }
    None
}
