//! Structured input document
//!
//! The outermost input format: a key-ordered YAML map with top-level sections
//! for data entities (`models`), action entities (`controllers`), auxiliary
//! seeder declarations and a free-form `settings` section. Sections not
//! present default to empty. This module only lifts the document into raw
//! definition groups; shorthand strings inside them are the parser's problem.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::warn;

use crate::analyzer::{RawAction, RawEntity};
use crate::error::{BlueprintResult, ParseError};

/// Parsed top-level document, sectioned but still in shorthand form
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub entities: Vec<RawEntity>,
    pub actions: Vec<RawAction>,
    pub seeders: Vec<String>,
    pub settings: IndexMap<String, Value>,
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"))
}

fn check_identifier(name: &str) -> BlueprintResult<()> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(ParseError::InvalidIdentifier {
            name: name.to_string(),
            reason: "must start with a letter or underscore and contain only letters, digits and underscores".to_string(),
        }
        .into())
    }
}

// YAML scalars arrive as strings, numbers or booleans; all are legal
// shorthand text.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn key_string(key: &Value) -> BlueprintResult<String> {
    scalar(key).ok_or_else(|| {
        ParseError::MalformedDocument {
            message: "mapping keys must be scalars".to_string(),
        }
        .into()
    })
}

/// Parse the document text into raw definition groups
pub fn parse_document(text: &str) -> BlueprintResult<Document> {
    let root: Mapping = serde_yaml::from_str(text).map_err(|e| ParseError::MalformedDocument {
        message: e.to_string(),
    })?;

    let mut document = Document::default();
    for (key, value) in &root {
        let section = key_string(key)?;
        match section.as_str() {
            "models" => document.entities = parse_models(value)?,
            "controllers" => document.actions = parse_controllers(value)?,
            "seeders" => document.seeders = parse_seeders(value)?,
            "settings" => document.settings = parse_settings(value)?,
            other => warn!(section = other, "ignoring unknown document section"),
        }
    }

    if document.entities.is_empty() && document.actions.is_empty() {
        return Err(ParseError::MissingSection {
            section: "models".to_string(),
        }
        .into());
    }
    Ok(document)
}

fn section_mapping<'a>(value: &'a Value, section: &str) -> BlueprintResult<&'a Mapping> {
    value.as_mapping().ok_or_else(|| {
        ParseError::MalformedDocument {
            message: format!("section '{section}' must be a map"),
        }
        .into()
    })
}

fn parse_models(value: &Value) -> BlueprintResult<Vec<RawEntity>> {
    let mut entities = Vec::new();
    for (key, definition) in section_mapping(value, "models")? {
        let name = key_string(key)?;
        check_identifier(&name)?;
        entities.push(parse_model(&name, definition)?);
    }
    Ok(entities)
}

// Special keys inside a model block configure the entity itself; everything
// else is a `field -> shorthand` pair, order preserved.
fn parse_model(name: &str, value: &Value) -> BlueprintResult<RawEntity> {
    let mut raw = RawEntity::new(name);
    let body = section_mapping(value, name)?;

    for (key, entry) in body {
        let field = key_string(key)?;
        match field.as_str() {
            "relationships" => {
                for (kind, refs) in section_mapping(entry, "relationships")? {
                    raw.relationships
                        .push((key_string(kind)?, string_or_joined_list(refs, name)?));
                }
            }
            "indexes" => {
                for item in list_of(entry, "indexes", name)? {
                    raw.indexes.push(item);
                }
            }
            "traits" | "mixins" => raw.mixins = list_of(entry, &field, name)?,
            "id" => raw.uses_identity = Some(bool_of(entry, "id", name)?),
            "timestamps" => raw.uses_timestamps = Some(bool_of(entry, "timestamps", name)?),
            "softDeletes" | "softdeletes" => raw.uses_soft_delete = bool_of(entry, "softDeletes", name)?,
            "table" => raw.table = Some(string_of(entry, "table", name)?),
            "connection" => raw.connection = Some(string_of(entry, "connection", name)?),
            _ => {
                check_identifier(&field)?;
                let shorthand = string_of(entry, &field, name)?;
                raw.fields.push((field, shorthand));
            }
        }
    }
    Ok(raw)
}

fn parse_controllers(value: &Value) -> BlueprintResult<Vec<RawAction>> {
    let mut actions = Vec::new();
    for (key, definition) in section_mapping(value, "controllers")? {
        let name = key_string(key)?;
        check_identifier(&name)?;

        let mut raw = RawAction {
            name,
            methods: Vec::new(),
        };
        for (method_key, body) in section_mapping(definition, &raw.name)? {
            let method = key_string(method_key)?;
            check_identifier(&method)?;

            let mut statements = Vec::new();
            for (verb, argument) in section_mapping(body, &method)? {
                statements.push((key_string(verb)?, string_or_joined_list(argument, &method)?));
            }
            raw.methods.push((method, statements));
        }
        actions.push(raw);
    }
    Ok(actions)
}

fn parse_seeders(value: &Value) -> BlueprintResult<Vec<String>> {
    match value {
        Value::String(s) => Ok(s.split(',').map(|p| p.trim().to_string()).collect()),
        Value::Sequence(_) => list_of(value, "seeders", "seeders"),
        _ => Err(ParseError::MalformedDocument {
            message: "section 'seeders' must be a list or comma-separated string".to_string(),
        }
        .into()),
    }
}

fn parse_settings(value: &Value) -> BlueprintResult<IndexMap<String, Value>> {
    let mut settings = IndexMap::new();
    for (key, entry) in section_mapping(value, "settings")? {
        settings.insert(key_string(key)?, entry.clone());
    }
    Ok(settings)
}

fn string_of(value: &Value, key: &str, owner: &str) -> BlueprintResult<String> {
    scalar(value).ok_or_else(|| {
        ParseError::MalformedDocument {
            message: format!("'{key}' in '{owner}' must be a scalar"),
        }
        .into()
    })
}

// Relationship refs and statement arguments accept either a scalar or a
// list; a list collapses to the comma form the shorthand grammar expects.
fn string_or_joined_list(value: &Value, owner: &str) -> BlueprintResult<String> {
    match value {
        Value::Sequence(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(string_of(item, "list item", owner)?);
            }
            Ok(parts.join(","))
        }
        _ => string_of(value, "value", owner),
    }
}

fn list_of(value: &Value, key: &str, owner: &str) -> BlueprintResult<Vec<String>> {
    let items = value.as_sequence().ok_or_else(|| ParseError::MalformedDocument {
        message: format!("'{key}' in '{owner}' must be a list"),
    })?;
    items.iter().map(|item| string_of(item, key, owner)).collect()
}

fn bool_of(value: &Value, key: &str, owner: &str) -> BlueprintResult<bool> {
    value.as_bool().ok_or_else(|| {
        ParseError::MalformedDocument {
            message: format!("'{key}' in '{owner}' must be true or false"),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_full_document_sections() {
        let doc = parse_document(
            r#"
models:
  Post:
    title: string:400
    relationships:
      belongsTo: User
    indexes:
      - unique:title
  User:
    name: string
controllers:
  PostController:
    index:
      query: all:posts
      render: post.index with:posts
seeders: Post, User
settings:
  output: src/generated
"#,
        )
        .unwrap();

        assert_eq!(doc.entities.len(), 2);
        assert_eq!(doc.entities[0].name, "Post");
        assert_eq!(doc.entities[0].fields, vec![("title".to_string(), "string:400".to_string())]);
        assert_eq!(
            doc.entities[0].relationships,
            vec![("belongsTo".to_string(), "User".to_string())]
        );
        assert_eq!(doc.entities[0].indexes, vec!["unique:title"]);

        assert_eq!(doc.actions.len(), 1);
        let (method, statements) = &doc.actions[0].methods[0];
        assert_eq!(method, "index");
        assert_eq!(statements[0], ("query".to_string(), "all:posts".to_string()));

        assert_eq!(doc.seeders, vec!["Post", "User"]);
        assert!(doc.settings.contains_key("output"));
    }

    #[test]
    fn test_model_toggles_and_overrides() {
        let doc = parse_document(
            r#"
models:
  AuditLog:
    id: false
    timestamps: false
    softDeletes: true
    table: audit_trail
    connection: archive
    traits: [Searchable]
    message: text
"#,
        )
        .unwrap();
        let raw = &doc.entities[0];
        assert_eq!(raw.uses_identity, Some(false));
        assert_eq!(raw.uses_timestamps, Some(false));
        assert!(raw.uses_soft_delete);
        assert_eq!(raw.table.as_deref(), Some("audit_trail"));
        assert_eq!(raw.connection.as_deref(), Some("archive"));
        assert_eq!(raw.mixins, vec!["Searchable"]);
        assert_eq!(raw.fields.len(), 1);
    }

    #[test]
    fn test_relationship_refs_accept_lists() {
        let doc = parse_document(
            r#"
models:
  Post:
    relationships:
      belongsTo:
        - User
        - Category
"#,
        )
        .unwrap();
        assert_eq!(
            doc.entities[0].relationships,
            vec![("belongsTo".to_string(), "User,Category".to_string())]
        );
    }

    #[test]
    fn test_empty_document_is_missing_models() {
        let err = parse_document("settings:\n  output: here\n").unwrap_err();
        match err.kind {
            ErrorKind::Parse(ParseError::MissingSection { section }) => {
                assert_eq!(section, "models");
            }
            other => panic!("expected missing section, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_entity_name_rejected() {
        let err = parse_document("models:\n  9Lives:\n    name: string\n").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::Parse(ParseError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_invalid_field_name_rejected() {
        let err = parse_document("models:\n  Post:\n    bad-name: string\n").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::Parse(ParseError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_unparseable_yaml_is_malformed_document() {
        let err = parse_document("models: [unclosed\n").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::Parse(ParseError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_numeric_shorthand_coerced_to_text() {
        let doc = parse_document("models:\n  Counter:\n    hits: 42\n").unwrap();
        assert_eq!(doc.entities[0].fields[0].1, "42");
    }
}
