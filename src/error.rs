//! Error handling for the blueprint compiler
//!
//! Every failure in the pipeline is a [`BlueprintError`]: a typed kind from a
//! small taxonomy (parse / validation / generation), a human message, an
//! optional source location, a free-form context map, an ordered suggestion
//! list and an opaque error id used to correlate log lines.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the crate
pub type BlueprintResult<T> = Result<T, BlueprintError>;

/// Parse-stage failures: malformed shorthand or structural document input
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParseError {
    #[error("unknown keyword '{token}' in definition '{definition}'")]
    MalformedShorthand { token: String, definition: String },

    #[error("malformed document: {message}")]
    MalformedDocument { message: String },

    #[error("missing required section '{section}'")]
    MissingSection { section: String },

    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    #[error("unknown statement verb '{verb}' in method '{method}'")]
    UnknownVerb { verb: String, method: String },
}

/// Validation-stage failures: structural/integrity violations over the whole model
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    #[error("circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("entity '{owner}' declares a {kind} relationship to '{target}', which is not defined")]
    DanglingReference {
        owner: String,
        kind: String,
        target: String,
    },

    #[error("duplicate {category} name '{name}'")]
    DuplicateName { category: String, name: String },

    #[error("invalid relationship kind '{kind}' on entity '{owner}'")]
    InvalidRelationshipKind { kind: String, owner: String },
}

/// Generation-stage failures: emitter-side write/template problems
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GenerationError {
    #[error("failed to write '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("template '{template}' not found")]
    MissingTemplate { template: String },

    #[error("permission denied for '{path}'")]
    PermissionDenied { path: String },
}

/// The error kind taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("{0}")]
    Internal(String),
}

/// Coarse category used for recovery-strategy dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    Parse,
    Validation,
    Generation,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Validation => write!(f, "validation"),
            Self::Generation => write!(f, "generation"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Source file/line attached to an error when known
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file, self.line),
            None => write!(f, "line {}", self.line),
        }
    }
}

/// Structured error carried by every stage of the pipeline
///
/// Context and suggestions accumulate through the builder methods before the
/// error is raised; the error id is generated once at construction.
#[derive(Debug, Clone, Serialize)]
pub struct BlueprintError {
    pub kind: ErrorKind,
    pub location: Option<SourceLocation>,
    pub context: HashMap<String, serde_json::Value>,
    pub suggestions: Vec<String>,
    pub error_id: String,
}

impl BlueprintError {
    pub fn new(kind: ErrorKind) -> Self {
        let suggestions = default_suggestions(&kind);
        Self {
            kind,
            location: None,
            context: HashMap::new(),
            suggestions,
            error_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    pub fn with_location(mut self, file: Option<String>, line: usize) -> Self {
        self.location = Some(SourceLocation { file, line });
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            ErrorKind::Parse(_) => ErrorCategory::Parse,
            ErrorKind::Validation(_) => ErrorCategory::Validation,
            ErrorKind::Generation(_) => ErrorCategory::Generation,
            ErrorKind::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for BlueprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(location) = &self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BlueprintError {}

impl From<ParseError> for BlueprintError {
    fn from(e: ParseError) -> Self {
        Self::new(ErrorKind::Parse(e))
    }
}

impl From<ValidationError> for BlueprintError {
    fn from(e: ValidationError) -> Self {
        Self::new(ErrorKind::Validation(e))
    }
}

impl From<GenerationError> for BlueprintError {
    fn from(e: GenerationError) -> Self {
        Self::new(ErrorKind::Generation(e))
    }
}

/// Failure kinds with known common causes get a non-empty suggestion list up front
fn default_suggestions(kind: &ErrorKind) -> Vec<String> {
    match kind {
        ErrorKind::Parse(ParseError::MalformedShorthand { token, .. }) => vec![
            format!("check '{token}' against the data type, modifier and relationship vocabularies"),
            "quote values containing spaces or commas".to_string(),
        ],
        ErrorKind::Parse(ParseError::MalformedDocument { .. }) => vec![
            "check the document for tabs, inconsistent indentation or unclosed quotes".to_string(),
        ],
        ErrorKind::Parse(ParseError::InvalidIdentifier { .. }) => vec![
            "identifiers must start with a letter or underscore and contain only letters, digits and underscores".to_string(),
        ],
        ErrorKind::Validation(ValidationError::CircularDependency { cycle }) => vec![
            format!(
                "break the cycle by removing or inverting one relationship between {}",
                cycle.join(" and ")
            ),
        ],
        ErrorKind::Validation(ValidationError::DanglingReference { target, .. }) => vec![
            format!("define an entity named '{target}' or correct the relationship target"),
        ],
        ErrorKind::Generation(GenerationError::PermissionDenied { path }) => vec![
            format!("check filesystem permissions for '{path}'"),
        ],
        ErrorKind::Generation(GenerationError::MissingTemplate { template }) => vec![
            format!("provide '{template}' or register a fallback template"),
        ],
        _ => Vec::new(),
    }
}
