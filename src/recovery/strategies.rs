//! Built-in recovery strategies

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::{RecoveryContext, RecoveryResult, RecoveryStrategy};
use crate::document::parse_document;
use crate::error::{BlueprintError, ErrorCategory, ErrorKind, GenerationError, ValidationError};

/// Auto-fix common syntax mistakes in the input text via a sequence of
/// pattern substitutions, then re-parse to confirm validity. The fixed text
/// is returned in the result data; it is never re-submitted automatically.
pub struct SyntaxRepair;

// Substitution table for the mistakes seen most often in hand-written
// documents: tab indentation, curly quotes pasted from elsewhere, and a
// missing space after a key's colon.
fn substitutions() -> &'static [(Regex, &'static str)] {
    static TABLE: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        [
            (r"\t", "  "),
            (r"[\u{2018}\u{2019}]", "'"),
            (r"[\u{201C}\u{201D}]", "\""),
            (r"(?m)^(\s*[A-Za-z_][A-Za-z0-9_]*):(\S)", "$1: $2"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, replacement))
        })
        .collect()
    })
}

impl RecoveryStrategy for SyntaxRepair {
    fn name(&self) -> &str {
        "syntax-repair"
    }

    fn applies_to(&self) -> &[ErrorCategory] {
        &[ErrorCategory::Parse]
    }

    fn attempt(&self, _error: &BlueprintError, ctx: &RecoveryContext<'_>) -> RecoveryResult {
        let Some(source) = ctx.source else {
            return RecoveryResult::failure("no source text available to repair");
        };

        let mut fixed = source.to_string();
        for (pattern, replacement) in substitutions() {
            fixed = pattern.replace_all(&fixed, *replacement).into_owned();
        }

        if fixed == source {
            return RecoveryResult::failure("no known syntax mistake matched");
        }
        match parse_document(&fixed) {
            Ok(_) => RecoveryResult::success("input repaired and re-parsed cleanly")
                .with_data("fixed", serde_json::json!(fixed)),
            Err(_) => RecoveryResult::failure("substitutions applied but input still fails to parse"),
        }
    }
}

/// Create the missing output directory implied by a failed write
pub struct MissingDirectory;

fn failed_path(error: &BlueprintError) -> Option<&str> {
    match &error.kind {
        ErrorKind::Generation(GenerationError::WriteFailed { path, .. })
        | ErrorKind::Generation(GenerationError::PermissionDenied { path }) => Some(path),
        _ => None,
    }
}

impl RecoveryStrategy for MissingDirectory {
    fn name(&self) -> &str {
        "missing-directory"
    }

    fn applies_to(&self) -> &[ErrorCategory] {
        &[ErrorCategory::Generation]
    }

    fn attempt(&self, error: &BlueprintError, ctx: &RecoveryContext<'_>) -> RecoveryResult {
        let Some(fs) = ctx.fs else {
            return RecoveryResult::failure("no filesystem available");
        };
        let Some(path) = failed_path(error) else {
            return RecoveryResult::failure("error carries no output path");
        };
        let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) else {
            return RecoveryResult::failure("output path has no parent directory");
        };

        if fs.exists(dir) {
            return RecoveryResult::failure("output directory already exists");
        }
        match fs.create_dir_all(dir) {
            Ok(()) => RecoveryResult::success(format!("created '{}'", dir.display()))
                .with_data("created", serde_json::json!(dir.display().to_string())),
            Err(e) => RecoveryResult::failure(format!("could not create '{}': {e}", dir.display())),
        }
    }
}

/// Look for a fallback template next to the missing one
pub struct FallbackTemplate;

impl RecoveryStrategy for FallbackTemplate {
    fn name(&self) -> &str {
        "fallback-template"
    }

    fn applies_to(&self) -> &[ErrorCategory] {
        &[ErrorCategory::Generation]
    }

    fn attempt(&self, error: &BlueprintError, ctx: &RecoveryContext<'_>) -> RecoveryResult {
        let ErrorKind::Generation(GenerationError::MissingTemplate { template }) = &error.kind
        else {
            return RecoveryResult::failure("not a missing-template failure");
        };
        let Some(fs) = ctx.fs else {
            return RecoveryResult::failure("no filesystem available");
        };

        let sibling = Path::new(template).with_file_name("default.stub");
        let shared = Path::new("templates/default.stub");
        for candidate in [sibling.as_path(), shared] {
            if fs.exists(candidate) {
                return RecoveryResult::success(format!(
                    "fallback template found at '{}'",
                    candidate.display()
                ))
                .with_data("template", serde_json::json!(candidate.display().to_string()));
            }
        }
        RecoveryResult::failure(format!("no fallback template for '{template}'"))
    }
}

/// Verify and report a permission problem without touching the target
pub struct PermissionProbe;

impl RecoveryStrategy for PermissionProbe {
    fn name(&self) -> &str {
        "permission-probe"
    }

    fn applies_to(&self) -> &[ErrorCategory] {
        &[ErrorCategory::Generation]
    }

    fn attempt(&self, error: &BlueprintError, ctx: &RecoveryContext<'_>) -> RecoveryResult {
        let ErrorKind::Generation(GenerationError::PermissionDenied { path }) = &error.kind else {
            return RecoveryResult::failure("not a permission failure");
        };
        let Some(fs) = ctx.fs else {
            return RecoveryResult::failure("no filesystem available");
        };

        let exists = fs.exists(Path::new(path));
        let message = if exists {
            format!("'{path}' exists but is not writable; adjust its permissions")
        } else {
            format!("'{path}' cannot be created; adjust permissions on its parent directory")
        };
        RecoveryResult::success(message)
            .with_data("path", serde_json::json!(path))
            .with_data("exists", serde_json::json!(exists))
    }
}

/// Suggest structural fixes for validation failures
pub struct ValidationAdvice;

impl RecoveryStrategy for ValidationAdvice {
    fn name(&self) -> &str {
        "validation-advice"
    }

    fn applies_to(&self) -> &[ErrorCategory] {
        &[ErrorCategory::Validation]
    }

    fn attempt(&self, error: &BlueprintError, _ctx: &RecoveryContext<'_>) -> RecoveryResult {
        let suggestions: Vec<String> = match &error.kind {
            ErrorKind::Validation(ValidationError::CircularDependency { cycle }) => {
                let mut out = Vec::new();
                for pair in cycle.windows(2) {
                    out.push(format!(
                        "remove or invert the relationship from '{}' to '{}'",
                        pair[0], pair[1]
                    ));
                }
                out
            }
            ErrorKind::Validation(ValidationError::DanglingReference { owner, target, .. }) => vec![
                format!("define an entity named '{target}'"),
                format!("or correct the relationship target on '{owner}'"),
            ],
            ErrorKind::Validation(ValidationError::DuplicateName { category, name }) => vec![
                format!("rename one of the {category} definitions named '{name}'"),
            ],
            ErrorKind::Validation(ValidationError::InvalidRelationshipKind { kind, owner }) => vec![
                format!("replace '{kind}' on '{owner}' with one of the known relationship kinds"),
            ],
            _ => Vec::new(),
        };

        if suggestions.is_empty() {
            return RecoveryResult::failure("no structural advice for this failure");
        }
        RecoveryResult::success("structural fixes available")
            .with_data("suggestions", serde_json::json!(suggestions))
    }
}
