//! Heuristic error recovery
//!
//! Best-effort repair attempts keyed by error category. Strategies run in
//! registration order until one reports success; every attempt is logged
//! with its strategy name. A successful recovery never retries the failed
//! operation itself, it only returns actionable data (fixed input text,
//! created directories, suggestions) for the caller to act on.

mod strategies;

pub use strategies::{
    FallbackTemplate, MissingDirectory, PermissionProbe, SyntaxRepair, ValidationAdvice,
};

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::{BlueprintError, ErrorCategory};
use crate::fs::FileSystem;

/// Outcome of one recovery attempt
#[derive(Debug, Clone)]
pub struct RecoveryResult {
    pub successful: bool,
    pub message: String,
    /// Actionable payload, e.g. `fixed` input text or a `created` directory
    pub data: HashMap<String, serde_json::Value>,
}

impl RecoveryResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            successful: true,
            message: message.into(),
            data: HashMap::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            successful: false,
            message: message.into(),
            data: HashMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// What a strategy may inspect while attempting a repair
#[derive(Default, Clone, Copy)]
pub struct RecoveryContext<'a> {
    /// The original document text, when the caller still has it
    pub source: Option<&'a str>,
    pub fs: Option<&'a dyn FileSystem>,
}

pub trait RecoveryStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Error categories this strategy is a candidate for
    fn applies_to(&self) -> &[ErrorCategory];

    fn attempt(&self, error: &BlueprintError, ctx: &RecoveryContext<'_>) -> RecoveryResult;
}

/// Ordered strategy registry
#[derive(Default)]
pub struct RecoveryRegistry {
    strategies: Vec<Box<dyn RecoveryStrategy>>,
}

impl RecoveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in strategy set, in the order they are tried
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SyntaxRepair));
        registry.register(Box::new(MissingDirectory));
        registry.register(Box::new(FallbackTemplate));
        registry.register(Box::new(PermissionProbe));
        registry.register(Box::new(ValidationAdvice));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn RecoveryStrategy>) {
        self.strategies.push(strategy);
    }

    /// Try every applicable strategy in order; the first success wins.
    /// Returns `None` when no applicable strategy succeeded.
    pub fn recover(
        &self,
        error: &BlueprintError,
        ctx: &RecoveryContext<'_>,
    ) -> Option<RecoveryResult> {
        let category = error.category();
        for strategy in &self.strategies {
            if !strategy.applies_to().contains(&category) {
                continue;
            }
            let result = strategy.attempt(error, ctx);
            if result.successful {
                info!(
                    strategy = strategy.name(),
                    error_id = %error.error_id,
                    message = %result.message,
                    "recovery succeeded"
                );
                return Some(result);
            }
            warn!(
                strategy = strategy.name(),
                error_id = %error.error_id,
                message = %result.message,
                "recovery attempt failed"
            );
        }
        None
    }
}
