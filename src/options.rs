//! Compilation options
//!
//! An explicit options struct passed into the analyzer and the generation
//! orchestrator; nothing in the pipeline reads shared or global configuration.

#[derive(Debug, Clone)]
pub struct CompilationOptions {
    /// Emitter categories to run exclusively; empty means no restriction
    pub only: Vec<String>,
    /// Emitter categories to exclude when `only` is empty
    pub skip: Vec<String>,
    /// Overwrite files that already exist in the target tree
    pub overwrite: bool,
    /// Synthesize an identity column on entities that do not disable it
    pub default_identity: bool,
    /// Mark entities as timestamped unless they opt out
    pub default_timestamps: bool,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            only: Vec::new(),
            skip: Vec::new(),
            overwrite: false,
            default_identity: true,
            default_timestamps: true,
        }
    }
}

impl CompilationOptions {
    pub fn with_only(mut self, categories: impl IntoIterator<Item = String>) -> Self {
        self.only = categories.into_iter().collect();
        self
    }

    pub fn with_skip(mut self, categories: impl IntoIterator<Item = String>) -> Self {
        self.skip = categories.into_iter().collect();
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}
