//! Generation manifest
//!
//! The persisted record of one run: every output path grouped by the action
//! taken on it, plus a full snapshot of the entity set so a subsequent run
//! can treat entities missing from a smaller input as still-known. Read at
//! the start of a run when present, rewritten at the end of a successful one.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BlueprintResult, GenerationError, ParseError};
use crate::fs::FileSystem;
use crate::model::Entity;

/// What happened to one output path during a run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GenerationAction {
    Created,
    Updated,
    Skipped,
    Deleted,
}

impl fmt::Display for GenerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Skipped => write!(f, "skipped"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// One emitter's result: each produced path and the action taken on it
pub type GenerationOutput = BTreeMap<PathBuf, GenerationAction>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationManifest {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    actions: BTreeMap<GenerationAction, Vec<PathBuf>>,
    /// Paths present in the previous run's manifest but not produced this run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    stale: Vec<PathBuf>,
    /// Carried-forward snapshot of all known entities
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    models: IndexMap<String, Entity>,
}

impl GenerationManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: PathBuf, action: GenerationAction) {
        let paths = self.actions.entry(action).or_default();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    /// Merge one emitter's output, appending into the per-action path lists
    /// rather than overwriting them.
    pub fn merge_output(&mut self, output: GenerationOutput) {
        for (path, action) in output {
            self.record(path, action);
        }
    }

    /// Merge another manifest's action lists into this one
    pub fn merge(&mut self, other: &GenerationManifest) {
        for (action, paths) in &other.actions {
            for path in paths {
                self.record(path.clone(), *action);
            }
        }
    }

    pub fn paths_for(&self, action: GenerationAction) -> &[PathBuf] {
        self.actions
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All paths touched by the run this manifest records
    pub fn all_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.actions.values().flatten()
    }

    pub fn set_stale(&mut self, stale: Vec<PathBuf>) {
        self.stale = stale;
    }

    pub fn stale_paths(&self) -> &[PathBuf] {
        &self.stale
    }

    pub fn set_models(&mut self, models: IndexMap<String, Entity>) {
        self.models = models;
    }

    pub fn models(&self) -> &IndexMap<String, Entity> {
        &self.models
    }

    pub fn take_models(self) -> IndexMap<String, Entity> {
        self.models
    }

    /// Paths a rollback of this run should delete: everything it created
    pub fn erase_plan(&self) -> Vec<PathBuf> {
        self.paths_for(GenerationAction::Created).to_vec()
    }

    pub fn to_yaml(&self) -> BlueprintResult<String> {
        serde_yaml::to_string(self).map_err(|e| {
            GenerationError::WriteFailed {
                path: "manifest".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn from_yaml(text: &str) -> BlueprintResult<Self> {
        serde_yaml::from_str(text).map_err(|e| {
            ParseError::MalformedDocument {
                message: format!("manifest: {e}"),
            }
            .into()
        })
    }

    /// Load the manifest from the previous run, if one exists
    pub fn load(fs: &dyn FileSystem, path: &Path) -> BlueprintResult<Option<Self>> {
        if !fs.exists(path) {
            return Ok(None);
        }
        Ok(Some(Self::from_yaml(&fs.read(path)?)?))
    }

    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> BlueprintResult<()> {
        fs.write(path, &self.to_yaml()?)
    }
}
