//! Generation orchestration
//!
//! Holds the ordered set of independent emitters, filters them by the
//! only/skip category lists, invokes each with the read-only registry and
//! merges their per-file results into one manifest, reconciled against the
//! manifest from the previous run.
//!
//! An emitter failure is not caught here: it propagates and aborts the rest
//! of the run. Output already written by earlier emitters stays in place
//! (at-least-once semantics), with the manifest's erase plan as the
//! remediation path.

use tracing::{debug, info};

use crate::error::BlueprintResult;
use crate::fs::FileSystem;
use crate::manifest::{GenerationManifest, GenerationOutput};
use crate::model::Tree;
use crate::options::CompilationOptions;

/// An independent unit of generation: consumes the registry, returns the
/// set of output-file actions it performed.
pub trait Emitter: Send + Sync {
    fn name(&self) -> &str;

    /// Output categories this emitter belongs to, matched against the
    /// only/skip filter lists
    fn categories(&self) -> Vec<String>;

    /// Higher priority runs earlier; registration order breaks ties
    fn priority(&self) -> i32 {
        0
    }

    fn output(
        &self,
        tree: &Tree,
        fs: &dyn FileSystem,
        overwrite: bool,
    ) -> BlueprintResult<GenerationOutput>;
}

/// Ordered emitter registry; registration order is preserved and used as the
/// tiebreak within a priority level.
#[derive(Default)]
pub struct EmitterRegistry {
    emitters: Vec<Box<dyn Emitter>>,
}

impl EmitterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, emitter: Box<dyn Emitter>) {
        self.emitters.push(emitter);
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Filter by category lists, then order by priority (desc) with
    /// registration order as tiebreak.
    ///
    /// A non-empty `only` list is authoritative: emitters whose categories
    /// do not intersect it are excluded. Otherwise a non-empty intersection
    /// with `skip` excludes an emitter. With neither list, everything runs.
    pub fn select(&self, options: &CompilationOptions) -> Vec<&dyn Emitter> {
        let mut selected: Vec<(usize, &dyn Emitter)> = self
            .emitters
            .iter()
            .enumerate()
            .filter(|(_, emitter)| {
                let categories = emitter.categories();
                if !options.only.is_empty() {
                    categories.iter().any(|c| options.only.contains(c))
                } else if !options.skip.is_empty() {
                    !categories.iter().any(|c| options.skip.contains(c))
                } else {
                    true
                }
            })
            .map(|(idx, emitter)| (idx, emitter.as_ref()))
            .collect();

        selected.sort_by_key(|(idx, emitter)| (-emitter.priority(), *idx));
        selected.into_iter().map(|(_, emitter)| emitter).collect()
    }
}

pub struct Orchestrator<'a> {
    registry: &'a EmitterRegistry,
    fs: &'a dyn FileSystem,
    options: &'a CompilationOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        registry: &'a EmitterRegistry,
        fs: &'a dyn FileSystem,
        options: &'a CompilationOptions,
    ) -> Self {
        Self {
            registry,
            fs,
            options,
        }
    }

    /// Execute every selected emitter against the registry and merge their
    /// results, reconciling against the previous run's manifest.
    pub fn run(
        &self,
        tree: &Tree,
        previous: Option<&GenerationManifest>,
    ) -> BlueprintResult<GenerationManifest> {
        let emitters = self.registry.select(self.options);
        info!(
            emitters = emitters.len(),
            entities = tree.entities().len(),
            "generation.started"
        );

        let mut manifest = GenerationManifest::new();
        for emitter in &emitters {
            let output = emitter.output(tree, self.fs, self.options.overwrite)?;
            debug!(emitter = emitter.name(), paths = output.len(), "emitter finished");
            manifest.merge_output(output);
        }

        if let Some(previous) = previous {
            manifest.set_stale(self.stale_paths(previous, &manifest));
        }
        manifest.set_models(tree.snapshot());

        info!(
            paths = manifest.all_paths().count(),
            stale = manifest.stale_paths().len(),
            "generation.finished"
        );
        Ok(manifest)
    }

    // Paths the previous run produced that no emitter touched this run.
    fn stale_paths(
        &self,
        previous: &GenerationManifest,
        current: &GenerationManifest,
    ) -> Vec<std::path::PathBuf> {
        previous
            .all_paths()
            .filter(|path| !current.all_paths().any(|p| p == *path))
            .cloned()
            .collect()
    }
}
