//! Compilation pipeline
//!
//! The façade driving one run end to end: load the previous manifest, parse
//! the document, analyze every definition group against cross-run context,
//! validate the finished registry, execute the selected emitters and persist
//! the merged manifest. Every surfaced failure is logged with full context
//! before it propagates.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::analyzer::{Analyzer, InferenceContext};
use crate::document::{parse_document, Document};
use crate::error::{BlueprintError, BlueprintResult};
use crate::fs::FileSystem;
use crate::generator::{EmitterRegistry, Orchestrator};
use crate::logging::{self, Severity};
use crate::manifest::GenerationManifest;
use crate::model::Tree;
use crate::naming;
use crate::options::CompilationOptions;
use crate::validator;
use crate::vocabulary::RelationshipKind;

pub const DEFAULT_MANIFEST_PATH: &str = ".blueprint.yaml";

pub struct Compiler<'a> {
    registry: &'a EmitterRegistry,
    fs: &'a dyn FileSystem,
    options: &'a CompilationOptions,
    manifest_path: PathBuf,
}

impl<'a> Compiler<'a> {
    pub fn new(
        registry: &'a EmitterRegistry,
        fs: &'a dyn FileSystem,
        options: &'a CompilationOptions,
    ) -> Self {
        Self {
            registry,
            fs,
            options,
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
        }
    }

    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Run the whole pipeline over one document and persist the result
    pub fn compile(&self, source: &str) -> BlueprintResult<GenerationManifest> {
        let previous = GenerationManifest::load(self.fs, &self.manifest_path).map_err(surface)?;
        let tree = self.build_tree(source, previous.as_ref())?;

        let orchestrator = Orchestrator::new(self.registry, self.fs, self.options);
        let manifest = orchestrator.run(&tree, previous.as_ref()).map_err(surface)?;
        manifest.save(self.fs, &self.manifest_path).map_err(surface)?;
        Ok(manifest)
    }

    /// Parse, analyze and validate without touching any emitter
    pub fn build_tree(
        &self,
        source: &str,
        previous: Option<&GenerationManifest>,
    ) -> BlueprintResult<Tree> {
        let document = parse_document(source).map_err(surface)?;
        let tree = self.analyze(&document, previous).map_err(surface)?;
        validator::validate(&tree).map_err(surface)?;
        Ok(tree)
    }

    fn analyze(
        &self,
        document: &Document,
        previous: Option<&GenerationManifest>,
    ) -> BlueprintResult<Tree> {
        let cached = previous.map(|m| m.models().clone()).unwrap_or_default();

        // Inference sees every name the run knows about, current or cached,
        // so foreign-key stems resolve to declared casing either way.
        let names = document
            .entities
            .iter()
            .map(|raw| raw.name.clone())
            .chain(cached.keys().cloned());
        let ctx = InferenceContext::new(names);

        let analyzer = Analyzer::new(self.options);
        let mut tree = Tree::new();
        for raw in &document.entities {
            tree.insert_entity(analyzer.analyze(raw, &ctx)?)?;
        }
        for raw in &document.actions {
            tree.insert_action_entity(analyzer.analyze_action(raw)?)?;
        }
        tree.seed_cache(cached);

        self.register_auxiliaries(&mut tree, document);
        debug!(
            entities = tree.entities().len(),
            cached = tree.cached_entities().len(),
            actions = tree.action_entities().len(),
            "registry built"
        );
        Ok(tree)
    }

    // Every many-to-many pair implies a pivot table; seeders come straight
    // from the document section.
    fn register_auxiliaries(&self, tree: &mut Tree, document: &Document) {
        let mut pivots = Vec::new();
        for entity in tree.entities().values() {
            for relationship in entity.relationships_of(RelationshipKind::BelongsToMany) {
                pivots.push(naming::pivot_name(&entity.name, &relationship.target));
            }
        }
        for pivot in pivots {
            tree.add_auxiliary("pivots", pivot);
        }
        for seeder in &document.seeders {
            tree.add_auxiliary("seeders", seeder.clone());
        }
    }
}

fn surface(err: BlueprintError) -> BlueprintError {
    logging::log_error(&err, Severity::Error);
    err
}
