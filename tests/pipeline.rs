//! End-to-end pipeline tests over the public API

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use blueprint_core::{
    parse_document, BlueprintResult, CompilationOptions, Compiler, DataType, Emitter,
    EmitterRegistry, FileSystem, GenerationAction, GenerationManifest, GenerationOutput,
    MemoryFileSystem, RecoveryContext, RecoveryRegistry, RelationshipKind, Tree,
    DEFAULT_MANIFEST_PATH,
};

struct CountingEmitter {
    name: String,
    categories: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl CountingEmitter {
    fn boxed(name: &str, categories: &[&str], calls: &Arc<AtomicUsize>) -> Box<dyn Emitter> {
        Box::new(Self {
            name: name.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            calls: Arc::clone(calls),
        })
    }
}

impl Emitter for CountingEmitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn categories(&self) -> Vec<String> {
        self.categories.clone()
    }

    fn output(
        &self,
        tree: &Tree,
        fs: &dyn FileSystem,
        _overwrite: bool,
    ) -> BlueprintResult<GenerationOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut output = GenerationOutput::new();
        for name in tree.entities().keys() {
            let path = PathBuf::from(format!("out/{}/{}.rs", self.name, name.to_lowercase()));
            fs.write(&path, &format!("// {name}\n"))?;
            output.insert(path, GenerationAction::Created);
        }
        Ok(output)
    }
}

const POST_AND_USER: &str = "\
models:
  Post:
    title: string
    author: belongsTo User
  User:
    name: string
";

#[test]
fn test_post_and_user_end_to_end() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = EmitterRegistry::new();
    registry.register(CountingEmitter::boxed("models", &["models"], &calls));
    registry.register(CountingEmitter::boxed("migrations", &["migrations"], &calls));

    let fs = MemoryFileSystem::new();
    let options = CompilationOptions::default();
    let compiler = Compiler::new(&registry, &fs, &options);
    let manifest = compiler.compile(POST_AND_USER).unwrap();

    // Both emitters ran exactly once with empty filter lists.
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let post = &manifest.models()["Post"];
    let columns: Vec<&str> = post.columns.keys().map(String::as_str).collect();
    assert_eq!(columns, ["id", "title", "author_id"]);
    assert_eq!(post.column("author_id").unwrap().data_type, DataType::Id);

    let rels = post.relationships_of(RelationshipKind::BelongsTo);
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].reference(), "User:author");

    assert!(fs.exists(Path::new(DEFAULT_MANIFEST_PATH)));
    assert!(fs.exists(Path::new("out/models/post.rs")));
    assert!(fs.exists(Path::new("out/migrations/user.rs")));
}

#[test]
fn test_cycle_aborts_before_any_emitter() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = EmitterRegistry::new();
    registry.register(CountingEmitter::boxed("models", &["models"], &calls));

    let fs = MemoryFileSystem::new();
    let options = CompilationOptions::default();
    let compiler = Compiler::new(&registry, &fs, &options);

    let err = compiler
        .compile(
            "models:\n  A:\n    relationships:\n      belongsTo: B\n  B:\n    relationships:\n      belongsTo: A\n",
        )
        .unwrap_err();

    assert!(err.to_string().contains("A -> B -> A") || err.to_string().contains("B -> A -> B"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!fs.exists(Path::new(DEFAULT_MANIFEST_PATH)));
}

#[test]
fn test_only_filter_selects_single_emitter() {
    let model_calls = Arc::new(AtomicUsize::new(0));
    let seed_calls = Arc::new(AtomicUsize::new(0));
    let mut registry = EmitterRegistry::new();
    registry.register(CountingEmitter::boxed("models", &["models", "shared"], &model_calls));
    registry.register(CountingEmitter::boxed("seeders", &["shared"], &seed_calls));

    let fs = MemoryFileSystem::new();
    let options = CompilationOptions::default().with_only(vec!["models".to_string()]);
    let compiler = Compiler::new(&registry, &fs, &options);
    compiler.compile(POST_AND_USER).unwrap();

    assert_eq!(model_calls.load(Ordering::SeqCst), 1);
    assert_eq!(seed_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_manifest_snapshot_rebuilds_equivalent_registry() {
    let registry = EmitterRegistry::new();
    let fs = MemoryFileSystem::new();
    let options = CompilationOptions::default();
    let compiler = Compiler::new(&registry, &fs, &options);
    compiler.compile(POST_AND_USER).unwrap();

    // Rebuild from the persisted snapshot alone.
    let reloaded = GenerationManifest::load(&fs, Path::new(DEFAULT_MANIFEST_PATH))
        .unwrap()
        .unwrap();
    let mut rebuilt = Tree::new();
    rebuilt.seed_cache(reloaded.take_models());

    for name in ["Post", "User"] {
        assert!(rebuilt.knows_entity(name));
    }
    let post = rebuilt.find_entity("Post").unwrap();
    assert!(post.column("author_id").is_some());
    assert_eq!(
        post.relationships_of(RelationshipKind::BelongsTo)[0].reference(),
        "User:author"
    );
}

#[test]
fn test_second_run_marks_dropped_output_stale() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = EmitterRegistry::new();
    registry.register(CountingEmitter::boxed("models", &["models"], &calls));

    let fs = MemoryFileSystem::new();
    let options = CompilationOptions::default();
    let compiler = Compiler::new(&registry, &fs, &options);

    compiler.compile(POST_AND_USER).unwrap();
    // Manifest carries User in its snapshot, but the emitter only writes
    // files for current entities; the old output turns stale.
    let manifest = compiler
        .compile("models:\n  Post:\n    title: string\n    author: belongsTo User\n")
        .unwrap();

    assert_eq!(manifest.stale_paths(), [PathBuf::from("out/models/user.rs")]);
}

#[test]
fn test_syntax_recovery_produces_compilable_input() {
    let broken = "models:\n  Post:\n    title:string\n";
    let err = parse_document(broken).unwrap_err();

    let recovery = RecoveryRegistry::with_defaults();
    let ctx = RecoveryContext {
        source: Some(broken),
        fs: None,
    };
    let result = recovery.recover(&err, &ctx).expect("syntax repair applies");
    assert!(result.successful);

    // Recovery never re-submits by itself; the caller compiles the fix.
    let fixed = result.data["fixed"].as_str().unwrap();
    let registry = EmitterRegistry::new();
    let fs = MemoryFileSystem::new();
    let options = CompilationOptions::default();
    let manifest = Compiler::new(&registry, &fs, &options).compile(fixed).unwrap();
    assert!(manifest.models().contains_key("Post"));
}
