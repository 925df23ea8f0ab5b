//! blueprint-core: a declarative data-model compiler
//!
//! Reads a compact textual description of a data/behavior model, turns it
//! into a validated intermediate representation and hands that to a set of
//! pluggable emitters producing output-file actions, reconciled against the
//! manifest persisted by the previous run.
//!
//! The pipeline is strictly sequential:
//!
//! ```text
//! parse -> analyze -> validate -> select emitters -> execute -> merge -> persist
//! ```
//!
//! - [`document`] lifts the YAML input into raw definition groups
//! - [`lexer`] and [`parser`] handle the per-field shorthand grammar
//! - [`analyzer`] normalizes entities and runs the inference passes
//! - [`validator`] checks cycles and referential integrity over the registry
//! - [`generator`] runs the emitters; [`manifest`] persists the result
//! - [`error`], [`logging`] and [`recovery`] wrap every stage
//!
//! [`compiler::Compiler`] drives one run end to end.

pub mod analyzer;
pub mod compiler;
pub mod document;
pub mod error;
pub mod fs;
pub mod generator;
pub mod lexer;
pub mod logging;
pub mod manifest;
pub mod model;
pub mod naming;
pub mod options;
pub mod parser;
pub mod recovery;
pub mod validator;
pub mod vocabulary;

pub use analyzer::{Analyzer, InferenceContext, RawAction, RawEntity};
pub use compiler::{Compiler, DEFAULT_MANIFEST_PATH};
pub use document::{parse_document, Document};
pub use error::{
    BlueprintError, BlueprintResult, ErrorCategory, ErrorKind, GenerationError, ParseError,
    SourceLocation, ValidationError,
};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use generator::{Emitter, EmitterRegistry, Orchestrator};
pub use manifest::{GenerationAction, GenerationManifest, GenerationOutput};
pub use model::{ActionEntity, Column, Entity, Index, Modifier, Relationship, Statement, Tree};
pub use options::CompilationOptions;
pub use recovery::{RecoveryContext, RecoveryRegistry, RecoveryResult, RecoveryStrategy};
pub use vocabulary::{DataType, RelationshipKind, StatementVerb};
