//! Semantic analyzer
//!
//! Turns one entity's raw definition group into a normalized [`Entity`]
//! through an explicit two-phase build: an immutable [`RawEntity`] input plus
//! an [`InferenceContext`] threaded through the inference passes, producing a
//! new entity. The passes are idempotent and order-independent:
//!
//! 1. identity defaulting: synthesize the `id` column unless disabled
//! 2. relationship -> column: synthesize/retype foreign keys implied by
//!    belongs-to declarations
//! 3. column -> relationship: synthesize belongs-to links implied by
//!    foreign-key-shaped columns, deduplicated by synthesized column name
//!
//! Alias resolution runs inside passes 2 and 3: an aliased reference names
//! the inferred column and relationship after the alias while the type
//! reference stays the real target.
//!
//! Cross-entity integrity is not checked here; that is the validator's job.

use std::collections::HashSet;

use crate::error::{BlueprintResult, ParseError};
use crate::lexer::tokenize;
use crate::model::{ActionEntity, Column, Entity, Index, Relationship};
use crate::naming;
use crate::options::CompilationOptions;
use crate::parser::{parse_field, parse_relationships, parse_statement, ParsedField};
use crate::vocabulary::{DataType, RelationshipKind};

/// Raw definition group for one data entity, straight from the document
#[derive(Debug, Clone, Default)]
pub struct RawEntity {
    pub name: String,
    /// Ordered `name -> shorthand` field entries
    pub fields: Vec<(String, String)>,
    /// `kind keyword -> refs` entries from the relationships block
    pub relationships: Vec<(String, String)>,
    /// Index shorthand entries, e.g. `unique:title,author_id`
    pub indexes: Vec<String>,
    pub mixins: Vec<String>,
    pub uses_identity: Option<bool>,
    pub uses_timestamps: Option<bool>,
    pub uses_soft_delete: bool,
    pub is_auxiliary: bool,
    pub table: Option<String>,
    pub connection: Option<String>,
}

impl RawEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Raw definition group for one action entity
#[derive(Debug, Clone, Default)]
pub struct RawAction {
    pub name: String,
    /// Ordered `method -> [(verb, argument)]` entries
    pub methods: Vec<(String, Vec<(String, String)>)>,
}

/// Cross-entity context available to the inference passes
#[derive(Debug, Clone, Default)]
pub struct InferenceContext {
    known_entities: HashSet<String>,
    /// `snake_case(singular(name))` -> declared entity name
    by_stem: std::collections::HashMap<String, String>,
}

impl InferenceContext {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let known_entities: HashSet<String> = names.into_iter().collect();
        let by_stem = known_entities
            .iter()
            .map(|name| (naming::snake_case(&naming::singular(name)), name.clone()))
            .collect();
        Self {
            known_entities,
            by_stem,
        }
    }

    pub fn knows(&self, name: &str) -> bool {
        self.known_entities.contains(name)
    }

    /// Resolve a column stem or table name to a declared entity name, so
    /// inferred targets keep the author's casing (`api_token` -> `APIToken`).
    pub fn resolve(&self, stem: &str) -> Option<&str> {
        self.by_stem
            .get(&naming::snake_case(&naming::singular(stem)))
            .map(String::as_str)
    }
}

pub struct Analyzer<'a> {
    options: &'a CompilationOptions,
}

impl<'a> Analyzer<'a> {
    pub fn new(options: &'a CompilationOptions) -> Self {
        Self { options }
    }

    /// Build a normalized entity from its raw definition group
    pub fn analyze(&self, raw: &RawEntity, ctx: &InferenceContext) -> BlueprintResult<Entity> {
        let mut entity = Entity::new(&raw.name);
        entity.uses_identity = raw.uses_identity.unwrap_or(self.options.default_identity);
        entity.uses_timestamps = raw
            .uses_timestamps
            .unwrap_or(self.options.default_timestamps);
        entity.uses_soft_delete = raw.uses_soft_delete;
        entity.is_auxiliary = raw.is_auxiliary;
        entity.table = raw.table.clone();
        entity.connection = raw.connection.clone();
        entity.mixins = raw.mixins.clone();

        for (name, definition) in &raw.fields {
            match parse_field(name, definition)? {
                ParsedField::Column(column) => {
                    entity.columns.insert(column.name.clone(), column);
                }
                ParsedField::Relationship { kind, relationship } => {
                    entity.relationships.entry(kind).or_default().push(relationship);
                }
            }
        }

        for (kind_keyword, refs) in &raw.relationships {
            let (kind, relationships) = parse_relationships(kind_keyword, refs, &raw.name)?;
            entity.relationships.entry(kind).or_default().extend(relationships);
        }

        for definition in &raw.indexes {
            entity.indexes.push(parse_index(definition)?);
        }

        self.infer(&mut entity, ctx);
        Ok(entity)
    }

    /// Run the inference passes; safe to call repeatedly
    pub fn infer(&self, entity: &mut Entity, ctx: &InferenceContext) {
        self.default_identity(entity);
        self.columns_from_relationships(entity);
        self.relationships_from_columns(entity, ctx);
    }

    // Pass 1: identity defaulting.
    fn default_identity(&self, entity: &mut Entity) {
        if entity.uses_identity && !entity.columns.contains_key("id") {
            entity
                .columns
                .shift_insert(0, "id".to_string(), Column::new("id", DataType::Id));
        }
    }

    // Pass 2: relationship -> column inference. Every belongs-to declaration
    // implies a foreign-key column named after the (aliased) reference. A
    // reference-typed column already named like the relationship itself
    // (`owner: id`) is the foreign key; no `_id` twin is synthesized for it.
    fn columns_from_relationships(&self, entity: &mut Entity) {
        let wanted: Vec<(String, String)> = entity
            .relationships_of(RelationshipKind::BelongsTo)
            .iter()
            .map(|r| (r.foreign_key_column(), naming::snake_case(r.local_name())))
            .collect();

        for (fk, local) in wanted {
            if let Some(column) = entity.columns.get_mut(&fk) {
                if !column.data_type.is_reference() {
                    column.data_type = DataType::Id;
                }
                continue;
            }
            let bare_fk = entity
                .columns
                .get(&local)
                .is_some_and(|c| c.data_type.is_reference());
            if !bare_fk {
                entity.columns.insert(fk.clone(), Column::new(fk, DataType::Id));
            }
        }
    }

    // Pass 3: column -> relationship inference. Deduplication compares the
    // synthesized foreign-key column name rather than surface text, so an
    // aliased declaration and its inferred column never produce a second link.
    fn relationships_from_columns(&self, entity: &mut Entity, ctx: &InferenceContext) {
        let mut existing: HashSet<String> = entity
            .relationships_of(RelationshipKind::BelongsTo)
            .iter()
            .map(Relationship::foreign_key_column)
            .collect();

        let mut inferred = Vec::new();
        for column in entity.columns.values() {
            if !column.is_foreign_key_shaped() {
                continue;
            }
            if let Some(relationship) = relationship_for_column(column, ctx) {
                if existing.insert(relationship.foreign_key_column()) {
                    inferred.push(relationship);
                }
            }
        }

        if !inferred.is_empty() {
            entity
                .relationships
                .entry(RelationshipKind::BelongsTo)
                .or_default()
                .extend(inferred);
        }
    }

    /// Build an action entity from its raw method map
    pub fn analyze_action(&self, raw: &RawAction) -> BlueprintResult<ActionEntity> {
        let mut action = ActionEntity::new(&raw.name);
        for (method, statements) in &raw.methods {
            let mut parsed = Vec::with_capacity(statements.len());
            for (verb, argument) in statements {
                parsed.push(parse_statement(verb, argument, method)?);
            }
            action.methods.insert(method.clone(), parsed);
        }
        Ok(action)
    }
}

// Derive the belongs-to link implied by a foreign-key-shaped column. An
// explicit `foreign:users` reference wins over the name-derived target; the
// column stem becomes the alias when it differs from the target's default.
// Identity-typed columns without the `_id` suffix (`owner: id`) use the
// whole name as the stem.
fn relationship_for_column(column: &Column, ctx: &InferenceContext) -> Option<Relationship> {
    let stem = column.name.strip_suffix("_id").filter(|s| !s.is_empty());

    if let Some(reference) = column.foreign_reference() {
        let table = reference.split('.').next().unwrap_or(reference);
        let target = ctx
            .resolve(table)
            .map(str::to_string)
            .unwrap_or_else(|| naming::studly_case(&naming::singular(table)));
        let alias = stem
            .filter(|s| naming::foreign_key_name(s) != naming::foreign_key_name(&target))
            .map(str::to_string);
        return Some(Relationship { target, alias });
    }

    let stem = stem.unwrap_or(&column.name);
    let target = ctx
        .resolve(stem)
        .map(str::to_string)
        .unwrap_or_else(|| naming::studly_case(stem));
    if naming::foreign_key_name(stem) == naming::foreign_key_name(&target) {
        Some(Relationship::new(target))
    } else {
        Some(Relationship::aliased(target, stem))
    }
}

fn parse_index(definition: &str) -> BlueprintResult<Index> {
    let tokens = tokenize(definition)?;
    let token = tokens.first().ok_or_else(|| ParseError::MalformedShorthand {
        token: String::new(),
        definition: definition.to_string(),
    })?;

    let unique = match token.keyword.to_ascii_lowercase().as_str() {
        "unique" => true,
        "index" => false,
        _ => {
            return Err(ParseError::MalformedShorthand {
                token: token.keyword.clone(),
                definition: definition.to_string(),
            }
            .into())
        }
    };

    if token.args.is_empty() {
        return Err(ParseError::MalformedShorthand {
            token: token.keyword.clone(),
            definition: definition.to_string(),
        }
        .into());
    }

    Ok(Index {
        columns: token.args.clone(),
        unique,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(raw: &RawEntity) -> Entity {
        let options = CompilationOptions::default();
        Analyzer::new(&options)
            .analyze(raw, &InferenceContext::default())
            .unwrap()
    }

    fn raw_with_fields(name: &str, fields: &[(&str, &str)]) -> RawEntity {
        let mut raw = RawEntity::new(name);
        raw.fields = fields
            .iter()
            .map(|(n, d)| (n.to_string(), d.to_string()))
            .collect();
        raw
    }

    #[test]
    fn test_identity_defaulting() {
        let entity = analyze(&raw_with_fields("Post", &[("title", "string")]));
        let first = entity.columns.get_index(0).unwrap();
        assert_eq!(first.0, "id");
        assert_eq!(first.1.data_type, DataType::Id);
    }

    #[test]
    fn test_identity_disabled() {
        let mut raw = raw_with_fields("Log", &[("message", "text")]);
        raw.uses_identity = Some(false);
        let entity = analyze(&raw);
        assert!(!entity.columns.contains_key("id"));
    }

    #[test]
    fn test_relationship_implies_column() {
        let mut raw = raw_with_fields("Post", &[("title", "string")]);
        raw.relationships = vec![("belongsTo".to_string(), "User".to_string())];
        let entity = analyze(&raw);
        let fk = entity.column("user_id").expect("user_id synthesized");
        assert_eq!(fk.data_type, DataType::Id);
    }

    #[test]
    fn test_aliased_relationship_uses_alias_for_column() {
        let mut raw = raw_with_fields("Post", &[("title", "string")]);
        raw.relationships = vec![("belongsTo".to_string(), "User:author".to_string())];
        let entity = analyze(&raw);
        assert!(entity.column("author_id").is_some());
        assert!(entity.column("user_id").is_none());
        let rels = entity.relationships_of(RelationshipKind::BelongsTo);
        assert_eq!(rels[0].reference(), "User:author");
    }

    #[test]
    fn test_existing_column_retyped_to_reference() {
        let mut raw = raw_with_fields("Post", &[("user_id", "integer")]);
        raw.relationships = vec![("belongsTo".to_string(), "User".to_string())];
        let entity = analyze(&raw);
        assert_eq!(entity.column("user_id").unwrap().data_type, DataType::Id);
    }

    #[test]
    fn test_column_implies_relationship() {
        let entity = analyze(&raw_with_fields("Post", &[("user_id", "id")]));
        let rels = entity.relationships_of(RelationshipKind::BelongsTo);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].target, "User");
    }

    #[test]
    fn test_bare_identity_column_implies_relationship() {
        // `owner: id` has no `_id` suffix; the whole name is the stem and
        // the column itself serves as the foreign key.
        let entity = analyze(&raw_with_fields("Post", &[("owner", "id")]));
        let rels = entity.relationships_of(RelationshipKind::BelongsTo);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].target, "Owner");
        assert!(entity.column("owner_id").is_none());
    }

    #[test]
    fn test_bare_identity_column_inference_is_idempotent() {
        let raw = raw_with_fields("Post", &[("owner", "id")]);
        let options = CompilationOptions::default();
        let analyzer = Analyzer::new(&options);
        let ctx = InferenceContext::default();
        let mut entity = analyzer.analyze(&raw, &ctx).unwrap();
        let before = entity.clone();
        analyzer.infer(&mut entity, &ctx);
        assert_eq!(entity, before);
        assert_eq!(entity.relationships_of(RelationshipKind::BelongsTo).len(), 1);
    }

    #[test]
    fn test_foreign_modifier_implies_aliased_relationship() {
        let entity = analyze(&raw_with_fields("Post", &[("author_id", "foreign:users")]));
        let rels = entity.relationships_of(RelationshipKind::BelongsTo);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].reference(), "User:author");
    }

    #[test]
    fn test_inference_deduplicates_aliased_and_inferred() {
        // The declared aliased link already accounts for author_id; pass 3
        // must not add a second relationship for the synthesized column.
        let mut raw = raw_with_fields("Post", &[("title", "string")]);
        raw.relationships = vec![("belongsTo".to_string(), "User:author".to_string())];
        let entity = analyze(&raw);
        assert_eq!(entity.relationships_of(RelationshipKind::BelongsTo).len(), 1);
    }

    #[test]
    fn test_inference_is_idempotent() {
        let mut raw = raw_with_fields("Post", &[("title", "string")]);
        raw.relationships = vec![("belongsTo".to_string(), "User:author".to_string())];
        let options = CompilationOptions::default();
        let analyzer = Analyzer::new(&options);
        let ctx = InferenceContext::default();
        let mut entity = analyzer.analyze(&raw, &ctx).unwrap();
        let before = entity.clone();
        analyzer.infer(&mut entity, &ctx);
        analyzer.infer(&mut entity, &ctx);
        assert_eq!(entity, before);
    }

    #[test]
    fn test_inline_relationship_field() {
        let entity = analyze(&raw_with_fields(
            "Post",
            &[("title", "string"), ("author", "belongsTo User")],
        ));
        assert!(entity.column("author_id").is_some());
        let rels = entity.relationships_of(RelationshipKind::BelongsTo);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].reference(), "User:author");
    }

    #[test]
    fn test_index_parsing() {
        let mut raw = raw_with_fields("Post", &[("title", "string")]);
        raw.indexes = vec!["unique:title,user_id".to_string(), "index:title".to_string()];
        let entity = analyze(&raw);
        assert_eq!(entity.indexes.len(), 2);
        assert!(entity.indexes[0].unique);
        assert_eq!(entity.indexes[0].columns, vec!["title", "user_id"]);
        assert!(!entity.indexes[1].unique);
    }

    #[test]
    fn test_action_analysis() {
        let options = CompilationOptions::default();
        let analyzer = Analyzer::new(&options);
        let raw = RawAction {
            name: "PostActions".to_string(),
            methods: vec![(
                "index".to_string(),
                vec![
                    ("query".to_string(), "all:posts".to_string()),
                    ("render".to_string(), "post.index with:posts".to_string()),
                ],
            )],
        };
        let action = analyzer.analyze_action(&raw).unwrap();
        assert_eq!(action.methods["index"].len(), 2);
        assert_eq!(action.methods["index"][1].with, vec!["posts"]);
    }
}
