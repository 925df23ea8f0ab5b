//! Intermediate representation
//!
//! Typed definition records produced by the parser and normalized by the
//! analyzer: columns, relationships, entities, action entities and the
//! statements composing their methods. Everything serializes, because the
//! manifest carries a full entity snapshot across runs.

mod tree;

pub use tree::Tree;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::naming;
use crate::vocabulary::{DataType, RelationshipKind, StatementVerb};

/// A column modifier: bare flag or `name:value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Nullable,
    Unique,
    Index,
    Primary,
    Unsigned,
    AutoIncrement,
    Default(String),
    Foreign(String),
    OnDelete(String),
    OnUpdate(String),
    Comment(String),
}

impl Modifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Nullable => "nullable",
            Self::Unique => "unique",
            Self::Index => "index",
            Self::Primary => "primary",
            Self::Unsigned => "unsigned",
            Self::AutoIncrement => "autoincrement",
            Self::Default(_) => "default",
            Self::Foreign(_) => "foreign",
            Self::OnDelete(_) => "ondelete",
            Self::OnUpdate(_) => "onupdate",
            Self::Comment(_) => "comment",
        }
    }

    fn value(&self) -> Option<&str> {
        match self {
            Self::Default(v)
            | Self::Foreign(v)
            | Self::OnDelete(v)
            | Self::OnUpdate(v)
            | Self::Comment(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{}:{}", self.keyword(), quote_if_needed(value)),
            None => write!(f, "{}", self.keyword()),
        }
    }
}

/// One fully-parsed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    /// Type arguments, e.g. the `400` in `string:400` or enum members
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            attributes: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn has_modifier(&self, keyword: &str) -> bool {
        self.modifiers.iter().any(|m| m.keyword() == keyword)
    }

    pub fn foreign_reference(&self) -> Option<&str> {
        self.modifiers.iter().find_map(|m| match m {
            Modifier::Foreign(reference) => Some(reference.as_str()),
            _ => None,
        })
    }

    /// True when this column looks like a foreign key: an explicit foreign
    /// modifier, the identity-reference type on a non-identity column, or a
    /// conventional `_id` name carrying a reference-shaped type.
    pub fn is_foreign_key_shaped(&self) -> bool {
        self.foreign_reference().is_some()
            || (self.data_type == DataType::Id && self.name != "id")
            || (self.name.ends_with("_id") && self.name.len() > 3 && self.data_type.is_reference())
    }

    /// Canonical shorthand serialization; parsing this back yields an equal column
    pub fn definition(&self) -> String {
        let mut parts = Vec::new();
        if self.attributes.is_empty() {
            parts.push(self.data_type.canonical_name().to_string());
        } else {
            let args: Vec<String> = self
                .attributes
                .iter()
                .map(|a| quote_if_needed(a).into_owned())
                .collect();
            parts.push(format!("{}:{}", self.data_type.canonical_name(), args.join(",")));
        }
        for modifier in &self.modifiers {
            parts.push(modifier.to_string());
        }
        parts.join(" ")
    }
}

fn quote_if_needed(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains(' ') || value.contains(',') || value.contains(':') {
        std::borrow::Cow::Owned(format!("'{value}'"))
    } else {
        std::borrow::Cow::Borrowed(value)
    }
}

/// One declared or inferred relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Relationship {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            alias: None,
        }
    }

    pub fn aliased(target: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            alias: Some(alias.into()),
        }
    }

    /// Surface form: `Target` or `Target:alias`
    pub fn reference(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{}:{}", self.target, alias),
            None => self.target.clone(),
        }
    }

    /// Name this relationship answers to on the owning entity
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }

    /// Foreign-key column a belongs-to form of this relationship implies.
    /// Aliased and un-aliased declarations of the same link synthesize the
    /// same name only when they agree, which is what deduplication keys on.
    pub fn foreign_key_column(&self) -> String {
        naming::foreign_key_name(self.local_name())
    }
}

/// A declared index over one or more columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// A normalized data-model entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub columns: IndexMap<String, Column>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub relationships: IndexMap<RelationshipKind, Vec<Relationship>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,
    pub uses_identity: bool,
    pub uses_timestamps: bool,
    #[serde(default)]
    pub uses_soft_delete: bool,
    #[serde(default)]
    pub is_auxiliary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            relationships: IndexMap::new(),
            indexes: Vec::new(),
            mixins: Vec::new(),
            uses_identity: true,
            uses_timestamps: true,
            uses_soft_delete: false,
            is_auxiliary: false,
            table: None,
            connection: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn relationships_of(&self, kind: RelationshipKind) -> &[Relationship] {
        self.relationships
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All relationships regardless of kind, with their kind
    pub fn all_relationships(&self) -> impl Iterator<Item = (RelationshipKind, &Relationship)> {
        self.relationships
            .iter()
            .flat_map(|(kind, rels)| rels.iter().map(move |r| (*kind, r)))
    }

    /// Table name, derived from the entity name unless overridden
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| naming::snake_case(&self.name))
    }
}

/// One typed command inside an action entity method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub verb: StatementVerb,
    pub target: String,
    /// Auxiliary data references from a `with:a,b,c` suffix
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with: Vec<String>,
    /// Disambiguating label from the wildcard `prefix-suffix` verb convention
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A normalized behavior definition: ordered methods of ordered statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntity {
    pub name: String,
    pub methods: IndexMap<String, Vec<Statement>>,
}

impl ActionEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: IndexMap::new(),
        }
    }
}
