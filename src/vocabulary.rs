//! Fixed shorthand vocabularies
//!
//! Three disjoint keyword sets drive definition parsing: data types, column
//! modifiers and relationship kinds, plus the statement verb set used by
//! action entities. All lookups are case-insensitive; relationship kinds and
//! statement verbs also accept aliases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical column data types
///
/// `Id` doubles as the identity/foreign-key reference type the analyzer
/// synthesizes for inferred columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Id,
    Uuid,
    String,
    Char,
    Text,
    LongText,
    Integer,
    BigInteger,
    SmallInteger,
    TinyInteger,
    UnsignedInteger,
    UnsignedBigInteger,
    Decimal,
    Float,
    Double,
    Boolean,
    Date,
    DateTime,
    Timestamp,
    Time,
    Json,
    Enum,
    Binary,
}

impl DataType {
    /// Case-insensitive lookup, including common aliases
    pub fn parse(keyword: &str) -> Option<Self> {
        let canonical = match keyword.to_ascii_lowercase().as_str() {
            "id" | "foreignid" => Self::Id,
            "uuid" => Self::Uuid,
            "string" | "varchar" => Self::String,
            "char" => Self::Char,
            "text" => Self::Text,
            "longtext" => Self::LongText,
            "integer" | "int" => Self::Integer,
            "biginteger" | "bigint" => Self::BigInteger,
            "smallinteger" | "smallint" => Self::SmallInteger,
            "tinyinteger" | "tinyint" => Self::TinyInteger,
            "unsignedinteger" => Self::UnsignedInteger,
            "unsignedbiginteger" => Self::UnsignedBigInteger,
            "decimal" | "numeric" => Self::Decimal,
            "float" => Self::Float,
            "double" => Self::Double,
            "boolean" | "bool" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "timestamp" => Self::Timestamp,
            "time" => Self::Time,
            "json" | "jsonb" => Self::Json,
            "enum" => Self::Enum,
            "binary" => Self::Binary,
            _ => return None,
        };
        Some(canonical)
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Uuid => "uuid",
            Self::String => "string",
            Self::Char => "char",
            Self::Text => "text",
            Self::LongText => "longtext",
            Self::Integer => "integer",
            Self::BigInteger => "biginteger",
            Self::SmallInteger => "smallinteger",
            Self::TinyInteger => "tinyinteger",
            Self::UnsignedInteger => "unsignedinteger",
            Self::UnsignedBigInteger => "unsignedbiginteger",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Time => "time",
            Self::Json => "json",
            Self::Enum => "enum",
            Self::Binary => "binary",
        }
    }

    /// True for types that look like a reference to another entity's identity
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Id | Self::Uuid)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// The fixed relationship vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationshipKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

impl RelationshipKind {
    /// Case-insensitive lookup; unmatched keywords go through the alias table
    pub fn parse(keyword: &str) -> Option<Self> {
        let canonical = match keyword.to_ascii_lowercase().as_str() {
            "belongsto" | "belongs_to" => Self::BelongsTo,
            "hasone" | "has_one" => Self::HasOne,
            "hasmany" | "has_many" => Self::HasMany,
            "belongstomany" | "belongs_to_many" | "manytomany" | "many_to_many" => {
                Self::BelongsToMany
            }
            _ => return None,
        };
        Some(canonical)
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::BelongsTo => "belongsTo",
            Self::HasOne => "hasOne",
            Self::HasMany => "hasMany",
            Self::BelongsToMany => "belongsToMany",
        }
    }

    pub fn all() -> [Self; 4] {
        [
            Self::BelongsTo,
            Self::HasOne,
            Self::HasMany,
            Self::BelongsToMany,
        ]
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// The fixed statement verb vocabulary for action entity methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementVerb {
    Query,
    Save,
    Update,
    Delete,
    Find,
    Render,
    Redirect,
    Respond,
    Send,
    Validate,
    Flash,
    Dispatch,
    Fire,
}

impl StatementVerb {
    pub fn parse(keyword: &str) -> Option<Self> {
        let canonical = match keyword.to_ascii_lowercase().as_str() {
            "query" => Self::Query,
            "save" | "store" => Self::Save,
            "update" => Self::Update,
            "delete" | "destroy" => Self::Delete,
            "find" | "lookup" => Self::Find,
            "render" | "view" => Self::Render,
            "redirect" => Self::Redirect,
            "respond" => Self::Respond,
            "send" | "notify" => Self::Send,
            "validate" => Self::Validate,
            "flash" => Self::Flash,
            "dispatch" => Self::Dispatch,
            "fire" => Self::Fire,
            _ => return None,
        };
        Some(canonical)
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Save => "save",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Find => "find",
            Self::Render => "render",
            Self::Redirect => "redirect",
            Self::Respond => "respond",
            Self::Send => "send",
            Self::Validate => "validate",
            Self::Flash => "flash",
            Self::Dispatch => "dispatch",
            Self::Fire => "fire",
        }
    }
}

impl fmt::Display for StatementVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// Bare modifier keywords (value-carrying modifiers are matched in the parser)
pub const BARE_MODIFIERS: &[&str] = &[
    "nullable",
    "unique",
    "index",
    "primary",
    "unsigned",
    "autoincrement",
];

/// Modifier keywords that take a `:value` argument
pub const VALUE_MODIFIERS: &[&str] = &["default", "foreign", "ondelete", "onupdate", "comment"];
