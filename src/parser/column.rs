//! Column and relationship definition parsing

use tracing::warn;

use crate::error::{BlueprintResult, ParseError, ValidationError};
use crate::lexer::{split_outside_quotes, strip_quotes, tokenize, Token};
use crate::model::{Column, Modifier, Relationship};
use crate::naming;
use crate::vocabulary::{DataType, RelationshipKind, BARE_MODIFIERS, VALUE_MODIFIERS};

/// A field definition resolves to either a column or an inline relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedField {
    Column(Column),
    Relationship {
        kind: RelationshipKind,
        relationship: Relationship,
    },
}

/// Parse one `name: definition` entry from an entity's field map
///
/// A definition whose first keyword belongs to the relationship vocabulary is
/// an inline relationship declaration; the field name becomes its alias.
pub fn parse_field(name: &str, definition: &str) -> BlueprintResult<ParsedField> {
    let tokens = tokenize(definition)?;

    if let Some(first) = tokens.first() {
        if let Some(kind) = RelationshipKind::parse(&first.keyword) {
            let relationship = parse_inline_relationship(name, &tokens, definition)?;
            return Ok(ParsedField::Relationship { kind, relationship });
        }
    }

    Ok(ParsedField::Column(parse_column(name, &tokens, definition)?))
}

// `author: belongsTo User` or `author: belongsTo:User`; the field name
// aliases the relationship unless it matches the target's default naming.
fn parse_inline_relationship(
    name: &str,
    tokens: &[Token],
    definition: &str,
) -> BlueprintResult<Relationship> {
    let (target, consumed) = if let Some(arg) = tokens[0].args.first() {
        (arg.clone(), 1)
    } else if let Some(next) = tokens.get(1) {
        (next.keyword.clone(), 2)
    } else {
        return Err(ParseError::MalformedShorthand {
            token: tokens[0].keyword.clone(),
            definition: definition.to_string(),
        }
        .into());
    };

    // Exactly one target; anything after it is malformed, not ignored.
    if let Some(extra) = tokens[0].args.get(1) {
        return Err(ParseError::MalformedShorthand {
            token: extra.clone(),
            definition: definition.to_string(),
        }
        .into());
    }
    if consumed == 2 {
        if let Some(extra) = tokens[1].args.first() {
            return Err(ParseError::MalformedShorthand {
                token: extra.clone(),
                definition: definition.to_string(),
            }
            .into());
        }
    }
    if let Some(extra) = tokens.get(consumed) {
        return Err(ParseError::MalformedShorthand {
            token: extra.keyword.clone(),
            definition: definition.to_string(),
        }
        .into());
    }

    if naming::foreign_key_name(name) == naming::foreign_key_name(&target) {
        Ok(Relationship::new(target))
    } else {
        Ok(Relationship::aliased(target, name))
    }
}

fn parse_column(name: &str, tokens: &[Token], definition: &str) -> BlueprintResult<Column> {
    let mut data_type: Option<DataType> = None;
    let mut attributes = Vec::new();
    let mut modifiers = Vec::new();

    for token in tokens {
        if let Some(parsed) = DataType::parse(&token.keyword) {
            if let Some(previous) = data_type {
                // Last one wins, preserved for compatibility with the
                // reference behavior; surface the conflict as a warning.
                warn!(
                    column = name,
                    previous = %previous,
                    replacement = %parsed,
                    "conflicting data-type keywords in definition, last one wins"
                );
            }
            data_type = Some(parsed);
            attributes = token.args.clone();
            continue;
        }

        if let Some(modifier) = parse_modifier(token) {
            modifiers.push(modifier);
            continue;
        }

        return Err(ParseError::MalformedShorthand {
            token: token.keyword.clone(),
            definition: definition.to_string(),
        }
        .into());
    }

    // No explicit type: foreign-key-shaped definitions default to the
    // identity-reference type, everything else to string.
    let has_foreign = modifiers.iter().any(|m| matches!(m, Modifier::Foreign(_)));
    let data_type = data_type.unwrap_or(if has_foreign {
        DataType::Id
    } else {
        DataType::String
    });

    Ok(Column {
        name: name.to_string(),
        data_type,
        attributes,
        modifiers,
    })
}

fn parse_modifier(token: &Token) -> Option<Modifier> {
    let keyword = token.keyword.to_ascii_lowercase();

    if BARE_MODIFIERS.contains(&keyword.as_str()) && token.args.is_empty() {
        return Some(match keyword.as_str() {
            "nullable" => Modifier::Nullable,
            "unique" => Modifier::Unique,
            "index" => Modifier::Index,
            "primary" => Modifier::Primary,
            "unsigned" => Modifier::Unsigned,
            "autoincrement" => Modifier::AutoIncrement,
            _ => unreachable!(),
        });
    }

    if VALUE_MODIFIERS.contains(&keyword.as_str()) {
        let value = token.args.join(",");
        return Some(match keyword.as_str() {
            "default" => Modifier::Default(value),
            "foreign" => Modifier::Foreign(value),
            "ondelete" => Modifier::OnDelete(value),
            "onupdate" => Modifier::OnUpdate(value),
            "comment" => Modifier::Comment(value),
            _ => unreachable!(),
        });
    }

    None
}

/// Parse one `kind: refs` entry from an entity's relationships map
///
/// Refs are comma-separated `Target` or `Target:alias` references. Unknown
/// kinds are a validation failure, never silently dropped.
pub fn parse_relationships(
    kind_keyword: &str,
    refs: &str,
    owner: &str,
) -> BlueprintResult<(RelationshipKind, Vec<Relationship>)> {
    let kind = RelationshipKind::parse(kind_keyword).ok_or_else(|| ValidationError::InvalidRelationshipKind {
        kind: kind_keyword.to_string(),
        owner: owner.to_string(),
    })?;

    let mut relationships = Vec::new();
    for reference in split_outside_quotes(refs, ',') {
        let reference = reference.trim();
        if reference.is_empty() {
            continue;
        }
        let mut parts = split_outside_quotes(reference, ':').into_iter();
        let target = strip_quotes(parts.next().unwrap_or_default().trim()).to_string();
        if target.is_empty() {
            return Err(ParseError::MalformedShorthand {
                token: reference.to_string(),
                definition: refs.to_string(),
            }
            .into());
        }
        let alias = parts
            .next()
            .map(|a| strip_quotes(a.trim()).to_string())
            .filter(|a| !a.is_empty());
        relationships.push(Relationship { target, alias });
    }

    Ok((kind, relationships))
}
