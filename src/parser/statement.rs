//! Statement parsing for action entity methods
//!
//! Each method line is `verb: argument`, where the argument may carry a
//! `with:a,b,c` suffix naming auxiliary data references. Verbs dispatch into
//! the closed [`StatementVerb`] vocabulary; unknown verbs following the
//! wildcard `prefix-suffix` convention fall back to the known prefix with the
//! suffix kept as a disambiguating label.

use crate::error::{BlueprintResult, ParseError};
use crate::lexer::{tokenize, Token};
use crate::model::Statement;
use crate::vocabulary::StatementVerb;

pub fn parse_statement(
    verb_keyword: &str,
    argument: &str,
    method: &str,
) -> BlueprintResult<Statement> {
    let (verb, label) = resolve_verb(verb_keyword, method)?;

    let tokens = tokenize(argument)?;
    let mut with = Vec::new();
    let mut target_parts = Vec::new();

    for token in tokens {
        if token.keyword.eq_ignore_ascii_case("with") {
            with.extend(token.args);
        } else {
            target_parts.push(render_token(&token));
        }
    }

    Ok(Statement {
        verb,
        target: target_parts.join(" "),
        with,
        label,
    })
}

fn resolve_verb(
    keyword: &str,
    method: &str,
) -> BlueprintResult<(StatementVerb, Option<String>)> {
    if let Some(verb) = StatementVerb::parse(keyword) {
        return Ok((verb, None));
    }

    // Wildcard convention: `send-invoice` dispatches as `send` labelled `invoice`.
    if let Some((prefix, suffix)) = keyword.split_once('-') {
        if let Some(verb) = StatementVerb::parse(prefix) {
            if !suffix.is_empty() {
                return Ok((verb, Some(suffix.to_string())));
            }
        }
    }

    Err(ParseError::UnknownVerb {
        verb: keyword.to_string(),
        method: method.to_string(),
    }
    .into())
}

fn render_token(token: &Token) -> String {
    if token.args.is_empty() {
        token.keyword.clone()
    } else {
        format!("{}:{}", token.keyword, token.args.join(","))
    }
}
