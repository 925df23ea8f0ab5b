//! Shorthand tokenizer
//!
//! Splits a single shorthand definition string (one column, relationship or
//! statement definition) into discrete tokens. Whitespace separates tokens, quoted
//! runs (`"…"` / `'…'`) are atomic, and each token is split on its first `:`
//! into a keyword and a comma-separated argument list.

use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, opt},
    multi::{many1, separated_list0},
    sequence::delimited,
    IResult,
};

use crate::error::{BlueprintResult, ParseError};

/// One atomic shorthand unit: `name` or `name:arg1,arg2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub keyword: String,
    pub args: Vec<String>,
}

impl Token {
    pub fn bare(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            args: Vec::new(),
        }
    }
}

/// Tokenize a full definition string
///
/// Returns a parse error when the input cannot be consumed completely, which
/// in practice means an unterminated quoted run.
pub fn tokenize(definition: &str) -> BlueprintResult<Vec<Token>> {
    let mut parser = all_consuming(delimited(
        multispace0,
        separated_list0(multispace1, raw_token),
        multispace0,
    ));

    match parser(definition) {
        Ok((_, raws)) => Ok(raws.iter().map(|raw| split_token(raw)).collect()),
        Err(_) => Err(ParseError::MalformedShorthand {
            token: definition.trim().to_string(),
            definition: definition.to_string(),
        }
        .into()),
    }
}

// A raw token is a run of bare and quoted pieces with no intervening space.
fn raw_token(input: &str) -> IResult<&str, String> {
    map(many1(alt((quoted_piece, bare_piece))), |pieces| {
        pieces.concat()
    })(input)
}

// Quoted run, quotes preserved so later splitting can respect them.
fn quoted_piece(input: &str) -> IResult<&str, String> {
    alt((
        map(
            delimited(char('"'), opt(is_not("\"")), char('"')),
            |inner: Option<&str>| format!("\"{}\"", inner.unwrap_or("")),
        ),
        map(
            delimited(char('\''), opt(is_not("'")), char('\'')),
            |inner: Option<&str>| format!("'{}'", inner.unwrap_or("")),
        ),
    ))(input)
}

fn bare_piece(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| !c.is_whitespace() && c != '"' && c != '\''),
        str::to_string,
    )(input)
}

// Split a raw token on the first `:` outside quotes, then comma-split the
// argument list, stripping the quotes from each individual argument.
fn split_token(raw: &str) -> Token {
    match find_outside_quotes(raw, ':') {
        Some(idx) => {
            let keyword = raw[..idx].to_string();
            let args = split_outside_quotes(&raw[idx + 1..], ',')
                .into_iter()
                .map(|arg| strip_quotes(arg.trim()).to_string())
                .filter(|arg| !arg.is_empty())
                .collect();
            Token { keyword, args }
        }
        None => Token::bare(strip_quotes(raw)),
    }
}

fn find_outside_quotes(s: &str, needle: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == needle => return Some(idx),
            None => {}
        }
    }
    None
}

/// Split on a separator, ignoring separators inside quoted runs
pub fn split_outside_quotes(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == sep => {
                parts.push(std::mem::take(&mut current));
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Strip one pair of matching surrounding quotes, if present
pub fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
