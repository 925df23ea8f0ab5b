//! Definition parser
//!
//! Consumes shorthand tokens and produces typed definition records by
//! matching keywords against the fixed vocabularies: columns and
//! relationships for data entities, statements for action entity methods.

mod column;
mod statement;

pub use column::{parse_field, parse_relationships, ParsedField};
pub use statement::parse_statement;
