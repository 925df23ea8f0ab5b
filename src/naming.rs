//! Naming helpers for inference
//!
//! Foreign-key names are derived by singularizing and snake-casing the target
//! reference and appending `_id`; the reverse direction recovers an entity
//! name from a foreign-key-shaped column name.

use heck::{ToSnakeCase, ToUpperCamelCase};

/// `BlogPost` -> `blog_post`
pub fn snake_case(name: &str) -> String {
    name.to_snake_case()
}

/// `blog_post` -> `BlogPost`
pub fn studly_case(name: &str) -> String {
    name.to_upper_camel_case()
}

/// Best-effort English singularization, covering the shapes entity names take
pub fn singular(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some(stem) = word.strip_suffix("ies") {
        if word.len() > 3 {
            return format!("{stem}y");
        }
    }
    for suffix in ["ches", "shes", "sses", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Foreign-key column name for a relationship reference: `User` -> `user_id`
pub fn foreign_key_name(reference: &str) -> String {
    format!("{}_id", snake_case(&singular(reference)))
}

/// Entity name implied by a foreign-key column name: `author_id` -> `Author`
pub fn entity_from_foreign_key(column: &str) -> Option<String> {
    column
        .strip_suffix("_id")
        .filter(|stem| !stem.is_empty())
        .map(studly_case)
}

/// Pivot table name for a many-to-many pair: sorted singular snake names
pub fn pivot_name(a: &str, b: &str) -> String {
    let mut parts = [snake_case(&singular(a)), snake_case(&singular(b))];
    parts.sort();
    parts.join("_")
}
