//! Whole-registry validation
//!
//! Two checks run over the finished registry before any file-producing work
//! begins: circular-reference detection across the entity relationship graph
//! and referential integrity of every string-typed relationship target.
//! Failing fast here is deliberate; emitters never see an invalid tree.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{BlueprintResult, ValidationError};
use crate::model::Tree;

pub fn validate(tree: &Tree) -> BlueprintResult<()> {
    detect_cycles(tree)?;
    check_references(tree)?;
    debug!(
        entities = tree.entities().len(),
        actions = tree.action_entities().len(),
        "registry validated"
    );
    Ok(())
}

/// Depth-first cycle detection over the entity reference graph
///
/// An edge A -> B exists for every relationship on A targeting B. Each
/// traversal tracks its ancestor path; a node reappearing in its own path is
/// a cycle, reported as the closed path starting and ending at that node.
/// Nodes proven acyclic are memoized so the whole-registry sweep stays
/// O(V + E).
fn detect_cycles(tree: &Tree) -> BlueprintResult<()> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, entity) in tree.entities() {
        let targets = edges.entry(name.as_str()).or_default();
        for (_, relationship) in entity.all_relationships() {
            targets.push(relationship.target.as_str());
        }
    }

    let mut acyclic: HashSet<&str> = HashSet::new();
    for start in tree.entities().keys() {
        let mut path = Vec::new();
        walk(start.as_str(), &edges, &mut path, &mut acyclic)?;
    }
    Ok(())
}

fn walk<'a>(
    node: &'a str,
    edges: &HashMap<&'a str, Vec<&'a str>>,
    path: &mut Vec<&'a str>,
    acyclic: &mut HashSet<&'a str>,
) -> BlueprintResult<()> {
    if acyclic.contains(node) {
        return Ok(());
    }

    if let Some(position) = path.iter().position(|n| *n == node) {
        let mut cycle: Vec<String> = path[position..].iter().map(|n| n.to_string()).collect();
        cycle.push(node.to_string());
        return Err(ValidationError::CircularDependency { cycle }.into());
    }

    path.push(node);
    for target in edges.get(node).into_iter().flatten() {
        // Unknown targets are the referential-integrity check's concern.
        if edges.contains_key(target) {
            walk(target, edges, path, acyclic)?;
        }
    }
    path.pop();

    acyclic.insert(node);
    Ok(())
}

/// Every string-typed relationship target must resolve to a current or
/// cached entity; a dangling reference names the relationship, its owner and
/// the missing target.
fn check_references(tree: &Tree) -> BlueprintResult<()> {
    for (name, entity) in tree.entities() {
        for (kind, relationship) in entity.all_relationships() {
            if !tree.knows_entity(&relationship.target) {
                return Err(ValidationError::DanglingReference {
                    owner: name.clone(),
                    kind: kind.canonical_name().to_string(),
                    target: relationship.target.clone(),
                }
                .into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{Entity, Relationship};
    use crate::vocabulary::RelationshipKind;

    fn entity_with_belongs_to(name: &str, targets: &[&str]) -> Entity {
        let mut entity = Entity::new(name);
        entity.relationships.insert(
            RelationshipKind::BelongsTo,
            targets.iter().map(|t| Relationship::new(*t)).collect(),
        );
        entity
    }

    fn tree_of(entities: Vec<Entity>) -> Tree {
        let mut tree = Tree::new();
        for entity in entities {
            tree.insert_entity(entity).unwrap();
        }
        tree
    }

    #[test]
    fn test_valid_tree_passes() {
        let tree = tree_of(vec![
            entity_with_belongs_to("Post", &["User"]),
            Entity::new("User"),
        ]);
        assert!(validate(&tree).is_ok());
    }

    #[test]
    fn test_direct_two_cycle_names_closed_path() {
        let tree = tree_of(vec![
            entity_with_belongs_to("A", &["B"]),
            entity_with_belongs_to("B", &["A"]),
        ]);
        let err = validate(&tree).unwrap_err();
        match err.kind {
            ErrorKind::Validation(ValidationError::CircularDependency { cycle }) => {
                assert_eq!(cycle, vec!["A", "B", "A"]);
            }
            other => panic!("expected circular dependency, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let tree = tree_of(vec![entity_with_belongs_to("Node", &["Node"])]);
        let err = validate(&tree).unwrap_err();
        match err.kind {
            ErrorKind::Validation(ValidationError::CircularDependency { cycle }) => {
                assert_eq!(cycle, vec!["Node", "Node"]);
            }
            other => panic!("expected circular dependency, got {other:?}"),
        }
    }

    #[test]
    fn test_longer_cycle_detected() {
        let tree = tree_of(vec![
            entity_with_belongs_to("A", &["B"]),
            entity_with_belongs_to("B", &["C"]),
            entity_with_belongs_to("C", &["A"]),
        ]);
        let err = validate(&tree).unwrap_err();
        match err.kind {
            ErrorKind::Validation(ValidationError::CircularDependency { cycle }) => {
                assert_eq!(cycle.len(), 4);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected circular dependency, got {other:?}"),
        }
    }

    #[test]
    fn test_shared_target_is_not_a_cycle() {
        // Diamond: A -> B, A -> C, B -> D, C -> D.
        let tree = tree_of(vec![
            entity_with_belongs_to("A", &["B", "C"]),
            entity_with_belongs_to("B", &["D"]),
            entity_with_belongs_to("C", &["D"]),
            Entity::new("D"),
        ]);
        assert!(validate(&tree).is_ok());
    }

    #[test]
    fn test_dangling_reference_names_all_parties() {
        let tree = tree_of(vec![entity_with_belongs_to("Post", &["Ghost"])]);
        let err = validate(&tree).unwrap_err();
        match err.kind {
            ErrorKind::Validation(ValidationError::DanglingReference { owner, kind, target }) => {
                assert_eq!(owner, "Post");
                assert_eq!(kind, "belongsTo");
                assert_eq!(target, "Ghost");
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn test_cached_entity_satisfies_reference() {
        let mut tree = tree_of(vec![entity_with_belongs_to("Post", &["User"])]);
        let mut snapshot = indexmap::IndexMap::new();
        snapshot.insert("User".to_string(), Entity::new("User"));
        tree.seed_cache(snapshot);
        assert!(validate(&tree).is_ok());
    }
}
