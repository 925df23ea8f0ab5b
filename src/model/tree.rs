//! Model registry
//!
//! The read-only container handed to the validator and every emitter: all
//! analyzed entities and action entities for this run, auxiliary category
//! lists, and the entities carried over from the previous run's manifest.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{ActionEntity, Entity};
use crate::error::{BlueprintResult, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tree {
    entities: IndexMap<String, Entity>,
    action_entities: IndexMap<String, ActionEntity>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    auxiliary: IndexMap<String, Vec<String>>,
    /// Entities known from the previous run but not redefined in this input
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    cached: IndexMap<String, Entity>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_entity(&mut self, entity: Entity) -> BlueprintResult<()> {
        if self.entities.contains_key(&entity.name) {
            return Err(ValidationError::DuplicateName {
                category: "entity".to_string(),
                name: entity.name.clone(),
            }
            .into());
        }
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    pub fn insert_action_entity(&mut self, action: ActionEntity) -> BlueprintResult<()> {
        if self.action_entities.contains_key(&action.name) {
            return Err(ValidationError::DuplicateName {
                category: "action entity".to_string(),
                name: action.name.clone(),
            }
            .into());
        }
        self.action_entities.insert(action.name.clone(), action);
        Ok(())
    }

    /// Seed the cache from a previous run's snapshot. Entities redefined in
    /// the current input win over their cached counterpart.
    pub fn seed_cache(&mut self, snapshot: IndexMap<String, Entity>) {
        for (name, entity) in snapshot {
            if !self.entities.contains_key(&name) {
                self.cached.insert(name, entity);
            }
        }
    }

    pub fn add_auxiliary(&mut self, category: &str, item: String) {
        let list = self.auxiliary.entry(category.to_string()).or_default();
        if !list.contains(&item) {
            list.push(item);
        }
    }

    pub fn entities(&self) -> &IndexMap<String, Entity> {
        &self.entities
    }

    pub fn action_entities(&self) -> &IndexMap<String, ActionEntity> {
        &self.action_entities
    }

    pub fn auxiliary(&self, category: &str) -> &[String] {
        self.auxiliary
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn cached_entities(&self) -> &IndexMap<String, Entity> {
        &self.cached
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Lookup across current and cached entities
    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name).or_else(|| self.cached.get(name))
    }

    /// True when the name resolves to a current or cached entity
    pub fn knows_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name) || self.cached.contains_key(name)
    }

    /// Current entities plus carried-over cache, for the manifest snapshot
    pub fn snapshot(&self) -> IndexMap<String, Entity> {
        let mut all = self.entities.clone();
        for (name, entity) in &self.cached {
            all.entry(name.clone()).or_insert_with(|| entity.clone());
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_entity_rejected() {
        let mut tree = Tree::new();
        tree.insert_entity(Entity::new("Post")).unwrap();
        let err = tree.insert_entity(Entity::new("Post")).unwrap_err();
        assert!(err.to_string().contains("duplicate entity name 'Post'"));
    }

    #[test]
    fn test_cache_does_not_shadow_current() {
        let mut tree = Tree::new();
        let mut current = Entity::new("User");
        current.uses_timestamps = false;
        tree.insert_entity(current).unwrap();

        let mut snapshot = IndexMap::new();
        snapshot.insert("User".to_string(), Entity::new("User"));
        snapshot.insert("Team".to_string(), Entity::new("Team"));
        tree.seed_cache(snapshot);

        assert!(!tree.entity("User").unwrap().uses_timestamps);
        assert!(tree.knows_entity("Team"));
        assert!(tree.entity("Team").is_none());
        assert!(tree.find_entity("Team").is_some());
    }

    #[test]
    fn test_snapshot_merges_cache() {
        let mut tree = Tree::new();
        tree.insert_entity(Entity::new("Post")).unwrap();
        let mut snapshot = IndexMap::new();
        snapshot.insert("User".to_string(), Entity::new("User"));
        tree.seed_cache(snapshot);

        let all = tree.snapshot();
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("Post") && all.contains_key("User"));
    }

    #[test]
    fn test_auxiliary_deduplicates() {
        let mut tree = Tree::new();
        tree.add_auxiliary("pivots", "post_tag".to_string());
        tree.add_auxiliary("pivots", "post_tag".to_string());
        assert_eq!(tree.auxiliary("pivots"), ["post_tag".to_string()]);
    }
}
