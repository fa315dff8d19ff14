//! Core types for the entity catalog.
//!
//! The catalog is the read-only table of everything the recommender can
//! talk about: catalog items (movies) and knowledge-graph concepts
//! (actors, genres, ...). Each entity has a stable string key and a dense
//! integer id assigned by the dataset; the id space is fixed for the
//! lifetime of the process.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{CatalogError, Result};

// =============================================================================
// Type Aliases
// =============================================================================

/// Dense integer id of an entity, as assigned by the dataset tables.
/// Also the index of the entity in the classifier label space.
pub type EntityId = u32;

// =============================================================================
// EntityCatalog - The In-Memory Entity Tables
// =============================================================================

/// Bidirectional entity tables plus the item subset.
///
/// Holds `entity -> id`, the derived inverse `id -> entity`, and the subset
/// of ids that are recommendable catalog items (as opposed to concepts that
/// only appear in the knowledge graph). Built once at startup and read-only
/// afterwards; share it with `Arc` across components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCatalog {
    pub(crate) entity2id: HashMap<String, EntityId>,
    pub(crate) id2entity: HashMap<EntityId, String>,
    pub(crate) item_ids: Vec<EntityId>,
    pub(crate) item_id_set: HashSet<EntityId>,
    /// Width of the classifier label space (max id + 1).
    pub(crate) num_entities: usize,
}

impl EntityCatalog {
    /// Creates an empty catalog. Use `insert_entity`/`register_item` to
    /// populate it (mostly useful in tests; production catalogs come from
    /// `EntityCatalog::load_from_dir`).
    pub fn new() -> Self {
        Self {
            entity2id: HashMap::new(),
            id2entity: HashMap::new(),
            item_ids: Vec::new(),
            item_id_set: HashSet::new(),
            num_entities: 0,
        }
    }

    /// Build a catalog from an `entity -> id` table and the item id subset.
    ///
    /// The inverse table is derived here by inversion, never loaded
    /// separately, so the two can't drift apart.
    ///
    /// # Errors
    /// - `DuplicateId` if two names share an id
    /// - `UnknownItem` if an item id is outside the entity table
    pub fn from_tables(
        entity2id: HashMap<String, EntityId>,
        item_ids: Vec<EntityId>,
    ) -> Result<Self> {
        let mut id2entity: HashMap<EntityId, String> = HashMap::with_capacity(entity2id.len());
        for (name, &id) in &entity2id {
            if let Some(existing) = id2entity.insert(id, name.clone()) {
                return Err(CatalogError::DuplicateId {
                    id,
                    first: existing,
                    second: name.clone(),
                });
            }
        }

        for &id in &item_ids {
            if !id2entity.contains_key(&id) {
                return Err(CatalogError::UnknownItem { id });
            }
        }

        let num_entities = id2entity.keys().max().map(|&id| id as usize + 1).unwrap_or(0);
        let item_id_set = item_ids.iter().copied().collect();

        Ok(Self {
            entity2id,
            id2entity,
            item_ids,
            item_id_set,
            num_entities,
        })
    }

    // Getters - the catalog is read-only after construction, so everything
    // below borrows.

    /// Look up the dense id of an entity key.
    pub fn id_of(&self, entity: &str) -> Option<EntityId> {
        self.entity2id.get(entity).copied()
    }

    /// Look up the human-readable name of an entity id.
    pub fn name_of(&self, id: EntityId) -> Option<&str> {
        self.id2entity.get(&id).map(|s| s.as_str())
    }

    /// Like `name_of`, but a missing id is an error. Used when rendering
    /// recommendations, where the item universe and the name table are
    /// expected to be consistent by construction.
    pub fn require_name(&self, id: EntityId) -> Result<&str> {
        self.name_of(id).ok_or(CatalogError::MissingName { id })
    }

    /// Resolve entity keys to ids, silently dropping keys that are not in
    /// the catalog. Order and duplicates are preserved.
    pub fn resolve_ids(&self, entities: &[String]) -> Vec<EntityId> {
        entities
            .iter()
            .filter_map(|ent| self.id_of(ent))
            .collect()
    }

    /// The recommendable subset of the entity id space, in table order.
    pub fn item_ids(&self) -> &[EntityId] {
        &self.item_ids
    }

    pub fn is_item(&self, id: EntityId) -> bool {
        self.item_id_set.contains(&id)
    }

    /// Width of the classifier label space (max id + 1, not the entity
    /// count: id spaces may have holes).
    pub fn num_entities(&self) -> usize {
        self.num_entities
    }

    /// Number of distinct entities in the table.
    pub fn len(&self) -> usize {
        self.entity2id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity2id.is_empty()
    }

    /// All entity surface forms, for the extractor's vocabulary.
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        self.entity2id.keys().map(|s| s.as_str())
    }

    // Mutators - used by tests and by the loader while building.

    /// Insert an entity into both tables.
    pub fn insert_entity(&mut self, name: impl Into<String>, id: EntityId) {
        let name = name.into();
        self.entity2id.insert(name.clone(), id);
        self.id2entity.insert(id, name);
        self.num_entities = self.num_entities.max(id as usize + 1);
    }

    /// Mark an already-inserted entity as a recommendable item.
    pub fn register_item(&mut self, id: EntityId) {
        if self.item_id_set.insert(id) {
            self.item_ids.push(id);
        }
    }
}

impl Default for EntityCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tables() -> HashMap<String, EntityId> {
        let mut entity2id = HashMap::new();
        entity2id.insert("The Matrix".to_string(), 0);
        entity2id.insert("Titanic".to_string(), 1);
        entity2id.insert("action".to_string(), 2);
        entity2id
    }

    #[test]
    fn test_from_tables_builds_inverse() {
        let catalog = EntityCatalog::from_tables(sample_tables(), vec![0, 1]).unwrap();

        assert_eq!(catalog.id_of("The Matrix"), Some(0));
        assert_eq!(catalog.name_of(1), Some("Titanic"));
        assert_eq!(catalog.num_entities(), 3);
        assert_eq!(catalog.item_ids(), &[0, 1]);
        assert!(catalog.is_item(1));
        assert!(!catalog.is_item(2));
    }

    #[test]
    fn test_unknown_item_rejected() {
        let err = EntityCatalog::from_tables(sample_tables(), vec![0, 99]).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownItem { id: 99 }));
    }

    #[test]
    fn test_resolve_ids_drops_unknown() {
        let catalog = EntityCatalog::from_tables(sample_tables(), vec![0, 1]).unwrap();

        let entities = vec![
            "Titanic".to_string(),
            "Not In Catalog".to_string(),
            "action".to_string(),
            "Titanic".to_string(),
        ];
        // Unknown keys vanish; order and duplicates survive.
        assert_eq!(catalog.resolve_ids(&entities), vec![1, 2, 1]);
    }

    #[test]
    fn test_require_name_missing_is_error() {
        let catalog = EntityCatalog::from_tables(sample_tables(), vec![0]).unwrap();
        assert!(matches!(
            catalog.require_name(42),
            Err(CatalogError::MissingName { id: 42 })
        ));
    }

    #[test]
    fn test_num_entities_covers_id_holes() {
        let mut entity2id = HashMap::new();
        entity2id.insert("a".to_string(), 0);
        entity2id.insert("b".to_string(), 7);
        let catalog = EntityCatalog::from_tables(entity2id, vec![]).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.num_entities(), 8);
    }
}
