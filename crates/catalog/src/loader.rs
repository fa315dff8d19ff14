//! Loading the entity tables from a dataset directory.
//!
//! A dataset directory contains two JSON files:
//! - `entity2id.json`: map from entity surface form to dense integer id
//! - `item_ids.json`: array of ids that are recommendable items
//!
//! Both are loaded once at startup; the inverse `id -> entity` table is
//! derived by inversion rather than read from disk.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{CatalogError, Result};
use crate::types::{EntityCatalog, EntityId};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CatalogError::ParseError {
        file: path.display().to_string(),
        source,
    })
}

impl EntityCatalog {
    /// Load the catalog from a dataset directory.
    ///
    /// # Arguments
    /// * `data_dir` - Directory holding `entity2id.json` and `item_ids.json`
    ///
    /// # Returns
    /// A validated catalog with the inverse table and item subset built.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let entity2id_path = data_dir.join("entity2id.json");
        let item_ids_path = data_dir.join("item_ids.json");

        // The two tables are independent files; read them in parallel.
        let (entity2id, item_ids) = rayon::join(
            || read_json::<HashMap<String, EntityId>>(&entity2id_path),
            || read_json::<Vec<EntityId>>(&item_ids_path),
        );
        let entity2id = entity2id?;
        let item_ids = item_ids?;

        let catalog = EntityCatalog::from_tables(entity2id, item_ids)?;
        info!(
            "Loaded entity catalog: {} entities, {} items, label space {}",
            catalog.len(),
            catalog.item_ids().len(),
            catalog.num_entities()
        );
        Ok(catalog)
    }
}
