//! Error types for the catalog crate.

use thiserror::Error;

/// Errors that can occur while loading or querying the entity catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// I/O error occurred while reading a catalog file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A catalog file couldn't be parsed as JSON
    #[error("Failed to parse {file}: {source}")]
    ParseError {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// Two entity names map to the same dense id
    #[error("Duplicate entity id {id}: '{first}' and '{second}'")]
    DuplicateId {
        id: u32,
        first: String,
        second: String,
    },

    /// An item id is not part of the entity id space
    #[error("Item id {id} is not present in the entity table")]
    UnknownItem { id: u32 },

    /// An entity id has no name in the inverse table
    #[error("Entity id {id} is missing from the name table")]
    MissingName { id: u32 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
