//! Storage layer for published rows.
//!
//! The table itself belongs to the host application. `RowStore` is the seam it
//! implements; `MemRowStore` keeps rows in memory for tests and embedding.

mod mem;

use std::error::Error;

use crate::{
    FlowError, Result,
    row::{FlowRow, RowKey},
};

pub use mem::MemRowStore;

/// Maps backend errors to FlowError.
pub fn map_store_err(err: impl Error) -> FlowError {
    FlowError::Store(err.to_string())
}

/// Persistence of flat flow rows.
pub trait RowStore: Send + Sync {
    /// Checks if a row exists for the key.
    fn exists(
        &self,
        key: &RowKey,
    ) -> Result<bool>;

    /// Finds a row by key.
    fn find(
        &self,
        key: &RowKey,
    ) -> Result<Option<FlowRow>>;

    /// Lists the rows of one group, ordered by flow name.
    fn list(
        &self,
        group: &str,
    ) -> Result<Vec<FlowRow>>;

    /// Writes the full row, replacing any previous one. Returns `true` when a row was replaced.
    fn upsert(
        &self,
        row: &FlowRow,
    ) -> Result<bool>;

    /// Deletes a row. Returns `false` when there was none.
    fn delete(
        &self,
        key: &RowKey,
    ) -> Result<bool>;
}
