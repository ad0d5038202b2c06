//! Storage backend abstraction.
//!
//! The [`Session`](crate::Session) runs every operation through the
//! enforcement interceptor and then hands the augmented query/payload to a
//! `TenancyBackend`. Backends execute statements verbatim; they perform no
//! tenant logic of their own.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::TenancyResult;
use crate::query::Query;
use crate::schema::TableSchema;

#[cfg(feature = "memory")]
pub mod memory;

/// Raw data-access operations over named tables.
#[async_trait]
pub trait TenancyBackend: Send + Sync {
    /// Resolve a table's schema, or `None` if the table is unknown.
    fn schema(&self, table: &str) -> Option<TableSchema>;

    /// Return all rows matching `query`.
    async fn select(&self, table: &str, query: &Query) -> TenancyResult<Vec<Value>>;

    /// Insert one row, returning it as stored.
    async fn insert(&self, table: &str, row: Value) -> TenancyResult<Value>;

    /// Apply `changes` to every row matching `query`. With `replace` the
    /// matched rows' non-protected fields are replaced wholesale; otherwise
    /// `changes` is merged field-by-field. Returns the rows after mutation.
    async fn update(
        &self,
        table: &str,
        query: &Query,
        changes: &Value,
        replace: bool,
    ) -> TenancyResult<Vec<Value>>;

    /// Delete every row matching `query`, returning the count removed.
    async fn delete(&self, table: &str, query: &Query) -> TenancyResult<u64>;
}
