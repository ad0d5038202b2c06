//! In-memory backend for testing and development.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::backend::TenancyBackend;
use crate::errors::{TenancyError, TenancyResult};
use crate::query::{parse_raw_eq, Filter, Query};
use crate::schema::TableSchema;

struct TableData {
    schema: TableSchema,
    rows: Vec<Map<String, Value>>,
}

/// Tables of JSON object rows behind a `parking_lot` lock.
///
/// Executes structured filters directly. Raw fragments are supported only in
/// the simple `col = 'value'` form; anything else is rejected with
/// `UnsupportedFilter` rather than silently matching too much.
#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, TableData>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table. Tables must be defined before use; operations
    /// against undeclared tables fail with `UnknownTable`.
    pub fn define_table(&self, schema: TableSchema) {
        let name = schema.name.clone();
        self.tables
            .write()
            .insert(name, TableData { schema, rows: Vec::new() });
    }

    fn with_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut TableData) -> TenancyResult<T>,
    ) -> TenancyResult<T> {
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| TenancyError::UnknownTable(table.to_string()))?;
        f(data)
    }
}

#[async_trait]
impl TenancyBackend for MemoryBackend {
    fn schema(&self, table: &str) -> Option<TableSchema> {
        self.tables.read().get(table).map(|t| t.schema.clone())
    }

    async fn select(&self, table: &str, query: &Query) -> TenancyResult<Vec<Value>> {
        let tables = self.tables.read();
        let data = tables
            .get(table)
            .ok_or_else(|| TenancyError::UnknownTable(table.to_string()))?;

        let mut out = Vec::new();
        for row in &data.rows {
            if row_matches(query, row)? {
                out.push(Value::Object(row.clone()));
            }
        }
        Ok(out)
    }

    async fn insert(&self, table: &str, row: Value) -> TenancyResult<Value> {
        self.with_table(table, |data| {
            let mut object = match row {
                Value::Object(object) => object,
                other => {
                    return Err(TenancyError::InvalidPayload(format!(
                        "insert expects an object row, got {other}"
                    )))
                }
            };

            object
                .entry("id".to_string())
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));

            data.rows.push(object.clone());
            Ok(Value::Object(object))
        })
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        changes: &Value,
        replace: bool,
    ) -> TenancyResult<Vec<Value>> {
        let changes = changes.as_object().ok_or_else(|| {
            TenancyError::InvalidPayload("update expects an object of changes".to_string())
        })?;

        self.with_table(table, |data| {
            let protected: Vec<String> = std::iter::once("id".to_string())
                .chain(data.schema.tenant_column.clone())
                .collect();

            let mut updated = Vec::new();
            for row in data.rows.iter_mut() {
                if !row_matches(query, row)? {
                    continue;
                }

                if replace {
                    let mut next = changes.clone();
                    for key in &protected {
                        next.remove(key);
                        if let Some(kept) = row.get(key) {
                            next.insert(key.clone(), kept.clone());
                        }
                    }
                    *row = next;
                } else {
                    for (key, value) in changes {
                        if protected.contains(key) {
                            continue;
                        }
                        row.insert(key.clone(), value.clone());
                    }
                }
                updated.push(Value::Object(row.clone()));
            }
            Ok(updated)
        })
    }

    async fn delete(&self, table: &str, query: &Query) -> TenancyResult<u64> {
        self.with_table(table, |data| {
            // Evaluate first so an unsupported filter aborts before any row
            // is removed.
            let mut keep = Vec::with_capacity(data.rows.len());
            for row in &data.rows {
                keep.push(!row_matches(query, row)?);
            }

            let before = data.rows.len();
            let mut keep = keep.into_iter();
            data.rows.retain(|_| keep.next().unwrap_or(true));
            Ok((before - data.rows.len()) as u64)
        })
    }
}

fn row_matches(query: &Query, row: &Map<String, Value>) -> TenancyResult<bool> {
    match &query.filter {
        None => Ok(true),
        Some(filter) => filter_matches(filter, row),
    }
}

fn filter_matches(filter: &Filter, row: &Map<String, Value>) -> TenancyResult<bool> {
    match filter {
        Filter::Eq { column, value } => Ok(row.get(column) == Some(value)),
        Filter::And(parts) => {
            for part in parts {
                if !filter_matches(part, row)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Filter::Or(parts) => {
            for part in parts {
                if filter_matches(part, row)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Filter::Raw(fragment) => {
            let (column, value) = parse_raw_eq(fragment)
                .ok_or_else(|| TenancyError::UnsupportedFilter(fragment.clone()))?;
            Ok(row.get(&column).and_then(Value::as_str) == Some(value.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> MemoryBackend {
        let b = MemoryBackend::new();
        b.define_table(TableSchema::tenant_scoped("invoices"));
        b
    }

    #[tokio::test]
    async fn insert_assigns_id_when_missing() {
        let b = backend();
        let row = b
            .insert("invoices", json!({ "number": "INV-1" }))
            .await
            .unwrap();
        assert!(row["id"].as_str().is_some());
    }

    #[tokio::test]
    async fn select_honors_structured_and_raw_filters() {
        let b = backend();
        b.insert("invoices", json!({ "number": "INV-1", "tenant_id": "a" }))
            .await
            .unwrap();
        b.insert("invoices", json!({ "number": "INV-2", "tenant_id": "b" }))
            .await
            .unwrap();

        let structured = b
            .select("invoices", &Query::filtered(Filter::eq("tenant_id", "a")))
            .await
            .unwrap();
        assert_eq!(structured.len(), 1);

        let raw = b
            .select(
                "invoices",
                &Query::filtered(Filter::raw("tenant_id = 'b'")),
            )
            .await
            .unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0]["number"], json!("INV-2"));
    }

    #[tokio::test]
    async fn complex_raw_filters_are_rejected_not_ignored() {
        let b = backend();
        b.insert("invoices", json!({ "number": "INV-1" }))
            .await
            .unwrap();

        let err = b
            .select(
                "invoices",
                &Query::filtered(Filter::raw("tenant_id IN ('a','b')")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TenancyError::UnsupportedFilter(_)));
    }

    #[tokio::test]
    async fn merge_update_preserves_protected_columns() {
        let b = backend();
        let row = b
            .insert(
                "invoices",
                json!({ "number": "INV-1", "tenant_id": "a", "status": "open" }),
            )
            .await
            .unwrap();

        let updated = b
            .update(
                "invoices",
                &Query::filtered(Filter::eq("id", row["id"].clone())),
                &json!({ "status": "paid", "id": "forged", "tenant_id": "forged" }),
                false,
            )
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["status"], json!("paid"));
        assert_eq!(updated[0]["id"], row["id"]);
        assert_eq!(updated[0]["tenant_id"], json!("a"));
    }

    #[tokio::test]
    async fn replace_update_drops_unlisted_fields_but_keeps_protected() {
        let b = backend();
        let row = b
            .insert(
                "invoices",
                json!({ "number": "INV-1", "tenant_id": "a", "note": "old" }),
            )
            .await
            .unwrap();

        let updated = b
            .update(
                "invoices",
                &Query::filtered(Filter::eq("id", row["id"].clone())),
                &json!({ "number": "INV-1-r" }),
                true,
            )
            .await
            .unwrap();

        assert_eq!(updated[0]["number"], json!("INV-1-r"));
        assert_eq!(updated[0].get("note"), None);
        assert_eq!(updated[0]["tenant_id"], json!("a"));
        assert_eq!(updated[0]["id"], row["id"]);
    }

    #[tokio::test]
    async fn delete_returns_affected_count() {
        let b = backend();
        for tenant in ["a", "a", "b"] {
            b.insert("invoices", json!({ "tenant_id": tenant }))
                .await
                .unwrap();
        }

        let removed = b
            .delete("invoices", &Query::filtered(Filter::eq("tenant_id", "a")))
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let rest = b.select("invoices", &Query::all()).await.unwrap();
        assert_eq!(rest.len(), 1);
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let b = backend();
        let err = b.select("nope", &Query::all()).await.unwrap_err();
        assert_eq!(err, TenancyError::UnknownTable("nope".into()));
    }
}
