//! Table schema descriptors.
//!
//! The interceptor runs after the data-access layer has resolved the target
//! table; all it needs to know is the table name and which column (if any)
//! carries the owning tenant.

/// Default tenant column name.
pub const DEFAULT_TENANT_COLUMN: &str = "tenant_id";

/// Minimal schema view of a table as seen by the enforcement layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    /// `None` for tables with no tenant column (global/system tables);
    /// enforcement is a no-op for those.
    pub tenant_column: Option<String>,
}

impl TableSchema {
    /// Tenant-scoped table using the default `tenant_id` column.
    pub fn tenant_scoped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tenant_column: Some(DEFAULT_TENANT_COLUMN.to_string()),
        }
    }

    /// Tenant-scoped table with a non-standard tenant column.
    pub fn tenant_scoped_on(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tenant_column: Some(column.into()),
        }
    }

    /// Table with no tenant column at all (e.g. the tenant master table).
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tenant_column: None,
        }
    }
}
