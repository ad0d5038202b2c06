//! Exemption registry: the explicit allow-list of cross-tenant tables.
//!
//! Two kinds of table legitimately live here:
//! - cross-tenant-by-design mapping tables keyed by user, not tenant
//!   (tenant memberships, refresh tokens, login/verification records);
//! - system tables with no tenant column at all (the tenant master table,
//!   the global user table).
//!
//! Adding an entry is a security-sensitive change that needs explicit
//! justification in review. It is not a workaround for a missing context.

use std::collections::HashSet;

/// Immutable allow-list of exempt table names.
///
/// Built once at process start; there is deliberately no way to register a
/// table after construction.
#[derive(Debug, Clone, Default)]
pub struct ExemptionRegistry {
    tables: HashSet<String>,
}

impl ExemptionRegistry {
    /// Registry with no exemptions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry from the fixed exemption list.
    pub fn from_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    /// O(1) lookup.
    pub fn is_exempt(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
