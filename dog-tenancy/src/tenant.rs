//! Tenant context types for DogRS data isolation.

use serde::{Deserialize, Serialize};

/// A simple tenant identifier.
/// Later this can be a UUID, slug, or composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context carried with every data-access operation.
///
/// Created once per request/unit-of-work after authentication resolves the
/// active tenant, attached to the [`Session`](crate::Session), and discarded
/// with it. Never persisted.
///
/// `tenant` is required for any operation on a non-exempt table; `bypass`
/// marks a system/admin operation that may see across tenants when the
/// process configuration allows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant: Option<TenantId>,
    pub bypass: bool,
}

impl TenantContext {
    /// Context scoped to a single tenant.
    pub fn new<S: Into<String>>(tenant: S) -> Self {
        Self {
            tenant: Some(TenantId(tenant.into())),
            bypass: false,
        }
    }

    /// Context with no tenant attached. Only useful against exempt tables,
    /// or in permissive mode.
    pub fn detached() -> Self {
        Self {
            tenant: None,
            bypass: false,
        }
    }

    /// Cross-tenant system context. Subject to the `allow_bypass`
    /// configuration flag at enforcement time; this constructor performs no
    /// authorization check of its own.
    pub fn system() -> Self {
        Self {
            tenant: None,
            bypass: true,
        }
    }

    /// Mark this context as bypass-requested.
    pub fn with_bypass(mut self) -> Self {
        self.bypass = true;
        self
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant.as_ref().map(|t| t.as_str())
    }
}

impl Default for TenantContext {
    fn default() -> Self {
        Self::detached()
    }
}
