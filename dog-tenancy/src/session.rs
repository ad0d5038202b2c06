//! Tenant-aware session: the single data-access entry point.
//!
//! A `Session` is the unit of work. The tenant context is part of the
//! session object itself, so every statement issued through it — including
//! statements inside a [`Transaction`] — carries the same context without
//! being re-specified. There is no way to issue a statement through this
//! layer without a session, which is what makes losing the context across a
//! transaction boundary impossible by construction.

use std::sync::Arc;

use serde_json::Value;

use crate::backend::TenancyBackend;
use crate::enforce::Enforcer;
use crate::errors::{TenancyError, TenancyResult};
use crate::query::{Filter, Query};
use crate::schema::TableSchema;
use crate::tenant::TenantContext;

/// A context-bearing handle over a backend and an enforcer.
///
/// Cheap to clone; each request builds its own via [`Session::attach`], so
/// no context is ever shared between concurrent callers.
#[derive(Clone)]
pub struct Session {
    backend: Arc<dyn TenancyBackend>,
    enforcer: Arc<Enforcer>,
    context: TenantContext,
}

impl Session {
    /// New session with no tenant attached.
    pub fn new(backend: Arc<dyn TenancyBackend>, enforcer: Arc<Enforcer>) -> Self {
        Self {
            backend,
            enforcer,
            context: TenantContext::detached(),
        }
    }

    /// Session scoped to `tenant`. Additive: backend and enforcer are
    /// shared, only the context differs.
    pub fn attach<S: Into<String>>(&self, tenant: S) -> Self {
        Self {
            context: TenantContext::new(tenant),
            ..self.clone()
        }
    }

    /// Session with the bypass marker set. Whether bypass is honored is
    /// decided by the enforcer's `allow_bypass` flag, not here; upstream
    /// authorization must already have vetted the caller.
    pub fn with_bypass(&self) -> Self {
        Self {
            context: self.context.clone().with_bypass(),
            ..self.clone()
        }
    }

    pub fn context(&self) -> &TenantContext {
        &self.context
    }

    /// Group statements under this session's context. Atomicity is the
    /// backend's concern; what the transaction guarantees is that every
    /// statement inside it inherits the session context.
    pub fn transaction(&self) -> Transaction<'_> {
        Transaction { session: self }
    }

    fn schema(&self, table: &str) -> TenancyResult<TableSchema> {
        self.backend
            .schema(table)
            .ok_or_else(|| TenancyError::UnknownTable(table.to_string()))
    }

    /// Find all rows matching `query`, scoped to the session tenant.
    pub async fn find(&self, table: &str, mut query: Query) -> TenancyResult<Vec<Value>> {
        let schema = self.schema(table)?;
        self.enforcer
            .before_read(&schema, &self.context, &mut query)?;
        self.backend.select(table, &query).await
    }

    /// Fetch one row by id. `Ok(None)` covers both "does not exist" and
    /// "exists under another tenant" — callers cannot distinguish them.
    pub async fn get(&self, table: &str, id: &str) -> TenancyResult<Option<Value>> {
        let mut query = Query::filtered(Filter::eq("id", id));
        let schema = self.schema(table)?;
        self.enforcer
            .before_read(&schema, &self.context, &mut query)?;
        let mut rows = self.backend.select(table, &query).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Create a row. On non-exempt tables the tenant column is stamped from
    /// the session context; caller-supplied values for it are discarded.
    pub async fn create(&self, table: &str, mut data: Value) -> TenancyResult<Value> {
        let schema = self.schema(table)?;
        self.enforcer
            .before_create(&schema, &self.context, &mut data)?;
        self.backend.insert(table, data).await
    }

    /// Replace the row with the given id. `Ok(None)` means the isolation
    /// filter narrowed the update to zero rows — the expected outcome of a
    /// cross-tenant tampering attempt, not an error.
    pub async fn update(
        &self,
        table: &str,
        id: &str,
        data: Value,
    ) -> TenancyResult<Option<Value>> {
        self.mutate(table, id, data, true).await
    }

    /// Merge fields into the row with the given id. Same zero-rows
    /// semantics as [`Session::update`].
    pub async fn patch(&self, table: &str, id: &str, data: Value) -> TenancyResult<Option<Value>> {
        self.mutate(table, id, data, false).await
    }

    /// Delete rows matching `query` within the session tenant's scope.
    /// Returns the number of rows removed; a cross-tenant attempt removes 0.
    pub async fn remove(&self, table: &str, mut query: Query) -> TenancyResult<u64> {
        let schema = self.schema(table)?;
        self.enforcer
            .before_delete(&schema, &self.context, &mut query)?;
        self.backend.delete(table, &query).await
    }

    /// Delete one row by id.
    pub async fn remove_by_id(&self, table: &str, id: &str) -> TenancyResult<u64> {
        self.remove(table, Query::filtered(Filter::eq("id", id))).await
    }

    async fn mutate(
        &self,
        table: &str,
        id: &str,
        data: Value,
        replace: bool,
    ) -> TenancyResult<Option<Value>> {
        let mut query = Query::filtered(Filter::eq("id", id));
        let schema = self.schema(table)?;
        self.enforcer
            .before_update(&schema, &self.context, &data, &mut query)?;
        let mut rows = self.backend.update(table, &query, &data, replace).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }
}

/// Statements grouped under one session context.
///
/// Holds a borrow of the session rather than a copy of the context, so a
/// transaction cannot outlive or diverge from the unit of work it belongs
/// to.
pub struct Transaction<'a> {
    session: &'a Session,
}

impl<'a> Transaction<'a> {
    pub fn context(&self) -> &TenantContext {
        self.session.context()
    }

    pub async fn find(&self, table: &str, query: Query) -> TenancyResult<Vec<Value>> {
        self.session.find(table, query).await
    }

    pub async fn get(&self, table: &str, id: &str) -> TenancyResult<Option<Value>> {
        self.session.get(table, id).await
    }

    pub async fn create(&self, table: &str, data: Value) -> TenancyResult<Value> {
        self.session.create(table, data).await
    }

    pub async fn update(
        &self,
        table: &str,
        id: &str,
        data: Value,
    ) -> TenancyResult<Option<Value>> {
        self.session.update(table, id, data).await
    }

    pub async fn patch(&self, table: &str, id: &str, data: Value) -> TenancyResult<Option<Value>> {
        self.session.patch(table, id, data).await
    }

    pub async fn remove(&self, table: &str, query: Query) -> TenancyResult<u64> {
        self.session.remove(table, query).await
    }

    pub async fn remove_by_id(&self, table: &str, id: &str) -> TenancyResult<u64> {
        self.session.remove_by_id(table, id).await
    }
}
