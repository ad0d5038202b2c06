//! Enforcement interceptor.
//!
//! Four verb-specific hooks, each invoked by the data-access layer
//! immediately before a query or mutation is executed, after the target
//! table and schema are resolved. Each hook gathers the facts, asks the
//! policy engine for a decision, and applies it: augment the operation,
//! abort it, or let it pass.
//!
//! Both abort kinds are raised before the backend sees the statement, so a
//! rejected operation has no partial side effects.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EnforcementConfig;
use crate::detect::has_tenant_filter;
use crate::errors::{TenancyError, TenancyResult};
use crate::policy::{decide, Decision, PolicyInput, Verb};
use crate::query::{Filter, Query};
use crate::registry::ExemptionRegistry;
use crate::schema::TableSchema;
use crate::tenant::TenantContext;

/// Stateless interceptor over an immutable configuration snapshot and the
/// exemption allow-list. Shared via `Arc`; no locking required.
#[derive(Debug, Clone)]
pub struct Enforcer {
    config: EnforcementConfig,
    registry: ExemptionRegistry,
}

impl Enforcer {
    pub fn new(config: EnforcementConfig, registry: ExemptionRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &EnforcementConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExemptionRegistry {
        &self.registry
    }

    /// Read hook: scope `query` to the context's tenant unless the caller
    /// already did, or abort/warn per configuration.
    pub fn before_read(
        &self,
        schema: &TableSchema,
        ctx: &TenantContext,
        query: &mut Query,
    ) -> TenancyResult<()> {
        self.apply_scope(Verb::Read, schema, ctx, query)
    }

    /// Create hook: stamp the tenant column on `data` from the context,
    /// overwriting any caller-supplied value. Creation without a tenant is
    /// refused under every configuration.
    pub fn before_create(
        &self,
        schema: &TableSchema,
        ctx: &TenantContext,
        data: &mut Value,
    ) -> TenancyResult<()> {
        match self.decision(Verb::Create, schema, ctx) {
            Decision::Pass => Ok(()),
            Decision::RequireContext => Err(TenancyError::context_required(&schema.name)),
            Decision::StampTenant => {
                let column = schema
                    .tenant_column
                    .as_deref()
                    .expect("StampTenant implies a tenant column");
                let tenant = ctx
                    .tenant_id()
                    .expect("StampTenant implies an attached tenant");

                let object = data.as_object_mut().ok_or_else(|| {
                    TenancyError::InvalidPayload(format!(
                        "create on '{}' requires an object payload",
                        schema.name
                    ))
                })?;

                if object
                    .get(column)
                    .is_some_and(|v| v.as_str() != Some(tenant))
                {
                    // Caller-supplied ownership is never trusted.
                    debug!(
                        table = %schema.name,
                        "overwriting caller-supplied tenant column on create"
                    );
                }
                object.insert(column.to_string(), Value::String(tenant.to_string()));
                Ok(())
            }
            // Creates never scope or warn.
            Decision::ScopeToTenant | Decision::WarnUnscoped => unreachable!(),
        }
    }

    /// Update hook: refuse any attempt to change the tenant column, then
    /// scope the mutation exactly like a read. An injected filter matching
    /// zero rows is the caller's zero-rows-affected result, not an error.
    pub fn before_update(
        &self,
        schema: &TableSchema,
        ctx: &TenantContext,
        changes: &Value,
        query: &mut Query,
    ) -> TenancyResult<()> {
        if !self.registry.is_exempt(&schema.name) {
            if let Some(column) = schema.tenant_column.as_deref() {
                // Immutability check runs first, independent of context
                // state: the tenant column is set once at create and never
                // changes.
                if changes
                    .as_object()
                    .is_some_and(|object| object.contains_key(column))
                {
                    return Err(TenancyError::forbidden_field(&schema.name, column));
                }
            }
        }

        self.apply_scope(Verb::Update, schema, ctx, query)
    }

    /// Delete hook: same scope branch as update; deleted rows carry no
    /// immutability concern.
    pub fn before_delete(
        &self,
        schema: &TableSchema,
        ctx: &TenantContext,
        query: &mut Query,
    ) -> TenancyResult<()> {
        self.apply_scope(Verb::Delete, schema, ctx, query)
    }

    fn decision(&self, verb: Verb, schema: &TableSchema, ctx: &TenantContext) -> Decision {
        decide(
            PolicyInput {
                verb,
                exempt: self.registry.is_exempt(&schema.name),
                has_tenant_column: schema.tenant_column.is_some(),
                context: ctx,
            },
            &self.config,
        )
    }

    fn apply_scope(
        &self,
        verb: Verb,
        schema: &TableSchema,
        ctx: &TenantContext,
        query: &mut Query,
    ) -> TenancyResult<()> {
        match self.decision(verb, schema, ctx) {
            Decision::Pass => Ok(()),
            Decision::RequireContext => Err(TenancyError::context_required(&schema.name)),
            Decision::WarnUnscoped => {
                if self.config.warn_on_unscoped {
                    warn!(
                        table = %schema.name,
                        verb = ?verb,
                        "unscoped operation allowed without tenant context (permissive mode)"
                    );
                }
                Ok(())
            }
            Decision::ScopeToTenant => {
                let column = schema
                    .tenant_column
                    .as_deref()
                    .expect("ScopeToTenant implies a tenant column");
                let tenant = ctx
                    .tenant_id()
                    .expect("ScopeToTenant implies an attached tenant");

                if has_tenant_filter(query, column) {
                    debug!(table = %schema.name, "tenant filter already present, skipping injection");
                } else {
                    query.and_with(Filter::eq(column, tenant));
                    debug!(table = %schema.name, verb = ?verb, "injected tenant filter");
                }
                Ok(())
            }
            Decision::StampTenant => unreachable!("StampTenant is a create-only decision"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enforcer(config: EnforcementConfig) -> Enforcer {
        Enforcer::new(config, ExemptionRegistry::from_tables(["tenants", "users"]))
    }

    fn invoices() -> TableSchema {
        TableSchema::tenant_scoped("invoices")
    }

    #[test]
    fn read_injects_filter_for_attached_context() {
        let e = enforcer(EnforcementConfig::new());
        let mut q = Query::all();
        e.before_read(&invoices(), &TenantContext::new("acme"), &mut q)
            .unwrap();
        assert_eq!(q.filter, Some(Filter::eq("tenant_id", "acme")));
    }

    #[test]
    fn read_skips_injection_when_caller_already_scoped() {
        let e = enforcer(EnforcementConfig::new());
        let mut q = Query::filtered(Filter::eq("tenant_id", "acme"));
        let before = q.clone();
        e.before_read(&invoices(), &TenantContext::new("acme"), &mut q)
            .unwrap();
        assert_eq!(q, before);
    }

    #[test]
    fn read_conjoins_filter_with_existing_predicates() {
        let e = enforcer(EnforcementConfig::new());
        let mut q = Query::filtered(Filter::eq("status", "open"));
        e.before_read(&invoices(), &TenantContext::new("acme"), &mut q)
            .unwrap();
        assert_eq!(
            q.filter,
            Some(Filter::And(vec![
                Filter::eq("status", "open"),
                Filter::eq("tenant_id", "acme"),
            ]))
        );
    }

    #[test]
    fn read_without_context_aborts_in_strict_mode() {
        let e = enforcer(EnforcementConfig::new());
        let mut q = Query::all();
        let err = e
            .before_read(&invoices(), &TenantContext::detached(), &mut q)
            .unwrap_err();
        assert_eq!(
            err,
            TenancyError::TenantContextRequired {
                table: "invoices".into()
            }
        );
    }

    #[test]
    fn read_without_context_passes_unscoped_in_permissive_mode() {
        let e = enforcer(EnforcementConfig::permissive());
        let mut q = Query::all();
        e.before_read(&invoices(), &TenantContext::detached(), &mut q)
            .unwrap();
        assert_eq!(q, Query::all());
    }

    #[test]
    fn exempt_table_reads_are_untouched() {
        let e = enforcer(EnforcementConfig::new());
        let mut q = Query::all();
        e.before_read(
            &TableSchema::tenant_scoped("users"),
            &TenantContext::new("acme"),
            &mut q,
        )
        .unwrap();
        assert_eq!(q, Query::all());
    }

    #[test]
    fn create_stamps_tenant_column() {
        let e = enforcer(EnforcementConfig::new());
        let mut data = json!({ "number": "INV-1" });
        e.before_create(&invoices(), &TenantContext::new("acme"), &mut data)
            .unwrap();
        assert_eq!(data["tenant_id"], json!("acme"));
    }

    #[test]
    fn create_overwrites_forged_tenant_column() {
        let e = enforcer(EnforcementConfig::new());
        let mut data = json!({ "number": "INV-1", "tenant_id": "somebody-else" });
        e.before_create(&invoices(), &TenantContext::new("acme"), &mut data)
            .unwrap();
        assert_eq!(data["tenant_id"], json!("acme"));
    }

    #[test]
    fn create_without_context_always_aborts() {
        for cfg in [
            EnforcementConfig::new(),
            EnforcementConfig::permissive().with_allow_bypass(true),
        ] {
            let e = enforcer(cfg);
            let mut data = json!({ "number": "INV-1" });
            let err = e
                .before_create(&invoices(), &TenantContext::system(), &mut data)
                .unwrap_err();
            assert!(matches!(err, TenancyError::TenantContextRequired { .. }));
        }
    }

    #[test]
    fn create_rejects_non_object_payload() {
        let e = enforcer(EnforcementConfig::new());
        let mut data = json!(["not", "an", "object"]);
        let err = e
            .before_create(&invoices(), &TenantContext::new("acme"), &mut data)
            .unwrap_err();
        assert!(matches!(err, TenancyError::InvalidPayload(_)));
    }

    #[test]
    fn update_refuses_tenant_column_mutation() {
        let e = enforcer(EnforcementConfig::new());
        let mut q = Query::all();
        let err = e
            .before_update(
                &invoices(),
                &TenantContext::new("acme"),
                &json!({ "tenant_id": "other" }),
                &mut q,
            )
            .unwrap_err();
        assert_eq!(
            err,
            TenancyError::ForbiddenFieldMutation {
                table: "invoices".into(),
                column: "tenant_id".into()
            }
        );
    }

    #[test]
    fn update_immutability_check_precedes_context_check() {
        // Even a context-less update is rejected for the field mutation,
        // not for the missing context.
        let e = enforcer(EnforcementConfig::new());
        let mut q = Query::all();
        let err = e
            .before_update(
                &invoices(),
                &TenantContext::detached(),
                &json!({ "tenant_id": "other" }),
                &mut q,
            )
            .unwrap_err();
        assert!(matches!(err, TenancyError::ForbiddenFieldMutation { .. }));
    }

    #[test]
    fn update_scopes_like_a_read() {
        let e = enforcer(EnforcementConfig::new());
        let mut q = Query::filtered(Filter::eq("id", "inv-1"));
        e.before_update(
            &invoices(),
            &TenantContext::new("acme"),
            &json!({ "status": "paid" }),
            &mut q,
        )
        .unwrap();
        assert!(has_tenant_filter(&q, "tenant_id"));
    }

    #[test]
    fn delete_with_allowed_bypass_passes_unscoped() {
        let e = enforcer(EnforcementConfig::new().with_allow_bypass(true));
        let mut q = Query::all();
        e.before_delete(&invoices(), &TenantContext::system(), &mut q)
            .unwrap();
        assert_eq!(q, Query::all());
    }

    #[test]
    fn delete_with_disallowed_bypass_aborts_in_strict_mode() {
        let e = enforcer(EnforcementConfig::new());
        let mut q = Query::all();
        let err = e
            .before_delete(&invoices(), &TenantContext::system(), &mut q)
            .unwrap_err();
        assert!(matches!(err, TenancyError::TenantContextRequired { .. }));
    }

    #[test]
    fn global_table_without_tenant_column_is_untouched() {
        let e = enforcer(EnforcementConfig::new());
        let schema = TableSchema::global("schema_migrations");
        let mut q = Query::all();
        e.before_read(&schema, &TenantContext::detached(), &mut q)
            .unwrap();
        assert_eq!(q, Query::all());

        let mut data = json!({ "version": 42 });
        e.before_create(&schema, &TenantContext::detached(), &mut data)
            .unwrap();
        assert_eq!(data, json!({ "version": 42 }));
    }

    #[test]
    fn custom_tenant_column_is_used_for_injection_and_immutability() {
        let e = enforcer(EnforcementConfig::new());
        let schema = TableSchema::tenant_scoped_on("projects", "org_id");

        let mut q = Query::all();
        e.before_read(&schema, &TenantContext::new("acme"), &mut q)
            .unwrap();
        assert_eq!(q.filter, Some(Filter::eq("org_id", "acme")));

        let err = e
            .before_update(
                &schema,
                &TenantContext::new("acme"),
                &json!({ "org_id": "other" }),
                &mut Query::all(),
            )
            .unwrap_err();
        assert!(matches!(err, TenancyError::ForbiddenFieldMutation { .. }));
    }
}
