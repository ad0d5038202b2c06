//! Pure policy decisions for the enforcement interceptor.
//!
//! `decide` is a total function over the operation's facts; it performs no
//! I/O and never looks at the query itself. The interceptor is responsible
//! for gathering the facts (exemption, schema, context) and for acting on
//! the decision (injecting a filter, stamping the tenant column, aborting,
//! or logging).

use crate::config::EnforcementConfig;
use crate::tenant::TenantContext;

/// The four enforcement verbs. The service-level verbs map down:
/// find/get → `Read`, update/patch → `Update`, remove → `Delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Read,
    Create,
    Update,
    Delete,
}

/// What the interceptor must do before handing the operation to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the operation pass unmodified.
    Pass,
    /// Conjoin `tenant_column = <ctx tenant>` unless already present.
    ScopeToTenant,
    /// Stamp the tenant column on the entity being created.
    StampTenant,
    /// Permissive mode: allow the unscoped operation, logging a warning.
    WarnUnscoped,
    /// Abort with `TenantContextRequired` before storage is reached.
    RequireContext,
}

/// Facts about the target table and session the decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput<'a> {
    pub verb: Verb,
    /// Target table is on the exemption allow-list.
    pub exempt: bool,
    /// Target table schema carries a tenant column.
    pub has_tenant_column: bool,
    pub context: &'a TenantContext,
}

/// Render the enforcement decision for one operation.
pub fn decide(input: PolicyInput<'_>, config: &EnforcementConfig) -> Decision {
    // Exempt tables and tables with nothing to protect are never touched,
    // under any configuration.
    if input.exempt || !input.has_tenant_column {
        return Decision::Pass;
    }

    let has_tenant = input.context.tenant.is_some();

    match input.verb {
        // A row must be born with an owner. Bypass and permissive mode do
        // not apply here: ambiguity at create time is a hard failure.
        Verb::Create => {
            if has_tenant {
                Decision::StampTenant
            } else {
                Decision::RequireContext
            }
        }
        Verb::Read | Verb::Update | Verb::Delete => {
            if has_tenant {
                Decision::ScopeToTenant
            } else if input.context.bypass && config.allow_bypass {
                Decision::Pass
            } else if config.strict {
                Decision::RequireContext
            } else {
                Decision::WarnUnscoped
            }
        }
    }
}
