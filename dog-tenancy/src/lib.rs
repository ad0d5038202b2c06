//! dog-tenancy: multi-tenant data-isolation enforcement for DogRS.
//!
//! A second, independent line of defense beneath handler-level tenant
//! checks: every operation issued through a [`Session`] is intercepted
//! before execution and scoped to the tenant attached to that session, even
//! when calling code forgets to filter explicitly.
//!
//! The layer does not authenticate, does not authorize, and does not do
//! storage-side row-level security; it is an application-side safety net
//! over the data-access seam.

pub mod backend;
pub mod config;
pub mod detect;
pub mod enforce;
pub mod errors;
pub mod policy;
pub mod query;
pub mod registry;
pub mod schema;
pub mod session;
pub mod tenant;

pub use backend::TenancyBackend;
#[cfg(feature = "memory")]
pub use backend::memory::MemoryBackend;
pub use config::EnforcementConfig;
pub use detect::has_tenant_filter;
pub use enforce::Enforcer;
pub use errors::{TenancyError, TenancyResult};
pub use policy::{decide, Decision, PolicyInput, Verb};
pub use query::{Filter, Query};
pub use registry::ExemptionRegistry;
pub use schema::{TableSchema, DEFAULT_TENANT_COLUMN};
pub use session::{Session, Transaction};
pub use tenant::{TenantContext, TenantId};
