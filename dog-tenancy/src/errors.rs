use thiserror::Error;

/// Result type for tenancy-guarded operations.
pub type TenancyResult<T> = Result<T, TenancyError>;

/// Errors raised by the enforcement layer.
///
/// `TenantContextRequired` and `ForbiddenFieldMutation` are raised *before*
/// the underlying statement executes, so a rejected operation never reaches
/// storage. Storage errors pass through from the backend unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TenancyError {
    #[error("Tenant context required for operation on '{table}'")]
    TenantContextRequired { table: String },

    #[error("Field '{column}' on '{table}' cannot be modified")]
    ForbiddenFieldMutation { table: String, column: String },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl TenancyError {
    pub fn context_required(table: impl Into<String>) -> Self {
        Self::TenantContextRequired {
            table: table.into(),
        }
    }

    pub fn forbidden_field(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ForbiddenFieldMutation {
            table: table.into(),
            column: column.into(),
        }
    }
}
