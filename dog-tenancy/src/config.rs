//! # Enforcement configuration
//!
//! Three process-wide flags, loaded once at startup and immutable
//! thereafter. The struct is threaded explicitly into the
//! [`Enforcer`](crate::Enforcer) constructor; there is no package-level
//! mutable singleton.
//!
//! ## Environment overrides
//! Like the rest of DogRS, configuration can be layered from the
//! environment with the `PREFIX__KEY` convention:
//!
//! ```bash
//! export APP__TENANCY__STRICT=true
//! export APP__TENANCY__ALLOW_BYPASS=false
//! ```
//!
//! ```rust
//! use dog_tenancy::EnforcementConfig;
//! let cfg = EnforcementConfig::from_env("APP__TENANCY__");
//! ```
//!
//! Unset or unparsable variables fall back to the secure defaults.

/// Immutable enforcement flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementConfig {
    /// When the tenant context is missing on read/update/delete:
    /// `true` → abort with `TenantContextRequired`; `false` → warn and allow
    /// the unscoped operation. Creates always abort regardless.
    pub strict: bool,

    /// Emit a `tracing` warning when a permissive-mode unscoped operation
    /// is allowed through.
    pub warn_on_unscoped: bool,

    /// Whether bypass-tagged contexts are honored at all. With this off, a
    /// bypass request degrades to a plain missing-context operation.
    pub allow_bypass: bool,
}

impl EnforcementConfig {
    /// Secure defaults: strict, warning, no bypass.
    pub fn new() -> Self {
        Self {
            strict: true,
            warn_on_unscoped: true,
            allow_bypass: false,
        }
    }

    /// Degraded mode for migrations/backfills: missing context is logged,
    /// not fatal. Never the production default.
    pub fn permissive() -> Self {
        Self {
            strict: false,
            ..Self::new()
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_warn_on_unscoped(mut self, warn: bool) -> Self {
        self.warn_on_unscoped = warn;
        self
    }

    pub fn with_allow_bypass(mut self, allow: bool) -> Self {
        self.allow_bypass = allow;
        self
    }

    /// Load flags from environment variables under `prefix`:
    /// `{prefix}STRICT`, `{prefix}WARN_ON_UNSCOPED`, `{prefix}ALLOW_BYPASS`.
    pub fn from_env(prefix: &str) -> Self {
        let defaults = Self::new();
        Self {
            strict: env_bool(prefix, "STRICT").unwrap_or(defaults.strict),
            warn_on_unscoped: env_bool(prefix, "WARN_ON_UNSCOPED")
                .unwrap_or(defaults.warn_on_unscoped),
            allow_bypass: env_bool(prefix, "ALLOW_BYPASS").unwrap_or(defaults.allow_bypass),
        }
    }
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_bool(prefix: &str, key: &str) -> Option<bool> {
    std::env::var(format!("{prefix}{key}"))
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_secure() {
        let cfg = EnforcementConfig::new();
        assert!(cfg.strict);
        assert!(cfg.warn_on_unscoped);
        assert!(!cfg.allow_bypass);
    }

    #[test]
    fn permissive_only_relaxes_strict() {
        let cfg = EnforcementConfig::permissive();
        assert!(!cfg.strict);
        assert!(cfg.warn_on_unscoped);
        assert!(!cfg.allow_bypass);
    }

    #[test]
    fn from_env_reads_prefixed_flags() {
        std::env::set_var("DOG_TENANCY_TEST__STRICT", "false");
        std::env::set_var("DOG_TENANCY_TEST__ALLOW_BYPASS", "true");
        let cfg = EnforcementConfig::from_env("DOG_TENANCY_TEST__");
        assert!(!cfg.strict);
        assert!(cfg.allow_bypass);
        assert!(cfg.warn_on_unscoped); // unset → default
        std::env::remove_var("DOG_TENANCY_TEST__STRICT");
        std::env::remove_var("DOG_TENANCY_TEST__ALLOW_BYPASS");
    }

    #[test]
    fn from_env_ignores_garbage_values() {
        std::env::set_var("DOG_TENANCY_GARBAGE__STRICT", "yes please");
        let cfg = EnforcementConfig::from_env("DOG_TENANCY_GARBAGE__");
        assert!(cfg.strict);
        std::env::remove_var("DOG_TENANCY_GARBAGE__STRICT");
    }
}
