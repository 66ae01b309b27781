//! Client configuration, isolated from process-global state.
//!
//! The original SDK reached for `PANGEA_TOKEN`/`AUDIT_CONFIG_ID` as module
//! globals wherever it needed them. This crate reads the environment in
//! exactly one place ([`Config::from_env`]) and threads an explicit
//! `Config` through the client from then on (spec.md Design Notes §9,
//! "Global state").

use crate::hash::hash_hex;
use std::env;

/// Configuration for an [`AuditClient`](crate::client::AuditClient).
#[derive(Clone)]
pub struct Config {
    pub base_domain: String,
    pub token: String,
    pub config_id: Option<String>,
    pub allow_server_roots: bool,
}

impl Config {
    /// Create a new configuration for the given server origin and token.
    pub fn new(base_domain: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_domain: base_domain.into(),
            token: token.into(),
            config_id: None,
            allow_server_roots: true,
        }
    }

    /// Build a configuration from `base_domain` plus the `PANGEA_TOKEN`
    /// environment variable, matching the original SDK's env lookup.
    pub fn from_env(base_domain: impl Into<String>) -> Option<Self> {
        let token = env::var("PANGEA_TOKEN").ok()?;
        Some(Self::new(base_domain, token))
    }

    /// Forwarded as the `X-Pangea-Audit-Config-ID` header on every request.
    pub fn with_config_id(mut self, config_id: impl Into<String>) -> Self {
        self.config_id = Some(config_id.into());
        self
    }

    /// Whether a root sourced from the server (not independently
    /// published) is acceptable for verification. Default `true`.
    pub fn with_allow_server_roots(mut self, allow: bool) -> Self {
        self.allow_server_roots = allow;
        self
    }

    /// A stable key identifying this client's published-roots cache,
    /// derived the way the original SDK derived its local cache filename
    /// (`hash(token + "-" + config_id)`). This crate keeps no such file
    /// itself — the key is exposed for a caller that wants to persist the
    /// cache across sessions.
    pub fn cache_key(&self) -> String {
        let config_id = self.config_id.as_deref().unwrap_or("");
        hash_hex(format!("{}-{}", self.token, config_id).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_server_roots_defaults_to_true() {
        let config = Config::new("example.pangea.cloud", "token");
        assert!(config.allow_server_roots);
    }

    #[test]
    fn cache_key_is_deterministic_and_depends_on_config_id() {
        let a = Config::new("example.pangea.cloud", "token");
        let b = a.clone().with_config_id("audit-1");
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), a.cache_key());
    }
}
