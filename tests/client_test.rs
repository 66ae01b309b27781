use pangea_audit::{AuditClient, AuditError, Config, Event, SearchParams};

fn config() -> Config {
    Config::new("example.pangea.cloud", "test-token")
}

#[cfg(test)]
mod log_validation {
    use super::*;

    #[tokio::test]
    async fn test_log_without_message_should_fail() {
        let client = AuditClient::new(config());
        let event = Event { actor: Some("villan".to_string()), ..Default::default() };

        let result = client.log(&event).await;

        assert!(result.is_err(), "Should fail without a message field");
        if let Err(e) = result {
            let msg = e.to_string();
            assert!(msg.contains("message"), "Error should mention the missing field: {msg}");
        }
    }
}

#[cfg(test)]
mod search_validation {
    use super::*;

    #[tokio::test]
    async fn test_search_with_zero_page_size_should_fail() {
        let client = AuditClient::new(config());
        let params = SearchParams::new("message:reboot").with_page_size(0);

        let result = client.search(params).await;

        assert!(matches!(result, Err(AuditError::InvalidInput(_))));
    }
}

#[cfg(test)]
mod config_behavior {
    use super::*;

    #[test]
    fn test_allow_server_roots_defaults_true_and_is_overridable() {
        let permissive = config();
        assert!(permissive.allow_server_roots);

        let strict = config().with_allow_server_roots(false);
        assert!(!strict.allow_server_roots);
    }

    #[test]
    fn test_cache_key_changes_with_config_id() {
        let base = config();
        let scoped = config().with_config_id("audit-prod");
        assert_ne!(base.cache_key(), scoped.cache_key());
    }
}
