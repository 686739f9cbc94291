//! Server configuration read from the environment.

use std::time::Duration;

use taleforge_broadcast::BroadcastConfig;
use taleforge_orchestration::application::config::{DeliveryMode, OrchestratorConfig};
use taleforge_store::DEFAULT_HISTORY_LIMIT;

use crate::error::AppError;

/// Everything the binary needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the external agent service.
    pub agent_service_url: String,
    pub broadcast: BroadcastConfig,
    pub orchestrator: OrchestratorConfig,
    /// Turns of history kept per game.
    pub history_limit: usize,
    /// OTLP collector endpoint; span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = parse_or(&lookup, "PORT", 3000_u16)?;
        let agent_service_url = lookup("AGENT_SERVICE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("AGENT_SERVICE_URL environment variable must be set".to_owned())
            })?
            .trim_end_matches('/')
            .to_owned();

        let queue_capacity = parse_or(&lookup, "BROADCAST_QUEUE_CAPACITY", 100_usize)?;
        if queue_capacity == 0 {
            return Err(AppError::Config(
                "BROADCAST_QUEUE_CAPACITY must be at least 1".to_owned(),
            ));
        }
        let heartbeat_secs = parse_or(&lookup, "HEARTBEAT_INTERVAL_SECS", 30_u64)?;
        if heartbeat_secs == 0 {
            return Err(AppError::Config(
                "HEARTBEAT_INTERVAL_SECS must be at least 1".to_owned(),
            ));
        }

        let max_combat_iterations = parse_or(&lookup, "MAX_COMBAT_LOOP_ITERATIONS", 25_usize)?;
        let delivery = match lookup("DELIVERY_MODE") {
            Some(raw) => raw
                .parse::<DeliveryMode>()
                .map_err(|e| AppError::Config(format!("DELIVERY_MODE: {e}")))?,
            None => DeliveryMode::default(),
        };

        let history_limit = parse_or(&lookup, "TURN_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?;
        if history_limit == 0 {
            return Err(AppError::Config(
                "TURN_HISTORY_LIMIT must be at least 1".to_owned(),
            ));
        }

        let otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty());

        Ok(Self {
            host,
            port,
            agent_service_url,
            broadcast: BroadcastConfig {
                queue_capacity,
                heartbeat_interval: Duration::from_secs(heartbeat_secs),
            },
            orchestrator: OrchestratorConfig {
                max_combat_iterations,
                delivery,
            },
            history_limit,
            otlp_endpoint,
        })
    }

    /// The `host:port` pair to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_agent_url_is_set() {
        // Act
        let config = config_from(&[("AGENT_SERVICE_URL", "http://agents:8080/")]).unwrap();

        // Assert
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.agent_service_url, "http://agents:8080");
        assert_eq!(config.broadcast, BroadcastConfig::default());
        assert_eq!(config.orchestrator, OrchestratorConfig::default());
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.otlp_endpoint, None);
    }

    #[test]
    fn test_every_variable_is_honoured() {
        // Act
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8081"),
            ("AGENT_SERVICE_URL", "http://agents"),
            ("BROADCAST_QUEUE_CAPACITY", "16"),
            ("HEARTBEAT_INTERVAL_SECS", "5"),
            ("MAX_COMBAT_LOOP_ITERATIONS", "10"),
            ("DELIVERY_MODE", "Buffered"),
            ("TURN_HISTORY_LIMIT", "50"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();

        // Assert
        assert_eq!(config.bind_address(), "127.0.0.1:8081");
        assert_eq!(config.broadcast.queue_capacity, 16);
        assert_eq!(config.broadcast.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.orchestrator.max_combat_iterations, 10);
        assert_eq!(config.orchestrator.delivery, DeliveryMode::Buffered);
        assert_eq!(config.history_limit, 50);
        assert_eq!(
            config.otlp_endpoint.as_deref(),
            Some("http://collector:4317")
        );
    }

    #[test]
    fn test_missing_agent_url_is_config_error() {
        let result = config_from(&[("PORT", "3000")]);

        assert!(matches!(result, Err(AppError::Config(m)) if m.contains("AGENT_SERVICE_URL")));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let cases = [
            ("PORT", "eighty"),
            ("BROADCAST_QUEUE_CAPACITY", "0"),
            ("HEARTBEAT_INTERVAL_SECS", "-1"),
            ("MAX_COMBAT_LOOP_ITERATIONS", "many"),
            ("DELIVERY_MODE", "carrier-pigeon"),
            ("TURN_HISTORY_LIMIT", "0"),
        ];

        for (key, value) in cases {
            let result = config_from(&[("AGENT_SERVICE_URL", "http://agents"), (key, value)]);
            assert!(
                matches!(&result, Err(AppError::Config(m)) if m.contains(key)),
                "{key}={value} should be rejected, got {result:?}"
            );
        }
    }
}
