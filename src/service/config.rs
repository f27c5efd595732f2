use anyhow::Context;
use std::time::Duration;

use objtracker_postgresql_store::PostgresConfig;

use crate::services::DEFAULT_NODE_AGENT_PREFIX;

const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_STORE_DEADLINE_MS: u64 = 1000;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub store_deadline: Duration,
    pub node_agent_prefix: String,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS '{value}' is not a count"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        anyhow::ensure!(max_connections > 0, "DATABASE_MAX_CONNECTIONS must be at least 1");

        let deadline_ms = match lookup("STORE_DEADLINE_MS") {
            Some(value) => value
                .parse()
                .with_context(|| format!("STORE_DEADLINE_MS '{value}' is not milliseconds"))?,
            None => DEFAULT_STORE_DEADLINE_MS,
        };
        anyhow::ensure!(deadline_ms > 0, "STORE_DEADLINE_MS must be at least 1");

        let node_agent_prefix = lookup("NODE_AGENT_PREFIX")
            .unwrap_or_else(|| DEFAULT_NODE_AGENT_PREFIX.to_string());

        Ok(Self {
            database_url,
            max_connections,
            store_deadline: Duration::from_millis(deadline_ms),
            node_agent_prefix,
        })
    }

    pub fn postgres(&self) -> PostgresConfig {
        PostgresConfig {
            database_url: self.database_url.clone(),
            max_connections: self.max_connections,
            deadline: self.store_deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(values: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = values
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        move |key| values.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup_in(&[("DATABASE_URL", "postgres://localhost/objtracker")]))
                .unwrap();

        assert_eq!(config.max_connections, 20);
        assert_eq!(config.store_deadline, Duration::from_secs(1));
        assert_eq!(config.node_agent_prefix, "virt-handler");
        assert_eq!(config.postgres().deadline, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_in(&[
            ("DATABASE_URL", "postgres://localhost/objtracker"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("STORE_DEADLINE_MS", "250"),
            ("NODE_AGENT_PREFIX", "node-agent"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 4);
        assert_eq!(config.store_deadline, Duration::from_millis(250));
        assert_eq!(config.node_agent_prefix, "node-agent");
    }

    #[test]
    fn test_requires_database_url() {
        assert!(Config::from_lookup(lookup_in(&[])).is_err());
        assert!(Config::from_lookup(lookup_in(&[
            ("DATABASE_URL", "postgres://localhost/objtracker"),
            ("STORE_DEADLINE_MS", "soon"),
        ]))
        .is_err());
    }

    #[test]
    fn test_rejects_zero_limits() {
        let zero_connections = Config::from_lookup(lookup_in(&[
            ("DATABASE_URL", "postgres://localhost/objtracker"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]));
        assert!(zero_connections.is_err());

        let zero_deadline = Config::from_lookup(lookup_in(&[
            ("DATABASE_URL", "postgres://localhost/objtracker"),
            ("STORE_DEADLINE_MS", "0"),
        ]));
        assert!(zero_deadline.is_err());
    }
}
