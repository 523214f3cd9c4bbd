//! Configuration types for Neo4j adapter

use serde::{Deserialize, Serialize};

pub const DEFAULT_BOLT_PORT: u16 = 7687;

/// Configuration for Neo4j connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Neo4j connection URI (e.g., bolt://localhost:7687)
    pub uri: String,
    /// Username for authentication
    pub user: String,
    /// Password for authentication
    pub password: String,
    /// Database to load into, server default when unset
    pub database: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: usize,
    /// Rows fetched per round trip
    pub fetch_size: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: format!("bolt://localhost:{}", DEFAULT_BOLT_PORT),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: None,
            max_connections: 4,
            fetch_size: 200,
        }
    }
}

impl Neo4jConfig {
    /// Create a new config with the given URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Bolt URI for a bare host name and port
    pub fn for_host(host: &str, port: u16) -> Self {
        Self::new(format!("bolt://{}:{}", host, port))
    }

    /// Set the authentication credentials
    pub fn with_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the connection pool size
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_host() {
        let config = Neo4jConfig::for_host("graph.internal", DEFAULT_BOLT_PORT)
            .with_auth("loader", "secret")
            .with_database("cases");
        assert_eq!(config.uri, "bolt://graph.internal:7687");
        assert_eq!(config.user, "loader");
        assert_eq!(config.database.as_deref(), Some("cases"));
    }
}
