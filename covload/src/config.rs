//! Configuration management for covload

use crate::cli::{Backend, Cli};
use covgraph_adapter_neo4j::{Neo4jConfig, DEFAULT_BOLT_PORT};
use covgraph_core::dimensions::ReferenceTables;
use covgraph_core::errors::CoreError;
use covgraph_core::pipeline::LoadSources;
use figment::{
    providers::{Env, Format, Json, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Keys every config file is expected to carry
pub const TEMPLATE: &str = include_str!("../config.json.template");

/// Misspelled key names still accepted for the canonical one
const KEY_ALIASES: [(&str, &str); 1] = [("neo4j_server_password", "noe4j_server_password")];

/// Configuration for a load run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Host name of the Neo4j server
    #[serde(default = "default_server")]
    pub neo4j_server: String,
    #[serde(default = "default_port")]
    pub neo4j_port: u16,
    #[serde(default = "default_user")]
    pub neo4j_user: String,
    #[serde(default, alias = "noe4j_server_password")]
    pub neo4j_server_password: String,
    /// Database name, server default when unset
    #[serde(default)]
    pub neo4j_database: Option<String>,
    /// Comma-delimited case metadata
    #[serde(default)]
    pub staged_metadata_file: PathBuf,
    /// Tab-delimited global clade assignments
    #[serde(default)]
    pub global_clade_assignment_file: PathBuf,
    /// Audit log, created when missing
    #[serde(default)]
    pub graph_load_log_file: PathBuf,
    /// Directory of the static reference tables
    #[serde(default = "default_dims_dir")]
    pub stable_dims_dir: PathBuf,
    #[serde(default)]
    pub graph_backend: Backend,
}

fn default_server() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_BOLT_PORT
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_dims_dir() -> PathBuf {
    PathBuf::from("../bi_system/stable_dims")
}

/// A parsed config file and the template keys it lacks
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: LoaderConfig,
    pub missing_keys: Vec<String>,
}

impl LoaderConfig {
    /// Load configuration from file and `COVLOAD_`-prefixed environment variables
    pub fn load(path: &Path) -> Result<LoadedConfig, CoreError> {
        let figment = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Figment::new().merge(Yaml::file(path)),
            _ => Figment::new().merge(Json::file(path)),
        };
        let figment = figment.merge(Env::prefixed("COVLOAD_"));

        let missing_keys = missing_template_keys(&figment)?;
        let config = figment
            .extract()
            .map_err(|e| CoreError::Configuration(format!("Failed to parse configuration: {}", e)))?;

        Ok(LoadedConfig {
            config,
            missing_keys,
        })
    }

    /// Apply CLI argument overrides to the configuration
    pub fn with_overrides(mut self, args: &Cli) -> Self {
        if let Some(backend) = args.backend {
            self.graph_backend = backend;
        }
        self
    }

    pub fn neo4j_config(&self) -> Neo4jConfig {
        let config = Neo4jConfig::for_host(&self.neo4j_server, self.neo4j_port)
            .with_auth(self.neo4j_user.as_str(), self.neo4j_server_password.as_str());
        match &self.neo4j_database {
            Some(database) => config.with_database(database.as_str()),
            None => config,
        }
    }

    /// Validate every input path and return them as load sources
    pub fn sources(&self) -> Result<LoadSources, CoreError> {
        let case_file = check_file(&self.staged_metadata_file, false)?;
        info!("Validated case file as {}", case_file.display());
        let clade_file = check_file(&self.global_clade_assignment_file, false)?;
        info!("Validated global clade file as {}", clade_file.display());
        for table in ReferenceTables::files(&self.stable_dims_dir) {
            check_file(&table, false)?;
        }

        Ok(LoadSources {
            case_file,
            clade_file,
            dims_dir: self.stable_dims_dir.clone(),
        })
    }
}

/// Keys of the template that `figment` cannot supply
pub fn missing_template_keys(figment: &Figment) -> Result<Vec<String>, CoreError> {
    let template: serde_json::Map<String, serde_json::Value> = serde_json::from_str(TEMPLATE)?;

    Ok(template
        .keys()
        .filter(|key| {
            let alias = KEY_ALIASES
                .iter()
                .find(|(canonical, _)| *canonical == key.as_str())
                .map(|(_, alias)| *alias);
            !figment.contains(key) && !alias.map_or(false, |a| figment.contains(a))
        })
        .cloned()
        .collect())
}

/// Check that `path` names a file; with `create`, make an empty one if it is missing
pub fn check_file(path: &Path, create: bool) -> Result<PathBuf, CoreError> {
    if path.as_os_str().is_empty() {
        return Err(CoreError::Configuration("invalid filepath".to_string()));
    }

    if !path.exists() {
        if create {
            File::create(path).map_err(|e| {
                CoreError::Configuration(format!("Could not create {}: {}", path.display(), e))
            })?;
        } else {
            return Err(CoreError::Configuration(format!(
                "Invalid filepath: {}",
                path.display()
            )));
        }
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, TempDir};

    fn config_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_template_is_complete_json() {
        let file = config_file(".json", TEMPLATE);
        let loaded = LoaderConfig::load(file.path()).unwrap();
        assert!(loaded.missing_keys.is_empty());
        assert_eq!(loaded.config.neo4j_server, "localhost");
        assert_eq!(loaded.config.neo4j_port, DEFAULT_BOLT_PORT);
        assert_eq!(loaded.config.graph_backend, Backend::Neo4j);
    }

    #[test]
    fn test_missing_keys_are_reported_not_fatal() {
        let file = config_file(
            ".json",
            r#"{"neo4j_server": "graph.internal", "noe4j_server_password": "secret", "graph_backend": "memory"}"#,
        );
        let loaded = LoaderConfig::load(file.path()).unwrap();

        assert_eq!(
            loaded.missing_keys,
            vec![
                "global_clade_assignment_file",
                "graph_load_log_file",
                "staged_metadata_file"
            ]
        );
        assert_eq!(loaded.config.neo4j_server_password, "secret");
        assert_eq!(loaded.config.graph_backend, Backend::Memory);
        assert_eq!(loaded.config.neo4j_config().uri, "bolt://graph.internal:7687");
    }

    #[test]
    fn test_yaml_config() {
        let file = config_file(".yaml", "neo4j_server: db\nneo4j_port: 7688\nstable_dims_dir: dims\n");
        let config = LoaderConfig::load(file.path()).unwrap().config;
        assert_eq!(config.neo4j_port, 7688);
        assert_eq!(config.stable_dims_dir, PathBuf::from("dims"));
    }

    #[test]
    fn test_check_file() {
        let dir = TempDir::new().unwrap();
        assert!(check_file(Path::new(""), false).is_err());

        let log = dir.path().join("load_log.csv");
        assert!(check_file(&log, false).is_err());
        assert_eq!(check_file(&log, true).unwrap(), log);
        assert!(log.exists());
    }

    #[test]
    fn test_sources_require_every_input() {
        let dir = TempDir::new().unwrap();
        let case_file = dir.path().join("cases.csv");
        std::fs::write(&case_file, "ssi_id\n").unwrap();

        let file = config_file(".json", TEMPLATE);
        let mut config = LoaderConfig::load(file.path()).unwrap().config;
        config.staged_metadata_file = case_file;
        config.global_clade_assignment_file = dir.path().join("clades.tsv");

        let err = config.sources().unwrap_err();
        assert!(err.to_string().contains("clades.tsv"));
    }
}
