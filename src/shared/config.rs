//! Application configuration. Backend selection, paths, session identity.

use crate::domain::{DomainError, Identity};
use crate::usecases::DEFAULT_TOP_COMMUNITIES;
use serde::Deserialize;

pub const DEFAULT_DATA_DIR: &str = "./data";
/// `EnvFilter` directive used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Which record store backs the session.
/// Parsed case-insensitively, from env and config files alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
    Graphql,
}

impl std::str::FromStr for BackendKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "graphql" => Ok(Self::Graphql),
            other => Err(DomainError::Config(format!("unknown backend '{}'", other))),
        }
    }
}

impl TryFrom<String> for BackendKind {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Store backend. Read from VOTE_SYNC_BACKEND (memory | sqlite | graphql).
    #[serde(default)]
    pub backend: Option<BackendKind>,

    /// Directory for the SQLite database. Read from VOTE_SYNC_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // GraphQL backend
    // ─────────────────────────────────────────────────────────────────────────
    /// Endpoint URL. Read from VOTE_SYNC_GRAPHQL_URL.
    #[serde(default)]
    pub graphql_url: Option<String>,

    /// API key sent with every request. Read from VOTE_SYNC_GRAPHQL_API_KEY.
    #[serde(default)]
    pub graphql_api_key: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Session & presentation
    // ─────────────────────────────────────────────────────────────────────────
    /// Initial session identity; unset means signed out. Read from VOTE_SYNC_USERNAME.
    #[serde(default)]
    pub username: Option<String>,

    /// Size of the "top communities" list. Read from VOTE_SYNC_TOP_COMMUNITIES.
    #[serde(default)]
    pub top_communities: Option<usize>,

    /// Seed demo content into an empty local store. Read from VOTE_SYNC_SEED_DEMO.
    #[serde(default)]
    pub seed_demo: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("VOTE_SYNC").try_parsing(true));
        if let Ok(path) = std::env::var("VOTE_SYNC_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn backend_or_default(&self) -> BackendKind {
        self.backend.unwrap_or_default()
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
    }

    /// Returns the GraphQL endpoint; required for the graphql backend.
    pub fn graphql_url(&self) -> Result<String, DomainError> {
        self.graphql_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                DomainError::Config("Set VOTE_SYNC_GRAPHQL_URL for the graphql backend".into())
            })
    }

    pub fn graphql_api_key(&self) -> Option<String> {
        self.graphql_api_key.clone().filter(|k| !k.is_empty())
    }

    /// Initial identity. Blank names count as signed out.
    pub fn identity(&self) -> Option<Identity> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(Identity::new)
    }

    pub fn top_communities_or_default(&self) -> usize {
        self.top_communities.unwrap_or(DEFAULT_TOP_COMMUNITIES)
    }

    /// Demo content is seeded into local stores unless disabled.
    pub fn seed_demo_or_default(&self) -> bool {
        self.seed_demo
            .unwrap_or(self.backend_or_default() != BackendKind::Graphql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.backend_or_default(), BackendKind::Memory);
        assert_eq!(cfg.data_dir_or_default(), DEFAULT_DATA_DIR);
        assert_eq!(DEFAULT_LOG_FILTER, "info");
        assert_eq!(cfg.top_communities_or_default(), 10);
        assert!(cfg.seed_demo_or_default());
        assert!(cfg.identity().is_none());
        assert!(cfg.graphql_url().is_err());
    }

    #[test]
    fn test_identity_trimmed() {
        let cfg = AppConfig {
            username: Some("  alice ".into()),
            ..Default::default()
        };
        assert_eq!(cfg.identity(), Some(Identity::new("alice")));

        let blank = AppConfig {
            username: Some("   ".into()),
            ..Default::default()
        };
        assert!(blank.identity().is_none());
    }

    #[test]
    fn test_graphql_backend_skips_seed() {
        let cfg = AppConfig {
            backend: Some(BackendKind::Graphql),
            graphql_url: Some("https://example.invalid/graphql".into()),
            ..Default::default()
        };
        assert!(!cfg.seed_demo_or_default());
        assert!(cfg.graphql_url().is_ok());
    }

    #[test]
    fn test_backend_deserializes_any_case() {
        let cfg: AppConfig = config::Config::builder()
            .set_override("backend", "SQLite")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.backend_or_default(), BackendKind::Sqlite);

        let bad = config::Config::builder()
            .set_override("backend", "redis")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>();
        assert!(bad.is_err());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("SQLite".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert!("redis".parse::<BackendKind>().is_err());
    }
}
