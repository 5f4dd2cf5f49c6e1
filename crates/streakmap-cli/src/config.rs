use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Environment variable that overrides the configured username.
pub const USERNAME_ENV: &str = "STREAKMAP_USERNAME";

/// Well-known paths under `<repo_root>/.streakmap/`.
#[derive(Debug, Clone)]
pub struct StreakmapPaths {
    pub root: PathBuf,
    pub streakmap_dir: PathBuf,
    pub config_json: PathBuf,
}

impl StreakmapPaths {
    /// Derive all paths from a repo root. Pure computation, no I/O.
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let streakmap_dir = root.join(".streakmap");
        Self {
            config_json: streakmap_dir.join("config.json"),
            streakmap_dir,
            root,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Run configuration. Every field has a default except `username`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreakmapConfig {
    pub username: String,
    pub api_base: String,
    pub graphql_endpoint: String,
    /// Name of the environment variable holding the GraphQL token.
    pub token_env: String,
    pub timeout_secs: u64,
    /// Heatmap output, relative to the repo root. Also used as the image
    /// reference inside the document.
    pub image_path: String,
    pub document_path: String,
    pub marker_start: String,
    pub marker_end: String,
    pub image_width: u32,
}

impl Default for StreakmapConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            api_base: "https://github-contributions-api.jogruber.de/v4".to_string(),
            graphql_endpoint: "https://api.github.com/graphql".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            timeout_secs: 30,
            image_path: "assets/github-contributions.png".to_string(),
            document_path: "README.md".to_string(),
            marker_start: "<!--START_SECTION:github-stats-->".to_string(),
            marker_end: "<!--END_SECTION:github-stats-->".to_string(),
            image_width: 920,
        }
    }
}

impl StreakmapConfig {
    /// Load `.streakmap/config.json` (defaults when absent), apply environment
    /// overrides from `env`, then validate.
    pub fn load(
        paths: &StreakmapPaths,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = if paths.config_json.exists() {
            let content =
                std::fs::read_to_string(&paths.config_json).map_err(|source| ConfigError::Read {
                    path: paths.config_json.clone(),
                    source,
                })?;
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: paths.config_json.clone(),
                source,
            })?
        } else {
            Self::default()
        };

        if let Some(username) = env(USERNAME_ENV).filter(|u| !u.trim().is_empty()) {
            config.username = username;
        }
        config.username = config.username.trim().to_string();

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "username is not configured: set \"username\" in .streakmap/config.json or {USERNAME_ENV}"
            )));
        }
        if self.marker_start.is_empty() || self.marker_end.is_empty() {
            return Err(ConfigError::Invalid(
                "marker_start and marker_end must be non-empty".to_string(),
            ));
        }
        if self.marker_start == self.marker_end {
            return Err(ConfigError::Invalid(
                "marker_start and marker_end must differ".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Credential for the fallback provider, if present and non-empty.
    pub fn token(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        env(&self.token_env).filter(|t| !t.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn image_file(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.image_path)
    }

    pub fn document_file(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.document_path)
    }

    /// Image reference as written into the document (forward slashes).
    pub fn image_ref(&self) -> String {
        self.image_path.replace('\\', "/")
    }
}
