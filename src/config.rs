use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{DashError, Result};
use crate::types::RepoRef;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    pub default_repo: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub web_url: String,
    pub api_url: String,
    pub token_env: Option<String>,
    pub token_command: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            web_url: "https://github.com".to_string(),
            api_url: "https://api.github.com".to_string(),
            token_env: Some("GITHUB_TOKEN".to_string()),
            token_command: Some("gh auth token".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Repositories covered by the metrics tab; empty means the current one.
    pub metrics_repos: Vec<String>,
    pub tick_rate_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            metrics_repos: Vec::new(),
            tick_rate_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub github: GitHubConfig,
    pub dashboard: DashboardConfig,
}

pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("gitdash"))
}

fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.toml"))
}

impl Config {
    /// Load from the default location. A missing file yields the defaults; an
    /// unparsable one is an error the caller may choose to ignore.
    pub fn load() -> Result<Self> {
        let Some(path) = config_path() else {
            return Ok(Config::default());
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Ok(Config::default());
        };

        toml::from_str(&content)
            .map_err(|e| DashError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load an explicitly requested file; unlike [`Config::load`] a missing file is an error.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DashError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| DashError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn metrics_repos(&self) -> Result<Vec<RepoRef>> {
        self.dashboard
            .metrics_repos
            .iter()
            .map(|r| r.parse())
            .collect()
    }
}

/// Pick the repository to browse: explicit argument, then config, then the
/// `origin` remote of the working directory.
pub fn resolve_repo(arg: Option<&str>, config: &Config) -> Result<RepoRef> {
    if let Some(repo) = arg.or(config.general.default_repo.as_deref()) {
        return repo.parse();
    }
    detect_repo().ok_or_else(|| {
        DashError::Config(
            "no repository given; pass --repo owner/name or run inside a clone".to_string(),
        )
    })
}

/// Detect the repository from the current git remote origin.
fn detect_repo() -> Option<RepoRef> {
    let output = std::process::Command::new("git")
        .args(["remote", "get-url", "origin"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    repo_from_remote(&url)
}

/// Extract owner/name from SSH (git@host:owner/repo.git) or HTTPS (https://host/owner/repo.git) URLs
fn repo_from_remote(url: &str) -> Option<RepoRef> {
    let path = if let Some(rest) = url.strip_prefix("git@") {
        rest.split_once(':')?.1
    } else if url.starts_with("https://") || url.starts_with("http://") || url.starts_with("ssh://")
    {
        let without_scheme = url.split("://").nth(1)?;
        without_scheme.split_once('/')?.1
    } else {
        return None;
    };
    path.trim_end_matches('/').parse().ok()
}
