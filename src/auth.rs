use std::path::PathBuf;

use crate::config::{self, GitHubConfig};
use crate::error::{DashError, Result};

/// Try to run a CLI command and capture stdout as a token
fn try_cli_token(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}

/// Stored token path: ~/.config/gitdash/token
fn token_path() -> Option<PathBuf> {
    Some(config::config_dir()?.join("token"))
}

fn load_stored_token() -> Option<String> {
    let token = std::fs::read_to_string(token_path()?).ok()?;
    non_empty(&token)
}

fn save_token(token: &str) -> std::io::Result<()> {
    if let Some(path) = token_path() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, token)?;
    }
    Ok(())
}

fn non_empty(raw: &str) -> Option<String> {
    let token = raw.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Load a token, trying in order:
/// 1. The configured env var
/// 2. Stored token from ~/.config/gitdash/token
/// 3. The configured CLI command (result is stored for next time)
pub fn load_token(config: &GitHubConfig) -> Result<String> {
    if let Some(env_var) = &config.token_env {
        if let Some(token) = std::env::var(env_var).ok().as_deref().and_then(non_empty) {
            tracing::debug!(env_var, "using token from environment");
            return Ok(token);
        }
    }

    if let Some(token) = load_stored_token() {
        tracing::debug!("using stored token");
        return Ok(token);
    }

    if let Some(cmd) = &config.token_command {
        if let Some(token) = try_cli_token(cmd) {
            tracing::debug!(command = %cmd, "using token from command");
            if let Err(e) = save_token(&token) {
                tracing::warn!(error = %e, "could not store token");
            }
            return Ok(token);
        }
    }

    Err(DashError::Auth(format!(
        "No GitHub token found. Set {} or configure github.token_command.",
        config.token_env.as_deref().unwrap_or("a token env var")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_token_is_trimmed() {
        assert_eq!(try_cli_token("echo '  abc123  '"), Some("abc123".to_string()));
    }

    #[test]
    fn failing_command_yields_nothing() {
        assert_eq!(try_cli_token("exit 1"), None);
        assert_eq!(try_cli_token("true"), None);
    }

    #[test]
    fn blank_tokens_are_ignored() {
        assert_eq!(non_empty("  \n"), None);
        assert_eq!(non_empty("tok\n"), Some("tok".to_string()));
    }
}
