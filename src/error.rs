use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashError>;

/// Outcome carried inside an [`Action`](crate::action::Action). Errors are
/// flattened to their display text so messages stay `Clone`.
pub type FetchResult<T> = std::result::Result<T, String>;

impl From<reqwest::Error> for DashError {
    fn from(err: reqwest::Error) -> Self {
        DashError::Api(err.to_string())
    }
}

impl From<arboard::Error> for DashError {
    fn from(err: arboard::Error) -> Self {
        DashError::Clipboard(err.to_string())
    }
}
