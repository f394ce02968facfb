use thiserror::Error;

/// Errors raised outside of graph access: configuration and startup.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing configuration section: [{0}]")]
    MissingSection(String),
}
