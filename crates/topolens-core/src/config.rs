//! Layered configuration loading.
//!
//! Values are read from (in priority order):
//! 1. Environment variables (`TOPOLENS__<SECTION>__<KEY>`)
//! 2. Config file (`<prefix>.toml`, optional)
//!
//! Each crate owns the struct for its own section and deserializes it here.

use serde::de::DeserializeOwned;

use crate::error::CoreError;

/// Environment variable prefix shared by every binary.
pub const ENV_PREFIX: &str = "TOPOLENS";

fn build(file_prefix: &str) -> Result<config::Config, CoreError> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(cfg)
}

/// Load a required section. Fails if the section is absent or malformed.
pub fn load_section<T: DeserializeOwned>(file_prefix: &str, section: &str) -> Result<T, CoreError> {
    let cfg = build(file_prefix)?;
    match cfg.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => Err(CoreError::MissingSection(section.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Load an optional section, falling back to `T::default()` when absent.
pub fn load_section_or_default<T: DeserializeOwned + Default>(
    file_prefix: &str,
    section: &str,
) -> Result<T, CoreError> {
    let cfg = build(file_prefix)?;
    match cfg.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}
