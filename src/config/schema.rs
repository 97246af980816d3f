//! Configuration validation
//!
//! This module provides validation logic for `Bolt.yml` files.

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult};

/// Editions `rustc` accepts for `--edition`
const EDITIONS: &[&str] = &["2015", "2018", "2021", "2024"];

/// Compiler flags the build driver sets itself
const RESERVED_FLAGS: &[&str] = &["-o", "--edition", "--crate-name", "--crate-type", "--test"];

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if let Some(rustc) = &config.rustc {
        if rustc.trim().is_empty() {
            return Err(ConfigError::Invalid("rustc must not be empty".to_string()));
        }
    }

    if let Some(edition) = &config.edition {
        validate_edition(edition)?;
    }

    for flag in &config.rustc_flags {
        validate_flag(flag)?;
    }

    Ok(())
}

/// Validate an edition string
fn validate_edition(edition: &str) -> ConfigResult<()> {
    if EDITIONS.contains(&edition) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "Invalid edition: {}. Must be one of: {}",
            edition,
            EDITIONS.join(", ")
        )))
    }
}

/// Reject flags that would fight the build driver over its own arguments
fn validate_flag(flag: &str) -> ConfigResult<()> {
    let name = flag.split('=').next().unwrap_or(flag);
    if RESERVED_FLAGS.contains(&name) {
        return Err(ConfigError::Invalid(format!(
            "rustc flag '{}' is managed by bolt and cannot be overridden",
            name
        )));
    }
    Ok(())
}
