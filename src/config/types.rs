//! Core configuration types
//!
//! This module defines the data structures that represent an optional
//! `Bolt.yml` file living next to the Boltfile, and the build settings
//! resolved from it and from the environment.

use crate::config::interpolate::{interpolate_list, interpolate_strict};
use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Default Rust edition used to compile generated programs
pub const DEFAULT_EDITION: &str = "2021";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Compiler program (e.g. `rustc` or `${HOME}/.cargo/bin/rustc`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rustc: Option<String>,

    /// Extra flags passed to the compiler (e.g. `["-O"]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rustc_flags: Vec<String>,

    /// Rust edition of the Boltfile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,

    /// Root directory for build caches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
}

/// Build settings after applying environment overrides and interpolation
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSettings {
    pub rustc: String,
    pub rustc_flags: Vec<String>,
    pub edition: String,
    pub cache_dir: Option<PathBuf>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            rustc: "rustc".to_string(),
            rustc_flags: Vec::new(),
            edition: DEFAULT_EDITION.to_string(),
            cache_dir: None,
        }
    }
}

impl Config {
    /// Resolve against the process environment
    pub fn resolve(&self) -> ConfigResult<BuildSettings> {
        let env: HashMap<String, String> = std::env::vars().collect();
        self.resolve_with(&env)
    }

    /// Resolve against the given environment
    ///
    /// Precedence for the compiler is `BOLT_RUSTC`, the config file, `RUSTC`,
    /// then plain `rustc`; for the cache root it is `BOLT_CACHE_DIR`, then
    /// the config file.
    pub fn resolve_with(&self, env: &HashMap<String, String>) -> ConfigResult<BuildSettings> {
        let non_empty = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();

        let rustc = match (non_empty("BOLT_RUSTC"), &self.rustc) {
            (Some(rustc), _) => rustc,
            (None, Some(rustc)) => interpolate_strict(rustc, env)?,
            (None, None) => non_empty("RUSTC").unwrap_or_else(|| "rustc".to_string()),
        };

        let cache_dir = match (non_empty("BOLT_CACHE_DIR"), &self.cache_dir) {
            (Some(dir), _) => Some(PathBuf::from(dir)),
            (None, Some(dir)) => Some(PathBuf::from(interpolate_strict(dir, env)?)),
            (None, None) => None,
        };

        Ok(BuildSettings {
            rustc,
            rustc_flags: interpolate_list(&self.rustc_flags, env)?,
            edition: self
                .edition
                .clone()
                .unwrap_or_else(|| DEFAULT_EDITION.to_string()),
            cache_dir,
        })
    }
}
