//! Boltfile discovery and configuration file parsing

use crate::config::types::Config;
use crate::error::{BoltError, ConfigError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Boltfile names to search for, in order
pub const BOLTFILE_NAMES: &[&str] = &["Boltfile", "Boltfile.rs"];

/// Configuration file names looked up next to the Boltfile
const CONFIG_FILE_NAMES: &[&str] = &["Bolt.yml", "Bolt.yaml"];

/// Locate the Boltfile, honouring a `--boltfile` override
///
/// An override naming an existing file (relative to the current directory or
/// absolute) is used as is; otherwise it is treated as a file name to search
/// for in the current and parent directories.
pub fn locate_boltfile(name_override: Option<&str>) -> Result<PathBuf> {
    let cwd = env::current_dir()?;

    let names: Vec<&str> = match name_override {
        Some(name) => {
            let candidate = cwd.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            vec![name]
        }
        None => BOLTFILE_NAMES.to_vec(),
    };

    find_boltfile_from(cwd, &names)
}

/// Find a Boltfile by searching `start_dir` and its parents
pub fn find_boltfile_from(start_dir: PathBuf, names: &[&str]) -> Result<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in names {
            let boltfile = current_dir.join(file_name);
            searched_paths.push(boltfile.display().to_string());

            if boltfile.is_file() {
                return Ok(boltfile);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                return Err(BoltError::Locate {
                    name: names.join(" or "),
                    searched: searched_paths.join(", "),
                })
            }
        }
    }
}

/// Parse a configuration file from a path
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_config(&contents)
}

/// Parse configuration from a string
pub fn parse_config(yaml: &str) -> Result<Config> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(yaml)?;
    Ok(config)
}

/// Load the configuration file living in `dir`, if any
pub fn load_config(dir: &Path) -> Result<Option<(Config, PathBuf)>> {
    for file_name in CONFIG_FILE_NAMES {
        let path = dir.join(file_name);
        if path.is_file() {
            let config = parse_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}
