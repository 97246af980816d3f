//! Build directories and artifact freshness
//!
//! Every Boltfile gets its own build directory, named after a hash of its
//! absolute path, holding the generated source and the compiled artifact.

use crate::transpile::GENERATED_FILE_NAME;
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Prefix of every build directory name
pub const BUILD_DIR_PREFIX: &str = "bolt-";

/// File stem of the compiled artifact
pub const ARTIFACT_NAME: &str = "bolt";

/// Lower-case hex SHA-256 of a Boltfile path
pub fn cache_key(boltfile: &Path) -> String {
    let digest = Sha256::digest(boltfile.to_string_lossy().as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// The platform cache directory, or the system temp dir when there is none
pub fn default_cache_root() -> PathBuf {
    ProjectDirs::from("", "", "bolt")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(env::temp_dir)
}

/// Locations used to build one Boltfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCache {
    /// Build directory
    pub dir: PathBuf,

    /// Generated source file
    pub source: PathBuf,

    /// Cached executable
    pub artifact: PathBuf,
}

impl BuildCache {
    /// Build locations for `boltfile` (an absolute path) under `root`
    pub fn for_boltfile(boltfile: &Path, root: &Path) -> Self {
        let dir = root.join(format!("{}{}", BUILD_DIR_PREFIX, cache_key(boltfile)));
        BuildCache {
            source: dir.join(GENERATED_FILE_NAME),
            artifact: dir.join(format!("{}{}", ARTIFACT_NAME, env::consts::EXE_SUFFIX)),
            dir,
        }
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Whether the artifact exists and is not older than the Boltfile
    pub fn is_fresh(&self, boltfile: &Path) -> io::Result<bool> {
        let artifact = match fs::metadata(&self.artifact) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        let source_modified = fs::metadata(boltfile)?.modified()?;
        Ok(source_modified <= artifact.modified()?)
    }
}

/// Whether a cached artifact may be run without going through the pipeline
pub fn should_reuse(fresh: bool, recompile: bool, gen_only: bool) -> bool {
    fresh && !recompile && !gen_only
}
