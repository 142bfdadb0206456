//! Configuration-read seam: the overridable persisted-config capability.
//!
//! Generators read their configuration at rest through whatever
//! [`ConfigSource`] is installed on their instance. The default reads the
//! rc file from the working directory; the harness substitutes an in-memory
//! store when a test supplies a mock local config.

use crate::error::ConfigReadError;
use serde_json::Value;
use std::path::PathBuf;

/// Persisted configuration snapshot, keyed by option name.
pub type LocalConfig = serde_json::Map<String, Value>;

/// Name of the rc file a generator's config is persisted under.
pub const RC_FILE: &str = ".genrc.json";

/// Config-read capability installed on a generator instance.
pub trait ConfigSource: Send {
    fn get(&mut self, key: &str) -> Result<Option<Value>, ConfigReadError>;

    /// Everything currently persisted, as one map.
    fn get_all(&mut self) -> Result<LocalConfig, ConfigReadError>;
}

/// Reads `.genrc.json` beneath a directory (the process working directory
/// when none is pinned). A missing file is an empty config, not an error;
/// reads are performed per call so runs observe files seeded mid-setup.
#[derive(Debug, Default)]
pub struct FileConfigSource {
    dir: Option<PathBuf>,
}

impl FileConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the directory the rc file is read from.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn rc_path(&self) -> Result<PathBuf, ConfigReadError> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        Ok(dir.join(RC_FILE))
    }
}

impl ConfigSource for FileConfigSource {
    fn get(&mut self, key: &str) -> Result<Option<Value>, ConfigReadError> {
        Ok(self.get_all()?.get(key).cloned())
    }

    fn get_all(&mut self) -> Result<LocalConfig, ConfigReadError> {
        let path = self.rc_path()?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LocalConfig::new()),
            Err(e) => return Err(e.into()),
        };
        let config: LocalConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }
}
