//! Snapshot persistence primitives.
//!
//! Documents are stored as pretty-printed JSON tagged with a schema
//! `version`. Writes go to a temporary sibling file that is renamed over the
//! target, so readers never observe a half-written snapshot.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Schema version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("deserialization error at {path}: {message}")]
    Deserialization { path: PathBuf, message: String },
    #[error("incompatible snapshot version {found} at {path}, expected {expected}")]
    IncompatibleVersion {
        path: PathBuf,
        expected: u32,
        found: u32,
    },
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn deserialization(path: &Path, err: impl ToString) -> Self {
        Self::Deserialization {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Environment-driven snapshot settings.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SnapshotSettings {
    pub path: Option<PathBuf>,
}

impl SnapshotSettings {
    pub const ENV_KEY: &'static str = "EMPLOYEE_SNAPSHOT_PATH";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = lookup(Self::ENV_KEY)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self { path }
    }

    /// Snapshot handle for the configured path, if any.
    pub fn open(&self) -> Option<JsonSnapshot> {
        self.path.as_ref().map(JsonSnapshot::new)
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// A versioned JSON document on disk.
#[derive(Clone, Debug)]
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Read the document; a missing file yields `None`.
    pub async fn load<T: DeserializeOwned>(&self) -> SnapshotResult<Option<T>> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(SnapshotError::io(&self.path, err)),
        };
        let probe: VersionProbe = serde_json::from_slice(&raw)
            .map_err(|err| SnapshotError::deserialization(&self.path, err))?;
        if probe.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::IncompatibleVersion {
                path: self.path.clone(),
                expected: SNAPSHOT_VERSION,
                found: probe.version,
            });
        }
        let envelope: Envelope<T> = serde_json::from_slice(&raw)
            .map_err(|err| SnapshotError::deserialization(&self.path, err))?;
        debug!(path = %self.path.display(), "snapshot loaded");
        Ok(Some(envelope.body))
    }

    /// Replace the document with `body`.
    pub async fn save<T: Serialize>(&self, body: &T) -> SnapshotResult<()> {
        let content = serde_json::to_vec_pretty(&Envelope {
            version: SNAPSHOT_VERSION,
            body,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| SnapshotError::io(parent, err))?;
        }
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, &content)
            .await
            .map_err(|err| SnapshotError::io(&tmp_path, err))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|err| SnapshotError::io(&self.path, err))?;
        debug!(path = %self.path.display(), bytes = content.len(), "snapshot saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
