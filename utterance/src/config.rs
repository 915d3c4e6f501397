//! Utterance store configuration.
//!
//! ```yaml
//! container_name: wikispeech_utterances
//! database_path: /var/lib/recite/utterances.redb
//! blob_root: /var/lib/recite/blobs
//! max_input_chars: 5000
//! ttl_days: 31
//! synthesis_timeout_secs: 30
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use recite_blob::FsBlobStore;
use recite_kv::RedbStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::UtteranceError;
use crate::flush::expiration_cutoff;
use crate::generator::{DEFAULT_MAX_INPUT_CHARS, UtteranceGenerator};
use crate::store::UtteranceStore;
use crate::synth::Synthesizer;

/// Default blob container.
pub const DEFAULT_CONTAINER_NAME: &str = "wikispeech_utterances";

/// Default number of days utterances are kept.
pub const DEFAULT_TTL_DAYS: u32 = 31;

/// Name of the blob root below the OS temp dir when none is configured.
const TEMP_BLOB_DIR: &str = "recite";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtteranceConfig {
    /// Blob container holding audio and synthesis metadata.
    pub container_name: String,

    /// Path of the redb file holding metadata rows.
    pub database_path: PathBuf,

    /// Directory for the blob tier. Falls back to the OS temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_root: Option<PathBuf>,

    /// Maximum segment length in characters sent to synthesis, 0 for no limit.
    pub max_input_chars: usize,

    /// Days after which utterances expire.
    pub ttl_days: u32,

    /// Seconds a synthesis request may take, 0 for no limit.
    pub synthesis_timeout_secs: u64,
}

impl Default for UtteranceConfig {
    fn default() -> Self {
        Self {
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            database_path: PathBuf::new(),
            blob_root: None,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            ttl_days: DEFAULT_TTL_DAYS,
            synthesis_timeout_secs: 0,
        }
    }
}

/// Load the configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<UtteranceConfig, UtteranceError> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .map_err(|e| UtteranceError::Config(format!("read {}: {e}", path.display())))?;
    UtteranceConfig::from_yaml(&data)
}

impl UtteranceConfig {
    /// Parse a YAML document. Missing fields take their defaults.
    pub fn from_yaml(data: &str) -> Result<Self, UtteranceError> {
        serde_yaml::from_str(data).map_err(|e| UtteranceError::Config(e.to_string()))
    }

    /// The blob container, falling back to the default when unset.
    pub fn container(&self) -> &str {
        if self.container_name.is_empty() {
            info!(
                container = DEFAULT_CONTAINER_NAME,
                "utterance: no container name configured, using default"
            );
            DEFAULT_CONTAINER_NAME
        } else {
            &self.container_name
        }
    }

    /// The blob root, falling back to a directory in the OS temp dir.
    pub fn blob_root(&self) -> PathBuf {
        match &self.blob_root {
            Some(root) => root.clone(),
            None => {
                let root = std::env::temp_dir().join(TEMP_BLOB_DIR);
                info!(
                    root = %root.display(),
                    "utterance: no blob root configured, using temp dir"
                );
                root
            }
        }
    }

    /// Open a store with a redb metadata tier and a filesystem blob tier.
    pub fn open_store(&self) -> Result<UtteranceStore, UtteranceError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(UtteranceError::Config(
                "database_path must be set".to_string(),
            ));
        }
        let rows = RedbStore::open(&self.database_path)?;
        let blobs = FsBlobStore::open(self.blob_root())?;
        Ok(UtteranceStore::new(
            Arc::new(rows),
            Arc::new(blobs),
            self.container(),
        ))
    }

    /// The synthesis timeout, `None` when unlimited.
    pub fn synthesis_timeout(&self) -> Option<Duration> {
        (self.synthesis_timeout_secs > 0).then(|| Duration::from_secs(self.synthesis_timeout_secs))
    }

    /// Open the store and wrap it in a generator with the configured limits.
    pub fn generator(
        &self,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Result<UtteranceGenerator, UtteranceError> {
        let store = self.open_store()?;
        let generator = UtteranceGenerator::new(Arc::new(store), synthesizer)
            .with_max_input_chars(self.max_input_chars);
        Ok(match self.synthesis_timeout() {
            Some(timeout) => generator.with_timeout(timeout),
            None => generator,
        })
    }

    /// Cutoff for [`UtteranceStore::flush_by_expiration_date`] at `now`.
    pub fn expiration_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        expiration_cutoff(now, self.ttl_days)
    }
}
