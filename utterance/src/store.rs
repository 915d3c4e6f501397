use std::sync::Arc;

use chrono::{DateTime, Utc};
use recite_blob::BlobStore;
use recite_kv::KVStore;
use tracing::{debug, warn};

use crate::error::UtteranceError;
use crate::keys::{
    SEQ_KEY, audio_path, blob_dir, lookup_prefix, metadata_path, parse_lookup_id, row_key,
    row_keys, validate_component,
};
use crate::types::{BlobKind, Inconsistency, Lookup, Utterance, UtteranceKey, UtteranceRow};

/// Keeps track of utterances in two storage tiers.
///
/// Utterance metadata (page, language, voice, segment hash, time stored) is a
/// row in a [`KVStore`]. Audio and synthesis metadata are two blobs in a
/// [`BlobStore`], at paths derived from the row's surrogate id. The store is
/// agnostic of the actual audio and metadata encodings.
///
/// Nothing coordinates concurrent misses for the same key: both callers may
/// create an utterance and [`find`](Self::find) returns the newest.
pub struct UtteranceStore {
    rows: Arc<dyn KVStore>,
    blobs: Arc<dyn BlobStore>,
    container: String,
}

impl UtteranceStore {
    /// Create a store over the given tiers. Blobs are kept below `container`.
    pub fn new(
        rows: Arc<dyn KVStore>,
        blobs: Arc<dyn BlobStore>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            rows,
            blobs,
            container: container.into(),
        }
    }

    /// Name of the blob container.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Retrieve the utterance for `key`.
    ///
    /// If several utterances share the key, the most recently stored one
    /// wins. With `omit_audio` the audio blob is not read. A row whose blobs
    /// cannot be read is reported as [`Lookup::Inconsistent`] and logged; it
    /// is never returned partially.
    pub fn find(&self, key: &UtteranceKey, omit_audio: bool) -> Result<Lookup, UtteranceError> {
        validate_key(key)?;
        let Some(row) = self.latest_row(key)? else {
            return Ok(Lookup::NotFound);
        };

        let audio = if omit_audio {
            None
        } else {
            match self.read_blob(row.id, BlobKind::Audio) {
                Ok(audio) => Some(audio),
                Err(inconsistency) => return Ok(Lookup::Inconsistent(inconsistency)),
            }
        };

        let metadata = match self.read_blob(row.id, BlobKind::Metadata) {
            Ok(metadata) => metadata,
            Err(inconsistency) => return Ok(Lookup::Inconsistent(inconsistency)),
        };

        Ok(Lookup::Found(row.into_utterance(audio, metadata)))
    }

    /// Store a new utterance.
    ///
    /// The metadata row is written first, then the audio blob, then the
    /// synthesis metadata blob. If a blob cannot be written the error is
    /// returned and the row stays behind without its blobs; lookups report it
    /// as inconsistent until [`reconcile`](Self::reconcile) removes it.
    ///
    /// Until both blobs are written the row looks dangling; `reconcile` only
    /// considers rows older than its cutoff so that it does not race this.
    pub fn create(
        &self,
        key: &UtteranceKey,
        audio: &[u8],
        metadata: &[u8],
    ) -> Result<Utterance, UtteranceError> {
        self.create_at(key, audio, metadata, Utc::now())
    }

    pub(crate) fn create_at(
        &self,
        key: &UtteranceKey,
        audio: &[u8],
        metadata: &[u8],
        stored_at: DateTime<Utc>,
    ) -> Result<Utterance, UtteranceError> {
        validate_key(key)?;

        let id = self.rows.increment(SEQ_KEY)?;
        let row = UtteranceRow::new(id, key, stored_at);
        let data = rmp_serde::to_vec_named(&row)
            .map_err(|e| UtteranceError::Serialization(e.to_string()))?;

        let [row_k, lookup_k, page_k, voice_k] = row_keys(key, id);
        self.rows.batch_set(&[
            (row_k.as_str(), data.as_slice()),
            (lookup_k.as_str(), b"".as_slice()),
            (page_k.as_str(), b"".as_slice()),
            (voice_k.as_str(), b"".as_slice()),
        ])?;

        let dir = blob_dir(&self.container, id);
        for (kind, content) in [(BlobKind::Audio, audio), (BlobKind::Metadata, metadata)] {
            let path = self.blob_path(id, kind);
            let written = self
                .blobs
                .prepare(&dir)
                .and_then(|()| self.blobs.put(&path, content));
            if let Err(e) = written {
                warn!(
                    utterance_id = id,
                    path = %path,
                    error = %e,
                    "utterance: failed to create {kind}, row is left for reconciliation"
                );
                return Err(e.into());
            }
        }

        debug!(utterance_id = id, page_id = key.page_id, "utterance: created");
        Ok(row.into_utterance(Some(audio.to_vec()), metadata.to_vec()))
    }

    /// Newest row for `key`, by time stored and then by id.
    fn latest_row(&self, key: &UtteranceKey) -> Result<Option<UtteranceRow>, UtteranceError> {
        let mut latest: Option<UtteranceRow> = None;
        for (lookup, _) in self.rows.scan(&lookup_prefix(key))? {
            let Some(id) = parse_lookup_id(&lookup) else {
                warn!(key = %lookup, "utterance: unparsable lookup entry");
                continue;
            };
            let Some(row) = self.load_row(id)? else {
                debug!(utterance_id = id, "utterance: lookup entry without row");
                continue;
            };
            let newer = match &latest {
                None => true,
                Some(cur) => (row.stored_at_ms, row.id) > (cur.stored_at_ms, cur.id),
            };
            if newer {
                latest = Some(row);
            }
        }
        Ok(latest)
    }

    pub(crate) fn load_row(&self, id: u64) -> Result<Option<UtteranceRow>, UtteranceError> {
        match self.rows.get(&row_key(id))? {
            Some(data) => rmp_serde::from_slice(&data)
                .map(Some)
                .map_err(|e| UtteranceError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn read_blob(&self, id: u64, kind: BlobKind) -> Result<Vec<u8>, Inconsistency> {
        let path = self.blob_path(id, kind);
        match self.blobs.get(&path) {
            Ok(Some(data)) => Ok(data),
            Ok(None) => {
                warn!(
                    utterance_id = id,
                    path = %path,
                    "utterance: inconsistency, row exists but {kind} does not"
                );
                Err(Inconsistency {
                    utterance_id: id,
                    missing: kind,
                    path,
                })
            }
            Err(e) => {
                warn!(
                    utterance_id = id,
                    path = %path,
                    error = %e,
                    "utterance: inconsistency, row exists but {kind} is unreadable"
                );
                Err(Inconsistency {
                    utterance_id: id,
                    missing: kind,
                    path,
                })
            }
        }
    }

    pub(crate) fn blob_path(&self, id: u64, kind: BlobKind) -> String {
        match kind {
            BlobKind::Audio => audio_path(&self.container, id),
            BlobKind::Metadata => metadata_path(&self.container, id),
        }
    }

    pub(crate) fn rows(&self) -> &dyn KVStore {
        self.rows.as_ref()
    }

    pub(crate) fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }
}

fn validate_key(key: &UtteranceKey) -> Result<(), UtteranceError> {
    if let Some(scope) = &key.scope {
        validate_component("scope", scope).map_err(UtteranceError::InvalidKey)?;
    }
    validate_component("language", &key.language).map_err(UtteranceError::InvalidKey)?;
    validate_component("voice", &key.voice).map_err(UtteranceError::InvalidKey)?;
    validate_component("segment hash", &key.segment_hash).map_err(UtteranceError::InvalidKey)?;
    if key.language.is_empty() || key.voice.is_empty() || key.segment_hash.is_empty() {
        return Err(UtteranceError::InvalidKey(
            "language, voice and segment hash must be set".to_string(),
        ));
    }
    Ok(())
}
