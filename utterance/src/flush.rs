//! Batch removal of utterances.
//!
//! Every flush selects metadata rows and then handles each row on its own:
//! delete the row, the audio blob and the synthesis metadata blob, in that
//! order. A row only counts as flushed when all three deletions succeed. A
//! failed or missing deletion is logged and processing moves on to the next
//! row, so a flush can be interrupted and run again at any time.

use chrono::{DateTime, Duration, Utc};
use recite_blob::BlobError;
use tracing::{debug, info, warn};

use crate::error::UtteranceError;
use crate::keys::{
    ROW_PREFIX, blob_dir, page_index_prefix, parse_blob_id, parse_lookup_id, row_key, row_keys,
    validate_component, voice_index_prefix,
};
use crate::store::UtteranceStore;
use crate::types::{BlobKind, UtteranceRow};

/// Per-tier result of flushing one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowFlush {
    row: bool,
    audio: bool,
    metadata: bool,
}

impl RowFlush {
    fn complete(&self) -> bool {
        self.row && self.audio && self.metadata
    }
}

/// The time before which utterances are considered expired.
pub fn expiration_cutoff(now: DateTime<Utc>, ttl_days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(ttl_days))
}

impl UtteranceStore {
    /// Flush all utterances of a page, in every scope.
    pub fn flush_by_page(&self, page_id: u64) -> Result<usize, UtteranceError> {
        let rows = self.select_indexed(&page_index_prefix(page_id))?;
        Ok(self.flush_rows("page", &rows))
    }

    /// Flush all utterances in `language`, limited to `voice` if given.
    pub fn flush_by_language_and_voice(
        &self,
        language: &str,
        voice: Option<&str>,
    ) -> Result<usize, UtteranceError> {
        validate_component("language", language).map_err(UtteranceError::InvalidKey)?;
        if let Some(voice) = voice {
            validate_component("voice", voice).map_err(UtteranceError::InvalidKey)?;
        }
        let rows = self.select_indexed(&voice_index_prefix(language, voice))?;
        Ok(self.flush_rows("language and voice", &rows))
    }

    /// Flush all utterances stored at or before `cutoff`.
    ///
    /// There is no index on the time stored, so this decodes every row.
    pub fn flush_by_expiration_date(&self, cutoff: DateTime<Utc>) -> Result<usize, UtteranceError> {
        let cutoff_ms = cutoff.timestamp_millis();
        let rows = self.select_rows(|row| row.stored_at_ms <= cutoff_ms)?;
        Ok(self.flush_rows("expiration date", &rows))
    }

    /// Remove rows stored at or before `cutoff` that lost one of their blobs,
    /// e.g. after a failed create.
    ///
    /// Newer rows may belong to a create that has not written its blobs yet,
    /// so the cutoff should lie well before any create still in progress. A
    /// row whose blobs cannot be checked is logged and kept.
    ///
    /// Returns the number of dangling rows removed from the metadata tier.
    /// The remaining blob of such a row is removed as well.
    pub fn reconcile(&self, cutoff: DateTime<Utc>) -> Result<usize, UtteranceError> {
        let cutoff_ms = cutoff.timestamp_millis();
        let mut removed = 0;
        for row in self.select_rows(|row| row.stored_at_ms <= cutoff_ms)? {
            match self.blob_missing(&row) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(utterance_id = row.id, error = %e, "utterance: unable to check blobs, row kept");
                    continue;
                }
            }
            warn!(utterance_id = row.id, "utterance: removing dangling row");
            if self.flush_row(&row).row {
                removed += 1;
            }
        }
        info!(removed, "utterance: reconciliation finished");
        Ok(removed)
    }

    /// Delete blobs without a metadata row, last modified at or before
    /// `cutoff`. Files in the container that were not written by this store
    /// are left alone.
    ///
    /// Returns the number of blobs deleted.
    pub fn flush_orphaned_blobs(&self, cutoff: DateTime<Utc>) -> Result<usize, UtteranceError> {
        let mut removed = 0;
        for blob in self.blobs().list(self.container())? {
            if blob.modified > cutoff {
                continue;
            }
            let Some(id) = parse_blob_id(&blob.path) else {
                continue;
            };
            match self.rows().get(&row_key(id)) {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %blob.path, error = %e, "utterance: unable to look up row, blob kept");
                    continue;
                }
            }
            match self.blobs().delete(&blob.path) {
                Ok(true) => {
                    debug!(path = %blob.path, "utterance: flushed orphaned blob");
                    self.clean_dir(id);
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => warn!(path = %blob.path, error = %e, "utterance: unable to delete orphaned blob"),
            }
        }
        info!(removed, "utterance: orphaned blob flush finished");
        Ok(removed)
    }

    fn flush_rows(&self, criterion: &str, rows: &[UtteranceRow]) -> usize {
        let flushed = rows.iter().filter(|row| self.flush_row(row).complete()).count();
        info!(criterion, selected = rows.len(), flushed, "utterance: flush finished");
        flushed
    }

    /// Rows referenced by the index entries below `prefix`. Entries without
    /// a readable row are logged and skipped.
    fn select_indexed(&self, prefix: &str) -> Result<Vec<UtteranceRow>, UtteranceError> {
        let mut rows = Vec::new();
        for (entry, _) in self.rows().scan(prefix)? {
            let Some(id) = parse_lookup_id(&entry) else {
                warn!(key = %entry, "utterance: unparsable index entry");
                continue;
            };
            match self.load_row(id) {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => debug!(utterance_id = id, "utterance: index entry without row"),
                Err(e) => warn!(utterance_id = id, error = %e, "utterance: unreadable row skipped"),
            }
        }
        Ok(rows)
    }

    /// Every row matching `matches`. Rows that cannot be decoded are logged
    /// and skipped rather than failing the whole batch.
    fn select_rows<F>(&self, matches: F) -> Result<Vec<UtteranceRow>, UtteranceError>
    where
        F: Fn(&UtteranceRow) -> bool,
    {
        let mut rows = Vec::new();
        for (key, data) in self.rows().scan(ROW_PREFIX)? {
            match rmp_serde::from_slice::<UtteranceRow>(&data) {
                Ok(row) if matches(&row) => rows.push(row),
                Ok(_) => {}
                Err(e) => warn!(key = %key, error = %e, "utterance: undecodable row skipped"),
            }
        }
        Ok(rows)
    }

    fn flush_row(&self, row: &UtteranceRow) -> RowFlush {
        let keys = row_keys(&row.key(), row.id);
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        let row_deleted = match self.rows().batch_delete(&keys) {
            Ok(()) => {
                debug!(utterance_id = row.id, "utterance: flushed row");
                true
            }
            Err(e) => {
                warn!(utterance_id = row.id, error = %e, "utterance: failed to delete row");
                false
            }
        };

        RowFlush {
            row: row_deleted,
            audio: self.delete_blob(row.id, BlobKind::Audio),
            metadata: self.delete_blob(row.id, BlobKind::Metadata),
        }
    }

    /// Whether the audio or the metadata blob of `row` does not exist.
    fn blob_missing(&self, row: &UtteranceRow) -> Result<bool, BlobError> {
        for kind in [BlobKind::Audio, BlobKind::Metadata] {
            if !self.blobs().exists(&self.blob_path(row.id, kind))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn delete_blob(&self, id: u64, kind: BlobKind) -> bool {
        let path = self.blob_path(id, kind);
        match self.blobs().delete(&path) {
            Ok(true) => {
                debug!(utterance_id = id, path = %path, "utterance: flushed {kind}");
                self.clean_dir(id);
                true
            }
            Ok(false) => {
                warn!(utterance_id = id, path = %path, "utterance: attempted to delete non existing {kind}");
                false
            }
            Err(e) => {
                warn!(utterance_id = id, path = %path, error = %e, "utterance: unable to delete {kind}");
                false
            }
        }
    }

    fn clean_dir(&self, id: u64) {
        let dir = blob_dir(self.container(), id);
        if let Err(e) = self.blobs().clean(&dir) {
            debug!(dir = %dir, error = %e, "utterance: unable to clean blob directory");
        }
    }
}
