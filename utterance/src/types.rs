use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identifies the utterance of one segment of one page.
///
/// Hash equality does not imply key equality: the same sentence on two pages
/// gives two utterances.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UtteranceKey {
    /// Consumer the request originates from. `None` for local pages.
    pub scope: Option<String>,
    pub page_id: u64,
    /// ISO 639 language code.
    pub language: String,
    /// Name of the synthesis voice.
    pub voice: String,
    /// Hash of the segment the utterance speaks.
    pub segment_hash: String,
}

/// A stored synthesis result.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Surrogate id assigned by the metadata tier; addresses the blobs.
    pub id: u64,
    pub scope: Option<String>,
    pub page_id: u64,
    pub language: String,
    pub voice: String,
    pub segment_hash: String,
    pub stored_at: DateTime<Utc>,
    /// Utterance audio. `None` when the lookup omitted audio.
    pub audio: Option<Vec<u8>>,
    /// Serialized synthesis metadata (tokens with timings).
    pub metadata: Vec<u8>,
}

impl Utterance {
    /// The logical key of this utterance.
    pub fn key(&self) -> UtteranceKey {
        UtteranceKey {
            scope: self.scope.clone(),
            page_id: self.page_id,
            language: self.language.clone(),
            voice: self.voice.clone(),
            segment_hash: self.segment_hash.clone(),
        }
    }
}

/// Metadata row as persisted in the KV tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UtteranceRow {
    #[serde(rename = "id")]
    pub id: u64,

    #[serde(rename = "scope", default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(rename = "page")]
    pub page_id: u64,

    #[serde(rename = "lang")]
    pub language: String,

    #[serde(rename = "voice")]
    pub voice: String,

    #[serde(rename = "hash")]
    pub segment_hash: String,

    /// Unix timestamp in milliseconds.
    #[serde(rename = "ts")]
    pub stored_at_ms: i64,
}

impl UtteranceRow {
    pub fn new(id: u64, key: &UtteranceKey, stored_at: DateTime<Utc>) -> Self {
        Self {
            id,
            scope: key.scope.clone(),
            page_id: key.page_id,
            language: key.language.clone(),
            voice: key.voice.clone(),
            segment_hash: key.segment_hash.clone(),
            stored_at_ms: stored_at.timestamp_millis(),
        }
    }

    pub fn key(&self) -> UtteranceKey {
        UtteranceKey {
            scope: self.scope.clone(),
            page_id: self.page_id,
            language: self.language.clone(),
            voice: self.voice.clone(),
            segment_hash: self.segment_hash.clone(),
        }
    }

    pub fn stored_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.stored_at_ms)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn into_utterance(self, audio: Option<Vec<u8>>, metadata: Vec<u8>) -> Utterance {
        let stored_at = self.stored_at();
        Utterance {
            id: self.id,
            scope: self.scope,
            page_id: self.page_id,
            language: self.language,
            voice: self.voice,
            segment_hash: self.segment_hash,
            stored_at,
            audio,
            metadata,
        }
    }
}

/// Which of the two blobs of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    Audio,
    Metadata,
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobKind::Audio => write!(f, "audio file"),
            BlobKind::Metadata => write!(f, "synthesis metadata file"),
        }
    }
}

/// A metadata row whose blob could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inconsistency {
    pub utterance_id: u64,
    pub missing: BlobKind,
    pub path: String,
}

/// Outcome of a store lookup.
///
/// [`Lookup::Inconsistent`] means a row exists but its blobs do not; callers
/// should handle it like [`Lookup::NotFound`]. Repair is left to
/// [`UtteranceStore::reconcile`](crate::UtteranceStore::reconcile).
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Utterance),
    NotFound,
    Inconsistent(Inconsistency),
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// The utterance, if one was found.
    pub fn found(self) -> Option<Utterance> {
        match self {
            Lookup::Found(u) => Some(u),
            _ => None,
        }
    }
}
