//! Utterance cache for synthesized speech.
//!
//! An utterance is the synthesized audio of one [`Segment`](recite_segment::Segment)
//! together with its token timings. [`UtteranceStore`] keeps utterances in two
//! tiers: a metadata row in a [`KVStore`](recite_kv::KVStore) and two blobs
//! (audio and synthesis metadata) in a [`BlobStore`](recite_blob::BlobStore).
//! [`UtteranceGenerator`] serves utterances from the store and synthesizes
//! missing ones through a [`Synthesizer`].
//!
//! Stores are flushed per page, per language and voice, or by age. Rows left
//! without blobs by an interrupted write are removed with
//! [`UtteranceStore::reconcile`], blobs left without rows with
//! [`UtteranceStore::flush_orphaned_blobs`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use recite_blob::MemoryBlobStore;
//! use recite_kv::MemoryStore;
//! use recite_utterance::{UtteranceKey, UtteranceStore};
//!
//! let store = UtteranceStore::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryBlobStore::new()),
//!     "wikispeech_utterances",
//! );
//! let key = UtteranceKey {
//!     scope: None,
//!     page_id: 1,
//!     language: "en".into(),
//!     voice: "anna".into(),
//!     segment_hash: "1234".into(),
//! };
//! store.create(&key, b"audio", b"[]").unwrap();
//! let found = store.find(&key, false).unwrap().found().unwrap();
//! assert_eq!(found.audio.as_deref(), Some(b"audio".as_slice()));
//!
//! assert_eq!(store.flush_by_page(1).unwrap(), 1);
//! assert!(!store.find(&key, false).unwrap().is_found());
//! ```

mod config;
mod error;
mod flush;
mod generator;
pub mod keys;
mod store;
mod synth;
mod types;

pub use config::{DEFAULT_CONTAINER_NAME, DEFAULT_TTL_DAYS, UtteranceConfig, load_config};
pub use error::UtteranceError;
pub use flush::expiration_cutoff;
pub use generator::{DEFAULT_MAX_INPUT_CHARS, SpokenSegment, UtteranceGenerator};
pub use store::UtteranceStore;
pub use synth::{SynthesisError, Synthesis, Synthesizer, TimedToken, Token, timed_tokens};
pub use types::{BlobKind, Inconsistency, Lookup, Utterance, UtteranceKey};
