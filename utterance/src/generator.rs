use std::sync::Arc;
use std::time::Duration;

use recite_segment::Segment;
use tracing::{debug, info};

use crate::error::UtteranceError;
use crate::store::UtteranceStore;
use crate::synth::{Synthesis, SynthesisError, Synthesizer, Token};
use crate::types::{Lookup, UtteranceKey};

/// Default maximum number of characters sent to the synthesizer.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 5000;

/// Audio and token timings for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SpokenSegment {
    pub audio: Vec<u8>,
    pub tokens: Vec<Token>,
}

/// Serves utterances from the store, synthesizing and storing them on a miss.
pub struct UtteranceGenerator {
    store: Arc<UtteranceStore>,
    synthesizer: Arc<dyn Synthesizer>,
    max_input_chars: usize,
    timeout: Option<Duration>,
}

impl UtteranceGenerator {
    pub fn new(store: Arc<UtteranceStore>, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            store,
            synthesizer,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            timeout: None,
        }
    }

    /// Limit the segment length accepted for synthesis. 0 disables the limit.
    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    /// Give up on synthesis requests taking longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &Arc<UtteranceStore> {
        &self.store
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Audio and tokens for `segment` on page `page_id`.
    ///
    /// A stored utterance is returned as is. Otherwise the segment text is
    /// synthesized and the result stored before it is returned. An
    /// inconsistent stored utterance is treated as missing and replaced by a
    /// new one.
    pub async fn get_or_synthesize(
        &self,
        scope: Option<&str>,
        page_id: u64,
        language: &str,
        voice: &str,
        segment: &Segment,
    ) -> Result<SpokenSegment, UtteranceError> {
        let text = segment.text();
        if text.trim().is_empty() {
            return Err(UtteranceError::InvalidInput(
                "segment has no text".to_string(),
            ));
        }

        let key = UtteranceKey {
            scope: scope.map(str::to_string),
            page_id,
            language: language.to_string(),
            voice: voice.to_string(),
            segment_hash: segment.hash(),
        };

        match self.store.find(&key, false)? {
            Lookup::Found(utterance) => {
                debug!(
                    utterance_id = utterance.id,
                    hash = %key.segment_hash,
                    "utterance: found stored utterance"
                );
                let tokens = decode_tokens(&utterance.metadata)?;
                return Ok(SpokenSegment {
                    audio: utterance.audio.unwrap_or_default(),
                    tokens,
                });
            }
            Lookup::Inconsistent(inconsistency) => {
                info!(
                    utterance_id = inconsistency.utterance_id,
                    "utterance: stored utterance is inconsistent, synthesizing again"
                );
            }
            Lookup::NotFound => {}
        }

        let actual = text.chars().count();
        if self.max_input_chars > 0 && actual > self.max_input_chars {
            return Err(UtteranceError::InputTooLong {
                max: self.max_input_chars,
                actual,
            });
        }

        let synthesis = self.synthesize(language, voice, &text).await?;
        let metadata = serde_json::to_vec(&synthesis.tokens)
            .map_err(|e| UtteranceError::Serialization(e.to_string()))?;
        let utterance = self.store.create(&key, &synthesis.audio, &metadata)?;
        debug!(
            utterance_id = utterance.id,
            hash = %key.segment_hash,
            "utterance: synthesized and stored"
        );

        Ok(SpokenSegment {
            audio: synthesis.audio,
            tokens: synthesis.tokens,
        })
    }

    async fn synthesize(
        &self,
        language: &str,
        voice: &str,
        text: &str,
    ) -> Result<Synthesis, SynthesisError> {
        let request = self.synthesizer.synthesize(language, voice, text);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| SynthesisError::Timeout(limit))?,
            None => request.await,
        }
    }
}

fn decode_tokens(metadata: &[u8]) -> Result<Vec<Token>, UtteranceError> {
    serde_json::from_slice(metadata).map_err(|e| UtteranceError::Serialization(e.to_string()))
}
