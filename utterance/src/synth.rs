//! Speech synthesis contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for synthesis backends.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("synthesis: failed: {0}")]
    Failed(String),
    #[error("synthesis: timed out after {0:?}")]
    Timeout(Duration),
    #[error("synthesis: invalid response: {0}")]
    InvalidResponse(String),
}

/// A spoken token and the time, in seconds from the start of the audio, at
/// which it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "orth")]
    pub orthography: String,
    #[serde(rename = "endtime")]
    pub end_time: f64,
}

impl Token {
    pub fn new(orthography: impl Into<String>, end_time: f64) -> Self {
        Self {
            orthography: orthography.into(),
            end_time,
        }
    }
}

/// Result of a synthesis request.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// Encoded audio.
    pub audio: Vec<u8>,
    pub tokens: Vec<Token>,
}

/// A speech synthesis backend.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speaks `text` in `language` with `voice`.
    async fn synthesize(
        &self,
        language: &str,
        voice: &str,
        text: &str,
    ) -> Result<Synthesis, SynthesisError>;
}

/// A token with both its start and end time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedToken {
    pub orthography: String,
    pub start_time: f64,
    pub end_time: f64,
}

/// Expand tokens with start times. A token starts where the previous one
/// ends; the first starts at zero.
pub fn timed_tokens(tokens: &[Token]) -> Vec<TimedToken> {
    let mut start_time = 0.0;
    tokens
        .iter()
        .map(|t| {
            let timed = TimedToken {
                orthography: t.orthography.clone(),
                start_time,
                end_time: t.end_time,
            };
            start_time = t.end_time;
            timed
        })
        .collect()
}
