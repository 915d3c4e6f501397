use thiserror::Error;

use crate::synth::SynthesisError;

#[derive(Error, Debug)]
pub enum UtteranceError {
    #[error("utterance: kv error: {0}")]
    KV(#[from] recite_kv::KVError),

    #[error("utterance: blob error: {0}")]
    Blob(#[from] recite_blob::BlobError),

    #[error("utterance: synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("utterance: serialization error: {0}")]
    Serialization(String),

    #[error("utterance: invalid key: {0}")]
    InvalidKey(String),

    #[error("utterance: invalid input: {0}")]
    InvalidInput(String),

    #[error("utterance: input text must not exceed {max} characters, but contained {actual}")]
    InputTooLong { max: usize, actual: usize },

    #[error("utterance: config error: {0}")]
    Config(String),
}
