use thiserror::Error;

use crate::engine::EngineError;

/// The only failure the voice core reports. Every cause originates in the
/// rendering engine; voice bookkeeping stays consistent when it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("audio engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),
}

impl SynthError {
    pub fn engine_error(&self) -> &EngineError {
        match self {
            SynthError::EngineUnavailable(err) => err,
        }
    }
}
