//! Engine error type.

use thiserror::Error;

/// Errors surfaced by the soundscape engine.
///
/// Unknown sound types are not errors: they degrade to a silent recipe.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No realtime output device could be opened.
    #[error("audio backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The output device was found but its stream could not be built or started.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// Another offline render is still running. Retry once it finishes.
    #[error("a render is already in progress")]
    RenderInProgress,

    /// The offline render did not produce the expected audio.
    #[error("render failed: {0}")]
    Render(String),

    #[error("wav encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// The config parsed but a value is out of range.
    #[error("invalid config value: {0}")]
    ConfigValue(String),

    #[error("invalid sound spec: {0}")]
    Spec(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether repeating the same request later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::RenderInProgress)
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
