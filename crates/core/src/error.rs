/// Result alias that carries the custom [`BeatlineError`] type.
pub type Result<T> = std::result::Result<T, BeatlineError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum BeatlineError {
    /// A caller handed the engine something it cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The WAV decoder rejected a file.
    #[error("wav decoding failed: {0}")]
    Wav(#[from] hound::Error),
    /// A configuration or hit-object document could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The hit-object sequence breaks an ordering or shape invariant.
    #[error("invalid timeline: {0}")]
    InvalidTimeline(String),
    /// The music stream refused to move to the requested position. Nothing
    /// else was modified when this is returned.
    #[error("cannot seek to {target:.3}s: {reason}")]
    Seek { target: f64, reason: String },
    /// The audio output device could not be opened or driven.
    #[error("audio device error: {0}")]
    Device(String),
    /// A lock shared with the audio callback was poisoned by a panic.
    #[error("{0} has been poisoned")]
    Poisoned(&'static str),
}

impl BeatlineError {
    /// Builds an [`BeatlineError::InvalidTimeline`] from any displayable reason.
    pub fn timeline<T: Into<String>>(reason: T) -> Self {
        Self::InvalidTimeline(reason.into())
    }

    /// True for failures that leave the session usable (only seeks so far).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Seek { .. })
    }
}
