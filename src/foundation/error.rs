pub type MemeResult<T> = Result<T, MemeError>;

#[derive(thiserror::Error, Debug)]
pub enum MemeError {
    #[error("validation error: {0}")]
    Validation(String),

    /// The rendering surface cannot measure text (no font, shaping failure).
    #[error("measurement unavailable: {0}")]
    MeasurementUnavailable(String),

    /// The animation sink could not be opened, written or finalized.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("topic source unavailable: {0}")]
    TopicSourceUnavailable(String),

    #[error("all topics exhausted: {0}")]
    AllTopicsExhausted(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MemeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn measurement(msg: impl Into<String>) -> Self {
        Self::MeasurementUnavailable(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn topic_source(msg: impl Into<String>) -> Self {
        Self::TopicSourceUnavailable(msg.into())
    }

    pub fn exhausted(msg: impl Into<String>) -> Self {
        Self::AllTopicsExhausted(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
