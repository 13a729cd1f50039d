use thiserror::Error;

/// Everything that can go wrong between a user-supplied URL and a summary
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no transcript available for video {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("summarization rate limit still exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl Error {
    pub fn unavailable(video_id: &str, reason: impl Into<String>) -> Self {
        Error::TranscriptUnavailable {
            video_id: video_id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upstream(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
