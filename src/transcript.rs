use async_trait::async_trait;
use log::debug;
use serde::Serialize;

use crate::{Error, Result, Transcript};

/// One caption track a video offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionTrack {
    pub language_code: String,
    pub name: String,
    /// Auto-generated (speech recognition) rather than uploaded captions
    pub generated: bool,
}

/// Source of caption tracks and their content
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// List caption tracks in the order the provider returns them
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>>;

    /// Fetch the transcript for exactly one language code
    async fn fetch(&self, video_id: &str, language_code: &str) -> Result<Transcript>;
}

/// Fetch the transcript for a chosen language and join its text
pub async fn fetch_text(provider: &dyn TranscriptProvider, video_id: &str, language_code: &str) -> Result<String> {
    let transcript = provider.fetch(video_id, language_code).await?;
    non_empty_text(&transcript)
}

/// Fetch a transcript without language negotiation.
///
/// Uses `preferred` when the video has that track, otherwise the first one listed.
pub async fn fetch_default_transcript(
    provider: &dyn TranscriptProvider,
    video_id: &str,
    preferred: Option<&str>,
) -> Result<Transcript> {
    let tracks = provider.list_tracks(video_id).await?;
    let track = preferred
        .and_then(|lang| tracks.iter().find(|t| t.language_code == lang))
        .or_else(|| tracks.first())
        .ok_or_else(|| Error::unavailable(video_id, "no caption tracks"))?;

    debug!("Default caption track for {video_id}: {}", track.language_code);
    provider.fetch(video_id, &track.language_code).await
}

/// Joined transcript text; an empty transcript is treated as unavailable
pub fn non_empty_text(transcript: &Transcript) -> Result<String> {
    let text = transcript.text();
    if text.trim().is_empty() {
        return Err(Error::unavailable(&transcript.video_id, "transcript is empty"));
    }
    Ok(text)
}
