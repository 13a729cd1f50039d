use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ytsum::summarize::{FailureKind, GenerateFailure, Sleeper, TextGenerator};
use ytsum::transcript::{CaptionTrack, TranscriptProvider};
use ytsum::{Error, Segment, Transcript};

/// Videos keyed by id, each with tracks in provider order
#[derive(Default, Clone)]
pub struct MockProvider {
    pub videos: HashMap<String, Vec<(String, Vec<String>)>>,
    /// Codes listed for a video whose content can no longer be fetched
    pub vanished: HashMap<String, Vec<String>>,
}

impl MockProvider {
    pub fn with_video(mut self, video_id: &str, tracks: Vec<(&str, Vec<&str>)>) -> Self {
        let tracks = tracks
            .into_iter()
            .map(|(code, texts)| (code.to_string(), texts.into_iter().map(String::from).collect()))
            .collect();
        self.videos.insert(video_id.to_string(), tracks);
        self
    }

    /// List `code` for `video_id` but refuse to fetch it
    pub fn with_vanished_track(mut self, video_id: &str, code: &str) -> Self {
        self.vanished
            .entry(video_id.to_string())
            .or_default()
            .push(code.to_string());
        self
    }

    fn tracks(&self, video_id: &str) -> ytsum::Result<&Vec<(String, Vec<String>)>> {
        let tracks = self
            .videos
            .get(video_id)
            .ok_or_else(|| Error::unavailable(video_id, "video is unplayable: Video unavailable"))?;
        if tracks.is_empty() {
            return Err(Error::unavailable(video_id, "subtitles are disabled for this video"));
        }
        Ok(tracks)
    }
}

#[async_trait]
impl TranscriptProvider for MockProvider {
    async fn list_tracks(&self, video_id: &str) -> ytsum::Result<Vec<CaptionTrack>> {
        let vanished = self.vanished.get(video_id).into_iter().flatten();
        Ok(self
            .tracks(video_id)?
            .iter()
            .map(|(code, _)| code)
            .chain(vanished)
            .map(|code| CaptionTrack {
                language_code: code.clone(),
                name: code.clone(),
                generated: false,
            })
            .collect())
    }

    async fn fetch(&self, video_id: &str, language_code: &str) -> ytsum::Result<Transcript> {
        let (code, texts) = self
            .tracks(video_id)?
            .iter()
            .find(|(code, _)| code == language_code)
            .ok_or_else(|| Error::unavailable(video_id, format!("no transcript in language {language_code}")))?;

        Ok(Transcript {
            video_id: video_id.to_string(),
            title: format!("Video {video_id}"),
            language: code.clone(),
            segments: texts
                .iter()
                .enumerate()
                .map(|(i, text)| Segment {
                    text: text.clone(),
                    start: i as f64 * 2.0,
                    duration: 2.0,
                })
                .collect(),
        })
    }
}

/// Replies in order; records every prompt
#[derive(Clone)]
pub struct MockGenerator {
    replies: Arc<Mutex<Vec<Result<String, GenerateFailure>>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerator {
    pub fn new(mut replies: Vec<Result<String, GenerateFailure>>) -> Self {
        replies.reverse();
        Self {
            replies: Arc::new(Mutex::new(replies)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn summary(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn rate_limited(times: usize) -> Self {
        Self::new(
            (0..times)
                .map(|_| Err(GenerateFailure::new(FailureKind::RateLimited, "Quota exceeded")))
                .collect(),
        )
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateFailure> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(GenerateFailure::new(FailureKind::Other, "no scripted reply")))
    }

    fn model(&self) -> &str {
        "mock-gemini"
    }
}

#[derive(Default, Clone)]
pub struct MockSleeper {
    pub waits: Arc<Mutex<Vec<Duration>>>,
}

#[async_trait]
impl Sleeper for MockSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}
