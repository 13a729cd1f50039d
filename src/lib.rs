pub mod config;
pub mod error;
pub mod gemini;
pub mod language;
pub mod output;
pub mod page;
pub mod server;
pub mod summarize;
pub mod transcript;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::{Error, Result};

/// A single captioned segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Transcript of one video in one language
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub language: String,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Segment texts in order, separated by single spaces
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

static WATCH_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|[?&])v=([^&#]*)").unwrap());
static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());
static PATH_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)([a-zA-Z0-9_-]{11})").unwrap()
});

/// Extract the video ID from a YouTube URL.
///
/// The `v=` query parameter wins; short, embed and shorts links and bare
/// 11-character IDs are accepted as well.
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(caps) = WATCH_PARAM.captures(input) {
        let id = &caps[1];
        if id.is_empty() {
            return Err(Error::InvalidInput(format!("empty video id in: {input}")));
        }
        return Ok(id.to_string());
    }

    if BARE_ID.is_match(input) {
        return Ok(input.to_string());
    }

    if let Some(caps) = PATH_ID.captures(input) {
        return Ok(caps[1].to_string());
    }

    Err(Error::InvalidInput(format!("could not extract video ID from: {input}")))
}

/// Thumbnail shown next to a summary
pub fn thumbnail_url(video_id: &str) -> String {
    format!("http://img.youtube.com/vi/{video_id}/0.jpg")
}
