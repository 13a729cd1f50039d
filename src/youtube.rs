use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::transcript::{CaptionTrack, TranscriptProvider};
use crate::{Error, Result, Segment, Transcript};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<RawCaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct RawCaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackName {
    #[serde(rename = "simpleText")]
    simple_text: Option<String>,
    runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl RawCaptionTrack {
    fn to_track(&self) -> CaptionTrack {
        let name = self
            .name
            .as_ref()
            .and_then(|n| {
                n.simple_text.clone().or_else(|| {
                    n.runs
                        .as_ref()
                        .map(|runs| runs.iter().map(|r| r.text.as_str()).collect::<String>())
                })
            })
            .unwrap_or_else(|| self.language_code.clone());

        CaptionTrack {
            language_code: self.language_code.clone(),
            name,
            generated: self.kind.as_deref() == Some("asr"),
        }
    }
}

/// What the player endpoint tells us about one video
struct PlayerInfo {
    title: String,
    tracks: Vec<RawCaptionTrack>,
}

/// Caption tracks from YouTube's InnerTube player API
#[derive(Clone)]
pub struct YouTubeClient {
    client: reqwest::Client,
    hl: String,
}

impl YouTubeClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            hl: "en".to_string(),
        }
    }

    /// Interface language sent to InnerTube; affects track names only
    pub fn with_interface_language(mut self, hl: impl Into<String>) -> Self {
        self.hl = hl.into();
        self
    }

    async fn player(&self, video_id: &str) -> Result<PlayerInfo> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Fetching watch page: {watch_url}");

        let page_html = self
            .client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": self.hl,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        player_info(video_id, resp)
    }
}

fn player_info(video_id: &str, resp: InnerTubePlayerResponse) -> Result<PlayerInfo> {
    if let Some(status) = &resp.playability_status {
        let state = status.status.as_deref().unwrap_or("OK");
        if state != "OK" {
            let reason = status.reason.clone().unwrap_or_else(|| state.to_lowercase());
            return Err(Error::unavailable(video_id, format!("video is unplayable: {reason}")));
        }
    }

    let title = resp
        .video_details
        .as_ref()
        .and_then(|vd| vd.title.clone())
        .unwrap_or_default();

    let tracks = resp
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(Error::unavailable(video_id, "subtitles are disabled for this video"));
    }

    Ok(PlayerInfo { title, tracks })
}

#[async_trait]
impl TranscriptProvider for YouTubeClient {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let info = self.player(video_id).await?;
        Ok(info.tracks.iter().map(RawCaptionTrack::to_track).collect())
    }

    async fn fetch(&self, video_id: &str, language_code: &str) -> Result<Transcript> {
        let info = self.player(video_id).await?;

        let track = info
            .tracks
            .iter()
            .find(|t| t.language_code == language_code)
            .ok_or_else(|| {
                let available = info
                    .tracks
                    .iter()
                    .map(|t| t.language_code.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Error::unavailable(
                    video_id,
                    format!("no transcript in language {language_code} (available: {available})"),
                )
            })?;

        debug!("Using caption track: lang={}", track.language_code);

        // Step 3: Fetch the caption XML
        let caption_xml = self
            .client
            .get(&track.base_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_caption_xml(&caption_xml)?;

        Ok(Transcript {
            video_id: video_id.to_string(),
            title: info.title,
            language: track.language_code.clone(),
            segments,
        })
    }
}

fn extract_api_key(html: &str) -> Result<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).map_err(|e| Error::Upstream(e.to_string()))?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).map_err(|e| Error::Upstream(e.to_string()))?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    Err(Error::Upstream("could not extract InnerTube API key from watch page".to_string()))
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current: Option<(f64, f64)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok(),
                        b"dur" => dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok(),
                        _ => {}
                    }
                }
                // Some tracks omit dur on the last cue
                current = start.map(|s| (s, dur.unwrap_or(0.0)));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((start, duration)) = current.take() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).trim().to_string();
                    if !text.is_empty() {
                        segments.push(Segment { text, start, duration });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Upstream(format!("error parsing caption XML: {e}"))),
            _ => {}
        }
    }

    Ok(segments)
}
