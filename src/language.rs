use std::collections::HashMap;

use isolang::Language;
use log::debug;

use crate::transcript::{CaptionTrack, TranscriptProvider};
use crate::{Error, Result};

/// Human-readable name for a caption language code.
///
/// The primary subtag is looked up in ISO 639; remaining subtags (region,
/// script) are kept verbatim in parentheses. Codes ISO 639 does not know are
/// shown as-is.
pub fn display_name(code: &str) -> String {
    let mut parts = code.split(['-', '_']);
    let primary = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.filter(|p| !p.is_empty()).collect();

    let Some(name) = lookup(primary) else {
        return code.to_string();
    };

    if rest.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({})", rest.join(", "))
    }
}

fn lookup(primary: &str) -> Option<&'static str> {
    let primary = primary.to_ascii_lowercase();
    let language = match primary.len() {
        2 => Language::from_639_1(legacy_alias(&primary)),
        3 => Language::from_639_3(&primary),
        _ => None,
    }?;
    Some(language.to_name())
}

/// Deprecated ISO 639-1 codes YouTube still serves
fn legacy_alias(code: &str) -> &str {
    match code {
        "iw" => "he",
        "in" => "id",
        "ji" => "yi",
        "jw" => "jv",
        other => other,
    }
}

/// Languages a video offers, keyed by display name
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    names: Vec<String>,
    codes: HashMap<String, String>,
}

impl LanguageTable {
    /// Build from tracks in provider order.
    ///
    /// Several codes can share a display name; the last one listed keeps it.
    pub fn from_tracks(tracks: &[CaptionTrack]) -> Self {
        let mut table = LanguageTable::default();
        for track in tracks {
            let name = display_name(&track.language_code);
            if !table.codes.contains_key(&name) {
                table.names.push(name.clone());
            }
            table.codes.insert(name, track.language_code.clone());
        }
        table
    }

    /// Distinct display names, in order of first appearance
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Language code behind a display name
    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.codes.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// List a video's caption languages
pub async fn resolve_languages(provider: &dyn TranscriptProvider, video_id: &str) -> Result<LanguageTable> {
    let tracks = provider.list_tracks(video_id).await?;
    if tracks.is_empty() {
        return Err(Error::unavailable(video_id, "no caption tracks"));
    }
    debug!("{} caption tracks for {video_id}", tracks.len());
    Ok(LanguageTable::from_tracks(&tracks))
}
