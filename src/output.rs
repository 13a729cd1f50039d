use crate::Transcript;
use crate::language::LanguageTable;

/// Render transcript as plain text (one segment per line, no timestamps)
pub fn render_text(transcript: &Transcript) -> String {
    transcript
        .segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render transcript segments as pretty JSON
pub fn render_json(transcript: &Transcript) -> String {
    serde_json::to_string_pretty(transcript).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// One `name<TAB>code` line per language
pub fn render_languages(table: &LanguageTable) -> String {
    table
        .names()
        .iter()
        .map(|name| format!("{name}\t{}", table.code_for(name).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n")
}
