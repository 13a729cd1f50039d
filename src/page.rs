//! Server-rendered page: paste a link, pick a caption language, read the summary.

use axum::{
    extract::{Query, State},
    response::Html,
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use log::error;
use serde::Deserialize;

use crate::language::{self, LanguageTable};
use crate::server::AppState;
use crate::{Error, Result, extract_video_id, thumbnail_url, transcript};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub url: Option<String>,
    /// Display name picked from the language list
    pub lang: Option<String>,
}

/// What the page shows below the form
enum Body {
    Empty,
    Message(String),
    Summary { video_id: String, result: Result<String> },
}

pub async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Html<String> {
    let url = query.url.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let Some(url) = url else {
        return Html(render(None, None, None, Body::Empty));
    };

    let video_id = match extract_video_id(url) {
        Ok(id) => id,
        Err(e) => return Html(render(Some(url), None, None, Body::Message(e.to_string()))),
    };

    let languages = match language::resolve_languages(state.provider.as_ref(), &video_id).await {
        Ok(table) => table,
        Err(e) => {
            error!("language lookup for {video_id} failed: {e}");
            return Html(render(Some(url), None, None, Body::Message(e.to_string())));
        }
    };

    let selected = query.lang.as_deref();
    let body = match selected {
        Some(name) => Body::Summary {
            result: summarize_in(&state, &languages, &video_id, name).await,
            video_id,
        },
        None => Body::Empty,
    };

    Html(render(Some(url), Some(&languages), selected, body))
}

async fn summarize_in(state: &AppState, languages: &LanguageTable, video_id: &str, name: &str) -> Result<String> {
    let code = languages
        .code_for(name)
        .ok_or_else(|| Error::InvalidInput(format!("language '{name}' is not available for this video")))?;
    let text = transcript::fetch_text(state.provider.as_ref(), video_id, code)
        .await
        .inspect_err(|e| error!("transcript {code} for {video_id} failed: {e}"))?;
    state
        .summarizer
        .summarize(&text)
        .await
        .inspect_err(|e| error!("summary for {video_id} failed: {e}"))
}

fn render(url: Option<&str>, languages: Option<&LanguageTable>, selected: Option<&str>, body: Body) -> String {
    let mut form = format!(
        r#"<form method="get" action="/">
<label>Enter YouTube Video Link <input type="text" name="url" size="60" value="{}"></label>
"#,
        encode_double_quoted_attribute(url.unwrap_or_default())
    );

    match languages {
        Some(table) => {
            form.push_str("<label>Select Transcript Language <select name=\"lang\">\n");
            for name in table.names() {
                let attr = if Some(name.as_str()) == selected { " selected" } else { "" };
                form.push_str(&format!(
                    "<option value=\"{}\"{attr}>{}</option>\n",
                    encode_double_quoted_attribute(name),
                    encode_text(name)
                ));
            }
            form.push_str("</select></label>\n<button type=\"submit\">Submit</button>\n");
        }
        None => form.push_str("<button type=\"submit\">Load languages</button>\n"),
    }
    form.push_str("</form>\n");

    let content = match body {
        Body::Empty => String::new(),
        Body::Message(msg) => message(&msg),
        Body::Summary { video_id, result } => {
            let thumb = format!(
                "<img src=\"{}\" alt=\"video thumbnail\" width=\"480\">\n",
                encode_double_quoted_attribute(&thumbnail_url(&video_id))
            );
            match result {
                Ok(summary) => format!(
                    "{thumb}<pre style=\"white-space: pre-wrap\">{}</pre>\n",
                    encode_text(&summary)
                ),
                Err(e) => format!("{thumb}{}", message(&e.to_string())),
            }
        }
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>YouTube</title></head>
<body>
<h2 style="text-align: center;">YouTube Transcript Summarizer with GenAI</h2>
{form}{content}</body>
</html>
"#
    )
}

fn message(text: &str) -> String {
    format!("<h5 style=\"text-align:center;color:orange;\">{}</h5>\n", encode_text(text))
}
