use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderValue,
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::summarize::Summarizer;
use crate::transcript::{self, TranscriptProvider};
use crate::{Error, Result, Segment, page};

/// Handles shared by every request; nothing here is mutated after startup
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn TranscriptProvider>,
    pub summarizer: Arc<Summarizer>,
    pub default_lang: Option<String>,
}

/// Success body or `{"error": ...}`; always sent with status 200
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiReply<T> {
    Ok(T),
    Err { error: String },
}

impl<T> ApiReply<T> {
    fn from_result(context: &str, result: Result<T>) -> Json<Self> {
        match result {
            Ok(body) => Json(ApiReply::Ok(body)),
            Err(e) => {
                error!("{context}: {e}");
                Json(ApiReply::Err { error: e.to_string() })
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TranscriptBody {
    pub transcript: Vec<Segment>,
}

#[derive(Debug, Serialize)]
pub struct SummaryBody {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub video_id: String,
}

async fn get_transcript(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Json<ApiReply<TranscriptBody>> {
    let result = transcript::fetch_default_transcript(state.provider.as_ref(), &video_id, state.default_lang.as_deref())
        .await
        .map(|t| TranscriptBody { transcript: t.segments });
    ApiReply::from_result("transcript request failed", result)
}

async fn generate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Json<ApiReply<SummaryBody>> {
    let result = match payload {
        Ok(Json(req)) => summarize_video(&state, &req.video_id).await,
        Err(rejection) => Err(Error::InvalidInput(rejection.body_text())),
    };
    ApiReply::from_result("summary request failed", result.map(|summary| SummaryBody { summary }))
}

async fn summarize_video(state: &AppState, video_id: &str) -> Result<String> {
    let transcript =
        transcript::fetch_default_transcript(state.provider.as_ref(), video_id, state.default_lang.as_deref()).await?;
    let text = transcript::non_empty_text(&transcript)?;
    let summary = state.summarizer.summarize(&text).await?;
    info!("Summarized {video_id} ({} chars of transcript)", text.len());
    Ok(summary)
}

/// CORS for a single origin, any method and header.
///
/// Other origins get no `Access-Control-Allow-Origin` header at all.
pub fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|e| Error::Configuration(format!("invalid CORS origin '{origin}': {e}")))?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

pub fn router(state: AppState, cors_origin: &str) -> Result<Router> {
    let api = Router::new()
        .route("/api/transcript/{video_id}", get(get_transcript))
        .route("/api/generate", post(generate))
        .layer(cors_layer(cors_origin)?);

    Ok(Router::new()
        .route("/", get(page::index))
        .merge(api)
        .with_state(state))
}
