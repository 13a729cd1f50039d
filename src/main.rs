use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Result, WrapErr};
use log::{debug, info};

use ytsum::config::{self, Config};
use ytsum::gemini::{self, GeminiClient, GeminiConfig};
use ytsum::output;
use ytsum::server::{self, AppState};
use ytsum::summarize::Summarizer;
use ytsum::transcript::{self, TranscriptProvider};
use ytsum::youtube::YouTubeClient;

mod cli;

use cli::{Cli, Command, OutputFormat};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn build_after_help() -> String {
    let key_line = if std::env::var(gemini::API_KEY_ENV).is_ok_and(|k| !k.trim().is_empty()) {
        format!("  \x1b[32m✅\x1b[0m {}", gemini::API_KEY_ENV)
    } else {
        format!(
            "  \x1b[31m❌\x1b[0m {}   (not set, needed for summarization)",
            gemini::API_KEY_ENV
        )
    };

    format!(
        "\nREQUIRED ENVIRONMENT:\n{key_line}\n\nConfig: {}\nLogs are written to: {}",
        config::config_path().display(),
        log_dir().join("ytsum.log").display()
    )
}

fn summarizer(config: &Config, client: &reqwest::Client, model: Option<String>) -> Summarizer {
    let model = model
        .or_else(|| config.model.clone())
        .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());
    let gemini = GeminiClient::new(client.clone(), GeminiConfig::from_env(model));
    Summarizer::new(Arc::new(gemini)).with_policy(config.retry_policy())
}

async fn fetch(
    provider: &dyn TranscriptProvider,
    video_id: &str,
    lang: Option<&str>,
    config: &Config,
) -> ytsum::Result<ytsum::Transcript> {
    match lang {
        Some(code) => provider.fetch(video_id, code).await,
        None => transcript::fetch_default_transcript(provider, video_id, config.default_lang.as_deref()).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the key may come from the real environment
    let _ = dotenvy::dotenv();
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring config: {e:#}");
        Config::default()
    });

    if cli.verbose {
        let config_path = config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    let client = config.http_client()?;
    let youtube = YouTubeClient::new(client.clone())
        .with_interface_language(config.default_lang.as_deref().unwrap_or("en"));

    match cli.command {
        Command::Serve {
            bind,
            cors_origin,
            model,
        } => {
            let bind = bind
                .or_else(|| config.bind.clone())
                .unwrap_or_else(|| config::DEFAULT_BIND.to_string());
            let cors_origin = cors_origin
                .or_else(|| config.cors_origin.clone())
                .unwrap_or_else(|| config::DEFAULT_CORS_ORIGIN.to_string());

            let state = AppState {
                provider: Arc::new(youtube),
                summarizer: Arc::new(summarizer(&config, &client, model)),
                default_lang: config.default_lang.clone(),
            };
            let app = server::router(state, &cors_origin)?;

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .wrap_err_with(|| format!("failed to bind {bind}"))?;
            info!("Listening on {bind}, CORS origin {cors_origin}");
            eprintln!("Listening on http://{bind}");
            axum::serve(listener, app).await?;
        }

        Command::Languages { url } => {
            let video_id = ytsum::extract_video_id(&url)?;
            let table = ytsum::language::resolve_languages(&youtube, &video_id).await?;
            println!("{}", output::render_languages(&table));
        }

        Command::Transcript { url, lang, format } => {
            let video_id = ytsum::extract_video_id(&url)?;
            let transcript = fetch(&youtube, &video_id, lang.as_deref(), &config).await?;

            if cli.verbose {
                eprintln!(
                    "Video: {} ({})\nLanguage: {}\nSegments: {}",
                    transcript.title,
                    transcript.video_id,
                    transcript.language,
                    transcript.segments.len(),
                );
            }

            let rendered = match format {
                OutputFormat::Text => output::render_text(&transcript),
                OutputFormat::Json => output::render_json(&transcript),
            };
            println!("{rendered}");
        }

        Command::Summarize { url, lang, model } => {
            let video_id = ytsum::extract_video_id(&url)?;
            let transcript = fetch(&youtube, &video_id, lang.as_deref(), &config).await?;
            let text = transcript::non_empty_text(&transcript)?;
            debug!("Transcript for {video_id}: {} chars", text.len());

            if cli.verbose {
                eprintln!("Summarizing {} ({})...", transcript.title, transcript.language);
            }

            let summary = summarizer(&config, &client, model).summarize(&text).await?;
            println!("{summary}");
        }
    }

    Ok(())
}
