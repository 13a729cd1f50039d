use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "YouTube transcript summarizer",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Show extra progress on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API and the web page
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,

        /// Origin allowed to call the API from a browser
        #[arg(long)]
        cors_origin: Option<String>,

        /// Gemini model for summarization
        #[arg(long)]
        model: Option<String>,
    },

    /// List the caption languages a video offers
    Languages {
        /// YouTube video URL or video ID
        url: String,
    },

    /// Print a video's transcript
    Transcript {
        /// YouTube video URL or video ID
        url: String,

        /// Caption language code (default: configured language, else first track)
        #[arg(short, long)]
        lang: Option<String>,

        /// Output format: text (default), json
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Summarize a video's transcript
    Summarize {
        /// YouTube video URL or video ID
        url: String,

        /// Caption language code (default: configured language, else first track)
        #[arg(short, long)]
        lang: Option<String>,

        /// Gemini model for summarization
        #[arg(long)]
        model: Option<String>,
    },
}
