use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("xkcd API returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to decode comic: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Comic #{num} has an invalid date: {year}-{month}-{day}")]
    InvalidDate {
        num: u32,
        year: String,
        month: String,
        day: String,
    },

    #[error("Unknown template key: {0}")]
    UnknownTemplateKey(String),

    #[error("No unseen comic found after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("Latest comic id {0} leaves no candidates to pick from")]
    InvalidLatest(u32),

    #[error("Nothing to render")]
    NoComics,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FeedError>;
