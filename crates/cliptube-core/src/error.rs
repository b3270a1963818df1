use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliptubeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("history file error: {0}")]
    History(String),

    #[error("invalid video id: {0:?}")]
    InvalidVideoId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
