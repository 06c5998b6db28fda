use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SwipeConfigError {
    #[error("swipe threshold must be a positive number of pixels, got {0}")]
    Threshold(f32),
    #[error("action item width must be a positive number of pixels, got {0}")]
    ItemWidth(f32),
    #[error("jitter threshold must be a positive number of pixels, got {0}")]
    Jitter(f32),
    #[error("damping factor must be within (0, 1], got {0}")]
    Damping(f32),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("invalid swipe settings: {0}")]
    Swipe(#[from] SwipeConfigError),
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("seed message {message} references unknown folder {folder}")]
    UnknownFolder { message: String, folder: String },
    #[error("seed message {message} has an out-of-range date ({minutes_ago} minutes ago)")]
    DateOutOfRange { message: String, minutes_ago: i64 },
}
