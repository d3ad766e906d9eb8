use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Product list error ({path}): {message}")]
    ProductList { path: String, message: String },

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
