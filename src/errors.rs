use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Network error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Error {code}: {message}")]
    Http { code: u16, message: String },

    #[error("Empty response")]
    EmptyResponse,

    // 200 响应里带回的提示（限流、无效参数等）
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, TradyError>;

// 用于从字符串创建错误
impl From<String> for TradyError {
    fn from(s: String) -> Self {
        TradyError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for TradyError {
    fn from(s: &str) -> Self {
        TradyError::Unknown(s.to_string())
    }
}
