use crate::models::market::OutputSize;
use std::env;
use std::time::Duration;

pub const DEFAULT_MARKET_DATA_URL: &str = "https://www.alphavantage.co";
pub const DEFAULT_PROFILE_URL: &str = "https://finnhub.io";

/// 服务配置，由调用方显式传入，不读取全局状态
#[derive(Debug, Clone)]
pub struct Config {
    pub market_data_api_key: String,
    pub profile_api_key: String,
    pub market_data_base_url: String,
    pub profile_base_url: String,
    pub output_size: OutputSize,
    // None 表示使用传输层默认超时
    pub request_timeout: Option<Duration>,
    pub db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            market_data_api_key: String::new(),
            profile_api_key: String::new(),
            market_data_base_url: DEFAULT_MARKET_DATA_URL.to_string(),
            profile_base_url: DEFAULT_PROFILE_URL.to_string(),
            output_size: OutputSize::Compact,
            request_timeout: None,
            db_path: "trady.db".to_string(),
        }
    }

    /// 从环境变量读取配置，仅供命令行程序使用
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(key) = env::var("TRADY_ALPHA_VANTAGE_API_KEY") {
            config.market_data_api_key = key;
        }
        if let Ok(key) = env::var("TRADY_FINNHUB_API_KEY") {
            config.profile_api_key = key;
        }
        if let Ok(url) = env::var("TRADY_ALPHA_VANTAGE_URL") {
            config.market_data_base_url = url;
        }
        if let Ok(url) = env::var("TRADY_FINNHUB_URL") {
            config.profile_base_url = url;
        }
        if let Ok(path) = env::var("TRADY_DB_PATH") {
            config.db_path = path;
        }
        config
    }

    pub fn with_market_data_api_key(mut self, key: &str) -> Self {
        self.market_data_api_key = key.to_string();
        self
    }

    pub fn with_profile_api_key(mut self, key: &str) -> Self {
        self.profile_api_key = key.to_string();
        self
    }

    pub fn with_market_data_base_url(mut self, url: &str) -> Self {
        self.market_data_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_profile_base_url(mut self, url: &str) -> Self {
        self.profile_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_output_size(mut self, size: OutputSize) -> Self {
        self.output_size = size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_db_path(mut self, path: &str) -> Self {
        self.db_path = path.to_string();
        self
    }
}
