use crate::config::Config;
use crate::errors::{Result, TradyError};
use crate::models::market::CompanyProfile;
use crate::providers::base::{decode_body, ProfileProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

/// Finnhub 公司资料客户端，仅用于名称和 logo
pub struct FinnhubClient {
    client: Client,
    base_url: String,
}

impl FinnhubClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TradyError::Request)?;

        Ok(Self {
            client,
            base_url: config.profile_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProfileProvider for FinnhubClient {
    fn provider_id(&self) -> &'static str {
        "FINNHUB"
    }

    async fn profile(&self, symbol: &str, api_key: &str) -> Result<CompanyProfile> {
        debug!("获取 {} 的公司资料", symbol);

        let response = self.client
            .get(format!("{}/api/v1/stock/profile2", self.base_url))
            .query(&[("symbol", symbol), ("token", api_key)])
            .send()
            .await
            .map_err(TradyError::Request)?;

        let status = response.status();
        let text = response.text().await?;
        decode_body(status, &text, &["error"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_provider_id() {
        let client = FinnhubClient::new(&Config::new()).unwrap();
        assert_eq!(client.provider_id(), "FINNHUB");
        assert_eq!(client.base_url, "https://finnhub.io");
    }

    #[test]
    fn test_partial_profile() {
        let profile: CompanyProfile =
            decode_body(StatusCode::OK, r#"{"ticker":"BRK.A"}"#, &["error"]).unwrap();
        assert!(profile.name.is_none());
        assert!(profile.logo.is_none());
    }

    #[test]
    fn test_rate_limited() {
        let err = decode_body::<CompanyProfile>(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":"API limit reached. Please try again later."}"#,
            &["error"],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Error 429: API limit reached. Please try again later.");
    }
}
