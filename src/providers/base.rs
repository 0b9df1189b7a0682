use crate::errors::{Result, TradyError};
use crate::models::market::{CompanyOverview, CompanyProfile, DailySeries, OutputSize, SymbolSearch, TopMovers};
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Quotes / fundamentals provider
#[async_trait]
pub trait MarketDataProvider {
    /// Short identifier used in logs
    fn provider_id(&self) -> &'static str;

    /// Fetch today's top gainers, losers and most actively traded tickers
    async fn top_movers(&self, api_key: &str) -> Result<TopMovers>;

    /// Fetch the daily OHLCV series for one symbol
    async fn daily_series(&self, symbol: &str, output_size: OutputSize, api_key: &str) -> Result<DailySeries>;

    /// Fetch company fundamentals for one symbol
    async fn company_overview(&self, symbol: &str, api_key: &str) -> Result<CompanyOverview>;

    /// Search symbols by keywords
    async fn search_symbols(&self, keywords: &str, api_key: &str) -> Result<SymbolSearch>;
}

/// Company name / logo provider
#[async_trait]
pub trait ProfileProvider {
    fn provider_id(&self) -> &'static str;

    async fn profile(&self, symbol: &str, api_key: &str) -> Result<CompanyProfile>;
}

/// Turn a raw provider response into a typed payload.
///
/// Non-2xx statuses become `Http`, blank / `null` / `{}` bodies become
/// `EmptyResponse`, and a body whose top level carries one of `notice_keys`
/// instead of data becomes `Provider`.
pub fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str, notice_keys: &[&str]) -> Result<T> {
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| find_notice(&json, notice_keys))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown status").to_string());
        return Err(TradyError::Http {
            code: status.as_u16(),
            message,
        });
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(TradyError::EmptyResponse);
    }

    let json: Value = serde_json::from_str(trimmed)?;
    match &json {
        Value::Null => return Err(TradyError::EmptyResponse),
        Value::Object(map) if map.is_empty() => return Err(TradyError::EmptyResponse),
        _ => {}
    }

    if let Some(notice) = find_notice(&json, notice_keys) {
        debug!("Provider returned a notice instead of data: {}", notice);
        return Err(TradyError::Provider(notice));
    }

    Ok(serde_json::from_value(json)?)
}

fn find_notice(json: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| json.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::market::CompanyProfile;

    const KEYS: &[&str] = &["Error Message", "Note", "Information"];

    #[test]
    fn test_non_success_status() {
        let err = decode_body::<CompanyProfile>(StatusCode::SERVICE_UNAVAILABLE, "", KEYS).unwrap_err();
        assert_eq!(err.to_string(), "Error 503: Service Unavailable");
    }

    #[test]
    fn test_non_success_status_with_provider_message() {
        let err = decode_body::<CompanyProfile>(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"Invalid API key"}"#,
            &["error"],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Error 401: Invalid API key");
    }

    #[test]
    fn test_empty_bodies() {
        for body in ["", "   ", "null", "{}"] {
            let err = decode_body::<CompanyProfile>(StatusCode::OK, body, KEYS).unwrap_err();
            assert!(matches!(err, TradyError::EmptyResponse), "body {:?}", body);
        }
    }

    #[test]
    fn test_notice_instead_of_data() {
        let body = r#"{"Note":"Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#;
        let err = decode_body::<TopMovers>(StatusCode::OK, body, KEYS).unwrap_err();
        assert!(matches!(err, TradyError::Provider(ref msg) if msg.contains("rate limit")));
    }

    #[test]
    fn test_undecodable_body_is_network_error() {
        let err = decode_body::<DailySeries>(StatusCode::OK, r#"{"Meta Data": 5}"#, KEYS).unwrap_err();
        assert!(err.to_string().starts_with("Network error: "));
        let err = decode_body::<DailySeries>(StatusCode::OK, "<html>", KEYS).unwrap_err();
        assert!(err.to_string().starts_with("Network error: "));
    }

    #[test]
    fn test_success() {
        let profile: CompanyProfile = decode_body(
            StatusCode::OK,
            r#"{"name":"Apple Inc","logo":"https://static/AAPL.png","ticker":"AAPL","country":"US"}"#,
            &["error"],
        )
        .unwrap();
        assert_eq!(profile.name.as_deref(), Some("Apple Inc"));
        assert_eq!(profile.ticker.as_deref(), Some("AAPL"));
    }
}
