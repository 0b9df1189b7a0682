use crate::config::Config;
use crate::errors::{Result, TradyError};
use crate::models::market::{CompanyOverview, DailySeries, OutputSize, SymbolSearch, TopMovers};
use crate::providers::base::{decode_body, MarketDataProvider};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::de::DeserializeOwned;

// 行情接口在 200 响应中用这些字段返回错误或限流提示
const NOTICE_KEYS: &[&str] = &["Error Message", "Note", "Information"];

/// Alpha Vantage 行情客户端
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
}

impl AlphaVantageClient {
    /// 创建新的行情客户端
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TradyError::Request)?;

        Ok(Self {
            client,
            base_url: config.market_data_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn query<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/query", self.base_url);
        let function = params
            .iter()
            .find(|(k, _)| *k == "function")
            .map(|(_, v)| *v)
            .unwrap_or_default();
        debug!("Alpha Vantage request: {}", function);

        let response = self.client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(TradyError::Request)?;

        let status = response.status();
        let text = response.text().await?;
        decode_body(status, &text, NOTICE_KEYS)
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageClient {
    fn provider_id(&self) -> &'static str {
        "ALPHA_VANTAGE"
    }

    async fn top_movers(&self, api_key: &str) -> Result<TopMovers> {
        let movers: TopMovers = self
            .query(&[("function", "TOP_GAINERS_LOSERS"), ("apikey", api_key)])
            .await?;
        info!(
            "获取涨跌榜: {} gainers, {} losers",
            movers.gainers.len(),
            movers.losers.len()
        );
        Ok(movers)
    }

    async fn daily_series(&self, symbol: &str, output_size: OutputSize, api_key: &str) -> Result<DailySeries> {
        let series: DailySeries = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", output_size.as_str()),
                ("apikey", api_key),
            ])
            .await?;
        debug!("获取到 {} 的 {} 条日线记录", symbol, series.len());
        Ok(series)
    }

    async fn company_overview(&self, symbol: &str, api_key: &str) -> Result<CompanyOverview> {
        self.query(&[("function", "OVERVIEW"), ("symbol", symbol), ("apikey", api_key)])
            .await
    }

    async fn search_symbols(&self, keywords: &str, api_key: &str) -> Result<SymbolSearch> {
        self.query(&[("function", "SYMBOL_SEARCH"), ("keywords", keywords), ("apikey", api_key)])
            .await
    }
}
