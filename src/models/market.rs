use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::TradyError;
use crate::util::parse_price;

/// 涨跌榜中的一条记录
///
/// `company_name` 与 `logo_url` 来自第二个数据源，补全失败时
/// 名称回退为 `symbol`，logo 为空，记录本身仍然有效。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TickerRecord")]
#[serde(rename_all = "camelCase")]
pub struct TickerInfo {
    pub symbol: String,
    pub price: String,
    pub change_amount: String,
    pub change_percent: String,
    pub volume: Option<String>,
    pub company_name: String,
    pub logo_url: Option<String>,
}

// 行情接口原始字段，同时接受 TickerInfo 自身序列化出的字段名
#[derive(Deserialize)]
struct TickerRecord {
    #[serde(alias = "symbol")]
    ticker: String,
    #[serde(default)]
    price: String,
    #[serde(default, alias = "changeAmount")]
    change_amount: String,
    #[serde(default, alias = "changePercent")]
    change_percentage: String,
    volume: Option<String>,
    #[serde(rename = "companyName")]
    company_name: Option<String>,
    #[serde(rename = "logoUrl")]
    logo_url: Option<String>,
}

impl From<TickerRecord> for TickerInfo {
    fn from(raw: TickerRecord) -> Self {
        let company_name = raw.company_name.unwrap_or_else(|| raw.ticker.clone());
        Self {
            symbol: raw.ticker,
            price: raw.price,
            change_amount: raw.change_amount,
            change_percent: raw.change_percentage,
            volume: raw.volume,
            company_name,
            logo_url: raw.logo_url,
        }
    }
}

impl TickerInfo {
    pub fn new(symbol: &str, price: &str, change_amount: &str, change_percent: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: price.to_string(),
            change_amount: change_amount.to_string(),
            change_percent: change_percent.to_string(),
            volume: None,
            company_name: symbol.to_string(),
            logo_url: None,
        }
    }

    /// 用公司资料生成补全后的副本，原记录不变
    pub fn enriched(&self, profile: &CompanyProfile) -> Self {
        let mut ticker = self.clone();
        ticker.company_name = profile
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.symbol)
            .to_string();
        ticker.logo_url = profile.logo.clone().filter(|logo| !logo.trim().is_empty());
        ticker
    }

    pub fn price_value(&self) -> f64 {
        parse_price(&self.price)
    }

    pub fn change_amount_value(&self) -> f64 {
        parse_price(&self.change_amount)
    }

    /// "-12.5%" / "+3.1%" -> 数值
    pub fn change_percent_value(&self) -> f64 {
        parse_price(self.change_percent.trim().trim_end_matches('%'))
    }

    pub fn is_gain(&self) -> bool {
        self.change_percent_value() >= 0.0
    }
}

/// Top gainers / losers / most actively traded
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopMovers {
    pub metadata: Option<String>,
    pub last_updated: Option<String>,
    #[serde(rename = "top_gainers", default)]
    pub gainers: Vec<TickerInfo>,
    #[serde(rename = "top_losers", default)]
    pub losers: Vec<TickerInfo>,
    #[serde(rename = "most_actively_traded", default)]
    pub most_active: Vec<TickerInfo>,
}

impl TopMovers {
    /// 首页只展示每个列表的前 n 条
    pub fn preview(&self, n: usize) -> (Vec<TickerInfo>, Vec<TickerInfo>) {
        (
            self.gainers.iter().take(n).cloned().collect(),
            self.losers.iter().take(n).cloned().collect(),
        )
    }
}

/// 日线 OHLCV，数值保持接口给出的字符串形式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

impl DailyBar {
    pub fn with_close(close: &str) -> Self {
        Self {
            open: close.to_string(),
            high: close.to_string(),
            low: close.to_string(),
            close: close.to_string(),
            volume: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesMeta {
    #[serde(rename = "1. Information", default)]
    pub information: String,
    #[serde(rename = "2. Symbol", default)]
    pub symbol: String,
    #[serde(rename = "3. Last Refreshed", default)]
    pub last_refreshed: String,
    #[serde(rename = "4. Output Size", default)]
    pub output_size: String,
    #[serde(rename = "5. Time Zone", default)]
    pub time_zone: String,
}

/// 单个标的的日线序列，键为 yyyy-MM-dd，迭代顺序不保证
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailySeries {
    #[serde(rename = "Meta Data", default)]
    pub meta: SeriesMeta,
    #[serde(rename = "Time Series (Daily)")]
    pub series: HashMap<String, DailyBar>,
}

impl DailySeries {
    /// 只有收盘价的序列，主要用于测试
    pub fn from_closes<D, C>(closes: impl IntoIterator<Item = (D, C)>) -> Self
    where
        D: Into<String>,
        C: AsRef<str>,
    {
        Self {
            meta: SeriesMeta::default(),
            series: closes
                .into_iter()
                .map(|(date, close)| (date.into(), DailyBar::with_close(close.as_ref())))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Company fundamentals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "AssetType", default)]
    pub asset_type: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Industry", default)]
    pub industry: String,
    #[serde(rename = "Sector", default)]
    pub sector: String,
    #[serde(rename = "Exchange")]
    pub exchange: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_cap: Option<String>,
    #[serde(rename = "PERatio")]
    pub pe_ratio: Option<String>,
    #[serde(rename = "DividendYield")]
    pub dividend_yield: Option<String>,
    #[serde(rename = "Beta")]
    pub beta: Option<String>,
    #[serde(rename = "ProfitMargin")]
    pub profit_margin: Option<String>,
    #[serde(rename = "52WeekLow")]
    pub week52_low: Option<String>,
    #[serde(rename = "52WeekHigh")]
    pub week52_high: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    pub symbol: String,
    #[serde(rename = "2. name")]
    pub name: String,
    #[serde(rename = "3. type", default)]
    pub kind: String,
    #[serde(rename = "4. region", default)]
    pub region: String,
    #[serde(rename = "5. marketOpen", default)]
    pub market_open: String,
    #[serde(rename = "6. marketClose", default)]
    pub market_close: String,
    #[serde(rename = "7. timezone", default)]
    pub timezone: String,
    #[serde(rename = "8. currency", default)]
    pub currency: String,
    #[serde(rename = "9. matchScore", default)]
    pub match_score: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SymbolSearch {
    #[serde(rename = "bestMatches", default)]
    pub matches: Vec<SymbolMatch>,
}

/// Profile provider response, any field may be absent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub ticker: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSize {
    #[default]
    Compact,
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputSize {
    type Err = TradyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(OutputSize::Compact),
            "full" => Ok(OutputSize::Full),
            other => Err(TradyError::InvalidInput(format!("Unknown output size: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_defaults_company_name_to_symbol() {
        let json = r#"{"ticker":"NVDA","price":"120.5","change_amount":"3.2","change_percentage":"2.7%","volume":"1000"}"#;
        let ticker: TickerInfo = serde_json::from_str(json).unwrap();
        assert_eq!(ticker.symbol, "NVDA");
        assert_eq!(ticker.company_name, "NVDA");
        assert!(ticker.logo_url.is_none());
        assert_eq!(ticker.volume.as_deref(), Some("1000"));
    }

    #[test]
    fn test_enriched_keeps_original_untouched() {
        let ticker = TickerInfo::new("AAPL", "190.1", "1.0", "0.5%");
        let profile = CompanyProfile {
            name: Some("Apple Inc".to_string()),
            logo: Some("https://logo/aapl.png".to_string()),
            ticker: Some("AAPL".to_string()),
        };
        let enriched = ticker.enriched(&profile);
        assert_eq!(enriched.company_name, "Apple Inc");
        assert_eq!(enriched.logo_url.as_deref(), Some("https://logo/aapl.png"));
        assert_eq!(ticker.company_name, "AAPL");
        assert!(ticker.logo_url.is_none());
    }

    #[test]
    fn test_enriched_with_blank_profile_falls_back() {
        let ticker = TickerInfo::new("XYZ", "1", "0", "0%");
        let profile = CompanyProfile {
            name: Some("  ".to_string()),
            logo: Some(String::new()),
            ticker: None,
        };
        let enriched = ticker.enriched(&profile);
        assert_eq!(enriched.company_name, "XYZ");
        assert!(enriched.logo_url.is_none());
    }

    #[test]
    fn test_change_percent_value() {
        let loser = TickerInfo::new("ABC", "2.5", "-0.75", "-23.0769%");
        assert!((loser.change_percent_value() + 23.0769).abs() < 1e-9);
        assert!(!loser.is_gain());
        let junk = TickerInfo::new("ABC", "n/a", "n/a", "n/a");
        assert_eq!(junk.price_value(), 0.0);
        assert_eq!(junk.change_percent_value(), 0.0);
    }

    #[test]
    fn test_top_movers_decode_and_preview() {
        let json = r#"{
            "metadata": "Top gainers, losers, and most actively traded US tickers",
            "last_updated": "2024-01-10 16:15:59 US/Eastern",
            "top_gainers": [
                {"ticker":"A","price":"1","change_amount":"1","change_percentage":"100%","volume":"1"},
                {"ticker":"B","price":"1","change_amount":"1","change_percentage":"90%","volume":"1"}
            ],
            "top_losers": [
                {"ticker":"C","price":"1","change_amount":"-1","change_percentage":"-50%","volume":"1"}
            ]
        }"#;
        let movers: TopMovers = serde_json::from_str(json).unwrap();
        assert_eq!(movers.gainers.len(), 2);
        assert_eq!(movers.losers.len(), 1);
        assert!(movers.most_active.is_empty());

        let (gainers, losers) = movers.preview(1);
        assert_eq!(gainers.len(), 1);
        assert_eq!(gainers[0].symbol, "A");
        assert_eq!(losers[0].symbol, "C");
    }

    #[test]
    fn test_daily_series_decode() {
        let json = r#"{
            "Meta Data": {
                "1. Information": "Daily Prices (open, high, low, close) and Volumes",
                "2. Symbol": "IBM",
                "3. Last Refreshed": "2024-01-10",
                "4. Output Size": "Compact",
                "5. Time Zone": "US/Eastern"
            },
            "Time Series (Daily)": {
                "2024-01-10": {"1. open":"1","2. high":"2","3. low":"0.5","4. close":"1.5","5. volume":"100"},
                "2024-01-09": {"1. open":"1","2. high":"2","3. low":"0.5","4. close":"1.2","5. volume":"100"}
            }
        }"#;
        let series: DailySeries = serde_json::from_str(json).unwrap();
        assert_eq!(series.meta.symbol, "IBM");
        assert_eq!(series.len(), 2);
        assert_eq!(series.series["2024-01-10"].close, "1.5");
    }

    #[test]
    fn test_output_size_from_str() {
        assert_eq!("FULL".parse::<OutputSize>().unwrap(), OutputSize::Full);
        assert!("huge".parse::<OutputSize>().is_err());
    }

    #[test]
    fn test_top_movers_reads_back_own_json() {
        let movers = TopMovers {
            gainers: vec![TickerInfo::new("AAPL", "1", "1", "1%").enriched(&CompanyProfile {
                name: Some("Apple Inc".to_string()),
                logo: Some("https://logo/aapl.png".to_string()),
                ticker: Some("AAPL".to_string()),
            })],
            losers: vec![TickerInfo::new("TSLA", "2", "-1", "-0.5%")],
            ..Default::default()
        };
        let json = serde_json::to_string(&movers).unwrap();
        assert!(json.contains(r#""symbol":"AAPL""#));
        let decoded: TopMovers = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, movers);
        assert_eq!(decoded.gainers[0].company_name, "Apple Inc");
        assert_eq!(decoded.losers[0].change_percent, "-0.5%");
    }
}
