use crate::config::Config;
use crate::errors::Result;
use crate::models::market::{CompanyOverview, DailySeries, SymbolMatch, TickerInfo, TopMovers};
use crate::providers::{AlphaVantageClient, FinnhubClient, MarketDataProvider, ProfileProvider};
use crate::resource::{Resource, ResourceStream};
use crate::util::settle_all;
use log::{debug, info, warn};
use std::sync::Arc;

type SharedMarket = Arc<dyn MarketDataProvider + Send + Sync>;
type SharedProfiles = Arc<dyn ProfileProvider + Send + Sync>;

/// 聚合服务，组合行情与公司资料两个数据源
///
/// 每个操作返回一个 `ResourceStream`：先是 `Loading`，然后恰好一个
/// `Success` 或 `Error`。数据源错误在这里统一转换，不会抛给调用方。
pub struct AggregationService {
    config: Config,
    market: SharedMarket,
    profiles: SharedProfiles,
}

impl AggregationService {
    /// 创建新的聚合服务实例
    pub fn new(config: Config, market: SharedMarket, profiles: SharedProfiles) -> Self {
        Self {
            config,
            market,
            profiles,
        }
    }

    /// 使用默认的 HTTP 客户端创建
    pub fn from_config(config: Config) -> Result<Self> {
        let market: SharedMarket = Arc::new(AlphaVantageClient::new(&config)?);
        let profiles: SharedProfiles = Arc::new(FinnhubClient::new(&config)?);
        Ok(Self::new(config, market, profiles))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 获取涨跌榜并补全公司名称和 logo
    ///
    /// 涨跌榜请求失败时直接返回错误，不做任何补全请求。
    /// 单个标的补全失败只会让该标的保留回退值。
    pub fn fetch_top_movers(&self, api_key: &str) -> ResourceStream<TopMovers> {
        let market = self.market.clone();
        let profiles = self.profiles.clone();
        let api_key = api_key.to_string();
        let profile_key = self.config.profile_api_key.clone();

        ResourceStream::spawn(async move {
            info!("Loading top movers from {}", market.provider_id());
            let movers = market.top_movers(&api_key).await.map_err(|e| {
                warn!("Top movers request failed: {}", e);
                e
            })?;
            Ok(enrich_movers(&profiles, movers, &profile_key).await)
        })
    }

    /// 获取日线序列，不做补全
    pub fn fetch_daily_series(&self, symbol: &str, api_key: &str) -> ResourceStream<DailySeries> {
        let market = self.market.clone();
        let symbol = symbol.to_string();
        let api_key = api_key.to_string();
        let output_size = self.config.output_size;

        ResourceStream::spawn(async move {
            market.daily_series(&symbol, output_size, &api_key).await
        })
    }

    pub fn fetch_company_overview(&self, symbol: &str, api_key: &str) -> ResourceStream<CompanyOverview> {
        let market = self.market.clone();
        let symbol = symbol.to_string();
        let api_key = api_key.to_string();

        ResourceStream::spawn(async move { market.company_overview(&symbol, &api_key).await })
    }

    pub fn search_symbols(&self, keywords: &str, api_key: &str) -> ResourceStream<Vec<SymbolMatch>> {
        let market = self.market.clone();
        let keywords = keywords.to_string();
        let api_key = api_key.to_string();

        ResourceStream::spawn(async move {
            let search = market.search_symbols(&keywords, &api_key).await?;
            debug!("Search '{}' matched {} symbols", keywords, search.matches.len());
            Ok(search.matches)
        })
    }

    /// 尽力获取 logo，失败时返回 `Success(None)`
    pub fn fetch_logo(&self, symbol: &str) -> ResourceStream<Option<String>> {
        let profiles = self.profiles.clone();
        let symbol = symbol.to_string();
        let profile_key = self.config.profile_api_key.clone();

        ResourceStream::spawn(async move {
            match profiles.profile(&symbol, &profile_key).await {
                Ok(profile) => Ok(profile.logo.filter(|logo| !logo.trim().is_empty())),
                Err(e) => {
                    warn!("Logo lookup failed for {}: {}", symbol, e);
                    Ok(None)
                }
            }
        })
    }

    /// 详情页加载：日线、基本面、logo 三路并发
    pub fn load_product(&self, symbol: &str, api_key: &str) -> ProductStreams {
        info!("Loading product detail for {}", symbol);
        ProductStreams {
            series: self.fetch_daily_series(symbol, api_key),
            overview: self.fetch_company_overview(symbol, api_key),
            logo: self.fetch_logo(symbol),
        }
    }
}

/// Independent streams backing one product-detail view
pub struct ProductStreams {
    pub series: ResourceStream<DailySeries>,
    pub overview: ResourceStream<CompanyOverview>,
    pub logo: ResourceStream<Option<String>>,
}

/// Terminal states of a product-detail load
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub series: Resource<DailySeries>,
    pub overview: Resource<CompanyOverview>,
    pub logo: Option<String>,
}

impl ProductStreams {
    /// 等待三路全部结束
    pub async fn settle(self) -> ProductSnapshot {
        let (series, overview, logo) = tokio::join!(
            self.series.settle(),
            self.overview.settle(),
            self.logo.settle()
        );
        ProductSnapshot {
            series,
            overview,
            logo: logo.data().cloned().flatten(),
        }
    }
}

// 涨跌两个列表的所有标的一起并发补全，完成后再按原顺序拆回
async fn enrich_movers(profiles: &SharedProfiles, movers: TopMovers, profile_key: &str) -> TopMovers {
    let gainer_count = movers.gainers.len();
    let tickers: Vec<TickerInfo> = movers.gainers.iter().chain(movers.losers.iter()).cloned().collect();
    let total = tickers.len();

    let settled = settle_all(tickers.into_iter().map(|ticker| {
        let fallback = ticker.clone();
        let task = async move {
            match profiles.profile(&ticker.symbol, profile_key).await {
                Ok(profile) => Ok(ticker.enriched(&profile)),
                Err(e) => {
                    warn!("Profile lookup failed for {}, keeping symbol as name: {}", ticker.symbol, e);
                    Err(e)
                }
            }
        };
        (fallback, task)
    }))
    .await;

    let fallbacks = settled.iter().filter(|s| s.was_fallback).count();
    info!("Enriched {} of {} tickers", total - fallbacks, total);

    let mut gainers: Vec<TickerInfo> = settled.into_iter().map(|s| s.value).collect();
    let losers = gainers.split_off(gainer_count);

    TopMovers {
        gainers,
        losers,
        ..movers
    }
}
