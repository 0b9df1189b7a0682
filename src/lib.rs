// 公开导出的模块，供外部使用
pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod range_filter;
pub mod resource;
pub mod services;
pub mod store;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use errors::{Result, TradyError};
pub use models::market::{CompanyOverview, CompanyProfile, DailyBar, DailySeries, SymbolMatch, TickerInfo, TopMovers};
pub use models::watchlist::{Watchlist, WatchlistItem};
pub use range_filter::{filter_series, PricePoint, Range, SeriesSummary};
pub use resource::{Resource, ResourceStream};
pub use services::AggregationService;
pub use store::{LiveQuery, WatchlistStore};
