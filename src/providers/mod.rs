pub mod alpha_vantage;
pub mod base;
pub mod finnhub;

pub use alpha_vantage::AlphaVantageClient;
pub use base::{MarketDataProvider, ProfileProvider};
pub use finnhub::FinnhubClient;
