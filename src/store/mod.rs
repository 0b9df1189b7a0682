pub mod live_query;
pub mod migrations;
pub mod watchlist_store;

pub use live_query::LiveQuery;
pub use watchlist_store::WatchlistStore;
