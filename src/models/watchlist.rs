use serde::Serialize;

/// 用户命名的自选列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Watchlist {
    pub id: i64,
    pub name: String,
}

/// Membership row, duplicates of (watchlist_id, symbol) are allowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistItem {
    pub id: i64,
    pub watchlist_id: i64,
    pub symbol: String,
}
