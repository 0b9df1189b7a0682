//! Watchlist persistence on SQLite

use crate::errors::{Result, TradyError};
use crate::models::watchlist::{Watchlist, WatchlistItem};
use crate::store::live_query::LiveQuery;
use crate::store::migrations::run_migrations;
use log::{debug, error, info};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// 自选列表存储
///
/// 每个操作单独提交，不做跨操作事务；并发写入以最后一次为准。
pub struct WatchlistStore {
    conn: Mutex<Connection>,
    changes: watch::Sender<u64>,
}

impl WatchlistStore {
    /// 打开（或创建）数据库文件
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening watchlist database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // SQLite 默认不启用外键，级联删除依赖它
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&conn)?;
        let (changes, _) = watch::channel(0);
        Ok(Self {
            conn: Mutex::new(conn),
            changes,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TradyError::DataError("watchlist store lock poisoned".to_string()))
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }

    /// 所有自选列表
    pub fn watchlists(&self) -> Result<Vec<Watchlist>> {
        logged("list watchlists", self.query_watchlists())
    }

    fn query_watchlists(&self) -> Result<Vec<Watchlist>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name FROM watchlists ORDER BY id")?;
        let watchlists = stmt
            .query_map([], |row| {
                Ok(Watchlist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(watchlists)
    }

    /// 自选列表的实时查询
    pub fn watch_watchlists(self: &Arc<Self>) -> LiveQuery<Vec<Watchlist>> {
        LiveQuery::new(self.clone(), Box::new(|store: &WatchlistStore| store.watchlists()))
    }

    /// Create a watchlist and return its generated id.
    /// Callers validate the name; it is stored as given.
    pub fn create_watchlist(&self, name: &str) -> Result<i64> {
        let id = logged("create watchlist", self.insert_watchlist(name))?;
        debug!("Created watchlist {} ({})", name, id);
        self.notify();
        Ok(id)
    }

    fn insert_watchlist(&self, name: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute("INSERT INTO watchlists (name) VALUES (?)", [name])?;
        Ok(conn.last_insert_rowid())
    }

    /// 删除自选列表，其成员行级联删除
    pub fn delete_watchlist(&self, watchlist: &Watchlist) -> Result<()> {
        let result = self.execute("DELETE FROM watchlists WHERE id = ?", params![watchlist.id]);
        let removed = logged("delete watchlist", result)?;
        if removed > 0 {
            self.notify();
        }
        Ok(())
    }

    pub fn items(&self, watchlist_id: i64) -> Result<Vec<WatchlistItem>> {
        logged(
            "list items",
            self.query_items(
                "SELECT id, watchlistId, symbol FROM watchlist_items WHERE watchlistId = ? ORDER BY id",
                params![watchlist_id],
            ),
        )
    }

    pub fn watch_items(self: &Arc<Self>, watchlist_id: i64) -> LiveQuery<Vec<WatchlistItem>> {
        LiveQuery::new(self.clone(), Box::new(move |store: &WatchlistStore| store.items(watchlist_id)))
    }

    /// 添加标的，允许重复
    pub fn add_item(&self, watchlist_id: i64, symbol: &str) -> Result<i64> {
        let id = logged("add item", self.insert_item(watchlist_id, symbol))?;
        self.notify();
        Ok(id)
    }

    fn insert_item(&self, watchlist_id: i64, symbol: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO watchlist_items (watchlistId, symbol) VALUES (?, ?)",
            params![watchlist_id, symbol],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn remove_item(&self, item: &WatchlistItem) -> Result<()> {
        let result = self.execute("DELETE FROM watchlist_items WHERE id = ?", params![item.id]);
        let removed = logged("remove item", result)?;
        if removed > 0 {
            self.notify();
        }
        Ok(())
    }

    /// 按标的删除，返回删除的行数（重复项一并删除）
    pub fn remove_item_by_symbol(&self, watchlist_id: i64, symbol: &str) -> Result<usize> {
        let result = self.execute(
            "DELETE FROM watchlist_items WHERE watchlistId = ? AND symbol = ?",
            params![watchlist_id, symbol],
        );
        let removed = logged("remove item by symbol", result)?;
        if removed > 0 {
            self.notify();
        }
        Ok(removed)
    }

    /// 所有列表中的成员
    pub fn all_items(&self) -> Result<Vec<WatchlistItem>> {
        logged(
            "list all items",
            self.query_items(
                "SELECT id, watchlistId, symbol FROM watchlist_items ORDER BY watchlistId, id",
                [],
            ),
        )
    }

    /// 标的是否在指定列表中（忽略大小写）
    pub fn contains_symbol(&self, watchlist_id: i64, symbol: &str) -> Result<bool> {
        Ok(self
            .items(watchlist_id)?
            .iter()
            .any(|item| item.symbol.eq_ignore_ascii_case(symbol)))
    }

    /// 包含该标的的列表 id，去重
    pub fn watchlists_containing(&self, symbol: &str) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .all_items()?
            .into_iter()
            .filter(|item| item.symbol.eq_ignore_ascii_case(symbol))
            .map(|item| item.watchlist_id)
            .collect();
        ids.dedup();
        Ok(ids)
    }

    /// 所有列表中的标的，去重并排序
    pub fn unique_symbols(&self) -> Result<Vec<String>> {
        let mut symbols: Vec<String> = self.all_items()?.into_iter().map(|item| item.symbol).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> Result<usize> {
        let conn = self.lock()?;
        Ok(conn.execute(sql, params)?)
    }

    fn query_items(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<WatchlistItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let items = stmt
            .query_map(params, |row| {
                Ok(WatchlistItem {
                    id: row.get(0)?,
                    watchlist_id: row.get(1)?,
                    symbol: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

// 存储层错误记录日志后继续向上传递
fn logged<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        error!("Watchlist store failed to {}: {}", operation, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store() -> WatchlistStore {
        WatchlistStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_list() {
        let store = store();
        let tech = store.create_watchlist("Tech").unwrap();
        let energy = store.create_watchlist("Energy").unwrap();
        assert!(energy > tech);

        let lists = store.watchlists().unwrap();
        assert_eq!(
            lists,
            vec![
                Watchlist { id: tech, name: "Tech".to_string() },
                Watchlist { id: energy, name: "Energy".to_string() },
            ]
        );
    }

    #[test]
    fn test_delete_cascades_to_items() {
        let store = store();
        let id = store.create_watchlist("Tech").unwrap();
        store.add_item(id, "AAPL").unwrap();
        store.add_item(id, "MSFT").unwrap();
        assert_eq!(store.items(id).unwrap().len(), 2);

        let watchlist = store.watchlists().unwrap().remove(0);
        store.delete_watchlist(&watchlist).unwrap();

        assert!(store.watchlists().unwrap().is_empty());
        assert!(store.items(id).unwrap().is_empty());
        assert!(store.all_items().unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_allowed_and_removed_together() {
        let store = store();
        let id = store.create_watchlist("Tech").unwrap();
        store.add_item(id, "AAPL").unwrap();
        store.add_item(id, "AAPL").unwrap();
        store.add_item(id, "NVDA").unwrap();
        assert_eq!(store.items(id).unwrap().len(), 3);

        assert_eq!(store.remove_item_by_symbol(id, "AAPL").unwrap(), 2);
        assert_eq!(store.remove_item_by_symbol(id, "AAPL").unwrap(), 0);
        let remaining = store.items(id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].symbol, "NVDA");
    }

    #[test]
    fn test_remove_single_item() {
        let store = store();
        let id = store.create_watchlist("Tech").unwrap();
        store.add_item(id, "AAPL").unwrap();
        let item_id = store.add_item(id, "AAPL").unwrap();

        let item = WatchlistItem { id: item_id, watchlist_id: id, symbol: "AAPL".to_string() };
        store.remove_item(&item).unwrap();
        let remaining = store.items(id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_ne!(remaining[0].id, item_id);
    }

    #[test]
    fn test_item_requires_existing_watchlist() {
        let store = store();
        let err = store.add_item(42, "AAPL").unwrap_err();
        assert!(matches!(err, TradyError::Database(_)));
    }

    #[test]
    fn test_cross_watchlist_queries() {
        let store = store();
        let tech = store.create_watchlist("Tech").unwrap();
        let growth = store.create_watchlist("Growth").unwrap();
        store.add_item(tech, "NVDA").unwrap();
        store.add_item(tech, "AAPL").unwrap();
        store.add_item(growth, "nvda").unwrap();
        store.add_item(growth, "NVDA").unwrap();

        assert!(store.contains_symbol(tech, "aapl").unwrap());
        assert!(!store.contains_symbol(growth, "AAPL").unwrap());
        assert_eq!(store.watchlists_containing("NVDA").unwrap(), vec![tech, growth]);
        assert_eq!(store.unique_symbols().unwrap(), vec!["AAPL", "NVDA", "nvda"]);
        assert_eq!(store.all_items().unwrap().len(), 4);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlists.db");
        {
            let store = WatchlistStore::open(&path).unwrap();
            let id = store.create_watchlist("Tech").unwrap();
            store.add_item(id, "AAPL").unwrap();
        }
        let store = WatchlistStore::open(&path).unwrap();
        let lists = store.watchlists().unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(store.items(lists[0].id).unwrap()[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_live_watchlists_follow_writes() {
        let store = Arc::new(store());
        let mut live = store.watch_watchlists();
        assert!(live.next().await.unwrap().unwrap().is_empty());

        store.create_watchlist("Tech").unwrap();
        let lists = tokio::time::timeout(Duration::from_secs(1), live.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "Tech");
    }

    #[tokio::test]
    async fn test_live_items_after_delete() {
        let store = Arc::new(store());
        let id = store.create_watchlist("Tech").unwrap();
        store.add_item(id, "AAPL").unwrap();
        store.add_item(id, "MSFT").unwrap();

        let mut live = store.watch_items(id);
        assert_eq!(live.next().await.unwrap().unwrap().len(), 2);

        let watchlist = Watchlist { id, name: "Tech".to_string() };
        store.delete_watchlist(&watchlist).unwrap();
        let items = tokio::time::timeout(Duration::from_secs(1), live.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(items.is_empty());
    }
}
