use std::sync::Arc;
use tokio::sync::watch;

use crate::errors::Result;
use crate::store::watchlist_store::WatchlistStore;

type Query<T> = Box<dyn Fn(&WatchlistStore) -> Result<T> + Send + Sync>;

/// A query that re-runs whenever the store commits a write.
///
/// The first `next()` yields the current snapshot immediately; every later
/// call waits for the next change and yields a fresh snapshot.
pub struct LiveQuery<T> {
    store: Arc<WatchlistStore>,
    changes: watch::Receiver<u64>,
    query: Query<T>,
    primed: bool,
}

impl<T> LiveQuery<T> {
    pub(crate) fn new(store: Arc<WatchlistStore>, query: Query<T>) -> Self {
        let changes = store.subscribe();
        Self {
            store,
            changes,
            query,
            primed: false,
        }
    }

    pub async fn next(&mut self) -> Option<Result<T>> {
        if self.primed {
            // store 被持有期间发送端不会关闭
            self.changes.changed().await.ok()?;
        } else {
            self.primed = true;
        }
        self.changes.borrow_and_update();
        Some((self.query)(&self.store))
    }
}
