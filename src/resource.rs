use log::debug;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::errors::Result;

/// 异步操作的三种状态
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> Resource<T> {
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Resource::Success(value),
            Err(e) => Resource::Error(e.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_loading()
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Resource::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Resource::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resource<U> {
        match self {
            Resource::Loading => Resource::Loading,
            Resource::Success(value) => Resource::Success(f(value)),
            Resource::Error(message) => Resource::Error(message),
        }
    }
}

/// A cancelable sequence of `Resource` states: `Loading`, then exactly one
/// terminal state.
///
/// The work runs on its own tokio task. Dropping the stream aborts the task,
/// so nothing is delivered to a consumer that has gone away.
pub struct ResourceStream<T> {
    rx: mpsc::Receiver<Resource<T>>,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> ResourceStream<T> {
    /// 启动任务，必须在 tokio 运行时内调用
    pub fn spawn<F>(task: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(2);
        let handle = tokio::spawn(async move {
            if tx.send(Resource::Loading).await.is_err() {
                return;
            }
            let state = Resource::from_result(task.await);
            if tx.send(state).await.is_err() {
                debug!("Resource consumer went away before the terminal state");
            }
        });
        Self { rx, handle }
    }
}

impl<T> ResourceStream<T> {
    /// 下一个状态；终态之后返回 None
    pub async fn next(&mut self) -> Option<Resource<T>> {
        self.rx.recv().await
    }

    /// 跳过 Loading，等待终态
    pub async fn settle(mut self) -> Resource<T> {
        while let Some(state) = self.next().await {
            if state.is_terminal() {
                return state;
            }
        }
        Resource::Error("Resource stream closed before completion".to_string())
    }
}

impl<T> Drop for ResourceStream<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
