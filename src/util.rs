use futures::future::join_all;
use log::debug;
use std::future::Future;

use crate::errors::Result;

/// 解析接口返回的数值字符串，失败（含 NaN / inf）时返回 0.0
pub fn parse_price(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// 一次容错调用的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Settled<T> {
    pub value: T,
    pub was_fallback: bool,
}

/// 并发等待所有任务完成，失败的任务用各自的回退值代替
///
/// 单个任务失败不会中断其余任务，输出顺序与输入一致。
pub async fn settle_all<T, F>(tasks: impl IntoIterator<Item = (T, F)>) -> Vec<Settled<T>>
where
    F: Future<Output = Result<T>>,
{
    join_all(tasks.into_iter().map(|(fallback, task)| async move {
        match task.await {
            Ok(value) => Settled { value, was_fallback: false },
            Err(e) => {
                debug!("Task failed, using fallback value: {}", e);
                Settled { value: fallback, was_fallback: true }
            }
        }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TradyError;
    use std::future::ready;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("150.25"), 150.25);
        assert_eq!(parse_price(" 3 "), 3.0);
        assert_eq!(parse_price("None"), 0.0);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("NaN"), 0.0);
    }

    #[tokio::test]
    async fn test_settle_all_keeps_order_and_marks_fallbacks() {
        let tasks = vec![
            (0, ready(Ok(10))),
            (-1, ready(Err(TradyError::EmptyResponse))),
            (0, ready(Ok(30))),
        ];
        let settled = settle_all(tasks).await;
        assert_eq!(
            settled,
            vec![
                Settled { value: 10, was_fallback: false },
                Settled { value: -1, was_fallback: true },
                Settled { value: 30, was_fallback: false },
            ]
        );
    }

    #[tokio::test]
    async fn test_settle_all_empty() {
        let tasks: Vec<(i32, std::future::Ready<Result<i32>>)> = Vec::new();
        assert!(settle_all(tasks).await.is_empty());
    }
}
