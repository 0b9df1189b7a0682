//! Range filtering of daily series for charting.
//!
//! A `DailySeries` arrives as an unordered date → bar mapping. The functions
//! here sort it, cut it down to the requested lookback window and turn close
//! prices into plottable floats.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use log::warn;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::TradyError;
use crate::models::market::{DailyBar, DailySeries};
use crate::util::parse_price;

/// Lookback window for the price chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Range {
    #[default]
    OneDay,
    OneWeek,
    OneMonth,
    SixMonths,
    OneYear,
}

impl Range {
    pub const ALL: [Range; 5] = [
        Range::OneDay,
        Range::OneWeek,
        Range::OneMonth,
        Range::SixMonths,
        Range::OneYear,
    ];

    /// 回看天数，1D 只取最新一条，没有天数
    pub fn lookback_days(&self) -> Option<i64> {
        match self {
            Range::OneDay => None,
            Range::OneWeek => Some(7),
            Range::OneMonth => Some(30),
            Range::SixMonths => Some(180),
            Range::OneYear => Some(365),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Range::OneDay => "1D",
            Range::OneWeek => "1W",
            Range::OneMonth => "1M",
            Range::SixMonths => "6M",
            Range::OneYear => "1Y",
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Range {
    type Err = TradyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Range::ALL
            .iter()
            .find(|r| r.label().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| TradyError::InvalidInput(format!("Unknown range: {}", s)))
    }
}

/// One plottable point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: String,
    pub close: f64,
}

/// 按当前本地日期过滤
pub fn filter_series(series: &DailySeries, range: Range) -> Vec<PricePoint> {
    filter_series_at(series, range, Local::now().date_naive())
}

/// Filter `series` to `range` as seen from `today`.
///
/// Output is ascending by date. Dates are unique because they are the keys of
/// the source mapping. For windowed ranges the cutoff `today - N days` is
/// inclusive. A close price that fails to parse becomes `0.0`.
pub fn filter_series_at(series: &DailySeries, range: Range, today: NaiveDate) -> Vec<PricePoint> {
    // ISO 日期按字典序排序即为时间顺序
    let mut entries: Vec<(&String, &DailyBar)> = series.series.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let selected: Vec<(&String, &DailyBar)> = match range.lookback_days() {
        None => entries.last().copied().into_iter().collect(),
        Some(days) => {
            let cutoff = today - Duration::days(days);
            entries
                .into_iter()
                .filter(|(date, _)| match series_date(date) {
                    Some(d) => d >= cutoff,
                    None => {
                        warn!("Skipping series entry with unreadable date: {}", date);
                        false
                    }
                })
                .collect()
        }
    };

    selected
        .into_iter()
        .map(|(date, bar)| PricePoint {
            date: date.clone(),
            close: parse_price(&bar.close),
        })
        .collect()
}

fn series_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Price and change within the selected window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SeriesSummary {
    pub current_price: f64,
    pub percent_change: f64,
}

impl SeriesSummary {
    pub fn from_points(points: &[PricePoint]) -> Self {
        let current_price = points.last().map(|p| p.close).unwrap_or(0.0);
        let first = points.first().map(|p| p.close).unwrap_or(current_price);
        let percent_change = if first == 0.0 {
            0.0
        } else {
            (current_price - first) / first * 100.0
        };
        Self {
            current_price,
            percent_change,
        }
    }
}

enum LabelDate {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
}

fn parse_label_date(raw: &str) -> Option<LabelDate> {
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(LabelDate::DateTime)
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(LabelDate::Date)
        })
}

/// 图表横轴标签
///
/// 1D 只显示时间；日线数据没有时间部分，取字符串末尾 5 个字符（`MM-DD`）。
/// 其他区间无法解析时原样返回。
pub fn axis_label(raw: &str, range: Range) -> String {
    match (range, parse_label_date(raw)) {
        (Range::OneDay, Some(LabelDate::DateTime(dt))) => dt.format("%H:%M").to_string(),
        (Range::OneDay, _) => tail_chars(raw.trim(), 5),
        (_, None) => raw.to_string(),
        (range, Some(parsed)) => {
            let format = match range {
                Range::OneWeek => "%a",
                Range::OneMonth => "%d",
                _ => "%m/%d",
            };
            match parsed {
                LabelDate::DateTime(dt) => dt.format(format).to_string(),
                LabelDate::Date(d) => d.format(format).to_string(),
            }
        }
    }
}

/// 图表浮层上显示的完整日期
///
/// 1D 只有带时间的值才重新格式化，纯日期原样返回。
pub fn marker_label(raw: &str, range: Range) -> String {
    match (range, parse_label_date(raw)) {
        (Range::OneDay, Some(LabelDate::DateTime(dt))) => dt.format("%d-%m-%Y %H:%M").to_string(),
        (Range::OneDay, _) | (_, None) => raw.to_string(),
        (_, Some(LabelDate::DateTime(dt))) => dt.format("%d-%m-%Y").to_string(),
        (_, Some(LabelDate::Date(d))) => d.format("%d-%m-%Y").to_string(),
    }
}

fn tail_chars(raw: &str, n: usize) -> String {
    let skip = raw.chars().count().saturating_sub(n);
    raw.chars().skip(skip).collect()
}
