use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub current: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: f64,
    pub as_of: Option<DateTime<Utc>>,
}

impl PriceSnapshot {
    /// Reason the snapshot cannot feed the day-range math, if any.
    pub fn unusable_reason(&self) -> Option<String> {
        let fields = [self.current, self.high, self.low, self.previous_close];
        if fields.iter().any(|v| !v.is_finite()) {
            return Some("snapshot contains non-finite prices".into());
        }
        if self.current <= 0.0 {
            return Some(format!("current price is {}", self.current));
        }
        if self.previous_close <= 0.0 {
            return Some(format!("previous close is {}", self.previous_close));
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Most recent bar gives current/high/low, the one before it the previous close.
pub fn snapshot_from_bars(bars: &[DailyBar]) -> Option<PriceSnapshot> {
    let [.., prev, last] = bars else {
        return None;
    };

    Some(PriceSnapshot {
        current: last.close,
        high: last.high,
        low: last.low,
        previous_close: prev.close,
        as_of: last
            .date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    FiveDays,
    OneYear,
}

impl HistoryRange {
    pub fn as_query(&self) -> &'static str {
        match self {
            HistoryRange::FiveDays => "5d",
            HistoryRange::OneYear => "1y",
        }
    }
}
