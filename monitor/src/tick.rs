use std::collections::{HashMap, VecDeque};

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// Default history kept per instrument: one trading session.
pub const DEFAULT_MAX_AGE_SECS: i64 = 6 * 60 * 60;

/// One timestamped row of precomputed indicator columns for one instrument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub observed_at: NaiveDateTime,
    #[serde(default)]
    pub columns: HashMap<String, f64>,
}

impl Tick {
    pub fn new(observed_at: NaiveDateTime) -> Self {
        Self {
            observed_at,
            columns: HashMap::new(),
        }
    }

    /// Builder-style column setter.
    pub fn with(mut self, column: impl Into<String>, value: f64) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: f64) {
        self.columns.insert(column.into(), value);
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Read a column, rejecting missing and non-finite values.
    pub fn value(&self, column: &str) -> Result<f64, MonitorError> {
        match self.columns.get(column) {
            None => Err(MonitorError::MissingColumn {
                column: column.to_string(),
            }),
            Some(v) if !v.is_finite() => Err(MonitorError::NonFinite {
                column: column.to_string(),
                value: *v,
            }),
            Some(v) => Ok(*v),
        }
    }
}

/// Time-indexed table of ticks for one instrument, newest last.
///
/// Rows older than `max_age` (measured from the newest row) are evicted on
/// every push, so the window always covers the recent session only.
#[derive(Clone, Debug)]
pub struct TickWindow {
    rows: VecDeque<Tick>,
    max_age: TimeDelta,
}

impl Default for TickWindow {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_MAX_AGE_SECS))
    }
}

impl TickWindow {
    pub fn new(max_age: TimeDelta) -> Self {
        Self {
            rows: VecDeque::new(),
            max_age,
        }
    }

    /// Window over a fixed set of rows, never evicting.
    pub fn from_rows(rows: impl IntoIterator<Item = Tick>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
            max_age: TimeDelta::MAX,
        }
    }

    /// Append `tick` and evict rows older than `max_age`. The pushed row
    /// always survives, whatever `max_age` is.
    pub fn push(&mut self, tick: Tick) {
        let now = tick.observed_at;
        self.rows.push_back(tick);
        self.evict_old(now);
    }

    fn evict_old(&mut self, now: NaiveDateTime) {
        while self.rows.len() > 1
            && self
                .rows
                .front()
                .is_some_and(|front| now.signed_duration_since(front.observed_at) > self.max_age)
        {
            self.rows.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&Tick> {
        self.rows.back()
    }

    /// Every row before the latest one.
    pub fn history(&self) -> impl Iterator<Item = &Tick> {
        self.rows.iter().take(self.rows.len().saturating_sub(1))
    }

    pub fn rows(&self) -> impl Iterator<Item = &Tick> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
