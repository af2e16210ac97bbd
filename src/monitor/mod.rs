// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Performance monitor
//!
//! Aggregates tester and comparator events into time-windowed metrics.
//! Raw events live for a retention window, then roll into per-model daily
//! aggregates which age out in turn. Where a record lands is a pure
//! function of its timestamp and "now", so the eviction policy is
//! directly testable.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::settings::RetentionConfig;
use crate::error::{EvalError, Result};

/// One normalized observation of a model invocation or probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Model the observation belongs to
    pub model_id: String,

    /// When the call happened
    pub timestamp: DateTime<Utc>,

    /// Whether the call succeeded
    pub success: bool,

    /// Latency of the call; set for successful calls
    pub latency: Option<Duration>,

    /// Cost attributed to the call in USD
    pub cost: f64,
}

/// Window over which metrics are requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Day,
    Week,
    Month,
}

impl Timeframe {
    /// Window length in days
    pub fn days(&self) -> u64 {
        match self {
            Timeframe::Day => 1,
            Timeframe::Week => 7,
            Timeframe::Month => 30,
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1d" | "day" => Ok(Timeframe::Day),
            "7d" | "week" => Ok(Timeframe::Week),
            "30d" | "month" => Ok(Timeframe::Month),
            other => Err(EvalError::Validation(format!(
                "unknown timeframe '{}': expected 1d, 7d or 30d",
                other
            ))),
        }
    }
}

/// Aggregated metrics over a window. Zeroed when no data covers it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Average latency of successful calls, in milliseconds
    pub avg_latency_ms: f64,

    /// Fraction of calls that succeeded
    pub success_rate: f64,

    /// Total attributed cost in USD
    pub total_cost: f64,

    /// Number of calls covered
    pub sample_count: u64,
}

/// Where a record belongs relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Young enough to stay raw
    Raw,
    /// Past the raw window, belongs in a daily aggregate
    Aggregate,
    /// Past the aggregate window, dropped entirely
    Evict,
}

/// Classify an event timestamp against the retention policy.
/// Pure: same inputs always classify the same way.
pub fn disposition(
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
    retention: &RetentionConfig,
) -> Disposition {
    let age = now.signed_duration_since(timestamp);
    if age <= chrono::Duration::hours(retention.raw_retention_hours as i64) {
        Disposition::Raw
    } else if age <= chrono::Duration::days(retention.aggregate_retention_days as i64) {
        Disposition::Aggregate
    } else {
        Disposition::Evict
    }
}

/// Per-model, per-day rollup of aged-out raw events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DailyAggregate {
    count: u64,
    successes: u64,
    /// Latency sum over successful calls, in milliseconds
    latency_ms_sum: f64,
    total_cost: f64,
}

impl DailyAggregate {
    fn absorb(&mut self, event: &EventRecord) {
        self.count += 1;
        if event.success {
            self.successes += 1;
            if let Some(latency) = event.latency {
                self.latency_ms_sum += latency.as_secs_f64() * 1000.0;
            }
        }
        self.total_cost += event.cost;
    }
}

#[derive(Default)]
struct MonitorState {
    raw: Vec<EventRecord>,
    daily: BTreeMap<(String, NaiveDate), DailyAggregate>,
}

/// Time-windowed metrics store fed by the Tester and Comparator
pub struct PerformanceMonitor {
    retention: RetentionConfig,
    state: Mutex<MonitorState>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(RetentionConfig::default())
    }
}

impl PerformanceMonitor {
    /// Create a monitor with the given retention policy
    pub fn new(retention: RetentionConfig) -> Self {
        Self {
            retention,
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Append one observation. Appends always land in the raw buffer;
    /// a later sweep moves them onward, so an append can never race a
    /// sweep into being lost.
    pub fn record(&self, event: EventRecord) {
        let mut state = self.state.lock().expect("monitor lock");
        state.raw.push(event);
    }

    /// Roll aged-out raw events into daily aggregates and evict expired
    /// aggregates. Idempotent: sweeping twice at the same instant is a
    /// no-op the second time.
    pub fn sweep(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock().expect("monitor lock");

        let mut kept = Vec::with_capacity(state.raw.len());
        let mut aged = Vec::new();
        for event in state.raw.drain(..) {
            match disposition(event.timestamp, now, &self.retention) {
                Disposition::Raw => kept.push(event),
                Disposition::Aggregate => aged.push(event),
                Disposition::Evict => {}
            }
        }
        state.raw = kept;

        for event in aged {
            let key = (event.model_id.clone(), event.timestamp.date_naive());
            state.daily.entry(key).or_default().absorb(&event);
        }

        let cutoff = now
            .date_naive()
            .checked_sub_days(Days::new(self.retention.aggregate_retention_days))
            .unwrap_or(NaiveDate::MIN);
        let before = state.daily.len();
        state.daily.retain(|(_, date), _| *date >= cutoff);
        let evicted = before - state.daily.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted expired daily aggregates");
        }
    }

    /// Metrics for one model over the requested window ending at `now`.
    /// Returns zeroed metrics (not an error) when no data covers it.
    pub fn get_metrics(&self, model_id: &str, timeframe: Timeframe, now: DateTime<Utc>) -> Metrics {
        let state = self.state.lock().expect("monitor lock");
        let window_start = now - chrono::Duration::days(timeframe.days() as i64);

        let mut count: u64 = 0;
        let mut successes: u64 = 0;
        let mut latency_ms_sum = 0.0;
        let mut total_cost = 0.0;

        for event in state
            .raw
            .iter()
            .filter(|e| e.model_id == model_id)
            .filter(|e| e.timestamp > window_start && e.timestamp <= now)
        {
            count += 1;
            if event.success {
                successes += 1;
                if let Some(latency) = event.latency {
                    latency_ms_sum += latency.as_secs_f64() * 1000.0;
                }
            }
            total_cost += event.cost;
        }

        let start_date = window_start.date_naive();
        for ((id, date), aggregate) in state.daily.iter() {
            if id == model_id && *date >= start_date && *date <= now.date_naive() {
                count += aggregate.count;
                successes += aggregate.successes;
                latency_ms_sum += aggregate.latency_ms_sum;
                total_cost += aggregate.total_cost;
            }
        }

        if count == 0 {
            return Metrics::default();
        }
        Metrics {
            avg_latency_ms: if successes > 0 {
                latency_ms_sum / successes as f64
            } else {
                0.0
            },
            success_rate: successes as f64 / count as f64,
            total_cost,
            sample_count: count,
        }
    }

    /// Current raw event count, for tests and introspection
    pub fn raw_len(&self) -> usize {
        self.state.lock().expect("monitor lock").raw.len()
    }
}
