//! Daily KPI aggregation per (group, date).
//!
//! Funnel counting: every row started as a view, so `views` counts all rows,
//! `clicks` counts rows that reached click or purchase, `purchases` counts
//! purchase rows.
//!
//! Ratios are computed raw first and then passed through `sanitize_ratio`:
//! a zero denominator yields 0, never NaN or infinity.

use crate::{
    event::{EventTable, EventType},
    types::GroupName,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts and revenue for one (group, date) before ratios are derived.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyCounts {
    pub views:     u64,
    pub clicks:    u64,
    pub purchases: u64,
    pub revenue:   f64,
}

impl DailyCounts {
    fn record(&mut self, event_type: EventType, revenue: f64) {
        self.views += 1;
        if event_type.clicked() {
            self.clicks += 1;
        }
        if event_type == EventType::Purchase {
            self.purchases += 1;
        }
        self.revenue += revenue;
    }
}

/// Ratios as computed, before zero-denominator substitution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRatios {
    pub cvr: f64,
    pub aov: f64,
    pub ctr: f64,
}

impl RawRatios {
    pub fn compute(counts: &DailyCounts) -> Self {
        let views = counts.views as f64;
        let purchases = counts.purchases as f64;
        Self {
            cvr: purchases / views * 100.0,
            aov: counts.revenue / purchases,
            ctr: counts.clicks as f64 / views * 100.0,
        }
    }

    pub fn sanitize(self) -> KpiRatios {
        KpiRatios {
            cvr: sanitize_ratio(self.cvr),
            aov: sanitize_ratio(self.aov),
            ctr: sanitize_ratio(self.ctr),
        }
    }
}

/// Ratios safe to report: every value is finite.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct KpiRatios {
    pub cvr: f64,
    pub aov: f64,
    pub ctr: f64,
}

/// Map NaN and ±infinity to 0. Finite values pass through unchanged.
pub fn sanitize_ratio(raw: f64) -> f64 {
    if raw.is_finite() {
        raw
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cvr,
    Aov,
    Ctr,
    Revenue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiRow {
    pub group:     GroupName,
    pub date:      NaiveDate,
    pub views:     u64,
    pub clicks:    u64,
    pub purchases: u64,
    pub revenue:   f64,
    #[serde(rename = "CVR")]
    pub cvr:       f64,
    #[serde(rename = "AOV")]
    pub aov:       f64,
    #[serde(rename = "CTR")]
    pub ctr:       f64,
}

impl KpiRow {
    pub fn from_counts(group: GroupName, date: NaiveDate, counts: DailyCounts) -> Self {
        let ratios = RawRatios::compute(&counts).sanitize();
        Self {
            group,
            date,
            views:     counts.views,
            clicks:    counts.clicks,
            purchases: counts.purchases,
            revenue:   counts.revenue,
            cvr:       ratios.cvr,
            aov:       ratios.aov,
            ctr:       ratios.ctr,
        }
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cvr     => self.cvr,
            Metric::Aov     => self.aov,
            Metric::Ctr     => self.ctr,
            Metric::Revenue => self.revenue,
        }
    }
}

/// Whole-period totals for one group.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupTotals {
    pub views:     u64,
    pub clicks:    u64,
    pub purchases: u64,
    pub revenue:   f64,
}

impl GroupTotals {
    pub fn non_purchases(&self) -> u64 {
        self.views - self.purchases
    }

    /// Overall ratios for the period, sanitized like the daily ones.
    pub fn ratios(&self) -> KpiRatios {
        RawRatios::compute(&DailyCounts {
            views:     self.views,
            clicks:    self.clicks,
            purchases: self.purchases,
            revenue:   self.revenue,
        })
        .sanitize()
    }
}

/// One row per (group, date) present in the event table, ordered by group
/// then date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KpiTable {
    rows: Vec<KpiRow>,
}

impl KpiTable {
    pub fn from_events(events: &EventTable) -> Self {
        let mut buckets: BTreeMap<(GroupName, NaiveDate), DailyCounts> = BTreeMap::new();
        for event in events.rows() {
            buckets
                .entry((event.group.clone(), event.date))
                .or_default()
                .record(event.event_type, event.revenue);
        }

        let rows: Vec<KpiRow> = buckets
            .into_iter()
            .map(|((group, date), counts)| KpiRow::from_counts(group, date, counts))
            .collect();
        log::info!("Aggregated {} events into {} KPI rows", events.len(), rows.len());
        Self { rows }
    }

    pub fn rows(&self) -> &[KpiRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn for_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a KpiRow> + 'a {
        self.rows.iter().filter(move |r| r.group == group)
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.rows.iter().any(|r| r.group == group)
    }

    /// Daily series of one metric for a group, in date order.
    pub fn series(&self, group: &str, metric: Metric) -> Vec<f64> {
        self.for_group(group).map(|r| r.metric(metric)).collect()
    }

    /// Running sum of daily revenue for a group.
    pub fn cumulative_revenue(&self, group: &str) -> Vec<f64> {
        self.for_group(group)
            .scan(0.0, |acc, r| {
                *acc += r.revenue;
                Some(*acc)
            })
            .collect()
    }

    pub fn totals(&self, group: &str) -> GroupTotals {
        self.for_group(group).fold(GroupTotals::default(), |mut t, r| {
            t.views += r.views;
            t.clicks += r.clicks;
            t.purchases += r.purchases;
            t.revenue += r.revenue;
            t
        })
    }
}
