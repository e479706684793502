//! Report assembly: everything a reader needs to judge the experiment.
//!
//! ChartData holds the series behind the notebook-style plots. Rendering is
//! left to whoever consumes the report.

use crate::{
    error::AnalysisResult,
    event::{EventTable, TypeCounts},
    kpi::{GroupTotals, KpiTable, Metric},
    stats::{ChiSquaredResult, ContingencyTable, TTestResult},
    types::{GroupName, RunId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupSeries {
    pub dates:              Vec<NaiveDate>,
    pub daily_events:       Vec<u64>,
    pub aov:                Vec<f64>,
    pub cvr:                Vec<f64>,
    pub revenue:            Vec<f64>,
    pub cumulative_revenue: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartData {
    pub event_distribution: BTreeMap<GroupName, TypeCounts>,
    pub series:             BTreeMap<GroupName, GroupSeries>,
}

impl ChartData {
    pub fn build(events: &EventTable, kpis: &KpiTable) -> Self {
        let daily = events.daily_counts();
        let series = events
            .groups()
            .into_iter()
            .map(|group| {
                let dates: Vec<NaiveDate> = kpis.for_group(&group).map(|r| r.date).collect();
                let daily_events = dates
                    .iter()
                    .map(|d| daily.get(&(group.clone(), *d)).copied().unwrap_or(0))
                    .collect();
                let s = GroupSeries {
                    dates,
                    daily_events,
                    aov: kpis.series(&group, Metric::Aov),
                    cvr: kpis.series(&group, Metric::Cvr),
                    revenue: kpis.series(&group, Metric::Revenue),
                    cumulative_revenue: kpis.cumulative_revenue(&group),
                };
                (group, s)
            })
            .collect();

        Self {
            event_distribution: events.type_counts(),
            series,
        }
    }
}

/// Result of one hypothesis test. A test that is undefined for the data
/// (too few days, zero variance, a missing group) is skipped with a reason;
/// the rest of the report is still produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome<T> {
    Computed { result: T },
    Skipped { reason: String },
}

impl<T> TestOutcome<T> {
    pub fn from_result(name: &str, result: AnalysisResult<T>) -> Self {
        match result {
            Ok(result) => Self::Computed { result },
            Err(e) => {
                log::warn!("{name} skipped: {e}");
                Self::Skipped { reason: e.to_string() }
            }
        }
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            Self::Computed { result } => Some(result),
            Self::Skipped { .. } => None,
        }
    }

    pub fn skipped_reason(&self) -> Option<&str> {
        match self {
            Self::Computed { .. } => None,
            Self::Skipped { reason } => Some(reason.as_str()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentReport {
    pub run_id:             RunId,
    /// None when the events were imported rather than simulated.
    pub seed:               Option<u64>,
    pub event_count:        usize,
    pub significance_level: f64,
    pub totals:             BTreeMap<GroupName, GroupTotals>,
    pub kpis:               KpiTable,
    pub aov_test:           TestOutcome<TTestResult>,
    /// None when either group is missing from the KPI table.
    pub contingency:        Option<ContingencyTable>,
    pub cvr_test:           TestOutcome<ChiSquaredResult>,
    pub charts:             ChartData,
}
