//! Experiment configuration.
//!
//! Every constant the simulator and the tests need lives here: date range,
//! user pool, per-group funnel probabilities and revenue ranges.
//! `reference()` reproduces the canonical 30-day, two-group experiment.

use crate::{
    error::{AnalysisError, AnalysisResult},
    types::{GroupName, CONTROL, TREATMENT},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Half-open integer range [low, high).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountRange {
    pub low:  u64,
    pub high: u64,
}

/// Half-open real range [low, high).
/// Revenue ranges must satisfy 0 < low < high, so every purchase carries
/// positive revenue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValueRange {
    pub low:  f64,
    pub high: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupConfig {
    pub name: GroupName,
    /// P(view -> click).
    pub click_probability: f64,
    /// Probability of the second, independent purchase draw.
    /// Only rows that clicked can become purchases.
    pub purchase_probability: f64,
    /// Overrides `ExperimentConfig::revenue_range` when set.
    #[serde(default)]
    pub revenue_range: Option<ValueRange>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VarianceAssumption {
    /// Student's t-test with pooled variance.
    #[default]
    Equal,
    /// Welch's t-test with Satterthwaite degrees of freedom.
    Welch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentConfig {
    pub seed:           u64,
    pub start_date:     NaiveDate,
    pub num_days:       u32,
    /// User ids are drawn from 1..=num_users.
    pub num_users:      u64,
    pub events_per_day: CountRange,
    pub revenue_range:  ValueRange,
    pub groups:         Vec<GroupConfig>,
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,
    #[serde(default)]
    pub t_test_variance: VarianceAssumption,
    #[serde(default = "default_yates_correction")]
    pub yates_correction: bool,
}

fn default_significance_level() -> f64 {
    0.05
}

fn default_yates_correction() -> bool {
    true
}

impl ExperimentConfig {
    /// The canonical experiment: 30 days, 1000 users, control vs treatment.
    pub fn reference() -> Self {
        Self {
            seed:           42,
            start_date:     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            num_days:       30,
            num_users:      1_000,
            events_per_day: CountRange { low: 150, high: 200 },
            revenue_range:  ValueRange { low: 10.0, high: 100.0 },
            groups: vec![
                GroupConfig {
                    name: CONTROL.into(),
                    click_probability: 0.10,
                    purchase_probability: 0.20,
                    revenue_range: None,
                },
                GroupConfig {
                    name: TREATMENT.into(),
                    click_probability: 0.12,
                    purchase_probability: 0.25,
                    revenue_range: Some(ValueRange { low: 15.0, high: 110.0 }),
                },
            ],
            significance_level: default_significance_level(),
            t_test_variance: VarianceAssumption::Equal,
            yates_correction: default_yates_correction(),
        }
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: ExperimentConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the preconditions the simulator relies on.
    /// Hand-built configurations are not validated implicitly.
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.num_days == 0 {
            return Err(invalid("num_days must be at least 1"));
        }
        if self.num_users == 0 {
            return Err(invalid("user pool is empty"));
        }
        if self.events_per_day.low >= self.events_per_day.high {
            return Err(invalid(format!(
                "events_per_day [{}, {}) is empty",
                self.events_per_day.low, self.events_per_day.high
            )));
        }
        check_value_range("revenue_range", &self.revenue_range)?;
        if self.groups.is_empty() {
            return Err(invalid("at least one group is required"));
        }

        let mut seen = HashSet::new();
        for group in &self.groups {
            if !seen.insert(group.name.as_str()) {
                return Err(invalid(format!("duplicate group '{}'", group.name)));
            }
            check_probability(&group.name, "click_probability", group.click_probability)?;
            check_probability(&group.name, "purchase_probability", group.purchase_probability)?;
            if let Some(range) = &group.revenue_range {
                check_value_range(&format!("{}.revenue_range", group.name), range)?;
            }
        }

        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(invalid(format!(
                "significance_level {} must be in (0, 1)",
                self.significance_level
            )));
        }
        Ok(())
    }

    pub fn group(&self, name: &str) -> AnalysisResult<&GroupConfig> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| AnalysisError::UnknownGroup { name: name.to_string() })
    }

    /// Revenue range in effect for a group.
    pub fn revenue_range_for(&self, group: &GroupConfig) -> ValueRange {
        group.revenue_range.unwrap_or(self.revenue_range)
    }

    /// The contiguous calendar days of the experiment.
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.num_days)
            .map(|offset| self.start_date + Duration::days(i64::from(offset)))
            .collect()
    }
}

fn invalid(reason: impl Into<String>) -> AnalysisError {
    AnalysisError::InvalidConfig { reason: reason.into() }
}

fn check_probability(group: &str, field: &str, p: f64) -> AnalysisResult<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(invalid(format!("{group}.{field} = {p} is outside [0, 1]")))
    }
}

fn check_value_range(field: &str, range: &ValueRange) -> AnalysisResult<()> {
    if !(range.low > 0.0 && range.low < range.high && range.high.is_finite()) {
        return Err(invalid(format!(
            "{field} [{}, {}) must satisfy 0 < low < high",
            range.low, range.high
        )));
    }
    Ok(())
}
