//! Hypothesis tests comparing treatment against control.
//!
//! - AOV: independent two-sample t-test over the per-day AOV series.
//! - CVR: chi-squared test of independence on the 2x2 table of
//!   purchases vs non-purchases per group.
//!
//! Nothing here decides the experiment. Results carry the statistic and
//! p-value; comparing against a significance level is the reader's call.

use crate::{
    config::VarianceAssumption,
    error::{AnalysisError, AnalysisResult},
    kpi::KpiTable,
    types::GroupName,
};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

/// Common surface of every test result.
pub trait HypothesisTest {
    fn statistic(&self) -> f64;

    fn p_value(&self) -> f64;

    /// True when the null hypothesis would be rejected at `alpha`.
    fn is_significant(&self, alpha: f64) -> bool {
        self.p_value() < alpha
    }
}

// ── Two-sample t-test ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TTestResult {
    /// Positive when the treatment mean is larger.
    pub statistic:      f64,
    /// Two-sided.
    pub p_value:        f64,
    pub df:             f64,
    pub variance:       VarianceAssumption,
    pub treatment_mean: f64,
    pub control_mean:   f64,
}

impl HypothesisTest for TTestResult {
    fn statistic(&self) -> f64 {
        self.statistic
    }

    fn p_value(&self) -> f64 {
        self.p_value
    }
}

/// Independent two-sample t-test of `treatment` against `control`.
pub fn t_test_ind(
    treatment: &[f64],
    control: &[f64],
    variance: VarianceAssumption,
) -> AnalysisResult<TTestResult> {
    let smallest = treatment.len().min(control.len());
    if smallest < 2 {
        return Err(AnalysisError::InsufficientData {
            test: "t-test",
            required: 2,
            actual: smallest,
        });
    }

    let n1 = treatment.len() as f64;
    let n2 = control.len() as f64;
    let (m1, v1) = mean_and_variance(treatment);
    let (m2, v2) = mean_and_variance(control);

    let (se, df) = match variance {
        VarianceAssumption::Equal => {
            let df = n1 + n2 - 2.0;
            let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df;
            ((pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), df)
        }
        VarianceAssumption::Welch => {
            let a = v1 / n1;
            let b = v2 / n2;
            let df = (a + b).powi(2) / (a * a / (n1 - 1.0) + b * b / (n2 - 1.0));
            ((a + b).sqrt(), df)
        }
    };
    if se == 0.0 || !se.is_finite() {
        return Err(AnalysisError::ZeroVariance);
    }

    let statistic = (m1 - m2) / se;
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| AnalysisError::Distribution(e.to_string()))?;
    let p_value = (2.0 * dist.sf(statistic.abs())).min(1.0);

    log::debug!("t-test ({variance:?}): t={statistic:.4} df={df:.2} p={p_value:.4}");
    Ok(TTestResult {
        statistic,
        p_value,
        df,
        variance,
        treatment_mean: m1,
        control_mean: m2,
    })
}

/// Sample mean and unbiased (n - 1) variance.
fn mean_and_variance(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let ss: f64 = xs.iter().map(|x| (x - mean).powi(2)).sum();
    (mean, ss / (n - 1.0))
}

// ── Chi-squared test of independence ────────────────────────────────────────

/// Rows are groups, columns are [purchases, non-purchases].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContingencyTable {
    pub groups:   [GroupName; 2],
    pub observed: [[u64; 2]; 2],
}

impl ContingencyTable {
    pub fn new(groups: [GroupName; 2], observed: [[u64; 2]; 2]) -> Self {
        Self { groups, observed }
    }

    /// Whole-period purchases and non-purchases for two groups.
    pub fn from_kpis(kpis: &KpiTable, control: &str, treatment: &str) -> AnalysisResult<Self> {
        let mut observed = [[0u64; 2]; 2];
        for (row, group) in [control, treatment].iter().enumerate() {
            if !kpis.has_group(group) {
                return Err(AnalysisError::UnknownGroup { name: group.to_string() });
            }
            let totals = kpis.totals(group);
            observed[row] = [totals.purchases, totals.non_purchases()];
        }
        Ok(Self::new([control.to_string(), treatment.to_string()], observed))
    }

    pub fn row_total(&self, row: usize) -> u64 {
        self.observed[row][0] + self.observed[row][1]
    }

    pub fn column_total(&self, col: usize) -> u64 {
        self.observed[0][col] + self.observed[1][col]
    }

    pub fn total(&self) -> u64 {
        self.row_total(0) + self.row_total(1)
    }

    /// Expected frequencies under independence.
    pub fn expected(&self) -> [[f64; 2]; 2] {
        let total = self.total() as f64;
        let mut expected = [[0.0; 2]; 2];
        for (i, row) in expected.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.row_total(i) as f64 * self.column_total(j) as f64 / total;
            }
        }
        expected
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChiSquaredResult {
    pub statistic: f64,
    pub p_value:   f64,
    pub dof:       u32,
    pub expected:  [[f64; 2]; 2],
    pub yates_correction: bool,
}

impl HypothesisTest for ChiSquaredResult {
    fn statistic(&self) -> f64 {
        self.statistic
    }

    fn p_value(&self) -> f64 {
        self.p_value
    }
}

/// Pearson's chi-squared test of independence.
/// With `yates` set, each |observed - expected| shrinks by up to 0.5.
pub fn chi_squared_test(table: &ContingencyTable, yates: bool) -> AnalysisResult<ChiSquaredResult> {
    let zero_marginal = (0..2).any(|k| table.row_total(k) == 0 || table.column_total(k) == 0);
    if zero_marginal {
        return Err(AnalysisError::DegenerateTable);
    }

    let dof: u32 = 1;
    let apply_yates = yates && dof == 1;
    let expected = table.expected();

    let mut statistic = 0.0;
    for (obs_row, exp_row) in table.observed.iter().zip(&expected) {
        for (&o, &e) in obs_row.iter().zip(exp_row) {
            let mut diff = (o as f64 - e).abs();
            if apply_yates {
                diff -= diff.min(0.5);
            }
            statistic += diff * diff / e;
        }
    }

    let dist = ChiSquared::new(f64::from(dof))
        .map_err(|e| AnalysisError::Distribution(e.to_string()))?;
    let p_value = dist.sf(statistic);

    log::debug!("chi-squared (yates={apply_yates}): chi2={statistic:.4} p={p_value:.4}");
    Ok(ChiSquaredResult {
        statistic,
        p_value,
        dof,
        expected,
        yates_correction: apply_yates,
    })
}
