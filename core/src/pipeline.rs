//! The analysis pipeline: simulate, aggregate, test, report.
//!
//! STAGES (run once, in order):
//!   1. Event simulation   (skipped when an event table is supplied)
//!   2. KPI aggregation
//!   3. AOV t-test
//!   4. CVR chi-squared test
//!   5. Chart data assembly
//!
//! RULES:
//!   - Every stage reads only the output of the stage before it.
//!   - All randomness flows through one SimRng seeded from the config.

use crate::{
    config::ExperimentConfig,
    event::EventTable,
    kpi::{KpiTable, Metric},
    report::{ChartData, ExperimentReport, TestOutcome},
    rng::SimRng,
    simulator::EventSimulator,
    stats::{chi_squared_test, t_test_ind, ContingencyTable},
    types::{RunId, CONTROL, TREATMENT},
};

pub struct ExperimentPipeline {
    pub run_id: RunId,
    config:     ExperimentConfig,
}

impl ExperimentPipeline {
    pub fn build(run_id: RunId, config: ExperimentConfig) -> Self {
        Self { run_id, config }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Simulate a fresh event table from the configured seed.
    pub fn simulate(&self) -> EventTable {
        let mut rng = SimRng::new(self.config.seed);
        EventSimulator::new(&self.config).run(&mut rng)
    }

    /// Simulate, then analyze.
    pub fn run(&self) -> ExperimentReport {
        log::info!("[{}] simulating with seed {}", self.run_id, self.config.seed);
        let events = self.simulate();
        let mut report = self.analyze(&events);
        report.seed = Some(self.config.seed);
        report
    }

    /// Aggregate and test an existing event table.
    /// KPIs and chart data are always produced; a test that is undefined
    /// for this data is recorded as skipped.
    pub fn analyze(&self, events: &EventTable) -> ExperimentReport {
        let kpis = KpiTable::from_events(events);

        let aov_test = TestOutcome::from_result(
            "AOV t-test",
            t_test_ind(
                &kpis.series(TREATMENT, Metric::Aov),
                &kpis.series(CONTROL, Metric::Aov),
                self.config.t_test_variance,
            ),
        );
        if let Some(t) = aov_test.computed() {
            log::info!(
                "[{}] AOV t-test: t={:.4} p={:.4}",
                self.run_id,
                t.statistic,
                t.p_value
            );
        }

        let (contingency, cvr_test) = match ContingencyTable::from_kpis(&kpis, CONTROL, TREATMENT) {
            Ok(table) => {
                let test = chi_squared_test(&table, self.config.yates_correction);
                (Some(table), TestOutcome::from_result("CVR chi-squared", test))
            }
            Err(e) => (None, TestOutcome::from_result("CVR chi-squared", Err(e))),
        };
        if let Some(c) = cvr_test.computed() {
            log::info!(
                "[{}] CVR chi-squared: chi2={:.4} p={:.4} dof={}",
                self.run_id,
                c.statistic,
                c.p_value,
                c.dof
            );
        }

        let totals = events
            .groups()
            .into_iter()
            .map(|g| {
                let t = kpis.totals(&g);
                (g, t)
            })
            .collect();

        ExperimentReport {
            run_id: self.run_id.clone(),
            seed: None,
            event_count: events.len(),
            significance_level: self.config.significance_level,
            totals,
            charts: ChartData::build(events, &kpis),
            kpis,
            aov_test,
            contingency,
            cvr_test,
        }
    }
}

