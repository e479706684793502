use abtest_core::{
    config::ExperimentConfig,
    kpi::{KpiTable, Metric},
    rng::SimRng,
    simulator::EventSimulator,
    stats::ContingencyTable,
    types::{CONTROL, TREATMENT},
};
use approx::assert_relative_eq;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn reference_tables(seed: u64) -> (abtest_core::event::EventTable, KpiTable) {
    let config = ExperimentConfig::reference();
    let mut rng = SimRng::new(seed);
    let events = EventSimulator::new(&config).run(&mut rng);
    let kpis = KpiTable::from_events(&events);
    (events, kpis)
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Exactly one row per (group, date): 2 groups × 30 days.
#[test]
fn one_row_per_group_and_day() {
    let (_, kpis) = reference_tables(42);
    assert_eq!(kpis.len(), 60);

    let mut keys: Vec<_> = kpis.rows().iter().map(|r| (r.group.clone(), r.date)).collect();
    let before = keys.len();
    keys.dedup();
    assert_eq!(keys.len(), before, "duplicate (group, date) rows");

    // Ordered by group, then date.
    let groups: Vec<&str> = kpis.rows().iter().map(|r| r.group.as_str()).collect();
    assert!(groups[..30].iter().all(|g| *g == CONTROL));
    assert!(groups[30..].iter().all(|g| *g == TREATMENT));
    assert!(kpis.rows()[..30].windows(2).all(|w| w[0].date < w[1].date));
}

/// CVR and CTR are percentages; AOV is non-negative.
#[test]
fn ratio_bounds_hold() {
    let (_, kpis) = reference_tables(5);
    for r in kpis.rows() {
        assert!((0.0..=100.0).contains(&r.cvr), "CVR {} out of range", r.cvr);
        assert!((0.0..=100.0).contains(&r.ctr), "CTR {} out of range", r.ctr);
        assert!(r.aov >= 0.0, "AOV {} negative", r.aov);
        assert!(r.clicks <= r.views && r.purchases <= r.clicks);
        if r.purchases == 0 {
            assert_eq!(r.aov, 0.0);
        }
    }
}

/// Aggregation partitions the event table: daily views sum to the group's rows.
#[test]
fn aggregation_is_a_partition() {
    let (events, kpis) = reference_tables(77);
    for group in [CONTROL, TREATMENT] {
        let rows = events.rows().iter().filter(|e| e.group == group);
        let (count, revenue) = rows.fold((0u64, 0.0), |(n, r), e| (n + 1, r + e.revenue));

        let daily_views: u64 = kpis.for_group(group).map(|r| r.views).sum();
        assert_eq!(daily_views, count);

        let totals = kpis.totals(group);
        assert_eq!(totals.views, count);
        assert_relative_eq!(totals.revenue, revenue, max_relative = 1e-9);
    }
    let all_views: u64 = kpis.rows().iter().map(|r| r.views).sum();
    assert_eq!(all_views as usize, events.len());
}

/// Purchases + non-purchases equals total views for each group.
#[test]
fn contingency_rows_sum_to_views() {
    let (_, kpis) = reference_tables(13);
    let table = ContingencyTable::from_kpis(&kpis, CONTROL, TREATMENT).expect("table");
    for (row, group) in [CONTROL, TREATMENT].iter().enumerate() {
        assert_eq!(table.row_total(row), kpis.totals(group).views);
        assert_eq!(table.observed[row][0], kpis.totals(group).purchases);
    }
}

/// Missing group in the KPI table is reported, not silently zeroed.
#[test]
fn contingency_requires_both_groups() {
    let (_, kpis) = reference_tables(13);
    assert!(ContingencyTable::from_kpis(&kpis, CONTROL, "holdout").is_err());
}

/// Cumulative revenue is the running sum of the daily revenue series.
#[test]
fn cumulative_revenue_is_running_sum() {
    let (_, kpis) = reference_tables(21);
    let daily = kpis.series(TREATMENT, Metric::Revenue);
    let cumulative = kpis.cumulative_revenue(TREATMENT);
    assert_eq!(daily.len(), cumulative.len());

    let mut acc = 0.0;
    for (d, c) in daily.iter().zip(&cumulative) {
        acc += d;
        assert_relative_eq!(acc, *c, max_relative = 1e-12);
    }
    assert!(cumulative.windows(2).all(|w| w[0] <= w[1]));
}
