use abtest_core::{
    config::ExperimentConfig,
    event::EventType,
    rng::SimRng,
    simulator::EventSimulator,
    types::{CONTROL, TREATMENT},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn reference_events(seed: u64) -> abtest_core::event::EventTable {
    let config = ExperimentConfig::reference();
    let mut rng = SimRng::new(seed);
    EventSimulator::new(&config).run(&mut rng)
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Revenue is positive exactly on purchase rows.
#[test]
fn revenue_positive_iff_purchase() {
    init_logging();
    let events = reference_events(42);
    assert!(!events.is_empty());

    for e in events.rows() {
        assert_eq!(
            e.revenue > 0.0,
            e.event_type == EventType::Purchase,
            "row {e:?} breaks revenue/purchase pairing"
        );
    }
}

/// 30 days × 2 groups, each batch within [150, 200).
#[test]
fn reference_run_covers_every_day_and_group() {
    let events = reference_events(1);
    let daily = events.daily_counts();
    assert_eq!(daily.len(), 60);
    for ((group, date), count) in &daily {
        assert!(
            (150..200).contains(count),
            "{group} on {date}: {count} events outside [150, 200)"
        );
    }
    assert_eq!(events.groups(), vec![CONTROL.to_string(), TREATMENT.to_string()]);
}

/// User ids come from the configured pool.
#[test]
fn user_ids_within_pool() {
    let events = reference_events(3);
    assert!(events.rows().iter().all(|e| (1..=1_000).contains(&e.user_id)));
}

/// Effective purchase rate is p_click × p_purchase of all views.
/// Reference control: 0.10 × 0.20 = 2%, over ~5,250 views.
#[test]
fn purchase_rate_tracks_product_of_probabilities() {
    let events = reference_events(2024);
    let counts = events.type_counts();
    let control = counts[CONTROL];

    let views = control.total() as f64;
    let click_rate = (control.click + control.purchase) as f64 / views;
    let purchase_rate = control.purchase as f64 / views;

    assert!(
        (0.07..0.13).contains(&click_rate),
        "control click rate {click_rate:.4} far from 0.10"
    );
    assert!(
        (0.01..0.03).contains(&purchase_rate),
        "control purchase rate {purchase_rate:.4} far from 0.02"
    );
}

/// Treatment revenue uses its own range override.
#[test]
fn treatment_revenue_uses_group_range() {
    let events = reference_events(9);
    for e in events.rows().iter().filter(|e| e.event_type == EventType::Purchase) {
        let (low, high) = if e.group == TREATMENT { (15.0, 110.0) } else { (10.0, 100.0) };
        assert!(
            e.revenue >= low && e.revenue < high,
            "{} revenue {} outside [{low}, {high})",
            e.group,
            e.revenue
        );
    }
}
