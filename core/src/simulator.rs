//! Event simulator: views, clicks and purchases per (day, group).
//!
//! For every day (outer loop) and every configured group (inner loop):
//!   1. Draw the batch size n from `events_per_day`.
//!   2. Draw n user ids with replacement from the user pool.
//!   3. Start every row as a view.
//!   4. Promote a row to click when its click roll < click_probability.
//!   5. Roll a second, independent vector of n uniforms. A row becomes a
//!      purchase when it clicked AND its purchase roll < purchase_probability.
//!   6. Purchases draw revenue from the group's revenue range; all other
//!      rows carry zero revenue.
//!
//! Step 5 consumes one roll per row, clicked or not. Changing that would
//! shift every later draw and break reproducibility of existing seeds.

use crate::{
    config::{ExperimentConfig, GroupConfig},
    event::{Event, EventTable, EventType},
    rng::SimRng,
};
use chrono::NaiveDate;

pub struct EventSimulator<'a> {
    config: &'a ExperimentConfig,
}

impl<'a> EventSimulator<'a> {
    pub fn new(config: &'a ExperimentConfig) -> Self {
        Self { config }
    }

    /// Generate the full event table for the configured date range.
    pub fn run(&self, rng: &mut SimRng) -> EventTable {
        let mut rows = Vec::new();
        for date in self.config.dates() {
            for group in &self.config.groups {
                let n = rng.range_u64(
                    self.config.events_per_day.low,
                    self.config.events_per_day.high,
                ) as usize;
                rows.extend(self.simulate_batch(group, date, n, rng));
            }
        }
        log::info!(
            "Simulated {} events over {} days for {} groups (seed {})",
            rows.len(),
            self.config.num_days,
            self.config.groups.len(),
            rng.seed()
        );
        EventTable::new(rows)
    }

    /// Simulate exactly `n` events for one group on one day.
    pub fn simulate_batch(
        &self,
        group: &GroupConfig,
        date: NaiveDate,
        n: usize,
        rng: &mut SimRng,
    ) -> Vec<Event> {
        let user_ids: Vec<u64> = (0..n)
            .map(|_| 1 + rng.next_u64_below(self.config.num_users))
            .collect();

        let mut event_types = vec![EventType::View; n];

        let clicked: Vec<bool> = (0..n).map(|_| rng.chance(group.click_probability)).collect();
        for (event_type, &c) in event_types.iter_mut().zip(&clicked) {
            if c {
                *event_type = EventType::Click;
            }
        }

        let purchase_rolls: Vec<bool> = (0..n)
            .map(|_| rng.chance(group.purchase_probability))
            .collect();
        for ((event_type, &c), &p) in event_types.iter_mut().zip(&clicked).zip(&purchase_rolls) {
            if c && p {
                *event_type = EventType::Purchase;
            }
        }

        let revenue_range = self.config.revenue_range_for(group);
        let batch: Vec<Event> = user_ids
            .into_iter()
            .zip(event_types)
            .map(|(user_id, event_type)| {
                let revenue = match event_type {
                    EventType::Purchase => rng.uniform(revenue_range.low, revenue_range.high),
                    _ => 0.0,
                };
                Event {
                    user_id,
                    date,
                    event_type,
                    group: group.name.clone(),
                    revenue,
                }
            })
            .collect();

        log::debug!(
            "{} {}: {} events, {} clicks, {} purchases",
            date,
            group.name,
            n,
            batch.iter().filter(|e| e.event_type.clicked()).count(),
            batch.iter().filter(|e| e.event_type == EventType::Purchase).count()
        );
        batch
    }
}
