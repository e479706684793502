//! The event log: one row per simulated user action.
//!
//! RULE: An EventTable is built once and never mutated afterwards.
//! Every row started life as a view; `event_type` records how far down
//! the funnel it got.

use crate::{
    error::AnalysisResult,
    types::{GroupName, UserId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    View,
    Click,
    Purchase,
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::View, EventType::Click, EventType::Purchase];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View     => "view",
            Self::Click    => "click",
            Self::Purchase => "purchase",
        }
    }

    /// True for rows that made it past the view stage.
    pub fn clicked(&self) -> bool {
        matches!(self, Self::Click | Self::Purchase)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub user_id:    UserId,
    pub date:       NaiveDate,
    pub event_type: EventType,
    pub group:      GroupName,
    /// Zero unless `event_type == Purchase`.
    pub revenue:    f64,
}

/// Raw counts of each event type, as plotted in the event-distribution chart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeCounts {
    pub view:     u64,
    pub click:    u64,
    pub purchase: u64,
}

impl TypeCounts {
    pub fn record(&mut self, event_type: EventType) {
        match event_type {
            EventType::View     => self.view += 1,
            EventType::Click    => self.click += 1,
            EventType::Purchase => self.purchase += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.view + self.click + self.purchase
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventTable {
    rows: Vec<Event>,
}

impl EventTable {
    pub fn new(rows: Vec<Event>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Event] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct group names, sorted.
    pub fn groups(&self) -> Vec<GroupName> {
        let mut groups: Vec<GroupName> = self.rows.iter().map(|e| e.group.clone()).collect();
        groups.sort();
        groups.dedup();
        groups
    }

    /// Event-type counts per group over the whole period.
    pub fn type_counts(&self) -> BTreeMap<GroupName, TypeCounts> {
        let mut counts: BTreeMap<GroupName, TypeCounts> = BTreeMap::new();
        for event in &self.rows {
            counts.entry(event.group.clone()).or_default().record(event.event_type);
        }
        counts
    }

    /// Number of events per (group, day).
    pub fn daily_counts(&self) -> BTreeMap<(GroupName, NaiveDate), u64> {
        let mut counts = BTreeMap::new();
        for event in &self.rows {
            *counts.entry((event.group.clone(), event.date)).or_insert(0) += 1;
        }
        counts
    }

    /// Read an externally-sourced event log, one JSON object per line.
    /// Blank lines are skipped.
    pub fn from_json_lines(reader: impl BufRead) -> AnalysisResult<Self> {
        let mut rows = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            rows.push(serde_json::from_str::<Event>(trimmed)?);
        }
        log::info!("Imported {} events", rows.len());
        Ok(Self { rows })
    }

    /// One JSON object per line, in row order.
    pub fn to_json_lines(&self) -> AnalysisResult<String> {
        let mut out = String::new();
        for event in &self.rows {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(group: &str, day: u32, event_type: EventType, revenue: f64) -> Event {
        Event {
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            event_type,
            group: group.into(),
            revenue,
        }
    }

    #[test]
    fn event_type_serializes_snake_case() {
        let json = serde_json::to_string(&EventType::Purchase).unwrap();
        assert_eq!(json, "\"purchase\"");
        for t in EventType::ALL {
            assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn type_counts_split_by_group() {
        let table = EventTable::new(vec![
            event("control", 1, EventType::View, 0.0),
            event("control", 1, EventType::Click, 0.0),
            event("treatment", 1, EventType::Purchase, 12.5),
            event("treatment", 2, EventType::View, 0.0),
        ]);
        let counts = table.type_counts();
        assert_eq!(counts["control"], TypeCounts { view: 1, click: 1, purchase: 0 });
        assert_eq!(counts["treatment"], TypeCounts { view: 1, click: 0, purchase: 1 });
        assert_eq!(table.groups(), vec!["control".to_string(), "treatment".to_string()]);
    }

    #[test]
    fn daily_counts_per_group_and_day() {
        let table = EventTable::new(vec![
            event("control", 1, EventType::View, 0.0),
            event("control", 1, EventType::View, 0.0),
            event("control", 2, EventType::View, 0.0),
        ]);
        let daily = table.daily_counts();
        let jan = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        assert_eq!(daily[&("control".to_string(), jan(1))], 2);
        assert_eq!(daily[&("control".to_string(), jan(2))], 1);
    }

    #[test]
    fn json_lines_import_matches_export() {
        let table = EventTable::new(vec![
            event("control", 3, EventType::Click, 0.0),
            event("treatment", 4, EventType::Purchase, 42.0),
        ]);
        let text = table.to_json_lines().unwrap();
        assert!(text.contains("\"event_type\":\"purchase\""));
        assert!(text.contains("\"date\":\"2024-01-04\""));

        let with_blank = format!("{text}\n");
        let imported = EventTable::from_json_lines(with_blank.as_bytes()).unwrap();
        assert_eq!(imported, table);
    }

    #[test]
    fn malformed_line_is_an_error() {
        let input = "{\"user_id\": 1, \"date\": \"2024-01-01\"}\n";
        assert!(EventTable::from_json_lines(input.as_bytes()).is_err());
    }
}
