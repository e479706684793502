//! Synthetic e-commerce A/B experiment: event simulation, daily KPIs and
//! the two classical tests comparing a treatment recommendation model with
//! the control one.

pub mod config;
pub mod error;
pub mod event;
pub mod kpi;
pub mod pipeline;
pub mod report;
pub mod rng;
pub mod simulator;
pub mod stats;
pub mod types;
