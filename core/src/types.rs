//! Shared primitive types used across the whole analysis.

/// Identifier of a simulated (or imported) user.
pub type UserId = u64;

/// Name of an experimental group, as it appears in the event log.
pub type GroupName = String;

/// The canonical run identifier.
pub type RunId = String;

/// The existing recommendation model.
pub const CONTROL: &str = "control";

/// The candidate recommendation model.
pub const TREATMENT: &str = "treatment";
