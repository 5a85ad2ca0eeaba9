//! SnackTrack Tools module
//!
//! MCP tool implementations for dog nutrition and weight tracking.

pub mod dashboard;
pub mod dogs;
pub mod foods;
pub mod intakes;
pub mod reports;
pub mod status;
pub mod weights;
