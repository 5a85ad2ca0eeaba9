//! SnackTrack Library
//!
//! Calorie calculation, food database and weight tracking for dogs.

pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
