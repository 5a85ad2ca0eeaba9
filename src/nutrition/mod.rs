//! Nutrition calculation module
//!
//! Pure energy calculations for dogs and dog food, plus barcode handling.
//! Nothing in here touches the database.

pub mod barcode;
pub mod calculator;
pub mod composition;

pub use barcode::{normalize_ean, BarcodeError, BarcodeFormat, NormalizedEan};
pub use calculator::{
    daily_energy_requirement, derived_carbohydrate, energy_density, intake_energy,
    resting_energy_requirement, round_half_up, scale_per_100, ActivityLevel, NutritionError,
};
pub use composition::{Composition, Macros};
