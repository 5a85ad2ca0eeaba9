//! Energy calculations
//!
//! Daily energy requirement from body mass and activity level, and food
//! energy from the guaranteed analysis on a pet food label.
//!
//! Formulas:
//! - RER = 70 × kg^0.75, daily requirement = floor(RER × activity factor)
//! - carbohydrate (NFE) = 100 − (protein + fat + crude fiber + raw ash + moisture)
//! - kcal/100g = protein × 3.5 + fat × 8.5 + carbohydrate × 3.5 (modified Atwater)

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RER coefficient (kcal per kg^0.75)
pub const RER_COEFFICIENT: f64 = 70.0;

/// RER exponent on body mass
pub const RER_EXPONENT: f64 = 0.75;

/// Modified Atwater factors, kcal per gram
pub const KCAL_PER_G_PROTEIN: f64 = 3.5;
pub const KCAL_PER_G_FAT: f64 = 8.5;
pub const KCAL_PER_G_CARBS: f64 = 3.5;

/// Errors raised for inputs outside the calculator's domain
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NutritionError {
    #[error("body mass must be a positive number of kg, got {0}")]
    NonPositiveMass(f64),

    #[error("activity factor must be greater than 1, got {0}")]
    InvalidActivityFactor(f64),

    #[error("quantity must be a positive number of grams, got {0}")]
    NonPositiveQuantity(f64),

    #[error("{field} must be between 0 and 100, got {value}")]
    PercentageOutOfRange { field: &'static str, value: f64 },
}

/// Activity level of a dog
///
/// The set is closed and ordered; every factor is greater than 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    VeryLow,
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
}

impl ActivityLevel {
    /// All levels, lowest first
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::VeryLow,
        ActivityLevel::Low,
        ActivityLevel::Normal,
        ActivityLevel::High,
        ActivityLevel::VeryHigh,
    ];

    /// Multiplier applied to the resting energy requirement
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::VeryLow => 1.2,
            ActivityLevel::Low => 1.4,
            ActivityLevel::Normal => 1.6,
            ActivityLevel::High => 1.8,
            ActivityLevel::VeryHigh => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::VeryLow => "very_low",
            ActivityLevel::Low => "low",
            ActivityLevel::Normal => "normal",
            ActivityLevel::High => "high",
            ActivityLevel::VeryHigh => "very_high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "very_low" => Some(ActivityLevel::VeryLow),
            "low" => Some(ActivityLevel::Low),
            "normal" | "moderate" => Some(ActivityLevel::Normal),
            "high" => Some(ActivityLevel::High),
            "very_high" => Some(ActivityLevel::VeryHigh),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityLevel::VeryLow => "Very low",
            ActivityLevel::Low => "Low",
            ActivityLevel::Normal => "Normal",
            ActivityLevel::High => "High",
            ActivityLevel::VeryHigh => "Very high",
        }
    }

    /// Daily energy requirement (kcal/day) for a dog of this activity level
    pub fn daily_requirement(&self, weight_kg: f64) -> Result<u32, NutritionError> {
        daily_energy_requirement(weight_kg, self.factor())
    }
}

/// Resting energy requirement in kcal/day, unrounded
pub fn resting_energy_requirement(weight_kg: f64) -> Result<f64, NutritionError> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(NutritionError::NonPositiveMass(weight_kg));
    }
    Ok(RER_COEFFICIENT * weight_kg.powf(RER_EXPONENT))
}

/// Daily energy requirement in whole kcal/day: floor(RER × factor)
pub fn daily_energy_requirement(weight_kg: f64, activity_factor: f64) -> Result<u32, NutritionError> {
    if !activity_factor.is_finite() || activity_factor <= 1.0 {
        return Err(NutritionError::InvalidActivityFactor(activity_factor));
    }
    let rer = resting_energy_requirement(weight_kg)?;
    Ok((rer * activity_factor).floor() as u32)
}

/// Nitrogen-free extract (carbohydrate) in g/100g
///
/// Not clamped: inconsistent label values summing above 100 yield a negative result.
pub fn derived_carbohydrate(protein: f64, fat: f64, crude_fiber: f64, raw_ash: f64, moisture: f64) -> f64 {
    100.0 - (protein + fat + crude_fiber + raw_ash + moisture)
}

/// Energy density in kcal per 100 g
pub fn energy_density(protein: f64, fat: f64, carbs: f64) -> f64 {
    protein * KCAL_PER_G_PROTEIN + fat * KCAL_PER_G_FAT + carbs * KCAL_PER_G_CARBS
}

/// Scale a per-100g value to `quantity_g` grams
pub fn scale_per_100(value_per_100: f64, quantity_g: f64) -> f64 {
    value_per_100 * quantity_g / 100.0
}

/// Round to the nearest integer, ties toward positive infinity
pub fn round_half_up(value: f64) -> i32 {
    // Adding 0.5 before flooring rounds 0.49999999999999994 up
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i32
}

/// Energy in whole kcal for `quantity_g` grams of a food with the given density
pub fn intake_energy(kcal_per_100g: f64, quantity_g: f64) -> Result<i32, NutritionError> {
    if !quantity_g.is_finite() || quantity_g <= 0.0 {
        return Err(NutritionError::NonPositiveQuantity(quantity_g));
    }
    Ok(round_half_up(scale_per_100(kcal_per_100g, quantity_g)))
}
