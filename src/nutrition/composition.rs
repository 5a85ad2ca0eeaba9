//! Guaranteed analysis of a dog food
//!
//! All values are grams per 100 g of product, as printed on the label.

use serde::{Deserialize, Serialize};

use super::calculator::{derived_carbohydrate, energy_density, scale_per_100, NutritionError};

/// Label composition per 100 g
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub protein: f64,
    pub fat: f64,
    pub crude_fiber: f64,
    pub raw_ash: f64,
    pub moisture: f64,
}

/// Macro-nutrients in grams
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl Composition {
    pub fn new(protein: f64, fat: f64, crude_fiber: f64, raw_ash: f64, moisture: f64) -> Self {
        Self { protein, fat, crude_fiber, raw_ash, moisture }
    }

    /// Carbohydrate (NFE) per 100 g, may be negative
    pub fn carbs(&self) -> f64 {
        derived_carbohydrate(self.protein, self.fat, self.crude_fiber, self.raw_ash, self.moisture)
    }

    /// Energy density per 100 g
    pub fn kcal_per_100g(&self) -> f64 {
        energy_density(self.protein, self.fat, self.carbs())
    }

    /// Sum of all labelled fractions
    pub fn labelled_total(&self) -> f64 {
        self.protein + self.fat + self.crude_fiber + self.raw_ash + self.moisture
    }

    /// True when the label claims more than 100 g per 100 g
    pub fn exceeds_total(&self) -> bool {
        self.labelled_total() > 100.0
    }

    /// Macro grams contained in `quantity_g` grams of the food
    pub fn macros_for(&self, quantity_g: f64) -> Macros {
        Macros {
            protein: scale_per_100(self.protein, quantity_g),
            fat: scale_per_100(self.fat, quantity_g),
            carbs: scale_per_100(self.carbs(), quantity_g),
        }
    }

    /// Check every fraction lies in [0, 100]
    ///
    /// An over-full label is accepted here; see [`Composition::exceeds_total`].
    pub fn validate(&self) -> Result<(), NutritionError> {
        let fields = [
            ("protein", self.protein),
            ("fat", self.fat),
            ("crude_fiber", self.crude_fiber),
            ("raw_ash", self.raw_ash),
            ("moisture", self.moisture),
        ];
        for (field, value) in fields {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(NutritionError::PercentageOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kibble() -> Composition {
        Composition::new(25.0, 12.0, 3.0, 7.0, 10.0)
    }

    #[test]
    fn test_carbs_and_density() {
        let food = kibble();
        assert_eq!(food.carbs(), 43.0);
        assert_eq!(food.kcal_per_100g(), 340.0);
        assert!(!food.exceeds_total());
    }

    #[test]
    fn test_wet_food() {
        // typical canned food: 10% protein, 6% fat, 0.5 fiber, 2.5 ash, 78 moisture
        let food = Composition::new(10.0, 6.0, 0.5, 2.5, 78.0);
        assert!((food.carbs() - 3.0).abs() < 1e-9);
        assert!((food.kcal_per_100g() - 96.5).abs() < 1e-9);
    }

    #[test]
    fn test_macros_for_quantity() {
        let macros = kibble().macros_for(200.0);
        assert_eq!(macros.protein, 50.0);
        assert_eq!(macros.fat, 24.0);
        assert_eq!(macros.carbs, 86.0);
    }

    #[test]
    fn test_over_full_label_is_surfaced() {
        let food = Composition::new(50.0, 30.0, 5.0, 10.0, 15.0);
        assert!(food.validate().is_ok());
        assert!(food.exceeds_total());
        assert_eq!(food.carbs(), -10.0);
        assert_eq!(food.kcal_per_100g(), 175.0 + 255.0 - 35.0);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let err = Composition::new(25.0, -1.0, 3.0, 7.0, 10.0).validate().unwrap_err();
        assert_eq!(err, NutritionError::PercentageOutOfRange { field: "fat", value: -1.0 });
        assert!(Composition::new(101.0, 0.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(Composition::new(f64::NAN, 0.0, 0.0, 0.0, 0.0).validate().is_err());
    }
}
