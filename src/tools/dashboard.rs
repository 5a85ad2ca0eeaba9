//! Dashboard MCP Tool
//!
//! Daily energy balance of a dog: what it ate against what it needs.

use serde::Serialize;

use crate::db::Database;
use crate::models::{timestamp, Dog, FoodIntake};

/// Response for daily_summary
#[derive(Debug, Serialize)]
pub struct DailySummary {
    pub dog_id: i64,
    pub dog_name: String,
    pub date: String,
    pub weight_kg: f64,
    pub daily_calorie_need: u32,
    pub consumed_calories: i64,
    /// need - consumed; negative when the dog was overfed
    pub remaining_calories: i64,
    pub percent_of_need: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub intakes: Vec<FoodIntake>,
}

/// Summarize one day (defaults to today)
pub fn daily_summary(db: &Database, dog_id: i64, date: Option<&str>) -> Result<DailySummary, String> {
    let date = date.map(str::to_string).unwrap_or_else(timestamp::today);
    timestamp::parse_date(&date).map_err(|e| e.to_string())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let dog = Dog::get_by_id(&conn, dog_id)
        .map_err(|e| format!("Failed to get dog: {}", e))?
        .ok_or_else(|| format!("Dog {} not found", dog_id))?;
    let need = dog.daily_calorie_need().map_err(|e| e.to_string())?;

    let intakes = FoodIntake::list_for_day(&conn, dog_id, &date)
        .map_err(|e| format!("Failed to list intakes: {}", e))?;

    let consumed: i64 = intakes.iter().map(|i| i.calories as i64).sum();
    let percent_of_need = if need > 0 {
        (consumed as f64 / need as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };
    let sum = |f: fn(&FoodIntake) -> Option<f64>| -> f64 {
        let total: f64 = intakes.iter().filter_map(f).sum();
        (total * 10.0).round() / 10.0
    };

    Ok(DailySummary {
        dog_id,
        dog_name: dog.name,
        date,
        weight_kg: dog.weight_kg,
        daily_calorie_need: need,
        consumed_calories: consumed,
        remaining_calories: need as i64 - consumed,
        percent_of_need,
        protein_g: sum(|i| i.protein),
        fat_g: sum(|i| i.fat),
        carbs_g: sum(|i| i.carbs),
        intakes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{sample_dog, sample_food};
    use crate::models::{Food, FoodIntakeCreate};

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let dog_id = {
            let conn = db.get_conn().unwrap();
            let dog = Dog::create(&conn, &sample_dog()).unwrap();
            let food = Food::create(&conn, &sample_food()).unwrap();
            let breakfast = FoodIntakeCreate::from_food(
                dog.id,
                &food,
                150.0,
                Some("2025-03-01T08:00:00".to_string()),
                None,
            )
            .unwrap();
            FoodIntake::create(&conn, &breakfast).unwrap();
            dog.id
        };
        (db, dog_id)
    }

    #[test]
    fn test_remaining_calories() {
        let (db, dog_id) = setup();
        let summary = daily_summary(&db, dog_id, Some("2025-03-01")).unwrap();
        assert_eq!(summary.daily_calorie_need, 629);
        assert_eq!(summary.consumed_calories, 510);
        assert_eq!(summary.remaining_calories, 119);
        assert_eq!(summary.percent_of_need, 81.1);
        assert_eq!(summary.protein_g, 37.5);
        assert_eq!(summary.intakes.len(), 1);
    }

    #[test]
    fn test_overfed_day_goes_negative() {
        let (db, dog_id) = setup();
        {
            let conn = db.get_conn().unwrap();
            let treat = FoodIntakeCreate {
                dog_id,
                food_name: "Sausage".to_string(),
                amount_grams: 50.0,
                calories: 200,
                timestamp: Some("2025-03-01T19:00:00".to_string()),
                ..Default::default()
            };
            FoodIntake::create(&conn, &treat).unwrap();
        }
        let summary = daily_summary(&db, dog_id, Some("2025-03-01")).unwrap();
        assert_eq!(summary.remaining_calories, -81);
    }

    #[test]
    fn test_empty_day_and_errors() {
        let (db, dog_id) = setup();
        let summary = daily_summary(&db, dog_id, Some("2025-03-02")).unwrap();
        assert_eq!(summary.consumed_calories, 0);
        assert_eq!(summary.remaining_calories, 629);

        assert!(daily_summary(&db, 999, Some("2025-03-01")).is_err());
        assert!(daily_summary(&db, dog_id, Some("March 1st")).is_err());
    }
}
