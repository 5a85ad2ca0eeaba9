//! Food Intake MCP Tools
//!
//! Tools for logging what a dog ate.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{timestamp, Dog, Food, FoodIntake, FoodIntakeCreate};

/// Response for list_intakes_for_day
#[derive(Debug, Serialize)]
pub struct DayIntakesResponse {
    pub dog_id: i64,
    pub date: String,
    pub intakes: Vec<FoodIntake>,
    pub total_calories: i64,
}

/// Response for delete_intake
#[derive(Debug, Serialize)]
pub struct DeleteIntakeResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for recalculate_intakes_for_day
#[derive(Debug, Serialize)]
pub struct RecalculateIntakesResponse {
    pub dog_id: i64,
    pub date: String,
    pub recalculated: usize,
    pub total_calories: i64,
}

fn require_dog(conn: &rusqlite::Connection, dog_id: i64) -> Result<Dog, String> {
    Dog::get_by_id(conn, dog_id)
        .map_err(|e| format!("Failed to get dog: {}", e))?
        .ok_or_else(|| format!("Dog {} not found", dog_id))
}

/// Log a feeding of a database food; calories follow from its energy density
pub fn log_food_intake(
    db: &Database,
    dog_id: i64,
    food_id: i64,
    amount_grams: f64,
    timestamp: Option<String>,
    note: Option<String>,
) -> Result<FoodIntake, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    require_dog(&conn, dog_id)?;
    let food = Food::get_by_id(&conn, food_id)
        .map_err(|e| format!("Failed to get food: {}", e))?
        .ok_or_else(|| format!("Food {} not found", food_id))?;

    let data = FoodIntakeCreate::from_food(dog_id, &food, amount_grams, timestamp, note)
        .map_err(|e| e.to_string())?;
    let intake = FoodIntake::create(&conn, &data).map_err(|e| format!("Failed to log intake: {}", e))?;
    info!(dog_id, food_id, calories = intake.calories, "Intake logged");

    Ok(intake)
}

/// Log a feeding with calories entered by hand
pub fn log_manual_intake(
    db: &Database,
    dog_id: i64,
    food_name: &str,
    amount_grams: f64,
    calories: i32,
    timestamp: Option<String>,
    note: Option<String>,
) -> Result<FoodIntake, String> {
    let food_name = food_name.trim();
    if food_name.is_empty() {
        return Err("Food name cannot be empty".to_string());
    }
    if calories <= 0 {
        return Err("calories must be greater than 0".to_string());
    }
    if !amount_grams.is_finite() || amount_grams <= 0.0 {
        return Err("amount_grams must be greater than 0".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    require_dog(&conn, dog_id)?;

    let data = FoodIntakeCreate {
        dog_id,
        food_name: food_name.to_string(),
        amount_grams,
        calories,
        timestamp,
        note,
        ..Default::default()
    };
    let intake = FoodIntake::create(&conn, &data).map_err(|e| format!("Failed to log intake: {}", e))?;
    info!(dog_id, calories, "Manual intake logged");

    Ok(intake)
}

/// All feedings of a dog on one day (defaults to today)
pub fn list_intakes_for_day(db: &Database, dog_id: i64, date: Option<&str>) -> Result<DayIntakesResponse, String> {
    let date = date.map(str::to_string).unwrap_or_else(timestamp::today);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    require_dog(&conn, dog_id)?;

    let intakes = FoodIntake::list_for_day(&conn, dog_id, &date)
        .map_err(|e| format!("Failed to list intakes: {}", e))?;
    let total_calories = intakes.iter().map(|i| i.calories as i64).sum();

    Ok(DayIntakesResponse {
        dog_id,
        date,
        intakes,
        total_calories,
    })
}

/// Delete a feeding
pub fn delete_intake(db: &Database, id: i64) -> Result<DeleteIntakeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = FoodIntake::delete(&conn, id).map_err(|e| format!("Failed to delete intake: {}", e))?;
    if !deleted {
        return Err(format!("Intake {} not found", id));
    }
    Ok(DeleteIntakeResponse {
        success: true,
        deleted_id: id,
    })
}

/// Re-derive calories of a day's database-food feedings from the current food data
pub fn recalculate_intakes_for_day(db: &Database, dog_id: i64, date: &str) -> Result<RecalculateIntakesResponse, String> {
    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    require_dog(&conn, dog_id)?;

    let updated = FoodIntake::recalculate_for_day(&mut conn, dog_id, date)
        .map_err(|e| format!("Failed to recalculate intakes: {}", e))?;
    let total_calories = FoodIntake::total_calories_for_day(&conn, dog_id, date)
        .map_err(|e| format!("Failed to total calories: {}", e))?;

    Ok(RecalculateIntakesResponse {
        dog_id,
        date: date.to_string(),
        recalculated: updated.len(),
        total_calories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{sample_dog, sample_food};

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        let (dog_id, food_id) = {
            let conn = db.get_conn().unwrap();
            let dog = Dog::create(&conn, &sample_dog()).unwrap();
            let food = Food::create(&conn, &sample_food()).unwrap();
            (dog.id, food.id)
        };
        (db, dog_id, food_id)
    }

    #[test]
    fn test_log_food_intake() {
        let (db, dog_id, food_id) = setup();
        let intake = log_food_intake(&db, dog_id, food_id, 150.0, Some("2025-03-01T08:00:00".into()), None).unwrap();
        assert_eq!(intake.calories, 510);
        assert_eq!(intake.food_name, "Wolfsblut Wide Plain");
        assert_eq!(intake.food_id, Some(food_id));
    }

    #[test]
    fn test_log_food_intake_rejects_bad_amount() {
        let (db, dog_id, food_id) = setup();
        assert!(log_food_intake(&db, dog_id, food_id, 0.0, None, None).is_err());
        assert!(log_food_intake(&db, dog_id, 999, 100.0, None, None).is_err());
        assert!(log_food_intake(&db, 999, food_id, 100.0, None, None).is_err());
    }

    #[test]
    fn test_manual_intake() {
        let (db, dog_id, _) = setup();
        let intake = log_manual_intake(&db, dog_id, "Chew stick", 20.0, 60, None, None).unwrap();
        assert_eq!(intake.food_id, None);
        assert_eq!(intake.calories, 60);

        assert!(log_manual_intake(&db, dog_id, "Chew stick", 20.0, 0, None, None).is_err());
        assert!(log_manual_intake(&db, dog_id, "", 20.0, 60, None, None).is_err());
    }

    #[test]
    fn test_list_and_delete_for_day() {
        let (db, dog_id, food_id) = setup();
        log_food_intake(&db, dog_id, food_id, 150.0, Some("2025-03-01T08:00:00".into()), None).unwrap();
        let treat = log_manual_intake(&db, dog_id, "Treat", 10.0, 40, Some("2025-03-01T18:30:00".into()), None).unwrap();
        log_manual_intake(&db, dog_id, "Treat", 10.0, 40, Some("2025-03-02T09:00:00".into()), None).unwrap();

        let day = list_intakes_for_day(&db, dog_id, Some("2025-03-01")).unwrap();
        assert_eq!(day.intakes.len(), 2);
        assert_eq!(day.total_calories, 550);

        assert!(delete_intake(&db, treat.id).unwrap().success);
        assert!(delete_intake(&db, treat.id).is_err());
        assert_eq!(list_intakes_for_day(&db, dog_id, Some("2025-03-01")).unwrap().total_calories, 510);
    }

    #[test]
    fn test_recalculate_after_label_fix() {
        let (db, dog_id, food_id) = setup();
        log_food_intake(&db, dog_id, food_id, 150.0, Some("2025-03-01T08:00:00".into()), None).unwrap();
        log_manual_intake(&db, dog_id, "Treat", 10.0, 40, Some("2025-03-01T18:30:00".into()), None).unwrap();

        {
            let conn = db.get_conn().unwrap();
            conn.execute("UPDATE foods SET fat = 22.0, moisture = 0.0 WHERE id = ?1", [food_id]).unwrap();
        }

        // carbs become 43, density 3.5*25 + 8.5*22 + 3.5*43 = 425 kcal/100g
        let result = recalculate_intakes_for_day(&db, dog_id, "2025-03-01").unwrap();
        assert_eq!(result.recalculated, 1);
        assert_eq!(result.total_calories, 638 + 40);
    }
}
