//! Food Intake model
//!
//! One feeding event: an amount of a food eaten by a dog at a point in time.
//! Entries logged from the food database get their calories from the food's
//! energy density; manual entries carry calories typed in by the owner.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::{intake_energy, Macros, NutritionError};
use super::{timestamp, Food};

/// A recorded feeding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodIntake {
    pub id: i64,
    pub dog_id: i64,
    /// None for manual entries
    pub food_id: Option<i64>,
    pub food_name: String,
    pub amount_grams: f64,
    pub calories: i32,
    pub timestamp: String,
    pub note: Option<String>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub created_at: String,
}

/// Data for logging a feeding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodIntakeCreate {
    pub dog_id: i64,
    pub food_id: Option<i64>,
    pub food_name: String,
    pub amount_grams: f64,
    pub calories: i32,
    /// Defaults to now
    pub timestamp: Option<String>,
    pub note: Option<String>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
}

impl FoodIntakeCreate {
    /// Build an intake for `amount_grams` of a database food
    ///
    /// Calories and macros are derived from the food's composition.
    pub fn from_food(
        dog_id: i64,
        food: &Food,
        amount_grams: f64,
        timestamp: Option<String>,
        note: Option<String>,
    ) -> Result<Self, NutritionError> {
        let calories = intake_energy(food.kcal_per_100g(), amount_grams)?;
        let Macros { protein, fat, carbs } = food.composition.macros_for(amount_grams);
        Ok(Self {
            dog_id,
            food_id: Some(food.id),
            food_name: food.display_name(),
            amount_grams,
            calories,
            timestamp,
            note,
            protein: Some(protein),
            fat: Some(fat),
            carbs: Some(carbs),
        })
    }
}

impl FoodIntake {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            dog_id: row.get("dog_id")?,
            food_id: row.get("food_id")?,
            food_name: row.get("food_name")?,
            amount_grams: row.get("amount_grams")?,
            calories: row.get("calories")?,
            timestamp: row.get("timestamp")?,
            note: row.get("note")?,
            protein: row.get("protein")?,
            fat: row.get("fat")?,
            carbs: row.get("carbs")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a feeding
    pub fn create(conn: &Connection, data: &FoodIntakeCreate) -> DbResult<Self> {
        let timestamp = timestamp::normalize(data.timestamp.as_deref())?;

        conn.execute(
            r#"
            INSERT INTO food_intakes (
                dog_id, food_id, food_name, amount_grams, calories, timestamp, note,
                protein, fat, carbs
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                data.dog_id,
                data.food_id,
                data.food_name,
                data.amount_grams,
                data.calories,
                timestamp,
                data.note,
                data.protein,
                data.fat,
                data.carbs,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Food intake"))
    }

    /// Get a feeding by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_intakes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(intake) => Ok(Some(intake)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Feedings of a dog between two storage timestamps (inclusive), newest first
    pub fn list_for_range(conn: &Connection, dog_id: i64, start: &str, end: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM food_intakes
            WHERE dog_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
            ORDER BY timestamp DESC, id DESC
            "#
        )?;

        let intakes = stmt
            .query_map(params![dog_id, start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(intakes)
    }

    /// Feedings of a dog on one calendar day, newest first
    pub fn list_for_day(conn: &Connection, dog_id: i64, date: &str) -> DbResult<Vec<Self>> {
        let (start, end) = timestamp::day_bounds(date)?;
        Self::list_for_range(conn, dog_id, &start, &end)
    }

    /// Sum of calories eaten by a dog on one calendar day
    pub fn total_calories_for_day(conn: &Connection, dog_id: i64, date: &str) -> DbResult<i64> {
        let (start, end) = timestamp::day_bounds(date)?;
        let total: i64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(calories), 0) FROM food_intakes
            WHERE dog_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
            "#,
            params![dog_id, start, end],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Daily calorie totals for a dog between two dates, keyed by YYYY-MM-DD
    pub fn daily_totals(conn: &Connection, dog_id: i64, start_date: &str, end_date: &str) -> DbResult<Vec<(String, i64)>> {
        let (start, _) = timestamp::day_bounds(start_date)?;
        let (_, end) = timestamp::day_bounds(end_date)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT substr(timestamp, 1, 10) AS day, SUM(calories) AS total
            FROM food_intakes
            WHERE dog_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
            GROUP BY day
            ORDER BY day ASC
            "#
        )?;

        let totals = stmt
            .query_map(params![dog_id, start, end], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(totals)
    }

    /// Recompute calories and macros of every database-food feeding on a day
    ///
    /// Manual entries are left untouched. Returns the updated feedings.
    /// Either every feeding of the day is rewritten or none is.
    pub fn recalculate_for_day(conn: &mut Connection, dog_id: i64, date: &str) -> DbResult<Vec<Self>> {
        let tx = conn.transaction()?;

        let mut updated = Vec::new();
        for intake in Self::list_for_day(&tx, dog_id, date)? {
            let Some(food_id) = intake.food_id else { continue };
            let Some(food) = Food::get_by_id(&tx, food_id)? else { continue };

            let calories = intake_energy(food.kcal_per_100g(), intake.amount_grams)
                .map_err(|e| DbError::Invalid(e.to_string()))?;
            let macros = food.composition.macros_for(intake.amount_grams);

            tx.execute(
                "UPDATE food_intakes SET calories = ?1, protein = ?2, fat = ?3, carbs = ?4 WHERE id = ?5",
                params![calories, macros.protein, macros.fat, macros.carbs, intake.id],
            )?;

            if let Some(fresh) = Self::get_by_id(&tx, intake.id)? {
                updated.push(fresh);
            }
        }

        tx.commit()?;
        Ok(updated)
    }

    /// Delete a feeding
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM food_intakes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::test_support::{sample_dog, sample_food};
    use crate::models::{Dog, FoodCreate};

    fn manual(dog_id: i64, calories: i32, timestamp: &str) -> FoodIntakeCreate {
        FoodIntakeCreate {
            dog_id,
            food_name: "Chew stick".to_string(),
            amount_grams: 20.0,
            calories,
            timestamp: Some(timestamp.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_food_derives_calories() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();
        let food = Food::create(&conn, &sample_food()).unwrap();

        let data = FoodIntakeCreate::from_food(dog.id, &food, 150.0, None, None).unwrap();
        assert_eq!(data.calories, 510);
        assert_eq!(data.protein, Some(37.5));

        let intake = FoodIntake::create(&conn, &data).unwrap();
        assert_eq!(intake.food_id, Some(food.id));
        assert_eq!(intake.food_name, "Wolfsblut Wide Plain");
        assert_eq!(intake.calories, 510);
    }

    #[test]
    fn test_from_food_rejects_zero_amount() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let food = Food::create(&conn, &sample_food()).unwrap();
        assert!(FoodIntakeCreate::from_food(1, &food, 0.0, None, None).is_err());
    }

    #[test]
    fn test_day_listing_and_totals() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();

        FoodIntake::create(&conn, &manual(dog.id, 100, "2025-03-01T07:00:00")).unwrap();
        FoodIntake::create(&conn, &manual(dog.id, 250, "2025-03-01T23:59:59")).unwrap();
        FoodIntake::create(&conn, &manual(dog.id, 999, "2025-03-02T00:00:00")).unwrap();

        let day = FoodIntake::list_for_day(&conn, dog.id, "2025-03-01").unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].calories, 250);

        assert_eq!(FoodIntake::total_calories_for_day(&conn, dog.id, "2025-03-01").unwrap(), 350);
        assert_eq!(FoodIntake::total_calories_for_day(&conn, dog.id, "2025-02-28").unwrap(), 0);

        let totals = FoodIntake::daily_totals(&conn, dog.id, "2025-03-01", "2025-03-02").unwrap();
        assert_eq!(totals, vec![("2025-03-01".to_string(), 350), ("2025-03-02".to_string(), 999)]);
    }

    #[test]
    fn test_deleting_food_keeps_intake() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();
        let food = Food::create(&conn, &sample_food()).unwrap();
        let data = FoodIntakeCreate::from_food(dog.id, &food, 100.0, None, None).unwrap();
        let intake = FoodIntake::create(&conn, &data).unwrap();

        assert!(Food::delete(&conn, food.id).unwrap());
        let kept = FoodIntake::get_by_id(&conn, intake.id).unwrap().unwrap();
        assert_eq!(kept.food_id, None);
        assert_eq!(kept.calories, 340);
    }

    #[test]
    fn test_deleting_dog_cascades() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();
        let intake = FoodIntake::create(&conn, &manual(dog.id, 80, "2025-03-01T12:00:00")).unwrap();

        Dog::delete(&conn, dog.id).unwrap();
        assert!(FoodIntake::get_by_id(&conn, intake.id).unwrap().is_none());
    }

    #[test]
    fn test_recalculate_for_day() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();
        let food = Food::create(&conn, &sample_food()).unwrap();

        let mut stale = FoodIntakeCreate::from_food(dog.id, &food, 150.0, Some("2025-03-01T08:00:00".into()), None).unwrap();
        stale.calories = 1;
        FoodIntake::create(&conn, &stale).unwrap();
        FoodIntake::create(&conn, &manual(dog.id, 42, "2025-03-01T09:00:00")).unwrap();

        let updated = FoodIntake::recalculate_for_day(&mut conn, dog.id, "2025-03-01").unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].calories, 510);
        assert_eq!(FoodIntake::total_calories_for_day(&conn, dog.id, "2025-03-01").unwrap(), 552);
    }

    #[test]
    fn test_recalculate_for_day_rolls_back_on_failure() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();
        let good = Food::create(&conn, &sample_food()).unwrap();
        let broken = Food::create(&conn, &FoodCreate {
            ean: None,
            product: "Puppy Mix".to_string(),
            ..sample_food()
        }).unwrap();

        // Newest feeding is rewritten first, the older one then fails
        let mut evening = FoodIntakeCreate::from_food(dog.id, &good, 150.0, Some("2025-03-01T18:00:00".into()), None).unwrap();
        evening.calories = 1;
        let evening = FoodIntake::create(&conn, &evening).unwrap();
        let morning = FoodIntakeCreate::from_food(dog.id, &broken, 100.0, Some("2025-03-01T08:00:00".into()), None).unwrap();
        FoodIntake::create(&conn, &morning).unwrap();

        conn.execute("UPDATE foods SET additives = 'not json' WHERE id = ?1", [broken.id]).unwrap();
        assert!(FoodIntake::recalculate_for_day(&mut conn, dog.id, "2025-03-01").is_err());

        let unchanged = FoodIntake::get_by_id(&conn, evening.id).unwrap().unwrap();
        assert_eq!(unchanged.calories, 1);
    }
}
