//! Dog model
//!
//! An animal profile. The daily calorie need is never stored; it is derived
//! from the current weight and activity level every time it is asked for.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::{ActivityLevel, NutritionError};

/// Sex of a dog (informational only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Sex::Male,
            "female" | "f" => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

/// A dog profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dog {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<String>,
    pub breed: String,
    pub sex: Sex,
    pub weight_kg: f64,
    pub target_weight_kg: Option<f64>,
    pub activity_level: ActivityLevel,
    pub image_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a dog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DogCreate {
    pub name: String,
    pub birth_date: Option<String>,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub sex: Sex,
    pub weight_kg: f64,
    pub target_weight_kg: Option<f64>,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    pub image_path: Option<String>,
}

/// Data for updating a dog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DogUpdate {
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub breed: Option<String>,
    pub sex: Option<Sex>,
    pub weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub image_path: Option<String>,
}

impl Dog {
    /// Daily calorie need (kcal/day) from current weight and activity
    pub fn daily_calorie_need(&self) -> Result<u32, NutritionError> {
        self.activity_level.daily_requirement(self.weight_kg)
    }

    /// Age in whole years at `on`, if a birth date is known
    pub fn age_years(&self, on: chrono::NaiveDate) -> Option<u32> {
        let birth = chrono::NaiveDate::parse_from_str(self.birth_date.as_deref()?, "%Y-%m-%d").ok()?;
        on.years_since(birth)
    }

    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let sex: String = row.get("sex")?;
        let activity: String = row.get("activity_level")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            birth_date: row.get("birth_date")?,
            breed: row.get("breed")?,
            sex: Sex::from_str(&sex),
            weight_kg: row.get("weight_kg")?,
            target_weight_kg: row.get("target_weight_kg")?,
            activity_level: ActivityLevel::from_str(&activity).unwrap_or_default(),
            image_path: row.get("image_path")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new dog
    pub fn create(conn: &Connection, data: &DogCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO dogs (
                name, birth_date, breed, sex, weight_kg, target_weight_kg,
                activity_level, image_path
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                data.name,
                data.birth_date,
                data.breed,
                data.sex.as_str(),
                data.weight_kg,
                data.target_weight_kg,
                data.activity_level.as_str(),
                data.image_path,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Dog"))
    }

    /// Get a dog by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM dogs WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(dog) => Ok(Some(dog)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all dogs ordered by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM dogs ORDER BY name COLLATE NOCASE ASC, id ASC")?;
        let dogs = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dogs)
    }

    /// Update a dog
    pub fn update(conn: &Connection, id: i64, data: &DogUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(name, "name");
        add_update!(birth_date, "birth_date");
        add_update!(breed, "breed");
        add_update!(weight_kg, "weight_kg");
        add_update!(target_weight_kg, "target_weight_kg");
        add_update!(image_path, "image_path");

        if let Some(sex) = data.sex {
            updates.push(format!("sex = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(sex.as_str()));
        }
        if let Some(level) = data.activity_level {
            updates.push(format!("activity_level = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(level.as_str()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE dogs SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Set the current weight only
    pub fn set_weight(conn: &Connection, id: i64, weight_kg: f64) -> DbResult<bool> {
        let rows = conn.execute(
            "UPDATE dogs SET weight_kg = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![weight_kg, id],
        )?;
        Ok(rows > 0)
    }

    /// Delete a dog along with its intakes and weight history
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM dogs WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::test_support::sample_dog;

    #[test]
    fn test_create_and_get() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        let dog = Dog::create(&conn, &sample_dog()).unwrap();
        assert_eq!(dog.name, "Bello");
        assert_eq!(dog.sex, Sex::Male);
        assert_eq!(dog.daily_calorie_need(), Ok(629));

        let fetched = Dog::get_by_id(&conn, dog.id).unwrap().unwrap();
        assert_eq!(fetched.activity_level, ActivityLevel::Normal);
        assert_eq!(fetched.target_weight_kg, Some(9.5));
        assert!(Dog::get_by_id(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_need_follows_weight_and_activity() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();
        let before = dog.daily_calorie_need().unwrap();

        let update = DogUpdate {
            activity_level: Some(ActivityLevel::VeryHigh),
            ..Default::default()
        };
        let dog = Dog::update(&conn, dog.id, &update).unwrap().unwrap();
        let more_active = dog.daily_calorie_need().unwrap();
        assert!(more_active > before);

        Dog::set_weight(&conn, dog.id, 14.0).unwrap();
        let dog = Dog::get_by_id(&conn, dog.id).unwrap().unwrap();
        assert!(dog.daily_calorie_need().unwrap() > more_active);
    }

    #[test]
    fn test_list_sorted_and_delete() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let mut luna = sample_dog();
        luna.name = "luna".to_string();
        Dog::create(&conn, &luna).unwrap();
        let bello = Dog::create(&conn, &sample_dog()).unwrap();

        let names: Vec<String> = Dog::list(&conn).unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Bello", "luna"]);

        assert!(Dog::delete(&conn, bello.id).unwrap());
        assert!(!Dog::delete(&conn, bello.id).unwrap());
        assert_eq!(Dog::list(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_age_years() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();
        let on = chrono::NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
        assert_eq!(dog.age_years(on), Some(4));
    }
}
