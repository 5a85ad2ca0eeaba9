//! Dog MCP Tools
//!
//! Tools for managing dog profiles.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{Dog, DogCreate, DogUpdate, Sex};
use crate::nutrition::ActivityLevel;

/// Dog profile with the derived calorie need
#[derive(Debug, Serialize)]
pub struct DogDetail {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<String>,
    pub age_years: Option<u32>,
    pub breed: String,
    pub sex: Sex,
    pub weight_kg: f64,
    pub target_weight_kg: Option<f64>,
    pub activity_level: ActivityLevel,
    pub activity_factor: f64,
    pub daily_calorie_need: u32,
    pub image_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DogDetail {
    pub fn from_dog(dog: Dog) -> Result<Self, String> {
        let daily_calorie_need = dog.daily_calorie_need().map_err(|e| e.to_string())?;
        let age_years = dog.age_years(chrono::Local::now().date_naive());
        Ok(Self {
            id: dog.id,
            name: dog.name,
            birth_date: dog.birth_date,
            age_years,
            breed: dog.breed,
            sex: dog.sex,
            weight_kg: dog.weight_kg,
            target_weight_kg: dog.target_weight_kg,
            activity_level: dog.activity_level,
            activity_factor: dog.activity_level.factor(),
            daily_calorie_need,
            image_path: dog.image_path,
            created_at: dog.created_at,
            updated_at: dog.updated_at,
        })
    }
}

/// Summary row for list_dogs
#[derive(Debug, Serialize)]
pub struct DogSummary {
    pub id: i64,
    pub name: String,
    pub breed: String,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub daily_calorie_need: u32,
}

/// Response for list_dogs
#[derive(Debug, Serialize)]
pub struct ListDogsResponse {
    pub dogs: Vec<DogSummary>,
    pub total: usize,
}

/// Response for delete_dog
#[derive(Debug, Serialize)]
pub struct DeleteDogResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_weight(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{} must be greater than 0", field));
    }
    Ok(())
}

fn validate_birth_date(date: &str) -> Result<(), String> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("Invalid birth_date '{}', expected YYYY-MM-DD", date))
}

/// Add a new dog
pub fn add_dog(db: &Database, data: DogCreate) -> Result<DogDetail, String> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err("Dog name cannot be empty".to_string());
    }
    validate_weight("weight_kg", data.weight_kg)?;
    if let Some(target) = data.target_weight_kg {
        validate_weight("target_weight_kg", target)?;
    }
    if let Some(ref birth_date) = data.birth_date {
        validate_birth_date(birth_date)?;
    }

    let data = DogCreate {
        name: name.to_string(),
        ..data
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let dog = Dog::create(&conn, &data).map_err(|e| format!("Failed to create dog: {}", e))?;
    info!(dog_id = dog.id, name = %dog.name, "Dog added");

    DogDetail::from_dog(dog)
}

/// Get a dog with its calorie need
pub fn get_dog(db: &Database, id: i64) -> Result<Option<DogDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let dog = Dog::get_by_id(&conn, id).map_err(|e| format!("Failed to get dog: {}", e))?;
    dog.map(DogDetail::from_dog).transpose()
}

/// List all dogs
pub fn list_dogs(db: &Database) -> Result<ListDogsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let dogs = Dog::list(&conn).map_err(|e| format!("Failed to list dogs: {}", e))?;

    let dogs = dogs
        .into_iter()
        .map(|dog| {
            Ok(DogSummary {
                daily_calorie_need: dog.daily_calorie_need().map_err(|e| e.to_string())?,
                id: dog.id,
                name: dog.name,
                breed: dog.breed,
                weight_kg: dog.weight_kg,
                activity_level: dog.activity_level,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    let total = dogs.len();
    Ok(ListDogsResponse { dogs, total })
}

/// Update a dog profile
pub fn update_dog(db: &Database, id: i64, data: DogUpdate) -> Result<Option<DogDetail>, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Dog name cannot be empty".to_string());
        }
    }
    if let Some(weight) = data.weight_kg {
        validate_weight("weight_kg", weight)?;
    }
    if let Some(target) = data.target_weight_kg {
        validate_weight("target_weight_kg", target)?;
    }
    if let Some(ref birth_date) = data.birth_date {
        validate_birth_date(birth_date)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let dog = Dog::update(&conn, id, &data).map_err(|e| format!("Failed to update dog: {}", e))?;
    dog.map(DogDetail::from_dog).transpose()
}

/// Delete a dog and its history
pub fn delete_dog(db: &Database, id: i64) -> Result<DeleteDogResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = Dog::delete(&conn, id).map_err(|e| format!("Failed to delete dog: {}", e))?;
    if !deleted {
        return Err(format!("Dog {} not found", id));
    }
    info!(dog_id = id, "Dog deleted");
    Ok(DeleteDogResponse {
        success: true,
        deleted_id: id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::sample_dog;

    #[test]
    fn test_add_dog_reports_need() {
        let db = Database::in_memory().unwrap();
        let dog = add_dog(&db, sample_dog()).unwrap();
        assert_eq!(dog.daily_calorie_need, 629);
        assert_eq!(dog.activity_factor, 1.6);
    }

    #[test]
    fn test_add_dog_validation() {
        let db = Database::in_memory().unwrap();

        let mut nameless = sample_dog();
        nameless.name = "  ".to_string();
        assert!(add_dog(&db, nameless).is_err());

        let mut weightless = sample_dog();
        weightless.weight_kg = 0.0;
        assert_eq!(add_dog(&db, weightless).unwrap_err(), "weight_kg must be greater than 0");

        let mut bad_date = sample_dog();
        bad_date.birth_date = Some("04.05.2020".to_string());
        assert!(add_dog(&db, bad_date).is_err());
    }

    #[test]
    fn test_update_changes_need() {
        let db = Database::in_memory().unwrap();
        let dog = add_dog(&db, sample_dog()).unwrap();

        let update = DogUpdate {
            activity_level: Some(ActivityLevel::VeryLow),
            ..Default::default()
        };
        let updated = update_dog(&db, dog.id, update).unwrap().unwrap();
        assert!(updated.daily_calorie_need < dog.daily_calorie_need);

        assert!(update_dog(&db, 999, DogUpdate::default()).unwrap().is_none());
    }

    #[test]
    fn test_list_and_delete() {
        let db = Database::in_memory().unwrap();
        let dog = add_dog(&db, sample_dog()).unwrap();

        let list = list_dogs(&db).unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.dogs[0].daily_calorie_need, 629);

        assert!(delete_dog(&db, dog.id).unwrap().success);
        assert!(delete_dog(&db, dog.id).is_err());
        assert!(get_dog(&db, dog.id).unwrap().is_none());
    }
}
