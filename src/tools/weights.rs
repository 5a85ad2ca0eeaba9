//! Weight MCP Tools
//!
//! Tools for recording body weight and reading the weight trend.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{Dog, WeightEntry, WeightEntryCreate};

/// A weight entry with its change against the previous one
#[derive(Debug, Serialize)]
pub struct WeightPoint {
    pub id: i64,
    pub weight_kg: f64,
    pub timestamp: String,
    pub note: Option<String>,
    /// Difference to the previous (older) entry
    pub change_kg: Option<f64>,
}

/// Response for get_weight_history
#[derive(Debug, Serialize)]
pub struct WeightHistoryResponse {
    pub dog_id: i64,
    pub dog_name: String,
    pub current_weight_kg: f64,
    pub target_weight_kg: Option<f64>,
    /// current - target; positive means above target
    pub distance_to_target_kg: Option<f64>,
    pub entries: Vec<WeightPoint>,
    pub count: usize,
}

/// Response for add_weight_entry
#[derive(Debug, Serialize)]
pub struct AddWeightResponse {
    pub entry: WeightEntry,
    pub current_weight_kg: f64,
    pub daily_calorie_need: u32,
}

/// Response for delete_weight_entry
#[derive(Debug, Serialize)]
pub struct DeleteWeightResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Record a weight measurement
pub fn add_weight_entry(db: &Database, data: WeightEntryCreate) -> Result<AddWeightResponse, String> {
    if !data.weight_kg.is_finite() || data.weight_kg <= 0.0 {
        return Err("weight_kg must be greater than 0".to_string());
    }

    let (entry, dog) = db
        .with_conn_mut(|conn| {
            let entry = WeightEntry::create(conn, &data)?;
            let dog = Dog::get_by_id(conn, data.dog_id)?;
            Ok((entry, dog))
        })
        .map_err(|e| format!("Failed to add weight entry: {}", e))?;
    let dog = dog.ok_or_else(|| format!("Dog {} not found", data.dog_id))?;
    info!(dog_id = dog.id, weight_kg = entry.weight_kg, "Weight recorded");

    Ok(AddWeightResponse {
        entry,
        current_weight_kg: dog.weight_kg,
        daily_calorie_need: dog.daily_calorie_need().map_err(|e| e.to_string())?,
    })
}

/// Weight history of a dog, newest first
pub fn get_weight_history(db: &Database, dog_id: i64, limit: Option<i64>) -> Result<WeightHistoryResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let dog = Dog::get_by_id(&conn, dog_id)
        .map_err(|e| format!("Failed to get dog: {}", e))?
        .ok_or_else(|| format!("Dog {} not found", dog_id))?;

    // One extra row so the oldest returned entry still gets a change value
    let fetch = limit.filter(|l| *l > 0).map(|l| l.saturating_add(1));
    let history = WeightEntry::list_for_dog(&conn, dog_id, fetch)
        .map_err(|e| format!("Failed to list weights: {}", e))?;

    let mut entries: Vec<WeightPoint> = history
        .iter()
        .enumerate()
        .map(|(i, entry)| WeightPoint {
            id: entry.id,
            weight_kg: entry.weight_kg,
            timestamp: entry.timestamp.clone(),
            note: entry.note.clone(),
            change_kg: history.get(i + 1).map(|prev| round2(entry.weight_kg - prev.weight_kg)),
        })
        .collect();
    if let Some(limit) = limit.filter(|l| *l > 0) {
        entries.truncate(limit as usize);
    }

    let count = entries.len();
    Ok(WeightHistoryResponse {
        dog_id,
        distance_to_target_kg: dog.target_weight_kg.map(|t| round2(dog.weight_kg - t)),
        dog_name: dog.name,
        current_weight_kg: dog.weight_kg,
        target_weight_kg: dog.target_weight_kg,
        entries,
        count,
    })
}

/// Delete a weight entry
///
/// The dog's current weight is left as is.
pub fn delete_weight_entry(db: &Database, id: i64) -> Result<DeleteWeightResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = WeightEntry::delete(&conn, id).map_err(|e| format!("Failed to delete weight entry: {}", e))?;
    if !deleted {
        return Err(format!("Weight entry {} not found", id));
    }
    Ok(DeleteWeightResponse {
        success: true,
        deleted_id: id,
    })
}
