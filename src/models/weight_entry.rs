//! Weight Entry model
//!
//! Body mass history of a dog.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{timestamp, Dog};

/// A weight measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: i64,
    pub dog_id: i64,
    pub weight_kg: f64,
    pub timestamp: String,
    pub note: Option<String>,
    pub created_at: String,
}

/// Data for recording a weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntryCreate {
    pub dog_id: i64,
    pub weight_kg: f64,
    pub timestamp: Option<String>,
    pub note: Option<String>,
}

impl WeightEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            dog_id: row.get("dog_id")?,
            weight_kg: row.get("weight_kg")?,
            timestamp: row.get("timestamp")?,
            note: row.get("note")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Record a weight and make it the dog's current weight
    ///
    /// The dog's weight is only replaced when the new entry is the latest one,
    /// so back-filling old measurements does not overwrite a newer weight.
    pub fn create(conn: &mut Connection, data: &WeightEntryCreate) -> DbResult<Self> {
        let timestamp = timestamp::normalize(data.timestamp.as_deref())?;
        let tx = conn.transaction()?;

        if Dog::get_by_id(&tx, data.dog_id)?.is_none() {
            return Err(DbError::NotFound("Dog"));
        }

        tx.execute(
            "INSERT INTO weight_entries (dog_id, weight_kg, timestamp, note) VALUES (?1, ?2, ?3, ?4)",
            params![data.dog_id, data.weight_kg, timestamp, data.note],
        )?;
        let id = tx.last_insert_rowid();

        let latest = Self::latest(&tx, data.dog_id)?;
        if latest.as_ref().map(|e| e.id) == Some(id) {
            Dog::set_weight(&tx, data.dog_id, data.weight_kg)?;
        }

        let entry = Self::get_by_id(&tx, id)?.ok_or(DbError::NotFound("Weight entry"))?;
        tx.commit()?;
        Ok(entry)
    }

    /// Get an entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM weight_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Full history of a dog, newest first
    pub fn list_for_dog(conn: &Connection, dog_id: i64, limit: Option<i64>) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM weight_entries
            WHERE dog_id = ?1
            ORDER BY timestamp DESC, id DESC
            LIMIT ?2
            "#
        )?;

        // SQLite treats a negative LIMIT as unbounded
        let entries = stmt
            .query_map(params![dog_id, limit.unwrap_or(-1)], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Entries between two dates (inclusive), oldest first
    pub fn list_for_range(conn: &Connection, dog_id: i64, start_date: &str, end_date: &str) -> DbResult<Vec<Self>> {
        let (start, _) = timestamp::day_bounds(start_date)?;
        let (_, end) = timestamp::day_bounds(end_date)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM weight_entries
            WHERE dog_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
            ORDER BY timestamp ASC, id ASC
            "#
        )?;

        let entries = stmt
            .query_map(params![dog_id, start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Most recent entry of a dog
    pub fn latest(conn: &Connection, dog_id: i64) -> DbResult<Option<Self>> {
        Ok(Self::list_for_dog(conn, dog_id, Some(1))?.into_iter().next())
    }

    /// Delete an entry
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM weight_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::test_support::sample_dog;

    fn entry(dog_id: i64, kg: f64, ts: &str) -> WeightEntryCreate {
        WeightEntryCreate {
            dog_id,
            weight_kg: kg,
            timestamp: Some(ts.to_string()),
            note: None,
        }
    }

    #[test]
    fn test_create_updates_dog_weight() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();

        WeightEntry::create(&mut conn, &entry(dog.id, 10.8, "2025-03-01T08:00:00")).unwrap();
        let dog = Dog::get_by_id(&conn, dog.id).unwrap().unwrap();
        assert_eq!(dog.weight_kg, 10.8);
    }

    #[test]
    fn test_backfill_keeps_newer_weight() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let dog = Dog::create(&conn, &sample_dog()).unwrap();

        WeightEntry::create(&mut conn, &entry(dog.id, 11.0, "2025-03-10T08:00:00")).unwrap();
        WeightEntry::create(&mut conn, &entry(dog.id, 12.0, "2025-02-01T08:00:00")).unwrap();

        let dog = Dog::get_by_id(&conn, dog.id).unwrap().unwrap();
        assert_eq!(dog.weight_kg, 11.0);

        let history = WeightEntry::list_for_dog(&conn, dog.id, None).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].weight_kg, 11.0);

        let range = WeightEntry::list_for_range(&conn, dog.id, "2025-01-01", "2025-02-28").unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range[0].weight_kg, 12.0);
    }

    #[test]
    fn test_unknown_dog() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        assert!(matches!(
            WeightEntry::create(&mut conn, &entry(7, 10.0, "2025-03-01T08:00:00")),
            Err(DbError::NotFound("Dog"))
        ));
    }
}
