//! Food Submission model
//!
//! A proposed product entry waiting for review. Approving it copies the
//! data into the food database.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::Composition;
use super::food::additives_from_row;
use super::{timestamp, Food, FoodCreate};

/// Review status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(SubmissionStatus::Pending),
            "approved" | "approve" => Some(SubmissionStatus::Approved),
            "rejected" | "reject" => Some(SubmissionStatus::Rejected),
            _ => None,
        }
    }
}

/// A food submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodSubmission {
    pub id: i64,
    pub ean: Option<String>,
    pub brand: String,
    pub product: String,
    pub composition: Composition,
    pub additives: BTreeMap<String, String>,
    pub image_url: Option<String>,
    pub status: SubmissionStatus,
    pub food_id: Option<i64>,
    pub submitted_at: String,
    pub reviewed_at: Option<String>,
}

impl FoodSubmission {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            ean: row.get("ean")?,
            brand: row.get("brand")?,
            product: row.get("product")?,
            composition: Composition {
                protein: row.get("protein")?,
                fat: row.get("fat")?,
                crude_fiber: row.get("crude_fiber")?,
                raw_ash: row.get("raw_ash")?,
                moisture: row.get("moisture")?,
            },
            additives: additives_from_row(row)?,
            image_url: row.get("image_url")?,
            status: SubmissionStatus::from_str(&status).unwrap_or_default(),
            food_id: row.get("food_id")?,
            submitted_at: row.get("submitted_at")?,
            reviewed_at: row.get("reviewed_at")?,
        })
    }

    /// Insert a new pending submission
    pub fn create(conn: &Connection, data: &FoodCreate) -> DbResult<Self> {
        let additives = serde_json::to_string(&data.additives)
            .map_err(|e| DbError::Invalid(format!("Invalid additives: {}", e)))?;

        conn.execute(
            r#"
            INSERT INTO food_submissions (
                ean, brand, product,
                protein, fat, crude_fiber, raw_ash, moisture,
                additives, image_url, status, submitted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'pending', ?11)
            "#,
            params![
                data.ean,
                data.brand,
                data.product,
                data.composition.protein,
                data.composition.fat,
                data.composition.crude_fiber,
                data.composition.raw_ash,
                data.composition.moisture,
                additives,
                data.image_url,
                timestamp::now(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Food submission"))
    }

    /// Get a submission by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_submissions WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(submission) => Ok(Some(submission)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List submissions, newest first, optionally filtered by status
    pub fn list(conn: &Connection, status: Option<SubmissionStatus>) -> DbResult<Vec<Self>> {
        let submissions = match status {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM food_submissions WHERE status = ?1 ORDER BY submitted_at DESC, id DESC"
                )?;
                let rows = stmt
                    .query_map([status.as_str()], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM food_submissions ORDER BY submitted_at DESC, id DESC"
                )?;
                let rows = stmt
                    .query_map([], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(submissions)
    }

    /// Approve a pending submission, creating the food entry
    pub fn approve(conn: &mut Connection, id: i64) -> DbResult<(Self, Food)> {
        let tx = conn.transaction()?;

        let submission = Self::get_by_id(&tx, id)?.ok_or(DbError::NotFound("Food submission"))?;
        if submission.status != SubmissionStatus::Pending {
            return Err(DbError::Invalid(format!(
                "Submission {} was already {}",
                id,
                submission.status.as_str()
            )));
        }

        let food = Food::create(&tx, &FoodCreate {
            ean: submission.ean.clone(),
            brand: submission.brand.clone(),
            product: submission.product.clone(),
            composition: submission.composition,
            additives: submission.additives.clone(),
            image_url: submission.image_url.clone(),
        })?;

        tx.execute(
            "UPDATE food_submissions SET status = 'approved', food_id = ?1, reviewed_at = ?2 WHERE id = ?3",
            params![food.id, timestamp::now(), id],
        )?;

        let updated = Self::get_by_id(&tx, id)?.ok_or(DbError::NotFound("Food submission"))?;
        tx.commit()?;

        Ok((updated, food))
    }

    /// Reject a pending submission
    pub fn reject(conn: &Connection, id: i64) -> DbResult<Self> {
        let submission = Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Food submission"))?;
        if submission.status != SubmissionStatus::Pending {
            return Err(DbError::Invalid(format!(
                "Submission {} was already {}",
                id,
                submission.status.as_str()
            )));
        }

        conn.execute(
            "UPDATE food_submissions SET status = 'rejected', reviewed_at = ?1 WHERE id = ?2",
            params![timestamp::now(), id],
        )?;

        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Food submission"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::test_support::sample_food;

    #[test]
    fn test_submit_and_approve() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();

        let submission = FoodSubmission::create(&conn, &sample_food()).unwrap();
        assert_eq!(submission.status, SubmissionStatus::Pending);
        assert!(submission.reviewed_at.is_none());

        let (approved, food) = FoodSubmission::approve(&mut conn, submission.id).unwrap();
        assert_eq!(approved.status, SubmissionStatus::Approved);
        assert_eq!(approved.food_id, Some(food.id));
        assert!(approved.reviewed_at.is_some());
        assert_eq!(food.kcal_per_100g(), 340.0);
        assert_eq!(food.ean.as_deref(), Some("4006381333931"));
    }

    #[test]
    fn test_review_only_once() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();

        let submission = FoodSubmission::create(&conn, &sample_food()).unwrap();
        let rejected = FoodSubmission::reject(&conn, submission.id).unwrap();
        assert_eq!(rejected.status, SubmissionStatus::Rejected);

        assert!(matches!(
            FoodSubmission::approve(&mut conn, submission.id),
            Err(DbError::Invalid(_))
        ));
        assert!(matches!(
            FoodSubmission::reject(&conn, 42),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_failed_approval_rolls_back() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();

        // The barcode is already taken by an existing food
        Food::create(&conn, &sample_food()).unwrap();
        let submission = FoodSubmission::create(&conn, &sample_food()).unwrap();
        assert!(FoodSubmission::approve(&mut conn, submission.id).is_err());

        let still_pending = FoodSubmission::get_by_id(&conn, submission.id).unwrap().unwrap();
        assert_eq!(still_pending.status, SubmissionStatus::Pending);
        assert_eq!(Food::count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_list_by_status() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let first = FoodSubmission::create(&conn, &sample_food()).unwrap();
        FoodSubmission::create(&conn, &sample_food()).unwrap();
        FoodSubmission::reject(&conn, first.id).unwrap();

        assert_eq!(FoodSubmission::list(&conn, None).unwrap().len(), 2);
        assert_eq!(FoodSubmission::list(&conn, Some(SubmissionStatus::Pending)).unwrap().len(), 1);
        assert_eq!(FoodSubmission::list(&conn, Some(SubmissionStatus::Rejected)).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_additives_is_an_error() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let submission = FoodSubmission::create(&conn, &sample_food()).unwrap();

        conn.execute("UPDATE food_submissions SET additives = '[1, 2' WHERE id = ?1", [submission.id]).unwrap();
        assert!(FoodSubmission::get_by_id(&conn, submission.id).is_err());
    }
}
