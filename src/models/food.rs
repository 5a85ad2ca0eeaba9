//! Food model
//!
//! A dog food product with its guaranteed analysis. Carbohydrate and energy
//! density are computed from the stored fractions on every read.

use std::collections::BTreeMap;

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::Composition;

/// Decode the JSON `additives` column, failing on malformed content
pub(crate) fn additives_from_row(row: &Row) -> rusqlite::Result<BTreeMap<String, String>> {
    let idx = row.as_ref().column_index("additives")?;
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// A food product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    pub ean: Option<String>,
    pub brand: String,
    pub product: String,
    pub composition: Composition,
    pub additives: BTreeMap<String, String>,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a food
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodCreate {
    /// Canonical barcode, already normalized
    pub ean: Option<String>,
    #[serde(default)]
    pub brand: String,
    pub product: String,
    pub composition: Composition,
    #[serde(default)]
    pub additives: BTreeMap<String, String>,
    pub image_url: Option<String>,
}

impl Food {
    /// Carbohydrate per 100 g
    pub fn carbs(&self) -> f64 {
        self.composition.carbs()
    }

    /// Energy density per 100 g
    pub fn kcal_per_100g(&self) -> f64 {
        self.composition.kcal_per_100g()
    }

    /// "Brand Product", or just the product when no brand is set
    pub fn display_name(&self) -> String {
        if self.brand.trim().is_empty() {
            self.product.clone()
        } else {
            format!("{} {}", self.brand, self.product)
        }
    }

    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
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
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new food
    pub fn create(conn: &Connection, data: &FoodCreate) -> DbResult<Self> {
        let additives = serde_json::to_string(&data.additives)
            .map_err(|e| DbError::Invalid(format!("Invalid additives: {}", e)))?;

        conn.execute(
            r#"
            INSERT INTO foods (
                ean, brand, product,
                protein, fat, crude_fiber, raw_ash, moisture,
                additives, image_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
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
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("Food"))
    }

    /// Get a food by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM foods WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(food) => Ok(Some(food)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a food by its canonical barcode
    pub fn get_by_ean(conn: &Connection, ean: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM foods WHERE ean = ?1")?;

        let result = stmt.query_row([ean], Self::from_row);
        match result {
            Ok(food) => Ok(Some(food)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search foods by product or brand (case-insensitive substring)
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let escaped = query
            .trim()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let search_pattern = format!("%{}%", escaped);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM foods
            WHERE product LIKE ?1 ESCAPE '\' OR brand LIKE ?1 ESCAPE '\'
            ORDER BY brand ASC, product ASC
            LIMIT ?2
            "#
        )?;

        let foods = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(foods)
    }

    /// List foods with pagination
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM foods ORDER BY brand ASC, product ASC LIMIT ?1 OFFSET ?2"
        )?;

        let foods = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(foods)
    }

    /// Count all foods
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM foods", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of intakes referencing this food
    pub fn get_intake_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM food_intakes WHERE food_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a food; intakes keep their stored name and calories
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM foods WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::test_support::sample_food;

    #[test]
    fn test_create_and_derived_values() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        let food = Food::create(&conn, &sample_food()).unwrap();
        assert_eq!(food.carbs(), 43.0);
        assert_eq!(food.kcal_per_100g(), 340.0);
        assert_eq!(food.additives.get("Vitamin D3").map(String::as_str), Some("1500 IE"));
        assert_eq!(food.display_name(), "Wolfsblut Wide Plain");
    }

    #[test]
    fn test_lookup_by_ean() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let food = Food::create(&conn, &sample_food()).unwrap();

        let found = Food::get_by_ean(&conn, "4006381333931").unwrap().unwrap();
        assert_eq!(found.id, food.id);
        assert!(Food::get_by_ean(&conn, "96385074").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_ean_rejected() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        Food::create(&conn, &sample_food()).unwrap();
        assert!(Food::create(&conn, &sample_food()).is_err());
    }

    #[test]
    fn test_search_case_insensitive() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        Food::create(&conn, &sample_food()).unwrap();
        let mut other = sample_food();
        other.ean = None;
        other.brand = "Rinti".to_string();
        other.product = "Kennerfleisch Huhn".to_string();
        Food::create(&conn, &other).unwrap();

        assert_eq!(Food::search(&conn, "wide", 50).unwrap().len(), 1);
        assert_eq!(Food::search(&conn, "RINTI", 50).unwrap().len(), 1);
        assert_eq!(Food::search(&conn, "i", 1).unwrap().len(), 1);
        assert_eq!(Food::count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        Food::create(&conn, &sample_food()).unwrap();

        assert!(Food::search(&conn, "%", 50).unwrap().is_empty());
        assert!(Food::search(&conn, "_", 50).unwrap().is_empty());
        assert!(Food::search(&conn, "W_de", 50).unwrap().is_empty());

        let mut percent = sample_food();
        percent.ean = None;
        percent.product = "Lamb 100% Pure".to_string();
        Food::create(&conn, &percent).unwrap();
        let found = Food::search(&conn, "100%", 50).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product, "Lamb 100% Pure");
    }

    #[test]
    fn test_corrupt_additives_is_an_error() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        let food = Food::create(&conn, &sample_food()).unwrap();

        conn.execute("UPDATE foods SET additives = '{broken' WHERE id = ?1", [food.id]).unwrap();
        assert!(Food::get_by_id(&conn, food.id).is_err());
    }
}
