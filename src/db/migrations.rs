//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;
use tracing::info;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        info!("Applying schema migration v1");
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- DOGS
        -- Animal profiles; calorie need is derived on read
        -- ============================================
        CREATE TABLE dogs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            birth_date TEXT,                     -- ISO date: "2021-04-17"
            breed TEXT NOT NULL DEFAULT '',
            sex TEXT NOT NULL CHECK(sex IN ('male', 'female', 'unknown')) DEFAULT 'unknown',
            weight_kg REAL NOT NULL CHECK(weight_kg > 0),
            target_weight_kg REAL CHECK(target_weight_kg IS NULL OR target_weight_kg > 0),
            activity_level TEXT NOT NULL
                CHECK(activity_level IN ('very_low', 'low', 'normal', 'high', 'very_high'))
                DEFAULT 'normal',
            image_path TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_dogs_name ON dogs(name);

        -- ============================================
        -- FOODS
        -- Product database, guaranteed analysis per 100g
        -- ============================================
        CREATE TABLE foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ean TEXT UNIQUE,                     -- canonical EAN-8/EAN-13, nullable
            brand TEXT NOT NULL DEFAULT '',
            product TEXT NOT NULL,

            protein REAL NOT NULL DEFAULT 0,     -- g/100g
            fat REAL NOT NULL DEFAULT 0,         -- g/100g
            crude_fiber REAL NOT NULL DEFAULT 0, -- g/100g
            raw_ash REAL NOT NULL DEFAULT 0,     -- g/100g
            moisture REAL NOT NULL DEFAULT 0,    -- g/100g

            additives TEXT NOT NULL DEFAULT '{}', -- JSON object of name -> amount
            image_url TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_foods_product ON foods(product);
        CREATE INDEX idx_foods_brand ON foods(brand);

        -- ============================================
        -- FOOD SUBMISSIONS
        -- User proposals awaiting review
        -- ============================================
        CREATE TABLE food_submissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ean TEXT,
            brand TEXT NOT NULL DEFAULT '',
            product TEXT NOT NULL,

            protein REAL NOT NULL DEFAULT 0,
            fat REAL NOT NULL DEFAULT 0,
            crude_fiber REAL NOT NULL DEFAULT 0,
            raw_ash REAL NOT NULL DEFAULT 0,
            moisture REAL NOT NULL DEFAULT 0,

            additives TEXT NOT NULL DEFAULT '{}',
            image_url TEXT,

            status TEXT NOT NULL CHECK(status IN ('pending', 'approved', 'rejected')) DEFAULT 'pending',
            food_id INTEGER REFERENCES foods(id) ON DELETE SET NULL,  -- set on approval
            submitted_at TEXT NOT NULL,
            reviewed_at TEXT
        );

        CREATE INDEX idx_food_submissions_status ON food_submissions(status);

        -- ============================================
        -- FOOD INTAKES
        -- What a dog actually ate
        -- ============================================
        CREATE TABLE food_intakes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dog_id INTEGER NOT NULL REFERENCES dogs(id) ON DELETE CASCADE,
            food_id INTEGER REFERENCES foods(id) ON DELETE SET NULL,  -- NULL = manual entry
            food_name TEXT NOT NULL,
            amount_grams REAL NOT NULL CHECK(amount_grams > 0),
            calories INTEGER NOT NULL,           -- whole kcal
            timestamp TEXT NOT NULL,             -- "2025-01-09T18:30:00"
            note TEXT,

            -- Optional macro grams for the consumed amount
            protein REAL,
            fat REAL,
            carbs REAL,

            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_food_intakes_dog_time ON food_intakes(dog_id, timestamp);
        CREATE INDEX idx_food_intakes_food ON food_intakes(food_id);

        -- ============================================
        -- WEIGHT ENTRIES
        -- Body mass history
        -- ============================================
        CREATE TABLE weight_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dog_id INTEGER NOT NULL REFERENCES dogs(id) ON DELETE CASCADE,
            weight_kg REAL NOT NULL CHECK(weight_kg > 0),
            timestamp TEXT NOT NULL,
            note TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_weight_entries_dog_time ON weight_entries(dog_id, timestamp);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }
}
