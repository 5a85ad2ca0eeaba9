//! Database module
//!
//! Handles SQLite connection and migrations.

use std::path::PathBuf;

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};

/// Environment variable overriding the database location
pub const DATABASE_PATH_ENV: &str = "SNACKTRACK_DATABASE_PATH";

/// Get the database path from environment or use default
///
/// The default is `data/snacktrack.db` under the project root, found by
/// walking up from `target/{debug,release}`.
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            path.push("snacktrack.db");
            path
        })
}
