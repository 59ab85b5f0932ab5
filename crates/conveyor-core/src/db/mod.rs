//! Database operations and SQLite management for plans.
//!
//! Plans are stored one row each; the four resource maps of a plan live in
//! JSON text columns and are written together.

use std::path::Path;

use log::warn;
use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod migrations;
pub mod plan_queries;

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Runs `op` inside an `IMMEDIATE` transaction.
    ///
    /// The write lock on the database file is taken before `op` reads
    /// anything, so read-modify-write sequences from other connections or
    /// processes wait for this one instead of overwriting it. The
    /// transaction is rolled back when `op` fails.
    pub fn write_transaction<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.connection
            .execute_batch("BEGIN IMMEDIATE")
            .db_context("Failed to begin transaction")?;

        match op(self) {
            Ok(value) => {
                self.connection
                    .execute_batch("COMMIT")
                    .db_context("Failed to commit transaction")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.connection.execute_batch("ROLLBACK") {
                    warn!("Failed to roll back transaction: {rollback}");
                }
                Err(e)
            }
        }
    }
}
