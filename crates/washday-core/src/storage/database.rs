//! SQLite-backed storage.
//!
//! Provides persistent storage for:
//! - Encoded collections (wardrobe, supplies, cycle history, timer state)
//! - Pending completion alerts, one per cycle type

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, NotificationError, PersistenceError};
use crate::gateway::{Collection, NotificationGateway, PersistenceGateway, StoreTxn, TxnBody};
use crate::model::CycleType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAlert {
    pub cycle_type: CycleType,
    pub fires_at: DateTime<Utc>,
}

/// How long a writer waits for another process holding the file lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database for collections and alerts.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database at `<data_dir>/washday.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("washday.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path).map_err(|source| PersistenceError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        db.migrate()?;
        Ok(db)
    }

    /// File backing this database, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn
            .lock()
            .map_err(|e| PersistenceError::QueryFailed(format!("Lock failed: {e}")))
    }

    fn migrate(&self) -> Result<(), PersistenceError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS collections (
                name        TEXT PRIMARY KEY,
                payload     TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pending_alerts (
                cycle_type  TEXT PRIMARY KEY,
                fires_at    TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Alerts that have not fired yet as of `now`, soonest first.
    pub fn pending_alerts(&self, now: DateTime<Utc>) -> Result<Vec<PendingAlert>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT cycle_type, fires_at FROM pending_alerts ORDER BY fires_at")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut alerts = Vec::new();
        for row in rows {
            let (cycle_type, fires_at) = row?;
            let Some(alert) = decode_alert(&cycle_type, &fires_at) else {
                continue;
            };
            if alert.fires_at > now {
                alerts.push(alert);
            }
        }
        Ok(alerts)
    }
}

fn decode_alert(cycle_type: &str, fires_at: &str) -> Option<PendingAlert> {
    Some(PendingAlert {
        cycle_type: cycle_type.parse().ok()?,
        fires_at: DateTime::parse_from_rfc3339(fires_at)
            .ok()?
            .with_timezone(&Utc),
    })
}

fn save_payload(
    conn: &Connection,
    collection: Collection,
    payload: &str,
) -> Result<(), PersistenceError> {
    conn.execute(
        "INSERT OR REPLACE INTO collections (name, payload, updated_at) VALUES (?1, ?2, ?3)",
        params![collection.key(), payload, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn load_payload(conn: &Connection, collection: Collection) -> Result<Option<String>, PersistenceError> {
    let payload = conn
        .query_row(
            "SELECT payload FROM collections WHERE name = ?1",
            params![collection.key()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(payload)
}

struct SqlTxn<'a>(&'a Connection);

impl StoreTxn for SqlTxn<'_> {
    fn load(&mut self, collection: Collection) -> Result<Option<String>, PersistenceError> {
        load_payload(self.0, collection)
    }

    fn save(&mut self, collection: Collection, payload: &str) -> Result<(), PersistenceError> {
        save_payload(self.0, collection, payload)
    }
}

impl PersistenceGateway for Database {
    fn save(&self, collection: Collection, payload: &str) -> Result<(), PersistenceError> {
        save_payload(&*self.conn()?, collection, payload)
    }

    fn load(&self, collection: Collection) -> Result<Option<String>, PersistenceError> {
        load_payload(&*self.conn()?, collection)
    }

    fn clear(&self, collection: Collection) -> Result<(), PersistenceError> {
        self.conn()?.execute(
            "DELETE FROM collections WHERE name = ?1",
            params![collection.key()],
        )?;
        Ok(())
    }

    fn transaction(&self, body: &mut TxnBody<'_>) -> Result<(), PersistenceError> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock up front, so the reads inside the
        // body already exclude other processes.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        body(&mut SqlTxn(&tx))?;
        tx.commit()?;
        Ok(())
    }
}

impl NotificationGateway for Database {
    fn schedule_completion(
        &self,
        cycle_type: CycleType,
        fires_at: DateTime<Utc>,
    ) -> Result<(), NotificationError> {
        let write = || -> Result<(), PersistenceError> {
            self.conn()?.execute(
                "INSERT OR REPLACE INTO pending_alerts (cycle_type, fires_at) VALUES (?1, ?2)",
                params![cycle_type.as_str(), fires_at.to_rfc3339()],
            )?;
            Ok(())
        };
        write().map_err(|e| NotificationError::ScheduleFailed {
            cycle_type,
            message: e.to_string(),
        })
    }

    fn cancel(&self, cycle_type: CycleType) -> Result<(), NotificationError> {
        let delete = || -> Result<(), PersistenceError> {
            self.conn()?.execute(
                "DELETE FROM pending_alerts WHERE cycle_type = ?1",
                params![cycle_type.as_str()],
            )?;
            Ok(())
        };
        delete().map_err(|e| NotificationError::CancelFailed {
            cycle_type,
            message: e.to_string(),
        })
    }

    fn pending(&self, cycle_type: CycleType) -> Option<DateTime<Utc>> {
        let conn = self.conn().ok()?;
        let fires_at: String = conn
            .query_row(
                "SELECT fires_at FROM pending_alerts WHERE cycle_type = ?1",
                params![cycle_type.as_str()],
                |row| row.get(0),
            )
            .optional()
            .ok()??;
        decode_alert(cycle_type.as_str(), &fires_at).map(|a| a.fires_at)
    }
}
