use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;

use crate::snapshot::Snapshot;

pub const DB_FILE: &str = "./farm-telemetry.db";

/// One persisted row of the history table. Nullable fields mirror the
/// snapshot: NULL means the device had not produced a value by save time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub date: i64,
    pub soil_moisture: Option<i64>,
    pub temperature: Option<i64>,
    pub humidity: Option<i64>,
    pub soil_temperature: Option<f64>,
    pub visible: Option<i64>,
    pub infra_red: Option<i64>,
    pub ultra_violet: Option<f64>,
    pub relay_state: Option<bool>,
    pub button1_state: Option<bool>,
    pub button2_state: Option<bool>,
}

/// Append-only history of snapshots. The writer connection sits behind the
/// store's own lock (the slow lane is the only writer); `query_history`
/// opens a short-lived read connection so queries run alongside a write.
pub struct HistoryStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl HistoryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).context("Failed to open database file")?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Safe to call on every startup.
    pub fn init(&self) -> Result<(), anyhow::Error> {
        self.writer()?
            .execute_batch(
                r"
                CREATE TABLE IF NOT EXISTS history (
                    date INTEGER PRIMARY KEY,
                    soil_moisture INTEGER,
                    temperature INTEGER,
                    humidity INTEGER,
                    soil_temperature REAL,
                    visible INTEGER,
                    infra_red INTEGER,
                    ultra_violet REAL,
                    relay_state INTEGER,
                    button1_state INTEGER,
                    button2_state INTEGER
                );
                ",
            )
            .context("Failed to create history table")?;
        Ok(())
    }

    /// Writes one history row keyed by the current wall-clock second.
    pub fn append_snapshot(&self, snapshot: &Snapshot) -> Result<(), anyhow::Error> {
        self.append_at(snapshot, Utc::now().timestamp())
    }

    fn append_at(&self, snapshot: &Snapshot, date: i64) -> Result<(), anyhow::Error> {
        self.writer()?
            .execute(
                r"
                INSERT INTO history (
                    date, soil_moisture, temperature, humidity, soil_temperature,
                    visible, infra_red, ultra_violet, relay_state, button1_state, button2_state
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    date,
                    snapshot.soil_moisture,
                    snapshot.temperature,
                    snapshot.humidity,
                    snapshot.soil_temperature,
                    snapshot.visible,
                    snapshot.infra_red,
                    snapshot.ultra_violet,
                    snapshot.relay,
                    snapshot.button1,
                    snapshot.button2,
                ],
            )
            .context("Failed to insert history row")?;
        Ok(())
    }

    /// Returns all rows with `date > from_date`, oldest first.
    pub fn query_history(&self, from_date: i64) -> Result<Vec<HistoryRecord>, anyhow::Error> {
        let conn = Connection::open(&self.path).context("Failed to open database file")?;
        let mut stmt = conn
            .prepare(
                r"
                SELECT date, soil_moisture, temperature, humidity, soil_temperature,
                       visible, infra_red, ultra_violet, relay_state, button1_state, button2_state
                FROM history
                WHERE date > ?1
                ORDER BY date ASC",
            )
            .context("Failed to prepare history query")?;

        let rows = stmt
            .query_map([from_date], |row| {
                Ok(HistoryRecord {
                    date: row.get(0)?,
                    soil_moisture: row.get(1)?,
                    temperature: row.get(2)?,
                    humidity: row.get(3)?,
                    soil_temperature: row.get(4)?,
                    visible: row.get(5)?,
                    infra_red: row.get(6)?,
                    ultra_violet: row.get(7)?,
                    relay_state: row.get(8)?,
                    button1_state: row.get(9)?,
                    button2_state: row.get(10)?,
                })
            })
            .context("Failed to query history")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read history row")?;

        Ok(rows)
    }

    fn writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>, anyhow::Error> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("history writer lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "farm-telemetry-{}-{}.db",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn sample_snapshot(moisture: i64) -> Snapshot {
        Snapshot {
            soil_moisture: Some(moisture),
            temperature: Some(21),
            humidity: Some(40),
            soil_temperature: Some(18.5),
            visible: Some(260),
            infra_red: Some(120),
            ultra_violet: Some(0.02),
            relay: Some(false),
            button1: Some(false),
            button2: Some(false),
            captured_at: Some(Utc::now()),
        }
    }

    #[test]
    fn init_is_idempotent_and_preserves_data() {
        let path = temp_db("init");

        let store = HistoryStore::open(&path).unwrap();
        store.init().unwrap();
        store.append_at(&sample_snapshot(100), 10).unwrap();
        drop(store);

        let store = HistoryStore::open(&path).unwrap();
        store.init().unwrap();
        store.init().unwrap();

        let rows = store.query_history(0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].soil_moisture, Some(100));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn query_is_strictly_greater_than() {
        let path = temp_db("strict");
        let store = HistoryStore::open(&path).unwrap();
        store.init().unwrap();
        store.append_at(&sample_snapshot(1), 100).unwrap();

        assert_eq!(store.query_history(99).unwrap().len(), 1);
        assert_eq!(store.query_history(100).unwrap().len(), 0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn query_returns_rows_timestamp_ascending() {
        let path = temp_db("order");
        let store = HistoryStore::open(&path).unwrap();
        store.init().unwrap();
        store.append_at(&sample_snapshot(3), 30).unwrap();
        store.append_at(&sample_snapshot(1), 10).unwrap();
        store.append_at(&sample_snapshot(2), 20).unwrap();

        let dates: Vec<i64> = store
            .query_history(0)
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![10, 20, 30]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_snapshot_records_nulls() {
        let path = temp_db("nulls");
        let store = HistoryStore::open(&path).unwrap();
        store.init().unwrap();
        store.append_at(&Snapshot::default(), 5).unwrap();

        let rows = store.query_history(0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].soil_moisture, None);
        assert_eq!(rows[0].relay_state, None);
        assert_eq!(rows[0].ultra_violet, None);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn duplicate_timestamp_fails_without_corrupting_existing_rows() {
        let path = temp_db("dup");
        let store = HistoryStore::open(&path).unwrap();
        store.init().unwrap();
        store.append_at(&sample_snapshot(1), 50).unwrap();
        assert!(store.append_at(&sample_snapshot(2), 50).is_err());

        let rows = store.query_history(0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].soil_moisture, Some(1));

        let _ = std::fs::remove_file(&path);
    }
}
