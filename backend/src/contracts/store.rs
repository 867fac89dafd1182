use super::{Contract, ContractId};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use common::model::contract::{ContractStats, ContractSummary, GenerationStatus};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

pub trait ContractStore: Send + Sync {
    /// Persists a new contract. Fails with `AlreadyExists` rather than overwriting.
    fn put(&self, contract: &Contract) -> Result<(), StoreError>;

    fn get(&self, id: &ContractId) -> Result<Option<Vec<u8>>, StoreError>;

    fn summary(&self, id: &ContractId) -> Result<Option<ContractSummary>, StoreError>;

    /// Appends the outcome of a delivery attempt to the notification log.
    fn record_notification(&self, id: &ContractId, outcome: Result<(), &str>) -> Result<(), StoreError>;

    /// Counters for contracts generated in `[from, to)`.
    fn stats(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<ContractStats, StoreError>;
}

/// PDFs as files under `dir`, metadata and notification log in SQLite.
pub struct FsContractStore {
    dir: PathBuf,
    db_path: PathBuf,
}

impl FsContractStore {
    pub fn new(dir: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            db_path: db_path.into(),
        })
    }

    fn pdf_path(&self, id: &ContractId) -> PathBuf {
        self.dir.join(format!("{}.pdf", id))
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }
}

/// Timestamps are stored as fixed-width RFC 3339 strings so they compare lexically.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

impl ContractStore for FsContractStore {
    fn put(&self, contract: &Contract) -> Result<(), StoreError> {
        let path = self.pdf_path(&contract.id);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(format!("contract {}", contract.id)));
            }
            Err(e) => return Err(e.into()),
        };

        let written = file
            .write_all(&contract.pdf_bytes)
            .and_then(|_| file.sync_all())
            .map_err(StoreError::from)
            .and_then(|_| {
                let conn = self.connect()?;
                conn.execute(
                    "INSERT INTO contracts (id, template, generated_at, size) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        contract.id.as_str(),
                        contract.template,
                        timestamp(contract.generated_at),
                        contract.pdf_bytes.len() as i64
                    ],
                )?;
                Ok(())
            });

        if written.is_err() {
            // no half-written contract is left behind
            let _ = std::fs::remove_file(&path);
        }
        written
    }

    fn get(&self, id: &ContractId) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(self.pdf_path(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn summary(&self, id: &ContractId) -> Result<Option<ContractSummary>, StoreError> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT c.template, c.generated_at,
                        EXISTS (SELECT 1 FROM notifications n WHERE n.contract_id = c.id AND n.success = 1)
                 FROM contracts c WHERE c.id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(template, generated_at, notified)| ContractSummary {
            id: id.to_string(),
            generated_at,
            template,
            status: if notified {
                GenerationStatus::GeneratedAndNotified
            } else {
                GenerationStatus::Generated
            },
        }))
    }

    fn record_notification(&self, id: &ContractId, outcome: Result<(), &str>) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO notifications (contract_id, success, detail, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![id.as_str(), outcome.is_ok(), outcome.err(), timestamp(Utc::now())],
        )?;
        Ok(())
    }

    fn stats(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<ContractStats, StoreError> {
        let conn = self.connect()?;
        let (generated, notified, failures) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(EXISTS (SELECT 1 FROM notifications n
                                         WHERE n.contract_id = c.id AND n.success = 1)), 0),
                    COALESCE(SUM(EXISTS (SELECT 1 FROM notifications n
                                         WHERE n.contract_id = c.id AND n.success = 0)), 0)
             FROM contracts c
             WHERE c.generated_at >= ?1 AND c.generated_at < ?2",
            params![timestamp(from), timestamp(to)],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
        )?;

        Ok(ContractStats {
            generated: generated as u64,
            notified: notified as u64,
            notification_failures: failures as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn store() -> (TempDir, FsContractStore) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.sqlite");
        db::init_schema(&db_path).unwrap();
        let store = FsContractStore::new(dir.path().join("contracts"), db_path).unwrap();
        (dir, store)
    }

    fn contract(at: DateTime<Utc>) -> Contract {
        Contract {
            id: ContractId::generate(),
            pdf_bytes: b"%PDF-1.4 test".to_vec(),
            generated_at: at,
            template: "default".to_string(),
        }
    }

    #[test]
    fn stored_bytes_round_trip() {
        let (_dir, store) = store();
        let c = contract(Utc::now());
        store.put(&c).unwrap();
        assert_eq!(store.get(&c.id).unwrap(), Some(c.pdf_bytes.clone()));
    }

    #[test]
    fn unknown_ids_are_absent() {
        let (_dir, store) = store();
        assert_eq!(store.get(&ContractId::generate()).unwrap(), None);
        assert_eq!(store.summary(&ContractId::generate()).unwrap(), None);
    }

    #[test]
    fn contracts_are_never_overwritten() {
        let (_dir, store) = store();
        let c = contract(Utc::now());
        store.put(&c).unwrap();

        let mut again = c.clone();
        again.pdf_bytes = b"other".to_vec();
        assert!(matches!(store.put(&again), Err(StoreError::AlreadyExists(_))));
        assert_eq!(store.get(&c.id).unwrap(), Some(c.pdf_bytes));
    }

    #[test]
    fn summary_reflects_notification_outcome() {
        let (_dir, store) = store();
        let c = contract(Utc::now());
        store.put(&c).unwrap();
        assert_eq!(store.summary(&c.id).unwrap().unwrap().status, GenerationStatus::Generated);

        store.record_notification(&c.id, Err("smtp down")).unwrap();
        assert_eq!(store.summary(&c.id).unwrap().unwrap().status, GenerationStatus::Generated);

        store.record_notification(&c.id, Ok(())).unwrap();
        let summary = store.summary(&c.id).unwrap().unwrap();
        assert_eq!(summary.status, GenerationStatus::GeneratedAndNotified);
        assert_eq!(summary.template, "default");
    }

    #[test]
    fn stats_count_within_the_window() {
        let (_dir, store) = store();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let early = contract(base - Duration::days(2));
        let inside_a = contract(base);
        let inside_b = contract(base + Duration::hours(3));
        let late = contract(base + Duration::days(1));
        for c in [&early, &inside_a, &inside_b, &late] {
            store.put(c).unwrap();
        }
        store.record_notification(&inside_a.id, Ok(())).unwrap();
        store.record_notification(&inside_b.id, Err("refused")).unwrap();

        let stats = store.stats(base, base + Duration::days(1)).unwrap();
        assert_eq!(
            stats,
            ContractStats {
                generated: 2,
                notified: 1,
                notification_failures: 1,
            }
        );
    }
}
