//! SQLite history database
//!
//! Every conversion builds the database from scratch: an existing file at the
//! target path is removed, the schema is created, and both import passes run
//! inside one transaction. A failure anywhere rolls the whole import back.

pub mod loader;
pub mod schema;

pub use loader::{
    load_customers, load_service_records, CustomerIdMap, CustomerPass, PassStats, SkipReason,
};
pub use schema::init_schema;

use crate::clock::RunClock;
use crate::date::DateFallback;
use crate::error::Result;
use crate::source::{read_rows, require_file, SourceRow};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default file name of the generated database.
pub const DEFAULT_DB_OUTPUT: &str = "hairdress_history.db";

/// Handle on a history database file.
pub struct HistoryDb {
    path: PathBuf,
    conn: Connection,
}

impl HistoryDb {
    /// Delete whatever is at `path` and create an empty database there.
    pub fn create_fresh(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            info!("기존 DB 파일 삭제: {}", path.display());
            std::fs::remove_file(&path)?;
        }

        info!("DB 파일 생성 중: {}", path.display());
        let db = Self::open(&path)?;
        init_schema(&db.conn)?;
        Ok(db)
    }

    /// Open an existing database with foreign key enforcement switched on.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(Self { path, conn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn customer_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?)
    }

    pub fn service_record_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM service_records", [], |row| row.get(0))?)
    }

    /// Run both import passes in a single transaction.
    ///
    /// The transaction rolls back when dropped, so any error returned from a
    /// pass leaves the database without imported rows.
    pub fn import(
        &mut self,
        customer_rows: &[SourceRow],
        service_rows: &[SourceRow],
        date_fallback: DateFallback,
        clock: &RunClock,
    ) -> Result<(PassStats, PassStats)> {
        let tx = self.conn.transaction()?;

        let customers = load_customers(&tx, customer_rows, clock)?;
        info!("고객 {}명 로드 완료", customers.ids.len());

        let services = load_service_records(&tx, service_rows, &customers.ids, date_fallback, clock)?;
        info!(
            "서비스 기록 {}건 로드 완료 ({}건 스킵)",
            services.inserted,
            services.total_skipped()
        );

        tx.commit()?;
        Ok((customers.stats, services))
    }
}

/// Outcome of a database conversion.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub output: PathBuf,
    pub customers: i64,
    pub service_records: i64,
    pub customer_pass: PassStats,
    pub service_pass: PassStats,
}

/// Convert a customer file and a service file into a fresh database.
pub fn convert_to_db(
    customer_csv: &Path,
    service_csv: &Path,
    db_path: &Path,
    date_fallback: DateFallback,
    clock: &RunClock,
) -> Result<LoadSummary> {
    require_file(customer_csv)?;
    require_file(service_csv)?;

    info!("고객 데이터 로딩 중: {}", customer_csv.display());
    let customer_rows = read_rows(customer_csv)?;
    info!("서비스 기록 데이터 로딩 중: {}", service_csv.display());
    let service_rows = read_rows(service_csv)?;

    let mut db = HistoryDb::create_fresh(db_path)?;
    let (customer_pass, service_pass) = db.import(&customer_rows, &service_rows, date_fallback, clock)?;
    info!("DB 파일 생성 완료: {}", db.path().display());

    Ok(LoadSummary {
        output: db.path().to_path_buf(),
        customers: db.customer_count()?,
        service_records: db.service_record_count()?,
        customer_pass,
        service_pass,
    })
}
