//! Two-pass import of customers and their service records.
//!
//! Pass one inserts customers and hands back the legacy id to surrogate id
//! map. Pass two can only run with that map in hand, so a service record may
//! reference any customer regardless of where it appears in the file.

use crate::clock::RunClock;
use crate::date::{normalize_service_date, service_datetime, DateFallback};
use crate::error::{ConvertError, Result};
use crate::payment::PaymentType;
use crate::source::SourceRow;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

const CUSTOMER_MIN_COLUMNS: usize = 2;
const SERVICE_MIN_COLUMNS: usize = 6;

/// Why a source row was left out of the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ShortRow,
    BlankName,
    InvalidLegacyId,
    MissingCustomerId,
    UnknownCustomer,
    EmptyContent,
    RejectedDate,
}

/// Inserted and skipped row counts for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub inserted: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl PassStats {
    fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

/// Legacy customer id to the id the database assigned, for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerIdMap {
    ids: HashMap<i64, i64>,
}

impl CustomerIdMap {
    pub fn get(&self, legacy_id: i64) -> Option<i64> {
        self.ids.get(&legacy_id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Result of the customer pass. The map is only readable from here on.
#[derive(Debug, Clone)]
pub struct CustomerPass {
    pub ids: CustomerIdMap,
    pub stats: PassStats,
}

fn parse_legacy_id(cell: &str) -> Option<i64> {
    cell.trim_start_matches('\u{feff}').trim().parse::<i64>().ok()
}

/// Insert every usable customer row and build the id map.
pub fn load_customers(conn: &Connection, rows: &[SourceRow], clock: &RunClock) -> Result<CustomerPass> {
    let created_at = clock.created_at();
    let mut stmt = conn.prepare_cached(
        "INSERT INTO customers (name, phone, memo, created_at) VALUES (?1, ?2, NULL, ?3)",
    )?;

    let mut ids = HashMap::new();
    let mut stats = PassStats::default();

    for row in rows {
        if row.len() < CUSTOMER_MIN_COLUMNS {
            warn!("열이 부족한 고객 행 스킵: {}개 (line {})", row.len(), row.line());
            stats.skip(SkipReason::ShortRow);
            continue;
        }

        let name = row.cell(1);
        if name.is_empty() {
            warn!("이름이 없는 고객 행 스킵 (line {})", row.line());
            stats.skip(SkipReason::BlankName);
            continue;
        }

        let legacy_id = match parse_legacy_id(row.raw(0)) {
            Some(id) => id,
            None => {
                warn!("고객 ID 파싱 실패, 스킵: {:?} (line {})", row.cell(0), row.line());
                stats.skip(SkipReason::InvalidLegacyId);
                continue;
            }
        };

        stmt.execute(params![name, row.optional(2), created_at])?;
        let new_id = conn.last_insert_rowid();

        if ids.insert(legacy_id, new_id).is_some() {
            warn!("중복 고객 ID {}: 마지막 행으로 매핑 (line {})", legacy_id, row.line());
        }
        stats.inserted += 1;
    }

    debug!("Customer pass: {} inserted, {} skipped", stats.inserted, stats.total_skipped());
    Ok(CustomerPass {
        ids: CustomerIdMap { ids },
        stats,
    })
}

/// Insert service records, translating legacy customer ids through `ids`.
pub fn load_service_records(
    conn: &Connection,
    rows: &[SourceRow],
    ids: &CustomerIdMap,
    date_fallback: DateFallback,
    clock: &RunClock,
) -> Result<PassStats> {
    let created_at = clock.created_at();
    let mut stmt = conn.prepare_cached(
        r#"
        INSERT INTO service_records
        (customer_id, service_date, service_content, product_name, payment_type, amount, memo, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )?;

    let mut stats = PassStats::default();

    for row in rows {
        if row.len() < SERVICE_MIN_COLUMNS {
            warn!("열이 부족한 서비스 기록 스킵: {}개 (line {})", row.len(), row.line());
            stats.skip(SkipReason::ShortRow);
            continue;
        }

        let legacy_customer = row.cell(1);
        if legacy_customer.is_empty() {
            warn!("고객 ID가 없는 서비스 기록 스킵 (line {})", row.line());
            stats.skip(SkipReason::MissingCustomerId);
            continue;
        }
        let customer_id = match parse_legacy_id(legacy_customer) {
            Some(legacy_id) => match ids.get(legacy_id) {
                Some(id) => id,
                None => {
                    warn!("알 수 없는 고객 ID {}, 스킵 (line {})", legacy_id, row.line());
                    stats.skip(SkipReason::UnknownCustomer);
                    continue;
                }
            },
            None => {
                warn!("고객 ID 파싱 실패, 스킵: {:?} (line {})", legacy_customer, row.line());
                stats.skip(SkipReason::InvalidLegacyId);
                continue;
            }
        };

        let content = row.cell(3);
        if content.is_empty() {
            warn!("서비스 내용이 없는 기록 스킵 (line {})", row.line());
            stats.skip(SkipReason::EmptyContent);
            continue;
        }

        let service_date = match normalize_service_date(row.cell(2), date_fallback, clock.today()) {
            Ok(date) => service_datetime(&date, clock.time_of_day()),
            Err(ConvertError::Date(msg)) => {
                warn!("날짜 거부, 스킵: {} (line {})", msg, row.line());
                stats.skip(SkipReason::RejectedDate);
                continue;
            }
            Err(e) => return Err(e),
        };

        let payment_type = PaymentType::from_source_text(row.cell(4));
        let amount = row.cell(5).parse::<i64>().unwrap_or(0);

        stmt.execute(params![
            customer_id,
            service_date,
            content,
            row.optional(7),
            payment_type.as_str(),
            amount,
            row.optional(6),
            created_at,
        ])?;
        stats.inserted += 1;
    }

    debug!("Service pass: {} inserted, {} skipped", stats.inserted, stats.total_skipped());
    Ok(stats)
}
