//! Restore file from the hand-maintained customer/service CSV pair.
//!
//! Customer rows: `id, name, phone, picture`.
//! Service rows: `id, customer_id, date, contents, pay_type, pay, remarks, sales`.
//! Legacy ids are carried over as they are; the app assigns its own on import.

use super::{RestoreCustomer, RestoreDocument, RestoreSummary, ServiceRecordFields};
use crate::clock::RunClock;
use crate::error::Result;
use crate::payment::PaymentType;
use crate::source::{blank_null, read_rows, require_file, SourceRow};
use std::path::Path;
use tracing::{info, warn};

const CUSTOMER_MIN_COLUMNS: usize = 3;
const SERVICE_MIN_COLUMNS: usize = 6;

/// Reshape both source files into a restore document.
pub fn build_from_pair(
    customer_rows: &[SourceRow],
    service_rows: &[SourceRow],
    clock: &RunClock,
) -> RestoreDocument {
    let created_at = clock.restore_timestamp();
    let mut doc = RestoreDocument::default();

    for row in customer_rows {
        if row.len() < CUSTOMER_MIN_COLUMNS {
            warn!("열이 부족한 고객 행 스킵: {}개 (line {})", row.len(), row.line());
            doc.skipped_rows += 1;
            continue;
        }
        doc.customers.push(RestoreCustomer::new(
            row.cell(0),
            row.cell(1),
            blank_null(row.cell(2)),
            "",
            &created_at,
        ));
    }

    for row in service_rows {
        if row.len() < SERVICE_MIN_COLUMNS {
            warn!("열이 부족한 서비스 기록 스킵: {}개 (line {})", row.len(), row.line());
            doc.skipped_rows += 1;
            continue;
        }
        let payment_type = PaymentType::from_source_text(row.cell(4));
        doc.service_records.push(
            ServiceRecordFields {
                id: row.cell(0),
                customer_id: row.cell(1),
                service_date: row.cell(2),
                service_content: row.cell(3),
                product_name: blank_null(row.cell(7)),
                payment_type: payment_type.as_str(),
                amount: row.cell(5),
                memo: blank_null(row.cell(6)),
                created_at: &created_at,
            }
            .into(),
        );
    }

    doc
}

/// Convert the customer/service pair into a restore file at `output`.
pub fn convert_pair(
    customer_csv: &Path,
    service_csv: &Path,
    output: &Path,
    clock: &RunClock,
) -> Result<RestoreSummary> {
    require_file(customer_csv)?;
    require_file(service_csv)?;

    info!(
        "변환 중: {} + {} -> {}",
        customer_csv.display(),
        service_csv.display(),
        output.display()
    );
    let customer_rows = read_rows(customer_csv)?;
    let service_rows = read_rows(service_csv)?;

    let doc = build_from_pair(&customer_rows, &service_rows, clock);
    doc.write_atomic(output)?;

    Ok(RestoreSummary::new(output, &doc))
}
