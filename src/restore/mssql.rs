//! Restore file from the MSSQL tagged export.
//!
//! The export puts both row kinds in one 12-column layout:
//!
//! ```text
//! CUSTOMER,id,name,phone,memo,created_at,NULL,NULL,NULL,NULL,NULL,NULL
//! SERVICE_RECORD,id,NULL,NULL,memo,created_at,customer_id,service_date,service_content,product_name,payment_type,amount
//! ```
//!
//! Values are already in app form, so cells are copied as they are apart from
//! blanking `NULL` placeholders in optional text columns.

use super::{RestoreCustomer, RestoreDocument, RestoreSummary, ServiceRecordFields};
use crate::error::Result;
use crate::source::{blank_null, read_rows, require_file, SourceRow};
use std::path::Path;
use tracing::{debug, info, warn};

const CUSTOMER_MIN_COLUMNS: usize = 6;
const SERVICE_MIN_COLUMNS: usize = 12;

/// Reshape tagged export rows into a restore document.
pub fn build_from_mssql(rows: &[SourceRow]) -> RestoreDocument {
    let mut doc = RestoreDocument::default();

    for row in rows {
        match row.cell(0).to_ascii_uppercase().as_str() {
            "CUSTOMER" if row.len() >= CUSTOMER_MIN_COLUMNS => {
                doc.customers.push(RestoreCustomer::new(
                    row.raw(1),
                    row.raw(2),
                    blank_null(row.raw(3)),
                    blank_null(row.raw(4)),
                    row.raw(5),
                ));
            }
            "SERVICE_RECORD" if row.len() >= SERVICE_MIN_COLUMNS => {
                doc.service_records.push(
                    ServiceRecordFields {
                        id: row.raw(1),
                        customer_id: row.raw(6),
                        service_date: row.raw(7),
                        service_content: row.raw(8),
                        product_name: blank_null(row.raw(9)),
                        payment_type: row.raw(10),
                        amount: row.raw(11),
                        memo: blank_null(row.raw(4)),
                        created_at: row.raw(5),
                    }
                    .into(),
                );
            }
            tag @ ("CUSTOMER" | "SERVICE_RECORD") => {
                warn!(
                    "열이 부족한 {} 행 스킵: {}개 (line {})",
                    tag,
                    row.len(),
                    row.line()
                );
                doc.skipped_rows += 1;
            }
            tag => {
                debug!("Skipping line {} ({:?}, {} columns)", row.line(), tag, row.len());
                doc.skipped_rows += 1;
            }
        }
    }

    doc
}

/// Convert an MSSQL export into a restore file at `output`.
pub fn convert_mssql(input: &Path, output: &Path) -> Result<RestoreSummary> {
    require_file(input)?;

    info!("변환 중: {} -> {}", input.display(), output.display());
    let rows = read_rows(input)?;

    let doc = build_from_mssql(&rows);
    doc.write_atomic(output)?;

    Ok(RestoreSummary::new(output, &doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_rows;
    use crate::test_support::capture_logs;
    use tracing::Level;

    #[test]
    fn test_tagged_rows_are_reshaped() {
        let rows = parse_rows(
            "TYPE,id,name,phone,memo,created_at\n\
             CUSTOMER,3,Kim,NULL,VIP,2023-01-01 10:00:00,NULL,NULL,NULL,NULL,NULL,NULL\n\
             service_record,11,NULL,NULL,NULL,2023-02-01 10:00:00,3,2023-02-01T10:00:00,Perm,NULL,card,90000\n\
             SERVICE_RECORD,12,NULL,NULL,memo,2023-02-01 10:00:00,3,2023-02-01\n",
        )
        .unwrap();

        let doc = build_from_mssql(&rows);

        assert_eq!(doc.customers.len(), 1);
        assert_eq!(doc.service_records.len(), 1);
        assert_eq!(doc.skipped_rows, 2);

        let customer = &doc.customers[0];
        assert_eq!(customer.phone, "");
        assert_eq!(customer.memo, "VIP");
        assert_eq!(customer.created_at, "2023-01-01 10:00:00");

        let record = &doc.service_records[0];
        assert_eq!(record.id, "11");
        assert_eq!(record.customer_id, "3");
        assert_eq!(record.service_date, "2023-02-01T10:00:00");
        assert_eq!(record.service_content, "Perm");
        assert_eq!(record.product_name, "");
        assert_eq!(record.payment_type, "card");
        assert_eq!(record.amount, "90000");
        assert_eq!(record.memo, "");
    }

    #[test]
    fn test_short_tagged_rows_warn_but_header_does_not() {
        let rows = parse_rows(
            "TYPE,id,name,phone,memo,created_at\n\
             CUSTOMER,3,Kim\n\
             SERVICE_RECORD,12,NULL,NULL,memo,2023-02-01 10:00:00,3,2023-02-01\n",
        )
        .unwrap();

        let (doc, log) = capture_logs(Level::WARN, || build_from_mssql(&rows));

        assert_eq!(doc.skipped_rows, 3);
        assert!(log.contains("열이 부족한 CUSTOMER 행 스킵: 3개 (line 2)"), "{}", log);
        assert!(log.contains("열이 부족한 SERVICE_RECORD 행 스킵: 8개 (line 3)"), "{}", log);
        assert!(!log.contains("TYPE"), "{}", log);
    }
}
