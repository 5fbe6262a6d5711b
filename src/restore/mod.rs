//! Restore CSV format
//!
//! The mobile app restores its data from a single CSV file with two tagged
//! sections: customers first, then service records. Each section starts with
//! its own header row and every data row names its kind in the `TYPE` column.
//!
//! Output is rendered into memory and only written to disk once the whole
//! document is built, through a temporary file renamed over the destination.

pub mod mssql;
pub mod pair;

pub use mssql::{build_from_mssql, convert_mssql};
pub use pair::{build_from_pair, convert_pair};

use crate::error::Result;
use csv::{Terminator, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Default file name of the generated restore file.
pub const DEFAULT_RESTORE_OUTPUT: &str = "hairdress_restore.csv";

pub const CUSTOMER_HEADER: [&str; 6] = ["TYPE", "id", "name", "phone", "memo", "created_at"];

pub const SERVICE_RECORD_HEADER: [&str; 10] = [
    "TYPE",
    "id",
    "customer_id",
    "service_date",
    "service_content",
    "product_name",
    "payment_type",
    "amount",
    "memo",
    "created_at",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    Customer,
    ServiceRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreCustomer {
    #[serde(rename = "TYPE")]
    pub kind: RecordKind,
    pub id: String,
    pub name: String,
    pub phone: String,
    pub memo: String,
    pub created_at: String,
}

impl RestoreCustomer {
    pub fn new(id: &str, name: &str, phone: &str, memo: &str, created_at: &str) -> Self {
        Self {
            kind: RecordKind::Customer,
            id: id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            memo: memo.to_string(),
            created_at: created_at.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreServiceRecord {
    #[serde(rename = "TYPE")]
    pub kind: RecordKind,
    pub id: String,
    pub customer_id: String,
    pub service_date: String,
    pub service_content: String,
    pub product_name: String,
    pub payment_type: String,
    pub amount: String,
    pub memo: String,
    pub created_at: String,
}

/// Column values of a service record row, in restore column order after `TYPE`.
pub struct ServiceRecordFields<'a> {
    pub id: &'a str,
    pub customer_id: &'a str,
    pub service_date: &'a str,
    pub service_content: &'a str,
    pub product_name: &'a str,
    pub payment_type: &'a str,
    pub amount: &'a str,
    pub memo: &'a str,
    pub created_at: &'a str,
}

impl From<ServiceRecordFields<'_>> for RestoreServiceRecord {
    fn from(f: ServiceRecordFields<'_>) -> Self {
        Self {
            kind: RecordKind::ServiceRecord,
            id: f.id.to_string(),
            customer_id: f.customer_id.to_string(),
            service_date: f.service_date.to_string(),
            service_content: f.service_content.to_string(),
            product_name: f.product_name.to_string(),
            payment_type: f.payment_type.to_string(),
            amount: f.amount.to_string(),
            memo: f.memo.to_string(),
            created_at: f.created_at.to_string(),
        }
    }
}

/// A complete restore file, held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreDocument {
    pub customers: Vec<RestoreCustomer>,
    pub service_records: Vec<RestoreServiceRecord>,
    /// Source rows that were not carried over.
    pub skipped_rows: usize,
}

impl RestoreDocument {
    /// Render the document as BOM-prefixed CSV with CRLF line endings.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut wtr = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .terminator(Terminator::CRLF)
            .from_writer(UTF8_BOM.to_vec());

        wtr.write_record(CUSTOMER_HEADER)?;
        for customer in &self.customers {
            wtr.serialize(customer)?;
        }

        wtr.write_record(SERVICE_RECORD_HEADER)?;
        for record in &self.service_records {
            wtr.serialize(record)?;
        }

        wtr.into_inner().map_err(|e| e.into_error().into())
    }

    /// Write the document to `path`, replacing any previous file only once the
    /// new content is fully on disk.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut staged = NamedTempFile::new_in(&dir)?;
        staged.write_all(&bytes)?;
        set_output_mode(staged.as_file(), path)?;
        staged.as_file().sync_all()?;
        staged.persist(path)?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// Give the staged file the mode of the file it replaces, or 0644 for a new one.
/// Temporary files are created owner-only.
#[cfg(unix)]
fn set_output_mode(staged: &File, path: &Path) -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let mode = match fs::metadata(path) {
        Ok(meta) => meta.permissions().mode() & 0o7777,
        Err(_) => NEW_FILE_MODE,
    };
    staged.set_permissions(fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_output_mode(_staged: &File, _path: &Path) -> Result<()> {
    Ok(())
}

/// Outcome of a restore conversion.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreSummary {
    pub output: PathBuf,
    pub customers: usize,
    pub service_records: usize,
    pub skipped_rows: usize,
}

impl RestoreSummary {
    fn new(output: &Path, doc: &RestoreDocument) -> Self {
        Self {
            output: output.to_path_buf(),
            customers: doc.customers.len(),
            service_records: doc.service_records.len(),
            skipped_rows: doc.skipped_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_rows;
    use tempfile::TempDir;

    fn sample() -> RestoreDocument {
        RestoreDocument {
            customers: vec![RestoreCustomer::new("7", "Jane Doe", "", "", "2024-03-05 09:00:00")],
            service_records: vec![ServiceRecordFields {
                id: "1",
                customer_id: "7",
                service_date: "2024-03-05",
                service_content: "Cut, then color",
                product_name: "Toner",
                payment_type: "card",
                amount: "50000",
                memo: "",
                created_at: "2024-03-05 09:00:00",
            }
            .into()],
            skipped_rows: 0,
        }
    }

    #[test]
    fn test_layout() {
        let bytes = sample().to_bytes().unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], "TYPE,id,name,phone,memo,created_at");
        assert_eq!(lines[1], "CUSTOMER,7,Jane Doe,,,2024-03-05 09:00:00");
        assert_eq!(
            lines[2],
            "TYPE,id,customer_id,service_date,service_content,product_name,payment_type,amount,memo,created_at"
        );
        assert_eq!(
            lines[3],
            "SERVICE_RECORD,1,7,2024-03-05,\"Cut, then color\",Toner,card,50000,,2024-03-05 09:00:00"
        );
    }

    #[test]
    fn test_exact_bytes() {
        let expected: &[u8] = b"\xEF\xBB\xBF\
TYPE,id,name,phone,memo,created_at\r\n\
CUSTOMER,7,Jane Doe,,,2024-03-05 09:00:00\r\n\
TYPE,id,customer_id,service_date,service_content,product_name,payment_type,amount,memo,created_at\r\n\
SERVICE_RECORD,1,7,2024-03-05,\"Cut, then color\",Toner,card,50000,,2024-03-05 09:00:00\r\n";

        assert_eq!(sample().to_bytes().unwrap(), expected);
    }

    #[test]
    fn test_empty_document_still_has_both_headers() {
        let bytes = RestoreDocument::default().to_bytes().unwrap();
        let rows = parse_rows(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(0), "TYPE");
        assert_eq!(rows[1].len(), SERVICE_RECORD_HEADER.len());
    }

    #[test]
    fn test_write_atomic_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("restore.csv");
        std::fs::write(&path, "stale").unwrap();

        sample().write_atomic(&path).unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, sample().to_bytes().unwrap());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_output_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("restore.csv");

        sample().write_atomic(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_replaced_output_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("restore.csv");
        std::fs::write(&path, "stale").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        sample().write_atomic(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
