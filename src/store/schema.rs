//! Table layout of the history database read by the mobile app.

use crate::error::Result;
use rusqlite::Connection;

/// Create tables and indexes on an empty database.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT,
            memo TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS service_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            service_date TEXT NOT NULL,
            service_content TEXT NOT NULL,
            product_name TEXT,
            payment_type TEXT NOT NULL,
            amount INTEGER NOT NULL,
            memo TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (customer_id) REFERENCES customers (id) ON DELETE CASCADE
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_customer_id ON service_records(customer_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_service_date ON service_records(service_date)",
        [],
    )?;

    Ok(())
}
