// 🗄️ Local persistence - SQLite + WAL
//
// Optional collaborator: the stores work without it. When a database path is
// configured, AppContext writes every add/delete/clear through to here and
// reloads the collections on startup.

use crate::language::Language;
use crate::logbook::DeliveryRecord;
use crate::wallet::Transaction;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Event for audit trail ("every change is an event")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn)?;
    tracing::info!(path = %path.display(), "database opened");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Deliveries (logbook)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS deliveries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            delivery_uuid TEXT UNIQUE NOT NULL,
            customer TEXT NOT NULL,
            platform TEXT NOT NULL,
            fee REAL NOT NULL,
            area TEXT NOT NULL,
            notes TEXT,
            timestamp TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Transactions (wallet)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tx_uuid TEXT UNIQUE NOT NULL,
            transaction_type TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL,
            time TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Settings (key/value)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_deliveries_timestamp ON deliveries(timestamp)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_time ON transactions(time)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// Deliveries
// ============================================================================

pub fn save_delivery(conn: &Connection, record: &DeliveryRecord, actor: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO deliveries (
            delivery_uuid, customer, platform, fee, area, notes, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.customer,
            record.platform.as_str(),
            record.fee,
            record.area,
            record.notes,
            record.timestamp.to_rfc3339(),
        ],
    )
    .context("Failed to save delivery")?;

    log_event(
        conn,
        &Event::new(
            "delivery_added",
            "delivery",
            &record.id,
            serde_json::json!({
                "platform": record.platform,
                "fee": record.fee,
                "area": record.area,
            }),
            actor,
        ),
    );

    Ok(())
}

/// Delete a stored delivery. Returns false when nothing matched.
pub fn remove_delivery(conn: &Connection, id: &str, actor: &str) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM deliveries WHERE delivery_uuid = ?1", params![id])
        .context("Failed to delete delivery")?;

    if removed > 0 {
        log_event(
            conn,
            &Event::new("delivery_deleted", "delivery", id, serde_json::json!({}), actor),
        );
    }

    Ok(removed > 0)
}

pub fn load_deliveries(conn: &Connection) -> Result<Vec<DeliveryRecord>> {
    let mut stmt = conn.prepare(
        "SELECT delivery_uuid, customer, platform, fee, area, notes, timestamp
         FROM deliveries
         ORDER BY id ASC",
    )?;

    let deliveries = stmt
        .query_map([], |row| {
            let platform: String = row.get(2)?;
            let timestamp: String = row.get(6)?;

            Ok(DeliveryRecord {
                id: row.get(0)?,
                customer: row.get(1)?,
                platform: parse_column(2, &platform)?,
                fee: row.get(3)?,
                area: row.get(4)?,
                notes: row.get(5)?,
                timestamp: parse_timestamp(6, &timestamp)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load deliveries")?;

    Ok(deliveries)
}

// ============================================================================
// Transactions
// ============================================================================

pub fn save_transaction(conn: &Connection, tx: &Transaction, actor: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO transactions (
            tx_uuid, transaction_type, amount, category, description, time
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tx.id,
            tx.kind.as_str(),
            tx.amount,
            tx.category.as_str(),
            tx.description,
            tx.time.to_rfc3339(),
        ],
    )
    .context("Failed to save transaction")?;

    log_event(
        conn,
        &Event::new(
            "transaction_added",
            "transaction",
            &tx.id,
            serde_json::json!({
                "type": tx.kind,
                "amount": tx.amount,
                "category": tx.category,
            }),
            actor,
        ),
    );

    Ok(())
}

pub fn remove_transaction(conn: &Connection, id: &str, actor: &str) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM transactions WHERE tx_uuid = ?1", params![id])
        .context("Failed to delete transaction")?;

    if removed > 0 {
        log_event(
            conn,
            &Event::new(
                "transaction_deleted",
                "transaction",
                id,
                serde_json::json!({}),
                actor,
            ),
        );
    }

    Ok(removed > 0)
}

pub fn load_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT tx_uuid, transaction_type, amount, category, description, time
         FROM transactions
         ORDER BY id ASC",
    )?;

    let transactions = stmt
        .query_map([], |row| {
            let kind: String = row.get(1)?;
            let category: String = row.get(3)?;
            let time: String = row.get(5)?;

            Ok(Transaction {
                id: row.get(0)?,
                kind: parse_column(1, &kind)?,
                amount: row.get(2)?,
                category: parse_column(3, &category)?,
                description: row.get(4)?,
                time: parse_timestamp(5, &time)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load transactions")?;

    Ok(transactions)
}

// ============================================================================
// Settings
// ============================================================================

pub fn save_language(conn: &Connection, language: Language) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES ('language', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![language.code()],
    )
    .context("Failed to save language")?;
    Ok(())
}

/// Saved language, if one was ever stored
pub fn load_language(conn: &Connection) -> Result<Option<Language>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = 'language'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value.map(|code| Language::from_code(&code)))
}

// ============================================================================
// Maintenance
// ============================================================================

/// Delete every delivery and transaction. Settings and the audit trail stay.
pub fn clear_records(conn: &Connection, actor: &str) -> Result<(usize, usize)> {
    let tx = conn.unchecked_transaction()?;
    let deliveries = tx.execute("DELETE FROM deliveries", [])?;
    let transactions = tx.execute("DELETE FROM transactions", [])?;
    tx.commit().context("Failed to clear records")?;

    log_event(
        conn,
        &Event::new(
            "records_cleared",
            "store",
            "all",
            serde_json::json!({
                "deliveries": deliveries,
                "transactions": transactions,
            }),
            actor,
        ),
    );

    Ok((deliveries, transactions))
}

/// (deliveries, transactions) row counts
pub fn record_counts(conn: &Connection) -> Result<(i64, i64)> {
    let deliveries: i64 =
        conn.query_row("SELECT COUNT(*) FROM deliveries", [], |row| row.get(0))?;
    let transactions: i64 =
        conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

    Ok((deliveries, transactions))
}

// ============================================================================
// Audit trail
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// The audit trail is best-effort: a failed event never fails the write it describes
fn log_event(conn: &Connection, event: &Event) {
    if let Err(e) = insert_event(conn, event) {
        tracing::warn!(event_type = %event.event_type, "failed to record event: {e:#}");
    }
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: parse_timestamp(1, &timestamp)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// Column helpers
// ============================================================================

fn parse_timestamp(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn parse_column<T>(index: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, anyhow::anyhow!(e).into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::logbook::{LogbookStore, NewDelivery, Platform};
    use crate::wallet::{Category, NewTransaction, TransactionType, WalletStore};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn test_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::utc(
            Utc.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap(),
        ))
    }

    fn create_test_delivery(customer: &str, notes: Option<&str>) -> NewDelivery {
        NewDelivery {
            customer: customer.to_string(),
            platform: Platform::Careem,
            fee: 17.5,
            area: "Business Bay".to_string(),
            notes: notes.map(str::to_string),
        }
    }

    #[test]
    fn test_deliveries_round_trip_in_insertion_order() {
        let conn = test_db();
        let mut store = LogbookStore::new(test_clock());
        let first = store.add_delivery(create_test_delivery("First", None)).clone();
        let second = store
            .add_delivery(create_test_delivery("Second", Some("fragile")))
            .clone();

        save_delivery(&conn, &first, "test").unwrap();
        save_delivery(&conn, &second, "test").unwrap();

        let loaded = load_deliveries(&conn).unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn test_remove_delivery_reports_missing() {
        let conn = test_db();
        let mut store = LogbookStore::new(test_clock());
        let record = store.add_delivery(create_test_delivery("Ahmed", None)).clone();
        save_delivery(&conn, &record, "test").unwrap();

        assert!(remove_delivery(&conn, &record.id, "test").unwrap());
        assert!(!remove_delivery(&conn, &record.id, "test").unwrap());
        assert!(load_deliveries(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_transactions_round_trip() {
        let conn = test_db();
        let mut wallet = WalletStore::new(test_clock());
        let tx = wallet
            .add_transaction(NewTransaction {
                kind: TransactionType::Expense,
                amount: 20.0,
                category: Category::Fuel,
                description: "ADNOC".to_string(),
            })
            .clone();

        save_transaction(&conn, &tx, "test").unwrap();

        assert_eq!(load_transactions(&conn).unwrap(), vec![tx.clone()]);
        assert_eq!(record_counts(&conn).unwrap(), (0, 1));
        assert!(remove_transaction(&conn, &tx.id, "test").unwrap());
        assert_eq!(record_counts(&conn).unwrap(), (0, 0));
    }

    #[test]
    fn test_language_setting() {
        let conn = test_db();
        assert_eq!(load_language(&conn).unwrap(), None);

        save_language(&conn, Language::Ar).unwrap();
        assert_eq!(load_language(&conn).unwrap(), Some(Language::Ar));

        save_language(&conn, Language::En).unwrap();
        assert_eq!(load_language(&conn).unwrap(), Some(Language::En));
    }

    #[test]
    fn test_clear_records_keeps_settings() {
        let conn = test_db();
        let mut store = LogbookStore::new(test_clock());
        let record = store.add_delivery(create_test_delivery("Ahmed", None)).clone();
        save_delivery(&conn, &record, "test").unwrap();
        save_language(&conn, Language::Ar).unwrap();

        assert_eq!(clear_records(&conn, "test").unwrap(), (1, 0));
        assert_eq!(record_counts(&conn).unwrap(), (0, 0));
        assert_eq!(load_language(&conn).unwrap(), Some(Language::Ar));
    }

    #[test]
    fn test_writes_are_audited() {
        let conn = test_db();
        let mut store = LogbookStore::new(test_clock());
        let record = store.add_delivery(create_test_delivery("Ahmed", None)).clone();

        save_delivery(&conn, &record, "tui").unwrap();
        remove_delivery(&conn, &record.id, "tui").unwrap();

        let events = get_events_for_entity(&conn, "delivery", &record.id).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "delivery_deleted");
        assert_eq!(events[1].event_type, "delivery_added");
        assert_eq!(events[1].data["platform"], "careem");
        assert!(events.iter().all(|e| e.actor == "tui"));
    }

    #[test]
    fn test_corrupt_platform_is_an_error() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO deliveries (delivery_uuid, customer, platform, fee, area, notes, timestamp)
             VALUES ('x', 'A', 'deliveroo', 1.0, 'B', NULL, '2024-11-20T09:00:00+00:00')",
            [],
        )
        .unwrap();

        assert!(load_deliveries(&conn).is_err());
    }
}
