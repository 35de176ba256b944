// Settings -> Export Data
//
// Writes the logbook and wallet as two CSV files a spreadsheet can open.

use crate::app::AppContext;
use crate::logbook::DeliveryRecord;
use crate::wallet::Transaction;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DELIVERIES_FILE: &str = "deliveries.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

#[derive(Serialize)]
struct DeliveryRow<'a> {
    id: &'a str,
    timestamp: String,
    customer: &'a str,
    platform: &'a str,
    fee: f64,
    area: &'a str,
    notes: &'a str,
}

#[derive(Serialize)]
struct TransactionRow<'a> {
    id: &'a str,
    time: String,
    kind: &'a str,
    category: &'a str,
    amount: f64,
    description: &'a str,
}

const DELIVERY_HEADERS: [&str; 7] = ["ID", "Timestamp", "Customer", "Platform", "Fee", "Area", "Notes"];
const TRANSACTION_HEADERS: [&str; 6] = ["ID", "Time", "Type", "Category", "Amount", "Description"];

/// CSV writer that emits `headers` up front, so an empty export still has column names
fn csv_writer<W: Write>(writer: W, headers: &[&str]) -> Result<csv::Writer<W>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(headers).context("Failed to write header row")?;
    Ok(wtr)
}

pub fn write_deliveries_csv<W: Write>(writer: W, records: &[DeliveryRecord]) -> Result<()> {
    let mut wtr = csv_writer(writer, &DELIVERY_HEADERS)?;
    for record in records {
        wtr.serialize(DeliveryRow {
            id: &record.id,
            timestamp: record.timestamp.to_rfc3339(),
            customer: &record.customer,
            platform: record.platform.as_str(),
            fee: record.fee,
            area: &record.area,
            notes: record.notes.as_deref().unwrap_or(""),
        })
        .context("Failed to write delivery row")?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_transactions_csv<W: Write>(writer: W, records: &[Transaction]) -> Result<()> {
    let mut wtr = csv_writer(writer, &TRANSACTION_HEADERS)?;
    for tx in records {
        wtr.serialize(TransactionRow {
            id: &tx.id,
            time: tx.time.to_rfc3339(),
            kind: tx.kind.as_str(),
            category: tx.category.as_str(),
            amount: tx.amount,
            description: &tx.description,
        })
        .context("Failed to write transaction row")?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export both collections into `dir`. Returns the written file paths.
pub fn export_to_dir(dir: &Path, ctx: &AppContext) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let deliveries_path = dir.join(DELIVERIES_FILE);
    let file = File::create(&deliveries_path)
        .with_context(|| format!("Failed to create {}", deliveries_path.display()))?;
    write_deliveries_csv(file, ctx.logbook.deliveries())?;

    let transactions_path = dir.join(TRANSACTIONS_FILE);
    let file = File::create(&transactions_path)
        .with_context(|| format!("Failed to create {}", transactions_path.display()))?;
    write_transactions_csv(file, ctx.wallet.transactions())?;

    tracing::info!(
        dir = %dir.display(),
        deliveries = ctx.logbook.len(),
        transactions = ctx.wallet.len(),
        "data exported"
    );

    Ok(vec![deliveries_path, transactions_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::language::Language;
    use crate::logbook::{NewDelivery, Platform};
    use crate::wallet::{Category, NewTransaction, TransactionType};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn test_context() -> AppContext {
        let clock = Arc::new(FixedClock::utc(
            Utc.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap(),
        ));
        let mut ctx = AppContext::in_memory(clock, Language::En);
        ctx.logbook.add_delivery(NewDelivery {
            customer: "Ahmed, Jr.".to_string(),
            platform: Platform::Talabat,
            fee: 25.0,
            area: "Dubai Marina".to_string(),
            notes: None,
        });
        ctx.wallet.add_transaction(NewTransaction {
            kind: TransactionType::Expense,
            amount: 20.0,
            category: Category::Fuel,
            description: "Gas station".to_string(),
        });
        ctx
    }

    #[test]
    fn test_write_deliveries_csv() {
        let ctx = test_context();
        let mut buf = Vec::new();
        write_deliveries_csv(&mut buf, ctx.logbook.deliveries()).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,Timestamp,Customer,Platform,Fee,Area,Notes"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"Ahmed, Jr.\""), "comma in name must be quoted: {}", row);
        assert!(row.contains(",talabat,25.0,Dubai Marina,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_write_transactions_csv() {
        let ctx = test_context();
        let mut buf = Vec::new();
        write_transactions_csv(&mut buf, ctx.wallet.transactions()).unwrap();

        let mut rdr = csv::Reader::from_reader(buf.as_slice());
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["ID", "Time", "Type", "Category", "Amount", "Description"]
        );
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][2], "expense");
        assert_eq!(&rows[0][3], "fuel");
        assert_eq!(&rows[0][4], "20.0");
    }

    #[test]
    fn test_empty_export_keeps_headers() {
        let mut deliveries = Vec::new();
        write_deliveries_csv(&mut deliveries, &[]).unwrap();
        assert_eq!(
            String::from_utf8(deliveries).unwrap(),
            "ID,Timestamp,Customer,Platform,Fee,Area,Notes\n"
        );

        let mut transactions = Vec::new();
        write_transactions_csv(&mut transactions, &[]).unwrap();
        assert_eq!(
            String::from_utf8(transactions).unwrap(),
            "ID,Time,Type,Category,Amount,Description\n"
        );
    }

    #[test]
    fn test_export_to_dir() {
        let ctx = test_context();
        let dir = std::env::temp_dir().join(format!("zimam-export-{}", uuid::Uuid::new_v4()));

        let paths = export_to_dir(&dir, &ctx).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.exists()));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
