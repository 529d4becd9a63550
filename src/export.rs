//! Full-ledger CSV export for offline bookkeeping.

use std::io::Write;

use thiserror::Error;

use pharmledger_core::{LedgerEntry, LedgerStore, StorageError};

pub const EXPORT_FILENAME: &str = "transactions.csv";

pub const EXPORT_HEADERS: [&str; 16] = [
    "ID",
    "Date",
    "Total Sale",
    "Cash Sale",
    "Card Sale",
    "Talabat Sale",
    "Insurance Sale",
    "Credit Sale",
    "Med Purchase",
    "Other Exp",
    "Collection",
    "Curr Reading",
    "Prev Reading",
    "Opening Petty",
    "Closing Petty",
    "Discrepancy",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders an amount the way spreadsheets round-trip it: always with a
/// decimal point (`100.0`, `12.5`).
pub fn format_amount(value: f64) -> String {
    format!("{value:?}")
}

fn export_record(entry: &LedgerEntry) -> [String; 16] {
    let v = &entry.values;
    [
        entry.id.to_string(),
        v.date.clone(),
        format_amount(v.total_sale),
        format_amount(v.cash_sale),
        format_amount(v.card_sale),
        format_amount(v.talabat_sale),
        format_amount(v.insurance_sale),
        format_amount(v.credit_sale),
        format_amount(v.med_purchase),
        format_amount(v.other_exp),
        format_amount(v.collection),
        format_amount(v.curr_reading),
        format_amount(v.prev_reading),
        format_amount(v.opening_petty),
        format_amount(v.closing_petty),
        format_amount(v.discrepancy),
    ]
}

/// Writes the header and one record per entry to `out`.
pub fn write_entries<W: Write>(out: W, entries: &[LedgerEntry]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(EXPORT_HEADERS)?;
    for entry in entries {
        writer.write_record(export_record(entry))?;
    }
    writer.flush()?;
    Ok(())
}

/// Every stored entry as UTF-8 CSV bytes. Read-only; no paging.
pub fn export_csv(store: &dyn LedgerStore) -> Result<Vec<u8>, ExportError> {
    let entries = store.list_all()?;
    let mut buf = Vec::new();
    write_entries(&mut buf, &entries)?;
    tracing::debug!(rows = entries.len(), bytes = buf.len(), "Ledger exported");
    Ok(buf)
}
