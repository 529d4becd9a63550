//! Best-effort spreadsheet log of created entries.
//!
//! The mirror is written once per created entry and never reconciled with
//! later updates or deletes; the ledger store stays authoritative.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};

use pharmledger_core::LedgerEntryCommand;

use crate::export::format_amount;

pub const MIRROR_HEADERS: [&str; 12] = [
    "Date",
    "Total Sale",
    "Cash Sale",
    "Card",
    "Talabat",
    "Insurance",
    "Credit Sale",
    "Med Purchase",
    "Other Exp",
    "Collection (Owner)",
    "Cash In Hand",
    "Discrepancy",
];

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unexpected header in {path}: {found:?}")]
    UnexpectedHeader { path: PathBuf, found: Vec<String> },
    #[error("mirror worker stopped: {0}")]
    Worker(String),
}

/// The spreadsheet file itself. Every append rewrites the whole file.
#[derive(Debug, Clone)]
pub struct SpreadsheetMirror {
    path: PathBuf,
}

impl SpreadsheetMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &LedgerEntryCommand) -> Result<(), MirrorError> {
        let mut rows = if self.path.exists() {
            self.read_rows()?
        } else {
            Vec::new()
        };
        rows.push(mirror_row(entry));
        self.write_rows(&rows)
    }

    /// Data rows of the existing file, header checked and stripped.
    fn read_rows(&self) -> Result<Vec<Vec<String>>, MirrorError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;
        let mut records = reader.records();

        match records.next().transpose()? {
            Some(header) if header.iter().eq(MIRROR_HEADERS) => {}
            other => {
                return Err(MirrorError::UnexpectedHeader {
                    path: self.path.clone(),
                    found: other
                        .map(|h| h.iter().map(str::to_string).collect())
                        .unwrap_or_default(),
                })
            }
        }

        records
            .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()
            .map_err(MirrorError::from)
    }

    fn write_rows(&self, rows: &[Vec<String>]) -> Result<(), MirrorError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&tmp)?;
        writer.write_record(MIRROR_HEADERS)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn mirror_row(e: &LedgerEntryCommand) -> Vec<String> {
    vec![
        e.date.clone(),
        format_amount(e.total_sale),
        format_amount(e.cash_sale),
        format_amount(e.card_sale),
        format_amount(e.talabat_sale),
        format_amount(e.insurance_sale),
        format_amount(e.credit_sale),
        format_amount(e.med_purchase),
        format_amount(e.other_exp),
        format_amount(e.collection),
        format_amount(e.closing_petty),
        format_amount(e.discrepancy),
    ]
}

/// Sending side of the mirror queue. Cheap to clone; never blocks or fails.
#[derive(Debug, Clone)]
pub struct MirrorQueue {
    tx: mpsc::UnboundedSender<LedgerEntryCommand>,
    failures: Arc<AtomicU64>,
}

impl MirrorQueue {
    pub fn submit(&self, entry: LedgerEntryCommand) {
        if let Err(e) = self.tx.send(entry) {
            tracing::warn!(date = %e.0.date, "Mirror worker is gone, entry not mirrored");
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Appends that failed since the worker started.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Handle on the background task draining the queue.
pub struct MirrorWorker {
    handle: JoinHandle<()>,
    failures: Arc<AtomicU64>,
}

impl MirrorWorker {
    /// Waits for every queued append to finish and returns how many failed.
    /// Completes only once all `MirrorQueue` clones have been dropped.
    pub async fn join(self) -> Result<u64, MirrorError> {
        self.handle
            .await
            .map_err(|e| MirrorError::Worker(e.to_string()))?;
        Ok(self.failures.load(Ordering::Relaxed))
    }
}

/// Starts the worker on the current tokio runtime.
pub fn spawn(mirror: SpreadsheetMirror) -> (MirrorQueue, MirrorWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    let failures = Arc::new(AtomicU64::new(0));
    let handle = tokio::spawn(run_worker(mirror, rx, failures.clone()));
    (
        MirrorQueue {
            tx,
            failures: failures.clone(),
        },
        MirrorWorker { handle, failures },
    )
}

async fn run_worker(
    mirror: SpreadsheetMirror,
    mut rx: mpsc::UnboundedReceiver<LedgerEntryCommand>,
    failures: Arc<AtomicU64>,
) {
    tracing::info!(path = %mirror.path().display(), "Spreadsheet mirror started");

    while let Some(entry) = rx.recv().await {
        let job_mirror = mirror.clone();
        let date = entry.date.clone();
        let result = tokio::task::spawn_blocking(move || job_mirror.append(&entry))
            .await
            .map_err(|e| MirrorError::Worker(e.to_string()))
            .and_then(|r| r);

        match result {
            Ok(()) => {
                metrics::increment_counter!("pharmledger_mirror_appends_total");
                tracing::debug!(%date, "Entry mirrored to spreadsheet");
            }
            Err(e) => {
                failures.fetch_add(1, Ordering::Relaxed);
                metrics::increment_counter!("pharmledger_mirror_failures_total");
                tracing::warn!(%date, error = %e, "Failed to mirror entry to spreadsheet");
            }
        }
    }

    tracing::debug!("Spreadsheet mirror stopped");
}
