use std::sync::{Mutex, MutexGuard};

use pharmledger_core::{
    EntryId, LedgerEntry, LedgerEntryCommand, LedgerStore, SetupOutcome, StorageError,
    ADMIN_PASSWORD_KEY,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTRY_COLUMNS: &str = "id, date, total_sale, cash_sale, card_sale, talabat_sale, \
    insurance_sale, credit_sale, med_purchase, other_exp, collection, curr_reading, \
    prev_reading, opening_petty, closing_petty, discrepancy";

const INSERT_ENTRY: &str = "INSERT INTO transactions
    (date, total_sale, cash_sale, card_sale, talabat_sale, insurance_sale, credit_sale,
     med_purchase, other_exp, collection, curr_reading, prev_reading, opening_petty,
     closing_petty, discrepancy)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)";

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(sql_err)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(sql_err)?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize()?;
        tracing::debug!(path, "SQLite ledger store opened");
        Ok(storage)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn sql_err(e: rusqlite::Error) -> StorageError {
    StorageError::Other(e.to_string())
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: row.get("id")?,
        values: LedgerEntryCommand {
            date: row.get("date")?,
            total_sale: row.get("total_sale")?,
            cash_sale: row.get("cash_sale")?,
            card_sale: row.get("card_sale")?,
            talabat_sale: row.get("talabat_sale")?,
            insurance_sale: row.get("insurance_sale")?,
            credit_sale: row.get("credit_sale")?,
            med_purchase: row.get("med_purchase")?,
            other_exp: row.get("other_exp")?,
            collection: row.get("collection")?,
            curr_reading: row.get("curr_reading")?,
            prev_reading: row.get("prev_reading")?,
            opening_petty: row.get("opening_petty")?,
            closing_petty: row.get("closing_petty")?,
            discrepancy: row.get("discrepancy")?,
        },
    })
}

fn insert_entry(conn: &Connection, c: &LedgerEntryCommand) -> Result<EntryId, StorageError> {
    conn.execute(
        INSERT_ENTRY,
        params![
            c.date,
            c.total_sale,
            c.cash_sale,
            c.card_sale,
            c.talabat_sale,
            c.insurance_sale,
            c.credit_sale,
            c.med_purchase,
            c.other_exp,
            c.collection,
            c.curr_reading,
            c.prev_reading,
            c.opening_petty,
            c.closing_petty,
            c.discrepancy,
        ],
    )
    .map_err(sql_err)?;
    Ok(conn.last_insert_rowid())
}

fn query_entries(conn: &Connection, sql: &str, limit: Option<usize>) -> Result<Vec<LedgerEntry>, StorageError> {
    let mut stmt = conn.prepare(sql).map_err(sql_err)?;
    let rows = match limit {
        Some(limit) => {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            stmt.query_map(params![limit], row_to_entry)
                .map_err(sql_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
        }
        None => stmt
            .query_map([], row_to_entry)
            .map_err(sql_err)?
            .collect::<rusqlite::Result<Vec<_>>>(),
    };
    rows.map_err(sql_err)
}

fn find_id_by_date(conn: &Connection, date: &str) -> Result<Option<EntryId>, StorageError> {
    conn.query_row(
        "SELECT id FROM transactions WHERE date = ?1 ORDER BY id LIMIT 1",
        params![date],
        |r| r.get(0),
    )
    .optional()
    .map_err(sql_err)
}

fn upsert_setting(conn: &Connection, key: &str, value: &str) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(sql_err)?;
    Ok(())
}

impl LedgerStore for SqliteStorage {
    fn initialize(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                total_sale REAL DEFAULT 0,
                cash_sale REAL DEFAULT 0,
                card_sale REAL DEFAULT 0,
                talabat_sale REAL DEFAULT 0,
                insurance_sale REAL DEFAULT 0,
                credit_sale REAL DEFAULT 0,
                med_purchase REAL DEFAULT 0,
                other_exp REAL DEFAULT 0,
                collection REAL DEFAULT 0,
                curr_reading REAL DEFAULT 0,
                prev_reading REAL DEFAULT 0,
                opening_petty REAL DEFAULT 0,
                closing_petty REAL DEFAULT 0,
                discrepancy REAL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date
                ON transactions(date);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT
            );
            ",
        )
        .map_err(sql_err)?;
        Ok(())
    }

    fn create_entry(&self, command: &LedgerEntryCommand) -> Result<EntryId, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sql_err)?;
        let id = insert_entry(&tx, command)?;
        tx.commit().map_err(sql_err)?;
        tracing::debug!(id, date = %command.date, "Entry inserted");
        Ok(id)
    }

    fn update_entry(&self, id: EntryId, c: &LedgerEntryCommand) -> Result<usize, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sql_err)?;
        let affected = tx
            .execute(
                "UPDATE transactions SET
                    date = ?1, total_sale = ?2, cash_sale = ?3, card_sale = ?4,
                    talabat_sale = ?5, insurance_sale = ?6, credit_sale = ?7,
                    med_purchase = ?8, other_exp = ?9, collection = ?10,
                    curr_reading = ?11, prev_reading = ?12, opening_petty = ?13,
                    closing_petty = ?14, discrepancy = ?15
                WHERE id = ?16",
                params![
                    c.date,
                    c.total_sale,
                    c.cash_sale,
                    c.card_sale,
                    c.talabat_sale,
                    c.insurance_sale,
                    c.credit_sale,
                    c.med_purchase,
                    c.other_exp,
                    c.collection,
                    c.curr_reading,
                    c.prev_reading,
                    c.opening_petty,
                    c.closing_petty,
                    c.discrepancy,
                    id,
                ],
            )
            .map_err(sql_err)?;
        tx.commit().map_err(sql_err)?;
        tracing::debug!(id, affected, "Entry updated");
        Ok(affected)
    }

    fn delete_entry(&self, id: EntryId) -> Result<usize, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sql_err)?;
        let affected = tx
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])
            .map_err(sql_err)?;
        tx.commit().map_err(sql_err)?;
        tracing::debug!(id, affected, "Entry deleted");
        Ok(affected)
    }

    fn set_opening_petty(&self, id: EntryId, opening_petty: f64) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE transactions SET opening_petty = ?1 WHERE id = ?2",
            params![opening_petty, id],
        )
        .map_err(sql_err)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<LedgerEntry>, StorageError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM transactions ORDER BY date DESC, id DESC LIMIT ?1");
        query_entries(&conn, &sql, Some(limit))
    }

    fn list_all(&self) -> Result<Vec<LedgerEntry>, StorageError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM transactions ORDER BY id");
        query_entries(&conn, &sql, None)
    }

    fn latest_entry(&self) -> Result<Option<LedgerEntry>, StorageError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM transactions ORDER BY id DESC LIMIT 1");
        conn.query_row(&sql, [], row_to_entry)
            .optional()
            .map_err(sql_err)
    }

    fn find_by_date(&self, date: &str) -> Result<Option<EntryId>, StorageError> {
        let conn = self.lock()?;
        find_id_by_date(&conn, date)
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |r| r.get(0),
        )
        .optional()
        .map_err(sql_err)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        upsert_setting(&conn, key, value)
    }

    fn setup(&self, password: &str, opening_petty: f64, today: &str) -> Result<SetupOutcome, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sql_err)?;
        upsert_setting(&tx, ADMIN_PASSWORD_KEY, password)?;

        let outcome = match find_id_by_date(&tx, today)? {
            Some(id) => {
                tx.execute(
                    "UPDATE transactions SET opening_petty = ?1 WHERE id = ?2",
                    params![opening_petty, id],
                )
                .map_err(sql_err)?;
                SetupOutcome::Updated(id)
            }
            None => {
                let id = insert_entry(&tx, &LedgerEntryCommand::opening(today, opening_petty))?;
                SetupOutcome::Created(id)
            }
        };

        tx.commit().map_err(sql_err)?;
        tracing::info!(?outcome, today, "Setup completed");
        Ok(outcome)
    }
}
