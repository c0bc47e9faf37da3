use std::sync::mpsc::Receiver;

use log::warn;
use rusqlite::Connection;

use crate::logs::log_entry::LogEntry;
use crate::LogLevel;

pub(crate) struct Logger {
    db_path: String,
    db: Option<Connection>,
    batch: Vec<LogEntry>,
    batch_size: usize,
    console_entries: u128,
}

// should be in the order of thousands for busy sites
const BATCH_SIZE: usize = 25;

impl Logger {
    pub(crate) fn new(db_path: &str) -> Logger {
        Logger::with_batch_size(db_path, BATCH_SIZE)
    }

    pub(crate) fn with_batch_size(db_path: &str, batch_size: usize) -> Logger {
        Logger {
            db_path: db_path.to_owned(),
            db: None,
            batch: Vec::new(),
            batch_size,
            console_entries: 0,
        }
    }

    // the database is only opened once something has to be stored
    fn db(&mut self) -> rusqlite::Result<&mut Connection> {
        let db = match self.db.take() {
            Some(db) => db,
            None => {
                let db = Connection::open(&self.db_path)?;
                db.execute(
                    "CREATE TABLE IF NOT EXISTS requests (
                id        INTEGER PRIMARY KEY,
                timestamp TEXT NOT NULL,
                action    TEXT NOT NULL,
                source    TEXT,
                location  TEXT NOT NULL,
                path      TEXT NOT NULL
            )",
                    (),
                )?;
                db
            }
        };
        Ok(self.db.insert(db))
    }

    fn store_entry(&mut self, log_entry: LogEntry) {
        self.batch.push(log_entry);
        if self.batch.len() >= self.batch_size {
            self.flush();
        }
    }

    pub(crate) fn log_entry(&mut self, log_entry: LogEntry) {
        if log_entry.log_level.to_console() {
            println!("{log_entry}");
            self.console_entries = self.console_entries.wrapping_add(1);
        }
        if log_entry.log_level.to_db() {
            self.store_entry(log_entry);
        }
    }

    /// Writes the pending batch to the database in a single transaction.
    pub(crate) fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.batch);
        if let Err(err) = self.store_batch(&batch) {
            warn!(
                "dropping {} access gate log entries: {err}",
                batch.len()
            );
        }
    }

    fn store_batch(&mut self, batch: &[LogEntry]) -> rusqlite::Result<()> {
        let transaction = self.db()?.transaction()?;
        for log_entry in batch {
            transaction.execute(
                "INSERT INTO requests (timestamp, action, source, location, path)
                    VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &log_entry.timestamp,
                    &log_entry.action,
                    &log_entry.source,
                    &log_entry.location,
                    &log_entry.path,
                ),
            )?;
        }
        transaction.commit()
    }
}

/// Receives decisions until every sender is gone, then flushes what is left.
pub(crate) fn run(rx: &Receiver<LogEntry>, db_path: &str) {
    let mut logger = Logger::new(db_path);
    while let Ok(log_entry) = rx.recv() {
        if log_entry.log_level != LogLevel::Off {
            logger.log_entry(log_entry);
        }
    }
    logger.flush();
}
