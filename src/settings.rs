use std::collections::HashMap;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::admin::is_blank;
use crate::GateError;

/// Settings key of the enabled flag (`"1"` or empty).
pub const ENABLED_KEY: &str = "access-list-enabled";

/// Settings key of the access list lines.
pub const ACCESS_LIST_KEY: &str = "access-list";

/// Site-wide key-value storage backing the gate settings.
///
/// Scalar values and ordered lists live in separate namespaces.
pub trait SettingsStore {
    /// Reads a scalar value, `None` if it was never set.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::Storage`] if the underlying storage fails.
    fn get(&self, key: &str) -> Result<Option<String>, GateError>;

    /// Writes a scalar value.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::Storage`] if the underlying storage fails.
    fn set(&self, key: &str, value: &str) -> Result<(), GateError>;

    /// Reads an ordered list, empty if it was never set.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::Storage`] if the underlying storage fails.
    fn get_list(&self, key: &str) -> Result<Vec<String>, GateError>;

    /// Replaces an ordered list.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::Storage`] if the underlying storage fails.
    fn set_list(&self, key: &str, values: &[String]) -> Result<(), GateError>;
}

/// Reads whether the access list is enabled.
pub(crate) fn is_access_list_enabled<S: SettingsStore + ?Sized>(
    store: &S,
) -> Result<bool, GateError> {
    Ok(store
        .get(ENABLED_KEY)?
        .is_some_and(|value| !is_blank(&value)))
}

/// Settings kept in a SQLite database.
pub struct SqliteSettings {
    db: Mutex<Connection>,
}

impl SqliteSettings {
    /// Opens (or creates) the settings database at `path`.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::Storage`] if the database can't be opened or initialised.
    pub fn open(path: &str) -> Result<Self, GateError> {
        Self::init(Connection::open(path)?)
    }

    /// Opens a private in-memory settings database.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::Storage`] if the database can't be initialised.
    pub fn open_in_memory() -> Result<Self, GateError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self, GateError> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS site_options (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS site_option_lists (
                key      TEXT NOT NULL,
                position INTEGER NOT NULL,
                value    TEXT NOT NULL,
                PRIMARY KEY (key, position)
            );",
        )?;
        Ok(Self { db: Mutex::new(db) })
    }
}

impl SettingsStore for SqliteSettings {
    fn get(&self, key: &str) -> Result<Option<String>, GateError> {
        let db = self.db.lock();
        let value = db
            .query_row(
                "SELECT value FROM site_options WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), GateError> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO site_options (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_list(&self, key: &str) -> Result<Vec<String>, GateError> {
        let db = self.db.lock();
        let mut stmt = db.prepare(
            "SELECT value FROM site_option_lists WHERE key = ?1 ORDER BY position",
        )?;
        let values = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }

    fn set_list(&self, key: &str, values: &[String]) -> Result<(), GateError> {
        let mut db = self.db.lock();
        // the whole list is replaced in a single transaction
        let transaction = db.transaction()?;
        transaction.execute(
            "DELETE FROM site_option_lists WHERE key = ?1",
            params![key],
        )?;
        for (position, value) in (0_i64..).zip(values) {
            transaction.execute(
                "INSERT INTO site_option_lists (key, position, value) VALUES (?1, ?2, ?3)",
                params![key, position, value],
            )?;
        }
        transaction.commit()?;
        Ok(())
    }
}

/// Settings kept in memory, lost when dropped.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
    lists: Mutex<HashMap<String, Vec<String>>>,
}

impl MemorySettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<String>, GateError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), GateError> {
        self.values.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn get_list(&self, key: &str) -> Result<Vec<String>, GateError> {
        Ok(self.lists.lock().get(key).cloned().unwrap_or_default())
    }

    fn set_list(&self, key: &str, values: &[String]) -> Result<(), GateError> {
        self.lists.lock().insert(key.to_owned(), values.to_vec());
        Ok(())
    }
}
