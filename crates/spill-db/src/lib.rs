pub mod ledgers;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod secrets;

use anyhow::Result;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

const READER_POOL_SIZE: usize = 4;

/// SQLite store with one writer connection and a small pool of read-only
/// connections. Every write goes through the writer, so multi-row writes
/// serialize on it and run inside a transaction.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(std::time::Duration::from_secs(5))?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Private in-memory database; reads share the writer connection.
    pub fn open_in_memory() -> Result<Self> {
        let writer = Connection::open_in_memory()?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        if self.readers.is_empty() {
            return self.with_conn_mut(|conn| f(conn));
        }
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| anyhow::anyhow!("Reader lock poisoned: {}", e))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Writer lock poisoned: {}", e))?;
        f(&mut conn)
    }
}
