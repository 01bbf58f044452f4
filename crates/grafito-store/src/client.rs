//! SQLite connection management and transaction scoping.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, ErrorCode, OptionalExtension, Params, Row};

use grafito_core::{GraphError, Result, StoreConfig};

const SCHEMA: &str = include_str!("schema.sql");

/// Map a SQLite failure onto the store's error kinds.
///
/// Constraint failures mean the engine rejected a row the library expected
/// to be valid; anything else leaves the connection in an unknown state.
pub(crate) fn sql_error(e: rusqlite::Error) -> GraphError {
    match &e {
        rusqlite::Error::SqliteFailure(_, _)
            if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) =>
        {
            GraphError::IntegrityViolation(e.to_string())
        }
        rusqlite::Error::InvalidColumnType(..) | rusqlite::Error::FromSqlConversionFailure(..) => {
            GraphError::IntegrityViolation(format!("Unexpected row shape: {e}"))
        }
        _ => GraphError::StoreUnavailable(e.to_string()),
    }
}

/// The single open connection to a graph store file.
///
/// Not `Sync`: the transaction depth is tracked per handle, so callers that
/// share one store across threads must wrap it in a mutex.
pub struct StoreClient {
    conn: Connection,
    path: Option<PathBuf>,
    depth: Cell<u32>,
}

impl StoreClient {
    /// Open (or create) the store file described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(&config.path).map_err(|e| {
            GraphError::StoreUnavailable(format!("Cannot open {}: {e}", config.path.display()))
        })?;

        let client = Self {
            conn,
            path: Some(config.path.clone()),
            depth: Cell::new(0),
        };
        let journal_mode = client.initialize(config, true)?;

        tracing::info!(
            path = %config.path.display(),
            journal_mode = %journal_mode,
            "Opened graph store"
        );
        Ok(client)
    }

    /// Open a private in-memory store. Nothing is persisted.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            GraphError::StoreUnavailable(format!("Cannot open in-memory store: {e}"))
        })?;

        let client = Self {
            conn,
            path: None,
            depth: Cell::new(0),
        };
        client.initialize(&StoreConfig::default(), false)?;

        tracing::debug!("Opened in-memory graph store");
        Ok(client)
    }

    /// Apply connection settings and the schema. Returns the journal mode.
    fn initialize(&self, config: &StoreConfig, wal: bool) -> Result<String> {
        self.conn
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(sql_error)?;

        let journal_mode: String = if wal {
            self.conn
                .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
                .map_err(sql_error)?
        } else {
            self.conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .map_err(sql_error)?
        };
        if wal && !journal_mode.eq_ignore_ascii_case("wal") {
            return Err(GraphError::StoreUnavailable(format!(
                "Write-ahead logging unavailable (journal mode is {journal_mode})"
            )));
        }

        self.conn
            .execute_batch(&format!(
                "PRAGMA synchronous = {}; PRAGMA foreign_keys = ON;",
                config.synchronous.as_pragma()
            ))
            .map_err(sql_error)?;

        // The pragma is a silent no-op on builds without FK support.
        let foreign_keys: i64 = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .map_err(sql_error)?;
        if foreign_keys != 1 {
            return Err(GraphError::StoreUnavailable(
                "Foreign key enforcement could not be enabled".to_string(),
            ));
        }

        self.conn.execute_batch(SCHEMA).map_err(sql_error)?;
        Ok(journal_mode)
    }

    /// Path of the backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Execute a write statement and return the number of affected rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(sql).map_err(sql_error)?;
        stmt.execute(params).map_err(sql_error)
    }

    /// Execute a read statement and collect every mapped row.
    pub fn query<T, P, F>(&self, sql: &str, params: P, map_row: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare_cached(sql).map_err(sql_error)?;
        let rows = stmt.query_map(params, map_row).map_err(sql_error)?;
        rows.collect::<rusqlite::Result<Vec<T>>>()
            .map_err(sql_error)
    }

    /// Execute a read statement and return the first mapped row, if any.
    pub fn query_one<T, P, F>(&self, sql: &str, params: P, map_row: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare_cached(sql).map_err(sql_error)?;
        stmt.query_row(params, map_row)
            .optional()
            .map_err(sql_error)
    }

    /// Rowid allocated by the most recent successful insert.
    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Whether a transaction scope is currently open on this handle.
    pub fn in_transaction(&self) -> bool {
        self.depth.get() > 0
    }

    /// Run `f` inside a transaction scope.
    ///
    /// The outermost scope begins and commits a real transaction. Nested
    /// scopes join it through a savepoint: an error rolls back only the work
    /// of that scope, then propagates. Any error (or panic) rolls back before
    /// control returns to the caller.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.scope("BEGIN IMMEDIATE", f)
    }

    /// Run `f` inside a read-only transaction scope.
    ///
    /// The outermost read scope begins deferred, so it takes no write lock
    /// and never waits on another connection's writer. `f` must not write.
    pub fn read_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.scope("BEGIN DEFERRED", f)
    }

    fn scope<T, F>(&self, begin: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let depth = self.depth.get();
        if depth == 0 {
            self.conn.execute_batch(begin).map_err(sql_error)?;
            tracing::trace!(begin, "Transaction started");
        } else {
            self.conn
                .execute_batch(&format!("SAVEPOINT grafito_{depth}"))
                .map_err(sql_error)?;
        }

        let mut scope = Scope {
            client: self,
            depth,
            finished: false,
        };
        self.depth.set(depth + 1);

        match f(self) {
            Ok(value) => {
                scope.commit()?;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, depth, "Rolling back transaction scope");
                scope.rollback();
                Err(e)
            }
        }
    }

    /// Close the connection, surfacing any error from the engine.
    ///
    /// Dropping the client also closes it; this variant reports failures.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, e)| GraphError::StoreUnavailable(format!("Close failed: {e}")))?;

        match path {
            Some(p) => tracing::info!(path = %p.display(), "Closed graph store"),
            None => tracing::debug!("Closed in-memory graph store"),
        }
        Ok(())
    }
}

/// One open transaction or savepoint. Rolls back on drop unless finished.
struct Scope<'a> {
    client: &'a StoreClient,
    depth: u32,
    finished: bool,
}

impl Scope<'_> {
    fn commit(&mut self) -> Result<()> {
        let sql = if self.depth == 0 {
            "COMMIT".to_string()
        } else {
            format!("RELEASE grafito_{}", self.depth)
        };
        self.client.conn.execute_batch(&sql).map_err(sql_error)?;

        self.finished = true;
        self.client.depth.set(self.depth);
        if self.depth == 0 {
            tracing::trace!("Transaction committed");
        }
        Ok(())
    }

    fn rollback(&mut self) {
        let sql = if self.depth == 0 {
            "ROLLBACK".to_string()
        } else {
            format!(
                "ROLLBACK TO grafito_{0}; RELEASE grafito_{0}",
                self.depth
            )
        };
        if let Err(e) = self.client.conn.execute_batch(&sql) {
            tracing::error!(error = %e, depth = self.depth, "Rollback failed");
        }

        self.finished = true;
        self.client.depth.set(self.depth);
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.rollback();
        }
    }
}
