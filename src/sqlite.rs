use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::schema::{self, Schema, TableSchema};
use crate::value::{Row, Value};

/// Owns one SQLite connection and runs every statement through a scoped
/// transaction.
///
/// The store is OPEN from construction until [`TableStore::close`] or drop.
/// After that every operation fails with [`StoreError::StoreClosed`].
/// Operations take `&mut self`; share a store across threads only behind
/// your own lock.
pub struct TableStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl TableStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening table store");
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Some(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a store with no backing file, for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("opening in-memory table store");
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Some(conn),
            path: None,
        })
    }

    /// Open the configured file, apply the busy timeout, and create every
    /// table in the configured schema.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let mut store = Self::open(&config.path)?;
        if let Some(ms) = config.busy_timeout_ms {
            store
                .connection_mut()?
                .busy_timeout(Duration::from_millis(ms))?;
        }
        store.initialize_schema(&config.schema)?;
        Ok(store)
    }

    fn initialize_schema(&mut self, schema: &Schema) -> StoreResult<()> {
        for table in &schema.tables {
            self.create_table_def(table)?;
        }
        Ok(())
    }

    /// Create `name` with the given `(column, clause)` pairs, in order.
    ///
    /// Does nothing if the table already exists; the existing columns win.
    pub fn create_table(&mut self, name: &str, columns: &[(&str, &str)]) -> StoreResult<()> {
        let table = columns
            .iter()
            .fold(TableSchema::new(name), |table, (col, clause)| {
                table.with_column(*col, *clause)
            });
        self.create_table_def(&table)
    }

    pub fn create_table_def(&mut self, table: &TableSchema) -> StoreResult<()> {
        let sql = schema::create_table_sql(table)?;
        self.execute(&sql, &[]).map_err(|e| match e {
            StoreError::Engine(err) => StoreError::from_ddl(err),
            other => other,
        })?;
        debug!(table = %table.name, columns = table.columns.len(), "table ensured");
        Ok(())
    }

    /// Insert one row. Values are bound positionally in the row's column
    /// order, never spliced into the statement.
    pub fn add(&mut self, table_name: &str, data: &Row) -> StoreResult<()> {
        let sql = schema::insert_sql(table_name, data)?;
        let values: Vec<&Value> = data.values().collect();
        self.execute(&sql, &values)?;
        debug!(table = table_name, columns = data.len(), "row added");
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> StoreResult<()> {
        let sql = schema::drop_table_sql(name)?;
        self.execute(&sql, &[])?;
        debug!(table = name, "table dropped");
        Ok(())
    }

    /// Run one statement with positional `values` inside a transaction.
    ///
    /// Commits on success. On failure the transaction is dropped, which
    /// rolls it back, so a failed statement leaves nothing behind. Returns
    /// the number of rows changed.
    ///
    /// The statement always runs inside `BEGIN`, so statements SQLite
    /// refuses within a transaction (`VACUUM`, `PRAGMA journal_mode`) fail
    /// here. Statements that return rows fail too; use
    /// [`TableStore::query`] for those.
    pub fn execute(&mut self, statement: &str, values: &[&Value]) -> StoreResult<usize> {
        debug!(statement, params = values.len(), "executing statement");
        let conn = self.connection_mut()?;
        let tx = conn.transaction()?;
        let changed = tx
            .execute(statement, params_from_iter(values.iter()))
            .map_err(StoreError::from_write)?;
        tx.commit()?;
        Ok(changed)
    }

    /// Run a query inside a transaction and collect every result row.
    pub fn query(&mut self, statement: &str, values: &[&Value]) -> StoreResult<Vec<Row>> {
        debug!(statement, params = values.len(), "running query");
        let conn = self.connection_mut()?;
        let tx = conn.transaction()?;
        let rows = {
            let mut stmt = tx.prepare(statement)?;
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mapped = stmt.query_map(params_from_iter(values.iter()), |row| {
                let mut out = Row::new();
                for (idx, name) in names.iter().enumerate() {
                    out.set(name, row.get::<_, Value>(idx)?);
                }
                Ok(out)
            })?;
            mapped.collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok(rows)
    }

    pub fn table_exists(&mut self, name: &str) -> StoreResult<bool> {
        let name = Value::from(name);
        let rows = self.query(
            "SELECT count(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?1",
            &[&name],
        )?;
        let count = rows
            .first()
            .and_then(|row| row.get("n"))
            .and_then(Value::as_integer)
            .unwrap_or(0);
        Ok(count > 0)
    }

    /// Rowid of the most recent successful insert on this connection.
    pub fn last_insert_rowid(&self) -> StoreResult<i64> {
        Ok(self.connection()?.last_insert_rowid())
    }

    /// The database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Release the connection. Later calls are no-ops.
    ///
    /// If SQLite refuses to close, the connection is kept and the store
    /// stays open so the call can be retried.
    pub fn close(&mut self) -> StoreResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.close() {
            Ok(()) => {
                info!(path = ?self.path, "table store closed");
                Ok(())
            }
            Err((conn, err)) => {
                self.conn = Some(conn);
                Err(StoreError::Engine(err))
            }
        }
    }

    fn connection(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::StoreClosed)
    }

    fn connection_mut(&mut self) -> StoreResult<&mut Connection> {
        self.conn.as_mut().ok_or(StoreError::StoreClosed)
    }
}

impl Drop for TableStore {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(path = ?self.path, error = %err, "failed to close table store");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKMARK_COLUMNS: &[(&str, &str)] = &[
        ("id", "integer primary key autoincrement"),
        ("title", "text not null"),
        ("url", "text not null"),
        ("notes", "text"),
        ("date_added", "text not null"),
    ];

    fn bookmark(title: &str) -> Row {
        Row::new()
            .with_value("title", title)
            .with_value("url", "http://example.com")
            .with_value("notes", "test notes")
            .with_value("date_added", "2024-01-01T00:00:00")
    }

    #[test]
    fn create_add_and_query_in_memory() {
        let mut store = TableStore::open_in_memory().unwrap();
        assert!(store.path().is_none());
        store.create_table("bookmarks", BOOKMARK_COLUMNS).unwrap();
        assert!(store.table_exists("bookmarks").unwrap());

        store.add("bookmarks", &bookmark("test_title")).unwrap();
        assert_eq!(store.last_insert_rowid().unwrap(), 1);

        let title = Value::from("test_title");
        let rows = store
            .query("SELECT * FROM bookmarks WHERE title = ?1", &[&title])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
        assert_eq!(rows[0].get("notes").and_then(Value::as_text), Some("test notes"));
    }

    #[test]
    fn null_values_round_trip() {
        let mut store = TableStore::open_in_memory().unwrap();
        store.create_table("bookmarks", BOOKMARK_COLUMNS).unwrap();
        let row = bookmark("no notes").with_value("notes", None::<String>);
        store.add("bookmarks", &row).unwrap();

        let rows = store.query("SELECT notes FROM bookmarks", &[]).unwrap();
        assert!(rows[0].get("notes").unwrap().is_null());
    }

    #[test]
    fn missing_not_null_column_is_a_constraint_violation() {
        let mut store = TableStore::open_in_memory().unwrap();
        store.create_table("bookmarks", BOOKMARK_COLUMNS).unwrap();
        let row = Row::new().with_value("url", "http://example.com");
        let err = store.add("bookmarks", &row).unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "{err}");

        let rows = store.query("SELECT count(*) AS n FROM bookmarks", &[]).unwrap();
        assert_eq!(rows[0].get("n"), Some(&Value::Integer(0)));
    }

    #[test]
    fn malformed_clause_is_a_schema_error() {
        let mut store = TableStore::open_in_memory().unwrap();
        let err = store
            .create_table("broken", &[("title", "text not not null")])
            .unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)), "{err}");
        assert!(!store.table_exists("broken").unwrap());
    }

    #[test]
    fn empty_row_inserts_defaults() {
        let mut store = TableStore::open_in_memory().unwrap();
        store
            .create_table("counters", &[("id", "integer primary key"), ("hits", "integer default 0")])
            .unwrap();
        store.add("counters", &Row::new()).unwrap();
        let rows = store.query("SELECT hits FROM counters", &[]).unwrap();
        assert_eq!(rows[0].get("hits"), Some(&Value::Integer(0)));
    }

    #[test]
    fn execute_reports_changed_rows() {
        let mut store = TableStore::open_in_memory().unwrap();
        store.create_table("bookmarks", BOOKMARK_COLUMNS).unwrap();
        store.add("bookmarks", &bookmark("a")).unwrap();
        store.add("bookmarks", &bookmark("b")).unwrap();

        let notes = Value::from("edited");
        let changed = store
            .execute("UPDATE bookmarks SET notes = ?1", &[&notes])
            .unwrap();
        assert_eq!(changed, 2);
    }

    #[test]
    fn execute_refuses_statements_that_need_no_transaction() {
        let mut store = TableStore::open_in_memory().unwrap();
        store.create_table("bookmarks", BOOKMARK_COLUMNS).unwrap();
        assert!(matches!(store.execute("VACUUM", &[]), Err(StoreError::Engine(_))));
        assert!(matches!(
            store.execute("SELECT * FROM bookmarks", &[]),
            Err(StoreError::Engine(_))
        ));
        assert!(!store.is_closed());
        store.add("bookmarks", &bookmark("still works")).unwrap();
    }

    #[test]
    fn close_is_idempotent_and_terminal() {
        let mut store = TableStore::open_in_memory().unwrap();
        store.close().unwrap();
        store.close().unwrap();
        assert!(store.is_closed());

        assert!(matches!(
            store.create_table("bookmarks", BOOKMARK_COLUMNS),
            Err(StoreError::StoreClosed)
        ));
        assert!(matches!(
            store.add("bookmarks", &bookmark("x")),
            Err(StoreError::StoreClosed)
        ));
        assert!(matches!(store.drop_table("bookmarks"), Err(StoreError::StoreClosed)));
        assert!(matches!(store.query("SELECT 1", &[]), Err(StoreError::StoreClosed)));
        assert!(matches!(store.last_insert_rowid(), Err(StoreError::StoreClosed)));
    }
}
