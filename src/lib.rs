//! SQLite-backed table store for bookmark data.
//!
//! # Intention
//!
//! - Own one SQLite connection and expose create/insert/drop over it.
//! - Route every statement through one scoped transaction, so a failed
//!   statement never leaves a partial write.
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - No migrations, pooling, or multi-statement transactions.
//!
//! ```no_run
//! use bookmark_store::{Row, TableStore};
//!
//! # fn main() -> Result<(), bookmark_store::StoreError> {
//! let mut store = TableStore::open("bookmarks.db")?;
//! store.create_table(
//!     "bookmarks",
//!     &[("id", "integer primary key autoincrement"), ("title", "text not null")],
//! )?;
//! store.add("bookmarks", &Row::new().with_value("title", "example"))?;
//! store.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use schema::{ColumnDefinition, Schema, TableSchema};
pub use sqlite::TableStore;
pub use value::{Row, Value};
