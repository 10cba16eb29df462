//! SQLite storage implementation for quotecache.
//!
//! This crate is the only place Diesel exists in the workspace. It provides
//! connection pooling, embedded migrations, the single-writer actor, and the
//! [`QuoteRepository`] implementing `quotecache_core::quotes::QuoteStore`.
//!
//! ```text
//! core (engine, traits)
//!         │
//!         ▼
//! storage-sqlite (this crate)
//!         │
//!         ▼
//!     SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod quotes;
pub mod schema;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};
pub use errors::{IntoCore, StorageError};
pub use quotes::QuoteRepository;
