//! Database layer for the Mingle platform.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and the schema every other crate reads through.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: a single-server deployment needs no external
//!   database process. WAL mode allows concurrent readers with a single
//!   writer, which matches the read-heavy access pattern of event listings.
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, ensuring migrations ship with the server and cannot
//!   drift from the code that depends on them.

mod migrations;
mod pool;

pub use migrations::run_migrations;
pub use pool::{create_pool, DbPool, DbRuntimeSettings};
