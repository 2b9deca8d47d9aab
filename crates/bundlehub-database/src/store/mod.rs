//! The bundle store.
//!
//! One [`Store`] over a shared connection pool. Read, create, update,
//! and delete operations live in sibling modules as separate `impl`
//! blocks over the same type, so callers see a single handle while each
//! concern stays focused.

mod create;
mod delete;
mod read;
mod update;

use sqlx::SqlitePool;

/// Session-scoped handle over the bundle metadata schema.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Create a new store over an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Return a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
