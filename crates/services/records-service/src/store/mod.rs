//! Remote data store abstraction.
//!
//! Repositories talk to the store only through [`RecordStore`], so the
//! PostgreSQL backend and the in-memory fake are interchangeable.

mod error;
mod memory;
mod postgres;
mod query;

use async_trait::async_trait;
use uuid::Uuid;

use common::RowRange;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryStore, TableSpec};
pub use postgres::PgStore;
pub use query::{contains_pattern, Condition, Direction, Filter, Join, Row, RowSet, SelectQuery, SortSpec};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Capabilities required from the remote store.
///
/// Every method is a single remote call. Failures are returned as
/// [`StoreError`]; an empty result is never an error at this level.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a read. With a range, returns that slice of the ordered rows and the
    /// exact total; without one, returns every matching row.
    async fn select(&self, query: &SelectQuery, range: Option<RowRange>) -> StoreResult<RowSet>;

    /// Insert one row and return it as stored, including generated columns.
    async fn insert(&self, entity: &str, row: Row) -> StoreResult<Row>;

    /// Apply a partial row to the record with this id. `None` when no row has the id.
    async fn update(&self, entity: &str, id: Uuid, patch: Row) -> StoreResult<Option<Row>>;

    /// Delete the record with this id, returning the number of rows removed.
    async fn delete(&self, entity: &str, id: Uuid) -> StoreResult<u64>;

    /// Check connectivity.
    async fn ping(&self) -> StoreResult<()>;
}
