//! Repositories: one generic paginated repository configured per entity.

mod aggregate;
pub mod archives;
mod base;
pub mod grades;
pub mod login_records;
mod state;
pub mod students;

pub use aggregate::{group_average, AggregateStat};
pub use archives::{ArchiveQuery, ArchiveRepository};
pub use base::{EntityConfig, EntityQuery, Repository};
pub use grades::{GradeQuery, GradeRepository, SubjectStat};
pub use login_records::{LoginRecordQuery, LoginRecordRepository};
pub use state::{CollectionState, InFlight};
pub use students::{StudentQuery, StudentRepository};

use crate::store::InMemoryStore;

/// An in-memory store with every records table created.
pub fn memory_store() -> InMemoryStore {
    InMemoryStore::with_tables([
        students::table(),
        grades::table(),
        archives::table(),
        login_records::table(),
    ])
}
