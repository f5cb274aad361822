//! Every entity repository wired to one store.

use std::sync::Arc;

use common::AppResult;

use crate::repository::{
    archives, grades, login_records, students, ArchiveRepository, GradeRepository,
    LoginRecordRepository, Repository, StudentRepository,
};
use crate::store::RecordStore;

/// Repositories sharing one injected store client.
pub struct Records {
    pub students: StudentRepository,
    pub grades: GradeRepository,
    pub archives: ArchiveRepository,
    pub login_records: LoginRecordRepository,
    store: Arc<dyn RecordStore>,
}

impl Records {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            students: Repository::new(store.clone(), students::config()),
            grades: Repository::new(store.clone(), grades::config()),
            archives: Repository::new(store.clone(), archives::config()),
            login_records: Repository::new(store.clone(), login_records::config()),
            store,
        }
    }

    /// Check that the store answers.
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await?;
        Ok(())
    }
}
