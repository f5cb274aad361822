//! Domain layer - Student records entities and value objects.
//!
//! This crate contains pure domain types with no infrastructure dependencies.
//! Every entity is stored remotely; the types here describe the rows the
//! records service reads and the forms it writes.

pub mod archive;
pub mod constants;
pub mod grade;
pub mod login_record;
pub mod student;
pub mod user;

use uuid::Uuid;

pub use archive::{Archive, ArchiveForm, ArchivePatch, ArchiveType};
pub use constants::*;
pub use grade::{ExamType, Grade, GradeForm, GradePatch};
pub use login_record::{LoginRecord, LoginStatus, NewLoginRecord};
pub use student::{Gender, Student, StudentForm, StudentPatch, StudentStatus, StudentSummary};
pub use user::UserRole;

/// A stored row addressable by its primary key.
pub trait Record {
    fn id(&self) -> Uuid;
}
