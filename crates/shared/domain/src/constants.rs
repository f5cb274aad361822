//! Domain-level constants.
//!
//! Entity names, column names and role values shared by every layer.

// =============================================================================
// User Roles
// =============================================================================

/// Administrator role, allowed to delete records
pub const ROLE_ADMIN: &str = "admin";

/// Teaching staff role
pub const ROLE_TEACHER: &str = "teacher";

/// Default role for any authenticated user without a known role
pub const ROLE_STAFF: &str = "staff";

// =============================================================================
// Entities
// =============================================================================

pub const ENTITY_STUDENTS: &str = "students";
pub const ENTITY_GRADES: &str = "grades";
pub const ENTITY_ARCHIVES: &str = "archives";
pub const ENTITY_LOGIN_RECORDS: &str = "login_records";

// =============================================================================
// Common columns
// =============================================================================

/// Primary key column
pub const COLUMN_ID: &str = "id";

/// Server-assigned creation timestamp
pub const COLUMN_CREATED_AT: &str = "created_at";

/// Modification timestamp, refreshed on every update
pub const COLUMN_UPDATED_AT: &str = "updated_at";
