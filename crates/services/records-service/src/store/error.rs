//! Store failures, kept distinct from "no rows".

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use common::AppError;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The store rejected the row shape (NOT NULL, UNIQUE, foreign key, CHECK)
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The query could not be expressed or executed (unknown relation, bad identifier, bad row)
    #[error("invalid query: {0}")]
    Query(String),

    #[error("database error: {0}")]
    Database(DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn constraint(msg: impl Into<String>) -> Self {
        StoreError::Constraint(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        StoreError::Query(msg.into())
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg))
            | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => StoreError::Constraint(msg),
            _ => {
                let msg = err.to_string();
                if msg.contains("violates not-null constraint") || msg.contains("violates check constraint") {
                    StoreError::Constraint(msg)
                } else {
                    StoreError::Database(err)
                }
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Constraint(msg) => AppError::Validation(msg),
            other => AppError::Store(other.to_string()),
        }
    }
}
