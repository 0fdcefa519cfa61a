//! Journal repository contract and shared error type.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::db::DbError;
use crate::model::lesson::Lesson;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for journal persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(i64),
    InvalidData(String),
    /// A lock guarding in-memory storage was poisoned by a panicked writer.
    LockPoisoned,
    /// The connection has no applied migrations (or partial ones).
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "lesson not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted journal data: {message}"),
            Self::LockPoisoned => write!(f, "journal storage lock poisoned"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keyed lesson storage consumed by the journal service.
///
/// `save` is an upsert: a lesson without an id gets one assigned, an existing
/// id overwrites the stored aggregate. No transactional guarantees exist
/// beyond single-operation atomicity; a service-level read-modify-write
/// sequence is not atomic across concurrent callers.
pub trait JournalRepository {
    /// All lessons, ordered by id ascending.
    fn find_all(&self) -> RepoResult<Vec<Lesson>>;
    /// One lesson by id; absence is a valid outcome.
    fn find_by_id(&self, id: i64) -> RepoResult<Option<Lesson>>;
    /// Upserts the aggregate (lesson plus its marks) and returns it with its
    /// id assigned.
    fn save(&self, lesson: Lesson) -> RepoResult<Lesson>;
    /// Removes the lesson and, by ownership, its marks; no-op when absent.
    fn delete_by_id(&self, id: i64) -> RepoResult<()>;
}
