//! Core domain logic for the class journal.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::id::IdGenerator;
pub use model::lesson::Lesson;
pub use model::mark::Mark;
pub use model::page::LessonPage;
pub use repo::journal_repo::{JournalRepository, RepoError, RepoResult};
pub use repo::memory::InMemoryJournalRepository;
pub use repo::sqlite::SqliteJournalRepository;
pub use service::journal_service::{JournalError, JournalService, LessonPatch, LessonQuery};
pub use service::notification::{LogNotificationSink, NotificationSink};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
