//! Repository layer abstractions and storage implementations.
//!
//! # Responsibility
//! - Define the journal data-access contract consumed by the service layer.
//! - Isolate storage details (lock-guarded map, SQLite) behind one trait.
//!
//! # Invariants
//! - The service layer depends only on [`journal_repo::JournalRepository`];
//!   the in-memory and SQLite stores are interchangeable at startup.
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   transport errors.

pub mod journal_repo;
pub mod memory;
pub mod sqlite;
