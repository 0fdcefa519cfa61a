//! Domain model for the class journal.
//!
//! # Responsibility
//! - Define the `Lesson` aggregate and its owned `Mark` children.
//! - Keep id assignment and mark lifecycle rules inside the aggregate.
//!
//! # Invariants
//! - No `Mark` exists outside a `Lesson`'s mark collection once attached.
//! - Mark ids are unique within their lesson and never reused.

pub mod id;
pub mod lesson;
pub mod mark;
pub mod page;
