//! Mark child record.
//!
//! # Invariants
//! - `present == false` implies `grade == None`; the rule is enforced by the
//!   owning `Lesson` on both add and update.
//! - `timestamp` is stamped by the owning operation, never client-supplied.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attendance/grade record owned by exactly one lesson.
///
/// A mark is created detached (`id == None`) and only becomes part of the
/// journal through [`crate::model::lesson::Lesson::add_mark`], which assigns
/// its lesson-scoped id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// Lesson-scoped id, `None` until attached to a lesson.
    pub id: Option<i64>,
    pub student_name: String,
    /// Optional grade; always `None` for an absent student.
    pub grade: Option<i32>,
    pub present: bool,
    /// Last-write instant in UTC.
    pub timestamp: NaiveDateTime,
}

impl Mark {
    /// Creates a detached mark draft.
    ///
    /// The grade-nulling rule and the authoritative timestamp are applied by
    /// the lesson when the draft is attached or applied as an update.
    pub fn new(student_name: impl Into<String>, grade: Option<i32>, present: bool) -> Self {
        Self {
            id: None,
            student_name: student_name.into(),
            grade,
            present,
            timestamp: Utc::now().naive_utc(),
        }
    }

    /// Creates a detached mark for a present student.
    pub fn graded(student_name: impl Into<String>, grade: i32) -> Self {
        Self::new(student_name, Some(grade), true)
    }

    /// Creates a detached mark recording an absence (no grade).
    pub fn absent(student_name: impl Into<String>) -> Self {
        Self::new(student_name, None, false)
    }
}
