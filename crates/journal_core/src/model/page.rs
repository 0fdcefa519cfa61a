//! Page view produced by the lesson filter/paginate engine.

use serde::Serialize;

use crate::model::lesson::Lesson;

/// One page of filtered lessons.
///
/// Derived entirely from a filter-and-slice computation; never persisted.
/// `page` and `size` are the normalized values actually applied, which may
/// differ from what the caller supplied (see
/// [`crate::service::journal_service::JournalService::find_lessons`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonPage {
    pub content: Vec<Lesson>,
    pub page: u32,
    pub size: u32,
    /// Count after filtering, before pagination.
    pub total_elements: u64,
    /// Zero when no lesson matched the filter.
    pub total_pages: u32,
}
