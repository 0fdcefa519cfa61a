//! Journal use-case service: lesson CRUD, the filter/paginate engine,
//! merge-patch and mark operations routed through the lesson aggregate.
//!
//! # Responsibility
//! - Provide every journal entry point over one repository abstraction.
//! - Enforce validation and the uniform not-found policy for mutations.
//!
//! # Invariants
//! - Child marks are only ever mutated through the aggregate's own methods.
//! - `find_lessons` never errors on bad paging input; it clamps instead.
//! - Pure lookups return `Ok(None)` for absence; mutations against a missing
//!   lesson or mark surface `LessonNotFound`/`MarkNotFound`.

use std::error::Error;
use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use serde_json::{Map, Value};

use crate::model::lesson::Lesson;
use crate::model::mark::Mark;
use crate::model::page::LessonPage;
use crate::repo::journal_repo::{JournalRepository, RepoError};
use crate::service::notification::NotificationSink;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Service error for journal use-cases.
#[derive(Debug)]
pub enum JournalError {
    LessonNotFound(i64),
    MarkNotFound { lesson_id: i64, mark_id: i64 },
    Validation(String),
    Repo(RepoError),
}

impl Display for JournalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LessonNotFound(id) => write!(f, "lesson not found: {id}"),
            Self::MarkNotFound { lesson_id, mark_id } => {
                write!(f, "mark {mark_id} not found in lesson {lesson_id}")
            }
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JournalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for JournalError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::LessonNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Filter and paging options for [`JournalService::find_lessons`].
///
/// Every predicate is optional and the predicates are conjunctive: a lesson
/// matches when it satisfies all supplied ones. Negative `page` and
/// non-positive `size` are accepted and normalized, never rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonQuery {
    /// Case-insensitive substring match against the lesson subject.
    /// `None` or a blank string disables the predicate.
    pub subject: Option<String>,
    /// Inclusive lower date bound.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub date_to: Option<NaiveDate>,
    /// Zero-based page; negative values normalize to 0.
    pub page: i32,
    /// Page size; values <= 0 normalize to 10.
    pub size: i32,
}

/// Typed merge-patch for a lesson, parsed from an untyped JSON map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonPatch {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub date: Option<NaiveDate>,
}

impl LessonPatch {
    /// Parses the recognized keys (`subject`, `topic`, `date`) out of a
    /// JSON-merge-patch-like map.
    ///
    /// Unrecognized keys and values of the wrong type are silently skipped.
    /// The one hard failure is a string `date` that is not an ISO-8601
    /// calendar date: a caller who clearly tried to set the date gets a
    /// validation error rather than a silent no-op.
    pub fn from_json(updates: &Map<String, Value>) -> Result<Self, JournalError> {
        let mut patch = Self::default();

        if let Some(Value::String(subject)) = updates.get("subject") {
            patch.subject = Some(subject.clone());
        }
        if let Some(Value::String(topic)) = updates.get("topic") {
            patch.topic = Some(topic.clone());
        }
        if let Some(Value::String(date)) = updates.get("date") {
            let parsed = date.parse::<NaiveDate>().map_err(|_| {
                JournalError::Validation(format!(
                    "malformed date `{date}`, expected YYYY-MM-DD"
                ))
            })?;
            patch.date = Some(parsed);
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.topic.is_none() && self.date.is_none()
    }
}

/// Journal service facade over a repository implementation.
///
/// Stateless apart from the injected collaborators; every operation runs to
/// completion synchronously. A read-modify-write sequence (fetch aggregate,
/// mutate, save) is not atomic across concurrent callers.
pub struct JournalService<R: JournalRepository> {
    repo: R,
    sink: Option<Box<dyn NotificationSink>>,
}

impl<R: JournalRepository> JournalService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo, sink: None }
    }

    /// Attaches the outbound notification collaborator (setter injection).
    pub fn set_notification_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sink = Some(sink);
    }

    // ---- lessons ----

    pub fn get_all_lessons(&self) -> Result<Vec<Lesson>, JournalError> {
        Ok(self.repo.find_all()?)
    }

    /// One lesson by id; absence is a valid outcome, not an error.
    pub fn get_lesson_by_id(&self, id: i64) -> Result<Option<Lesson>, JournalError> {
        Ok(self.repo.find_by_id(id)?)
    }

    /// Creates a lesson dated today with an empty mark set.
    pub fn create_lesson(
        &self,
        subject: impl Into<String>,
        topic: impl Into<String>,
    ) -> Result<Lesson, JournalError> {
        let subject = subject.into();
        require_non_blank(&subject, "subject")?;

        let saved = self.repo.save(Lesson::new(subject, topic))?;
        info!(
            "event=lesson_created module=service status=ok lesson_id={}",
            saved.id.unwrap_or_default()
        );
        self.notify(&format!("created lesson for subject: {}", saved.subject));
        Ok(saved)
    }

    /// Replaces subject and topic of an existing lesson.
    pub fn update_lesson(
        &self,
        id: i64,
        subject: impl Into<String>,
        topic: impl Into<String>,
    ) -> Result<Lesson, JournalError> {
        let subject = subject.into();
        require_non_blank(&subject, "subject")?;

        let mut lesson = self.require_lesson(id)?;
        lesson.subject = subject;
        lesson.topic = topic.into();
        let saved = self.repo.save(lesson)?;
        info!("event=lesson_updated module=service status=ok lesson_id={id}");
        self.notify(&format!("updated lesson for subject: {}", saved.subject));
        Ok(saved)
    }

    /// Deletes a lesson; its marks go with it by ownership.
    pub fn delete_lesson(&self, id: i64) -> Result<(), JournalError> {
        self.require_lesson(id)?;
        self.repo.delete_by_id(id)?;
        info!("event=lesson_deleted module=service status=ok lesson_id={id}");
        self.notify(&format!("deleted lesson with id = {id}"));
        Ok(())
    }

    /// Filters and paginates lessons in memory.
    ///
    /// Always a full scan over the store. Applies the optional predicates
    /// conjunctively, counts `total_elements` before slicing, normalizes
    /// paging input (`size <= 0` becomes 10, `page < 0` becomes 0) and clamps
    /// the slice bounds, so an out-of-range page yields an empty page rather
    /// than an error.
    pub fn find_lessons(&self, query: &LessonQuery) -> Result<LessonPage, JournalError> {
        let mut filtered = self.repo.find_all()?;

        if let Some(subject) = query.subject.as_deref().filter(|s| !s.trim().is_empty()) {
            let needle = subject.to_lowercase();
            filtered.retain(|lesson| lesson.subject.to_lowercase().contains(&needle));
        }
        if let Some(from) = query.date_from {
            filtered.retain(|lesson| lesson.date >= from);
        }
        if let Some(to) = query.date_to {
            filtered.retain(|lesson| lesson.date <= to);
        }

        let total_elements = filtered.len() as u64;
        let size = if query.size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            query.size as u32
        };
        let page = query.page.max(0) as u32;

        let from_index = (u64::from(page) * u64::from(size)).min(total_elements) as usize;
        let to_index = (from_index as u64 + u64::from(size)).min(total_elements) as usize;
        let content = filtered[from_index..to_index].to_vec();

        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements.div_ceil(u64::from(size))) as u32
        };

        debug!(
            "event=find_lessons module=service status=ok total={total_elements} page={page} size={size}"
        );
        Ok(LessonPage {
            content,
            page,
            size,
            total_elements,
            total_pages,
        })
    }

    /// Applies a partial update parsed from an untyped JSON map.
    ///
    /// Unknown lesson ids fail with `LessonNotFound` before the map is
    /// inspected; see [`LessonPatch::from_json`] for the key policy. A
    /// well-typed but blank `subject` fails validation, the same rule
    /// create and update enforce.
    pub fn patch_lesson(
        &self,
        id: i64,
        updates: &Map<String, Value>,
    ) -> Result<Lesson, JournalError> {
        let mut lesson = self.require_lesson(id)?;
        let patch = LessonPatch::from_json(updates)?;

        if let Some(subject) = patch.subject {
            require_non_blank(&subject, "subject")?;
            lesson.subject = subject;
        }
        if let Some(topic) = patch.topic {
            lesson.topic = topic;
        }
        if let Some(date) = patch.date {
            lesson.date = date;
        }

        let saved = self.repo.save(lesson)?;
        info!("event=lesson_patched module=service status=ok lesson_id={id}");
        Ok(saved)
    }

    /// Case-insensitive topic substring search, newest lessons first.
    pub fn search_lessons_by_topic(&self, pattern: &str) -> Result<Vec<Lesson>, JournalError> {
        let needle = pattern.to_lowercase();
        let mut lessons = self.repo.find_all()?;
        lessons.retain(|lesson| lesson.topic.to_lowercase().contains(&needle));
        lessons.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(lessons)
    }

    // ---- marks ----

    /// Attaches a new mark to the lesson and returns it with its assigned id.
    pub fn add_mark(&self, lesson_id: i64, mark: Mark) -> Result<Mark, JournalError> {
        require_non_blank(&mark.student_name, "student_name")?;

        let mut lesson = self.require_lesson(lesson_id)?;
        let mark_id = lesson.add_mark(mark);
        let saved = self.repo.save(lesson)?;

        let stored = saved
            .find_mark(mark_id)
            .cloned()
            .ok_or(JournalError::MarkNotFound { lesson_id, mark_id })?;
        info!(
            "event=mark_added module=service status=ok lesson_id={lesson_id} mark_id={mark_id}"
        );
        self.notify(&format!("added mark for {}", stored.student_name));
        Ok(stored)
    }

    /// One mark by id; `Ok(None)` when the lesson or the mark is absent.
    pub fn find_mark(&self, lesson_id: i64, mark_id: i64) -> Result<Option<Mark>, JournalError> {
        let Some(lesson) = self.repo.find_by_id(lesson_id)? else {
            return Ok(None);
        };
        Ok(lesson.find_mark(mark_id).cloned())
    }

    /// Overwrites an existing mark through the aggregate, re-applying the
    /// presence rule. Unknown lesson or mark ids fail with not-found.
    pub fn update_mark(
        &self,
        lesson_id: i64,
        mark_id: i64,
        mut draft: Mark,
    ) -> Result<Mark, JournalError> {
        require_non_blank(&draft.student_name, "student_name")?;

        let mut lesson = self.require_lesson(lesson_id)?;
        if lesson.find_mark(mark_id).is_none() {
            return Err(JournalError::MarkNotFound { lesson_id, mark_id });
        }

        draft.id = Some(mark_id);
        lesson.update_mark(draft);
        let saved = self.repo.save(lesson)?;

        let stored = saved
            .find_mark(mark_id)
            .cloned()
            .ok_or(JournalError::MarkNotFound { lesson_id, mark_id })?;
        info!(
            "event=mark_updated module=service status=ok lesson_id={lesson_id} mark_id={mark_id}"
        );
        self.notify(&format!("updated mark for {}", stored.student_name));
        Ok(stored)
    }

    /// Removes a mark by id. Unknown lesson or mark ids fail with not-found.
    pub fn delete_mark(&self, lesson_id: i64, mark_id: i64) -> Result<(), JournalError> {
        let mut lesson = self.require_lesson(lesson_id)?;
        let student_name = lesson
            .find_mark(mark_id)
            .map(|mark| mark.student_name.clone())
            .ok_or(JournalError::MarkNotFound { lesson_id, mark_id })?;

        lesson.delete_mark(mark_id);
        self.repo.save(lesson)?;
        info!(
            "event=mark_deleted module=service status=ok lesson_id={lesson_id} mark_id={mark_id}"
        );
        self.notify(&format!("deleted mark (id = {mark_id}) for {student_name}"));
        Ok(())
    }

    /// All marks of one lesson in insertion order.
    pub fn get_marks_for_lesson(&self, lesson_id: i64) -> Result<Vec<Mark>, JournalError> {
        let lesson = self.require_lesson(lesson_id)?;
        Ok(lesson.marks().to_vec())
    }

    /// Marks of present students for one lesson.
    pub fn find_present_marks(&self, lesson_id: i64) -> Result<Vec<Mark>, JournalError> {
        let lesson = self.require_lesson(lesson_id)?;
        Ok(lesson
            .marks()
            .iter()
            .filter(|mark| mark.present)
            .cloned()
            .collect())
    }

    /// Marks of one lesson written within `[from, to]`, newest first.
    pub fn find_marks_in_range(
        &self,
        lesson_id: i64,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Mark>, JournalError> {
        let lesson = self.require_lesson(lesson_id)?;
        let mut marks: Vec<Mark> = lesson
            .marks()
            .iter()
            .filter(|mark| mark.timestamp >= from && mark.timestamp <= to)
            .cloned()
            .collect();
        marks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(marks)
    }

    /// The most recently written marks across the whole journal.
    pub fn latest_marks(&self, limit: usize) -> Result<Vec<Mark>, JournalError> {
        let mut marks: Vec<Mark> = self
            .repo
            .find_all()?
            .iter()
            .flat_map(|lesson| lesson.marks().iter().cloned())
            .collect();
        marks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        marks.truncate(limit);
        Ok(marks)
    }

    // ---- helpers ----

    fn require_lesson(&self, id: i64) -> Result<Lesson, JournalError> {
        self.repo
            .find_by_id(id)?
            .ok_or(JournalError::LessonNotFound(id))
    }

    fn notify(&self, message: &str) {
        if let Some(sink) = &self.sink {
            sink.notify(message);
        }
    }
}

fn require_non_blank(value: &str, field: &'static str) -> Result<(), JournalError> {
    if value.trim().is_empty() {
        return Err(JournalError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}
