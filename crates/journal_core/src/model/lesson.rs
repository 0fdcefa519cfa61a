//! Lesson aggregate root.
//!
//! # Responsibility
//! - Own the ordered mark collection and mediate every child mutation.
//! - Assign mark ids, stamp timestamps and enforce the presence→grade rule
//!   through a single code path.
//!
//! # Invariants
//! - Every mark in `marks` carries a unique id within this lesson.
//! - `add_mark`/`update_mark` null the grade whenever `present` is false.
//! - The mark collection is not exposed for external mutation.

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::id::IdGenerator;
use crate::model::mark::Mark;

/// Aggregate root for one journal lesson and its attendance marks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Assigned by the store on first save, immutable thereafter.
    pub id: Option<i64>,
    /// Non-empty display string; validated at the service boundary.
    pub subject: String,
    pub topic: String,
    /// Calendar date of the lesson, defaults to the creation day.
    pub date: NaiveDate,
    marks: Vec<Mark>,
    mark_ids: IdGenerator,
}

impl Lesson {
    /// Creates an unsaved lesson dated today, with a fresh mark id space.
    pub fn new(subject: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            id: None,
            subject: subject.into(),
            topic: topic.into(),
            date: Local::now().date_naive(),
            marks: Vec::new(),
            mark_ids: IdGenerator::new(),
        }
    }

    /// Rebuilds a lesson from persisted parts.
    ///
    /// The mark id generator is seeded past the highest stored mark id so
    /// ids handed out before persistence are never reused.
    pub(crate) fn rehydrate(
        id: i64,
        subject: String,
        topic: String,
        date: NaiveDate,
        marks: Vec<Mark>,
    ) -> Self {
        let max_mark_id = marks.iter().filter_map(|mark| mark.id).max().unwrap_or(0);
        Self {
            id: Some(id),
            subject,
            topic,
            date,
            marks,
            mark_ids: IdGenerator::starting_after(max_mark_id),
        }
    }

    /// Attaches a mark draft to this lesson and returns its assigned id.
    ///
    /// Assigns the next lesson-scoped id, nulls the grade for an absent
    /// student and stamps the write instant. Insertion order is preserved.
    pub fn add_mark(&mut self, mut mark: Mark) -> i64 {
        let mark_id = self.mark_ids.next_id();
        mark.id = Some(mark_id);
        if !mark.present {
            mark.grade = None;
        }
        mark.timestamp = Utc::now().naive_utc();
        self.marks.push(mark);
        mark_id
    }

    /// Finds a mark by id. Absence is a valid outcome, not an error.
    pub fn find_mark(&self, mark_id: i64) -> Option<&Mark> {
        self.marks.iter().find(|mark| mark.id == Some(mark_id))
    }

    /// Removes every mark with the given id; no-op when none match.
    pub fn delete_mark(&mut self, mark_id: i64) {
        self.marks.retain(|mark| mark.id != Some(mark_id));
    }

    /// Applies an update draft to the mark with the draft's id.
    ///
    /// A draft with no id, or an id not present in this lesson, is silently
    /// ignored (documented quirk carried over from the original journal).
    /// The existing mark keeps its identity; `student_name`, `present` and
    /// `grade` are overwritten with the presence rule re-applied, and the
    /// write instant is re-stamped.
    pub fn update_mark(&mut self, mut updated: Mark) {
        let Some(mark_id) = updated.id else {
            return;
        };
        if !updated.present {
            updated.grade = None;
        }
        if let Some(existing) = self
            .marks
            .iter_mut()
            .find(|mark| mark.id == Some(mark_id))
        {
            existing.student_name = updated.student_name;
            existing.present = updated.present;
            existing.grade = updated.grade;
            existing.timestamp = Utc::now().naive_utc();
        }
    }

    /// Marks in insertion order.
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn marks_count(&self) -> usize {
        self.marks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::Lesson;
    use crate::model::mark::Mark;

    #[test]
    fn add_mark_assigns_sequential_ids() {
        let mut lesson = Lesson::new("Math", "Integrals");
        assert_eq!(lesson.add_mark(Mark::graded("Ivanov", 10)), 1);
        assert_eq!(lesson.add_mark(Mark::graded("Petrov", 8)), 2);
        assert_eq!(lesson.marks_count(), 2);
    }

    #[test]
    fn mark_id_spaces_are_per_lesson() {
        let mut first = Lesson::new("Math", "Integrals");
        let mut second = Lesson::new("Physics", "Thermodynamics");
        first.add_mark(Mark::graded("Ivanov", 10));
        first.add_mark(Mark::graded("Petrov", 8));
        assert_eq!(second.add_mark(Mark::graded("Ivanov", 9)), 1);
    }

    #[test]
    fn absent_mark_loses_its_grade_on_add() {
        let mut lesson = Lesson::new("Math", "Integrals");
        let mark_id = lesson.add_mark(Mark::new("Sidorov", Some(4), false));
        let stored = lesson.find_mark(mark_id).unwrap();
        assert!(!stored.present);
        assert_eq!(stored.grade, None);
    }

    #[test]
    fn update_mark_reapplies_presence_rule() {
        let mut lesson = Lesson::new("Math", "Integrals");
        let mark_id = lesson.add_mark(Mark::graded("Ivanov", 10));

        let mut draft = Mark::new("Ivanov", Some(12), false);
        draft.id = Some(mark_id);
        lesson.update_mark(draft);

        let stored = lesson.find_mark(mark_id).unwrap();
        assert!(!stored.present);
        assert_eq!(stored.grade, None);
    }

    #[test]
    fn update_mark_without_id_is_a_no_op() {
        let mut lesson = Lesson::new("Math", "Integrals");
        lesson.add_mark(Mark::graded("Ivanov", 10));

        lesson.update_mark(Mark::graded("Nobody", 1));

        assert_eq!(lesson.marks_count(), 1);
        assert_eq!(lesson.marks()[0].student_name, "Ivanov");
        assert_eq!(lesson.marks()[0].grade, Some(10));
    }

    #[test]
    fn deleted_mark_ids_are_not_reused() {
        let mut lesson = Lesson::new("Math", "Integrals");
        let first = lesson.add_mark(Mark::graded("Ivanov", 10));
        lesson.delete_mark(first);
        let second = lesson.add_mark(Mark::graded("Petrov", 8));
        assert_eq!(second, 2);
    }

    #[test]
    fn delete_mark_of_unknown_id_is_a_no_op() {
        let mut lesson = Lesson::new("Math", "Integrals");
        lesson.add_mark(Mark::graded("Ivanov", 10));
        lesson.delete_mark(42);
        assert_eq!(lesson.marks_count(), 1);
    }
}
