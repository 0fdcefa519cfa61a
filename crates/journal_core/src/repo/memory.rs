//! In-memory journal storage.
//!
//! # Responsibility
//! - Provide a process-local store for tests, demos and single-node use.
//! - Assign lesson ids from a repository-owned generator.
//!
//! # Invariants
//! - Individual map operations are consistent under concurrent access.
//! - Cross-operation sequences (fetch, mutate, save) are NOT atomic; two
//!   concurrent writers against the same lesson can race, and the last
//!   `save` wins. This is an accepted limitation of the journal core.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::model::id::IdGenerator;
use crate::model::lesson::Lesson;
use crate::model::mark::Mark;
use crate::repo::journal_repo::{JournalRepository, RepoError, RepoResult};

/// Lock-guarded map keyed by lesson id.
#[derive(Debug, Default)]
pub struct InMemoryJournalRepository {
    storage: RwLock<HashMap<i64, Lesson>>,
    lesson_ids: Mutex<IdGenerator>,
}

impl InMemoryJournalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with the classic two-lesson journal:
    /// Math/Integrals with two graded marks and Physics/Thermodynamics with
    /// one graded and one absent mark.
    pub fn with_demo_data() -> Self {
        let mut math = Lesson::new("Math", "Integrals");
        math.add_mark(Mark::graded("Ivanov", 10));
        math.add_mark(Mark::graded("Petrov", 8));

        let mut physics = Lesson::new("Physics", "Thermodynamics");
        physics.add_mark(Mark::graded("Ivanov", 9));
        physics.add_mark(Mark::absent("Sidorov"));

        let mut lesson_ids = IdGenerator::new();
        let mut storage = HashMap::new();
        for mut lesson in [math, physics] {
            let id = lesson_ids.next_id();
            lesson.id = Some(id);
            storage.insert(id, lesson);
        }

        Self {
            storage: RwLock::new(storage),
            lesson_ids: Mutex::new(lesson_ids),
        }
    }
}

impl JournalRepository for InMemoryJournalRepository {
    fn find_all(&self) -> RepoResult<Vec<Lesson>> {
        let storage = self.storage.read().map_err(|_| RepoError::LockPoisoned)?;
        let mut lessons: Vec<Lesson> = storage.values().cloned().collect();
        lessons.sort_by_key(|lesson| lesson.id);
        Ok(lessons)
    }

    fn find_by_id(&self, id: i64) -> RepoResult<Option<Lesson>> {
        let storage = self.storage.read().map_err(|_| RepoError::LockPoisoned)?;
        Ok(storage.get(&id).cloned())
    }

    fn save(&self, mut lesson: Lesson) -> RepoResult<Lesson> {
        let id = match lesson.id {
            Some(id) => id,
            None => {
                let mut gen = self.lesson_ids.lock().map_err(|_| RepoError::LockPoisoned)?;
                gen.next_id()
            }
        };
        lesson.id = Some(id);

        let mut storage = self.storage.write().map_err(|_| RepoError::LockPoisoned)?;
        storage.insert(id, lesson.clone());
        Ok(lesson)
    }

    fn delete_by_id(&self, id: i64) -> RepoResult<()> {
        let mut storage = self.storage.write().map_err(|_| RepoError::LockPoisoned)?;
        storage.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryJournalRepository;
    use crate::model::lesson::Lesson;
    use crate::repo::journal_repo::JournalRepository;

    #[test]
    fn save_assigns_sequential_lesson_ids() {
        let repo = InMemoryJournalRepository::new();
        let first = repo.save(Lesson::new("Math", "Integrals")).unwrap();
        let second = repo.save(Lesson::new("Physics", "Waves")).unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
    }

    #[test]
    fn save_with_existing_id_overwrites() {
        let repo = InMemoryJournalRepository::new();
        let mut saved = repo.save(Lesson::new("Math", "Integrals")).unwrap();
        saved.topic = "Derivatives".to_string();
        repo.save(saved.clone()).unwrap();

        let loaded = repo.find_by_id(saved.id.unwrap()).unwrap().unwrap();
        assert_eq!(loaded.topic, "Derivatives");
        assert_eq!(repo.find_all().unwrap().len(), 1);
    }

    #[test]
    fn find_all_is_ordered_by_id() {
        let repo = InMemoryJournalRepository::new();
        for topic in ["a", "b", "c"] {
            repo.save(Lesson::new("Math", topic)).unwrap();
        }
        let ids: Vec<_> = repo
            .find_all()
            .unwrap()
            .into_iter()
            .map(|lesson| lesson.id)
            .collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn delete_is_a_no_op_for_unknown_id() {
        let repo = InMemoryJournalRepository::new();
        repo.save(Lesson::new("Math", "Integrals")).unwrap();
        repo.delete_by_id(99).unwrap();
        assert_eq!(repo.find_all().unwrap().len(), 1);
    }

    #[test]
    fn demo_data_matches_the_seeded_journal() {
        let repo = InMemoryJournalRepository::with_demo_data();
        let lessons = repo.find_all().unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].id, Some(1));
        assert_eq!(lessons[0].subject, "Math");
        assert_eq!(lessons[0].marks_count(), 2);

        let physics = &lessons[1];
        assert_eq!(physics.id, Some(2));
        let absent = physics
            .marks()
            .iter()
            .find(|mark| !mark.present)
            .expect("seeded absence mark");
        assert_eq!(absent.student_name, "Sidorov");
        assert_eq!(absent.grade, None);
    }

    #[test]
    fn lesson_ids_continue_past_the_demo_seed() {
        let repo = InMemoryJournalRepository::with_demo_data();
        let next = repo.save(Lesson::new("History", "Antiquity")).unwrap();
        assert_eq!(next.id, Some(3));
    }
}
