use chrono::NaiveDate;
use journal_core::db::migrations::latest_version;
use journal_core::db::{open_db, open_db_in_memory};
use journal_core::{
    JournalRepository, JournalService, Lesson, LessonQuery, Mark, RepoError,
    SqliteJournalRepository,
};
use rusqlite::Connection;

fn lesson_with_marks() -> Lesson {
    let mut lesson = Lesson::new("Math", "Integrals");
    lesson.date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
    lesson.add_mark(Mark::graded("Ivanov", 10));
    lesson.add_mark(Mark::absent("Sidorov"));
    lesson
}

#[test]
fn save_and_find_roundtrip_with_marks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let saved = repo.save(lesson_with_marks()).unwrap();
    let id = saved.id.expect("saved lesson should carry an id");

    let loaded = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.subject, "Math");
    assert_eq!(loaded.topic, "Integrals");
    assert_eq!(loaded.date, NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
    assert_eq!(loaded.marks_count(), 2);

    let absent = loaded.find_mark(2).unwrap();
    assert_eq!(absent.student_name, "Sidorov");
    assert!(!absent.present);
    assert_eq!(absent.grade, None);
}

#[test]
fn find_by_unknown_id_is_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();
    assert!(repo.find_by_id(42).unwrap().is_none());
}

#[test]
fn save_with_existing_id_overwrites_lesson_and_replaces_marks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let saved = repo.save(lesson_with_marks()).unwrap();
    let id = saved.id.unwrap();

    let mut updated = saved;
    updated.topic = "Derivatives".to_string();
    updated.delete_mark(1);
    repo.save(updated).unwrap();

    let loaded = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.topic, "Derivatives");
    assert_eq!(loaded.marks_count(), 1);
    assert!(loaded.find_mark(1).is_none());
    assert_eq!(repo.find_all().unwrap().len(), 1);
}

#[test]
fn rehydrated_lessons_continue_the_mark_id_sequence() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let id = repo.save(lesson_with_marks()).unwrap().id.unwrap();

    let mut loaded = repo.find_by_id(id).unwrap().unwrap();
    let next_id = loaded.add_mark(Mark::graded("Petrov", 8));
    assert_eq!(next_id, 3);

    repo.save(loaded).unwrap();
    let reloaded = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(reloaded.marks_count(), 3);
    assert_eq!(reloaded.find_mark(3).unwrap().student_name, "Petrov");
}

#[test]
fn delete_cascades_to_mark_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let id = repo.save(lesson_with_marks()).unwrap().id.unwrap();
    repo.delete_by_id(id).unwrap();

    assert!(repo.find_by_id(id).unwrap().is_none());
    let mark_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM mark WHERE lesson_id = ?1;", [id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(mark_rows, 0);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteJournalRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_tables() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteJournalRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("lesson"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_mark_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE lesson (
            id INTEGER PRIMARY KEY,
            subject TEXT NOT NULL,
            topic TEXT NOT NULL,
            lesson_date TEXT NOT NULL
        );
        CREATE TABLE mark (
            id INTEGER NOT NULL,
            lesson_id INTEGER NOT NULL,
            student_name TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteJournalRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "mark",
            column: "grade"
        })
    ));
}

#[test]
fn service_behaves_identically_over_the_sqlite_store() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();
    let service = JournalService::new(repo);

    let lesson_id = service
        .create_lesson("Physics", "Thermodynamics")
        .unwrap()
        .id
        .unwrap();
    let mark = service
        .add_mark(lesson_id, Mark::new("Sidorov", Some(5), false))
        .unwrap();
    assert_eq!(mark.id, Some(1));
    assert_eq!(mark.grade, None);

    let page = service
        .find_lessons(&LessonQuery {
            subject: Some("phys".to_string()),
            ..LessonQuery::default()
        })
        .unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].marks_count(), 1);
}

#[test]
fn file_backed_journal_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("journal.db");

    let saved_id = {
        let conn = open_db(&db_path).unwrap();
        let repo = SqliteJournalRepository::try_new(&conn).unwrap();
        repo.save(lesson_with_marks()).unwrap().id.unwrap()
    };

    let conn = open_db(&db_path).unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();
    let loaded = repo.find_by_id(saved_id).unwrap().unwrap();
    assert_eq!(loaded.subject, "Math");
    assert_eq!(loaded.marks_count(), 2);
}
