//! SQLite-backed journal storage.
//!
//! # Responsibility
//! - Persist lesson aggregates across the `lesson` and `mark` tables.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `save` writes the lesson row and replaces its mark rows in one
//!   transaction (aggregate save semantics).
//! - Mark ids are lesson-scoped; the table key is `(lesson_id, id)`.
//! - Loaded aggregates continue their mark id sequence past the highest
//!   persisted id.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};

use crate::db::migrations::latest_version;
use crate::model::lesson::Lesson;
use crate::model::mark::Mark;
use crate::repo::journal_repo::{JournalRepository, RepoError, RepoResult};

const LESSON_SELECT_SQL: &str = "SELECT id, subject, topic, lesson_date FROM lesson";

const MARK_SELECT_SQL: &str = "SELECT
    id,
    lesson_id,
    student_name,
    grade,
    present,
    updated_at
FROM mark";

/// SQLite-backed journal repository over a migrated connection.
pub struct SqliteJournalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    /// Constructs a repository after verifying the connection is migrated and
    /// carries the tables/columns this repository depends on.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn load_marks(&self, lesson_id: i64) -> RepoResult<Vec<Mark>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MARK_SELECT_SQL} WHERE lesson_id = ?1 ORDER BY id ASC;"))?;
        let mut rows = stmt.query([lesson_id])?;
        let mut marks = Vec::new();
        while let Some(row) = rows.next()? {
            marks.push(parse_mark_row(row)?);
        }
        Ok(marks)
    }

    fn load_lesson(&self, row: &Row<'_>) -> RepoResult<Lesson> {
        let id: i64 = row.get("id")?;
        let subject: String = row.get("subject")?;
        let topic: String = row.get("topic")?;
        let date: NaiveDate = row.get("lesson_date")?;
        let marks = self.load_marks(id)?;
        Ok(Lesson::rehydrate(id, subject, topic, date, marks))
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn find_all(&self) -> RepoResult<Vec<Lesson>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LESSON_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut lessons = Vec::new();
        while let Some(row) = rows.next()? {
            lessons.push(self.load_lesson(row)?);
        }
        Ok(lessons)
    }

    fn find_by_id(&self, id: i64) -> RepoResult<Option<Lesson>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LESSON_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.load_lesson(row)?));
        }
        Ok(None)
    }

    fn save(&self, mut lesson: Lesson) -> RepoResult<Lesson> {
        let tx = self.conn.unchecked_transaction()?;

        let lesson_id = match lesson.id {
            None => {
                tx.execute(
                    "INSERT INTO lesson (subject, topic, lesson_date)
                     VALUES (?1, ?2, ?3);",
                    params![lesson.subject, lesson.topic, lesson.date],
                )?;
                tx.last_insert_rowid()
            }
            Some(id) => {
                tx.execute(
                    "INSERT INTO lesson (id, subject, topic, lesson_date)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        subject = excluded.subject,
                        topic = excluded.topic,
                        lesson_date = excluded.lesson_date;",
                    params![id, lesson.subject, lesson.topic, lesson.date],
                )?;
                id
            }
        };

        tx.execute("DELETE FROM mark WHERE lesson_id = ?1;", [lesson_id])?;
        for mark in lesson.marks() {
            let mark_id = mark.id.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "mark for `{}` has no id; marks must be attached via the lesson",
                    mark.student_name
                ))
            })?;
            tx.execute(
                "INSERT INTO mark (id, lesson_id, student_name, grade, present, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    mark_id,
                    lesson_id,
                    mark.student_name,
                    mark.grade,
                    mark.present,
                    mark.timestamp,
                ],
            )?;
        }

        tx.commit()?;
        lesson.id = Some(lesson_id);
        Ok(lesson)
    }

    fn delete_by_id(&self, id: i64) -> RepoResult<()> {
        // Mark rows cascade via the lesson_id foreign key.
        self.conn
            .execute("DELETE FROM lesson WHERE id = ?1;", [id])?;
        Ok(())
    }
}

fn parse_mark_row(row: &Row<'_>) -> RepoResult<Mark> {
    let present = match row.get::<_, i64>("present")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid present value `{other}` in mark.present"
            )));
        }
    };
    let grade: Option<i32> = row.get("grade")?;
    if !present && grade.is_some() {
        return Err(RepoError::InvalidData(
            "absent mark carries a grade in mark.grade".to_string(),
        ));
    }

    let timestamp: NaiveDateTime = row.get("updated_at")?;
    Ok(Mark {
        id: Some(row.get("id")?),
        student_name: row.get("student_name")?,
        grade,
        present,
        timestamp,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["lesson", "mark"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in ["id", "subject", "topic", "lesson_date"] {
        if !table_has_column(conn, "lesson", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "lesson",
                column,
            });
        }
    }

    for column in [
        "id",
        "lesson_id",
        "student_name",
        "grade",
        "present",
        "updated_at",
    ] {
        if !table_has_column(conn, "mark", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "mark",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
