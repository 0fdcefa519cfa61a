//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `journal_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use journal_core::{InMemoryJournalRepository, JournalService, LessonQuery};

fn main() {
    println!("journal_core version={}", journal_core::core_version());

    let service = JournalService::new(InMemoryJournalRepository::with_demo_data());
    match service.find_lessons(&LessonQuery::default()) {
        Ok(page) => {
            println!(
                "lessons total={} pages={}",
                page.total_elements, page.total_pages
            );
            for lesson in &page.content {
                println!(
                    "#{} {} - {} ({} marks)",
                    lesson.id.unwrap_or_default(),
                    lesson.subject,
                    lesson.topic,
                    lesson.marks_count()
                );
            }
        }
        Err(err) => eprintln!("journal error: {err}"),
    }
}
