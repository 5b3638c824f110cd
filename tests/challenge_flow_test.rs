//! Integration tests for the challenge lifecycle.
//!
//! Exercises the full flow: catalog reconciliation, joining, reading
//! activity, progress refresh, completion, and relaunch.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use rustreads::challenges::catalog::predefined_templates;
use rustreads::challenges::types::{ChallengePeriod, ChallengeTemplate, ChallengeType, EnrollmentStatus};
use rustreads::storage::library_store::{Book, BookStatus, LibraryStore, Quote};
use rustreads::{BadgeEvaluator, CatalogReconciler, ChallengeManager, Database};

fn setup() -> (Arc<Database>, ChallengeManager, Uuid) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let manager = ChallengeManager::new(db.clone());
    (db, manager, Uuid::new_v4())
}

/// Reconcile the full predefined catalog and find one template by title.
fn predefined(manager: &ChallengeManager, db: &Arc<Database>, title: &str) -> ChallengeTemplate {
    CatalogReconciler::new(db.clone())
        .reconcile(&predefined_templates())
        .unwrap();
    manager
        .list_templates()
        .unwrap()
        .into_iter()
        .find(|t| t.title == title)
        .expect("predefined template missing")
}

fn finish_book(db: &Database, user_id: Uuid, title: &str, genre: Option<&str>, pages: Option<u32>) {
    let library = LibraryStore::new(db.connection());
    let mut book = Book::new(user_id, title.to_string());
    book.genre = genre.map(String::from);
    book.page_count = pages;
    library.insert_book(&book).unwrap();
    library.update_status(&book.id, BookStatus::Finished).unwrap();
}

#[test]
fn page_count_challenge_completes_and_unlocks_page_badges() {
    let (db, manager, user_id) = setup();
    let template = predefined(&manager, &db, "Page Devourer");
    assert_eq!(template.challenge_type, ChallengeType::PageCount);
    assert_eq!(template.target, 10_000);
    assert_eq!(template.period, ChallengePeriod::Yearly);

    let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

    finish_book(&db, user_id, "First", None, Some(3_000));
    finish_book(&db, user_id, "Second", None, Some(4_000));
    finish_book(&db, user_id, "Third", None, Some(5_000));

    let refreshed = manager.refresh_progress(&enrollment.id).unwrap();
    assert_eq!(refreshed.progress, 12_000);
    assert_eq!(refreshed.status, EnrollmentStatus::Completed);
    assert!(refreshed.completed_at.is_some());

    // Page badges with a threshold at or below 12,000 pages unlock
    let badges = BadgeEvaluator::new(db.clone()).list_badges(&user_id).unwrap();
    let names: Vec<&str> = badges.iter().map(|b| b.name.as_str()).collect();
    assert!(names.contains(&"Page Turner"));
    assert!(names.contains(&"Paper Mountain"));
    assert!(names.contains(&"Ink Devourer"));
    assert!(!names.contains(&"The Long Haul"));
}

#[test]
fn genre_filtered_weekly_challenge() {
    let (db, manager, user_id) = setup();
    let template = predefined(&manager, &db, "A Roman a Week");
    let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

    // A Policier does not satisfy a roman challenge
    finish_book(&db, user_id, "Whodunit", Some("Policier"), None);
    let refreshed = manager.refresh_progress(&enrollment.id).unwrap();
    assert_eq!(refreshed.progress, 0);
    assert_eq!(refreshed.status, EnrollmentStatus::Active);

    finish_book(&db, user_id, "Saga", Some("Roman"), None);
    let refreshed = manager.refresh_progress(&enrollment.id).unwrap();
    assert_eq!(refreshed.progress, 1);
    assert_eq!(refreshed.status, EnrollmentStatus::Completed);
}

#[test]
fn manual_progress_is_reversible() {
    let (_db, manager, user_id) = setup();
    let template = manager
        .create_custom_template(
            &user_id,
            "Quote Hunt".to_string(),
            String::new(),
            ChallengeType::QuoteCount,
            100,
            ChallengePeriod::Anytime,
            "💬".to_string(),
            None,
        )
        .unwrap();
    let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

    let before = manager.refresh_progress(&enrollment.id).unwrap().progress;

    let bumped = manager.add_manual_progress(&enrollment.id, 5).unwrap();
    assert_eq!(bumped.progress, before + 5);

    let restored = manager.add_manual_progress(&enrollment.id, -5).unwrap();
    assert_eq!(restored.progress, before);
}

#[test]
fn completion_is_sticky_until_relaunch() {
    let (db, manager, user_id) = setup();
    let template = manager
        .create_custom_template(
            &user_id,
            "Doorstopper".to_string(),
            String::new(),
            ChallengeType::PageCount,
            500,
            ChallengePeriod::Anytime,
            "📖".to_string(),
            None,
        )
        .unwrap();
    let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

    let library = LibraryStore::new(db.connection());
    let mut book = Book::new(user_id, "War and Peace".to_string());
    book.page_count = Some(1_225);
    library.insert_book(&book).unwrap();
    library.update_status(&book.id, BookStatus::Finished).unwrap();

    let completed = manager.refresh_progress(&enrollment.id).unwrap();
    assert_eq!(completed.status, EnrollmentStatus::Completed);
    let completed_at = completed.completed_at;

    // The book drops back out of the finished set; computed progress falls
    // below the target, but completion does not flip back
    library.update_status(&book.id, BookStatus::Reading).unwrap();
    let refreshed = manager.refresh_progress(&enrollment.id).unwrap();
    assert_eq!(refreshed.status, EnrollmentStatus::Completed);
    assert_eq!(refreshed.completed_at, completed_at);
    assert!(refreshed.progress < 500);

    // Relaunch is the only way back to active
    let relaunched = manager.relaunch(&enrollment.id).unwrap();
    assert_eq!(relaunched.status, EnrollmentStatus::Active);
    assert!(relaunched.completed_at.is_none());
    assert_eq!(relaunched.progress, 0);
}

#[test]
fn refresh_all_covers_open_enrollments() {
    let (db, manager, user_id) = setup();

    let quotes = manager
        .create_custom_template(
            &user_id,
            "Quote Hunt".to_string(),
            String::new(),
            ChallengeType::QuoteCount,
            2,
            ChallengePeriod::Anytime,
            "💬".to_string(),
            None,
        )
        .unwrap();
    let books = manager
        .create_custom_template(
            &user_id,
            "One More Book".to_string(),
            String::new(),
            ChallengeType::BookCount,
            5,
            ChallengePeriod::Anytime,
            "📚".to_string(),
            None,
        )
        .unwrap();

    let quote_enrollment = manager.join(&user_id, &quotes.id, None, None).unwrap();
    let book_enrollment = manager.join(&user_id, &books.id, None, None).unwrap();

    let library = LibraryStore::new(db.connection());
    library
        .insert_quote(&Quote::new(user_id, None, "First".to_string()))
        .unwrap();
    library
        .insert_quote(&Quote::new(user_id, None, "Second".to_string()))
        .unwrap();
    finish_book(&db, user_id, "One", None, None);

    let refreshed = manager.refresh_all(&user_id).unwrap();
    assert_eq!(refreshed.len(), 2);

    let quote_state = manager.get_enrollment(&quote_enrollment.id).unwrap();
    assert_eq!(quote_state.progress, 2);
    assert_eq!(quote_state.status, EnrollmentStatus::Completed);

    let book_state = manager.get_enrollment(&book_enrollment.id).unwrap();
    assert_eq!(book_state.progress, 1);
    assert_eq!(book_state.status, EnrollmentStatus::Active);

    // Completed enrollments fall out of the bulk refresh set
    let refreshed = manager.refresh_all(&user_id).unwrap();
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].id, book_enrollment.id);
}

#[test]
fn enrollment_window_override_is_honored() {
    let (db, manager, user_id) = setup();
    let template = manager
        .create_custom_template(
            &user_id,
            "Catch-Up Year".to_string(),
            String::new(),
            ChallengeType::BookCount,
            1,
            ChallengePeriod::Yearly,
            "📚".to_string(),
            None,
        )
        .unwrap();

    // Backdated window covering last month's reading
    let start = Utc::now() - Duration::days(30);
    let enrollment = manager
        .join(&user_id, &template.id, Some(start), None)
        .unwrap();
    assert_eq!(enrollment.start_date, Some(start));

    let library = LibraryStore::new(db.connection());
    let mut book = Book::new(user_id, "Older Read".to_string());
    book.status = BookStatus::Finished;
    book.finished_at = Some(Utc::now() - Duration::days(10));
    library.insert_book(&book).unwrap();

    let refreshed = manager.refresh_progress(&enrollment.id).unwrap();
    assert_eq!(refreshed.progress, 1);
    assert_eq!(refreshed.status, EnrollmentStatus::Completed);
}

#[test]
fn database_persists_catalog_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rustreads.db");

    {
        let db = Arc::new(Database::open(&path).unwrap());
        let summary = CatalogReconciler::new(db.clone())
            .reconcile(&predefined_templates())
            .unwrap();
        assert_eq!(summary.created, predefined_templates().len() as u32);
    }

    let db = Arc::new(Database::open(&path).unwrap());
    let summary = CatalogReconciler::new(db.clone())
        .reconcile(&predefined_templates())
        .unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.retired, 0);

    let manager = ChallengeManager::new(db);
    assert_eq!(
        manager.list_templates().unwrap().len(),
        predefined_templates().len()
    );
}
