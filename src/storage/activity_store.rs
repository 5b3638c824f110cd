//! Read-only activity queries for the challenge and achievement engine.
//!
//! Everything the engine computes is derived from the facts exposed here;
//! no engine component keeps state of its own between calls.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::storage::database::DatabaseError;
use crate::storage::library_store::parse_optional_datetime;

/// Page count at or above which a book counts as "long".
pub const LONG_BOOK_PAGES: u32 = 500;

/// A book finished within this many days of being started counts as a fast finish.
pub const FAST_FINISH_DAYS: i64 = 3;

/// A finished book, reduced to the facts progress is computed from.
#[derive(Debug, Clone)]
pub struct FinishedBook {
    pub author: Option<String>,
    pub genre: Option<String>,
    pub page_count: Option<u32>,
    pub review: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Aggregate reading facts for one user, fetched in a single batched read.
#[derive(Debug, Clone, Default)]
pub struct ReadingStats {
    pub books_finished: u32,
    pub total_pages: u64,
    pub reviews_written: u32,
    pub distinct_genres: u32,
    pub max_books_by_author: u32,
    pub quotes_saved: u32,
    pub has_long_book: bool,
    pub has_fast_finish: bool,
}

/// Read-only store over the user's reading activity.
pub struct ActivityStore<'a> {
    conn: &'a Connection,
}

impl<'a> ActivityStore<'a> {
    /// Create a new activity store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All finished books for a user.
    pub fn finished_books(&self, user_id: &Uuid) -> Result<Vec<FinishedBook>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT author, genre, page_count, review, started_at, finished_at
                 FROM books WHERE user_id = ?1 AND status = 'finished'",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut rows = stmt
            .query(params![user_id.to_string()])
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut books = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
        {
            let started_str: Option<String> = row
                .get(4)
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            let finished_str: Option<String> = row
                .get(5)
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            books.push(FinishedBook {
                author: row
                    .get(0)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
                genre: row
                    .get(1)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
                page_count: row
                    .get(2)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
                review: row
                    .get(3)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
                started_at: parse_optional_datetime(started_str)?,
                finished_at: parse_optional_datetime(finished_str)?,
            });
        }

        Ok(books)
    }

    /// Total number of saved quotes for a user.
    pub fn quote_count(&self, user_id: &Uuid) -> Result<u32, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM quotes WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(count as u32)
    }

    /// Book count of the user's largest collection (0 if none).
    pub fn largest_collection_size(&self, user_id: &Uuid) -> Result<u32, DatabaseError> {
        let max: Option<i64> = self
            .conn
            .query_row(
                "SELECT MAX(n) FROM (
                     SELECT COUNT(cb.book_id) AS n
                     FROM collections c
                     LEFT JOIN collection_books cb ON cb.collection_id = c.id
                     WHERE c.user_id = ?1
                     GROUP BY c.id
                 )",
                params![user_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(max.unwrap_or(0) as u32)
    }

    /// Distinct days on which the user had reading activity (started or
    /// finished a book), for streak computation.
    pub fn activity_dates(&self, user_id: &Uuid) -> Result<Vec<NaiveDate>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT started_at, finished_at FROM books WHERE user_id = ?1")
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut rows = stmt
            .query(params![user_id.to_string()])
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut days = BTreeSet::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
        {
            let started_str: Option<String> = row
                .get(0)
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            let finished_str: Option<String> = row
                .get(1)
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            if let Some(dt) = parse_optional_datetime(started_str)? {
                days.insert(dt.date_naive());
            }
            if let Some(dt) = parse_optional_datetime(finished_str)? {
                days.insert(dt.date_naive());
            }
        }

        Ok(days.into_iter().collect())
    }

    /// Aggregate reading facts for badge evaluation.
    ///
    /// One pass over the finished books plus one quote count, rather than a
    /// query per fact.
    pub fn reading_stats(&self, user_id: &Uuid) -> Result<ReadingStats, DatabaseError> {
        let books = self.finished_books(user_id)?;
        let quotes_saved = self.quote_count(user_id)?;

        let mut stats = ReadingStats {
            books_finished: books.len() as u32,
            quotes_saved,
            ..Default::default()
        };

        let mut genres = BTreeSet::new();
        let mut by_author: HashMap<String, u32> = HashMap::new();

        for book in &books {
            stats.total_pages += u64::from(book.page_count.unwrap_or(0));

            if book.review.as_deref().is_some_and(|r| !r.trim().is_empty()) {
                stats.reviews_written += 1;
            }

            if let Some(genre) = book.genre.as_deref().filter(|g| !g.trim().is_empty()) {
                genres.insert(genre.to_string());
            }

            if let Some(author) = book.author.as_deref().filter(|a| !a.trim().is_empty()) {
                *by_author.entry(author.to_string()).or_insert(0) += 1;
            }

            if book.page_count.is_some_and(|p| p >= LONG_BOOK_PAGES) {
                stats.has_long_book = true;
            }

            if let (Some(started), Some(finished)) = (book.started_at, book.finished_at) {
                if finished >= started && finished - started <= Duration::days(FAST_FINISH_DAYS) {
                    stats.has_fast_finish = true;
                }
            }
        }

        stats.distinct_genres = genres.len() as u32;
        stats.max_books_by_author = by_author.values().copied().max().unwrap_or(0);

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use crate::storage::library_store::{Book, BookStatus, LibraryStore, Quote};

    fn add_finished_book(
        store: &LibraryStore,
        user_id: Uuid,
        title: &str,
        author: Option<&str>,
        genre: Option<&str>,
        pages: Option<u32>,
    ) -> Book {
        let mut book = Book::new(user_id, title.to_string());
        book.author = author.map(String::from);
        book.genre = genre.map(String::from);
        book.page_count = pages;
        store.insert_book(&book).unwrap();
        store.update_status(&book.id, BookStatus::Finished).unwrap()
    }

    #[test]
    fn test_reading_stats_aggregates() {
        let db = Database::open_in_memory().unwrap();
        let library = LibraryStore::new(db.connection());
        let activity = ActivityStore::new(db.connection());
        let user_id = Uuid::new_v4();

        let reviewed = add_finished_book(
            &library,
            user_id,
            "Book A",
            Some("Author One"),
            Some("Fantasy"),
            Some(600),
        );
        library
            .set_review(&reviewed.id, Some("Loved it".to_string()), Some(5))
            .unwrap();
        add_finished_book(
            &library,
            user_id,
            "Book B",
            Some("Author One"),
            Some("Mystery"),
            Some(250),
        );
        add_finished_book(&library, user_id, "Book C", None, Some("Fantasy"), None);
        library
            .insert_quote(&Quote::new(user_id, None, "A fine line".to_string()))
            .unwrap();

        let stats = activity.reading_stats(&user_id).unwrap();
        assert_eq!(stats.books_finished, 3);
        assert_eq!(stats.total_pages, 850);
        assert_eq!(stats.reviews_written, 1);
        assert_eq!(stats.distinct_genres, 2);
        assert_eq!(stats.max_books_by_author, 2);
        assert_eq!(stats.quotes_saved, 1);
        assert!(stats.has_long_book);
        // Started and finished on the same day
        assert!(stats.has_fast_finish);
    }

    #[test]
    fn test_reading_stats_empty_library() {
        let db = Database::open_in_memory().unwrap();
        let activity = ActivityStore::new(db.connection());
        let user_id = Uuid::new_v4();

        let stats = activity.reading_stats(&user_id).unwrap();
        assert_eq!(stats.books_finished, 0);
        assert_eq!(stats.total_pages, 0);
        assert_eq!(stats.max_books_by_author, 0);
        assert!(!stats.has_long_book);
    }

    #[test]
    fn test_largest_collection_size() {
        let db = Database::open_in_memory().unwrap();
        let library = LibraryStore::new(db.connection());
        let activity = ActivityStore::new(db.connection());
        let user_id = Uuid::new_v4();

        assert_eq!(activity.largest_collection_size(&user_id).unwrap(), 0);

        let small = library
            .create_collection(&user_id, "Shortlist".to_string())
            .unwrap();
        let big = library
            .create_collection(&user_id, "Everything".to_string())
            .unwrap();

        for i in 0..3 {
            let book = Book::new(user_id, format!("Book {}", i));
            library.insert_book(&book).unwrap();
            library.add_to_collection(&big.id, &book.id).unwrap();
            if i == 0 {
                library.add_to_collection(&small.id, &book.id).unwrap();
            }
        }

        assert_eq!(activity.largest_collection_size(&user_id).unwrap(), 3);
    }

    #[test]
    fn test_activity_dates_deduplicated() {
        let db = Database::open_in_memory().unwrap();
        let library = LibraryStore::new(db.connection());
        let activity = ActivityStore::new(db.connection());
        let user_id = Uuid::new_v4();

        // Both books started and finished today: one distinct day
        add_finished_book(&library, user_id, "Book A", None, None, None);
        add_finished_book(&library, user_id, "Book B", None, None, None);

        let dates = activity.activity_dates(&user_id).unwrap();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0], Utc::now().date_naive());
    }
}
