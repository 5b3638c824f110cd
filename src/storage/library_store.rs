//! Library catalog storage operations.
//!
//! Provides persistence for:
//! - Books and reading status
//! - Quotes
//! - Collections and collection membership

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::database::DatabaseError;

/// Reading status of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// On the shelf, not started
    ToRead,
    /// Currently being read
    Reading,
    /// Reading completed
    Finished,
    /// Dropped without finishing
    Abandoned,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::ToRead => "to_read",
            BookStatus::Reading => "reading",
            BookStatus::Finished => "finished",
            BookStatus::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "to_read" => Some(BookStatus::ToRead),
            "reading" => Some(BookStatus::Reading),
            "finished" => Some(BookStatus::Finished),
            "abandoned" => Some(BookStatus::Abandoned),
            _ => None,
        }
    }
}

/// A book in the user's library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub page_count: Option<u32>,
    pub status: BookStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Star rating, 1-5
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Create a new book on the shelf.
    pub fn new(user_id: Uuid, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            author: None,
            genre: None,
            page_count: None,
            status: BookStatus::ToRead,
            started_at: None,
            finished_at: None,
            rating: None,
            review: None,
            created_at: Utc::now(),
        }
    }
}

/// A saved quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Option<Uuid>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Create a new quote.
    pub fn new(user_id: Uuid, book_id: Option<Uuid>, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            text,
            created_at: Utc::now(),
        }
    }
}

/// A named collection of books.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Store for the library catalog.
pub struct LibraryStore<'a> {
    conn: &'a Connection,
}

impl<'a> LibraryStore<'a> {
    /// Create a new library store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Book Operations ==========

    /// Insert a new book.
    pub fn insert_book(&self, book: &Book) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO books (id, user_id, title, author, genre, page_count, status,
                                    started_at, finished_at, rating, review, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    book.id.to_string(),
                    book.user_id.to_string(),
                    book.title,
                    book.author,
                    book.genre,
                    book.page_count,
                    book.status.as_str(),
                    book.started_at.map(|dt| dt.to_rfc3339()),
                    book.finished_at.map(|dt| dt.to_rfc3339()),
                    book.rating,
                    book.review,
                    book.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(())
    }

    /// Get a book by ID.
    pub fn get_book(&self, id: &Uuid) -> Result<Option<Book>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, title, author, genre, page_count, status,
                        started_at, finished_at, rating, review, created_at
                 FROM books WHERE id = ?1",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut rows = stmt
            .query(params![id.to_string()])
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if let Some(row) = rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
        {
            Ok(Some(row_to_book(row)?))
        } else {
            Ok(None)
        }
    }

    /// List all books for a user, newest first.
    pub fn list_books(&self, user_id: &Uuid) -> Result<Vec<Book>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, title, author, genre, page_count, status,
                        started_at, finished_at, rating, review, created_at
                 FROM books WHERE user_id = ?1 ORDER BY created_at DESC",
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
            books.push(row_to_book(row)?);
        }

        Ok(books)
    }

    /// Update a book's reading status, stamping start/finish timestamps.
    ///
    /// Moving to `Reading` records `started_at` if not already set; moving to
    /// `Finished` records `finished_at`. Moving away from `Finished` keeps
    /// the old timestamps so history is not lost.
    pub fn update_status(&self, id: &Uuid, status: BookStatus) -> Result<Book, DatabaseError> {
        let book = self
            .get_book(id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("Book {}", id)))?;

        let now = Utc::now();
        let started_at = match status {
            BookStatus::Reading | BookStatus::Finished => Some(book.started_at.unwrap_or(now)),
            _ => book.started_at,
        };
        let finished_at = match status {
            BookStatus::Finished => Some(book.finished_at.unwrap_or(now)),
            _ => book.finished_at,
        };

        self.conn
            .execute(
                "UPDATE books SET status = ?2, started_at = ?3, finished_at = ?4 WHERE id = ?1",
                params![
                    id.to_string(),
                    status.as_str(),
                    started_at.map(|dt| dt.to_rfc3339()),
                    finished_at.map(|dt| dt.to_rfc3339()),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(Book {
            status,
            started_at,
            finished_at,
            ..book
        })
    }

    /// Set or replace a book's review comment and rating.
    pub fn set_review(
        &self,
        id: &Uuid,
        review: Option<String>,
        rating: Option<u8>,
    ) -> Result<(), DatabaseError> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE books SET review = ?2, rating = ?3 WHERE id = ?1",
                params![id.to_string(), review, rating],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("Book {}", id)));
        }

        Ok(())
    }

    // ========== Quote Operations ==========

    /// Insert a new quote.
    pub fn insert_quote(&self, quote: &Quote) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO quotes (id, user_id, book_id, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    quote.id.to_string(),
                    quote.user_id.to_string(),
                    quote.book_id.map(|id| id.to_string()),
                    quote.text,
                    quote.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(())
    }

    // ========== Collection Operations ==========

    /// Create a new collection.
    pub fn create_collection(
        &self,
        user_id: &Uuid,
        name: String,
    ) -> Result<Collection, DatabaseError> {
        let collection = Collection {
            id: Uuid::new_v4(),
            user_id: *user_id,
            name,
            created_at: Utc::now(),
        };

        self.conn
            .execute(
                "INSERT INTO collections (id, user_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    collection.id.to_string(),
                    collection.user_id.to_string(),
                    collection.name,
                    collection.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(collection)
    }

    /// Add a book to a collection. Re-adding is a no-op.
    pub fn add_to_collection(
        &self,
        collection_id: &Uuid,
        book_id: &Uuid,
    ) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO collection_books (collection_id, book_id, added_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    collection_id.to_string(),
                    book_id.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(())
    }
}

/// Parse a database row into a Book.
fn row_to_book(row: &rusqlite::Row) -> Result<Book, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let user_id_str: String = row
        .get(1)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let status_str: String = row
        .get(6)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let started_str: Option<String> = row
        .get(7)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let finished_str: Option<String> = row
        .get(8)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let created_str: String = row
        .get(11)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?;
    let user_id = Uuid::parse_str(&user_id_str)
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid user UUID: {}", e)))?;

    let status = BookStatus::from_str(&status_str).ok_or_else(|| {
        DatabaseError::DeserializationError(format!("Unknown book status: {}", status_str))
    })?;

    Ok(Book {
        id,
        user_id,
        title: row
            .get(2)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        author: row
            .get(3)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        genre: row
            .get(4)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        page_count: row
            .get(5)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        status,
        started_at: parse_optional_datetime(started_str)?,
        finished_at: parse_optional_datetime(finished_str)?,
        rating: row
            .get(9)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        review: row
            .get(10)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        created_at: parse_datetime(&created_str)?,
    })
}

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid date: {}", e)))
}

/// Parse an optional RFC 3339 timestamp column.
pub(crate) fn parse_optional_datetime(
    s: Option<String>,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    s.map(|s| parse_datetime(&s)).transpose()
}
