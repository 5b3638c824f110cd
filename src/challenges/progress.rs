//! Challenge progress calculation.
//!
//! Each challenge type maps to a strategy over the user's reading activity.
//! Progress is always recomputed from the activity store; the cached value on
//! an enrollment is only ever the output of this module plus the manual
//! offset.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::streaks;
use super::types::{ChallengeTemplate, ChallengeType, ChallengeWindow};
use crate::storage::activity_store::{ActivityStore, FinishedBook, LONG_BOOK_PAGES};
use crate::storage::database::DatabaseError;

/// Computes progress values for challenge enrollments.
pub struct ProgressCalculator<'a> {
    activity: ActivityStore<'a>,
}

impl<'a> ProgressCalculator<'a> {
    /// Create a new calculator over the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            activity: ActivityStore::new(conn),
        }
    }

    /// Compute total progress for a template over a window.
    ///
    /// Deterministic for a fixed activity snapshot and fixed `now`. A
    /// data-access fault degrades to 0 rather than propagating.
    pub fn compute(
        &self,
        user_id: &Uuid,
        template: &ChallengeTemplate,
        window: &ChallengeWindow,
        manual_progress: i64,
        now: DateTime<Utc>,
    ) -> i64 {
        match self.computed_base(user_id, template, window, now) {
            Ok(base) => base + manual_progress,
            Err(e) => {
                tracing::warn!(
                    "Progress computation failed for template '{}': {}",
                    template.title,
                    e
                );
                0
            }
        }
    }

    /// The computed (non-manual) progress base for one strategy.
    fn computed_base(
        &self,
        user_id: &Uuid,
        template: &ChallengeTemplate,
        window: &ChallengeWindow,
        now: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        let value = match template.challenge_type {
            ChallengeType::BookCount => {
                let genre_filter = template.effective_genre_filter();
                self.finished_in_window(user_id, window)?
                    .iter()
                    .filter(|book| matches_genre(book, genre_filter.as_deref()))
                    .count() as i64
            }
            ChallengeType::PageCount => self
                .finished_in_window(user_id, window)?
                .iter()
                .map(|book| i64::from(book.page_count.unwrap_or(0)))
                .sum(),
            ChallengeType::LongBooks => self
                .finished_in_window(user_id, window)?
                .iter()
                .filter(|book| book.page_count.is_some_and(|p| p >= LONG_BOOK_PAGES))
                .count() as i64,
            ChallengeType::GenreDiversity => {
                let genres: BTreeSet<String> = self
                    .finished_in_window(user_id, window)?
                    .iter()
                    .filter_map(|book| book.genre.as_deref())
                    .filter(|g| !g.trim().is_empty())
                    .map(String::from)
                    .collect();
                genres.len() as i64
            }
            // Diversity and social strategies are global, not time-boxed
            ChallengeType::AuthorDiversity => {
                let authors: BTreeSet<String> = self
                    .activity
                    .finished_books(user_id)?
                    .iter()
                    .filter_map(|book| book.author.as_deref())
                    .filter(|a| !a.trim().is_empty())
                    .map(String::from)
                    .collect();
                authors.len() as i64
            }
            ChallengeType::ReviewCount => self
                .activity
                .finished_books(user_id)?
                .iter()
                .filter(|book| book.review.as_deref().is_some_and(|r| !r.trim().is_empty()))
                .count() as i64,
            ChallengeType::QuoteCount => i64::from(self.activity.quote_count(user_id)?),
            ChallengeType::ReadingStreak => {
                let dates = self.activity.activity_dates(user_id)?;
                i64::from(streaks::current_streak(&dates, now.date_naive()))
            }
            ChallengeType::CollectionSize => {
                i64::from(self.activity.largest_collection_size(user_id)?)
            }
        };

        Ok(value)
    }

    /// Finished books whose finish date falls inside the window.
    fn finished_in_window(
        &self,
        user_id: &Uuid,
        window: &ChallengeWindow,
    ) -> Result<Vec<FinishedBook>, DatabaseError> {
        Ok(self
            .activity
            .finished_books(user_id)?
            .into_iter()
            .filter(|book| book.finished_at.map(|at| window.contains(at)).unwrap_or(false))
            .collect())
    }
}

/// Whether a book passes the template's genre restriction.
fn matches_genre(book: &FinishedBook, filter: Option<&str>) -> bool {
    match filter {
        Some(token) => book
            .genre
            .as_deref()
            .is_some_and(|g| g.to_lowercase().contains(token)),
        None => true,
    }
}
