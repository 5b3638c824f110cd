//! Badge evaluation and unlocking.
//!
//! Recomputes aggregate reading facts, walks the static rule table once, and
//! awards whatever newly qualifies. Awarding is idempotent: the badges table
//! carries a uniqueness constraint on (user, name) and inserts ignore
//! conflicts, so redundant or concurrent evaluations cannot double-award.

use chrono::Utc;
use rusqlite::params;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{badge_rules, Badge, BadgeCategory, BadgeRule};
use crate::challenges::streaks;
use crate::storage::activity_store::{ActivityStore, ReadingStats};
use crate::storage::database::DatabaseError;
use crate::storage::library_store::parse_datetime;
use crate::storage::Database;

/// Aggregate facts badge rules are evaluated against.
#[derive(Debug, Clone, Default)]
pub struct ReaderStats {
    pub reading: ReadingStats,
    pub current_streak: u32,
    pub completed_challenges: u32,
    pub predefined_total: u32,
    pub completed_predefined: u32,
    pub custom_templates_created: u32,
}

/// Badge evaluator.
pub struct BadgeEvaluator {
    db: Arc<Database>,
}

impl BadgeEvaluator {
    /// Create a new badge evaluator.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Evaluate all rules for a user and unlock whatever newly qualifies.
    ///
    /// Returns only the badges awarded by this call.
    pub fn check_and_award(&self, user_id: &Uuid) -> Result<Vec<Badge>, BadgeError> {
        let stats = self.gather_stats(user_id)?;

        let mut newly_awarded = Vec::new();
        for rule in badge_rules() {
            if rule_satisfied(&rule, &stats) {
                if let Some(badge) = self.award(user_id, &rule)? {
                    newly_awarded.push(badge);
                }
            }
        }

        if !newly_awarded.is_empty() {
            tracing::info!(
                "Unlocked {} badge(s) for user {}",
                newly_awarded.len(),
                user_id
            );
        }

        Ok(newly_awarded)
    }

    /// Badges earned by a user, newest first.
    pub fn list_badges(&self, user_id: &Uuid) -> Result<Vec<Badge>, BadgeError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, name, description, icon, category, unlocked_at
                 FROM badges WHERE user_id = ?1 ORDER BY unlocked_at DESC, name ASC",
            )
            .map_err(|e| BadgeError::DatabaseError(e.to_string()))?;

        let mut rows = stmt
            .query(params![user_id.to_string()])
            .map_err(|e| BadgeError::DatabaseError(e.to_string()))?;

        let mut badges = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| BadgeError::DatabaseError(e.to_string()))?
        {
            let id_str: String = row
                .get(0)
                .map_err(|e| BadgeError::DatabaseError(e.to_string()))?;
            let user_id_str: String = row
                .get(1)
                .map_err(|e| BadgeError::DatabaseError(e.to_string()))?;
            let category_str: String = row
                .get(5)
                .map_err(|e| BadgeError::DatabaseError(e.to_string()))?;
            let unlocked_str: String = row
                .get(6)
                .map_err(|e| BadgeError::DatabaseError(e.to_string()))?;

            badges.push(Badge {
                id: Uuid::parse_str(&id_str)
                    .map_err(|e| BadgeError::DatabaseError(e.to_string()))?,
                user_id: Uuid::parse_str(&user_id_str)
                    .map_err(|e| BadgeError::DatabaseError(e.to_string()))?,
                name: row
                    .get(2)
                    .map_err(|e| BadgeError::DatabaseError(e.to_string()))?,
                description: row
                    .get(3)
                    .map_err(|e| BadgeError::DatabaseError(e.to_string()))?,
                icon: row
                    .get(4)
                    .map_err(|e| BadgeError::DatabaseError(e.to_string()))?,
                category: BadgeCategory::from_str(&category_str)
                    .unwrap_or(BadgeCategory::Special),
                unlocked_at: parse_datetime(&unlocked_str)
                    .map_err(|e| BadgeError::DatabaseError(e.to_string()))?,
            });
        }

        Ok(badges)
    }

    /// Fetch all aggregate facts for a user in one batched read.
    pub fn gather_stats(&self, user_id: &Uuid) -> Result<ReaderStats, BadgeError> {
        let conn = self.db.connection();
        let activity = ActivityStore::new(conn);

        let reading = activity.reading_stats(user_id)?;
        let dates = activity.activity_dates(user_id)?;
        let current_streak = streaks::current_streak(&dates, Utc::now().date_naive());

        let completed_challenges = count(
            conn,
            "SELECT COUNT(*) FROM challenge_enrollments
             WHERE user_id = ?1 AND status = 'completed'",
            &[&user_id.to_string()],
        )?;
        let predefined_total = count(
            conn,
            "SELECT COUNT(*) FROM challenge_templates WHERE is_predefined = 1",
            &[],
        )?;
        let completed_predefined = count(
            conn,
            "SELECT COUNT(*) FROM challenge_enrollments e
             JOIN challenge_templates t ON e.template_id = t.id
             WHERE e.user_id = ?1 AND e.status = 'completed' AND t.is_predefined = 1",
            &[&user_id.to_string()],
        )?;
        let custom_templates_created = count(
            conn,
            "SELECT COUNT(*) FROM challenge_templates WHERE created_by = ?1",
            &[&user_id.to_string()],
        )?;

        Ok(ReaderStats {
            reading,
            current_streak,
            completed_challenges,
            predefined_total,
            completed_predefined,
            custom_templates_created,
        })
    }

    /// Award a badge unless the user already holds one with that name.
    ///
    /// Returns the badge only when this call inserted it.
    fn award(&self, user_id: &Uuid, rule: &BadgeRule) -> Result<Option<Badge>, BadgeError> {
        let badge = Badge {
            id: Uuid::new_v4(),
            user_id: *user_id,
            name: rule.name.to_string(),
            description: rule.description.to_string(),
            icon: rule.icon.to_string(),
            category: rule.category,
            unlocked_at: Utc::now(),
        };

        let inserted = self
            .db
            .connection()
            .execute(
                "INSERT OR IGNORE INTO badges (id, user_id, name, description, icon, category, unlocked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    badge.id.to_string(),
                    badge.user_id.to_string(),
                    badge.name,
                    badge.description,
                    badge.icon,
                    badge.category.as_str(),
                    badge.unlocked_at.to_rfc3339(),
                ],
            )
            .map_err(|e| BadgeError::DatabaseError(e.to_string()))?;

        if inserted == 1 {
            tracing::info!("Badge unlocked: {}", badge.name);
            Ok(Some(badge))
        } else {
            Ok(None)
        }
    }
}

/// Whether a rule's condition holds for the given facts.
fn rule_satisfied(rule: &BadgeRule, stats: &ReaderStats) -> bool {
    match rule.category {
        BadgeCategory::Reading => rule
            .target
            .is_some_and(|t| stats.reading.books_finished >= t),
        BadgeCategory::Pages => rule
            .target
            .is_some_and(|t| stats.reading.total_pages >= u64::from(t)),
        BadgeCategory::Streak => rule.target.is_some_and(|t| stats.current_streak >= t),
        BadgeCategory::Social => {
            if rule.id.starts_with("review") {
                rule.target.is_some_and(|t| stats.reading.reviews_written >= t)
            } else if rule.id.starts_with("quote") {
                rule.target.is_some_and(|t| stats.reading.quotes_saved >= t)
            } else {
                false
            }
        }
        BadgeCategory::Challenge => {
            if rule.id == "challenge_all" {
                stats.predefined_total > 0 && stats.completed_predefined >= stats.predefined_total
            } else {
                rule.target.is_some_and(|t| stats.completed_challenges >= t)
            }
        }
        BadgeCategory::Special => match rule.id {
            "genre_explorer" => stats.reading.distinct_genres >= 5,
            "long_book" => stats.reading.has_long_book,
            "template_author" => stats.custom_templates_created >= 1,
            "author_fan" => stats.reading.max_books_by_author >= 3,
            "speed_reader" => stats.reading.has_fast_finish,
            _ => false,
        },
    }
}

/// Run a COUNT(*) query.
fn count(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<u32, BadgeError> {
    let n: i64 = conn
        .query_row(sql, params, |row| row.get(0))
        .map_err(|e| BadgeError::DatabaseError(e.to_string()))?;
    Ok(n as u32)
}

/// Badge errors.
#[derive(Debug, thiserror::Error)]
pub enum BadgeError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for BadgeError {
    fn from(e: DatabaseError) -> Self {
        BadgeError::DatabaseError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::library_store::{Book, BookStatus, LibraryStore};

    fn setup() -> (Arc<Database>, BadgeEvaluator, Uuid) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let evaluator = BadgeEvaluator::new(db.clone());
        (db, evaluator, Uuid::new_v4())
    }

    fn finish_long_book(db: &Database, user_id: Uuid) {
        let library = LibraryStore::new(db.connection());
        let mut book = Book::new(user_id, "The Brothers Karamazov".to_string());
        book.page_count = Some(824);
        library.insert_book(&book).unwrap();
        library.update_status(&book.id, BookStatus::Finished).unwrap();
    }

    #[test]
    fn test_no_activity_awards_nothing() {
        let (_db, evaluator, user_id) = setup();
        let awarded = evaluator.check_and_award(&user_id).unwrap();
        assert!(awarded.is_empty());
    }

    #[test]
    fn test_first_book_unlocks_milestones() {
        let (db, evaluator, user_id) = setup();
        finish_long_book(&db, user_id);

        let awarded = evaluator.check_and_award(&user_id).unwrap();
        let names: Vec<&str> = awarded.iter().map(|b| b.name.as_str()).collect();

        assert!(names.contains(&"First Chapter"));
        assert!(names.contains(&"Marathon Read"));
        // Started and finished the same day
        assert!(names.contains(&"Speed Reader"));
        assert!(!names.contains(&"Bookworm"));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let (db, evaluator, user_id) = setup();
        finish_long_book(&db, user_id);

        let first = evaluator.check_and_award(&user_id).unwrap();
        assert!(!first.is_empty());

        let second = evaluator.check_and_award(&user_id).unwrap();
        assert!(second.is_empty());

        let all = evaluator.list_badges(&user_id).unwrap();
        assert_eq!(all.len(), first.len());
    }

    #[test]
    fn test_completionist_requires_existing_catalog() {
        let (_db, evaluator, user_id) = setup();

        // No predefined templates at all: the all-predefined rule must not fire
        let stats = evaluator.gather_stats(&user_id).unwrap();
        assert_eq!(stats.predefined_total, 0);

        let rule = badge_rules()
            .into_iter()
            .find(|r| r.id == "challenge_all")
            .unwrap();
        assert!(!rule_satisfied(&rule, &stats));
    }

    #[test]
    fn test_author_fan_threshold() {
        let (db, evaluator, user_id) = setup();
        let library = LibraryStore::new(db.connection());

        for title in ["Book One", "Book Two", "Book Three"] {
            let mut book = Book::new(user_id, title.to_string());
            book.author = Some("Robin Hobb".to_string());
            library.insert_book(&book).unwrap();
            library.update_status(&book.id, BookStatus::Finished).unwrap();
        }

        let awarded = evaluator.check_and_award(&user_id).unwrap();
        let names: Vec<&str> = awarded.iter().map(|b| b.name.as_str()).collect();
        assert!(names.contains(&"Devoted Fan"));
    }
}
