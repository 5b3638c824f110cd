//! Predefined challenge catalog reconciliation.
//!
//! A small fixed set of official challenge templates is kept in sync with
//! the canonical list below: missing templates are created, templates that
//! fell out of the list are retired, and enrollments left pointing at
//! retired templates are purged. Run once per process start or from an
//! admin action, never implicitly on a read path.

use chrono::Utc;
use rusqlite::params;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use super::lifecycle::ChallengeError;
use super::types::{ChallengePeriod, ChallengeType};
use crate::storage::Database;

/// A canonical predefined template definition.
#[derive(Debug, Clone, Copy)]
pub struct TemplateSeed {
    /// Reconciliation key; unique among predefined templates
    pub title: &'static str,
    pub description: &'static str,
    pub challenge_type: ChallengeType,
    pub target: u32,
    pub period: ChallengePeriod,
    pub icon: &'static str,
    pub genre_filter: Option<&'static str>,
}

/// The canonical list of official challenges.
pub fn predefined_templates() -> Vec<TemplateSeed> {
    vec![
        TemplateSeed {
            title: "Yearly Reading Marathon",
            description: "Finish 24 books this year",
            challenge_type: ChallengeType::BookCount,
            target: 24,
            period: ChallengePeriod::Yearly,
            icon: "📚",
            genre_filter: None,
        },
        TemplateSeed {
            title: "Page Devourer",
            description: "Read 10,000 pages this year",
            challenge_type: ChallengeType::PageCount,
            target: 10_000,
            period: ChallengePeriod::Yearly,
            icon: "📖",
            genre_filter: None,
        },
        TemplateSeed {
            title: "Epic Tomes",
            description: "Finish 5 books of 500+ pages this year",
            challenge_type: ChallengeType::LongBooks,
            target: 5,
            period: ChallengePeriod::Yearly,
            icon: "🏔️",
            genre_filter: None,
        },
        TemplateSeed {
            title: "Genre Hopper",
            description: "Read across 6 different genres this year",
            challenge_type: ChallengeType::GenreDiversity,
            target: 6,
            period: ChallengePeriod::Yearly,
            icon: "🧭",
            genre_filter: None,
        },
        TemplateSeed {
            title: "A Roman a Week",
            description: "Finish one roman every week",
            challenge_type: ChallengeType::BookCount,
            target: 1,
            period: ChallengePeriod::Weekly,
            icon: "📕",
            genre_filter: Some("roman"),
        },
        TemplateSeed {
            title: "Monthly BD Stack",
            description: "Finish 4 BD albums in a month",
            challenge_type: ChallengeType::BookCount,
            target: 4,
            period: ChallengePeriod::Monthly,
            icon: "💭",
            genre_filter: Some("bd"),
        },
        TemplateSeed {
            title: "Author Collector",
            description: "Finish books by 15 different authors",
            challenge_type: ChallengeType::AuthorDiversity,
            target: 15,
            period: ChallengePeriod::Anytime,
            icon: "✍️",
            genre_filter: None,
        },
        TemplateSeed {
            title: "Thoughtful Critic",
            description: "Review 10 of your finished books",
            challenge_type: ChallengeType::ReviewCount,
            target: 10,
            period: ChallengePeriod::Anytime,
            icon: "📝",
            genre_filter: None,
        },
        TemplateSeed {
            title: "Quote Keeper",
            description: "Save 25 quotes from your reading",
            challenge_type: ChallengeType::QuoteCount,
            target: 25,
            period: ChallengePeriod::Anytime,
            icon: "💬",
            genre_filter: None,
        },
        TemplateSeed {
            title: "Thirty-Day Streak",
            description: "Read every day for 30 days",
            challenge_type: ChallengeType::ReadingStreak,
            target: 30,
            period: ChallengePeriod::Anytime,
            icon: "🔥",
            genre_filter: None,
        },
        TemplateSeed {
            title: "Grand Collection",
            description: "Grow a collection to 20 books",
            challenge_type: ChallengeType::CollectionSize,
            target: 20,
            period: ChallengePeriod::Anytime,
            icon: "🗃️",
            genre_filter: None,
        },
    ]
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Templates created because they were missing
    pub created: u32,
    /// Predefined templates deleted because they left the canonical list
    pub retired: u32,
    /// Enrollments purged because their template no longer exists
    pub ghosts_purged: u32,
    /// Creations or retirements that failed and were skipped
    pub failures: u32,
}

/// Keeps the predefined catalog in sync with the canonical list.
pub struct CatalogReconciler {
    db: Arc<Database>,
}

impl CatalogReconciler {
    /// Create a new reconciler.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Reconcile the stored predefined templates against `canonical`.
    ///
    /// Idempotent; a failed creation or retirement is logged and skipped so
    /// one bad entry cannot block the rest of the catalog.
    pub fn reconcile(&self, canonical: &[TemplateSeed]) -> Result<ReconcileSummary, ChallengeError> {
        let conn = self.db.connection();
        let mut summary = ReconcileSummary::default();

        let mut stmt = conn
            .prepare("SELECT id, title FROM challenge_templates WHERE is_predefined = 1")
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;
        let existing: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        let existing_titles: BTreeSet<&str> =
            existing.iter().map(|(_, title)| title.as_str()).collect();
        let canonical_titles: BTreeSet<&str> = canonical.iter().map(|seed| seed.title).collect();

        // Create missing templates
        for seed in canonical {
            if existing_titles.contains(seed.title) {
                continue;
            }

            let result = conn.execute(
                "INSERT INTO challenge_templates
                 (id, title, description, challenge_type, target, period, icon,
                  genre_filter, is_predefined, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, NULL, ?9)",
                params![
                    Uuid::new_v4().to_string(),
                    seed.title,
                    seed.description,
                    seed.challenge_type.as_str(),
                    seed.target,
                    seed.period.as_str(),
                    seed.icon,
                    seed.genre_filter,
                    Utc::now().to_rfc3339(),
                ],
            );

            match result {
                Ok(_) => summary.created += 1,
                Err(e) => {
                    tracing::warn!("Failed to create predefined template '{}': {}", seed.title, e);
                    summary.failures += 1;
                }
            }
        }

        // Retire templates that left the canonical list
        for (id, title) in &existing {
            if canonical_titles.contains(title.as_str()) {
                continue;
            }

            let result = conn.execute(
                "DELETE FROM challenge_templates WHERE id = ?1",
                params![id],
            );

            match result {
                Ok(_) => {
                    tracing::info!("Retired predefined template '{}'", title);
                    summary.retired += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to retire predefined template '{}': {}", title, e);
                    summary.failures += 1;
                }
            }
        }

        summary.ghosts_purged = self.purge_ghost_enrollments()?;

        tracing::info!(
            "Catalog reconciled: {} created, {} retired, {} ghosts purged, {} failures",
            summary.created,
            summary.retired,
            summary.ghosts_purged,
            summary.failures
        );

        Ok(summary)
    }

    /// Delete enrollments whose template no longer exists.
    ///
    /// Explicit maintenance rather than a side effect of listing, so reads
    /// stay reads.
    pub fn purge_ghost_enrollments(&self) -> Result<u32, ChallengeError> {
        let deleted = self
            .db
            .connection()
            .execute(
                "DELETE FROM challenge_enrollments
                 WHERE template_id NOT IN (SELECT id FROM challenge_templates)",
                [],
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        if deleted > 0 {
            tracing::info!("Purged {} ghost enrollment(s)", deleted);
        }

        Ok(deleted as u32)
    }
}
