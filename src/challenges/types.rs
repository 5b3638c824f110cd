//! Core types for the reading challenge engine.
//!
//! Defines challenge templates, enrollment state, and progress windows.

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a challenge measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeType {
    /// Books finished in the window
    BookCount,
    /// Pages read across books finished in the window
    PageCount,
    /// Books of 500+ pages finished in the window
    LongBooks,
    /// Distinct genres among books finished in the window
    GenreDiversity,
    /// Distinct authors across all finished books
    AuthorDiversity,
    /// Finished books carrying a review
    ReviewCount,
    /// Saved quotes
    QuoteCount,
    /// Current consecutive-day reading streak
    ReadingStreak,
    /// Book count of the largest collection
    CollectionSize,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::BookCount => "BOOK_COUNT",
            ChallengeType::PageCount => "PAGE_COUNT",
            ChallengeType::LongBooks => "LONG_BOOKS",
            ChallengeType::GenreDiversity => "GENRE_DIVERSITY",
            ChallengeType::AuthorDiversity => "AUTHOR_DIVERSITY",
            ChallengeType::ReviewCount => "REVIEW_COUNT",
            ChallengeType::QuoteCount => "QUOTE_COUNT",
            ChallengeType::ReadingStreak => "READING_STREAK",
            ChallengeType::CollectionSize => "COLLECTION_SIZE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BOOK_COUNT" => Some(ChallengeType::BookCount),
            "PAGE_COUNT" => Some(ChallengeType::PageCount),
            "LONG_BOOKS" => Some(ChallengeType::LongBooks),
            "GENRE_DIVERSITY" => Some(ChallengeType::GenreDiversity),
            "AUTHOR_DIVERSITY" => Some(ChallengeType::AuthorDiversity),
            "REVIEW_COUNT" => Some(ChallengeType::ReviewCount),
            "QUOTE_COUNT" => Some(ChallengeType::QuoteCount),
            "READING_STREAK" => Some(ChallengeType::ReadingStreak),
            "COLLECTION_SIZE" => Some(ChallengeType::CollectionSize),
            _ => None,
        }
    }
}

/// Period a challenge is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengePeriod {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Anytime,
}

impl ChallengePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengePeriod::Weekly => "WEEKLY",
            ChallengePeriod::Monthly => "MONTHLY",
            ChallengePeriod::Quarterly => "QUARTERLY",
            ChallengePeriod::Yearly => "YEARLY",
            ChallengePeriod::Anytime => "ANYTIME",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "WEEKLY" => Some(ChallengePeriod::Weekly),
            "MONTHLY" => Some(ChallengePeriod::Monthly),
            "QUARTERLY" => Some(ChallengePeriod::Quarterly),
            "YEARLY" => Some(ChallengePeriod::Yearly),
            "ANYTIME" => Some(ChallengePeriod::Anytime),
            _ => None,
        }
    }

    /// Date window for this period relative to `now`.
    ///
    /// Weekly is the trailing 7 days, monthly/quarterly the trailing 1/3
    /// calendar months, yearly runs from January 1 of the current year, and
    /// anytime is unbounded.
    pub fn window(&self, now: DateTime<Utc>) -> ChallengeWindow {
        let start = match self {
            ChallengePeriod::Weekly => Some(now - Duration::days(7)),
            ChallengePeriod::Monthly => now.checked_sub_months(Months::new(1)),
            ChallengePeriod::Quarterly => now.checked_sub_months(Months::new(3)),
            ChallengePeriod::Yearly => Utc
                .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
                .single(),
            ChallengePeriod::Anytime => None,
        };

        ChallengeWindow { start, end: None }
    }
}

/// The date range progress is computed over. `None` bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChallengeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ChallengeWindow {
    /// An unbounded window.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether `at` falls inside the window (bounds inclusive).
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map(|s| at >= s).unwrap_or(true) && self.end.map(|e| at <= e).unwrap_or(true)
    }
}

/// A reusable challenge definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeTemplate {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub challenge_type: ChallengeType,
    /// Progress value at which the challenge completes (always positive)
    pub target: u32,
    pub period: ChallengePeriod,
    pub icon: String,
    /// Restrict book counting to a genre (substring match, case-insensitive)
    pub genre_filter: Option<String>,
    pub is_predefined: bool,
    /// Creating user for custom templates; None for predefined ones
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ChallengeTemplate {
    /// Create a custom template owned by a user.
    pub fn new_custom(
        created_by: Uuid,
        title: String,
        description: String,
        challenge_type: ChallengeType,
        target: u32,
        period: ChallengePeriod,
        icon: String,
        genre_filter: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            challenge_type,
            target,
            period,
            icon,
            genre_filter,
            is_predefined: false,
            created_by: Some(created_by),
            created_at: Utc::now(),
        }
    }

    /// Genre restriction in effect for book counting.
    ///
    /// The structured `genre_filter` field wins; older templates without one
    /// fall back to sniffing "roman"/"bd" tokens out of the title, which is
    /// how the filter used to be expressed.
    pub fn effective_genre_filter(&self) -> Option<String> {
        if let Some(filter) = &self.genre_filter {
            return Some(filter.to_lowercase());
        }

        let title = self.title.to_lowercase();
        if title.contains("roman") {
            Some("roman".to_string())
        } else if title.contains("bd") {
            Some("bd".to_string())
        } else {
            None
        }
    }
}

/// State of an enrollment.
///
/// A single tagged state; paused-and-completed and similar contradictory
/// flag combinations are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Progress is being tracked
    Active,
    /// Temporarily on hold; progress still recomputes
    Paused,
    /// Target reached; terminal except via relaunch
    Completed,
    /// Soft-deleted, excluded from active views
    Archived,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Paused => "paused",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EnrollmentStatus::Active),
            "paused" => Some(EnrollmentStatus::Paused),
            "completed" => Some(EnrollmentStatus::Completed),
            "archived" => Some(EnrollmentStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One user's pursuit of a challenge template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeEnrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: Uuid,
    /// Cached total progress (computed + manual) as of the last refresh
    pub progress: i64,
    /// User-entered offset added to computed progress
    pub manual_progress: i64,
    pub status: EnrollmentStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    /// Window override; set to the join time by default so pre-existing
    /// history does not complete a challenge instantly
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ChallengeEnrollment {
    /// The window progress is computed over: the enrollment's own dates when
    /// present, otherwise the template's period relative to `now`.
    pub fn window(&self, template: &ChallengeTemplate, now: DateTime<Utc>) -> ChallengeWindow {
        if self.start_date.is_some() || self.end_date.is_some() {
            ChallengeWindow {
                start: self.start_date,
                end: self.end_date,
            }
        } else {
            template.period.window(now)
        }
    }

    /// Whether this enrollment has reached its terminal completed state.
    pub fn is_completed(&self) -> bool {
        self.status == EnrollmentStatus::Completed
    }
}
