//! Achievement badge types and the static rule table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Badge category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeCategory {
    /// Finished-book milestones
    Reading,
    /// Total-page milestones
    Pages,
    /// Consecutive-day streak milestones
    Streak,
    /// Reviews and quotes
    Social,
    /// Completed-challenge milestones
    Challenge,
    /// Named one-off achievements
    Special,
}

impl BadgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeCategory::Reading => "READING",
            BadgeCategory::Pages => "PAGES",
            BadgeCategory::Streak => "STREAK",
            BadgeCategory::Social => "SOCIAL",
            BadgeCategory::Challenge => "CHALLENGE",
            BadgeCategory::Special => "SPECIAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "READING" => Some(BadgeCategory::Reading),
            "PAGES" => Some(BadgeCategory::Pages),
            "STREAK" => Some(BadgeCategory::Streak),
            "SOCIAL" => Some(BadgeCategory::Social),
            "CHALLENGE" => Some(BadgeCategory::Challenge),
            "SPECIAL" => Some(BadgeCategory::Special),
            _ => None,
        }
    }
}

/// An unlocked achievement, owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub unlocked_at: DateTime<Utc>,
}

/// A static unlock rule. Configuration, not entity data.
#[derive(Debug, Clone, Copy)]
pub struct BadgeRule {
    /// Stable rule key; SOCIAL rules are dispatched on its prefix and
    /// CHALLENGE/SPECIAL rules on the full key
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: BadgeCategory,
    /// Threshold for counting rules; None for named predicates
    pub target: Option<u32>,
}

/// The full badge rule table.
pub fn badge_rules() -> Vec<BadgeRule> {
    vec![
        // READING: finished-book milestones
        BadgeRule {
            id: "books_1",
            name: "First Chapter",
            description: "Finish your first book",
            icon: "📕",
            category: BadgeCategory::Reading,
            target: Some(1),
        },
        BadgeRule {
            id: "books_10",
            name: "Bookworm",
            description: "Finish 10 books",
            icon: "🐛",
            category: BadgeCategory::Reading,
            target: Some(10),
        },
        BadgeRule {
            id: "books_25",
            name: "Bibliophile",
            description: "Finish 25 books",
            icon: "📚",
            category: BadgeCategory::Reading,
            target: Some(25),
        },
        BadgeRule {
            id: "books_50",
            name: "Shelf Conqueror",
            description: "Finish 50 books",
            icon: "🏆",
            category: BadgeCategory::Reading,
            target: Some(50),
        },
        BadgeRule {
            id: "books_100",
            name: "Century of Stories",
            description: "Finish 100 books",
            icon: "👑",
            category: BadgeCategory::Reading,
            target: Some(100),
        },
        // PAGES: total-page milestones
        BadgeRule {
            id: "pages_1000",
            name: "Page Turner",
            description: "Read 1,000 pages",
            icon: "📄",
            category: BadgeCategory::Pages,
            target: Some(1_000),
        },
        BadgeRule {
            id: "pages_5000",
            name: "Paper Mountain",
            description: "Read 5,000 pages",
            icon: "⛰️",
            category: BadgeCategory::Pages,
            target: Some(5_000),
        },
        BadgeRule {
            id: "pages_10000",
            name: "Ink Devourer",
            description: "Read 10,000 pages",
            icon: "🖋️",
            category: BadgeCategory::Pages,
            target: Some(10_000),
        },
        BadgeRule {
            id: "pages_25000",
            name: "The Long Haul",
            description: "Read 25,000 pages",
            icon: "🚂",
            category: BadgeCategory::Pages,
            target: Some(25_000),
        },
        // STREAK: consecutive reading days
        BadgeRule {
            id: "streak_3",
            name: "Warming Up",
            description: "Read 3 days in a row",
            icon: "✨",
            category: BadgeCategory::Streak,
            target: Some(3),
        },
        BadgeRule {
            id: "streak_7",
            name: "Week of Words",
            description: "Read 7 days in a row",
            icon: "📅",
            category: BadgeCategory::Streak,
            target: Some(7),
        },
        BadgeRule {
            id: "streak_30",
            name: "Month of Pages",
            description: "Read 30 days in a row",
            icon: "🌟",
            category: BadgeCategory::Streak,
            target: Some(30),
        },
        // SOCIAL: reviews and quotes, dispatched on id prefix
        BadgeRule {
            id: "review_1",
            name: "First Impressions",
            description: "Write your first review",
            icon: "📝",
            category: BadgeCategory::Social,
            target: Some(1),
        },
        BadgeRule {
            id: "review_10",
            name: "Seasoned Critic",
            description: "Write 10 reviews",
            icon: "🧐",
            category: BadgeCategory::Social,
            target: Some(10),
        },
        BadgeRule {
            id: "quote_1",
            name: "Quote Collector",
            description: "Save your first quote",
            icon: "💬",
            category: BadgeCategory::Social,
            target: Some(1),
        },
        BadgeRule {
            id: "quote_50",
            name: "Anthologist",
            description: "Save 50 quotes",
            icon: "🗂️",
            category: BadgeCategory::Social,
            target: Some(50),
        },
        // CHALLENGE: completed-enrollment milestones
        BadgeRule {
            id: "challenge_1",
            name: "Challenger",
            description: "Complete your first challenge",
            icon: "🎯",
            category: BadgeCategory::Challenge,
            target: Some(1),
        },
        BadgeRule {
            id: "challenge_5",
            name: "Serial Achiever",
            description: "Complete 5 challenges",
            icon: "🥇",
            category: BadgeCategory::Challenge,
            target: Some(5),
        },
        BadgeRule {
            id: "challenge_all",
            name: "Completionist",
            description: "Complete every official challenge",
            icon: "💎",
            category: BadgeCategory::Challenge,
            target: None,
        },
        // SPECIAL: named predicates
        BadgeRule {
            id: "genre_explorer",
            name: "Eclectic Reader",
            description: "Finish books in 5 different genres",
            icon: "🧭",
            category: BadgeCategory::Special,
            target: None,
        },
        BadgeRule {
            id: "long_book",
            name: "Marathon Read",
            description: "Finish a book of 500 pages or more",
            icon: "🏔️",
            category: BadgeCategory::Special,
            target: None,
        },
        BadgeRule {
            id: "template_author",
            name: "Challenge Architect",
            description: "Create your own challenge",
            icon: "🛠️",
            category: BadgeCategory::Special,
            target: None,
        },
        BadgeRule {
            id: "author_fan",
            name: "Devoted Fan",
            description: "Finish 3 books by the same author",
            icon: "❤️",
            category: BadgeCategory::Special,
            target: None,
        },
        BadgeRule {
            id: "speed_reader",
            name: "Speed Reader",
            description: "Finish a book within 3 days of starting it",
            icon: "⚡",
            category: BadgeCategory::Special,
            target: None,
        },
    ]
}
