//! Reading challenge engine.
//!
//! Provides challenge templates and enrollments, period-bounded progress
//! computation, streak calculation, lifecycle transitions, and predefined
//! catalog reconciliation.

pub mod catalog;
pub mod lifecycle;
pub mod progress;
pub mod streaks;
pub mod types;

// Re-export commonly used types
pub use catalog::{predefined_templates, CatalogReconciler, ReconcileSummary, TemplateSeed};
pub use lifecycle::{ChallengeError, ChallengeManager};
pub use progress::ProgressCalculator;
pub use types::{
    ChallengeEnrollment, ChallengePeriod, ChallengeTemplate, ChallengeType, ChallengeWindow,
    EnrollmentStatus,
};
