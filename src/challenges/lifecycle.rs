//! Challenge lifecycle management.
//!
//! Owns enrollment state: joining a template, refreshing progress,
//! completion, pause/resume, archive, and relaunch. Completion is sticky:
//! once an enrollment reaches its target it stays completed until the user
//! relaunches it, even if recomputed progress later drops below the target.

use chrono::{DateTime, Utc};
use rusqlite::params;
use std::sync::Arc;
use uuid::Uuid;

use super::progress::ProgressCalculator;
use super::types::{
    ChallengeEnrollment, ChallengePeriod, ChallengeTemplate, ChallengeType, EnrollmentStatus,
};
use crate::badges::evaluator::BadgeEvaluator;
use crate::storage::database::{Database, DatabaseError};
use crate::storage::library_store::{parse_datetime, parse_optional_datetime};

/// Challenge lifecycle manager.
pub struct ChallengeManager {
    db: Arc<Database>,
    badges: BadgeEvaluator,
}

impl ChallengeManager {
    /// Create a new challenge manager.
    pub fn new(db: Arc<Database>) -> Self {
        let badges = BadgeEvaluator::new(db.clone());
        Self { db, badges }
    }

    // ========== Template Operations ==========

    /// Create a custom challenge template owned by a user.
    pub fn create_custom_template(
        &self,
        user_id: &Uuid,
        title: String,
        description: String,
        challenge_type: ChallengeType,
        target: u32,
        period: ChallengePeriod,
        icon: String,
        genre_filter: Option<String>,
    ) -> Result<ChallengeTemplate, ChallengeError> {
        if target == 0 {
            return Err(ChallengeError::InvalidTarget(target));
        }

        let template = ChallengeTemplate::new_custom(
            *user_id,
            title,
            description,
            challenge_type,
            target,
            period,
            icon,
            genre_filter,
        );

        self.db
            .connection()
            .execute(
                "INSERT INTO challenge_templates
                 (id, title, description, challenge_type, target, period, icon,
                  genre_filter, is_predefined, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    template.id.to_string(),
                    template.title,
                    template.description,
                    template.challenge_type.as_str(),
                    template.target,
                    template.period.as_str(),
                    template.icon,
                    template.genre_filter,
                    template.is_predefined,
                    template.created_by.map(|id| id.to_string()),
                    template.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        Ok(template)
    }

    /// Get a template by ID.
    pub fn get_template(&self, id: &Uuid) -> Result<ChallengeTemplate, ChallengeError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT id, title, description, challenge_type, target, period, icon,
                        genre_filter, is_predefined, created_by, created_at
                 FROM challenge_templates WHERE id = ?1",
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        let mut rows = stmt
            .query(params![id.to_string()])
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        if let Some(row) = rows
            .next()
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?
        {
            row_to_template(row).map_err(ChallengeError::from)
        } else {
            Err(ChallengeError::TemplateNotFound(*id))
        }
    }

    /// List all templates, predefined first.
    pub fn list_templates(&self) -> Result<Vec<ChallengeTemplate>, ChallengeError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT id, title, description, challenge_type, target, period, icon,
                        genre_filter, is_predefined, created_by, created_at
                 FROM challenge_templates
                 ORDER BY is_predefined DESC, created_at ASC",
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        let mut rows = stmt
            .query([])
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        let mut templates = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?
        {
            templates.push(row_to_template(row)?);
        }

        Ok(templates)
    }

    // ========== Enrollment Operations ==========

    /// Join a challenge.
    ///
    /// The enrollment window starts at the join time unless an override is
    /// given, so pre-existing reading history cannot complete the challenge
    /// on the first refresh.
    pub fn join(
        &self,
        user_id: &Uuid,
        template_id: &Uuid,
        start_override: Option<DateTime<Utc>>,
        end_override: Option<DateTime<Utc>>,
    ) -> Result<ChallengeEnrollment, ChallengeError> {
        self.get_template(template_id)?;

        let conn = self.db.connection();
        let mut check_stmt = conn
            .prepare(
                "SELECT id FROM challenge_enrollments WHERE user_id = ?1 AND template_id = ?2",
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        if check_stmt
            .exists(params![user_id.to_string(), template_id.to_string()])
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?
        {
            return Err(ChallengeError::AlreadyJoined);
        }

        let now = Utc::now();
        let enrollment = ChallengeEnrollment {
            id: Uuid::new_v4(),
            user_id: *user_id,
            template_id: *template_id,
            progress: 0,
            manual_progress: 0,
            status: EnrollmentStatus::Active,
            completed_at: None,
            started_at: now,
            start_date: Some(start_override.unwrap_or(now)),
            end_date: end_override,
        };

        conn.execute(
            "INSERT INTO challenge_enrollments
             (id, user_id, template_id, progress, manual_progress, status,
              completed_at, started_at, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                enrollment.id.to_string(),
                enrollment.user_id.to_string(),
                enrollment.template_id.to_string(),
                enrollment.progress,
                enrollment.manual_progress,
                enrollment.status.as_str(),
                Option::<String>::None,
                enrollment.started_at.to_rfc3339(),
                enrollment.start_date.map(|dt| dt.to_rfc3339()),
                enrollment.end_date.map(|dt| dt.to_rfc3339()),
            ],
        )
        .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        Ok(enrollment)
    }

    /// Get an enrollment by ID.
    pub fn get_enrollment(&self, id: &Uuid) -> Result<ChallengeEnrollment, ChallengeError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, template_id, progress, manual_progress, status,
                        completed_at, started_at, start_date, end_date
                 FROM challenge_enrollments WHERE id = ?1",
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        let mut rows = stmt
            .query(params![id.to_string()])
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        if let Some(row) = rows
            .next()
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?
        {
            row_to_enrollment(row).map_err(ChallengeError::from)
        } else {
            Err(ChallengeError::EnrollmentNotFound(*id))
        }
    }

    /// List a user's non-archived enrollments, newest first.
    ///
    /// A pure read; callers wanting fresh progress run `refresh_all` after
    /// activity-changing actions.
    pub fn list_enrollments(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ChallengeEnrollment>, ChallengeError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, template_id, progress, manual_progress, status,
                        completed_at, started_at, start_date, end_date
                 FROM challenge_enrollments
                 WHERE user_id = ?1 AND status != 'archived'
                 ORDER BY started_at DESC",
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        let mut rows = stmt
            .query(params![user_id.to_string()])
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        let mut enrollments = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?
        {
            enrollments.push(row_to_enrollment(row)?);
        }

        Ok(enrollments)
    }

    /// Recompute an enrollment's progress and handle the completion
    /// transition.
    ///
    /// Persists only when something actually changed. The transition into
    /// completed is a conditional update keyed on the current status, so of
    /// two concurrent refreshes only one stamps `completed_at` and triggers
    /// badge evaluation.
    pub fn refresh_progress(&self, id: &Uuid) -> Result<ChallengeEnrollment, ChallengeError> {
        let enrollment = self.get_enrollment(id)?;
        let template = self.get_template(&enrollment.template_id)?;
        let now = Utc::now();
        let window = enrollment.window(&template, now);

        let conn = self.db.connection();
        let calculator = ProgressCalculator::new(conn);
        let progress = calculator.compute(
            &enrollment.user_id,
            &template,
            &window,
            enrollment.manual_progress,
            now,
        );

        let reached_target = progress >= i64::from(template.target);

        if reached_target && enrollment.status == EnrollmentStatus::Active {
            let transitioned = conn
                .execute(
                    "UPDATE challenge_enrollments
                     SET status = 'completed', completed_at = ?2, progress = ?3
                     WHERE id = ?1 AND status = 'active'",
                    params![id.to_string(), now.to_rfc3339(), progress],
                )
                .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

            if transitioned == 1 {
                tracing::info!("Challenge '{}' completed", template.title);
                if let Err(e) = self.badges.check_and_award(&enrollment.user_id) {
                    tracing::warn!("Badge evaluation failed after completion: {}", e);
                }
            }
        } else if progress != enrollment.progress {
            conn.execute(
                "UPDATE challenge_enrollments SET progress = ?2 WHERE id = ?1",
                params![id.to_string(), progress],
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;
        }

        self.get_enrollment(id)
    }

    /// Add a user-entered offset to an enrollment's progress, then refresh.
    pub fn add_manual_progress(
        &self,
        id: &Uuid,
        delta: i64,
    ) -> Result<ChallengeEnrollment, ChallengeError> {
        let enrollment = self.get_enrollment(id)?;
        if enrollment.status == EnrollmentStatus::Archived {
            return Err(ChallengeError::InvalidTransition(
                "cannot add progress to an archived challenge".to_string(),
            ));
        }

        self.db
            .connection()
            .execute(
                "UPDATE challenge_enrollments
                 SET manual_progress = manual_progress + ?2 WHERE id = ?1",
                params![id.to_string(), delta],
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        self.refresh_progress(id)
    }

    /// Pause an active enrollment. Pausing a paused enrollment is a no-op.
    pub fn pause(&self, id: &Uuid) -> Result<ChallengeEnrollment, ChallengeError> {
        let enrollment = self.get_enrollment(id)?;
        match enrollment.status {
            EnrollmentStatus::Paused => Ok(enrollment),
            EnrollmentStatus::Active => {
                self.set_status(id, EnrollmentStatus::Paused)?;
                self.get_enrollment(id)
            }
            other => Err(ChallengeError::InvalidTransition(format!(
                "cannot pause a {} challenge",
                other
            ))),
        }
    }

    /// Resume a paused enrollment. Resuming an active enrollment is a no-op.
    pub fn resume(&self, id: &Uuid) -> Result<ChallengeEnrollment, ChallengeError> {
        let enrollment = self.get_enrollment(id)?;
        match enrollment.status {
            EnrollmentStatus::Active => Ok(enrollment),
            EnrollmentStatus::Paused => {
                self.set_status(id, EnrollmentStatus::Active)?;
                self.get_enrollment(id)
            }
            other => Err(ChallengeError::InvalidTransition(format!(
                "cannot resume a {} challenge",
                other
            ))),
        }
    }

    /// Archive an enrollment from any state. Re-archiving is a no-op.
    pub fn archive(&self, id: &Uuid) -> Result<ChallengeEnrollment, ChallengeError> {
        let enrollment = self.get_enrollment(id)?;
        if enrollment.status == EnrollmentStatus::Archived {
            return Ok(enrollment);
        }

        self.set_status(id, EnrollmentStatus::Archived)?;
        self.get_enrollment(id)
    }

    /// Relaunch a completed or archived enrollment.
    ///
    /// Progress, the manual offset and the completion stamp are cleared, and
    /// the window restarts at the relaunch time so old activity cannot
    /// immediately re-complete the challenge.
    pub fn relaunch(&self, id: &Uuid) -> Result<ChallengeEnrollment, ChallengeError> {
        let enrollment = self.get_enrollment(id)?;
        match enrollment.status {
            EnrollmentStatus::Completed | EnrollmentStatus::Archived => {
                let now = Utc::now();
                self.db
                    .connection()
                    .execute(
                        "UPDATE challenge_enrollments
                         SET progress = 0, manual_progress = 0, status = 'active',
                             completed_at = NULL, started_at = ?2, start_date = ?2,
                             end_date = NULL
                         WHERE id = ?1",
                        params![id.to_string(), now.to_rfc3339()],
                    )
                    .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;
                self.get_enrollment(id)
            }
            other => Err(ChallengeError::InvalidTransition(format!(
                "cannot relaunch a {} challenge",
                other
            ))),
        }
    }

    /// Refresh progress on every active or paused enrollment for a user.
    ///
    /// Called after activity-changing actions elsewhere in the application.
    /// A failure on one enrollment is logged and does not stop the rest.
    pub fn refresh_all(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ChallengeEnrollment>, ChallengeError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT id FROM challenge_enrollments
                 WHERE user_id = ?1 AND status IN ('active', 'paused')",
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;

        let ids: Vec<String> = stmt
            .query_map(params![user_id.to_string()], |row| row.get(0))
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        let mut refreshed = Vec::new();
        for id_str in ids {
            let id = Uuid::parse_str(&id_str)
                .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;
            match self.refresh_progress(&id) {
                Ok(enrollment) => refreshed.push(enrollment),
                Err(e) => tracing::warn!("Failed to refresh enrollment {}: {}", id, e),
            }
        }

        Ok(refreshed)
    }

    /// Set an enrollment's status.
    fn set_status(&self, id: &Uuid, status: EnrollmentStatus) -> Result<(), ChallengeError> {
        self.db
            .connection()
            .execute(
                "UPDATE challenge_enrollments SET status = ?2 WHERE id = ?1",
                params![id.to_string(), status.as_str()],
            )
            .map_err(|e| ChallengeError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

/// Parse a database row into a ChallengeTemplate.
pub(crate) fn row_to_template(row: &rusqlite::Row) -> Result<ChallengeTemplate, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let type_str: String = row
        .get(3)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let period_str: String = row
        .get(5)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let created_by_str: Option<String> = row
        .get(9)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let created_str: String = row
        .get(10)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    let challenge_type = ChallengeType::from_str(&type_str).ok_or_else(|| {
        DatabaseError::DeserializationError(format!("Unknown challenge type: {}", type_str))
    })?;
    let period = ChallengePeriod::from_str(&period_str).ok_or_else(|| {
        DatabaseError::DeserializationError(format!("Unknown period: {}", period_str))
    })?;

    Ok(ChallengeTemplate {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?,
        title: row
            .get(1)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        description: row
            .get(2)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        challenge_type,
        target: row
            .get(4)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        period,
        icon: row
            .get(6)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        genre_filter: row
            .get(7)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        is_predefined: row
            .get(8)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        created_by: created_by_str
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?,
        created_at: parse_datetime(&created_str)?,
    })
}

/// Parse a database row into a ChallengeEnrollment.
pub(crate) fn row_to_enrollment(
    row: &rusqlite::Row,
) -> Result<ChallengeEnrollment, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let user_id_str: String = row
        .get(1)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let template_id_str: String = row
        .get(2)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let status_str: String = row
        .get(5)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let completed_str: Option<String> = row
        .get(6)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let started_str: String = row
        .get(7)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let start_date_str: Option<String> = row
        .get(8)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
    let end_date_str: Option<String> = row
        .get(9)
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    let status = EnrollmentStatus::from_str(&status_str).ok_or_else(|| {
        DatabaseError::DeserializationError(format!("Unknown enrollment status: {}", status_str))
    })?;

    Ok(ChallengeEnrollment {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?,
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?,
        template_id: Uuid::parse_str(&template_id_str)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?,
        progress: row
            .get(3)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        manual_progress: row
            .get(4)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?,
        status,
        completed_at: parse_optional_datetime(completed_str)?,
        started_at: parse_datetime(&started_str)?,
        start_date: parse_optional_datetime(start_date_str)?,
        end_date: parse_optional_datetime(end_date_str)?,
    })
}

/// Challenge errors.
#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error("Challenge template not found: {0}")]
    TemplateNotFound(Uuid),

    #[error("Enrollment not found: {0}")]
    EnrollmentNotFound(Uuid),

    #[error("Already joined this challenge")]
    AlreadyJoined,

    #[error("Invalid target: {0}")]
    InvalidTarget(u32),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for ChallengeError {
    fn from(e: DatabaseError) -> Self {
        ChallengeError::DatabaseError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<Database>, ChallengeManager, Uuid) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let manager = ChallengeManager::new(db.clone());
        (db, manager, Uuid::new_v4())
    }

    fn quote_template(manager: &ChallengeManager, user_id: &Uuid, target: u32) -> ChallengeTemplate {
        manager
            .create_custom_template(
                user_id,
                "Quote Hunt".to_string(),
                String::new(),
                ChallengeType::QuoteCount,
                target,
                ChallengePeriod::Anytime,
                "💬".to_string(),
                None,
            )
            .unwrap()
    }

    #[test]
    fn test_join_rejects_duplicates() {
        let (_db, manager, user_id) = setup();
        let template = quote_template(&manager, &user_id, 5);

        manager.join(&user_id, &template.id, None, None).unwrap();
        let result = manager.join(&user_id, &template.id, None, None);
        assert!(matches!(result, Err(ChallengeError::AlreadyJoined)));
    }

    #[test]
    fn test_join_unknown_template() {
        let (_db, manager, user_id) = setup();
        let result = manager.join(&user_id, &Uuid::new_v4(), None, None);
        assert!(matches!(result, Err(ChallengeError::TemplateNotFound(_))));
    }

    #[test]
    fn test_create_template_rejects_zero_target() {
        let (_db, manager, user_id) = setup();
        let result = manager.create_custom_template(
            &user_id,
            "Bad".to_string(),
            String::new(),
            ChallengeType::BookCount,
            0,
            ChallengePeriod::Anytime,
            "📚".to_string(),
            None,
        );
        assert!(matches!(result, Err(ChallengeError::InvalidTarget(0))));
    }

    #[test]
    fn test_pause_resume_semantics() {
        let (_db, manager, user_id) = setup();
        let template = quote_template(&manager, &user_id, 5);
        let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

        let paused = manager.pause(&enrollment.id).unwrap();
        assert_eq!(paused.status, EnrollmentStatus::Paused);

        // Pausing again is a no-op, not an error
        let still_paused = manager.pause(&enrollment.id).unwrap();
        assert_eq!(still_paused.status, EnrollmentStatus::Paused);

        let resumed = manager.resume(&enrollment.id).unwrap();
        assert_eq!(resumed.status, EnrollmentStatus::Active);

        // Refresh is not gated by pause
        manager.pause(&enrollment.id).unwrap();
        let refreshed = manager.refresh_progress(&enrollment.id).unwrap();
        assert_eq!(refreshed.status, EnrollmentStatus::Paused);
    }

    #[test]
    fn test_archived_enrollment_rejects_manual_progress() {
        let (_db, manager, user_id) = setup();
        let template = quote_template(&manager, &user_id, 5);
        let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

        manager.archive(&enrollment.id).unwrap();
        let result = manager.add_manual_progress(&enrollment.id, 1);
        assert!(matches!(result, Err(ChallengeError::InvalidTransition(_))));
    }

    #[test]
    fn test_archived_excluded_from_listing() {
        let (_db, manager, user_id) = setup();
        let template = quote_template(&manager, &user_id, 5);
        let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

        assert_eq!(manager.list_enrollments(&user_id).unwrap().len(), 1);
        manager.archive(&enrollment.id).unwrap();
        assert!(manager.list_enrollments(&user_id).unwrap().is_empty());
    }

    #[test]
    fn test_completion_via_manual_progress() {
        let (_db, manager, user_id) = setup();
        let template = quote_template(&manager, &user_id, 3);
        let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

        let updated = manager.add_manual_progress(&enrollment.id, 3).unwrap();
        assert_eq!(updated.progress, 3);
        assert_eq!(updated.status, EnrollmentStatus::Completed);
        assert!(updated.completed_at.is_some());
    }

    #[test]
    fn test_relaunch_resets_enrollment() {
        let (_db, manager, user_id) = setup();
        let template = quote_template(&manager, &user_id, 3);
        let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

        manager.add_manual_progress(&enrollment.id, 3).unwrap();
        let relaunched = manager.relaunch(&enrollment.id).unwrap();

        assert_eq!(relaunched.status, EnrollmentStatus::Active);
        assert_eq!(relaunched.progress, 0);
        assert_eq!(relaunched.manual_progress, 0);
        assert!(relaunched.completed_at.is_none());

        // With no new activity the refreshed progress stays at zero
        let refreshed = manager.refresh_progress(&relaunched.id).unwrap();
        assert_eq!(refreshed.progress, 0);
        assert_eq!(refreshed.status, EnrollmentStatus::Active);
    }

    #[test]
    fn test_relaunch_requires_completed_or_archived() {
        let (_db, manager, user_id) = setup();
        let template = quote_template(&manager, &user_id, 3);
        let enrollment = manager.join(&user_id, &template.id, None, None).unwrap();

        let result = manager.relaunch(&enrollment.id);
        assert!(matches!(result, Err(ChallengeError::InvalidTransition(_))));
    }
}
