use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Setup,
    InProgress,
    Completed,
}

impl SessionStatus {
    /// The lifecycle only moves forward, one step at a time.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Setup, SessionStatus::InProgress)
                | (SessionStatus::InProgress, SessionStatus::Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "entry" => Some(Self::Entry),
            "mid" => Some(Self::Mid),
            "senior" => Some(Self::Senior),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Mid => "mid",
            Self::Senior => "senior",
        }
    }
}

/// One mock interview: the candidate profile it was set up with, the question
/// budget, and where the candidate currently is in it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InterviewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub job_role: String,
    pub experience_level: ExperienceLevel,
    pub job_description: String,
    pub resume_ref: Option<String>,
    pub total_questions: i32,
    pub live_coding: bool,
    pub current_question: i32,
    pub status: SessionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
}

/// Insert parameters for a freshly validated session.
#[derive(Debug)]
pub struct NewSession {
    pub user_id: Uuid,
    pub title: String,
    pub job_role: String,
    pub experience_level: ExperienceLevel,
    pub job_description: String,
    pub resume_ref: Option<String>,
    pub total_questions: i32,
    pub live_coding: bool,
}

const COLUMNS: &str = "id, user_id, title, job_role, experience_level, job_description, \
                       resume_ref, total_questions, live_coding, current_question, status, \
                       created_at, started_at";

impl InterviewSession {
    pub async fn create(db: &PgPool, new: &NewSession) -> anyhow::Result<InterviewSession> {
        let row = sqlx::query_as::<_, InterviewSession>(&format!(
            r#"
            INSERT INTO interview_sessions
                (user_id, title, job_role, experience_level, job_description,
                 resume_ref, total_questions, live_coding)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.job_role)
        .bind(new.experience_level)
        .bind(&new.job_description)
        .bind(&new.resume_ref)
        .bind(new.total_questions)
        .bind(new.live_coding)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Owner-scoped lookup: another user's session id behaves like a missing
    /// one, so existence never leaks across accounts.
    pub async fn find_for_user(
        db: &PgPool,
        session_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<InterviewSession>> {
        let row = sqlx::query_as::<_, InterviewSession>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM interview_sessions
            WHERE id = $1 AND user_id = $2
            "#,
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list_for_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<InterviewSession>> {
        let rows = sqlx::query_as::<_, InterviewSession>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM interview_sessions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn set_status(
        db: &PgPool,
        session_id: Uuid,
        status: SessionStatus,
    ) -> anyhow::Result<InterviewSession> {
        let row = sqlx::query_as::<_, InterviewSession>(&format!(
            r#"
            UPDATE interview_sessions
            SET status = $2
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(session_id)
        .bind(status)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// The `setup -> in_progress` write performed when question generation
    /// succeeds; also stamps when the interview actually began.
    pub async fn mark_started(db: &PgPool, session_id: Uuid) -> anyhow::Result<InterviewSession> {
        let row = sqlx::query_as::<_, InterviewSession>(&format!(
            r#"
            UPDATE interview_sessions
            SET status = 'in_progress', started_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(session_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Mirrors the bound in `advance`'s WHERE clause: the pointer may move
    /// onto the last slot but never past it.
    pub fn can_advance(&self) -> bool {
        self.current_question < self.total_questions
    }

    /// Move the question pointer forward. Returns `None` when the session is
    /// already at its last slot; the bound lives in the statement itself so
    /// concurrent advances cannot overshoot.
    pub async fn advance(
        db: &PgPool,
        session_id: Uuid,
    ) -> anyhow::Result<Option<InterviewSession>> {
        let row = sqlx::query_as::<_, InterviewSession>(&format!(
            r#"
            UPDATE interview_sessions
            SET current_question = current_question + 1
            WHERE id = $1 AND current_question < total_questions
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(session_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(current: i32, total: i32) -> InterviewSession {
        InterviewSession {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            title: "Backend screen".into(),
            job_role: "Backend Developer".into(),
            experience_level: ExperienceLevel::Mid,
            job_description: String::new(),
            resume_ref: None,
            total_questions: total,
            live_coding: false,
            current_question: current,
            status: SessionStatus::InProgress,
            created_at: OffsetDateTime::UNIX_EPOCH,
            started_at: None,
        }
    }

    #[test]
    fn advance_is_bounded_by_the_question_budget() {
        assert!(session_at(0, 3).can_advance());
        assert!(session_at(2, 3).can_advance()); // moving onto the last slot
        assert!(!session_at(3, 3).can_advance()); // already there
        assert!(!session_at(4, 3).can_advance()); // never past it, whatever the row says
    }

    #[test]
    fn status_machine_moves_forward_only() {
        use SessionStatus::*;
        assert!(Setup.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));

        assert!(!Setup.can_transition_to(Completed)); // no skipping
        assert!(!InProgress.can_transition_to(Setup));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Setup));

        // same-state is not a transition; handlers treat it as a no-op
        assert!(!Setup.can_transition_to(Setup));
        assert!(!InProgress.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Completed));
    }

    #[test]
    fn status_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::from_str::<SessionStatus>("\"completed\"").unwrap(),
            SessionStatus::Completed
        );
    }

    #[test]
    fn experience_level_parsing() {
        assert_eq!(ExperienceLevel::parse("senior"), Some(ExperienceLevel::Senior));
        assert_eq!(ExperienceLevel::parse("  Mid  "), Some(ExperienceLevel::Mid));
        assert_eq!(ExperienceLevel::parse("ENTRY"), Some(ExperienceLevel::Entry));
        assert_eq!(ExperienceLevel::parse("principal"), None);
        assert_eq!(ExperienceLevel::parse(""), None);
        assert_eq!(ExperienceLevel::Senior.as_str(), "senior");
    }
}
