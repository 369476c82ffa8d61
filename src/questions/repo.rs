use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::ai::GeneratedQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Technical,
    Behavioral,
    LiveCoding,
}

/// One question slot of an interview, including everything recorded against it
/// (answer files, follow-up, evaluation). `evaluating` is an internal guard
/// flag and never leaves the API.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InterviewQuestion {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_text: String,
    pub kind: QuestionKind,
    pub tips: Json<Vec<String>>,
    pub time_limit_secs: i32,
    pub order_index: i32,
    pub first_answer_ref: Option<String>,
    pub followup_question: Option<String>,
    pub followup_answer_ref: Option<String>,
    pub ai_feedback: Option<String>,
    pub score: Option<i32>,
    #[serde(skip_serializing)]
    pub evaluating: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, session_id, question_text, kind, tips, time_limit_secs, order_index, \
                       first_answer_ref, followup_question, followup_answer_ref, ai_feedback, \
                       score, evaluating, created_at, updated_at";

/// An evaluation claim is stamped through `updated_at`; one that has not moved
/// for this long belongs to a process that died mid-evaluation and may be
/// taken over.
pub const STALE_CLAIM_AFTER: Duration = Duration::minutes(30);

impl InterviewQuestion {
    /// Persist a generated batch atomically. Either the whole set lands or
    /// none of it does, so a half-written interview can never be served.
    pub async fn insert_batch(
        db: &PgPool,
        session_id: Uuid,
        generated: &[GeneratedQuestion],
    ) -> anyhow::Result<Vec<InterviewQuestion>> {
        let mut tx: Transaction<'_, Postgres> = db.begin().await?;
        let mut inserted = Vec::with_capacity(generated.len());
        for q in generated {
            let row = sqlx::query_as::<_, InterviewQuestion>(&format!(
                r#"
                INSERT INTO interview_questions
                    (session_id, question_text, kind, tips, time_limit_secs, order_index)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {COLUMNS}
                "#,
            ))
            .bind(session_id)
            .bind(&q.text)
            .bind(q.kind)
            .bind(Json(&q.tips))
            .bind(q.time_limit_or_default())
            .bind(q.order_index)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Load a question scoped to its session, so a question id from another
    /// interview behaves exactly like a missing one.
    pub async fn find_in_session(
        db: &PgPool,
        session_id: Uuid,
        question_id: Uuid,
    ) -> anyhow::Result<Option<InterviewQuestion>> {
        let row = sqlx::query_as::<_, InterviewQuestion>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM interview_questions
            WHERE id = $1 AND session_id = $2
            "#,
        ))
        .bind(question_id)
        .bind(session_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(
        db: &PgPool,
        question_id: Uuid,
    ) -> anyhow::Result<Option<InterviewQuestion>> {
        let row = sqlx::query_as::<_, InterviewQuestion>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM interview_questions
            WHERE id = $1
            "#,
        ))
        .bind(question_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list_for_session(
        db: &PgPool,
        session_id: Uuid,
    ) -> anyhow::Result<Vec<InterviewQuestion>> {
        let rows = sqlx::query_as::<_, InterviewQuestion>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM interview_questions
            WHERE session_id = $1
            ORDER BY order_index ASC
            "#,
        ))
        .bind(session_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Record a fresh first answer. Any follow-up produced for the previous
    /// take is cleared in the same statement, so stale follow-up text can
    /// never be paired with a new recording.
    pub async fn set_first_answer(
        db: &PgPool,
        question_id: Uuid,
        answer_ref: &str,
    ) -> anyhow::Result<InterviewQuestion> {
        let row = sqlx::query_as::<_, InterviewQuestion>(&format!(
            r#"
            UPDATE interview_questions
            SET first_answer_ref = $2,
                followup_question = NULL,
                followup_answer_ref = NULL,
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(question_id)
        .bind(answer_ref)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn set_followup_question(
        db: &PgPool,
        question_id: Uuid,
        followup: &str,
    ) -> anyhow::Result<InterviewQuestion> {
        let row = sqlx::query_as::<_, InterviewQuestion>(&format!(
            r#"
            UPDATE interview_questions
            SET followup_question = $2,
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(question_id)
        .bind(followup)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn set_followup_answer(
        db: &PgPool,
        question_id: Uuid,
        answer_ref: &str,
    ) -> anyhow::Result<InterviewQuestion> {
        let row = sqlx::query_as::<_, InterviewQuestion>(&format!(
            r#"
            UPDATE interview_questions
            SET followup_answer_ref = $2,
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(question_id)
        .bind(answer_ref)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Once a score exists the recorded answers are part of the result; the
    /// save endpoints refuse new takes for the question.
    pub fn is_evaluated(&self) -> bool {
        self.score.is_some()
    }

    /// Claim-state read, mirroring `try_begin_evaluation`'s WHERE clause: the
    /// claim is free, or old enough to count as abandoned.
    pub fn can_begin_evaluation(&self, now: OffsetDateTime) -> bool {
        !self.evaluating || now - self.updated_at > STALE_CLAIM_AFTER
    }

    /// Claim the question for evaluation. Returns false when another
    /// evaluation round-trip already holds the claim; callers turn that into
    /// a conflict instead of racing on the stored score. A claim older than
    /// `STALE_CLAIM_AFTER` is taken over.
    pub async fn try_begin_evaluation(db: &PgPool, question_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE interview_questions
            SET evaluating = TRUE, updated_at = now()
            WHERE id = $1
              AND (evaluating = FALSE
                   OR updated_at < now() - interval '{} minutes')
            "#,
            STALE_CLAIM_AFTER.whole_minutes()
        ))
        .bind(question_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Drop the evaluation claim without recording a result. Used on every
    /// failure path after a successful claim.
    pub async fn release_evaluation(db: &PgPool, question_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE interview_questions
            SET evaluating = FALSE, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Persist the evaluation result and release the claim in one statement.
    pub async fn save_evaluation(
        db: &PgPool,
        question_id: Uuid,
        score: i32,
        feedback: &str,
    ) -> anyhow::Result<InterviewQuestion> {
        let row = sqlx::query_as::<_, InterviewQuestion>(&format!(
            r#"
            UPDATE interview_questions
            SET score = $2,
                ai_feedback = $3,
                evaluating = FALSE,
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(question_id)
        .bind(score)
        .bind(feedback)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> InterviewQuestion {
        InterviewQuestion {
            id: Uuid::nil(),
            session_id: Uuid::nil(),
            question_text: "Q".into(),
            kind: QuestionKind::Technical,
            tips: Json(vec!["tip".into()]),
            time_limit_secs: 120,
            order_index: 1,
            first_answer_ref: None,
            followup_question: None,
            followup_answer_ref: None,
            ai_feedback: None,
            score: None,
            evaluating: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&QuestionKind::LiveCoding).unwrap(),
            "\"live_coding\""
        );
        assert_eq!(
            serde_json::from_str::<QuestionKind>("\"behavioral\"").unwrap(),
            QuestionKind::Behavioral
        );
    }

    #[test]
    fn serialized_question_hides_the_evaluation_guard() {
        let mut q = question();
        q.evaluating = true;
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("evaluating").is_none());
        assert_eq!(json["question_text"], "Q");
        assert_eq!(json["tips"][0], "tip");
    }

    #[test]
    fn a_live_claim_blocks_until_stale() {
        let now = OffsetDateTime::now_utc();
        let mut q = question();
        assert!(q.can_begin_evaluation(now)); // unclaimed

        q.evaluating = true;
        q.updated_at = now - Duration::minutes(1);
        assert!(!q.can_begin_evaluation(now)); // held by a live round-trip

        q.updated_at = now - STALE_CLAIM_AFTER;
        assert!(!q.can_begin_evaluation(now)); // the threshold itself still counts as held

        q.updated_at = now - STALE_CLAIM_AFTER - Duration::seconds(1);
        assert!(q.can_begin_evaluation(now)); // abandoned by a dead process
    }

    #[test]
    fn a_score_closes_the_question_to_new_takes() {
        let mut q = question();
        assert!(!q.is_evaluated());
        q.score = Some(7);
        assert!(q.is_evaluated());
    }
}
