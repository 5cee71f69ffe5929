//! Session lifecycle: idempotent creation and answer submission.

use chrono::Utc;
use ulid::Ulid;

use crate::db::Db;
use crate::error::{Error, Result};
use crate::models::{AnswerSubmission, MAX_ANSWER_LEN};

pub struct SessionService {
    db: Db,
}

impl SessionService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a session for the (topic, student) pair, or return the id of
    /// the existing one. Never produces a duplicate.
    pub async fn create_session(&self, topic_id: &str, student_id: &str) -> Result<String> {
        if student_id.trim().is_empty() {
            return Err(Error::Validation("student id must not be empty".into()));
        }
        if !self.db.topic_exists(topic_id).await? {
            return Err(Error::NotFound("topic"));
        }

        self.db
            .find_or_create_session(
                &Ulid::new().to_string(),
                topic_id,
                student_id,
                &Utc::now().to_rfc3339(),
            )
            .await
    }

    /// Record the submitted answers, replacing any earlier response to the
    /// same question. All submissions land in one transaction.
    pub async fn submit_answers(
        &self,
        session_id: &str,
        answers: &[AnswerSubmission],
    ) -> Result<()> {
        let session = self
            .db
            .get_session(session_id)
            .await?
            .ok_or(Error::NotFound("session"))?;
        let topic = self
            .db
            .get_topic(&session.topic_id)
            .await?
            .ok_or(Error::NotFound("topic"))?;

        for submission in answers {
            if submission.answer.chars().count() > MAX_ANSWER_LEN {
                return Err(Error::Validation(format!(
                    "answer for question {} exceeds {MAX_ANSWER_LEN} characters",
                    submission.question_id
                )));
            }
            if !topic.questions.iter().any(|q| q.id == submission.question_id) {
                return Err(Error::Validation(format!(
                    "question {} does not belong to the session's topic",
                    submission.question_id
                )));
            }
        }

        let entries: Vec<(String, AnswerSubmission)> = answers
            .iter()
            .map(|a| (Ulid::new().to_string(), a.clone()))
            .collect();

        self.db.upsert_responses(session_id, &entries).await
    }
}
