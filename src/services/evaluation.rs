//! Grading of a student session.
//!
//! The LLM proposes a grade per question; the numbers it reports are
//! reconciled into the fixed score contract (anchor 50/75/100 plus an
//! adjustment in [-5, 5], clamped to [0, 100]) rather than trusted verbatim.
//! The resulting evaluation is write-once per session.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use ulid::Ulid;

use crate::db::models::EvaluationRow;
use crate::db::Db;
use crate::error::{Error, Result};
use crate::llm::{extract_json, LanguageModel};
use crate::models::{Level, Question, QuestionReport};
use crate::prompts;

/// Upper bound on concurrent grading calls, to stay inside provider rate
/// limits.
const GRADING_CONCURRENCY: usize = 4;

pub struct EvaluationService {
    db: Db,
    llm: Arc<dyn LanguageModel>,
}

impl EvaluationService {
    pub fn new(db: Db, llm: Arc<dyn LanguageModel>) -> Self {
        Self { db, llm }
    }

    /// Grade every answered question of the session and persist one
    /// evaluation. Idempotent: if the session is already evaluated the
    /// stored evaluation id is returned and the provider is not called.
    pub async fn evaluate(&self, session_id: &str) -> Result<String> {
        if let Some(existing) = self.db.evaluation_for_session(session_id).await? {
            return Ok(existing.id);
        }

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
        let responses = self.db.responses_for_session(session_id).await?;

        // Questions without usable references are skipped from scoring,
        // not treated as failures.
        let jobs: Vec<(&Question, &str)> = responses
            .iter()
            .filter_map(|r| {
                let question = topic.questions.iter().find(|q| q.id == r.question_id)?;
                if question.answers.iter().all(|a| a.text.trim().is_empty()) {
                    tracing::warn!(
                        "question {} has no usable references, skipping",
                        question.id
                    );
                    return None;
                }
                Some((question, r.answer.as_str()))
            })
            .collect();

        let graded: Vec<Option<QuestionReport>> = stream::iter(jobs)
            .map(|(question, answer)| self.grade_question(question, answer))
            .buffered(GRADING_CONCURRENCY)
            .collect()
            .await;
        let reports: Vec<QuestionReport> = graded.into_iter().flatten().collect();

        let scores: Vec<i32> = reports.iter().map(|r| r.score).collect();
        let total = aggregate_score(&scores);

        let payload = json!({
            "sessionId": session_id,
            "overallScore": total,
            "perQuestion": reports,
        });

        self.db
            .insert_evaluation(
                &Ulid::new().to_string(),
                session_id,
                total,
                &payload.to_string(),
            )
            .await
    }

    /// One grading round trip. A provider failure skips the question; a
    /// malformed grading payload falls back to deterministic reconciliation.
    async fn grade_question(&self, question: &Question, answer: &str) -> Option<QuestionReport> {
        let prompt = prompts::evaluation(&question.text, answer, &question.answers, "English");

        let raw = match self.llm.complete(&prompt, true).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("grading call failed for question {}: {e}", question.id);
                return None;
            }
        };

        let parsed: Value = extract_json(&raw)
            .and_then(|p| serde_json::from_str(p).ok())
            .unwrap_or(Value::Null);

        Some(build_report(&question.id, &parsed))
    }

    pub async fn get_evaluation(&self, evaluation_id: &str) -> Result<Option<EvaluationRow>> {
        self.db.get_evaluation(evaluation_id).await
    }

    pub async fn report_by_session(&self, session_id: &str) -> Result<Option<String>> {
        self.db.report_by_session(session_id).await
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Reconciled {
    pub match_level: String,
    pub base: i32,
    pub adjustment: i32,
    pub score: i32,
}

/// Resolve the grading numbers from the untrusted payload.
///
/// Precedence: a recognised `match_level` sets the anchor; a numeric `base`
/// within 2 of an anchor overrides it; failing both, the raw `score`
/// (default 60) picks the nearest anchor and the adjustment is derived from
/// the remainder. The adjustment always clamps to [-5, 5] and the final
/// score to [0, 100].
pub(crate) fn reconcile(el: &Value) -> Reconciled {
    let mut base = 0;
    let mut adjustment = 0;

    let label = el
        .get("match_level")
        .and_then(Value::as_str)
        .map(str::to_lowercase);
    if let Some(level) = label.as_deref().and_then(Level::from_label) {
        base = level.anchor_score();
    }

    if let Some(b) = el.get("base").and_then(num_i32) {
        if (b - 50).abs() <= 2 {
            base = 50;
        } else if (b - 75).abs() <= 2 {
            base = 75;
        } else if (b - 100).abs() <= 2 {
            base = 100;
        }
    }

    if let Some(a) = el.get("adjustment").and_then(num_i32) {
        adjustment = a.clamp(-5, 5);
    }

    let mut fallback = el.get("score").and_then(score_i32).unwrap_or(0);

    if base == 0 {
        if fallback == 0 {
            fallback = 60;
        }
        base = [50, 75, 100]
            .into_iter()
            .min_by_key(|anchor| (fallback - anchor).abs())
            .unwrap_or(50);
        adjustment = (fallback - base).clamp(-5, 5);
    }

    let score = (base + adjustment).clamp(0, 100);

    let match_level = label
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| label_for_base(base).to_owned());

    Reconciled {
        match_level,
        base,
        adjustment,
        score,
    }
}

fn build_report(question_id: &str, el: &Value) -> QuestionReport {
    let r = reconcile(el);

    QuestionReport {
        question_id: question_id.to_owned(),
        match_level: r.match_level,
        base: r.base,
        adjustment: r.adjustment,
        score: r.score,
        rationale: str_field(el, "rationale"),
        strengths: str_list(el, "strengths"),
        recommendations: str_list(el, "recommendations"),
        advice: str_field(el, "advice"),
    }
}

/// Mean of the per-question final scores, rounded to 2 decimal places away
/// from zero on ties. Zero graded questions score 0.
pub(crate) fn aggregate_score(scores: &[i32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64;
    (mean * 100.0).round() / 100.0
}

fn num_i32(v: &Value) -> Option<i32> {
    if let Some(i) = v.as_i64() {
        return Some(i as i32);
    }
    v.as_f64().map(|f| f.round() as i32)
}

fn score_i32(v: &Value) -> Option<i32> {
    num_i32(v).or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn label_for_base(base: i32) -> &'static str {
    match base {
        50 => "low",
        75 => "medium",
        _ => "high",
    }
}

fn str_field(el: &Value, key: &str) -> String {
    el.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn str_list(el: &Value, key: &str) -> Vec<String> {
    el.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
