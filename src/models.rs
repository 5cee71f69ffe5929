// Domain types shared by the services and the data layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Field length contracts, enforced before any network call.
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_QUESTION_LEN: usize = 4000;
pub const MAX_ANSWER_LEN: usize = 8000;
pub const MAX_DOCUMENT_LEN: usize = 10_000;
pub const MAX_SOURCE_LEN: usize = 512;

/// How many documents `retrieve` returns when the caller passes `k <= 0`.
pub const DEFAULT_RETRIEVE_K: usize = 4;

/// Calibration level of a reference answer. Each level carries a fixed
/// anchor score the grader starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn anchor_score(self) -> i32 {
        match self {
            Level::Low => 50,
            Level::Medium => 75,
            Level::High => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }

    pub fn from_label(label: &str) -> Option<Level> {
        match label.to_ascii_lowercase().as_str() {
            "low" => Some(Level::Low),
            "medium" => Some(Level::Medium),
            "high" => Some(Level::High),
            _ => None,
        }
    }

    /// The model is instructed, not guaranteed, to emit a known label.
    /// Unknown or missing labels fall back to `Low`.
    pub fn from_label_lenient(label: Option<&str>) -> Level {
        label.and_then(Level::from_label).unwrap_or(Level::Low)
    }

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Level> {
        match ordinal {
            0 => Some(Level::Low),
            1 => Some(Level::Medium),
            2 => Some(Level::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedAnswer {
    pub id: String,
    pub level: Level,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub answers: Vec<GeneratedAnswer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub created_utc: DateTime<Utc>,
    pub conspect: Option<String>,
    pub teacher_id: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RagDocument {
    pub id: String,
    pub source: Option<String>,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// One graded question inside an evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReport {
    #[serde(rename = "questionId")]
    pub question_id: String,
    pub match_level: String,
    pub base: i32,
    pub adjustment: i32,
    pub score: i32,
    pub rationale: String,
    pub strengths: Vec<String>,
    pub recommendations: Vec<String>,
    pub advice: String,
}
