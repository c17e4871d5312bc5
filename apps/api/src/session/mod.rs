//! Session orchestrator: explicit per-session state plus the operations that drive it.
//!
//! Flow per action: validate → build prompt → LlmGateway → parse → update state.
//! A failed action leaves the session exactly as it was.

pub mod handlers;
pub mod orchestrator;
pub mod store;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::interview::review::{build_review, EvaluationReview};
use crate::models::chat::ChatMessage;
use crate::models::interview::{EvaluationReport, InterviewQuestion};

/// Question/answer state machine. Chat runs independently of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    QuestionsGenerated,
    Answering,
    Evaluated,
}

/// Text extracted from the most recent successful résumé upload.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeContext {
    pub text: String,
    pub source_files: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// All state for one user session. Lives only in memory.
///
/// Invariant: `answers.len() == questions.len()`.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub phase: SessionPhase,
    pub job_role: Option<String>,
    pub questions: Vec<InterviewQuestion>,
    pub answers: Vec<String>,
    pub evaluation: Option<EvaluationReport>,
    pub resume: Option<ResumeContext>,
    pub transcript: Vec<ChatMessage>,
}

impl InterviewSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            phase: SessionPhase::Idle,
            job_role: None,
            questions: Vec::new(),
            answers: Vec::new(),
            evaluation: None,
            resume: None,
            transcript: Vec::new(),
        }
    }

    pub fn resume_text(&self) -> Option<&str> {
        self.resume.as_ref().map(|r| r.text.as_str())
    }

    pub fn question_texts(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.text.clone()).collect()
    }

    /// Evaluation paired with questions/answers and display defaults applied.
    pub fn review(&self) -> Option<EvaluationReview> {
        self.evaluation
            .as_ref()
            .map(|report| build_review(&self.questions, &self.answers, report))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            phase: self.phase,
            job_role: self.job_role.clone(),
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            evaluation: self.evaluation.clone(),
            review: self.review(),
            resume_files: self
                .resume
                .as_ref()
                .map(|r| r.source_files.clone())
                .unwrap_or_default(),
            has_resume: self.resume.is_some(),
            transcript_length: self.transcript.len(),
        }
    }
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a session returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub phase: SessionPhase,
    pub job_role: Option<String>,
    pub questions: Vec<InterviewQuestion>,
    pub answers: Vec<String>,
    pub evaluation: Option<EvaluationReport>,
    pub review: Option<EvaluationReview>,
    pub has_resume: bool,
    pub resume_files: Vec<String>,
    pub transcript_length: usize,
}
