//! Session operations. Each takes the session explicitly and mutates it only
//! after every fallible step has succeeded.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::parser::{parse_evaluation, parse_questions};
use crate::interview::prompts::{build_evaluation_prompt, build_question_prompt};
use crate::llm_client::prompts::with_resume_context;
use crate::llm_client::LlmGateway;
use crate::models::chat::ChatMessage;
use crate::models::interview::{EvaluationReport, InterviewQuestion};
use crate::resume::scratch::ScratchDir;
use crate::resume::{ingest_uploads, FileOutcome, UploadedFile};
use crate::session::{InterviewSession, ResumeContext, SessionPhase};

pub const MAX_EXPERIENCE_YEARS: i64 = 30;

pub const MSG_MISSING_ROLE: &str = "Please enter a job role";
pub const MSG_MISSING_DESCRIPTION: &str = "Please enter job description or tech stack";
pub const MSG_NO_QUESTIONS: &str = "Failed to generate questions. Please try again.";
pub const MSG_UNANSWERED: &str = "Please provide answers to all questions before evaluation.";
const MSG_GENERATE_FIRST: &str = "Generate interview questions first.";

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    pub job_role: String,
    #[serde(default)]
    pub experience_years: i64,
    pub job_description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeUploadOutcome {
    /// True when the résumé context was replaced by this upload.
    pub resume_updated: bool,
    pub files: Vec<FileOutcome>,
}

fn validate_question_request(request: &QuestionRequest) -> Result<u8, AppError> {
    if request.job_role.trim().is_empty() {
        return Err(AppError::Validation(MSG_MISSING_ROLE.to_string()));
    }
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(MSG_MISSING_DESCRIPTION.to_string()));
    }
    u8::try_from(request.experience_years)
        .ok()
        .filter(|years| i64::from(*years) <= MAX_EXPERIENCE_YEARS)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Years of experience must be between 0 and {MAX_EXPERIENCE_YEARS}"
            ))
        })
}

/// Generates a fresh question set, discarding previous questions, answers and evaluation.
pub async fn generate_questions(
    session: &mut InterviewSession,
    llm: &dyn LlmGateway,
    request: &QuestionRequest,
) -> Result<Vec<InterviewQuestion>, AppError> {
    let experience_years = validate_question_request(request)?;
    let job_role = request.job_role.trim();

    let prompt = build_question_prompt(
        job_role,
        experience_years,
        request.job_description.trim(),
        session.resume_text(),
    );
    let raw = llm.generate(&prompt).await?;

    let questions = parse_questions(&raw);
    if questions.is_empty() {
        warn!("Model reply for session {} held no question lines", session.id);
        return Err(AppError::UnprocessableEntity(MSG_NO_QUESTIONS.to_string()));
    }

    info!(
        "Generated {} questions for session {} (role: {job_role})",
        questions.len(),
        session.id
    );
    session.job_role = Some(job_role.to_string());
    session.answers = vec![String::new(); questions.len()];
    session.questions = questions.clone();
    session.evaluation = None;
    session.phase = SessionPhase::QuestionsGenerated;

    Ok(questions)
}

/// Sets the answer for the question at `index` (0-based).
pub fn record_answer(
    session: &mut InterviewSession,
    index: usize,
    answer: String,
) -> Result<(), AppError> {
    if session.questions.is_empty() {
        return Err(AppError::Validation(MSG_GENERATE_FIRST.to_string()));
    }
    let slot = session.answers.get_mut(index).ok_or_else(|| {
        AppError::Validation(format!(
            "Question index {index} is out of range (0..{})",
            session.questions.len()
        ))
    })?;
    *slot = answer;
    session.phase = SessionPhase::Answering;
    Ok(())
}

/// Replaces every answer at once. `answers` must line up with the questions.
pub fn record_answers(session: &mut InterviewSession, answers: Vec<String>) -> Result<(), AppError> {
    if session.questions.is_empty() {
        return Err(AppError::Validation(MSG_GENERATE_FIRST.to_string()));
    }
    if answers.len() != session.questions.len() {
        return Err(AppError::Validation(format!(
            "Expected {} answers, got {}",
            session.questions.len(),
            answers.len()
        )));
    }
    session.answers = answers;
    session.phase = SessionPhase::Answering;
    Ok(())
}

/// Scores the current answers. Rejected without any model call unless every
/// question has a non-blank answer.
pub async fn evaluate_answers(
    session: &mut InterviewSession,
    llm: &dyn LlmGateway,
) -> Result<EvaluationReport, AppError> {
    if session.questions.is_empty() {
        return Err(AppError::Validation(MSG_GENERATE_FIRST.to_string()));
    }
    if session.answers.iter().any(|a| a.trim().is_empty()) {
        return Err(AppError::Validation(MSG_UNANSWERED.to_string()));
    }

    let job_role = session.job_role.clone().unwrap_or_default();
    let prompt = build_evaluation_prompt(
        &job_role,
        &session.question_texts(),
        &session.answers,
        session.resume_text(),
    );
    let raw = llm.generate(&prompt).await?;
    let report = parse_evaluation(&raw);

    info!(
        "Stored evaluation for session {}: overall_rating={:?}, {} feedback items",
        session.id,
        report.overall_rating,
        report.detailed_feedback.len()
    );
    session.evaluation = Some(report.clone());
    session.phase = SessionPhase::Evaluated;

    Ok(report)
}

/// Extracts uploaded résumés and, if any succeeded, replaces the résumé context.
/// Does not touch the question/answer state.
pub async fn attach_resume(
    session: &mut InterviewSession,
    scratch: &ScratchDir,
    files: &[UploadedFile],
) -> Result<ResumeUploadOutcome, AppError> {
    if files.is_empty() {
        return Err(AppError::Upload("No files were uploaded".to_string()));
    }

    let result = ingest_uploads(scratch, session.id, files).await;
    let resume_updated = match result.text {
        Some(text) => {
            replace_resume(session, text, result.source_files);
            true
        }
        None => false,
    };

    Ok(ResumeUploadOutcome {
        resume_updated,
        files: result.outcomes,
    })
}

/// Swaps in a new résumé context. The previous text is dropped, never merged.
pub fn replace_resume(session: &mut InterviewSession, text: String, source_files: Vec<String>) {
    info!(
        "Résumé context replaced for session {} from {} file(s)",
        session.id,
        source_files.len()
    );
    session.resume = Some(ResumeContext {
        text,
        source_files,
        uploaded_at: Utc::now(),
    });
}

/// Sends one chat turn. The transcript grows by the user message and the reply,
/// or not at all if the model call fails.
pub async fn send_chat_message(
    session: &mut InterviewSession,
    llm: &dyn LlmGateway,
    message: &str,
) -> Result<ChatMessage, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    let outgoing = with_resume_context(message, session.resume_text());
    let reply = llm.chat(&session.transcript, &outgoing).await?;

    let reply = ChatMessage::assistant(reply);
    session.transcript.push(ChatMessage::user(message));
    session.transcript.push(reply.clone());
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::prompts::RESUME_CONTEXT_HEADING;
    use crate::llm_client::testing::ScriptedGateway;
    use crate::models::chat::ChatRole;
    use crate::models::interview::FALLBACK_FEEDBACK;
    use crate::resume::testing::one_page_pdf;

    const THREE_QUESTIONS: &str = "\
1. What is a borrow checker? - Difficulty: easy, Focus: technical
2. Describe a conflict you resolved. - Difficulty: medium, Focus: behavioral
3. A service leaks memory in production; what next? - Difficulty: hard, Focus: scenario-based";

    fn request(role: &str, years: i64, description: &str) -> QuestionRequest {
        QuestionRequest {
            job_role: role.to_string(),
            experience_years: years,
            job_description: description.to_string(),
        }
    }

    fn session_with_resume(text: &str) -> InterviewSession {
        let mut session = InterviewSession::new();
        session.resume = Some(ResumeContext {
            text: text.to_string(),
            source_files: vec!["cv.pdf".to_string()],
            uploaded_at: Utc::now(),
        });
        session
    }

    async fn session_with_questions() -> InterviewSession {
        let llm = ScriptedGateway::new().reply(THREE_QUESTIONS);
        let mut session = InterviewSession::new();
        generate_questions(&mut session, &llm, &request("Rust Engineer", 5, "tokio, axum"))
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_generate_questions_resets_answers() {
        let session = session_with_questions().await;
        assert_eq!(session.phase, SessionPhase::QuestionsGenerated);
        assert_eq!(session.questions.len(), 3);
        assert_eq!(session.answers, vec![String::new(); 3]);
        assert_eq!(session.job_role.as_deref(), Some("Rust Engineer"));
    }

    #[tokio::test]
    async fn test_generate_questions_replaces_previous_set() {
        let mut session = session_with_questions().await;
        record_answer(&mut session, 0, "An ownership checker".to_string()).unwrap();
        session.evaluation = Some(EvaluationReport::fallback());

        let llm = ScriptedGateway::new().reply("1. Only one? - Difficulty: easy, Focus: technical");
        generate_questions(&mut session, &llm, &request("SRE", 2, "k8s"))
            .await
            .unwrap();

        assert_eq!(session.questions.len(), 1);
        assert_eq!(session.answers, vec![String::new()]);
        assert!(session.evaluation.is_none());
        assert_eq!(session.job_role.as_deref(), Some("SRE"));
    }

    #[tokio::test]
    async fn test_generate_questions_validates_before_calling_model() {
        let llm = ScriptedGateway::new().reply(THREE_QUESTIONS);
        let mut session = InterviewSession::new();

        for bad in [request("  ", 3, "desc"), request("Role", 3, ""), request("Role", 31, "d"), request("Role", -1, "d")] {
            let err = generate_questions(&mut session, &llm, &bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(llm.calls(), 0);
        assert_eq!(session.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_generate_questions_empty_parse_leaves_state() {
        let mut session = session_with_questions().await;
        let before = session.questions.clone();

        let llm = ScriptedGateway::new().reply("Sorry, I can't do that.");
        let err = generate_questions(&mut session, &llm, &request("Dev", 1, "js"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnprocessableEntity(ref m) if m == MSG_NO_QUESTIONS));
        assert_eq!(session.questions, before);
        assert_eq!(session.phase, SessionPhase::QuestionsGenerated);
    }

    #[tokio::test]
    async fn test_generate_questions_gateway_error_propagates() {
        let llm = ScriptedGateway::new().fail(500, "boom");
        let mut session = InterviewSession::new();
        let err = generate_questions(&mut session, &llm, &request("Dev", 1, "js"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        assert!(session.questions.is_empty());
        assert_eq!(session.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_generate_questions_injects_resume_context() {
        let llm = ScriptedGateway::new().reply(THREE_QUESTIONS);
        let mut session = session_with_resume("Built a trading engine in Rust");
        generate_questions(&mut session, &llm, &request("Dev", 4, "Rust"))
            .await
            .unwrap();

        let prompts = llm.prompts();
        let prompt = &prompts[0];
        assert!(prompt.contains("Built a trading engine in Rust"));
        assert!(prompt.contains("with 4 years of experience"));
    }

    #[tokio::test]
    async fn test_record_answer_bounds() {
        let mut session = InterviewSession::new();
        assert!(record_answer(&mut session, 0, "x".into()).is_err());

        let mut session = session_with_questions().await;
        assert!(record_answer(&mut session, 3, "x".into()).is_err());
        record_answer(&mut session, 2, "Heap profile first".into()).unwrap();
        assert_eq!(session.answers[2], "Heap profile first");
        assert_eq!(session.phase, SessionPhase::Answering);
    }

    #[tokio::test]
    async fn test_record_answers_requires_matching_length() {
        let mut session = session_with_questions().await;
        let err = record_answers(&mut session, vec!["a".into()]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.answers.len(), 3);
    }

    #[tokio::test]
    async fn test_evaluate_rejects_unanswered_without_model_call() {
        let mut session = session_with_questions().await;
        record_answers(&mut session, vec!["a".into(), "   ".into(), "c".into()]).unwrap();

        let llm = ScriptedGateway::new().reply("{}");
        let err = evaluate_answers(&mut session, &llm).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(ref m) if m == MSG_UNANSWERED));
        assert_eq!(llm.calls(), 0);
        assert!(session.evaluation.is_none());
    }

    #[tokio::test]
    async fn test_evaluate_rejects_without_questions() {
        let llm = ScriptedGateway::new();
        let mut session = InterviewSession::new();
        assert!(evaluate_answers(&mut session, &llm).await.is_err());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_evaluate_stores_report() {
        let mut session = session_with_questions().await;
        record_answers(&mut session, vec!["a".into(), "b".into(), "c".into()]).unwrap();

        let llm = ScriptedGateway::new().reply(
            r#"Evaluation: {"overall_rating": 7, "overall_feedback": "Solid", "detailed_feedback": [{"answer_rating": 6}]}"#,
        );
        let report = evaluate_answers(&mut session, &llm).await.unwrap();

        assert_eq!(report.overall_rating, Some(7.0));
        assert_eq!(session.phase, SessionPhase::Evaluated);
        assert_eq!(session.evaluation, Some(report));
        let prompts = llm.prompts();
        let prompt = &prompts[0];
        assert!(prompt.contains("What is a borrow checker?"));
        assert!(prompt.contains("Rust Engineer"));
    }

    #[tokio::test]
    async fn test_evaluate_unparseable_reply_uses_fallback() {
        let mut session = session_with_questions().await;
        record_answers(&mut session, vec!["a".into(), "b".into(), "c".into()]).unwrap();

        let llm = ScriptedGateway::new().reply("You did great, no JSON today.");
        let report = evaluate_answers(&mut session, &llm).await.unwrap();

        assert_eq!(report.overall_feedback.as_deref(), Some(FALLBACK_FEEDBACK));
        assert_eq!(session.phase, SessionPhase::Evaluated);
    }

    #[tokio::test]
    async fn test_chat_appends_user_and_assistant() {
        let llm = ScriptedGateway::new().reply("Hello!").reply("Sure.");
        let mut session = InterviewSession::new();

        send_chat_message(&mut session, &llm, "hi").await.unwrap();
        let reply = send_chat_message(&mut session, &llm, "help me").await.unwrap();

        assert_eq!(reply.content, "Sure.");
        assert_eq!(session.transcript.len(), 4);
        assert_eq!(session.transcript[0].role, ChatRole::User);
        assert_eq!(session.transcript[1].content, "Hello!");
        assert_eq!(session.transcript[3].role, ChatRole::Assistant);
        assert_eq!(llm.history_lengths(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_chat_failure_leaves_transcript() {
        let llm = ScriptedGateway::new().reply("Hello!").fail(429, "quota");
        let mut session = InterviewSession::new();

        send_chat_message(&mut session, &llm, "hi").await.unwrap();
        let err = send_chat_message(&mut session, &llm, "again").await.unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(session.transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_chat_prefixes_resume_but_stores_raw_message() {
        let llm = ScriptedGateway::new().reply("Noted.");
        let mut session = session_with_resume("Kafka expert");

        send_chat_message(&mut session, &llm, "What roles fit me?").await.unwrap();

        let prompts = llm.prompts();
        let sent = &prompts[0];
        assert!(sent.starts_with(RESUME_CONTEXT_HEADING));
        assert!(sent.contains("Kafka expert"));
        assert_eq!(session.transcript[0].content, "What roles fit me?");
    }

    #[tokio::test]
    async fn test_chat_rejects_blank_message() {
        let llm = ScriptedGateway::new();
        let mut session = InterviewSession::new();
        assert!(send_chat_message(&mut session, &llm, "  ").await.is_err());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_attach_resume_failure_keeps_previous_context() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(tmp.path());
        let mut session = session_with_resume("old resume");

        let files = vec![UploadedFile {
            file_name: "photo.png".to_string(),
            data: bytes::Bytes::from_static(b"\x89PNG"),
        }];
        let outcome = attach_resume(&mut session, &scratch, &files).await.unwrap();

        assert!(!outcome.resume_updated);
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(session.resume_text(), Some("old resume"));
    }

    #[test]
    fn test_replace_resume_discards_old_text() {
        let mut session = session_with_resume("first resume");
        replace_resume(&mut session, "second resume".to_string(), vec!["new.pdf".to_string()]);

        assert_eq!(session.resume_text(), Some("second resume"));
        let resume = session.resume.as_ref().unwrap();
        assert_eq!(resume.source_files, vec!["new.pdf".to_string()]);
        assert_eq!(session.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_attach_resume_requires_files() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(tmp.path());
        let mut session = InterviewSession::new();
        let err = attach_resume(&mut session, &scratch, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }

    #[tokio::test]
    async fn test_attach_resume_replaces_context_with_extracted_text() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(tmp.path());
        let mut session = session_with_resume("old resume");

        let files = vec![
            UploadedFile {
                file_name: "cv.pdf".to_string(),
                data: one_page_pdf("Kubernetes"),
            },
            UploadedFile {
                file_name: "projects.pdf".to_string(),
                data: one_page_pdf("PostgreSQL"),
            },
        ];
        let outcome = attach_resume(&mut session, &scratch, &files).await.unwrap();

        assert!(outcome.resume_updated);
        assert!(outcome.files.iter().all(|f| f.ok));
        let text = session.resume_text().unwrap();
        assert!(!text.contains("old resume"));
        let (first, second) = text.split_once("\n\n").unwrap();
        assert!(first.contains("Kubernetes"));
        assert!(second.contains("PostgreSQL"));
        assert_eq!(
            session.resume.as_ref().unwrap().source_files,
            vec!["cv.pdf".to_string(), "projects.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn test_attach_resume_mixed_upload_keeps_only_good_files() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(tmp.path());
        let mut session = session_with_resume("old resume");

        let files = vec![
            UploadedFile {
                file_name: "notes.txt".to_string(),
                data: bytes::Bytes::from_static(b"plain text"),
            },
            UploadedFile {
                file_name: "cv.pdf".to_string(),
                data: one_page_pdf("Kubernetes"),
            },
        ];
        let outcome = attach_resume(&mut session, &scratch, &files).await.unwrap();

        assert!(outcome.resume_updated);
        assert!(!outcome.files[0].ok);
        assert!(outcome.files[1].ok);
        let resume = session.resume.as_ref().unwrap();
        assert_eq!(resume.source_files, vec!["cv.pdf".to_string()]);
        assert!(resume.text.contains("Kubernetes"));
        assert!(!resume.text.contains("old resume"));
        assert!(!resume.text.contains("plain text"));
    }
}
