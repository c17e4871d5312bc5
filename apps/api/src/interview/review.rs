//! Evaluation review: pairs decoded feedback with the session's questions and
//! answers and fills in display defaults for anything the model left out.

use serde::Serialize;

use crate::models::interview::{EvaluationReport, InterviewQuestion};

const NOT_AVAILABLE: &str = "N/A";
const NO_OVERALL_FEEDBACK: &str = "No overall feedback available.";
const NO_STRENGTHS: &str = "No specific strengths noted.";
const NO_IMPROVEMENTS: &str = "No specific improvements suggested.";
const NO_FRAMEWORK: &str = "No specific framework provided.";

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReview {
    /// e.g. `"7/10"`, or `"N/A"`.
    pub overall_rating: String,
    pub overall_feedback: String,
    pub answers: Vec<ReviewedAnswer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewedAnswer {
    /// 1-based, matching the `Q1..Qn` labels shown to the user.
    pub number: usize,
    pub question: String,
    pub answer: String,
    pub answer_rating: String,
    pub strengths: String,
    pub areas_for_improvement: String,
    pub suggested_answer_framework: String,
}

pub fn rating_label(rating: Option<f64>) -> String {
    match rating {
        Some(r) if r.fract() == 0.0 => format!("{}/10", r as i64),
        Some(r) => format!("{r:.1}/10"),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Builds one reviewed entry per feedback item.
///
/// Feedback is aligned to questions by position. Feedback lists shorter than the
/// question list simply produce fewer entries; extra feedback items fall back to
/// the question text the model echoed back.
pub fn build_review(
    questions: &[InterviewQuestion],
    answers: &[String],
    report: &EvaluationReport,
) -> EvaluationReview {
    let reviewed = report
        .detailed_feedback
        .iter()
        .enumerate()
        .map(|(i, feedback)| {
            let question = questions
                .get(i)
                .map(|q| q.text.clone())
                .unwrap_or_else(|| or_default(&feedback.question, NOT_AVAILABLE));
            let answer = answers
                .get(i)
                .cloned()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());

            ReviewedAnswer {
                number: i + 1,
                question,
                answer,
                answer_rating: rating_label(feedback.answer_rating),
                strengths: or_default(&feedback.strengths, NO_STRENGTHS),
                areas_for_improvement: or_default(&feedback.areas_for_improvement, NO_IMPROVEMENTS),
                suggested_answer_framework: or_default(
                    &feedback.suggested_answer_framework,
                    NO_FRAMEWORK,
                ),
            }
        })
        .collect();

    EvaluationReview {
        overall_rating: rating_label(report.overall_rating),
        overall_feedback: or_default(&report.overall_feedback, NO_OVERALL_FEEDBACK),
        answers: reviewed,
    }
}
