//! Response parser: turns the model's free-text replies into structured records.
//!
//! Both paths degrade instead of failing: `parse_questions` keeps the lines it
//! recognizes and drops the rest, `parse_evaluation` substitutes a fixed
//! fallback report when no JSON object can be decoded.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::models::interview::{Difficulty, EvaluationReport, Focus, InterviewQuestion};

/// `<ordinal>. <question> - Difficulty: <word>, Focus: <word>`
/// The question is the shortest span before the difficulty marker, so it may contain hyphens.
static QUESTION_LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d+\.\s*(?P<text>.*?)\s*-\s*(?i:difficulty):\s*(?P<difficulty>\w+),\s*(?i:focus):\s*(?P<focus>[\w-]+)",
    )
    .expect("question line pattern is valid")
});

/// Parses one line; `None` when the line is not a question line.
pub fn parse_question_line(line: &str) -> Option<InterviewQuestion> {
    let caps = QUESTION_LINE_PATTERN.captures(line.trim())?;

    let text = caps.name("text")?.as_str().trim();
    if text.is_empty() {
        return None;
    }
    let difficulty = Difficulty::from_label(caps.name("difficulty")?.as_str())?;
    let focus = Focus::from_label(caps.name("focus")?.as_str())?;

    Some(InterviewQuestion {
        text: text.to_string(),
        difficulty,
        focus,
    })
}

/// Extracts every recognizable question line from `raw`, in order.
///
/// Headers, commentary and malformed lines are skipped. An empty result is the
/// caller's signal that the model produced no usable questions.
pub fn parse_questions(raw: &str) -> Vec<InterviewQuestion> {
    let questions: Vec<_> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_question_line)
        .collect();

    debug!("Parsed {} questions from model output", questions.len());
    questions
}

/// Span from the first `{` to the last `}`. Not nesting-aware.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Decodes the evaluation JSON embedded anywhere in `raw`.
/// Never fails: returns `EvaluationReport::fallback()` when nothing decodes.
pub fn parse_evaluation(raw: &str) -> EvaluationReport {
    let Some(candidate) = extract_json_object(raw) else {
        warn!("Evaluation reply contained no JSON object, using fallback report");
        return EvaluationReport::fallback();
    };

    match serde_json::from_str::<EvaluationReport>(candidate) {
        Ok(report) => report,
        Err(e) => {
            warn!("Evaluation JSON could not be decoded ({e}), using fallback report");
            EvaluationReport::fallback()
        }
    }
}
