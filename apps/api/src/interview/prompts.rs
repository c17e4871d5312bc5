// All LLM prompt templates for the interview module.
// Question lines must keep the `N. <question> - Difficulty: <d>, Focus: <f>` shape:
// `interview::parser` recognizes exactly that shape.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::llm_client::prompts::RESUME_CONTEXT_HEADING;

/// Number of questions requested per generation. The parser does not enforce it.
pub const REQUESTED_QUESTIONS: usize = 5;

/// Question generation prompt template.
/// Replace: {job_role}, {experience_years}, {question_lines}, {job_description}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Generate 5 tailored interview questions for a {job_role} with {experience_years} years of experience.

Job Description and Tech Stack: {job_description}

Format your response EXACTLY like this:
{question_lines}

Ensure questions are precise, relevant to the job role, and demonstrate deep understanding of the role's requirements."#;

/// Evaluation prompt template.
/// Replace: {job_role}, {resume_block}, {qa_pairs_json}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are an experienced interviewer evaluating interview answers for a {job_role} position.
{resume_block}
Please evaluate the following interview answers with a comprehensive and constructive approach.
Each item is a [question, answer] pair:

{qa_pairs_json}

Provide a detailed evaluation in this JSON format:
{
    "overall_rating": x,  // Rating out of 10
    "overall_feedback": "Comprehensive summary of performance",
    "detailed_feedback": [
        {
            "question": "Original interview question",
            "answer_rating": x,  // Rating out of 10
            "strengths": "Positive aspects of the answer",
            "areas_for_improvement": "Specific suggestions for improvement",
            "suggested_answer_framework": "How an ideal answer might be structured"
        }
        // ... one entry per question, in the same order
    ]
}"#;

const ORDINAL_NAMES: [&str; REQUESTED_QUESTIONS] =
    ["Specific", "Another Specific", "Third Specific", "Fourth Specific", "Fifth Specific"];

fn question_format_lines(job_role: &str) -> String {
    ORDINAL_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let subject = if i == 0 {
                format!("[{name} Question about {job_role}]")
            } else {
                format!("[{name} Question]")
            };
            format!(
                "{}. {subject} - Difficulty: [easy/medium/hard], Focus: [technical/behavioral/scenario-based]",
                i + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Substitutes `{name}` placeholders in one pass over the template. Substituted
/// values are never rescanned, and braces the template uses literally (the JSON
/// sample) are left alone.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn usable_context(resume_context: Option<&str>) -> Option<&str> {
    resume_context.map(str::trim).filter(|c| !c.is_empty())
}

/// Builds the question-generation prompt.
///
/// The résumé text, when present, is appended to the job description verbatim.
pub fn build_question_prompt(
    job_role: &str,
    experience_years: u8,
    job_description: &str,
    resume_context: Option<&str>,
) -> String {
    let description = match usable_context(resume_context) {
        Some(context) => format!("{job_description}\n\n{RESUME_CONTEXT_HEADING}\n{context}"),
        None => job_description.to_string(),
    };

    fill_template(
        QUESTION_PROMPT_TEMPLATE,
        &[
            ("job_role", job_role),
            ("experience_years", &experience_years.to_string()),
            ("question_lines", &question_format_lines(job_role)),
            ("job_description", &description),
        ],
    )
}

/// Builds the answer-evaluation prompt. `questions` and `answers` are paired by index.
pub fn build_evaluation_prompt(
    job_role: &str,
    questions: &[String],
    answers: &[String],
    resume_context: Option<&str>,
) -> String {
    let pairs: Vec<(&str, &str)> = questions
        .iter()
        .zip(answers)
        .map(|(q, a)| (q.as_str(), a.as_str()))
        .collect();
    let qa_pairs_json = serde_json::to_string_pretty(&pairs).unwrap_or_default();

    let resume_block = match usable_context(resume_context) {
        Some(context) => format!(
            "\nUse the candidate's resume as background when judging the answers.\n{RESUME_CONTEXT_HEADING}\n{context}\n"
        ),
        None => String::new(),
    };

    fill_template(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("job_role", job_role),
            ("resume_block", &resume_block),
            ("qa_pairs_json", &qa_pairs_json),
        ],
    )
}
