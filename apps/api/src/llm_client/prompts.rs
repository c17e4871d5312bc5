// Shared prompt fragments and prompt-building utilities.
// Each module that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// Heading placed in front of résumé text wherever it is injected into a prompt.
pub const RESUME_CONTEXT_HEADING: &str = "Candidate Resume:";

/// Prefixes `message` with the résumé block when a résumé context is present.
pub fn with_resume_context(message: &str, resume_context: Option<&str>) -> String {
    match resume_context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{RESUME_CONTEXT_HEADING}\n{context}\n\n{message}"),
        None => message.to_string(),
    }
}
