// Interview core: prompt construction, response parsing, evaluation review.
// All LLM calls go through llm_client; this module only builds and reads text.

pub mod parser;
pub mod prompts;
pub mod review;
