// Shared prompt fragments. Each module that calls the LLM keeps its own
// prompts.rs alongside it and pulls cross-cutting rules from here.

/// Appended to every prompt that asks for recruiter-facing prose.
pub const FACTUAL_INSTRUCTION: &str = "\
    Keep the tone factual and recruiter-friendly. \
    Do NOT invent facts that are not supported by the data above.";
