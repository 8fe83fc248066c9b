// Prompt constants for match explanations.
// Reuses cross-cutting fragments from llm_client::prompts.

pub const EXPLANATION_SYSTEM: &str = "You are an assistant that explains job–candidate \
    matches for recruiters in clear, concise bullet points.";

/// Replace: {company}, {job_title}, {job_summary}, {job_skills}, {min_years},
///          {candidate_name}, {candidate_location}, {candidate_summary},
///          {candidate_skills}, {candidate_companies}, {candidate_num_roles},
///          {combined_score}, {keyword_overlap}, {relevant_roles},
///          {factual_instruction}
pub const EXPLANATION_PROMPT_TEMPLATE: &str = r#"You are assisting a recruiter by explaining why a candidate matches a job.

JOB
- Company: {company}
- Title: {job_title}
- Summary: {job_summary}
- Required Skills: {job_skills}
- Minimum Experience: {min_years}

CANDIDATE
- Name: {candidate_name}
- Location: {candidate_location}
- Summary: {candidate_summary}
- Skills: {candidate_skills}
- Companies: {candidate_companies}
- Number of roles: {candidate_num_roles}

MATCH ANALYSIS (computed by the system)
- Combined similarity score: {combined_score}
- Overlapping keywords in responsibilities/experience: {keyword_overlap}
- Senior / leadership roles that look aligned: {relevant_roles}

TASK
Write 3-5 short bullet points explaining:
1. Why this candidate is a strong or weak match for this job.
2. Which aspects of their background align well (architecture, cloud, leadership, modernization, etc.).
3. Any important gaps or risks that aren't obvious in the candidate profile.

{factual_instruction}"#;
