//! Keyword Features — deterministic text features explaining a match.
//!
//! Pure functions, no I/O. The output feeds both the explanation payload
//! returned to callers and the prompt sent to the text generator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::candidate::Candidate;
use crate::models::job::Job;

/// Connectors plus domain-generic nouns that carry no matching signal.
const STOPWORDS: &[&str] = &[
    "the", "and", "with", "for", "from", "that", "this", "your", "their", "they", "them", "our",
    "into", "through", "will", "have", "has", "are", "was", "were", "been", "being", "over",
    "such", "than", "then", "about", "also", "using", "based", "able", "experience", "years",
];

/// Tokens of this length or shorter are dropped.
const MIN_TOKEN_LEN: usize = 4;

const KEYWORD_OVERLAP_CAP: usize = 15;

/// Substrings of a role title that mark it as senior/leadership.
const LEADERSHIP_TOKENS: &[&str] = &[
    "head",
    "director",
    "cto",
    "chief",
    "lead",
    "leader",
    "architect",
];

/// Structured match features, independent of any text generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFeatures {
    pub keyword_overlap: Vec<String>,
    pub relevant_roles: Vec<String>,
    pub candidate_companies: Vec<String>,
    pub job_min_years: Option<f64>,
    /// Number of experience entries. A rough seniority proxy, not years.
    pub candidate_num_roles: usize,
}

/// Lowercases `text`, splits on runs of ASCII letters, and keeps tokens
/// longer than four characters that are not stopwords.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|token| token.len() > MIN_TOKEN_LEN && !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

pub fn build_features(job: &Job, candidate: &Candidate) -> MatchFeatures {
    let job_keywords = extract_keywords(&job_text(job));
    let candidate_keywords = extract_keywords(&candidate_text(candidate));

    // BTreeSet iteration is already lexicographic.
    let keyword_overlap = job_keywords
        .intersection(&candidate_keywords)
        .take(KEYWORD_OVERLAP_CAP)
        .cloned()
        .collect();

    let candidate_companies = candidate
        .companies
        .iter()
        .filter(|name| !name.is_empty())
        .cloned()
        .collect();

    MatchFeatures {
        keyword_overlap,
        relevant_roles: relevant_roles(&job.job_title, candidate),
        candidate_companies,
        job_min_years: job.min_years,
        candidate_num_roles: candidate.experience.len(),
    }
}

fn job_text(job: &Job) -> String {
    format!(
        "{} {} {}",
        job.summary,
        job.responsibilities.join(" "),
        job.qualifications.join(" ")
    )
}

fn candidate_text(candidate: &Candidate) -> String {
    let roles = candidate
        .experience
        .iter()
        .map(|e| e.role.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let responsibilities = candidate
        .experience
        .iter()
        .filter_map(|e| e.responsibilities.as_deref())
        .collect::<Vec<_>>()
        .join(" ");

    format!("{} {} {}", candidate.summary, roles, responsibilities)
}

/// Roles that look senior, or that share a word with the job title.
fn relevant_roles(job_title: &str, candidate: &Candidate) -> Vec<String> {
    let title = job_title.to_lowercase();
    let title_words: Vec<&str> = title.split_whitespace().collect();

    candidate
        .experience
        .iter()
        .filter_map(|entry| {
            let role = entry.role.trim();
            let lower = role.to_lowercase();
            let leadership = LEADERSHIP_TOKENS.iter().any(|tok| lower.contains(tok));
            let shares_word = lower.split_whitespace().any(|w| title_words.contains(&w));
            (leadership || shares_word).then(|| role.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::ExperienceEntry;

    fn experience(role: &str, responsibilities: &str) -> ExperienceEntry {
        ExperienceEntry {
            role: role.to_string(),
            responsibilities: Some(responsibilities.to_string()),
        }
    }

    #[test]
    fn test_extract_keywords_drops_stopwords_and_short_tokens() {
        let kw = extract_keywords("The Architect led Cloud Modernization");
        assert!(!kw.contains("the"));
        assert!(!kw.contains("led"));
        assert!(kw.contains("architect"));
        assert!(kw.contains("cloud"));
        assert!(kw.contains("modernization"));
    }

    #[test]
    fn test_extract_keywords_drops_domain_stopwords() {
        let kw = extract_keywords("Seven years experience building platforms using Kubernetes");
        assert!(!kw.contains("years"));
        assert!(!kw.contains("experience"));
        assert!(!kw.contains("using"));
        assert!(kw.contains("platforms"));
        assert!(kw.contains("kubernetes"));
    }

    #[test]
    fn test_extract_keywords_splits_on_non_letters() {
        let kw = extract_keywords("cloud-native/serverless, data2warehouse");
        assert!(kw.contains("cloud"));
        assert!(kw.contains("native"));
        assert!(kw.contains("serverless"));
        assert!(kw.contains("warehouse"));
        assert!(!kw.contains("data"));
    }

    #[test]
    fn test_extract_keywords_collapses_duplicates() {
        let kw = extract_keywords("Python python PYTHON");
        assert_eq!(kw.len(), 1);
    }

    #[test]
    fn test_keyword_overlap_sorted_and_capped() {
        let words: Vec<String> = (b'a'..=b'z')
            .map(|c| format!("keyword{}", c as char))
            .collect();
        let shared = words.join(" ");

        let mut job = Job::new("Acme", "Engineer");
        job.summary = shared.clone();
        let mut candidate = Candidate::new("Sam");
        candidate.summary = shared;

        let features = build_features(&job, &candidate);
        assert_eq!(features.keyword_overlap.len(), 15);
        let mut sorted = features.keyword_overlap.clone();
        sorted.sort();
        assert_eq!(features.keyword_overlap, sorted);
    }

    #[test]
    fn test_keyword_overlap_uses_job_and_candidate_text_sections() {
        let mut job = Job::new("Acme", "Platform Engineer");
        job.summary = "Modernize legacy systems".to_string();
        job.responsibilities = vec!["Own kubernetes clusters".to_string()];
        job.qualifications = vec!["Terraform fluency".to_string()];

        let mut candidate = Candidate::new("Sam");
        candidate.summary = "Terraform practitioner".to_string();
        candidate.experience = vec![experience("Kubernetes Operator", "Migrated legacy systems")];

        let features = build_features(&job, &candidate);
        assert_eq!(
            features.keyword_overlap,
            vec!["kubernetes", "legacy", "systems", "terraform"]
        );
    }

    #[test]
    fn test_relevant_roles_leadership_and_title_overlap() {
        let job = Job::new("Acme", "Senior Data Engineer");
        let mut candidate = Candidate::new("Sam");
        candidate.experience = vec![
            experience("Head of Platform", ""),
            experience("  Data Analyst ", ""),
            experience("Support Technician", ""),
            experience("Solutions Architect", ""),
            experience("", ""),
        ];

        let features = build_features(&job, &candidate);
        assert_eq!(
            features.relevant_roles,
            vec!["Head of Platform", "Data Analyst", "Solutions Architect"]
        );
    }

    #[test]
    fn test_leadership_tokens_match_as_substrings() {
        let job = Job::new("Acme", "Engineer");
        let mut candidate = Candidate::new("Sam");
        candidate.experience = vec![experience("Team Leadership Coach", "")];
        let features = build_features(&job, &candidate);
        assert_eq!(features.relevant_roles, vec!["Team Leadership Coach"]);
    }

    #[test]
    fn test_companies_skip_empty_names_and_keep_order() {
        let job = Job::new("Acme", "Engineer");
        let mut candidate = Candidate::new("Sam");
        candidate.companies = vec![
            "Initech".to_string(),
            "".to_string(),
            "  ".to_string(),
            "Globex".to_string(),
        ];
        candidate.experience = vec![experience("A", ""), experience("B", "")];

        let features = build_features(&job, &candidate);
        assert_eq!(features.candidate_companies, vec!["Initech", "  ", "Globex"]);
        assert_eq!(features.candidate_num_roles, 2);
        assert_eq!(features.job_min_years, None);
    }
}
