//! Document store — where parsed candidates and jobs live between requests.
//!
//! The matching engine never touches storage; handlers load the job and the
//! candidate pool through this trait and hand plain values to the ranker.

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::candidate::Candidate;
use crate::models::job::Job;

pub mod postgres;

pub use postgres::PgDocumentStore;

/// Upper bound on records returned by the listing calls.
pub const LIST_LIMIT: usize = 100;

/// Normalized (company, title) key. Jobs that differ only in case or
/// surrounding whitespace are the same job in every store.
pub fn job_lookup_key(company_name: &str, job_title: &str) -> (String, String) {
    (
        company_name.trim().to_lowercase(),
        job_title.trim().to_lowercase(),
    )
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Case-insensitive lookup by company and title.
    async fn get_job(&self, company_name: &str, job_title: &str) -> Result<Option<Job>>;

    async fn get_candidate(&self, full_name: &str) -> Result<Option<Candidate>>;

    /// Candidates that carry a non-empty profile embedding.
    async fn list_embedded_candidates(&self) -> Result<Vec<Candidate>>;

    /// Inserts or replaces the job keyed by [`job_lookup_key`].
    async fn upsert_job(&self, job: &Job) -> Result<()>;

    /// Inserts or replaces the candidate keyed by full name.
    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<()>;

    /// Up to `limit` candidates ordered by full name.
    async fn list_candidates(&self, limit: usize) -> Result<Vec<Candidate>>;

    /// Up to `limit` jobs ordered by company, then title.
    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>>;

    /// Distinct company names across all jobs, sorted.
    async fn list_companies(&self) -> Result<Vec<String>>;
}

/// Process-local store. Preserves insertion order, which keeps ranking ties
/// reproducible in tests and local runs.
#[derive(Default)]
pub struct InMemoryStore {
    jobs: RwLock<Vec<Job>>,
    candidates: RwLock<Vec<Candidate>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_job(job: &Job, key: &(String, String)) -> bool {
    job_lookup_key(&job.company_name, &job.job_title) == *key
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_job(&self, company_name: &str, job_title: &str) -> Result<Option<Job>> {
        let key = job_lookup_key(company_name, job_title);
        let jobs = self.jobs.read().await;
        Ok(jobs.iter().find(|j| same_job(j, &key)).cloned())
    }

    async fn get_candidate(&self, full_name: &str) -> Result<Option<Candidate>> {
        let candidates = self.candidates.read().await;
        Ok(candidates.iter().find(|c| c.full_name == full_name).cloned())
    }

    async fn list_embedded_candidates(&self) -> Result<Vec<Candidate>> {
        let candidates = self.candidates.read().await;
        Ok(candidates
            .iter()
            .filter(|c| c.has_embeddings())
            .cloned()
            .collect())
    }

    async fn upsert_job(&self, job: &Job) -> Result<()> {
        let key = job_lookup_key(&job.company_name, &job.job_title);
        let mut jobs = self.jobs.write().await;
        match jobs.iter_mut().find(|j| same_job(j, &key)) {
            Some(existing) => *existing = job.clone(),
            None => jobs.push(job.clone()),
        }
        Ok(())
    }

    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<()> {
        let mut candidates = self.candidates.write().await;
        match candidates
            .iter_mut()
            .find(|c| c.full_name == candidate.full_name)
        {
            Some(existing) => *existing = candidate.clone(),
            None => candidates.push(candidate.clone()),
        }
        Ok(())
    }

    async fn list_candidates(&self, limit: usize) -> Result<Vec<Candidate>> {
        let mut listed = self.candidates.read().await.clone();
        listed.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        listed.truncate(limit);
        Ok(listed)
    }

    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>> {
        let mut listed = self.jobs.read().await.clone();
        listed.sort_by(|a, b| {
            (&a.company_name, &a.job_title).cmp(&(&b.company_name, &b.job_title))
        });
        listed.truncate(limit);
        Ok(listed)
    }

    async fn list_companies(&self) -> Result<Vec<String>> {
        let jobs = self.jobs.read().await;
        let companies: BTreeSet<&str> = jobs.iter().map(|j| j.company_name.as_str()).collect();
        Ok(companies.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_lookup_is_case_insensitive() {
        let store = InMemoryStore::new();
        store.upsert_job(&Job::new("Acme", "Data Engineer")).await.unwrap();

        assert!(store.get_job("ACME", "data engineer").await.unwrap().is_some());
        assert!(store.get_job("Acme", "Designer").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_job_key_differing_only_in_case_replaces() {
        let store = InMemoryStore::new();
        store.upsert_job(&Job::new("Acme", "Data Engineer")).await.unwrap();
        let mut shouted = Job::new("ACME", " data engineer ");
        shouted.summary = "second".to_string();
        store.upsert_job(&shouted).await.unwrap();

        assert_eq!(store.jobs.read().await.len(), 1);
        let stored = store.get_job("acme", "DATA ENGINEER").await.unwrap().unwrap();
        assert_eq!(stored.summary, "second");
    }

    #[test]
    fn test_job_lookup_key_normalizes() {
        assert_eq!(
            job_lookup_key(" Acme ", "Data ENGINEER"),
            ("acme".to_string(), "data engineer".to_string())
        );
    }

    #[tokio::test]
    async fn test_listings_are_sorted_and_limited() {
        let store = InMemoryStore::new();
        for name in ["Zoe", "Adam", "Mia"] {
            store.upsert_candidate(&Candidate::new(name)).await.unwrap();
        }
        let jobs = [("Globex", "Analyst"), ("Acme", "Engineer"), ("Acme", "Designer")];
        for (company, title) in jobs {
            store.upsert_job(&Job::new(company, title)).await.unwrap();
        }

        let names: Vec<String> = store
            .list_candidates(2)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.full_name)
            .collect();
        assert_eq!(names, vec!["Adam", "Mia"]);

        let titles: Vec<String> = store
            .list_jobs(LIST_LIMIT)
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.job_title)
            .collect();
        assert_eq!(titles, vec!["Designer", "Engineer", "Analyst"]);

        assert_eq!(store.list_companies().await.unwrap(), vec!["Acme", "Globex"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_key() {
        let store = InMemoryStore::new();
        let mut job = Job::new("Acme", "Engineer");
        store.upsert_job(&job).await.unwrap();
        job.summary = "updated".to_string();
        store.upsert_job(&job).await.unwrap();

        let stored = store.get_job("Acme", "Engineer").await.unwrap().unwrap();
        assert_eq!(stored.summary, "updated");
        assert_eq!(store.jobs.read().await.len(), 1);

        let mut candidate = Candidate::new("Sam");
        store.upsert_candidate(&candidate).await.unwrap();
        candidate.summary = "v2".to_string();
        store.upsert_candidate(&candidate).await.unwrap();
        assert_eq!(store.candidates.read().await.len(), 1);
        assert_eq!(
            store.get_candidate("Sam").await.unwrap().unwrap().summary,
            "v2"
        );
    }

    #[tokio::test]
    async fn test_only_embedded_candidates_are_listed() {
        let store = InMemoryStore::new();
        let mut embedded = Candidate::new("Embedded");
        embedded.profile_embedding = Some(vec![1.0]);
        let mut empty = Candidate::new("Empty");
        empty.profile_embedding = Some(vec![]);

        store.upsert_candidate(&Candidate::new("Plain")).await.unwrap();
        store.upsert_candidate(&embedded).await.unwrap();
        store.upsert_candidate(&empty).await.unwrap();

        let listed = store.list_embedded_candidates().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].full_name, "Embedded");
    }
}
