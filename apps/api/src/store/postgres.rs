use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::store::{job_lookup_key, DocumentStore};

/// Jobs are keyed on normalized `company_key`/`title_key` columns, filled from
/// `job_lookup_key`, so lookups and upserts agree on what "the same job" is.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS candidates (
        full_name  TEXT PRIMARY KEY,
        id         UUID NOT NULL,
        doc        JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        company_key  TEXT NOT NULL,
        title_key    TEXT NOT NULL,
        company_name TEXT NOT NULL,
        job_title    TEXT NOT NULL,
        id           UUID NOT NULL,
        doc          JSONB NOT NULL,
        updated_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (company_key, title_key)
    )
    "#,
];

/// Postgres-backed store holding each record as a JSONB document.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and makes sure the tables exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!("PostgreSQL connection pool established");
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates the tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create document store schema")?;
        }
        info!("Document store schema ready");
        Ok(())
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_job(&self, company_name: &str, job_title: &str) -> Result<Option<Job>> {
        let (company_key, title_key) = job_lookup_key(company_name, job_title);
        let row = sqlx::query_as::<_, (Json<Job>,)>(
            "SELECT doc FROM jobs WHERE company_key = $1 AND title_key = $2",
        )
        .bind(&company_key)
        .bind(&title_key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load job {company_name} / {job_title}"))?;

        Ok(row.map(|(Json(job),)| job))
    }

    async fn get_candidate(&self, full_name: &str) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, (Json<Candidate>,)>(
            "SELECT doc FROM candidates WHERE full_name = $1",
        )
        .bind(full_name)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load candidate {full_name}"))?;

        Ok(row.map(|(Json(candidate),)| candidate))
    }

    async fn list_embedded_candidates(&self) -> Result<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, (Json<Candidate>,)>(
            r#"
            SELECT doc FROM candidates
            WHERE jsonb_typeof(doc->'profile_embedding') = 'array'
            ORDER BY full_name COLLATE "C"
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list embedded candidates")?;

        Ok(rows
            .into_iter()
            .map(|(Json(candidate),)| candidate)
            .filter(Candidate::has_embeddings)
            .collect())
    }

    async fn upsert_job(&self, job: &Job) -> Result<()> {
        let (company_key, title_key) = job_lookup_key(&job.company_name, &job.job_title);
        sqlx::query(
            r#"
            INSERT INTO jobs (company_key, title_key, company_name, job_title, id, doc, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (company_key, title_key)
            DO UPDATE SET company_name = EXCLUDED.company_name,
                          job_title = EXCLUDED.job_title,
                          id = EXCLUDED.id,
                          doc = EXCLUDED.doc,
                          updated_at = now()
            "#,
        )
        .bind(&company_key)
        .bind(&title_key)
        .bind(&job.company_name)
        .bind(&job.job_title)
        .bind(job.id)
        .bind(Json(job))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert job {}", job.job_key()))?;
        Ok(())
    }

    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO candidates (full_name, id, doc, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (full_name)
            DO UPDATE SET id = EXCLUDED.id, doc = EXCLUDED.doc, updated_at = now()
            "#,
        )
        .bind(&candidate.full_name)
        .bind(candidate.id)
        .bind(Json(candidate))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert candidate {}", candidate.full_name))?;
        Ok(())
    }

    async fn list_candidates(&self, limit: usize) -> Result<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, (Json<Candidate>,)>(
            r#"SELECT doc FROM candidates ORDER BY full_name COLLATE "C" LIMIT $1"#,
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list candidates")?;

        Ok(rows.into_iter().map(|(Json(candidate),)| candidate).collect())
    }

    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, (Json<Job>,)>(
            r#"
            SELECT doc FROM jobs
            ORDER BY company_name COLLATE "C", job_title COLLATE "C"
            LIMIT $1
            "#,
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list jobs")?;

        Ok(rows.into_iter().map(|(Json(job),)| job).collect())
    }

    async fn list_companies(&self) -> Result<Vec<String>> {
        let rows = sqlx::query_as::<_, (String,)>("SELECT DISTINCT company_name FROM jobs")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list companies")?;

        let mut names: Vec<String> = rows.into_iter().map(|(name,)| name).collect();
        names.sort();
        Ok(names)
    }
}
