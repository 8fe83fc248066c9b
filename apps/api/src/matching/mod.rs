//! Matching engine: geographic filtering, keyword features, similarity
//! scoring, explanation building and candidate ranking.
//!
//! Nothing in here talks to the network directly. Text generation arrives as
//! an injected `TextGenerator`, so the whole engine runs against fakes in tests.

use thiserror::Error;

pub mod explanation;
pub mod geo;
pub mod handlers;
pub mod keywords;
pub mod prompts;
pub mod ranking;
pub mod similarity;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("missing embedding: {0}")]
    MissingEmbedding(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
