//! Knowledge storage for ReactLoop tools.
//!
//! The note manager keeps ingested text together with its embedding here and
//! looks up the nearest note for a query.

pub mod knowledge;
pub mod vector;

pub use knowledge::{KnowledgeStore, Note, ScoredNote};
pub use vector::{cosine_similarity, rank_by_similarity};
