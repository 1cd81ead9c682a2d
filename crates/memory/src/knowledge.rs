//! An in-process note store with nearest-neighbour lookup.
//!
//! Owned explicitly and shared by `Arc`; mutations go through a
//! `tokio::sync::RwLock` so concurrent readers never see a half-added note.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::vector::rank_by_similarity;

/// A stored piece of text and its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// A note returned from a search, with its cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredNote {
    pub note: Note,
    pub score: f32,
}

#[derive(Debug, Default)]
pub struct KnowledgeStore {
    notes: RwLock<Vec<Note>>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a note and return its id.
    pub async fn add(&self, text: impl Into<String>, embedding: Vec<f32>) -> String {
        let note = Note {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            embedding,
            created_at: Utc::now(),
        };
        let id = note.id.clone();
        let mut notes = self.notes.write().await;
        notes.push(note);
        debug!(note_id = %id, total = notes.len(), "Note stored");
        id
    }

    /// The `limit` most similar notes scoring at least `min_score`, best first.
    pub async fn search(&self, query: &[f32], limit: usize, min_score: f32) -> Vec<ScoredNote> {
        let notes = self.notes.read().await;
        rank_by_similarity(
            notes.iter().map(|n| n.embedding.as_slice()),
            query,
            limit,
            min_score,
        )
        .into_iter()
        .map(|(i, score)| ScoredNote {
            note: notes[i].clone(),
            score,
        })
        .collect()
    }

    /// The single nearest note, if any scores at least `min_score`.
    pub async fn nearest(&self, query: &[f32], min_score: f32) -> Option<ScoredNote> {
        self.search(query, 1, min_score).await.into_iter().next()
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.notes.write().await.clear();
    }
}
