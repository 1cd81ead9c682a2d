//! Note manager: embedding-backed notes over a shared knowledge store.
//!
//! A query is embedded and matched against stored notes. On a miss, content
//! is fetched from the source tool and ingested, and the model is asked to
//! call again. On a hit the nearest note is condensed by the summarizer tool.

use std::sync::Arc;

use async_trait::async_trait;
use reactloop_core::action::ActionInput;
use reactloop_core::error::ToolError;
use reactloop_core::provider::{EmbeddingRequest, GenerationSettings, Provider};
use reactloop_core::tool::Tool;
use reactloop_memory::KnowledgeStore;
use tracing::{debug, info, warn};

pub const NAME: &str = "note_manager";

pub struct NoteManagerTool {
    store: Arc<KnowledgeStore>,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
    source: Arc<dyn Tool>,
    summarizer: Arc<dyn Tool>,
    min_score: f32,
}

impl NoteManagerTool {
    pub fn new(
        store: Arc<KnowledgeStore>,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
        source: Arc<dyn Tool>,
        summarizer: Arc<dyn Tool>,
    ) -> Self {
        Self {
            store,
            embedder,
            embedding_model: embedding_model.into(),
            source,
            summarizer,
            min_score: -1.0,
        }
    }

    /// Only notes at least this similar to the query count as a hit.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![text.to_string()],
            })
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: format!("embedding failed: {e}"),
            })?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: "embedding response was empty".into(),
            })
    }

    /// Fetch content for `query` from the source tool and store it.
    async fn ingest(&self, query: &str, settings: &GenerationSettings) -> String {
        match self.source.run(ActionInput::Raw(query.into()), settings).await {
            Ok(content) if !content.trim().is_empty() => match self.embed(&content).await {
                Ok(embedding) => {
                    let id = self.store.add(content, embedding).await;
                    info!(note_id = %id, source = %self.source.name(), "Note ingested");
                    " Content ingested successfully.".into()
                }
                Err(e) => format!(" Error during ingestion: {e}"),
            },
            Ok(_) => " Unexpected source result format.".into(),
            Err(e) => {
                warn!(source = %self.source.name(), error = %e, "Ingestion failed");
                format!(" Error during ingestion: {e}")
            }
        }
    }
}

#[async_trait]
impl Tool for NoteManagerTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Create notes. Searches the internet for content on a topic and summarizes the most \
         relevant stored note."
    }

    fn argument_spec(&self) -> &str {
        "A question or topic like 'explain transformers'"
    }

    async fn run(
        &self,
        input: ActionInput,
        settings: &GenerationSettings,
    ) -> Result<String, ToolError> {
        let query = input.as_text();
        if query.trim().is_empty() {
            return Ok("Please enter a valid query.".into());
        }

        let embedding = self.embed(&query).await?;
        let Some(hit) = self.store.nearest(&embedding, self.min_score).await else {
            debug!(query = %query, "No matching note");
            let result = self.ingest(&query, settings).await;
            return Ok(format!(
                "No matching notes found. Ingested from {}.{result} Call again to summarize.",
                self.source.name()
            ));
        };

        debug!(note_id = %hit.note.id, score = hit.score, "Summarizing nearest note");
        match self
            .summarizer
            .run(ActionInput::Raw(hit.note.text), settings)
            .await
        {
            Ok(summary) => Ok(format!("[FINALIZED NOTES]\n{summary}")),
            Err(e) => Ok(format!("Found a note but summarization failed: {e}")),
        }
    }
}
