//! Built-in tool implementations for ReactLoop.
//!
//! Tools give the agent the ability to act: search the internet, generate
//! and run code, analyze CSV files, build slide decks, and keep notes.
//! The planner tool lives in the agent crate because it drives an agent.

pub mod ares_search;
pub mod code_engine;
pub mod data_analysis;
pub mod exec;
pub mod note_manager;
pub mod slide_generation;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;
use std::time::Duration;

use reactloop_config::ToolsConfig;
use reactloop_core::tool::Tool;
use reactloop_providers::ModelClient;

pub use ares_search::AresSearchTool;
pub use code_engine::CodeEngineTool;
pub use data_analysis::DataAnalysisTool;
pub use exec::Interpreter;
pub use note_manager::NoteManagerTool;
pub use slide_generation::SlideGenerationTool;

/// The search tool, when an Ares key is configured.
pub fn search_tool(config: &ToolsConfig) -> Option<Arc<dyn Tool>> {
    config
        .ares_api_key
        .as_ref()
        .map(|key| Arc::new(AresSearchTool::new(&config.ares_url, key)) as Arc<dyn Tool>)
}

/// The tools every agent gets: search (if configured), code, data, slides.
///
/// `client` is the run's model client; per-tool model overrides from the
/// config are applied on top of it.
pub fn common_tools(config: &ToolsConfig, client: &ModelClient) -> Vec<Arc<dyn Tool>> {
    let interpreter = Interpreter::new(
        &config.interpreter,
        Duration::from_secs(config.exec_timeout_secs),
    );
    let code_client = config
        .code_model
        .as_ref()
        .map_or_else(|| client.clone(), |m| client.with_model(m));
    let data_client = config
        .data_model
        .as_ref()
        .map_or_else(|| client.clone(), |m| client.with_model(m));

    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
    if let Some(search) = search_tool(config) {
        tools.push(search);
    }
    tools.push(Arc::new(CodeEngineTool::new(code_client, interpreter.clone())));
    tools.push(Arc::new(DataAnalysisTool::new(data_client, interpreter)));
    tools.push(Arc::new(SlideGenerationTool::new(&config.output_dir)));
    tools
}
