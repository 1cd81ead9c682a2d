//! Build a ready-to-run agent from configuration.

use std::sync::Arc;

use reactloop_config::AppConfig;
use reactloop_core::error::{Error, Result};
use reactloop_core::provider::GenerationSettings;
use reactloop_core::tool::{Tool, ToolRegistry};
use reactloop_memory::KnowledgeStore;
use reactloop_providers::{ModelClient, RetryPolicy};
use reactloop_tools::{NoteManagerTool, common_tools, search_tool};
use tracing::{debug, info};

use crate::planner::PlannerTool;
use crate::react::ReactAgent;

/// Settings taken from the top-level config.
pub fn settings_from_config(config: &AppConfig) -> GenerationSettings {
    GenerationSettings {
        temperature: config.default_temperature,
        max_tokens: config.default_max_tokens,
    }
}

/// The model client for the default provider.
pub fn client_from_config(config: &AppConfig) -> Result<ModelClient> {
    let router = reactloop_providers::build_from_config(config);
    let provider = router.default().ok_or_else(|| Error::Config {
        message: format!("default provider '{}' is not available", router.default_name()),
    })?;
    let model = config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());

    Ok(ModelClient::new(provider, model).with_policy(RetryPolicy::from_config(&config.retry)))
}

/// Register tools in order, failing on duplicate names.
fn registry(tools: Vec<Arc<dyn Tool>>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool)?;
    }
    Ok(registry)
}

/// The full tool set: common tools, then notes and planner when enabled.
pub fn tools_from_config(config: &AppConfig, client: &ModelClient) -> Result<ToolRegistry> {
    let settings = settings_from_config(config);
    let mut tools = common_tools(&config.tools, client);

    if config.tools.enable_notes {
        match search_tool(&config.tools) {
            Some(search) => {
                let store = Arc::new(KnowledgeStore::new());
                tools.push(Arc::new(NoteManagerTool::new(
                    store,
                    client.provider().clone(),
                    &config.tools.embedding_model,
                    search.clone(),
                    search,
                )));
            }
            None => debug!("Note manager disabled: no search key configured"),
        }
    }

    if config.tools.enable_planner {
        let inner = ReactAgent::new(
            client.clone(),
            Arc::new(registry(common_tools(&config.tools, client))?),
        )
        .with_settings(settings)
        .with_max_steps(config.agent.max_steps)
        .with_max_tool_calls(config.agent.max_tool_calls)
        .with_stop_on_bare_response(config.agent.stop_on_bare_response);
        tools.push(Arc::new(PlannerTool::new(inner)));
    }

    registry(tools)
}

/// Assemble the top-level agent described by `config`.
pub fn build_from_config(config: &AppConfig) -> Result<ReactAgent> {
    let client = client_from_config(config)?;
    let tools = Arc::new(tools_from_config(config, &client)?);

    info!(
        provider = %config.default_provider,
        model = %client.model(),
        tools = ?tools.names(),
        "Agent assembled"
    );

    let mut agent = ReactAgent::new(client, tools)
        .with_settings(settings_from_config(config))
        .with_max_steps(config.agent.max_steps)
        .with_max_tool_calls(config.agent.max_tool_calls)
        .with_stop_on_bare_response(config.agent.stop_on_bare_response);
    if let Some(prompt) = &config.agent.system_prompt {
        agent = agent.with_system_prompt(prompt.clone());
    }
    Ok(agent)
}
