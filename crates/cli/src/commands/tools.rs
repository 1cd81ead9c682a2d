//! `reactloop tools`: show what the agent is told about its tools.

use reactloop_agent::prompts;
use reactloop_config::AppConfig;

pub async fn run(full_prompt: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let client = reactloop_agent::client_from_config(&config)?;
    let tools = reactloop_agent::tools_from_config(&config, &client)?;

    if full_prompt {
        println!("{}", prompts::react_prompt(&tools));
        return Ok(());
    }

    println!("{}", tools.catalogue());
    if config.tools.ares_api_key.is_none() {
        println!("(set TRAVERSAAL_ARES_API_KEY to enable ares_search and note_manager)");
    }
    Ok(())
}
