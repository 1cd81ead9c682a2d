//! `reactloop agent`: single-message or interactive chat mode.

use std::io::Write;

use reactloop_agent::{ReactAgent, RunResult, Termination};
use reactloop_config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early and give a clear error
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export OPENAI_API_KEY=sk-...          (OpenAI)");
        eprintln!("    export OPENROUTER_API_KEY=sk-or-...   (OpenRouter)");
        eprintln!("    export REACTLOOP_API_KEY=sk-...       (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let mut agent = reactloop_agent::build_from_config(&config)?;

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let result = agent.run(&msg, clear).await;
        eprint!("\r              \r");
        let result = result?;
        tracing::debug!(
            termination = %result.termination,
            steps = result.steps,
            tool_calls = result.tool_calls,
            "Run finished"
        );
        println!("{}", result.answer);
        return Ok(());
    }

    println!();
    println!("  ReactLoop agent (interactive)");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", agent.client().model());
    println!("  Tools:     {}", agent.tools().names().join(", "));
    println!(
        "  Budgets:   {} steps, {} tool calls per run",
        config.agent.max_steps, config.agent.max_tool_calls
    );
    println!();
    println!("  Type your message and press Enter.");
    println!("  '/clear' resets the history, 'exit' quits.");
    println!();

    interactive(&mut agent, clear).await?;

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

async fn interactive(agent: &mut ReactAgent, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "/clear" => {
                agent.clear_history();
                println!("  History cleared.");
                println!();
                continue;
            }
            _ => {}
        }

        eprint!("  ...");
        match agent.run(input, clear).await {
            Ok(result) => {
                eprint!("\r     \r");
                println!();
                print_result(&result);
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    Ok(())
}

fn print_result(result: &RunResult) {
    for line in result.answer.lines() {
        println!("  Assistant > {line}");
    }
    if result.termination != Termination::FinalAnswer {
        println!(
            "  ({}, {} steps, {} tool calls)",
            result.termination, result.steps, result.tool_calls
        );
    }
}
