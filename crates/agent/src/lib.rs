//! The reasoning-action loop, the heart of ReactLoop.
//!
//! The agent follows a **Thought → Action → Observation** cycle:
//!
//! 1. **Receive** a prompt and append it to the conversation
//! 2. **Generate** a response through the retrying model client
//! 3. **Parse** `Action:` / `Action Input:` pairs from the text
//! 4. **Dispatch** each action to its tool, folding observations back in
//! 5. **Stop** on a final answer, a bare response or an exhausted budget,
//!    otherwise ask the model to continue and loop back to step 2
//!
//! Step and tool-call ceilings bound every run.

pub mod assembly;
pub mod dispatcher;
pub mod parser;
pub mod planner;
pub mod prompts;
pub mod react;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assembly::{build_from_config, client_from_config, tools_from_config};
pub use dispatcher::{DispatchOutcome, ToolDispatcher};
pub use parser::{extract_final_answer, parse_actions, safe_parse_input};
pub use planner::PlannerTool;
pub use react::{ReactAgent, RunResult, Termination};
