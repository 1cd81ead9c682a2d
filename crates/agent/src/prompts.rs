//! System and continuation prompts for the text protocol.
//!
//! `{tools}` is replaced with the tool catalogue and `{tool_names}` with the
//! comma-separated tool names.

use reactloop_core::tool::ToolRegistry;

pub const REACT_PROMPT_TEMPLATE: &str = r#"Answer the following questions as best you can. You have access to the following tools:

{tools}

IMPORTANT: When you receive real-time information from the external tools, trust that information and include it in your final answer, even if it concerns events beyond your training cutoff.

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question"#;

pub const CONTINUATION_PROMPT_TEMPLATE: &str = r#"Provided the observation from the tool, answer the question. You can call further tool usage or provide the final answer.

Use the following format:
Question: the input question you must answer
Thought: think to call further tools or provide the final answer
Action: the action to take, either one of [{tool_names}] or "Final Answer"
Action Input: the input to the action if applicable
Observation: the result of the action if applicable
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question"#;

fn render(template: &str, tools: &ToolRegistry) -> String {
    template
        .replace("{tools}", &tools.catalogue())
        .replace("{tool_names}", &tools.names().join(", "))
}

/// The protocol description, including the tool catalogue.
pub fn react_prompt(tools: &ToolRegistry) -> String {
    render(REACT_PROMPT_TEMPLATE, tools)
}

/// The "summarize and decide" instruction issued between rounds.
pub fn continuation_prompt(tools: &ToolRegistry) -> String {
    render(CONTINUATION_PROMPT_TEMPLATE, tools)
}
