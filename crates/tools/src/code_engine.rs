//! Code generation and execution tool.
//!
//! Input that already looks like a program is run as-is. Anything else is
//! treated as a task description: the model writes a fenced Python program,
//! packages named on a leading `pip install` comment are installed, and the
//! program is executed with the configured interpreter.

use std::sync::LazyLock;

use async_trait::async_trait;
use reactloop_core::action::ActionInput;
use reactloop_core::error::{GenerationError, ToolError};
use reactloop_core::provider::GenerationSettings;
use reactloop_core::tool::Tool;
use reactloop_providers::ModelClient;
use regex_lite::Regex;
use tracing::{debug, info};

use crate::exec::Interpreter;

pub const NAME: &str = "code_engine";

const SYSTEM_PROMPT: &str = "You are a Python code generator. Respond only with executable \
Python code, no explanations or comments except for required pip installations at the top. \
Return the code within ```python and ``` strings. The first line should be a commented out \
pip install statement.";

pub struct CodeEngineTool {
    client: ModelClient,
    interpreter: Interpreter,
}

impl CodeEngineTool {
    pub fn new(client: ModelClient, interpreter: Interpreter) -> Self {
        Self {
            client,
            interpreter,
        }
    }

    async fn generate(
        &self,
        task: &str,
        settings: &GenerationSettings,
    ) -> Result<String, GenerationError> {
        let prompt = format!(
            "Generate Python code to {task}. If you need to use any external libraries, \
             include a comment at the top of the code listing the required pip installations."
        );
        self.client.ask(Some(SYSTEM_PROMPT), &prompt, settings).await
    }

    /// Install declared packages and run the program.
    async fn execute(&self, code: &str) -> Result<String, ToolError> {
        let packages = pip_packages(code);
        if !packages.is_empty() {
            info!(packages = ?packages, "Installing declared packages");
            if let Err(e) = self.interpreter.pip_install(NAME, &packages).await {
                return Ok(failure(code, &e.to_string()));
            }
        }

        match self.interpreter.run(NAME, code).await {
            Ok(out) if out.success => {
                let stdout = out.stdout.trim();
                if stdout.is_empty() {
                    Ok(format!("Code: {code}\n\n\nCode Executed Successfully"))
                } else {
                    Ok(format!(
                        "Code: {code}\n\nOutput:\n{stdout}\n\nCode Executed Successfully"
                    ))
                }
            }
            Ok(out) => Ok(failure(code, &out.error_text())),
            Err(ToolError::Timeout { timeout_secs, .. }) => Ok(failure(
                code,
                &format!("execution timed out after {timeout_secs}s"),
            )),
            Err(e) => Err(e),
        }
    }
}

fn failure(code: &str, error: &str) -> String {
    format!("Code: {code}\n\nCode execution caused an error: {error}")
}

static CODE_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```python\s*([\s\S]*?)\s*```").ok());

/// Whether the text is already a program rather than a task description.
pub fn looks_like_code(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with("```python")
        || trimmed.starts_with('#')
        || trimmed.starts_with("import")
        || text.contains("def ")
        || text.contains("class ")
        || trimmed.ends_with(':')
}

/// The body of the first ```python fenced block, if any.
pub fn extract_code_block(text: &str) -> Option<String> {
    CODE_BLOCK
        .as_ref()?
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Packages listed on a leading `# pip install a b` (or `a, b`) line.
pub fn pip_packages(code: &str) -> Vec<String> {
    let Some(first) = code.lines().next() else {
        return Vec::new();
    };
    let Some((_, rest)) = first.rsplit_once("pip install") else {
        return Vec::new();
    };
    let rest = rest.trim();
    let parts: Vec<&str> = if rest.contains(',') {
        rest.split(',').collect()
    } else {
        rest.split_whitespace().collect()
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[async_trait]
impl Tool for CodeEngineTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A coding tool that can take a prompt and generate executable Python code. It parses \
         and executes the code. Returns the code and the error if the code execution fails."
    }

    fn argument_spec(&self) -> &str {
        "A single string parameter describing the coding task. Do not include any code or \
         comments. The tool will generate the code for you."
    }

    async fn run(
        &self,
        input: ActionInput,
        settings: &GenerationSettings,
    ) -> Result<String, ToolError> {
        let text = input.as_text();

        let source = if looks_like_code(&text) {
            debug!("Input is already code, executing directly");
            text.clone()
        } else {
            debug!("Input is a task description, generating code");
            self.generate(&text, settings)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: NAME.into(),
                    reason: e.to_string(),
                })?
        };

        let code = match extract_code_block(&source) {
            Some(code) => code,
            None if looks_like_code(&source) && !source.trim_start().starts_with("```") => {
                source.trim().to_string()
            }
            None => {
                return Ok(failure(
                    "No Python code block found",
                    "Failed to extract code",
                ));
            }
        };

        self.execute(&code).await
    }
}
