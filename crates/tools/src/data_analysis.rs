//! CSV analysis tool.
//!
//! CSV paths mentioned in the prompt are previewed (header and first rows)
//! and bound to `df_<stem>` names. The model writes pandas code against
//! those names; loaders are prepended and the program is executed.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use reactloop_core::action::ActionInput;
use reactloop_core::error::ToolError;
use reactloop_core::provider::GenerationSettings;
use reactloop_core::tool::Tool;
use reactloop_providers::ModelClient;
use regex_lite::Regex;
use tracing::{debug, warn};

use crate::code_engine::extract_code_block;
use crate::exec::Interpreter;

pub const NAME: &str = "data_analysis";

const PREVIEW_ROWS: usize = 5;

const SYSTEM_PROMPT: &str = "You are a Python data analyst. Use pandas and numpy only. \
Do not import CSVs, the DataFrames are already loaded with names like df_employees or \
df_states. Always use print() to show the final result. Output executable Python code only.";

static CSV_PATH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9_\-/\\.]+\.csv").ok());

/// A CSV file bound to a DataFrame variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub path: PathBuf,
    pub var_name: String,
}

impl Dataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let var_name = format!("df_{}", stem.replace(['-', ' ', '.'], "_"));
        Self { path, var_name }
    }
}

pub struct DataAnalysisTool {
    client: ModelClient,
    interpreter: Interpreter,
}

impl DataAnalysisTool {
    pub fn new(client: ModelClient, interpreter: Interpreter) -> Self {
        Self {
            client,
            interpreter,
        }
    }
}

/// CSV paths in the prompt that exist on disk, in order of mention.
pub fn extract_csv_paths(prompt: &str) -> Vec<PathBuf> {
    let Some(re) = CSV_PATH.as_ref() else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = Vec::new();
    for m in re.find_iter(prompt) {
        let path = PathBuf::from(m.as_str());
        if path.exists() && !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

/// Header plus the first rows of each file, for the model to see.
pub async fn schema_preview(datasets: &[Dataset]) -> Result<String, ToolError> {
    let mut text = String::new();
    let mut loaded = 0;

    for ds in datasets {
        let filename = ds
            .path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        match tokio::fs::read_to_string(&ds.path).await {
            Ok(content) => {
                let mut lines = content.lines();
                let header = lines.next().unwrap_or_default();
                let rows: Vec<&str> = lines.take(PREVIEW_ROWS).collect();
                text.push_str(&format!(
                    "{filename} -> `{}`\n\nColumns: {header}\n\nSample Rows:\n```\n{}\n```\n\n---\n\n",
                    ds.var_name,
                    rows.join("\n")
                ));
                loaded += 1;
            }
            Err(e) => {
                warn!(path = %ds.path.display(), error = %e, "Could not load CSV");
                text.push_str(&format!("Could not load {filename}: {e}\n\n"));
            }
        }
    }

    if loaded == 0 {
        return Err(ToolError::ExecutionFailed {
            tool_name: NAME.into(),
            reason: "CSV files found in prompt, but none could be loaded.".into(),
        });
    }
    Ok(text)
}

/// Whether a line can be evaluated and printed on its own.
fn is_bare_expression(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || line.starts_with([' ', '\t']) {
        return false;
    }
    if ["print", "#", "import", "from", "return", "if ", "for ", "while ", "def ", "class "]
        .iter()
        .any(|p| trimmed.starts_with(p))
    {
        return false;
    }
    // Plain assignment, not a comparison.
    let assigns = trimmed
        .match_indices('=')
        .any(|(i, _)| {
            let before = trimmed[..i].chars().last();
            let after = trimmed[i + 1..].chars().next();
            !matches!(before, Some('=' | '!' | '<' | '>')) && after != Some('=')
        });
    !assigns
}

/// Loader lines, the generated body, and a print of a trailing bare expression.
pub fn assemble_program(datasets: &[Dataset], code: &str) -> String {
    let mut program = String::from("import pandas as pd\n");
    for ds in datasets {
        program.push_str(&format!(
            "{} = pd.read_csv({:?})\n",
            ds.var_name,
            ds.path.display().to_string()
        ));
    }

    let code = code.trim();
    let lines: Vec<&str> = code.lines().collect();
    match lines.split_last() {
        Some((last, body)) if !body.is_empty() && is_bare_expression(last) => {
            program.push_str(&body.join("\n"));
            program.push_str(&format!("\nprint({})\n", last.trim()));
        }
        _ => {
            program.push_str(code);
            program.push('\n');
        }
    }
    program
}

fn dataset_paths(datasets: &[Dataset]) -> Vec<&Path> {
    datasets.iter().map(|d| d.path.as_path()).collect()
}

#[async_trait]
impl Tool for DataAnalysisTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A tool for analyzing and manipulating one or more CSV datasets using pandas. You can \
         ask complex queries involving filters, joins, aggregations, selection, manipulation, \
         data Q/A etc."
    }

    fn argument_spec(&self) -> &str {
        "A natural language string describing a data task such as 'Join employee.csv and \
         department.csv to find average salary per department'. CSV files mentioned in the \
         prompt must exist."
    }

    async fn run(
        &self,
        input: ActionInput,
        settings: &GenerationSettings,
    ) -> Result<String, ToolError> {
        let task = input.as_text();
        let datasets: Vec<Dataset> = extract_csv_paths(&task)
            .into_iter()
            .map(Dataset::new)
            .collect();
        if datasets.is_empty() {
            return Ok("No valid CSV file paths found in the prompt.".into());
        }
        debug!(files = ?dataset_paths(&datasets), "Analyzing CSV files");

        let schema = match schema_preview(&datasets).await {
            Ok(schema) => schema,
            Err(e) => return Ok(format!("Tool failed: {e}")),
        };

        let prompt = format!(
            "You are a data scientist. The following DataFrames are available:\n\n{schema}\n\n\
             Task: {task}\n\nWrite pandas code that solves the task using the DataFrames above. \
             Do NOT read CSVs, assume they are already loaded as variables. End your code with a \
             final expression that returns the result, like a variable or value. Use print() to \
             ensure the result is visible in the output. Output code only inside ```python code blocks."
        );

        let response = self
            .client
            .ask(Some(SYSTEM_PROMPT), &prompt, settings)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: e.to_string(),
            })?;

        let Some(code) = extract_code_block(&response) else {
            return Ok(format!(
                "Could not extract Python code.\nResponse was:\n{response}"
            ));
        };

        let program = assemble_program(&datasets, &code);
        match self.interpreter.run(NAME, &program).await {
            Ok(out) if out.success => Ok(format!(
                "Code Executed Successfully:\n\nCode:\n{code}\n\nOutput:\n{}",
                out.stdout
            )),
            Ok(out) => Ok(format!(
                "Code:\n{code}\n\nExecution failed:\n{}",
                out.error_text()
            )),
            Err(ToolError::Timeout { timeout_secs, .. }) => Ok(format!(
                "Code:\n{code}\n\nExecution failed:\ntimed out after {timeout_secs}s"
            )),
            Err(e) => Err(e),
        }
    }
}
