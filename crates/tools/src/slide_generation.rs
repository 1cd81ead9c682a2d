//! Slide deck generation tool.
//!
//! Takes a list of `{slide_title, content}` objects and writes a Markdown
//! deck (one `---`-separated section per slide) named after the first title.
//! Results and validation failures are both returned as JSON text.

use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use reactloop_core::action::ActionInput;
use reactloop_core::error::ToolError;
use reactloop_core::provider::GenerationSettings;
use reactloop_core::tool::Tool;
use regex_lite::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

pub const NAME: &str = "slide_generation";

static UNSAFE_CHARS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[^0-9a-zA-Z]+").ok());

/// One slide as supplied by the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Slide {
    pub slide_title: String,
    #[serde(deserialize_with = "content_text")]
    pub content: String,
}

/// Slide content may be a string or a list of lines.
fn content_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Content {
        Text(String),
        Lines(Vec<String>),
    }
    Ok(match Content::deserialize(deserializer)? {
        Content::Text(text) => text,
        Content::Lines(lines) => lines.join("\n"),
    })
}

pub struct SlideGenerationTool {
    output_dir: PathBuf,
}

impl SlideGenerationTool {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

/// Decode and validate the tool input into slides.
///
/// The error side is the JSON object returned to the model.
pub fn parse_slides(input: &ActionInput) -> Result<Vec<Slide>, Value> {
    let value = match input {
        ActionInput::Structured(Value::String(text)) | ActionInput::Raw(text) => {
            serde_json::from_str::<Value>(text).map_err(|e| {
                json!({
                    "error": format!("Failed to parse input as JSON: {e}"),
                    "raw_input": text,
                })
            })?
        }
        ActionInput::Structured(value) => value.clone(),
    };

    let Some(items) = value.as_array().filter(|items| items.iter().all(Value::is_object)) else {
        return Err(json!({
            "error": "Input must be a list of dictionaries with 'slide_title' and 'content'.",
            "raw_input": value,
        }));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<Slide>(item.clone()).map_err(|_| {
                json!({
                    "error": format!("Slide {i} is missing 'slide_title' or 'content'."),
                    "slide_data": item,
                })
            })
        })
        .collect()
}

/// File stem derived from the deck title.
pub fn deck_file_stem(title: &str) -> String {
    let stem = match UNSAFE_CHARS.as_ref() {
        Some(re) => re.replace_all(title, "_").to_string(),
        None => title.to_string(),
    };
    if stem.trim_matches('_').is_empty() {
        "Presentation".to_string()
    } else {
        stem
    }
}

/// Render slides as a Markdown deck.
pub fn render_markdown(slides: &[Slide]) -> String {
    slides
        .iter()
        .map(|slide| {
            let bullets: Vec<String> = slide
                .content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| format!("- {}", l.trim_start_matches(['-', '*', ' '])))
                .collect();
            format!("# {}\n\n{}\n", slide.slide_title.trim(), bullets.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

#[async_trait]
impl Tool for SlideGenerationTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A tool that can create a slide deck for content. It takes a list of dictionaries. Each \
         dictionary represents a slide with two keys: 'slide_title' and 'content'."
    }

    fn argument_spec(&self) -> &str {
        "List[Dict[slide_title, content]]. Ensure the Action Input is JSON parseable so I can \
         convert it to required format"
    }

    async fn run(
        &self,
        input: ActionInput,
        _settings: &GenerationSettings,
    ) -> Result<String, ToolError> {
        let slides = match parse_slides(&input) {
            Ok(slides) if !slides.is_empty() => slides,
            Ok(_) => return Ok(json!({"error": "No slides supplied."}).to_string()),
            Err(error) => return Ok(error.to_string()),
        };

        let path = self
            .output_dir
            .join(format!("{}.md", deck_file_stem(&slides[0].slide_title)));

        let write = async {
            tokio::fs::create_dir_all(&self.output_dir).await?;
            tokio::fs::write(&path, render_markdown(&slides)).await
        };
        write.await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: NAME.into(),
            reason: format!("could not write {}: {e}", path.display()),
        })?;

        info!(path = %path.display(), slides = slides.len(), "Slide deck written");

        Ok(json!({
            "message": "Slide deck created successfully!",
            "file_path": path.display().to_string(),
            "slide_count": slides.len(),
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck_input() -> Value {
        json!([
            {"slide_title": "Intro to Rust", "content": "Memory safety\nNo GC"},
            {"slide_title": "Ownership", "content": ["Moves", "Borrows"]},
        ])
    }

    #[test]
    fn structured_and_text_inputs_parse() {
        let slides = parse_slides(&ActionInput::Structured(deck_input())).unwrap();
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[1].content, "Moves\nBorrows");

        let text = ActionInput::Raw(deck_input().to_string());
        assert_eq!(parse_slides(&text).unwrap(), slides);

        let quoted = ActionInput::Structured(Value::String(deck_input().to_string()));
        assert_eq!(parse_slides(&quoted).unwrap(), slides);
    }

    #[test]
    fn validation_errors() {
        let err = parse_slides(&ActionInput::Raw("not json".into())).unwrap_err();
        assert!(err["error"].as_str().unwrap().starts_with("Failed to parse input as JSON"));
        assert_eq!(err["raw_input"], "not json");

        let err = parse_slides(&ActionInput::Structured(json!({"slide_title": "x"}))).unwrap_err();
        assert!(err["error"].as_str().unwrap().contains("list of dictionaries"));

        let err = parse_slides(&ActionInput::Structured(json!([{"slide_title": "x"}]))).unwrap_err();
        assert_eq!(err["error"], "Slide 0 is missing 'slide_title' or 'content'.");
    }

    #[test]
    fn file_stem_sanitized() {
        assert_eq!(deck_file_stem("Intro to Rust: Part 1"), "Intro_to_Rust_Part_1");
        assert_eq!(deck_file_stem("???"), "Presentation");
    }

    #[test]
    fn markdown_rendering() {
        let slides = parse_slides(&ActionInput::Structured(deck_input())).unwrap();
        let md = render_markdown(&slides);
        assert_eq!(
            md,
            "# Intro to Rust\n\n- Memory safety\n- No GC\n\n---\n\n# Ownership\n\n- Moves\n- Borrows\n"
        );
    }

    #[tokio::test]
    async fn writes_deck_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SlideGenerationTool::new(dir.path().join("decks"));

        let out = tool
            .run(
                ActionInput::Structured(deck_input()),
                &GenerationSettings::default(),
            )
            .await
            .unwrap();

        let result: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(result["slide_count"], 2);
        let path = PathBuf::from(result["file_path"].as_str().unwrap());
        assert!(path.ends_with("Intro_to_Rust.md"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with("# Intro to Rust"));
    }

    #[tokio::test]
    async fn invalid_input_returns_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SlideGenerationTool::new(dir.path());
        let out = tool
            .run(ActionInput::Raw("[1, 2]".into()), &GenerationSettings::default())
            .await
            .unwrap();
        let result: Value = serde_json::from_str(&out).unwrap();
        assert!(result["error"].is_string());
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
