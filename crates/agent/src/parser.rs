//! Action parser for the text protocol.
//!
//! A response is scanned line by line. Markers are matched on the trimmed
//! line, case-insensitively:
//!
//! - `Action:` opens a new action (emitting the previous one if it has input)
//! - `Action Input:` starts the input buffer of the open action
//! - `Observation:` closes the input window without emitting
//!
//! Other lines inside an open input window are appended untrimmed, so
//! indentation in fenced code survives. The parser never fails: malformed
//! input degrades to raw text or is dropped.

use reactloop_core::action::{ActionInput, ParsedAction};

const ACTION: &str = "action:";
const ACTION_INPUT: &str = "action input:";
const OBSERVATION: &str = "observation:";
const FINAL_ANSWER: &str = "Final Answer:";

/// Strip a case-insensitive marker from the start of an already trimmed line.
fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let head = line.get(..marker.len())?;
    head.eq_ignore_ascii_case(marker)
        .then(|| &line[marker.len()..])
}

#[derive(Default)]
struct Pending {
    name: Option<String>,
    buffer: String,
    in_input: bool,
    in_observation: bool,
}

impl Pending {
    /// Emit the open action if it has a name and some input.
    fn flush(&mut self, out: &mut Vec<ParsedAction>) {
        if let Some(name) = self.name.take() {
            if !self.buffer.trim().is_empty() {
                out.push(ParsedAction::new(name, safe_parse_input(&self.buffer)));
            }
        }
        self.buffer.clear();
        self.in_input = false;
        self.in_observation = false;
    }
}

/// Extract every `Action:` / `Action Input:` pair, in order of appearance.
pub fn parse_actions(response: &str) -> Vec<ParsedAction> {
    let mut actions = Vec::new();
    let mut pending = Pending::default();

    for line in response.lines() {
        let trimmed = line.trim();

        if let Some(rest) = strip_marker(trimmed, ACTION) {
            pending.flush(&mut actions);
            let name = rest.trim().to_lowercase();
            pending.name = (!name.is_empty()).then_some(name);
        } else if let Some(rest) = strip_marker(trimmed, ACTION_INPUT) {
            pending.buffer = rest.trim().to_string();
            pending.in_input = true;
            pending.in_observation = false;
        } else if strip_marker(trimmed, OBSERVATION).is_some() {
            pending.in_observation = true;
        } else if pending.in_input && !pending.in_observation {
            pending.buffer.push('\n');
            pending.buffer.push_str(line);
        }
    }

    pending.flush(&mut actions);
    actions
}

/// Body of a fenced block: three backticks, an optional language tag line,
/// and a closing fence at the very end.
fn strip_fence(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("```")?.strip_suffix("```")?;
    match inner.split_once('\n') {
        Some((tag, body)) if is_language_tag(tag) => Some(body),
        _ => Some(inner),
    }
}

fn is_language_tag(tag: &str) -> bool {
    let tag = tag.trim();
    tag.is_empty()
        || tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Decode an input buffer: JSON when it decodes (fences stripped first),
/// otherwise the trimmed buffer verbatim.
pub fn safe_parse_input(buffer: &str) -> ActionInput {
    let trimmed = buffer.trim();
    let body = strip_fence(trimmed).map(str::trim).unwrap_or(trimmed);
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => ActionInput::Structured(value),
        Err(_) => ActionInput::Raw(trimmed.to_string()),
    }
}

/// The text after the last `Final Answer:` marker, trimmed.
pub fn extract_final_answer(response: &str) -> Option<String> {
    // Exact marker only; prose like "the final answer: ..." is not one.
    let at = response.rfind(FINAL_ANSWER)?;
    Some(response[at + FINAL_ANSWER.len()..].trim().to_string())
}
