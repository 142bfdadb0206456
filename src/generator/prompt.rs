//! Prompt seam: the overridable question-asking capability of a generator.
//!
//! Generators never talk to a terminal directly; they hand a list of
//! [`Question`]s to whatever [`Prompter`] is currently installed on their
//! instance. The default is a `dialoguer`-backed terminal prompter; the
//! harness swaps in a mock for test runs.

use crate::error::PromptError;
use serde_json::Value;

/// Answers keyed by question name.
pub type Answers = serde_json::Map<String, Value>;

/// A single prompt question.
#[derive(Debug, Clone)]
pub struct Question {
    name: String,
    message: String,
    default: Option<Value>,
}

impl Question {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            message: name.clone(),
            name,
            default: None,
        }
    }

    /// Human-readable message shown by a real prompter.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Declared default answer, used when interaction is skipped.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Question-asking capability installed on a generator instance.
pub trait Prompter: Send {
    /// Answer every question, in order. One failed question fails the batch.
    fn prompt(&mut self, questions: &[Question]) -> Result<Answers, PromptError>;
}

/// Interactive prompter backed by `dialoguer`.
///
/// Boolean defaults render as a confirm prompt, everything else as free-text
/// input. Only reached when a generator runs unmocked.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, questions: &[Question]) -> Result<Answers, PromptError> {
        let mut answers = Answers::new();
        for question in questions {
            let value = match question.default() {
                Some(Value::Bool(default)) => {
                    let confirmed = dialoguer::Confirm::new()
                        .with_prompt(question.message())
                        .default(*default)
                        .interact()
                        .map_err(|e| PromptError::Interact(e.to_string()))?;
                    Value::Bool(confirmed)
                }
                other => {
                    let mut input = dialoguer::Input::<String>::new().with_prompt(question.message());
                    if let Some(Value::String(default)) = other {
                        input = input.default(default.clone());
                    }
                    let text = input
                        .interact_text()
                        .map_err(|e| PromptError::Interact(e.to_string()))?;
                    Value::String(text)
                }
            };
            answers.insert(question.name().to_string(), value);
        }
        Ok(answers)
    }
}
