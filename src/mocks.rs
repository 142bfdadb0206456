//! Mock injection: deterministic stand-ins for a generator's interactive
//! and config-reading behavior.
//!
//! [`mock_prompt`] and [`mock_local_config`] swap the corresponding seam on
//! a [`GeneratorInstance`]; [`restore_prompt`] undoes one prompt mock layer.

use crate::error::{ConfigReadError, PromptError};
use crate::generator::config::{ConfigSource, LocalConfig};
use crate::generator::prompt::{Answers, Prompter, Question};
use crate::generator::GeneratorInstance;
use serde_json::Value;

/// Prompter answering from a predetermined answer set.
///
/// Missing-answer policy: a question with no matching answer falls back to
/// its declared default; with no default either, the batch fails with
/// [`PromptError::MockMismatch`].
#[derive(Debug, Default)]
pub struct MockPrompter {
    answers: Answers,
}

impl MockPrompter {
    pub fn new(answers: Answers) -> Self {
        Self { answers }
    }
}

impl Prompter for MockPrompter {
    fn prompt(&mut self, questions: &[Question]) -> Result<Answers, PromptError> {
        let mut out = Answers::new();
        for question in questions {
            let value = if let Some(answer) = self.answers.get(question.name()) {
                answer.clone()
            } else if let Some(default) = question.default() {
                default.clone()
            } else {
                return Err(PromptError::MockMismatch(question.name().to_string()));
            };
            out.insert(question.name().to_string(), value);
        }
        Ok(out)
    }
}

/// In-memory config store standing in for values read back from disk.
#[derive(Debug, Default)]
pub struct MemoryConfigSource {
    values: LocalConfig,
}

impl MemoryConfigSource {
    pub fn new(values: LocalConfig) -> Self {
        Self { values }
    }
}

impl ConfigSource for MemoryConfigSource {
    fn get(&mut self, key: &str) -> Result<Option<Value>, ConfigReadError> {
        Ok(self.values.get(key).cloned())
    }

    fn get_all(&mut self) -> Result<LocalConfig, ConfigReadError> {
        Ok(self.values.clone())
    }
}

/// Replace the instance's prompt behavior with deterministic `answers`.
///
/// The previous prompter is saved; mocking twice stacks, and each
/// [`restore_prompt`] unwinds one layer.
pub fn mock_prompt(instance: &mut GeneratorInstance, answers: Answers) {
    let previous = instance.replace_prompter(Box::new(MockPrompter::new(answers)));
    instance.push_saved_prompter(previous);
}

/// Restore the prompt behavior saved by the most recent [`mock_prompt`].
/// No-op when mocking was never applied.
pub fn restore_prompt(instance: &mut GeneratorInstance) {
    if let Some(saved) = instance.pop_saved_prompter() {
        instance.replace_prompter(saved);
    }
}

/// Substitute the instance's config reads so they return `local_config` as
/// though it had been persisted. Real storage is never touched.
pub fn mock_local_config(instance: &mut GeneratorInstance, local_config: LocalConfig) {
    instance.replace_config_source(Box::new(MemoryConfigSource::new(local_config)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answers(pairs: &[(&str, Value)]) -> Answers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn mock_answers_by_question_name() {
        let mut prompter = MockPrompter::new(answers(&[("appName", json!("shop"))]));
        let out = prompter.prompt(&[Question::new("appName")]).unwrap();
        assert_eq!(out.get("appName"), Some(&json!("shop")));
    }

    #[test]
    fn unmatched_question_falls_back_to_declared_default() {
        let mut prompter = MockPrompter::default();
        let out = prompter
            .prompt(&[Question::new("useSass").with_default(false)])
            .unwrap();
        assert_eq!(out.get("useSass"), Some(&json!(false)));
    }

    #[test]
    fn unmatched_question_without_default_is_a_mismatch() {
        let mut prompter = MockPrompter::default();
        let err = prompter.prompt(&[Question::new("appName")]).unwrap_err();
        assert!(matches!(err, PromptError::MockMismatch(name) if name == "appName"));
    }

    #[test]
    fn memory_config_returns_injected_values() {
        let mut source = MemoryConfigSource::new(answers(&[("key", json!(1))]));
        assert_eq!(source.get("key").unwrap(), Some(json!(1)));
        assert_eq!(source.get("other").unwrap(), None);
        assert_eq!(source.get_all().unwrap().len(), 1);
    }
}
