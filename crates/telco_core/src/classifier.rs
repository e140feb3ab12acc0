//! Language-model query classification.
//!
//! The model is the only source of classification. Its answer is mapped onto
//! [`Category`] with [`Category::from_label`]; an unrecognised answer degrades
//! to `unclassified`, while a failed call is a [`ClassifierError`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use telco_llm::{ChatMessage, CompletionRequest, LanguageModel};

use crate::config::AssistantConfig;
use crate::error::ClassifierResult;
use crate::state::{Category, SessionState};

/// Maps a query to a category.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, state: &SessionState) -> ClassifierResult<Category>;
}

/// Sampling and context settings for [`LlmClassifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub history_turns: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 16,
            history_turns: 3,
        }
    }
}

impl From<&AssistantConfig> for ClassifierSettings {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            history_turns: config.classifier.history_turns,
        }
    }
}

/// Classifier backed by one chat-completion call per query.
pub struct LlmClassifier {
    model: Arc<dyn LanguageModel>,
    settings: ClassifierSettings,
}

impl LlmClassifier {
    pub fn new(model: Arc<dyn LanguageModel>, settings: ClassifierSettings) -> Self {
        Self { model, settings }
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Build the single request sent for `state`.
    ///
    /// Recent history goes in as prior turns so follow-ups ("and what about
    /// roaming?") classify in context; the current query is the last user
    /// turn.
    pub fn build_request(&self, state: &SessionState) -> CompletionRequest {
        let history = state.history();
        let skip = history.len().saturating_sub(self.settings.history_turns);

        let mut messages = Vec::with_capacity(2 * (history.len() - skip) + 1);
        for exchange in &history[skip..] {
            messages.push(ChatMessage::user(&exchange.query));
            messages.push(ChatMessage::assistant(&exchange.response));
        }
        messages.push(ChatMessage::user(state.query()));

        CompletionRequest::new(messages)
            .with_system(system_prompt())
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, state: &SessionState) -> ClassifierResult<Category> {
        let request = self.build_request(state);
        debug!(
            turns = request.messages.len(),
            "Requesting classification"
        );

        let completion = self.model.complete(&request).await?;
        let category = Category::from_label(&completion.content);

        if category == Category::Unclassified {
            warn!(
                raw = %completion.content.trim(),
                "Model answered with an unknown label; treating as unclassified"
            );
        } else {
            info!("Query classified as: {}", category);
        }
        Ok(category)
    }
}

/// System prompt listing the allowed labels with a few examples each.
pub fn system_prompt() -> String {
    let mut prompt = String::from(CLASSIFIER_PREAMBLE);
    for category in Category::KNOWN {
        prompt.push_str(&format!(
            "\n{} - {}\n",
            category.as_str(),
            category.description()
        ));
        for example in examples(category) {
            prompt.push_str(&format!("  e.g. \"{}\"\n", example));
        }
    }
    prompt.push_str(CLASSIFIER_INSTRUCTION);
    prompt
}

fn examples(category: Category) -> &'static [&'static str] {
    match category {
        Category::Billing => &["Why is my bill high?", "What charges were added?"],
        Category::Network => &["My 5G is slow", "I can't make calls"],
        Category::Recommendation => &["Best plan for roaming?", "I need more data"],
        Category::Technical => &["How do I enable VoLTE?", "What are the APN settings?"],
        Category::Unclassified => &[],
    }
}

const CLASSIFIER_PREAMBLE: &str = "You are a telecom customer-service query classifier.\n\
Classify the user's latest message into exactly ONE of the following categories:\n";

const CLASSIFIER_INSTRUCTION: &str = "\nIf the message fits none of these, answer with \"unclassified\".\n\
Respond ONLY with the category name, in lowercase, with no punctuation or explanation.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifierError;
    use crate::state::{Exchange, Role, SessionContext};
    use telco_llm::{ChatRole, ScriptedModel};

    fn state_with_history(query: &str, turns: usize) -> SessionState {
        let history = (0..turns)
            .map(|i| Exchange::new(format!("q{}", i), format!("a{}", i)))
            .collect();
        SessionState::new(
            query,
            SessionContext::new("CUST001", Role::Customer).with_history(history),
        )
    }

    #[test]
    fn test_prompt_lists_every_known_label() {
        let prompt = system_prompt();
        for category in Category::KNOWN {
            assert!(prompt.contains(category.as_str()));
        }
        assert!(prompt.contains("ONLY"));
    }

    #[test]
    fn test_request_includes_bounded_history() {
        let classifier = LlmClassifier::new(
            Arc::new(ScriptedModel::new()),
            ClassifierSettings {
                history_turns: 2,
                ..Default::default()
            },
        );
        let request = classifier.build_request(&state_with_history("now?", 5));

        assert_eq!(request.messages.len(), 5);
        assert_eq!(request.messages[0].content, "q3");
        assert_eq!(request.messages[1].role, ChatRole::Assistant);
        assert_eq!(request.last_user_message(), Some("now?"));
        assert_eq!(request.temperature, 0.0);
    }

    #[test]
    fn test_request_without_history() {
        let classifier = LlmClassifier::new(Arc::new(ScriptedModel::new()), Default::default());
        let request = classifier.build_request(&state_with_history("hello", 0));
        assert_eq!(request.messages.len(), 1);
        assert!(request.system.is_some());
    }

    #[tokio::test]
    async fn test_classify_parses_model_output() {
        let model = ScriptedModel::new().reply(" Billing\n").reply("weather");
        let classifier = LlmClassifier::new(Arc::new(model.clone()), Default::default());

        let first = classifier.classify(&state_with_history("bill?", 0)).await.unwrap();
        assert_eq!(first, Category::Billing);

        let second = classifier.classify(&state_with_history("rain?", 0)).await.unwrap();
        assert_eq!(second, Category::Unclassified);

        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_is_an_error() {
        let model = ScriptedModel::new().fail("service unavailable");
        let classifier = LlmClassifier::new(Arc::new(model), Default::default());

        let result = classifier.classify(&state_with_history("bill?", 0)).await;
        assert!(matches!(result, Err(ClassifierError::Provider(_))));
    }

    #[tokio::test]
    async fn test_classify_does_not_touch_history() {
        let model = ScriptedModel::new().reply("network");
        let classifier = LlmClassifier::new(Arc::new(model), Default::default());
        let state = state_with_history("no signal", 2);
        let before = state.clone();

        classifier.classify(&state).await.unwrap();
        assert_eq!(state, before);
    }
}
