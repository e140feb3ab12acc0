//! Single-pass workflow: classify, route, handle, formulate.
//!
//! ```text
//! Start ──classify──▶ Classified ──route──▶ Routed ──handle──▶ Handled ──formulate──▶ Done
//!   │                                                  │
//!   └── classification failure ──────▶ Done ◀──────────┘ handler failure / timeout
//! ```
//!
//! At most one classifier call and one handler call happen per run; there
//! are no retries. Every run ends in `Done` with exactly one of `response`
//! and `error` set, so [`Orchestrator::run`] has no error channel of its own.
//!
//! Dropping the future returned by `run` abandons the workflow at its
//! current await point; later stages are never started.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use telco_llm::{LanguageModel, LlmAdapter};

use crate::classifier::{Classifier, ClassifierSettings, LlmClassifier};
use crate::config::{AssistantConfig, TimeoutConfig};
use crate::error::{ClassifierError, CoreResult, HandlerError, HandlerResult};
use crate::formulator::ResponseFormulator;
use crate::handler::HandlerSet;
use crate::router::{route, HandlerKind};
use crate::state::{Category, ErrorKind, SessionContext, SessionState};

/// Workflow stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Start,
    Classified,
    Routed,
    Handled,
    Done,
}

/// A stage together with the data the next transition needs.
enum Step {
    Start,
    Classified(Category),
    Routed(HandlerKind),
    Handled(HandlerKind, HandlerResult<String>),
    Done,
}

impl Step {
    fn stage(&self) -> WorkflowStage {
        match self {
            Step::Start => WorkflowStage::Start,
            Step::Classified(_) => WorkflowStage::Classified,
            Step::Routed(_) => WorkflowStage::Routed,
            Step::Handled(..) => WorkflowStage::Handled,
            Step::Done => WorkflowStage::Done,
        }
    }
}

/// Composes classifier, router, handlers and formulator.
pub struct Orchestrator {
    classifier: Arc<dyn Classifier>,
    handlers: HandlerSet,
    formulator: ResponseFormulator,
    timeouts: TimeoutConfig,
}

impl Orchestrator {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        handlers: HandlerSet,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            classifier,
            handlers,
            formulator: ResponseFormulator::new(),
            timeouts,
        }
    }

    /// Orchestrator whose classifier runs on `model`.
    pub fn with_model(
        model: Arc<dyn LanguageModel>,
        handlers: HandlerSet,
        config: &AssistantConfig,
    ) -> Self {
        let classifier = LlmClassifier::new(model, ClassifierSettings::from(config));
        Self::new(Arc::new(classifier), handlers, config.timeouts.clone())
    }

    /// Orchestrator talking to the configured provider, with stub handlers.
    pub fn from_config(config: &AssistantConfig) -> CoreResult<Self> {
        let adapter = LlmAdapter::from_config(&config.llm)?;
        info!(
            "Using {} model '{}' for classification",
            adapter.provider(),
            adapter.model()
        );
        Ok(Self::with_model(
            Arc::new(adapter),
            HandlerSet::stubs(),
            config,
        ))
    }

    pub fn handlers(&self) -> &HandlerSet {
        &self.handlers
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Run one query through the workflow.
    ///
    /// Blank queries and blank customer ids are rejected as `invalid_input`
    /// before anything external is called.
    pub async fn run(&self, query: impl Into<String>, session: SessionContext) -> SessionState {
        let mut state = SessionState::new(query, session);
        let span = info_span!(
            "workflow",
            run_id = %Uuid::new_v4(),
            customer_id = %state.customer_id()
        );
        self.drive(&mut state).instrument(span).await;
        state
    }

    async fn drive(&self, state: &mut SessionState) {
        if let Err(message) = state.validate_input() {
            warn!("Rejecting request: {}", message);
            self.formulator.fail(state, ErrorKind::InvalidInput, message);
            return;
        }

        let mut step = Step::Start;
        loop {
            debug!(stage = ?step.stage(), "Workflow stage");
            step = match step {
                Step::Start => self.classify(state).await,
                Step::Classified(category) => {
                    let kind = route(category);
                    info!("Routing to: {}", kind);
                    Step::Routed(kind)
                }
                Step::Routed(kind) => Step::Handled(kind, self.invoke(kind, state).await),
                Step::Handled(kind, outcome) => {
                    self.formulator.formulate(state, kind, outcome);
                    Step::Done
                }
                Step::Done => break,
            };
        }

        debug_assert!(state.is_complete());
    }

    async fn classify(&self, state: &mut SessionState) -> Step {
        let budget = self.timeouts.classifier();
        let outcome = match timeout(budget, self.classifier.classify(state)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout(self.timeouts.classifier_ms)),
        };

        match outcome {
            Ok(category) => {
                state.set_category(category);
                Step::Classified(category)
            }
            Err(e) => {
                error!("Classification failed: {}", e);
                self.formulator
                    .fail(state, ErrorKind::ClassificationFailure, e.to_string());
                Step::Done
            }
        }
    }

    async fn invoke(&self, kind: HandlerKind, state: &SessionState) -> HandlerResult<String> {
        let handler = self.handlers.get(kind);
        debug!("Invoking handler: {}", kind);

        match timeout(self.timeouts.handler(), handler.handle(state)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(HandlerError::Timeout {
                handler: kind.to_string(),
                timeout_ms: self.timeouts.handler_ms,
            }),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("handlers", &self.handlers)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MockClassifier;
    use crate::handler::MockHandler;
    use crate::state::Role;

    fn session() -> SessionContext {
        SessionContext::new("CUST001", Role::Customer)
    }

    fn classifier_returning(category: Category) -> MockClassifier {
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .times(1)
            .returning(move |_| Ok(category));
        classifier
    }

    fn handler_never_called(kind: HandlerKind) -> MockHandler {
        let mut handler = MockHandler::new();
        handler.expect_kind().return_const(kind);
        handler.expect_handle().times(0);
        handler
    }

    #[tokio::test]
    async fn test_blank_query_rejected_before_classification() {
        let mut classifier = MockClassifier::new();
        classifier.expect_classify().times(0);
        let orchestrator = Orchestrator::new(
            Arc::new(classifier),
            HandlerSet::stubs(),
            TimeoutConfig::default(),
        );

        let state = orchestrator.run("   ", session()).await;

        assert_eq!(state.error().unwrap().kind, ErrorKind::InvalidInput);
        assert!(state.response().is_none());
        assert!(state.category().is_none());
    }

    #[tokio::test]
    async fn test_blank_customer_rejected_before_classification() {
        let mut classifier = MockClassifier::new();
        classifier.expect_classify().times(0);
        let orchestrator = Orchestrator::new(
            Arc::new(classifier),
            HandlerSet::stubs(),
            TimeoutConfig::default(),
        );

        let state = orchestrator
            .run("Why is my bill high?", SessionContext::new("", Role::Customer))
            .await;

        assert_eq!(state.error().unwrap().kind, ErrorKind::InvalidInput);
        assert!(state.error().unwrap().message.contains("customer_id"));
    }

    #[tokio::test]
    async fn test_routes_to_classified_handler() {
        let mut billing = MockHandler::new();
        billing.expect_kind().return_const(HandlerKind::Billing);
        billing
            .expect_handle()
            .times(1)
            .returning(|state| Ok(format!("bill for {}", state.customer_id())));

        let handlers = HandlerSet::stubs()
            .register(Arc::new(billing))
            .register(Arc::new(handler_never_called(HandlerKind::Network)))
            .register(Arc::new(handler_never_called(HandlerKind::Fallback)));

        let orchestrator = Orchestrator::new(
            Arc::new(classifier_returning(Category::Billing)),
            handlers,
            TimeoutConfig::default(),
        );

        let state = orchestrator.run("Why is my bill high?", session()).await;

        assert_eq!(state.category(), Some(Category::Billing));
        let response = state.response().unwrap();
        assert_eq!(response.source, HandlerKind::Billing);
        assert_eq!(response.text, "bill for CUST001");
        assert_eq!(state.history().len(), 1);
    }

    #[tokio::test]
    async fn test_classifier_error_skips_handlers() {
        let mut classifier = MockClassifier::new();
        classifier.expect_classify().times(1).returning(|_| {
            Err(ClassifierError::Provider(telco_llm::LlmError::NotConfigured))
        });

        let mut handlers = HandlerSet::stubs();
        for kind in HandlerKind::all() {
            handlers = handlers.register(Arc::new(handler_never_called(kind)));
        }

        let orchestrator =
            Orchestrator::new(Arc::new(classifier), handlers, TimeoutConfig::default());
        let state = orchestrator.run("anything", session()).await;

        assert_eq!(state.error().unwrap().kind, ErrorKind::ClassificationFailure);
        assert!(state.category().is_none());
        assert!(state.history().is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_becomes_handler_failure() {
        let mut network = MockHandler::new();
        network.expect_kind().return_const(HandlerKind::Network);
        network
            .expect_handle()
            .times(1)
            .returning(|_| Err(HandlerError::failed("network", "diagnostics backend down")));

        let orchestrator = Orchestrator::new(
            Arc::new(classifier_returning(Category::Network)),
            HandlerSet::stubs().register(Arc::new(network)),
            TimeoutConfig::default(),
        );

        let state = orchestrator
            .run(
                "I can't make calls",
                session().with_history(vec![crate::state::Exchange::new("hi", "hello")]),
            )
            .await;

        let error = state.error().unwrap();
        assert_eq!(error.kind, ErrorKind::HandlerFailure);
        assert!(error.message.contains("diagnostics backend down"));
        assert_eq!(state.category(), Some(Category::Network));
        assert_eq!(state.history().len(), 1);
    }

    #[tokio::test]
    async fn test_unclassified_goes_to_fallback_without_error() {
        let orchestrator = Orchestrator::new(
            Arc::new(classifier_returning(Category::Unclassified)),
            HandlerSet::stubs(),
            TimeoutConfig::default(),
        );

        let state = orchestrator.run("asdkjhaskjdh", session()).await;

        assert!(state.error().is_none());
        assert_eq!(state.response().unwrap().source, HandlerKind::Fallback);
    }
}
