//! # telco_core
//!
//! Orchestration engine for the telco customer-service assistant.
//!
//! A query plus session context goes in; a completed [`SessionState`] with
//! either a response or a structured error comes out.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐     ┌────────────┐     ┌──────────┐     ┌─────────────┐
//! │   Classifier   │────▶│   Router   │────▶│ Handler  │────▶│ Formulator  │
//! │ (one LLM call) │     │ (pure fn)  │     │ (1 of 5) │     │ (envelope)  │
//! └────────────────┘     └────────────┘     └──────────┘     └─────────────┘
//!          ▲                                                        │
//!          └──────────────── Orchestrator (one SessionState) ◀──────┘
//! ```
//!
//! - **Classifier**: maps the query to a [`Category`]; unknown labels become
//!   `unclassified`, failed calls become `classification_failure`.
//! - **Router**: total lookup from category to [`HandlerKind`].
//! - **Handlers**: one [`Handler`] per kind; stubs by default.
//! - **Formulator**: sets `response` or `error`, never both.
//! - **Sessions**: [`SessionManager`] keeps history between runs and allows
//!   one run per session at a time.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use telco_core::{AssistantConfig, Orchestrator, Role, SessionContext};
//!
//! let config = AssistantConfig::from_env()?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//!
//! let state = orchestrator
//!     .run("Why is my bill higher this month?", SessionContext::new("CUST001", Role::Customer))
//!     .await;
//! println!("{}", state.render());
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod formulator;
pub mod handler;
pub mod orchestrator;
pub mod router;
pub mod session;
pub mod state;

pub use classifier::{Classifier, ClassifierSettings, LlmClassifier};
pub use config::{AssistantConfig, ClassifierConfig, TimeoutConfig};
pub use error::{
    ClassifierError, ClassifierResult, CoreError, CoreResult, HandlerError, HandlerResult,
};
pub use formulator::ResponseFormulator;
pub use handler::{FallbackHandler, Handler, HandlerSet, StubHandler};
pub use orchestrator::{Orchestrator, WorkflowStage};
pub use router::{route, routing_table, HandlerKind};
pub use session::{SessionInfo, SessionManager};
pub use state::{
    Category, ErrorKind, ErrorRecord, Exchange, Response, Role, SessionContext, SessionState,
};
