//! Handler contract and the default handler set.
//!
//! Every category is served by exactly one [`Handler`]. Real specialists
//! (billing crews, diagnostics agents, retrieval pipelines) plug in behind
//! the same trait via [`HandlerSet::register`]; the orchestrator never needs
//! to change.
//!
//! # Contract
//!
//! - Read whatever is needed from the state; the state is borrowed
//!   immutably, so the category cannot be changed.
//! - Return draft text, or a [`HandlerError`].
//! - Finish in bounded time. The orchestrator enforces a timeout and treats
//!   an overrun as a failure.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::HandlerResult;
use crate::router::HandlerKind;
use crate::state::{Role, SessionState};

/// A specialist processing path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Handler: Send + Sync {
    /// The slot this handler fills.
    fn kind(&self) -> HandlerKind;

    /// Produce a draft response for the current query.
    async fn handle(&self, state: &SessionState) -> HandlerResult<String>;
}

/// One handler per [`HandlerKind`].
///
/// Backed by named fields rather than a map so lookup is total.
#[derive(Clone)]
pub struct HandlerSet {
    billing: Arc<dyn Handler>,
    network: Arc<dyn Handler>,
    recommendation: Arc<dyn Handler>,
    technical: Arc<dyn Handler>,
    fallback: Arc<dyn Handler>,
}

impl HandlerSet {
    /// Placeholder handlers for every category.
    pub fn stubs() -> Self {
        Self {
            billing: Arc::new(StubHandler::new(HandlerKind::Billing)),
            network: Arc::new(StubHandler::new(HandlerKind::Network)),
            recommendation: Arc::new(StubHandler::new(HandlerKind::Recommendation)),
            technical: Arc::new(StubHandler::new(HandlerKind::Technical)),
            fallback: Arc::new(FallbackHandler),
        }
    }

    /// Install a handler into the slot named by its `kind()`, replacing
    /// whatever was there.
    pub fn register(mut self, handler: Arc<dyn Handler>) -> Self {
        let kind = handler.kind();
        debug!("Registering handler: {}", kind);
        *self.slot_mut(kind) = handler;
        self
    }

    /// The handler bound to `kind`.
    pub fn get(&self, kind: HandlerKind) -> &Arc<dyn Handler> {
        match kind {
            HandlerKind::Billing => &self.billing,
            HandlerKind::Network => &self.network,
            HandlerKind::Recommendation => &self.recommendation,
            HandlerKind::Technical => &self.technical,
            HandlerKind::Fallback => &self.fallback,
        }
    }

    fn slot_mut(&mut self, kind: HandlerKind) -> &mut Arc<dyn Handler> {
        match kind {
            HandlerKind::Billing => &mut self.billing,
            HandlerKind::Network => &mut self.network,
            HandlerKind::Recommendation => &mut self.recommendation,
            HandlerKind::Technical => &mut self.technical,
            HandlerKind::Fallback => &mut self.fallback,
        }
    }
}

impl Default for HandlerSet {
    fn default() -> Self {
        Self::stubs()
    }
}

impl std::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(HandlerKind::all().iter().map(|k| self.get(*k).kind()))
            .finish()
    }
}

/// Canned, category-labelled acknowledgement.
#[derive(Debug, Clone)]
pub struct StubHandler {
    kind: HandlerKind,
}

impl StubHandler {
    pub fn new(kind: HandlerKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Handler for StubHandler {
    fn kind(&self) -> HandlerKind {
        self.kind
    }

    async fn handle(&self, state: &SessionState) -> HandlerResult<String> {
        let mut text = format!(
            "[{}] Thanks {}, we received your request: \"{}\"\n\n{}",
            self.kind.display_name(),
            state.customer_id(),
            state.query().trim(),
            follow_up(self.kind),
        );
        if state.role() == Role::Admin {
            text.push_str("\n\n(Admin session: no customer account is attached to this request.)");
        }
        Ok(text)
    }
}

fn follow_up(kind: HandlerKind) -> &'static str {
    match kind {
        HandlerKind::Billing => {
            "A billing specialist will review your account charges and payment history."
        }
        HandlerKind::Network => {
            "Our network team will check coverage and outages in your area. Meanwhile, try toggling airplane mode or restarting your device."
        }
        HandlerKind::Recommendation => {
            "We will compare your current usage against available plans and suggest the best fit."
        }
        HandlerKind::Technical => {
            "We will look up the relevant setup guide for your device."
        }
        HandlerKind::Fallback => FALLBACK_GENERIC,
    }
}

/// Default handler for queries whose intent is unknown.
///
/// Always asks the user to rephrase; the wording adapts to greetings, thanks
/// and jokes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackHandler;

impl FallbackHandler {
    fn reply_for(query: &str) -> &'static str {
        let lower = query.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has_word = |candidates: &[&str]| contains_any(&words, candidates);

        if has_word(&["joke", "jokes", "funny", "laugh", "humor"]) {
            FALLBACK_JOKE
        } else if has_word(&["hello", "hi", "hey"])
            || ["good morning", "good afternoon", "good evening"]
                .iter()
                .any(|p| lower.contains(p))
        {
            FALLBACK_GREETING
        } else if has_word(&["thank", "thanks", "appreciate", "goodbye", "bye"])
            || lower.contains("see you")
        {
            FALLBACK_THANKS
        } else {
            FALLBACK_GENERIC
        }
    }
}

#[async_trait]
impl Handler for FallbackHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Fallback
    }

    async fn handle(&self, state: &SessionState) -> HandlerResult<String> {
        Ok(format!("{}\n\n{}", Self::reply_for(state.query()), SERVICE_MENU))
    }
}

fn contains_any(words: &[&str], candidates: &[&str]) -> bool {
    words.iter().any(|w| candidates.iter().any(|c| c == w))
}

const FALLBACK_GENERIC: &str = "I couldn't work out what you need help with. Could you rephrase your question?";

const FALLBACK_GREETING: &str = "Hello and welcome! I'm your telecom service assistant. I couldn't tell what you need yet, so could you tell me a bit more?";

const FALLBACK_THANKS: &str = "You're welcome! If there is anything else, please rephrase it as a question about your service.";

const FALLBACK_JOKE: &str = "I appreciate the lighter moment, but I'm specifically here to help with telecom services. Could you rephrase your request?";

const SERVICE_MENU: &str = r#"I can help with:
- Billing & account: bills, charges, payments
- Network issues: signal, calls, slow data, coverage
- Plan recommendations: upgrades, data packages, roaming
- Technical support: device settings, APN, VoLTE

For example:
- "Why is my bill higher this month?"
- "I have poor signal at home, can you help?"
- "What's the best plan for heavy data usage?"
- "How do I enable VoLTE on my device?""#;
