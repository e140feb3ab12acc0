//! Response formulation.
//!
//! Turns a handler outcome (or an earlier failure) into the terminal shape
//! of the state: exactly one of `response` and `error`.

use tracing::{debug, warn};

use crate::error::{HandlerError, HandlerResult};
use crate::router::HandlerKind;
use crate::state::{ErrorKind, ErrorRecord, Response, SessionState};

/// Normalizes handler output into the response envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormulator;

impl ResponseFormulator {
    pub fn new() -> Self {
        Self
    }

    /// Record a handler's outcome.
    ///
    /// A blank draft counts as malformed output and is reported as a handler
    /// failure. On success the exchange is appended to the history.
    pub fn formulate(
        &self,
        state: &mut SessionState,
        source: HandlerKind,
        outcome: HandlerResult<String>,
    ) {
        match outcome {
            Ok(draft) if draft.trim().is_empty() => {
                warn!("Handler '{}' returned an empty draft", source);
                self.fail(
                    state,
                    ErrorKind::HandlerFailure,
                    HandlerError::EmptyResponse(source.to_string()).to_string(),
                );
            }
            Ok(draft) => {
                debug!("Formulating response from '{}' ({} chars)", source, draft.len());
                state.set_response(Response {
                    text: draft,
                    source,
                });
            }
            Err(e) => {
                warn!("Handler '{}' failed: {}", source, e);
                self.fail(state, ErrorKind::HandlerFailure, e.to_string());
            }
        }
    }

    /// Record a failure; the response stays unset and history is untouched.
    pub fn fail(&self, state: &mut SessionState, kind: ErrorKind, message: impl Into<String>) {
        state.set_error(ErrorRecord::new(kind, message));
    }
}
