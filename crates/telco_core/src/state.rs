//! Session state threaded through one workflow run.
//!
//! A [`SessionState`] is a plain value. Its fields are private so that the
//! invariants below can only be broken from inside this crate:
//!
//! - `customer_id` and `role` are fixed at construction.
//! - `category` is written at most once per run.
//! - `history` only grows.
//! - A finished run carries exactly one of `response` and `error`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::router::HandlerKind;

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(CoreError::InvalidInput(format!("unknown role '{}'", other))),
        }
    }
}

/// Classification labels a query can be sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Billing,
    Network,
    Recommendation,
    Technical,
    Unclassified,
}

impl Category {
    /// Labels the model is allowed to answer with.
    pub const KNOWN: [Category; 4] = [
        Category::Billing,
        Category::Network,
        Category::Recommendation,
        Category::Technical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Billing => "billing",
            Category::Network => "network",
            Category::Recommendation => "recommendation",
            Category::Technical => "technical",
            Category::Unclassified => "unclassified",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Billing => "Questions about bills, charges, payments, invoices",
            Category::Network => "Issues with signal, connectivity, calls, speed, coverage",
            Category::Recommendation => "Requests for plan suggestions, upgrades, data options",
            Category::Technical => "Technical questions about settings, features, devices",
            Category::Unclassified => "Anything that fits none of the other categories",
        }
    }

    /// Every category, including the catch-all.
    pub fn all() -> [Category; 5] {
        [
            Category::Billing,
            Category::Network,
            Category::Recommendation,
            Category::Technical,
            Category::Unclassified,
        ]
    }

    /// Map raw model output to a category.
    ///
    /// Surrounding whitespace is ignored and case does not matter; anything
    /// else that is not exactly one of the four known labels is
    /// `Unclassified`.
    pub fn from_label(raw: &str) -> Category {
        let label = raw.trim();
        Category::KNOWN
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(Category::Unclassified)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub response: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Exchange {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            created_at: Utc::now(),
        }
    }
}

/// Final answer plus the handler that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub source: HandlerKind,
}

impl Response {
    /// User-facing text with the query type appended.
    pub fn render(&self, category: Category) -> String {
        format!("{}\n\nQuery Type: {}", self.text.trim_end(), category)
    }
}

/// Failure taxonomy reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    ClassificationFailure,
    HandlerFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::ClassificationFailure => "classification_failure",
            ErrorKind::HandlerFailure => "handler_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure carried in place of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Already-resolved session details supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub customer_id: String,
    pub role: Role,
    #[serde(default)]
    pub history: Vec<Exchange>,
}

impl SessionContext {
    pub fn new(customer_id: impl Into<String>, role: Role) -> Self {
        Self {
            customer_id: customer_id.into(),
            role,
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<Exchange>) -> Self {
        self.history = history;
        self
    }
}

/// The record handed from stage to stage during one run.
///
/// Deserialization goes through the same checks the setters enforce, so a
/// decoded state never carries both a response and an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StateRecord")]
pub struct SessionState {
    customer_id: String,
    role: Role,
    query: String,
    history: Vec<Exchange>,
    category: Option<Category>,
    response: Option<Response>,
    error: Option<ErrorRecord>,
}

impl SessionState {
    pub fn new(query: impl Into<String>, session: SessionContext) -> Self {
        Self {
            customer_id: session.customer_id,
            role: session.role,
            query: query.into(),
            history: session.history,
            category: None,
            response: None,
            error: None,
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorRecord> {
        self.error.as_ref()
    }

    /// True when the run produced a response.
    pub fn succeeded(&self) -> bool {
        self.response.is_some()
    }

    /// Exactly one of `response` and `error` is set.
    pub fn is_complete(&self) -> bool {
        self.response.is_some() != self.error.is_some()
    }

    /// The rendered answer, or the error record as text.
    pub fn render(&self) -> String {
        match (&self.response, &self.error) {
            (Some(response), _) => {
                response.render(self.category.unwrap_or(Category::Unclassified))
            }
            (None, Some(error)) => error.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Missing required fields, if any.
    pub(crate) fn validate_input(&self) -> Result<(), String> {
        if self.customer_id.trim().is_empty() {
            return Err("customer_id is required".to_string());
        }
        if self.query.trim().is_empty() {
            return Err("query must not be empty".to_string());
        }
        Ok(())
    }

    pub(crate) fn set_category(&mut self, category: Category) {
        debug_assert!(self.category.is_none(), "category is written once per run");
        self.category = Some(category);
    }

    pub(crate) fn set_response(&mut self, response: Response) {
        debug_assert!(self.error.is_none());
        self.history
            .push(Exchange::new(self.query.clone(), response.text.clone()));
        self.response = Some(response);
    }

    pub(crate) fn set_error(&mut self, error: ErrorRecord) {
        debug_assert!(self.response.is_none());
        self.error = Some(error);
    }
}

/// Wire shape of [`SessionState`], checked before it becomes one.
#[derive(Deserialize)]
struct StateRecord {
    customer_id: String,
    role: Role,
    query: String,
    #[serde(default)]
    history: Vec<Exchange>,
    category: Option<Category>,
    response: Option<Response>,
    error: Option<ErrorRecord>,
}

impl TryFrom<StateRecord> for SessionState {
    type Error = String;

    fn try_from(record: StateRecord) -> Result<Self, Self::Error> {
        if record.response.is_some() && record.error.is_some() {
            return Err("state cannot carry both a response and an error".to_string());
        }
        if record.response.is_some() && record.category.is_none() {
            return Err("a response requires a category".to_string());
        }
        Ok(Self {
            customer_id: record.customer_id,
            role: record.role,
            query: record.query,
            history: record.history,
            category: record.category,
            response: record.response,
            error: record.error,
        })
    }
}
