//! Category to handler routing.
//!
//! Routing is a total, side-effect-free match over [`Category`]; adding a
//! category without deciding where it goes does not compile.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::Category;

/// Specialist processing paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Billing,
    Network,
    Recommendation,
    Technical,
    /// Catch-all for queries whose intent could not be determined.
    Fallback,
}

impl HandlerKind {
    /// Tag recorded as `response.source`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Billing => "billing",
            HandlerKind::Network => "network",
            HandlerKind::Recommendation => "recommendation",
            HandlerKind::Technical => "technical",
            HandlerKind::Fallback => "fallback",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            HandlerKind::Billing => "Billing & Account",
            HandlerKind::Network => "Network Troubleshooting",
            HandlerKind::Recommendation => "Plan Recommendation",
            HandlerKind::Technical => "Technical Support",
            HandlerKind::Fallback => "General Assistance",
        }
    }

    pub fn all() -> [HandlerKind; 5] {
        [
            HandlerKind::Billing,
            HandlerKind::Network,
            HandlerKind::Recommendation,
            HandlerKind::Technical,
            HandlerKind::Fallback,
        ]
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the handler bound to a category.
pub fn route(category: Category) -> HandlerKind {
    match category {
        Category::Billing => HandlerKind::Billing,
        Category::Network => HandlerKind::Network,
        Category::Recommendation => HandlerKind::Recommendation,
        Category::Technical => HandlerKind::Technical,
        Category::Unclassified => HandlerKind::Fallback,
    }
}

/// The full routing table, one row per category.
pub fn routing_table() -> Vec<(Category, HandlerKind)> {
    Category::all().into_iter().map(|c| (c, route(c))).collect()
}
