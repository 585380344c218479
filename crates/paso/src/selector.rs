//! Element selectors: a query plus the strategy used to resolve it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a selector query is matched against the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// CSS selector
    Css,
    /// XPath expression
    #[serde(rename = "xpath")]
    XPath,
    /// Element `id` attribute
    Id,
    /// Element `name` attribute
    Name,
    /// Exact anchor text
    LinkText,
    /// Tag name
    Tag,
}

impl Strategy {
    /// Get display name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Id => "id",
            Self::Name => "name",
            Self::LinkText => "link text",
            Self::Tag => "tag",
        }
    }
}

/// A query identifying zero or more UI elements within the active frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    /// Matching strategy
    pub strategy: Strategy,
    /// Query string interpreted by the strategy
    pub query: String,
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(query: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Css,
            query: query.into(),
        }
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(query: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::XPath,
            query: query.into(),
        }
    }

    /// Create an id selector
    #[must_use]
    pub fn id(query: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Id,
            query: query.into(),
        }
    }

    /// Create a `name` attribute selector
    #[must_use]
    pub fn name(query: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Name,
            query: query.into(),
        }
    }

    /// Create an exact link-text selector
    #[must_use]
    pub fn link_text(query: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::LinkText,
            query: query.into(),
        }
    }

    /// Create a tag-name selector
    #[must_use]
    pub fn tag(query: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Tag,
            query: query.into(),
        }
    }

    /// Compile to a JavaScript expression that resolves the first match
    /// against a document bound to the variable `doc`.
    ///
    /// The expression evaluates to the element or `null`. Used by the CDP
    /// session, which evaluates lookups inside the active frame's document.
    #[must_use]
    pub fn js_lookup_expr(&self) -> String {
        match self.strategy {
            Strategy::Css => format!("doc.querySelector({})", js_string(&self.query)),
            Strategy::Id => format!("doc.getElementById({})", js_string(&self.query)),
            Strategy::Tag => format!(
                "doc.getElementsByTagName({})[0] || null",
                js_string(&self.query)
            ),
            Strategy::Name => format!(
                "doc.getElementsByName({})[0] || null",
                js_string(&self.query)
            ),
            Strategy::XPath => format!(
                "doc.evaluate({}, doc, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(&self.query)
            ),
            Strategy::LinkText => format!(
                "Array.from(doc.querySelectorAll('a')).find(a => a.textContent.trim() === {}) || null",
                js_string(&self.query)
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_str(), self.query)
    }
}

/// Quote a string as a JavaScript string literal
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}
