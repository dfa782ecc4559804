//! Presentable wording for decline messages.
//!
//! Decline reasons arrive as terse processor codes such as `CVV2 MISMATCH`.
//! [`MessageCleanup`] is an ordered prefix table: the first rule whose prefix
//! starts the message supplies the replacement text. It deserializes from a
//! JSON array so deployments can extend it without code changes.

use serde::{Deserialize, Serialize};

/// One prefix substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupRule {
    pub prefix: String,
    pub replacement: String,
}

impl CleanupRule {
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }
}

const DEFAULT_RULES: &[(&str, &str)] = &[
    (
        "CVV2",
        "The Card Security Code that was provided is invalid. Please check the three-digit \
         security code on the back of your card and try again.",
    ),
    (
        "INVALID CARD NO",
        "The credit card number that was provided is invalid. Please re-enter and try again.",
    ),
    (
        "CVD",
        "Invalid card number, security code, or other value. Please check your input and try again.",
    ),
    ("C/DECLINED", "Your payment was declined."),
    ("AUTH DECLINED", "Your payment was declined."),
];

/// Ordered prefix to replacement table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCleanup {
    rules: Vec<CleanupRule>,
}

impl Default for MessageCleanup {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(prefix, replacement)| CleanupRule::new(*prefix, *replacement))
                .collect(),
        }
    }
}

impl MessageCleanup {
    /// A table that passes every message through.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule. Earlier rules take precedence.
    pub fn with_rule(mut self, prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.rules.push(CleanupRule::new(prefix, replacement));
        self
    }

    pub fn rules(&self) -> &[CleanupRule] {
        &self.rules
    }

    pub fn apply(&self, message: &str) -> String {
        if message.is_empty() {
            return String::new();
        }
        self.rules
            .iter()
            .find(|rule| message.starts_with(rule.prefix.as_str()))
            .map_or_else(|| message.to_string(), |rule| rule.replacement.clone())
    }
}
