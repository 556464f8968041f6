//! The three-check pre-action advisor.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::schema::{ActionCategory, RoutingRule, ToolPolicyProfile};

/// Action categories that are unconditionally rejected, for every role.
pub const HARD_DENIED: &[ActionCategory] = &[ActionCategory::DetachedExecution];

/// A non-blocking suggestion to delegate the action to a specialist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingHint {
    /// The suggested specialist role.
    pub specialist: String,

    /// The keyword that triggered the suggestion.
    pub matched_keyword: String,
}

/// Outcome of one pre-action check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDecision {
    /// Whether the action may execute.
    pub allowed: bool,

    /// Rejection reason, present iff `allowed` is false.
    pub deny_reason: Option<String>,

    /// Advisory warnings (policy-profile drift). Never blocking.
    pub warnings: Vec<String>,

    /// At most one delegation hint.
    pub routing_hint: Option<RoutingHint>,
}

/// Evaluates tool-policy and routing checks for proposed actions.
///
/// Holds only static configuration; evaluation never touches the store
/// and is safe to call concurrently.
#[derive(Debug, Clone, Default)]
pub struct PolicyAdvisor {
    profiles: HashMap<String, ToolPolicyProfile>,
    routing: Vec<RoutingRule>,
}

impl PolicyAdvisor {
    /// Builds an advisor from static configuration.
    #[must_use]
    pub fn new(profiles: Vec<ToolPolicyProfile>, routing: Vec<RoutingRule>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|p| (p.role.clone(), p))
            .collect();
        Self { profiles, routing }
    }

    /// Check 1: unconditional rejection of hard-denied categories.
    fn check_hard_deny(category: ActionCategory) -> Option<String> {
        HARD_DENIED.contains(&category).then(|| {
            format!("action category '{category}' is never permitted")
        })
    }

    /// Check 2: advisory allow-list comparison.
    ///
    /// Returns a warning when the acting role has a restricted profile
    /// that does not list `category`. Roles without a profile are
    /// unrestricted.
    fn check_profile(&self, role: &str, category: ActionCategory) -> Option<String> {
        let profile = self.profiles.get(role)?;
        if profile.permits(category) {
            return None;
        }
        Some(format!(
            "role '{role}' acted outside its tool policy profile: '{category}' is not in its allow-list"
        ))
    }

    /// Check 3: first-match routing advisory.
    ///
    /// Rules are scanned in configuration order; the first keyword match
    /// whose specialist differs from the acting role yields the hint.
    fn check_routing(&self, role: &str, intent: &str) -> Option<RoutingHint> {
        let normalized = normalize(intent);
        for rule in &self.routing {
            if rule.specialist == role {
                continue;
            }
            for keyword in &rule.keywords {
                if contains_phrase(&normalized, &normalize(keyword)) {
                    return Some(RoutingHint {
                        specialist: rule.specialist.clone(),
                        matched_keyword: keyword.clone(),
                    });
                }
            }
        }
        None
    }

    /// Runs all three checks for a proposed action.
    ///
    /// A hard deny short-circuits: the caller receives the rejection
    /// reason and neither a profile warning nor a routing hint.
    #[must_use]
    pub fn check_action(
        &self,
        role: &str,
        category: ActionCategory,
        intent: &str,
    ) -> ActionDecision {
        if let Some(reason) = Self::check_hard_deny(category) {
            warn!(role, category = %category, reason = %reason, "action hard-denied");
            return ActionDecision {
                allowed: false,
                deny_reason: Some(reason),
                warnings: Vec::new(),
                routing_hint: None,
            };
        }

        let mut warnings = Vec::new();
        if let Some(warning) = self.check_profile(role, category) {
            warn!(role, category = %category, "tool policy profile mismatch");
            warnings.push(warning);
        }

        let routing_hint = self.check_routing(role, intent);
        if let Some(hint) = &routing_hint {
            debug!(
                role,
                specialist = %hint.specialist,
                keyword = %hint.matched_keyword,
                "routing advisory emitted"
            );
        }

        ActionDecision {
            allowed: true,
            deny_reason: None,
            warnings,
            routing_hint,
        }
    }
}

/// Lowercases, strips punctuation, and collapses whitespace so that
/// keyword matching is whole-word rather than substring.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-word (or whole-phrase) containment on normalized text.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    let padded_haystack = format!(" {haystack} ");
    let padded_phrase = format!(" {phrase} ");
    padded_haystack.contains(&padded_phrase)
}
