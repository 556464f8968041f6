//! Static policy configuration types.
//!
//! Routing rules and tool policy profiles are authored out of band and
//! read-only at evaluation time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Categories of action the engine governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    /// Request to run work detached from the governed session.
    DetachedExecution,
    /// Writing files in the working tree.
    FileWrite,
    /// Running shell commands.
    ShellCommand,
    /// Outbound network access.
    NetworkAccess,
    /// Direct mutation of governance state.
    StoreMutation,
    /// Delegating work to another role.
    Delegation,
}

impl ActionCategory {
    /// Canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DetachedExecution => "detached_execution",
            Self::FileWrite => "file_write",
            Self::ShellCommand => "shell_command",
            Self::NetworkAccess => "network_access",
            Self::StoreMutation => "store_mutation",
            Self::Delegation => "delegation",
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-role allow-list of permitted action categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPolicyProfile {
    /// The acting role this profile applies to.
    pub role: String,

    /// Permitted categories; `None` means unrestricted.
    #[serde(default)]
    pub allowed: Option<Vec<ActionCategory>>,
}

impl ToolPolicyProfile {
    /// Whether this profile permits the category.
    ///
    /// Unrestricted profiles permit everything.
    #[must_use]
    pub fn permits(&self, category: ActionCategory) -> bool {
        self.allowed
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&category))
    }
}

/// Maps a keyword set to a suggested specialist role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Keywords (or phrases) that trigger the suggestion.
    pub keywords: Vec<String>,

    /// The specialist role to suggest.
    pub specialist: String,
}
