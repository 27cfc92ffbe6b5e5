//! Dispatch Configuration Module
//!
//! Settings for the dispatch engine: which actions run without a workspace,
//! the chat memory window, the system instruction sent to the responder and
//! the documentation root. Configuration is loaded from environment
//! variables with sensible defaults for development.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Actions that never require an active workspace.
pub const BUILTIN_WORKSPACE_EXEMPT: &[&str] = &[
    "workspace.create",
    "workspace.delete",
    "workspace.unload",
    "workspace.list",
    "system.chat.stream",
    "system.catalog.describe",
];

/// Default number of (user, assistant) pairs kept per conversation.
pub const DEFAULT_CHAT_HISTORY_CAPACITY: usize = 10;

/// Default system instruction prepended to every chat transcript.
pub const DEFAULT_CHAT_SYSTEM_PROMPT: &str = "You are the ICE System Assistant.";

// ============================================================================
// DISPATCH CONFIGURATION
// ============================================================================

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Actions dispatched without workspace resolution.
    /// Always contains `BUILTIN_WORKSPACE_EXEMPT`.
    pub workspace_exempt: BTreeSet<String>,

    /// Maximum (user, assistant) pairs retained per conversation.
    pub chat_history_capacity: usize,

    /// System instruction placed first in every transcript.
    pub chat_system_prompt: String,

    /// Root directory served by `docs.list` and `docs.read`.
    pub docs_root: PathBuf,

    /// Validate parameters against the catalog before invoking handlers.
    pub validate_params: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workspace_exempt: builtin_exempt(),
            chat_history_capacity: DEFAULT_CHAT_HISTORY_CAPACITY,
            chat_system_prompt: DEFAULT_CHAT_SYSTEM_PROMPT.to_string(),
            docs_root: PathBuf::from("./docs"),
            validate_params: false,
        }
    }
}

fn builtin_exempt() -> BTreeSet<String> {
    BUILTIN_WORKSPACE_EXEMPT.iter().map(|s| s.to_string()).collect()
}

impl DispatchConfig {
    /// Create DispatchConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ICE_WORKSPACE_EXEMPT`: Comma-separated extra exempt actions (added to the built-ins)
    /// - `ICE_CHAT_HISTORY_CAPACITY`: Pairs kept per conversation (default: 10)
    /// - `ICE_CHAT_SYSTEM_PROMPT`: System instruction for the chat responder
    /// - `ICE_DOCS_ROOT`: Documentation root (default: ./docs)
    /// - `ICE_VALIDATE_PARAMS`: "true" or "false" (default: false)
    pub fn from_env() -> Self {
        let mut workspace_exempt = builtin_exempt();
        if let Ok(extra) = std::env::var("ICE_WORKSPACE_EXEMPT") {
            workspace_exempt.extend(parse_list(&extra));
        }

        let chat_history_capacity = std::env::var("ICE_CHAT_HISTORY_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_CHAT_HISTORY_CAPACITY);

        let chat_system_prompt = std::env::var("ICE_CHAT_SYSTEM_PROMPT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_SYSTEM_PROMPT.to_string());

        let docs_root = std::env::var("ICE_DOCS_ROOT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./docs"));

        let validate_params = std::env::var("ICE_VALIDATE_PARAMS")
            .ok()
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self {
            workspace_exempt,
            chat_history_capacity,
            chat_system_prompt,
            docs_root,
            validate_params,
        }
    }

    /// Check whether an action runs without a workspace.
    pub fn is_workspace_exempt(&self, action: &str) -> bool {
        self.workspace_exempt.contains(action)
    }

    /// Add an exempt action.
    pub fn with_exempt(mut self, action: impl Into<String>) -> Self {
        self.workspace_exempt.insert(action.into());
        self
    }

    pub fn with_docs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.docs_root = root.into();
        self
    }

    pub fn with_chat_history_capacity(mut self, capacity: usize) -> Self {
        self.chat_history_capacity = capacity.max(1);
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_params = enabled;
        self
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();
        assert_eq!(config.chat_history_capacity, 10);
        assert!(!config.validate_params);
        assert_eq!(config.docs_root, PathBuf::from("./docs"));
        for action in BUILTIN_WORKSPACE_EXEMPT {
            assert!(config.is_workspace_exempt(action));
        }
        assert!(!config.is_workspace_exempt("workspace.load"));
        assert!(!config.is_workspace_exempt("docs.read"));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" cv.ocr, ,cv.cleanup ,"),
            vec!["cv.ocr".to_string(), "cv.cleanup".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_with_exempt_keeps_builtins() {
        let config = DispatchConfig::default().with_exempt("cv.ocr");
        assert!(config.is_workspace_exempt("cv.ocr"));
        assert!(config.is_workspace_exempt("workspace.list"));
    }

    #[test]
    fn test_capacity_floor() {
        let config = DispatchConfig::default().with_chat_history_capacity(0);
        assert_eq!(config.chat_history_capacity, 1);
    }
}
