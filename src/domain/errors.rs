//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A mutating action was attempted without a session identity.
    #[error("Unauthorized: sign in required")]
    Unauthorized,

    /// The store's read or write did not complete.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("UI error: {0}")]
    Ui(String),
}

impl DomainError {
    /// Failures that leave the prior state in place and only need a user notice.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Repo(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(DomainError::Transport("timeout".into()).is_recoverable());
        assert!(DomainError::Repo("locked".into()).is_recoverable());
        assert!(!DomainError::Unauthorized.is_recoverable());
        assert!(!DomainError::Config("missing url".into()).is_recoverable());
    }
}
