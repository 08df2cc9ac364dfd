//! Error types for the authoring engine.
//!
//! Resolution and load failures never leave their component; they are
//! logged and turned into "nothing shown". Only save validation reaches the
//! caller.

use guise_types::ProfileId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("cannot list {dir}: {reason}")]
    Listing { dir: String, reason: String },

    #[error("invalid wildcard pattern {pattern}: {reason}")]
    Pattern { pattern: String, reason: String },
}

impl ResolveError {
    pub fn listing(dir: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Listing {
            dir: dir.into(),
            reason: reason.into(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("profile {0} not found")]
    NotFound(ProfileId),

    #[error("profile store failure: {0}")]
    Backend(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// User-facing reason; nothing was written.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SaveError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SaveError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_naturally() {
        let err = ResolveError::listing("fx/", "permission denied");
        assert_eq!(err.to_string(), "cannot list fx/: permission denied");
        let err = SaveError::validation("profile needs a label");
        assert_eq!(err.to_string(), "profile needs a label");
        assert!(err.is_validation());
        let err: SaveError = StoreError::NotFound(ProfileId::new("p1")).into();
        assert_eq!(err.to_string(), "profile p1 not found");
        assert!(!err.is_validation());
    }
}
