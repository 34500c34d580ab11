//! Auth data models.

use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Authenticated customer identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Auth {
    /// Stable customer identifier.
    pub subject: String,

    /// Bearer token the identity was established with.
    pub token: String,
}

impl Auth {
    #[must_use]
    pub fn new(subject: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            token: token.into(),
        }
    }
}

impl Debug for Auth {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Auth")
            .field("subject", &self.subject)
            .field("token", &"<redacted>")
            .finish()
    }
}
