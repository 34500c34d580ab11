//! Identity service.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;

use crate::auth::{Auth, AuthServiceError};

/// Resolves bearer tokens from a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityService {
    subjects: FxHashMap<String, String>,
}

impl StaticIdentityService {
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            subjects: tokens.into_iter().collect(),
        }
    }

    /// Builds the table from `token=subject` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error for pairs without a separator or with an empty side.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, AuthServiceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut subjects = FxHashMap::default();

        for pair in pairs {
            let pair = pair.as_ref().trim();

            let Some((token, subject)) = pair.split_once('=') else {
                return Err(AuthServiceError::InvalidTokenPair(pair.to_string()));
            };

            let (token, subject) = (token.trim(), subject.trim());

            if token.is_empty() || subject.is_empty() {
                return Err(AuthServiceError::InvalidTokenPair(pair.to_string()));
            }

            subjects.insert(token.to_string(), subject.to_string());
        }

        Ok(Self { subjects })
    }
}

#[async_trait]
impl IdentityService for StaticIdentityService {
    async fn authenticate_bearer(&self, token: &str) -> Result<Auth, AuthServiceError> {
        self.subjects
            .get(token)
            .map(|subject| Auth::new(subject.clone(), token))
            .ok_or(AuthServiceError::NotFound)
    }
}

#[automock]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolves a bearer token to a customer identity.
    async fn authenticate_bearer(&self, token: &str) -> Result<Auth, AuthServiceError>;
}
