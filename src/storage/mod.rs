//! Persisted client-side storage and bearer-token access
//!
//! The primary client reads its bearer token through [`TokenStore`] on every
//! dispatch. [`LocalStorage`] persists values to disk so a token saved by
//! `estate login` is picked up by later invocations; [`MemoryTokenStore`] keeps
//! the token in process for tests and embedding.

mod local;

use std::sync::{PoisonError, RwLock};

use crate::api::ApiError;

pub use local::{LocalStorage, StoredValue};

/// Storage key the bearer token is persisted under
pub const TOKEN_KEY: &str = "token";

/// Source (and sink) of the bearer token attached to outgoing requests
pub trait TokenStore: Send + Sync {
    /// Current token, if one is stored
    fn token(&self) -> Option<String>;

    /// Persists a new token, replacing any previous one
    fn store_token(&self, token: &str) -> Result<(), ApiError>;

    /// Forgets the stored token
    fn clear_token(&self) -> Result<(), ApiError>;
}

/// Token kept in memory only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_token(&self, token: &str) -> Result<(), ApiError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<(), ApiError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
