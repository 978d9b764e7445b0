//! In-memory holder for the bearer token a broker attaches to its requests.

use std::sync::{Arc, RwLock};

/// What happened to the stored token since the store was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenChange {
    Unchanged,
    Cleared,
    Rotated(String),
}

#[derive(Debug, Default)]
struct Slot {
    token: Option<String>,
    change: Option<TokenChange>,
}

/// TokenStore
///
/// Shared, cloneable handle to one session's credential. Clones observe the same
/// token, so a broker clearing it on a 401 is visible to whoever built the session.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    slot: Arc<RwLock<Slot>>,
}

impl TokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot {
                token: token.filter(|t| !t.is_empty()),
                change: None,
            })),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .token
            .clone()
    }

    pub fn set(&self, token: String) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.token.as_deref() != Some(token.as_str()) {
            slot.token = Some(token.clone());
            slot.change = Some(TokenChange::Rotated(token));
        }
    }

    /// Drops the token. Subsequent reads return `None`.
    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.token.take().is_some() {
            slot.change = Some(TokenChange::Cleared);
        }
    }

    pub fn change(&self) -> TokenChange {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .change
            .clone()
            .unwrap_or(TokenChange::Unchanged)
    }
}
