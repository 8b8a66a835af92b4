//! Single-use security tokens for admin form submissions.
//!
//! A token is issued when the form is rendered and is bound to an action name
//! and a product. Verification consumes it, so a replayed submission fails.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use stockdate_core::ProductId;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest token lifetime accepted (one year).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Live tokens kept per action and product; issuing past this evicts the
/// oldest one.
pub const MAX_TOKENS_PER_FORM: usize = 8;

/// Result of checking a submitted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCheck {
    Valid,
    Missing,
    Unknown,
    Mismatch,
    Expired,
}

impl TokenCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenCheck::Valid)
    }
}

#[derive(Debug, Clone)]
struct IssuedToken {
    action: String,
    product_id: ProductId,
    expires_at: DateTime<Utc>,
}

/// In-process token issuer/verifier.
#[derive(Debug)]
pub struct FormTokenStore {
    ttl: chrono::Duration,
    issued: Mutex<HashMap<String, IssuedToken>>,
}

impl Default for FormTokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}

impl FormTokenStore {
    /// `ttl` is capped at [`MAX_TOKEN_TTL`]; configuration rejects longer values.
    pub fn new(ttl: Duration) -> Self {
        let secs = ttl.min(MAX_TOKEN_TTL).as_secs() as i64;
        Self {
            ttl: chrono::Duration::seconds(secs),
            issued: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, action: &str, product_id: ProductId) -> String {
        self.issue_at(action, product_id, Utc::now())
    }

    /// Issue a token as of `now`.
    ///
    /// Expired tokens are purged on the way, and at most
    /// [`MAX_TOKENS_PER_FORM`] stay live for the same action and product.
    pub fn issue_at(&self, action: &str, product_id: ProductId, now: DateTime<Utc>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut issued = match self.issued.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        issued.retain(|_, t| t.expires_at > now);

        let mut same_form: Vec<(DateTime<Utc>, String)> = issued
            .iter()
            .filter(|(_, t)| t.action == action && t.product_id == product_id)
            .map(|(k, t)| (t.expires_at, k.clone()))
            .collect();
        if same_form.len() >= MAX_TOKENS_PER_FORM {
            same_form.sort();
            let excess = same_form.len() + 1 - MAX_TOKENS_PER_FORM;
            for (_, key) in same_form.into_iter().take(excess) {
                issued.remove(&key);
            }
        }

        issued.insert(
            token.clone(),
            IssuedToken {
                action: action.to_string(),
                product_id,
                expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
        token
    }

    pub fn verify(&self, token: Option<&str>, action: &str, product_id: ProductId) -> TokenCheck {
        self.verify_at(token, action, product_id, Utc::now())
    }

    /// Check and consume a token. Any token that is found is removed, whether
    /// or not it matched.
    pub fn verify_at(
        &self,
        token: Option<&str>,
        action: &str,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> TokenCheck {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return TokenCheck::Missing,
        };

        let mut issued = match self.issued.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(entry) = issued.remove(token) else {
            return TokenCheck::Unknown;
        };

        if entry.expires_at <= now {
            TokenCheck::Expired
        } else if entry.action != action || entry.product_id != product_id {
            TokenCheck::Mismatch
        } else {
            TokenCheck::Valid
        }
    }
}
