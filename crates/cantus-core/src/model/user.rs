use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AccountId, InviteTokenId, SessionId, UserId};

/// A login account. Created at registration; there is no delete flow in
/// the application, but deleting one cascades to its accounts and
/// sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    pub password_hash: Option<String>,

    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            password_hash: None,
            email_verified: None,
            image: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A linked identity from an external provider (OAuth account).
///
/// `(provider, provider_account_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAccount {
    pub id: AccountId,
    pub user_id: UserId,
    /// Account kind as reported by the identity library ("oauth", ...).
    pub kind: String,
    pub provider: String,
    pub provider_account_id: String,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    /// Provider expiry, seconds since the epoch.
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

impl ExternalAccount {
    #[must_use]
    pub fn new(
        user_id: UserId,
        kind: impl Into<String>,
        provider: impl Into<String>,
        provider_account_id: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            user_id,
            kind: kind.into(),
            provider: provider.into(),
            provider_account_id: provider_account_id.into(),
            refresh_token: None,
            access_token: None,
            expires_at: None,
            token_type: None,
            scope: None,
            id_token: None,
            session_state: None,
        }
    }
}

/// A login session owned by the identity library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub session_token: String,
    pub user_id: UserId,
    pub expires: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(user_id: UserId, session_token: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            session_token: session_token.into(),
            user_id,
            expires,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// A single-use credential that allows self-registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteToken {
    /// `None` until the row has been stored.
    pub id: Option<InviteTokenId>,
    pub token: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    /// The user who consumed this token. Cleared if that user is deleted.
    pub user_id: Option<UserId>,
}

impl InviteToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            id: None,
            token: token.into(),
            used: false,
            created_at: Utc::now(),
            expires: None,
            used_at: None,
            user_id: None,
        }
    }

    #[must_use]
    pub const fn with_expiry(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

/// An e-mail verification token owned by the identity library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationToken {
    pub identifier: String,
    pub token: String,
    pub expires: DateTime<Utc>,
}
