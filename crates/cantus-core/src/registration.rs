//! Invite-guarded self-registration.
//!
//! The first user of an empty database registers freely. Every later
//! registration consumes a valid invite token.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;

use crate::credentials::{generate_invite_token, hash_password};
use crate::error::{Error, InviteRejection, Result};
use crate::model::{required_text, InviteToken, User, UserId};
use crate::schema::users::{
    count_users_in, insert_user_row, mark_invite_used, select_invite_by_token,
};
use crate::schema::Database;

/// What a prospective user submits.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub invite_token: Option<String>,
}

impl Database {
    /// Create a user account.
    ///
    /// The invite is checked before the password is hashed, and checked
    /// again with the user count under the write lock, so two concurrent
    /// registrations on an empty database cannot both skip the invite.
    pub fn register_user(&self, registration: &Registration, now: DateTime<Utc>) -> Result<User> {
        let email = required_text("email", &registration.email)?;
        if count_users_in(self.conn())? > 0 {
            validate_invite(self.conn(), registration.invite_token.as_deref(), now)?;
        }

        let mut user = User::new(&registration.first_name, &registration.last_name)
            .with_email(email);
        user.password_hash = Some(hash_password(&registration.password)?);

        let tx = self.immediate_transaction()?;
        let invite = if count_users_in(&tx)? == 0 {
            log::info!("No users yet; registering {} without an invite", user.id);
            None
        } else {
            Some(validate_invite(
                &tx,
                registration.invite_token.as_deref(),
                now,
            )?)
        };

        insert_user_row(&tx, &user)?;
        if let Some(id) = invite.and_then(|invite| invite.id) {
            if !mark_invite_used(&tx, id, user.id, now)? {
                return Err(Error::InviteRejected(InviteRejection::Used));
            }
        }
        tx.commit()?;

        log::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Issue a new invite token.
    pub fn create_invite(&self, expires: Option<DateTime<Utc>>) -> Result<InviteToken> {
        let mut invite = InviteToken::new(generate_invite_token());
        invite.expires = expires;
        let stored = self.insert_invite_token(&invite)?;
        log::info!("Created invite token {:?}", stored.id);
        Ok(stored)
    }

    /// Check whether `token` would be accepted by [`Database::register_user`]
    /// at `now`, without consuming it.
    pub fn check_invite(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<InviteToken> {
        validate_invite(self.conn(), token, now)
    }

    /// Whether `password` matches the stored hash of a user. Users without
    /// a password (external accounts only) never match.
    pub fn verify_password(&self, user_id: UserId, password: &str) -> Result<bool> {
        match self.get_user(user_id)?.password_hash {
            Some(hash) => crate::credentials::verify_password(password, &hash),
            None => Ok(false),
        }
    }
}

fn validate_invite(
    conn: &Connection,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<InviteToken> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(Error::InviteRejected(InviteRejection::Missing))?;
    let invite = select_invite_by_token(conn, token)?
        .ok_or(Error::InviteRejected(InviteRejection::Unknown))?;
    if invite.used {
        return Err(Error::InviteRejected(InviteRejection::Used));
    }
    if invite.is_expired(now) {
        return Err(Error::InviteRejected(InviteRejection::Expired));
    }
    Ok(invite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::Duration;

    fn registration(email: &str, token: Option<&str>) -> Registration {
        Registration {
            first_name: "Ida".to_string(),
            last_name: "Roth".to_string(),
            email: email.to_string(),
            password: "tenor-and-bass".to_string(),
            invite_token: token.map(str::to_string),
        }
    }

    #[test]
    fn test_first_user_needs_no_invite() {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .register_user(&registration("first@example.org", None), Utc::now())
            .unwrap();
        assert_eq!(db.count_users().unwrap(), 1);
        assert!(db.verify_password(user.id, "tenor-and-bass").unwrap());
        assert!(!db.verify_password(user.id, "soprano").unwrap());
    }

    #[test]
    fn test_second_user_without_token_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.register_user(&registration("first@example.org", None), Utc::now())
            .unwrap();
        let err = db
            .register_user(&registration("second@example.org", None), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InviteRejected(InviteRejection::Missing)
        ));
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn test_invite_is_checked_before_password() {
        let db = Database::open_in_memory().unwrap();
        db.register_user(&registration("first@example.org", None), Utc::now())
            .unwrap();

        let mut second = registration("second@example.org", Some("nope"));
        second.password = "short".to_string();
        let err = db.register_user(&second, Utc::now()).unwrap_err();

        assert!(matches!(
            err,
            Error::InviteRejected(InviteRejection::Unknown)
        ));
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.register_user(&registration("first@example.org", None), Utc::now())
            .unwrap();
        let err = db
            .register_user(&registration("second@example.org", Some("nope")), Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invite_is_consumed_once() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.register_user(&registration("first@example.org", None), now)
            .unwrap();
        let invite = db.create_invite(None).unwrap();

        let second = db
            .register_user(&registration("second@example.org", Some(&invite.token)), now)
            .unwrap();
        let stored = db.find_invite_token(&invite.token).unwrap().unwrap();
        assert!(stored.used);
        assert_eq!(stored.user_id, Some(second.id));
        assert_eq!(stored.used_at, Some(now));

        let err = db
            .register_user(&registration("third@example.org", Some(&invite.token)), now)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(db.count_users().unwrap(), 2);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.register_user(&registration("first@example.org", None), now)
            .unwrap();
        let invite = db.create_invite(Some(now)).unwrap();

        let err = db.check_invite(Some(&invite.token), now).unwrap_err();
        assert!(matches!(
            err,
            Error::InviteRejected(InviteRejection::Expired)
        ));
        assert!(db
            .check_invite(Some(&invite.token), now - Duration::minutes(1))
            .is_ok());
    }

    #[test]
    fn test_duplicate_email_rolls_back_token_use() {
        let db = Database::open_in_memory().unwrap();
        db.register_user(&registration("first@example.org", None), Utc::now())
            .unwrap();
        let invite = db.create_invite(None).unwrap();

        let err = db
            .register_user(&registration("first@example.org", Some(&invite.token)), Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!db.find_invite_token(&invite.token).unwrap().unwrap().used);
    }
}
