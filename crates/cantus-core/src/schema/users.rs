use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::model::{
    required_text, ExternalAccount, InviteToken, InviteTokenId, Session, User, UserId,
    VerificationToken,
};

use super::codec::{get_opt_ts, get_ts, opt_ts, ts};
use super::constraint::WriteResultExt;
use super::singers::normalize_email;
use super::Database;

const USER_COLUMNS: &str =
    r#"id, "firstName", "lastName", email, "passwordHash", "emailVerified", image, "createdAt""#;

const INVITE_COLUMNS: &str = r#"id, token, used, "createdAt", expires, "usedAt", user_id"#;

// User CRUD
impl Database {
    /// Insert a user. The password hash, if any, is stored as given.
    pub fn insert_user(&self, user: &User) -> Result<()> {
        insert_user_row(self.conn(), user)
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                &format!(r#"SELECT {USER_COLUMNS} FROM "User" WHERE id = ?1"#),
                [id],
                row_to_user,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("User", id))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(email) = normalize_email(Some(email)) else {
            return Ok(None);
        };
        Ok(self
            .conn()
            .query_row(
                &format!(r#"SELECT {USER_COLUMNS} FROM "User" WHERE email = ?1"#),
                [email],
                row_to_user,
            )
            .optional()?)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(&format!(
            r#"SELECT {USER_COLUMNS} FROM "User" ORDER BY "createdAt""#
        ))?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn count_users(&self) -> Result<u64> {
        self.count_rows("User")
    }

    /// Delete a user together with their accounts and sessions. An invite
    /// token the user consumed stays, with its user reference cleared.
    pub fn delete_user(&self, id: UserId) -> Result<()> {
        self.delete_row("User", &id)
    }
}

// Account and Session operations
impl Database {
    pub fn insert_account(&self, account: &ExternalAccount) -> Result<()> {
        self.conn()
            .execute(
                r#"INSERT INTO "Account" (id, user_id, "type", provider, provider_account_id,
                       refresh_token, access_token, expires_at, token_type, scope, id_token,
                       session_state)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
                rusqlite::params![
                    account.id,
                    account.user_id,
                    account.kind,
                    account.provider,
                    account.provider_account_id,
                    account.refresh_token,
                    account.access_token,
                    account.expires_at,
                    account.token_type,
                    account.scope,
                    account.id_token,
                    account.session_state,
                ],
            )
            .on_write(
                "Account",
                format!("{}/{}", account.provider, account.provider_account_id),
            )?;
        Ok(())
    }

    pub fn list_accounts_for_user(&self, user_id: UserId) -> Result<Vec<ExternalAccount>> {
        let mut stmt = self.conn().prepare(
            r#"SELECT id, user_id, "type", provider, provider_account_id, refresh_token,
                      access_token, expires_at, token_type, scope, id_token, session_state
               FROM "Account" WHERE user_id = ?1 ORDER BY provider"#,
        )?;
        let accounts = stmt
            .query_map([user_id], |row| {
                Ok(ExternalAccount {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    kind: row.get(2)?,
                    provider: row.get(3)?,
                    provider_account_id: row.get(4)?,
                    refresh_token: row.get(5)?,
                    access_token: row.get(6)?,
                    expires_at: row.get(7)?,
                    token_type: row.get(8)?,
                    scope: row.get(9)?,
                    id_token: row.get(10)?,
                    session_state: row.get(11)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    pub fn insert_session(&self, session: &Session) -> Result<()> {
        self.conn()
            .execute(
                r#"INSERT INTO "Session" (id, session_token, user_id, expires)
                   VALUES (?1, ?2, ?3, ?4)"#,
                rusqlite::params![
                    session.id,
                    session.session_token,
                    session.user_id,
                    ts(&session.expires),
                ],
            )
            .on_write("Session", session.id)?;
        Ok(())
    }

    /// Look up a session by its token. Expired sessions are still returned;
    /// callers check [`Session::is_expired`].
    pub fn find_session(&self, session_token: &str) -> Result<Option<Session>> {
        Ok(self
            .conn()
            .query_row(
                r#"SELECT id, session_token, user_id, expires FROM "Session"
                   WHERE session_token = ?1"#,
                [session_token],
                |row| {
                    Ok(Session {
                        id: row.get(0)?,
                        session_token: row.get(1)?,
                        user_id: row.get(2)?,
                        expires: get_ts(row, 3)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn delete_session(&self, session_token: &str) -> Result<()> {
        let removed = self.conn().execute(
            r#"DELETE FROM "Session" WHERE session_token = ?1"#,
            [session_token],
        )?;
        if removed == 0 {
            return Err(Error::not_found("Session", session_token));
        }
        Ok(())
    }

    /// Drop sessions whose expiry is at or before `now`.
    pub fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let removed = self.conn().execute(
            r#"DELETE FROM "Session" WHERE expires <= ?1"#,
            [ts(&now)],
        )?;
        if removed > 0 {
            log::info!("Removed {removed} expired sessions");
        }
        Ok(removed)
    }
}

// Token operations
impl Database {
    /// Store an invite token and return it with its assigned id.
    pub fn insert_invite_token(&self, invite: &InviteToken) -> Result<InviteToken> {
        let token = required_text("invite token", &invite.token)?;
        self.conn()
            .execute(
                r#"INSERT INTO "InviteToken" (token, used, "createdAt", expires, "usedAt", user_id)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                rusqlite::params![
                    token,
                    invite.used,
                    ts(&invite.created_at),
                    opt_ts(invite.expires.as_ref()),
                    opt_ts(invite.used_at.as_ref()),
                    invite.user_id,
                ],
            )
            .on_write("InviteToken", "token")?;

        let mut stored = invite.clone();
        stored.id = Some(InviteTokenId(self.conn().last_insert_rowid()));
        stored.token = token;
        Ok(stored)
    }

    pub fn find_invite_token(&self, token: &str) -> Result<Option<InviteToken>> {
        select_invite_by_token(self.conn(), token)
    }

    /// All invite tokens, newest first.
    pub fn list_invite_tokens(&self) -> Result<Vec<InviteToken>> {
        let mut stmt = self.conn().prepare(&format!(
            r#"SELECT {INVITE_COLUMNS} FROM "InviteToken" ORDER BY id DESC"#
        ))?;
        let tokens = stmt
            .query_map([], row_to_invite)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tokens)
    }

    pub fn insert_verification_token(&self, token: &VerificationToken) -> Result<()> {
        self.conn()
            .execute(
                r#"INSERT INTO "VerificationToken" (identifier, token, expires)
                   VALUES (?1, ?2, ?3)"#,
                rusqlite::params![token.identifier, token.token, ts(&token.expires)],
            )
            .on_write("VerificationToken", &token.identifier)?;
        Ok(())
    }

    /// Remove and return a verification token. A token can be redeemed once.
    pub fn take_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> Result<Option<VerificationToken>> {
        let tx = self.transaction()?;
        let found = tx
            .query_row(
                r#"SELECT identifier, token, expires FROM "VerificationToken"
                   WHERE identifier = ?1 AND token = ?2"#,
                [identifier, token],
                |row| {
                    Ok(VerificationToken {
                        identifier: row.get(0)?,
                        token: row.get(1)?,
                        expires: get_ts(row, 2)?,
                    })
                },
            )
            .optional()?;
        if found.is_some() {
            tx.execute(
                r#"DELETE FROM "VerificationToken" WHERE identifier = ?1 AND token = ?2"#,
                [identifier, token],
            )?;
        }
        tx.commit()?;
        Ok(found)
    }
}

pub(crate) fn insert_user_row(conn: &Connection, user: &User) -> Result<()> {
    let first_name = required_text("first name", &user.first_name)?;
    let last_name = required_text("last name", &user.last_name)?;
    let email = normalize_email(user.email.as_deref());

    conn.execute(
        &format!(r#"INSERT INTO "User" ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#),
        rusqlite::params![
            user.id,
            first_name,
            last_name,
            email,
            user.password_hash,
            opt_ts(user.email_verified.as_ref()),
            user.image,
            ts(&user.created_at),
        ],
    )
    .on_write("User", email.as_deref().unwrap_or("(no email)"))?;
    log::debug!("Inserted user {} {} ({})", first_name, last_name, user.id);
    Ok(())
}

pub(crate) fn count_users_in(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row(r#"SELECT COUNT(*) FROM "User""#, [], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

pub(crate) fn select_invite_by_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<InviteToken>> {
    Ok(conn
        .query_row(
            &format!(r#"SELECT {INVITE_COLUMNS} FROM "InviteToken" WHERE token = ?1"#),
            [token],
            row_to_invite,
        )
        .optional()?)
}

/// Flag a token as consumed by `user_id`. Only flips an unused token.
pub(crate) fn mark_invite_used(
    conn: &Connection,
    id: InviteTokenId,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<bool> {
    let updated = conn
        .execute(
            r#"UPDATE "InviteToken" SET used = 1, "usedAt" = ?2, user_id = ?3
               WHERE id = ?1 AND used = 0"#,
            rusqlite::params![id.0, ts(&now), user_id],
        )
        .on_write("InviteToken", id)?;
    Ok(updated == 1)
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        email_verified: get_opt_ts(row, 5)?,
        image: row.get(6)?,
        created_at: get_ts(row, 7)?,
    })
}

fn row_to_invite(row: &rusqlite::Row<'_>) -> rusqlite::Result<InviteToken> {
    Ok(InviteToken {
        id: Some(InviteTokenId(row.get(0)?)),
        token: row.get(1)?,
        used: row.get(2)?,
        created_at: get_ts(row, 3)?,
        expires: get_opt_ts(row, 4)?,
        used_at: get_opt_ts(row, 5)?,
        user_id: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::Duration;

    fn user(email: &str) -> User {
        User::new("Maria", "Keller").with_email(email)
    }

    #[test]
    fn test_user_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut u = user("maria@example.org");
        u.password_hash = Some("$argon2id$v=19$stub".to_string());
        db.insert_user(&u).unwrap();

        let loaded = db.get_user(u.id).unwrap();
        assert_eq!(loaded, u);
        assert_eq!(db.count_users().unwrap(), 1);
        assert!(db.find_user_by_email(" maria@example.org ").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_user_email_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&user("same@example.org")).unwrap();
        let err = db.insert_user(&user("same@example.org")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn test_account_provider_pair_is_unique() {
        let db = Database::open_in_memory().unwrap();
        let a = user("a@example.org");
        let b = user("b@example.org");
        db.insert_user(&a).unwrap();
        db.insert_user(&b).unwrap();

        db.insert_account(&ExternalAccount::new(a.id, "oauth", "google", "123"))
            .unwrap();
        let err = db
            .insert_account(&ExternalAccount::new(b.id, "oauth", "google", "123"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        db.insert_account(&ExternalAccount::new(b.id, "oauth", "github", "123"))
            .unwrap();
    }

    #[test]
    fn test_account_for_missing_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .insert_account(&ExternalAccount::new(UserId::new(), "oauth", "google", "1"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_user_cascades_and_clears_invite() {
        let db = Database::open_in_memory().unwrap();
        let u = user("gone@example.org");
        db.insert_user(&u).unwrap();
        db.insert_account(&ExternalAccount::new(u.id, "oauth", "google", "9"))
            .unwrap();
        db.insert_session(&Session::new(u.id, "tok", Utc::now() + Duration::days(1)))
            .unwrap();
        let invite = db.insert_invite_token(&InviteToken::new("inv-1")).unwrap();
        assert!(mark_invite_used(db.conn(), invite.id.unwrap(), u.id, Utc::now()).unwrap());

        db.delete_user(u.id).unwrap();

        assert!(db.list_accounts_for_user(u.id).unwrap().is_empty());
        assert!(db.find_session("tok").unwrap().is_none());
        let invite = db.find_invite_token("inv-1").unwrap().unwrap();
        assert!(invite.used);
        assert_eq!(invite.user_id, None);
    }

    #[test]
    fn test_delete_expired_sessions() {
        let db = Database::open_in_memory().unwrap();
        let u = user("s@example.org");
        db.insert_user(&u).unwrap();
        let now = Utc::now();
        db.insert_session(&Session::new(u.id, "old", now - Duration::hours(1)))
            .unwrap();
        db.insert_session(&Session::new(u.id, "edge", now)).unwrap();
        db.insert_session(&Session::new(u.id, "fresh", now + Duration::hours(1)))
            .unwrap();

        assert_eq!(db.delete_expired_sessions(now).unwrap(), 2);
        assert!(db.find_session("fresh").unwrap().is_some());
    }

    #[test]
    fn test_invite_token_ids_and_uniqueness() {
        let db = Database::open_in_memory().unwrap();
        let first = db.insert_invite_token(&InviteToken::new("t1")).unwrap();
        let second = db.insert_invite_token(&InviteToken::new("t2")).unwrap();
        assert!(second.id.unwrap().0 > first.id.unwrap().0);

        let err = db.insert_invite_token(&InviteToken::new("t1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(db.list_invite_tokens().unwrap()[0].token, "t2");
    }

    #[test]
    fn test_token_marked_used_only_once() {
        let db = Database::open_in_memory().unwrap();
        let a = user("a@example.org");
        let b = user("b@example.org");
        db.insert_user(&a).unwrap();
        db.insert_user(&b).unwrap();
        let invite = db.insert_invite_token(&InviteToken::new("once")).unwrap();
        let id = invite.id.unwrap();

        assert!(mark_invite_used(db.conn(), id, a.id, Utc::now()).unwrap());
        assert!(!mark_invite_used(db.conn(), id, b.id, Utc::now()).unwrap());
        assert_eq!(db.find_invite_token("once").unwrap().unwrap().user_id, Some(a.id));
    }

    #[test]
    fn test_verification_token_redeemed_once() {
        let db = Database::open_in_memory().unwrap();
        let token = VerificationToken {
            identifier: "maria@example.org".to_string(),
            token: "abc".to_string(),
            expires: Utc::now() + Duration::hours(1),
        };
        db.insert_verification_token(&token).unwrap();
        assert_eq!(
            db.take_verification_token("maria@example.org", "abc").unwrap(),
            Some(token)
        );
        assert!(db
            .take_verification_token("maria@example.org", "abc")
            .unwrap()
            .is_none());
    }
}
