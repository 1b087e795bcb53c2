use anyhow::{Context, Result};
use cantus_core::model::UserId;
use cantus_core::registration::Registration;
use cantus_core::schema::Database;
use chrono::{DateTime, Duration, Utc};

use super::open_database;
use crate::config::Config;

#[derive(Debug, clap::Subcommand)]
pub enum UserCommand {
    /// Register a user account
    ///
    /// The first account needs no invite. The password may also be given
    /// through CANTUS_PASSWORD.
    Register {
        first_name: String,
        last_name: String,
        email: String,
        #[arg(long, env = "CANTUS_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        invite: Option<String>,
    },
    /// Issue an invite token
    Invite {
        /// Days until the token expires; without it the token never expires
        #[arg(long)]
        expires_in_days: Option<u32>,
    },
    /// List invite tokens and whether they were used
    Invites,
    /// List user accounts
    List,
    /// Delete a user with their accounts and sessions
    Delete { id: UserId },
}

pub fn run(config: &Config, command: UserCommand) -> Result<()> {
    let db = open_database(config)?;
    match command {
        UserCommand::Register {
            first_name,
            last_name,
            email,
            password,
            invite,
        } => {
            let registration = Registration {
                first_name,
                last_name,
                email,
                password,
                invite_token: invite,
            };
            let user = db.register_user(&registration, Utc::now())?;
            println!("✓ Registered {} ({})", registration.email, user.id);
        }
        UserCommand::Invite { expires_in_days } => {
            let expires = expires_in_days
                .map(|days| invite_expiry(Utc::now(), days))
                .transpose()?;
            let invite = db.create_invite(expires)?;
            println!("{}", invite.token);
            if let Some(expires) = invite.expires {
                eprintln!("Valid until {}", expires.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        UserCommand::Invites => list_invites(&db)?,
        UserCommand::List => {
            for user in db.list_users()? {
                println!(
                    "{:<30} {:<30} {}",
                    format!("{} {}", user.first_name, user.last_name),
                    user.email.as_deref().unwrap_or("-"),
                    user.id
                );
            }
        }
        UserCommand::Delete { id } => {
            db.delete_user(id)?;
            println!("✓ Deleted user {id}");
        }
    }
    Ok(())
}

fn invite_expiry(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    Duration::try_days(i64::from(days))
        .and_then(|ttl| now.checked_add_signed(ttl))
        .with_context(|| format!("An invite cannot expire {days} days from now"))
}

fn list_invites(db: &Database) -> Result<()> {
    let now = Utc::now();
    for invite in db.list_invite_tokens()? {
        let state = if invite.used {
            "used"
        } else if invite.is_expired(now) {
            "expired"
        } else {
            "open"
        };
        println!(
            "{:<8} {}  {}",
            state,
            invite.created_at.format("%Y-%m-%d"),
            invite.token
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_expiry_in_days() {
        let now = Utc::now();
        assert_eq!(invite_expiry(now, 7).unwrap(), now + Duration::days(7));
    }

    #[test]
    fn test_invite_expiry_beyond_calendar_is_error() {
        let err = invite_expiry(Utc::now(), 4_000_000_000).unwrap_err();
        assert!(err.to_string().contains("4000000000 days"));
    }
}
