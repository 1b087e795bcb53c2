/// Declares a closed enumeration whose persisted spelling is fixed.
///
/// Variant order is part of the persisted contract and must not change.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The persisted spelling.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(crate::error::Error::Validation(format!(
                        "'{}' is not a valid {}; expected one of: {}",
                        s,
                        $label,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

pub mod drive_file;
pub mod event;
pub mod ids;
pub mod setlist;
pub mod singer;
pub mod song;
pub mod user;

pub use drive_file::GoogleDriveFile;
pub use event::{AttendanceKey, Event, EventAttendance, EventOverview};
pub use ids::{
    AccountId, DriveFileId, EventId, InviteTokenId, SessionId, SetlistId, SingerId, SongId,
    UserId,
};
pub use setlist::{Setlist, SetlistEntryKey, SetlistSongInfo};
pub use singer::{Singer, VoiceGroup};
pub use song::{LinkType, MusicalKey, Song, SongFileLink, SongWithLinks};
pub use user::{ExternalAccount, InviteToken, Session, User, VerificationToken};

/// Trim a required text field, rejecting blank input.
pub(crate) fn required_text(field: &str, value: &str) -> crate::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::Error::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
