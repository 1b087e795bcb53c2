use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::SingerId;

closed_enum! {
    /// The voice group a singer sings in.
    ///
    /// `_M` marks the mixed groups between soprano and alto.
    VoiceGroup as "voice group" {
        S1 => "S1",
        S2 => "S2",
        S2M => "S2_M",
        A1M => "A1_M",
        A1 => "A1",
        A2 => "A2",
        T1 => "T1",
        T2 => "T2",
        B1 => "B1",
        B2 => "B2",
        /// Conductor (Dirigent).
        D => "D",
    }
}

/// A choir member profile.
///
/// Independent of [`crate::model::User`]: a singer need not have a login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Singer {
    pub id: SingerId,
    pub first_name: String,
    pub last_name: String,

    /// Unique across singers when present.
    pub email: Option<String>,

    pub voice_group: VoiceGroup,
    pub created_at: DateTime<Utc>,
}

impl Singer {
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        voice_group: VoiceGroup,
    ) -> Self {
        Self {
            id: SingerId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            voice_group,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
