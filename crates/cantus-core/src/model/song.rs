use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{DriveFileId, SongId};

closed_enum! {
    /// Musical key of a song: the twelve pitch classes with both
    /// enharmonic spellings where they differ.
    MusicalKey as "musical key" {
        C => "C",
        CSharp => "C#",
        DFlat => "Db",
        D => "D",
        DSharp => "D#",
        EFlat => "Eb",
        E => "E",
        F => "F",
        FSharp => "F#",
        GFlat => "Gb",
        G => "G",
        GSharp => "G#",
        AFlat => "Ab",
        A => "A",
        ASharp => "A#",
        BFlat => "Bb",
        B => "B",
    }
}

impl MusicalKey {
    /// Pitch class (C = 0) shared by enharmonic spellings.
    #[must_use]
    pub const fn pitch_class(self) -> u8 {
        match self {
            Self::C => 0,
            Self::CSharp | Self::DFlat => 1,
            Self::D => 2,
            Self::DSharp | Self::EFlat => 3,
            Self::E => 4,
            Self::F => 5,
            Self::FSharp | Self::GFlat => 6,
            Self::G => 7,
            Self::GSharp | Self::AFlat => 8,
            Self::A => 9,
            Self::ASharp | Self::BFlat => 10,
            Self::B => 11,
        }
    }
}

closed_enum! {
    /// What a song file link points at.
    LinkType as "link type" {
        Audio => "Audio",
        AudioRecording => "AudioRecording",
        AudioPracticeTrack => "AudioPracticeTrack",
        AudioInitialNotes => "AudioInitialNotes",
        Video => "Video",
        Pdf => "PDF",
        MuseScore => "MuseScore",
        Other => "Other",
    }
}

/// A song in the choir's repertoire. Names are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub name: String,
    pub key: Option<MusicalKey>,
    pub lyrics: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Song {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SongId::new(),
            name: name.into(),
            key: None,
            lyrics: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn with_key(mut self, key: MusicalKey) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn with_lyrics(mut self, lyrics: impl Into<String>) -> Self {
        self.lyrics = Some(lyrics.into());
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A labelled link from a song to an audio, video or score file.
///
/// Identified by `(song_id, label)`: labels are unique per song only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongFileLink {
    pub song_id: SongId,
    pub link_type: LinkType,
    pub label: String,
    pub url: String,

    /// The synced drive file this link was created from, if any.
    /// Cleared when that file record is deleted.
    pub google_drive_id: Option<DriveFileId>,

    pub created_at: DateTime<Utc>,
}

impl SongFileLink {
    #[must_use]
    pub fn new(
        song_id: SongId,
        link_type: LinkType,
        label: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            song_id,
            link_type,
            label: label.into(),
            url: url.into(),
            google_drive_id: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_drive_file(mut self, id: DriveFileId) -> Self {
        self.google_drive_id = Some(id);
        self
    }
}

/// A song together with all of its file links, as listed for editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongWithLinks {
    #[serde(flatten)]
    pub song: Song,
    pub file_links: Vec<SongFileLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_musical_key_has_seventeen_spellings() {
        assert_eq!(MusicalKey::ALL.len(), 17);
        assert_eq!("Db".parse::<MusicalKey>().unwrap(), MusicalKey::DFlat);
        assert_eq!(MusicalKey::FSharp.to_string(), "F#");
    }

    #[test]
    fn test_enharmonic_spellings_share_pitch_class() {
        assert_eq!(
            MusicalKey::CSharp.pitch_class(),
            MusicalKey::DFlat.pitch_class()
        );
        assert_ne!(MusicalKey::E.pitch_class(), MusicalKey::F.pitch_class());
    }

    #[test]
    fn test_musical_key_rejects_unlisted_spellings() {
        // E# and Cb are real spellings but not members of the set
        assert!("E#".parse::<MusicalKey>().is_err());
        assert!("Cb".parse::<MusicalKey>().is_err());
    }

    #[test]
    fn test_link_type_pdf_spelling() {
        assert_eq!(LinkType::ALL.len(), 8);
        assert_eq!(LinkType::Pdf.as_str(), "PDF");
        assert!("Pdf".parse::<LinkType>().is_err());
    }

    #[test]
    fn test_song_builder() {
        let song = Song::new("Ave Maria")
            .with_key(MusicalKey::BFlat)
            .with_notes("Schubert");
        assert_eq!(song.key, Some(MusicalKey::BFlat));
        assert_eq!(song.notes.as_deref(), Some("Schubert"));
        assert!(song.lyrics.is_none());
    }
}
