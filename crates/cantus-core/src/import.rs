//! Bulk song import from a plain list of names.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::Result;
use crate::model::Song;
use crate::schema::Database;

/// Outcome of [`Database::import_songs`].
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub created: Vec<Song>,
    /// One human-readable line per name that was not imported.
    pub failures: Vec<String>,
}

impl ImportReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Song names from pasted text: one per line, trimmed, blank lines
/// dropped, repeats collapsed to their first occurrence.
#[must_use]
pub fn parse_song_names(text: &str) -> Vec<String> {
    distinct_names(text.lines())
}

fn distinct_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

impl Database {
    /// Create one song per distinct name.
    ///
    /// Names are trimmed and repeats collapsed before anything is written;
    /// blank names are skipped. Each name is then inserted on its own. A
    /// name that already exists is recorded as a failure and the import
    /// continues; any other error aborts it.
    pub fn import_songs<S: AsRef<str>>(&self, names: &[S]) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        for name in distinct_names(names.iter().map(AsRef::<str>::as_ref)) {
            let song = Song::new(name.as_str());
            match self.insert_song(&song) {
                Ok(()) => report.created.push(song),
                Err(e) if e.is_conflict() => {
                    log::warn!("Skipping song '{name}': {e}");
                    report.failures.push(format!("{name}: {e}"));
                }
                Err(e) => return Err(e),
            }
        }
        log::info!(
            "Imported {} songs ({} skipped)",
            report.created.len(),
            report.failures.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_song_names() {
        let text = "  Amazing Grace \n\nAve Maria\r\nAmazing Grace\n   \nSanctus";
        assert_eq!(
            parse_song_names(text),
            vec!["Amazing Grace", "Ave Maria", "Sanctus"]
        );
    }

    #[test]
    fn test_import_reports_existing_names() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&Song::new("Amazing Grace")).unwrap();

        let report = db
            .import_songs(&["Amazing Grace", "Amazing Grace", "Ave Maria"])
            .unwrap();

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].name, "Ave Maria");
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].starts_with("Amazing Grace"));
        assert_eq!(db.count_songs().unwrap(), 2);
    }

    #[test]
    fn test_import_of_parsed_text() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&Song::new("Amazing Grace")).unwrap();

        let names = parse_song_names("Amazing Grace\nAmazing Grace\nAve Maria\n");
        let report = db.import_songs(&names).unwrap();

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_clean());
        assert_eq!(db.count_songs().unwrap(), 2);
    }

    #[test]
    fn test_blank_names_are_skipped() {
        let db = Database::open_in_memory().unwrap();
        let report = db.import_songs(&["Sanctus", " ", " Gloria "]).unwrap();
        assert!(report.is_clean());
        let names: Vec<_> = db.list_songs().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Gloria", "Sanctus"]);
    }
}
