use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single catalog record.
///
/// The checkout fields are always serialized, as `null` when unset, so a
/// loaded store re-saves to the identical layout. `checked_out_by` and
/// `checked_out_date` are present exactly while `is_checked_out` holds;
/// after a check-in they remain as historical record and only `return_date`
/// marks the book as returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier, assigned at creation and never reassigned.
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publication_year: i32,
    #[serde(default)]
    pub is_checked_out: bool,
    #[serde(default)]
    pub checked_out_by: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub checked_out_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub return_date: Option<OffsetDateTime>,
}

impl Book {
    pub(crate) fn new(
        id: String,
        title: String,
        author: String,
        genre: String,
        publication_year: i32,
    ) -> Self {
        Self {
            id,
            title,
            author,
            genre,
            publication_year,
            is_checked_out: false,
            checked_out_by: None,
            checked_out_date: None,
            return_date: None,
        }
    }

    /// Case-insensitive substring match against title, author, genre, and
    /// the decimal text of the publication year. `needle` must already be
    /// lowercased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.author.to_lowercase().contains(needle)
            || self.genre.to_lowercase().contains(needle)
            || self.publication_year.to_string().contains(needle)
    }
}
