//! Row and ordering types for the events table.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One flattened event occurrence.
///
/// For an event with N geometry entries the ingestion pass writes N rows,
/// all sharing `id` and `title` and differing only in `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRow {
    /// Grouping key: the feed's top-level title, identical for every row.
    pub id: String,
    /// Title of the individual event.
    pub title: String,
    /// ISO-8601 occurrence date from one geometry entry.
    pub date: String,
}

impl EventRow {
    /// Create a new row.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date: date.into(),
        }
    }
}

/// Ordering attribute for [`EventStore::query_ordered`].
///
/// [`EventStore::query_ordered`]: super::EventStore::query_ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OrderBy {
    /// Ascending by event title, served by the base table key.
    #[default]
    Title,
    /// Ascending by occurrence date, served by the secondary index.
    Date,
}

impl OrderBy {
    /// Column name used in the ORDER BY clause.
    ///
    /// Static strings only, never interpolated from request input.
    pub(crate) fn as_column(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Date => "date",
        }
    }
}
