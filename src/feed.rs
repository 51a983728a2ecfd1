//! EONET feed client and startup ingestion pass.
//!
//! Issues one bounded GET against the events feed, decodes the payload into
//! a typed schema, flattens each event's geometry entries into rows, and
//! writes them through the [`EventStore`]. Runs exactly once, before the
//! server starts accepting requests.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::storage::{EventRow, EventStore, WriteReport};

/// Grouping key assumed when the ingestion pass could not determine one.
///
/// Matches the feed's documented top-level title, so a later successful
/// ingest into the same store remains queryable.
pub const DEFAULT_GROUPING_KEY: &str = "EONET Events";

/// Errors from fetching or decoding the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network failure, timeout, or non-2xx response.
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape.
    #[error("failed to decode feed body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The top-level `title` used as grouping key was absent.
    #[error("feed response is missing the top-level title used as grouping key")]
    MissingGroupingKey,
}

/// Feed payload, typed with optional fields so a malformed record produces a
/// logged skip or a descriptive error instead of an unrecovered crash.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSnapshot {
    /// Top-level feed title, used as the grouping key for every row.
    #[serde(default)]
    pub title: Option<String>,
    /// Event records in this batch.
    #[serde(default)]
    pub events: Vec<FeedEvent>,
}

/// One event record from the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEvent {
    #[serde(default)]
    pub title: Option<String>,
    /// Geographic/temporal observations; each becomes one row.
    #[serde(default)]
    pub geometry: Vec<FeedGeometry>,
}

/// One observation entry of an event.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedGeometry {
    #[serde(default)]
    pub date: Option<String>,
}

/// HTTP client for the events feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
    limit: u32,
}

impl FeedClient {
    /// Build a client for `url` with a fixed result-count limit.
    ///
    /// # Errors
    /// Returns `FeedError::Transport` if the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        limit: u32,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            limit,
        })
    }

    /// Fetch one bounded batch of events.
    pub async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("limit", self.limit)])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let snapshot: FeedSnapshot = serde_json::from_str(&body)?;

        tracing::debug!(
            url = %self.url,
            limit = self.limit,
            events = snapshot.events.len(),
            "fetched feed snapshot"
        );
        Ok(snapshot)
    }
}

/// Flatten a snapshot into rows: one row per geometry entry, all sharing the
/// feed's top-level title as grouping key.
///
/// Events without a title and geometry entries without a date are skipped
/// with a warning rather than aborting the whole pass. A missing top-level
/// title is an error: without it there is no grouping key to write under.
pub fn flatten(snapshot: &FeedSnapshot) -> Result<(String, Vec<EventRow>), FeedError> {
    let id = snapshot
        .title
        .as_deref()
        .ok_or(FeedError::MissingGroupingKey)?;

    let mut rows = Vec::new();
    for event in &snapshot.events {
        let Some(title) = event.title.as_deref() else {
            tracing::warn!("skipping event without title");
            continue;
        };
        for geometry in &event.geometry {
            let Some(date) = geometry.date.as_deref() else {
                tracing::warn!(title, "skipping geometry entry without date");
                continue;
            };
            rows.push(EventRow::new(id, title, date));
        }
    }

    Ok((id.to_string(), rows))
}

/// Run the startup ingestion pass: fetch, flatten, write.
///
/// Best-effort end to end. Fetch and decode failures leave the store
/// untouched; per-row write failures are collected in the report. Returns
/// the grouping key the rows were written under.
pub async fn run_ingest(
    client: &FeedClient,
    store: &EventStore,
) -> Result<(String, WriteReport), FeedError> {
    let snapshot = client.fetch().await?;
    let (grouping_key, rows) = flatten(&snapshot)?;
    let report = store.put_rows(&rows).await;

    tracing::info!(
        grouping_key = %grouping_key,
        written = report.written,
        failed = report.failed.len(),
        "ingestion pass complete"
    );
    Ok((grouping_key, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> FeedSnapshot {
        serde_json::from_value(serde_json::json!({
            "title": "EONET Events",
            "events": [
                {"title": "Wildfire A", "geometry": [{"date": "2020-01-02"}]},
                {"title": "Storm B", "geometry": [
                    {"date": "2020-01-01"},
                    {"date": "2020-01-03"}
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_flatten_one_row_per_geometry_entry() {
        let (id, rows) = flatten(&sample_snapshot()).unwrap();
        assert_eq!(id, "EONET Events");
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.id == "EONET Events"));
        assert_eq!(rows[0], EventRow::new("EONET Events", "Wildfire A", "2020-01-02"));
        assert_eq!(rows[1], EventRow::new("EONET Events", "Storm B", "2020-01-01"));
        assert_eq!(rows[2], EventRow::new("EONET Events", "Storm B", "2020-01-03"));
    }

    #[test]
    fn test_flatten_empty_events() {
        let snapshot: FeedSnapshot =
            serde_json::from_value(serde_json::json!({"title": "EONET Events", "events": []}))
                .unwrap();
        let (_, rows) = flatten(&snapshot).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_flatten_skips_event_without_title() {
        let snapshot: FeedSnapshot = serde_json::from_value(serde_json::json!({
            "title": "EONET Events",
            "events": [
                {"geometry": [{"date": "2020-01-01"}]},
                {"title": "Storm B", "geometry": [{"date": "2020-01-02"}]}
            ]
        }))
        .unwrap();
        let (_, rows) = flatten(&snapshot).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Storm B");
    }

    #[test]
    fn test_flatten_skips_geometry_without_date() {
        let snapshot: FeedSnapshot = serde_json::from_value(serde_json::json!({
            "title": "EONET Events",
            "events": [
                {"title": "Storm B", "geometry": [{}, {"date": "2020-01-02"}]}
            ]
        }))
        .unwrap();
        let (_, rows) = flatten(&snapshot).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2020-01-02");
    }

    #[test]
    fn test_flatten_missing_grouping_key() {
        let snapshot: FeedSnapshot =
            serde_json::from_value(serde_json::json!({"events": []})).unwrap();
        assert!(matches!(
            flatten(&snapshot),
            Err(FeedError::MissingGroupingKey)
        ));
    }

    #[test]
    fn test_snapshot_decode_tolerates_extra_fields() {
        // The real feed carries link/description/categories and more; the
        // typed schema only pulls what the rows need.
        let snapshot: FeedSnapshot = serde_json::from_value(serde_json::json!({
            "title": "EONET Events",
            "description": "Natural events",
            "link": "https://eonet.gsfc.nasa.gov/api/v3/events",
            "events": [{
                "id": "EONET_0001",
                "title": "Wildfire A",
                "closed": null,
                "geometry": [{
                    "magnitudeValue": null,
                    "date": "2020-01-02T00:00:00Z",
                    "type": "Point",
                    "coordinates": [150.0, -30.0]
                }]
            }]
        }))
        .unwrap();
        let (_, rows) = flatten(&snapshot).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2020-01-02T00:00:00Z");
    }
}
