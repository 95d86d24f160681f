//! Testing utilities and a mock remote client.
//!
//! This module provides a mock implementation of `RemoteClient` plus
//! fixtures for library items, quality profiles and paged listings, so the
//! discovery engine can be exercised without a running Radarr instance.
//!
//! # Example
//!
//! ```rust,ignore
//! use kyhunt_core::testing::{fixtures, MockRemoteClient};
//!
//! let client = MockRemoteClient::new();
//! let movies = (1..=2500).map(|i| fixtures::movie(i, &format!("Movie {i}"))).collect();
//! client.set_handler("wanted/cutoff", fixtures::paged_listing(movies)).await;
//! ```

mod mock_remote;

pub use mock_remote::{MockRemoteClient, RecordedRequest};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Map, Value};

    use crate::remote::{ApiRequest, LibraryItem, MovieFile, QualityProfile, RemoteError};

    /// Create a monitored, downloaded movie on profile 1 whose file meets cutoff.
    pub fn movie(id: i64, title: &str) -> LibraryItem {
        LibraryItem {
            id,
            title: title.to_string(),
            year: Some(2000 + (id % 25) as i32),
            monitored: true,
            has_file: true,
            quality_profile_id: 1,
            movie_file: Some(movie_file(id * 10, None)),
            extra: Map::new(),
        }
    }

    /// Create an unmonitored movie.
    pub fn unmonitored_movie(id: i64, title: &str) -> LibraryItem {
        LibraryItem {
            monitored: false,
            ..movie(id, title)
        }
    }

    /// Create a movie on the given profile.
    pub fn movie_on_profile(id: i64, title: &str, profile_id: i64) -> LibraryItem {
        LibraryItem {
            quality_profile_id: profile_id,
            ..movie(id, title)
        }
    }

    /// Create a movie without a downloaded file.
    pub fn missing_movie(id: i64, title: &str) -> LibraryItem {
        LibraryItem {
            has_file: false,
            movie_file: None,
            ..movie(id, title)
        }
    }

    /// Create a movie file with the given custom format score.
    pub fn movie_file(id: i64, score: Option<i64>) -> MovieFile {
        MovieFile {
            id,
            custom_format_score: score,
            quality_cutoff_not_met: false,
            quality: None,
        }
    }

    /// Create a quality profile.
    pub fn profile(id: i64, cutoff_format_score: i64, upgrade_allowed: bool) -> QualityProfile {
        QualityProfile {
            id,
            name: format!("Profile {}", id),
            cutoff_format_score,
            upgrade_allowed,
        }
    }

    /// Serialize any fixture value into a JSON payload.
    pub fn to_json<T: serde::Serialize>(value: &T) -> Value {
        serde_json::to_value(value).unwrap_or(Value::Null)
    }

    /// Build a paged listing payload.
    pub fn page(page: u64, page_size: u64, total: u64, records: &[LibraryItem]) -> Value {
        json!({
            "page": page,
            "pageSize": page_size,
            "totalRecords": total,
            "records": to_json(&records),
        })
    }

    /// A handler serving `records` as a paged listing, honouring the
    /// `page` and `pageSize` query parameters.
    pub fn paged_listing(
        records: Vec<LibraryItem>,
    ) -> impl Fn(&ApiRequest) -> Result<Value, RemoteError> + Send + Sync + 'static {
        move |request: &ApiRequest| {
            let page_no: u64 = request
                .query_param("page")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1);
            let page_size: u64 = request
                .query_param("pageSize")
                .and_then(|p| p.parse().ok())
                .unwrap_or(10);

            let total = records.len() as u64;
            let start = (page_no.saturating_sub(1) * page_size).min(total) as usize;
            let end = (start as u64 + page_size).min(total) as usize;

            Ok(page(page_no, page_size, total, &records[start..end]))
        }
    }

    /// Build a command status payload.
    pub fn command_status(id: i64, state: &str) -> Value {
        json!({ "id": id, "name": "MoviesSearch", "state": state })
    }
}
