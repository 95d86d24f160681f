//! Custom format score gap detection.
//!
//! The remote cutoff-unmet listing only flags movies whose quality rank is
//! below the profile cutoff. A movie can meet that rank while its custom
//! format score still trails the profile's `cutoffFormatScore`; those movies
//! are found here by comparing scores client-side.
//!
//! Postcondition: no returned movie is flagged `qualityCutoffNotMet`, so the
//! output is disjoint from what `CutoffScanner` and `RandomSampler` return
//! for the same snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::config::DiscoveryConfig;
use crate::remote::{fetch, ApiRequest, LibraryItem, MovieFile, QualityProfile, RemoteClient, RemoteError};

use super::{DegradeCause, Discovery};

const PROFILE_ENDPOINT: &str = "qualityprofile";
const MOVIE_ENDPOINT: &str = "movie";
const MOVIE_FILE_ENDPOINT: &str = "moviefile";

/// A movie worth checking, with the score its profile requires.
#[derive(Debug)]
struct Candidate {
    movie: LibraryItem,
    target_score: i64,
}

/// Finds movies whose custom format score is below their profile threshold.
pub struct CfGapDetector {
    client: Arc<dyn RemoteClient>,
    concurrency: usize,
}

impl CfGapDetector {
    pub fn new(client: Arc<dyn RemoteClient>, config: &DiscoveryConfig) -> Self {
        Self {
            client,
            concurrency: config.detail_concurrency.max(1),
        }
    }

    /// Find CF score upgrade candidates.
    ///
    /// Costs one profile request, one movie listing request and one movie
    /// file request per candidate. A failed file lookup skips that movie
    /// only and is reported as a degradation cause.
    pub async fn detect_gaps(&self, monitored_only: bool) -> Discovery {
        debug!("Checking for movies eligible for custom format score upgrades");

        let profiles: Vec<QualityProfile> =
            match fetch(self.client.as_ref(), ApiRequest::get(PROFILE_ENDPOINT)).await {
                Ok(profiles) => profiles,
                Err(e) => {
                    error!(error = %e, "Failed to retrieve quality profiles");
                    return Discovery::failed(PROFILE_ENDPOINT, e);
                }
            };

        let thresholds = cf_thresholds(&profiles);
        if thresholds.is_empty() {
            debug!("No quality profiles gate on custom format score, skipping");
            return Discovery::Complete(Vec::new());
        }
        debug!(profiles = ?thresholds, "Profiles with cutoffFormatScore");

        let movies: Vec<LibraryItem> =
            match fetch(self.client.as_ref(), ApiRequest::get(MOVIE_ENDPOINT)).await {
                Ok(movies) => movies,
                Err(e) => {
                    error!(error = %e, "Failed to retrieve movies");
                    return Discovery::failed(MOVIE_ENDPOINT, e);
                }
            };

        let candidates = select_candidates(movies, &thresholds, monitored_only);
        debug!(
            candidates = candidates.len(),
            "Movies on CF profiles that meet quality cutoff"
        );
        if candidates.is_empty() {
            return Discovery::Complete(Vec::new());
        }

        let checked: Vec<(Candidate, Result<Option<MovieFile>, RemoteError>)> =
            stream::iter(candidates)
                .map(|candidate| async move {
                    let best = self.best_file(candidate.movie.id).await;
                    (candidate, best)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut upgrades = Vec::new();
        let mut causes = Vec::new();

        for (candidate, best) in checked {
            match best {
                Ok(Some(file)) if file.score() < candidate.target_score => {
                    debug!(
                        movie = %candidate.movie.label(),
                        quality = file.quality_name(),
                        score = file.score(),
                        target = candidate.target_score,
                        "CF upgrade candidate"
                    );
                    upgrades.push(candidate.movie);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        movie_id = candidate.movie.id,
                        error = %e,
                        "Failed to fetch movie file, skipping"
                    );
                    causes.push(DegradeCause::new(
                        format!("{}?movieId={}", MOVIE_FILE_ENDPOINT, candidate.movie.id),
                        e,
                    ));
                }
            }
        }

        debug_assert!(upgrades.iter().all(|m| !m.quality_cutoff_not_met()));

        info!(
            found = upgrades.len(),
            skipped = causes.len(),
            "Movies eligible for custom format score upgrades"
        );

        Discovery::from_parts(upgrades, causes)
    }

    /// Highest-scoring file of a movie, if it has any.
    async fn best_file(&self, movie_id: i64) -> Result<Option<MovieFile>, RemoteError> {
        let request = ApiRequest::get(MOVIE_FILE_ENDPOINT).param("movieId", movie_id);
        let files: Vec<MovieFile> = fetch(self.client.as_ref(), request).await?;
        Ok(files.into_iter().max_by_key(MovieFile::score))
    }
}

/// Map of profile id to `cutoffFormatScore` for CF-gated profiles.
fn cf_thresholds(profiles: &[QualityProfile]) -> HashMap<i64, i64> {
    profiles
        .iter()
        .filter(|p| p.is_cf_gated())
        .map(|p| (p.id, p.cutoff_format_score))
        .collect()
}

/// Movies that have a file on a CF-gated profile and are not already
/// flagged below cutoff by the remote.
fn select_candidates(
    movies: Vec<LibraryItem>,
    thresholds: &HashMap<i64, i64>,
    monitored_only: bool,
) -> Vec<Candidate> {
    movies
        .into_iter()
        .filter(|m| !monitored_only || m.monitored)
        .filter(|m| m.has_file)
        .filter(|m| matches!(&m.movie_file, Some(file) if file.id != 0))
        .filter(|m| !m.quality_cutoff_not_met())
        .filter_map(|movie| {
            thresholds
                .get(&movie.quality_profile_id)
                .map(|&target_score| Candidate {
                    movie,
                    target_score,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockRemoteClient};
    use serde_json::json;

    fn detector(client: &Arc<MockRemoteClient>, concurrency: usize) -> CfGapDetector {
        let config = DiscoveryConfig {
            detail_concurrency: concurrency,
            ..Default::default()
        };
        CfGapDetector::new(Arc::clone(client) as Arc<dyn RemoteClient>, &config)
    }

    /// Serve `moviefile?movieId=N` from a fixed map of scores.
    async fn serve_files(client: &MockRemoteClient, scores: Vec<(i64, Vec<Option<i64>>)>) {
        let scores: HashMap<i64, Vec<Option<i64>>> = scores.into_iter().collect();
        client
            .set_handler(MOVIE_FILE_ENDPOINT, move |request| {
                let movie_id: i64 = request
                    .query_param("movieId")
                    .and_then(|id| id.parse().ok())
                    .unwrap_or_default();
                let files: Vec<MovieFile> = scores
                    .get(&movie_id)
                    .map(|s| {
                        s.iter()
                            .enumerate()
                            .map(|(i, score)| fixtures::movie_file(movie_id * 10 + i as i64, *score))
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(fixtures::to_json(&files))
            })
            .await;
    }

    #[test]
    fn test_cf_thresholds_only_gated_profiles() {
        let profiles = vec![
            fixtures::profile(1, 10000, true),
            fixtures::profile(2, 0, true),
            fixtures::profile(3, 500, false),
            fixtures::profile(4, 200, true),
        ];
        let thresholds = cf_thresholds(&profiles);
        assert_eq!(thresholds.len(), 2);
        assert_eq!(thresholds.get(&1), Some(&10000));
        assert_eq!(thresholds.get(&4), Some(&200));
    }

    #[test]
    fn test_select_candidates_filters() {
        let thresholds: HashMap<i64, i64> = [(1, 100)].into();

        let mut flagged = fixtures::movie(3, "Flagged");
        if let Some(file) = flagged.movie_file.as_mut() {
            file.quality_cutoff_not_met = true;
        }
        let mut no_file_id = fixtures::movie(6, "No file id");
        if let Some(file) = no_file_id.movie_file.as_mut() {
            file.id = 0;
        }

        let movies = vec![
            fixtures::movie(1, "Eligible"),
            fixtures::unmonitored_movie(2, "Unmonitored"),
            flagged,
            fixtures::missing_movie(4, "Missing"),
            fixtures::movie_on_profile(5, "Other profile", 9),
            no_file_id,
        ];

        let monitored: Vec<i64> = select_candidates(movies.clone(), &thresholds, true)
            .into_iter()
            .map(|c| c.movie.id)
            .collect();
        assert_eq!(monitored, vec![1]);

        let all: Vec<i64> = select_candidates(movies, &thresholds, false)
            .into_iter()
            .map(|c| c.movie.id)
            .collect();
        assert_eq!(all, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_no_gated_profiles_short_circuits() {
        let client = Arc::new(MockRemoteClient::new());
        client
            .push_response(
                PROFILE_ENDPOINT,
                Ok(fixtures::to_json(&vec![
                    fixtures::profile(1, 0, true),
                    fixtures::profile(2, 10000, false),
                ])),
            )
            .await;

        let result = detector(&client, 1).detect_gaps(true).await;
        assert_eq!(result, Discovery::Complete(vec![]));
        assert_eq!(client.request_count(MOVIE_ENDPOINT).await, 0);
    }

    #[tokio::test]
    async fn test_detects_scores_below_threshold() {
        let client = Arc::new(MockRemoteClient::new());
        client
            .push_response(
                PROFILE_ENDPOINT,
                Ok(fixtures::to_json(&vec![fixtures::profile(1, 1000, true)])),
            )
            .await;
        client
            .push_response(
                MOVIE_ENDPOINT,
                Ok(fixtures::to_json(&vec![
                    fixtures::movie(1, "Below"),
                    fixtures::movie(2, "Meets"),
                    fixtures::movie(3, "Null score"),
                    fixtures::movie(4, "Best file wins"),
                    fixtures::movie(5, "No files"),
                ])),
            )
            .await;
        serve_files(
            &client,
            vec![
                (1, vec![Some(250)]),
                (2, vec![Some(1000)]),
                (3, vec![None]),
                (4, vec![Some(100), Some(1500)]),
            ],
        )
        .await;

        let result = detector(&client, 1).detect_gaps(false).await;
        assert!(!result.is_degraded());

        let mut ids: Vec<i64> = result.items().iter().map(|m| m.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(client.request_count(MOVIE_FILE_ENDPOINT).await, 5);
    }

    #[tokio::test]
    async fn test_candidate_failure_is_skipped_not_fatal() {
        let client = Arc::new(MockRemoteClient::new());
        client
            .push_response(
                PROFILE_ENDPOINT,
                Ok(fixtures::to_json(&vec![fixtures::profile(1, 1000, true)])),
            )
            .await;
        client
            .push_response(
                MOVIE_ENDPOINT,
                Ok(fixtures::to_json(&vec![
                    fixtures::movie(1, "Broken"),
                    fixtures::movie(2, "Fine"),
                ])),
            )
            .await;
        client
            .set_handler(MOVIE_FILE_ENDPOINT, |request| {
                match request.query_param("movieId") {
                    Some("1") => Err(RemoteError::Timeout),
                    _ => Ok(json!([{ "id": 20, "customFormatScore": 10 }])),
                }
            })
            .await;

        let result = detector(&client, 1).detect_gaps(false).await;
        assert!(result.is_degraded());
        assert_eq!(result.len(), 1);
        assert_eq!(result.items()[0].id, 2);
        assert_eq!(result.causes()[0].context, "moviefile?movieId=1");
    }

    #[tokio::test]
    async fn test_never_returns_flagged_movies() {
        let mut flagged = fixtures::movie(1, "Flagged");
        if let Some(file) = flagged.movie_file.as_mut() {
            file.quality_cutoff_not_met = true;
        }

        let client = Arc::new(MockRemoteClient::new());
        client
            .push_response(
                PROFILE_ENDPOINT,
                Ok(fixtures::to_json(&vec![fixtures::profile(1, 1000, true)])),
            )
            .await;
        client
            .push_response(
                MOVIE_ENDPOINT,
                Ok(fixtures::to_json(&vec![flagged, fixtures::movie(2, "Clean")])),
            )
            .await;
        serve_files(&client, vec![(1, vec![Some(0)]), (2, vec![Some(0)])]).await;

        let result = detector(&client, 1).detect_gaps(false).await;
        assert!(result.items().iter().all(|m| !m.quality_cutoff_not_met()));
        assert_eq!(result.len(), 1);
        assert_eq!(client.request_count(MOVIE_FILE_ENDPOINT).await, 1);
    }

    #[tokio::test]
    async fn test_profile_failure_degrades_without_movie_fetch() {
        let client = Arc::new(MockRemoteClient::new());
        client
            .push_response(
                PROFILE_ENDPOINT,
                Err(RemoteError::Transport("connection refused".into())),
            )
            .await;

        let result = detector(&client, 1).detect_gaps(false).await;
        assert!(result.is_degraded());
        assert!(result.is_empty());
        assert_eq!(client.request_count(MOVIE_ENDPOINT).await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_aggregate_without_duplicates() {
        let movies: Vec<LibraryItem> = (1..=30)
            .map(|i| fixtures::movie(i, &format!("Movie {}", i)))
            .collect();
        let client = Arc::new(MockRemoteClient::new());
        client
            .push_response(
                PROFILE_ENDPOINT,
                Ok(fixtures::to_json(&vec![fixtures::profile(1, 100, true)])),
            )
            .await;
        client
            .push_response(MOVIE_ENDPOINT, Ok(fixtures::to_json(&movies)))
            .await;
        serve_files(
            &client,
            (1..=30).map(|i| (i, vec![Some(i * 5)])).collect(),
        )
        .await;

        let result = detector(&client, 4).detect_gaps(false).await;

        // Scores 5..=95 are below 100; 100.. are not.
        let mut ids: Vec<i64> = result.items().iter().map(|m| m.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=19).collect::<Vec<_>>());
        assert_eq!(client.request_count(MOVIE_FILE_ENDPOINT).await, 30);
    }
}
