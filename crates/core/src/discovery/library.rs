//! Whole-library lookups: missing movies and download queue size.

use std::sync::Arc;

use tracing::{debug, error};

use crate::remote::{fetch, ApiRequest, LibraryItem, Page, RemoteClient, RemoteError};

use super::Discovery;

const MOVIE_ENDPOINT: &str = "movie";
const QUEUE_ENDPOINT: &str = "queue";

/// Simple reads of the library that do not need pagination.
pub struct LibraryProbe {
    client: Arc<dyn RemoteClient>,
}

impl LibraryProbe {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    /// Movies without a downloaded file.
    pub async fn missing(&self, monitored_only: bool) -> Discovery {
        let movies: Vec<LibraryItem> =
            match fetch(self.client.as_ref(), ApiRequest::get(MOVIE_ENDPOINT)).await {
                Ok(movies) => movies,
                Err(e) => {
                    error!(error = %e, "Failed to retrieve movies");
                    return Discovery::failed(MOVIE_ENDPOINT, e);
                }
            };

        let missing: Vec<LibraryItem> = movies
            .into_iter()
            .filter(|m| !m.has_file && (!monitored_only || m.monitored))
            .collect();

        debug!(
            missing = missing.len(),
            monitored_only,
            "Found missing movies"
        );
        Discovery::Complete(missing)
    }

    /// Number of entries in the download queue.
    pub async fn queue_size(&self) -> Result<u64, RemoteError> {
        let request = ApiRequest::get(QUEUE_ENDPOINT)
            .param("page", 1)
            .param("pageSize", 1000);
        let page: Page<serde_json::Value> = fetch(self.client.as_ref(), request).await?;
        debug!(queue_size = page.total_records, "Radarr download queue size");
        Ok(page.total_records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockRemoteClient};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn probe(client: &Arc<MockRemoteClient>) -> LibraryProbe {
        LibraryProbe::new(Arc::clone(client) as Arc<dyn RemoteClient>)
    }

    #[tokio::test]
    async fn test_missing_filters_by_file_and_monitored() {
        let mut unmonitored_missing = fixtures::missing_movie(3, "Unmonitored missing");
        unmonitored_missing.monitored = false;

        let client = Arc::new(MockRemoteClient::new());
        client
            .set_handler(MOVIE_ENDPOINT, move |_| {
                Ok(fixtures::to_json(&vec![
                    fixtures::movie(1, "Downloaded"),
                    fixtures::missing_movie(2, "Missing"),
                    unmonitored_missing.clone(),
                ]))
            })
            .await;

        let monitored = probe(&client).missing(true).await;
        assert_eq!(monitored.len(), 1);
        assert_eq!(monitored.items()[0].id, 2);

        let all = probe(&client).missing(false).await;
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_failure_is_degraded() {
        let client = Arc::new(MockRemoteClient::new());
        let result = probe(&client).missing(true).await;
        assert!(result.is_degraded());
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_queue_size_reads_total_records() {
        let client = Arc::new(MockRemoteClient::new());
        client
            .push_response(
                QUEUE_ENDPOINT,
                Ok(json!({ "page": 1, "pageSize": 1000, "totalRecords": 7, "records": [] })),
            )
            .await;

        let size = assert_ok!(probe(&client).queue_size().await);
        assert_eq!(size, 7);

        let requests = client.requests_for(QUEUE_ENDPOINT).await;
        assert_eq!(requests[0].request.query_param("pageSize"), Some("1000"));
    }

    #[tokio::test]
    async fn test_queue_size_propagates_errors() {
        let client = Arc::new(MockRemoteClient::new());
        client
            .push_response(QUEUE_ENDPOINT, Err(RemoteError::Timeout))
            .await;

        let err = assert_err!(probe(&client).queue_size().await);
        assert_eq!(err, RemoteError::Timeout);
    }
}
