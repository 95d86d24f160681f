//! Full scan of the cutoff-unmet listing.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::DiscoveryConfig;
use crate::remote::{fetch, ApiRequest, LibraryItem, Page, RemoteClient, RemoteError};

use super::retry::RetryPolicy;
use super::{retain_monitored, DegradeCause, Discovery, CUTOFF_ENDPOINT};

/// Walks `wanted/cutoff` page by page.
///
/// Pages are sorted by title so a retried page returns the same records.
/// A page that still fails after its retries ends the scan; pages already
/// fetched are returned in a [`Discovery::Degraded`].
pub struct CutoffScanner {
    client: Arc<dyn RemoteClient>,
    page_size: u32,
    retry: RetryPolicy,
}

impl CutoffScanner {
    pub fn new(client: Arc<dyn RemoteClient>, config: &DiscoveryConfig) -> Self {
        Self {
            client,
            page_size: config.scan_page_size.max(1),
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch every cutoff-unmet movie.
    ///
    /// The monitored filter runs once over the accumulated records, after
    /// pagination has finished.
    pub async fn scan(&self, monitored_only: bool) -> Discovery {
        debug!(monitored_only, "Starting cutoff unmet scan");

        let mut page = 1u32;
        let mut items: Vec<LibraryItem> = Vec::new();
        let mut causes = Vec::new();

        loop {
            let fetched = match self.fetch_page(page).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    causes.push(DegradeCause::new(
                        format!("{} page {}", CUTOFF_ENDPOINT, page),
                        e,
                    ));
                    break;
                }
            };

            if page == 1 {
                info!(
                    total_records = fetched.total_records,
                    "Radarr reports cutoff unmet movies"
                );
            }

            let received = fetched.records.len();
            debug!(page, received, "Parsed cutoff unmet page");

            if received == 0 {
                debug!(page, "Empty page, stopping pagination");
                break;
            }

            items.extend(fetched.records);

            if received < self.page_size as usize {
                debug!(
                    page,
                    received,
                    page_size = self.page_size,
                    "Short page, last page reached"
                );
                break;
            }

            page += 1;
        }

        info!(
            fetched = items.len(),
            pages = page,
            degraded = !causes.is_empty(),
            "Cutoff unmet scan finished"
        );

        if monitored_only {
            let before = items.len();
            retain_monitored(&mut items);
            debug!(
                remaining = items.len(),
                total = before,
                "Filtered cutoff unmet movies to monitored"
            );
        }

        Discovery::from_parts(items, causes)
    }

    async fn fetch_page(&self, page: u32) -> Result<Page<LibraryItem>, RemoteError> {
        let label = format!("{} page {}", CUTOFF_ENDPOINT, page);
        self.retry
            .run(&label, || {
                let request = ApiRequest::get(CUTOFF_ENDPOINT)
                    .param("page", page)
                    .param("pageSize", self.page_size)
                    .param("sortKey", "title")
                    .param("sortDir", "asc");
                debug!(page, "Requesting cutoff unmet page");
                fetch(self.client.as_ref(), request)
            })
            .await
    }
}
