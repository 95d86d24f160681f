//! Random-page sampling of the cutoff-unmet listing.
//!
//! For very large libraries a full scan is wasted work when only a handful
//! of items will be searched per run. The sampler reads the total once,
//! fetches a single random page and draws from it; repeated runs spread
//! coverage over the whole listing.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, error, info};

use crate::config::DiscoveryConfig;
use crate::remote::{fetch, ApiRequest, LibraryItem, Page, RemoteClient};

use super::{retain_monitored, Discovery, CUTOFF_ENDPOINT};

/// Best-effort random selection of cutoff-unmet items.
pub struct RandomSampler {
    client: Arc<dyn RemoteClient>,
    page_size: u32,
}

impl RandomSampler {
    pub fn new(client: Arc<dyn RemoteClient>, config: &DiscoveryConfig) -> Self {
        Self {
            client,
            page_size: config.sample_page_size.max(1),
        }
    }

    /// Return at most `count` random cutoff-unmet items.
    ///
    /// Fewer are returned when the chosen page holds fewer (after the
    /// monitored filter). Failures never propagate: they produce an empty
    /// [`Discovery::Degraded`].
    pub async fn sample(&self, monitored_only: bool, count: usize) -> Discovery {
        let probe = ApiRequest::get(CUTOFF_ENDPOINT)
            .param("page", 1)
            .param("pageSize", 1);
        let total_records = match fetch::<Page<LibraryItem>>(self.client.as_ref(), probe).await {
            Ok(page) => page.total_records,
            Err(e) => {
                error!(error = %e, "Failed to probe cutoff unmet total");
                return Discovery::failed(format!("{} probe", CUTOFF_ENDPOINT), e);
            }
        };

        if total_records == 0 {
            info!("No cutoff unmet movies found in Radarr");
            return Discovery::Complete(Vec::new());
        }

        let total_pages = total_pages(total_records, self.page_size);
        info!(total_records, total_pages, "Found cutoff unmet movies");

        let page = rand::rng().random_range(1..=total_pages);
        info!(page, total_pages, "Selected random page for upgrade selection");

        let request = ApiRequest::get(CUTOFF_ENDPOINT)
            .param("page", page)
            .param("pageSize", self.page_size);
        let mut records = match fetch::<Page<LibraryItem>>(self.client.as_ref(), request).await {
            Ok(fetched) => fetched.records,
            Err(e) => {
                error!(page, error = %e, "Failed to fetch random cutoff unmet page");
                return Discovery::failed(format!("{} page {}", CUTOFF_ENDPOINT, page), e);
            }
        };
        info!(page, received = records.len(), "Retrieved random page");

        if monitored_only {
            retain_monitored(&mut records);
            debug!(remaining = records.len(), "Filtered to monitored movies");
        }

        if records.len() > count {
            let selected = choose(&records, count);
            debug!(selected = selected.len(), page, "Randomly selected movies");
            Discovery::Complete(selected)
        } else {
            debug!(
                returned = records.len(),
                requested = count,
                page,
                "Returning whole page"
            );
            Discovery::Complete(records)
        }
    }
}

/// Number of pages needed for `total_records` at `page_size` per page.
fn total_pages(total_records: u64, page_size: u32) -> u64 {
    total_records.div_ceil(page_size.max(1) as u64)
}

/// Uniform random subset of exactly `count` items, without replacement.
fn choose(records: &[LibraryItem], count: usize) -> Vec<LibraryItem> {
    records
        .choose_multiple(&mut rand::rng(), count)
        .cloned()
        .collect()
}
