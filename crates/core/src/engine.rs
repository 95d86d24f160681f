//! Discovery engine wiring.
//!
//! `UpgradeEngine` builds every discovery component over one shared
//! `RemoteClient` and exposes the caller-facing steps of a discovery cycle:
//! gather candidates, then search a selection and wait for the command.

use std::sync::Arc;

use tracing::{info, warn};

use crate::command::{CommandError, CommandOutcome, CommandPoller};
use crate::config::{Config, DiscoveryConfig};
use crate::discovery::{CfGapDetector, CutoffScanner, Discovery, LibraryProbe, RandomSampler};
use crate::remote::{LibraryItem, RemoteClient};

/// All discovery components over one shared client.
pub struct UpgradeEngine {
    scanner: CutoffScanner,
    sampler: RandomSampler,
    cf_gaps: CfGapDetector,
    library: LibraryProbe,
    poller: CommandPoller,
    discovery: DiscoveryConfig,
}

impl UpgradeEngine {
    pub fn new(client: Arc<dyn RemoteClient>, config: &Config) -> Self {
        Self {
            scanner: CutoffScanner::new(Arc::clone(&client), &config.discovery),
            sampler: RandomSampler::new(Arc::clone(&client), &config.discovery),
            cf_gaps: CfGapDetector::new(Arc::clone(&client), &config.discovery),
            library: LibraryProbe::new(Arc::clone(&client)),
            poller: CommandPoller::new(client, &config.command),
            discovery: config.discovery.clone(),
        }
    }

    pub fn scanner(&self) -> &CutoffScanner {
        &self.scanner
    }

    pub fn sampler(&self) -> &RandomSampler {
        &self.sampler
    }

    pub fn cf_gaps(&self) -> &CfGapDetector {
        &self.cf_gaps
    }

    pub fn library(&self) -> &LibraryProbe {
        &self.library
    }

    pub fn poller(&self) -> &CommandPoller {
        &self.poller
    }

    /// Cutoff-unmet candidates unioned with CF gap candidates.
    ///
    /// Uses the random sampler when `random_selection` is set, the full
    /// scan otherwise.
    pub async fn discover(&self) -> Discovery {
        let monitored_only = self.discovery.monitored_only;

        let cutoff = if self.discovery.random_selection {
            self.sampler
                .sample(monitored_only, self.discovery.random_sample_count)
                .await
        } else {
            self.scanner.scan(monitored_only).await
        };
        let cf = self.cf_gaps.detect_gaps(monitored_only).await;

        info!(
            cutoff_unmet = cutoff.len(),
            cf_gaps = cf.len(),
            "Upgrade candidates gathered"
        );

        let merged = cutoff.merge(cf);
        for cause in merged.causes() {
            warn!(context = %cause.context, error = %cause.error, "Discovery degraded");
        }
        merged
    }

    /// Search the given items and wait for the command to settle.
    pub async fn search(&self, items: &[LibraryItem]) -> Result<CommandOutcome, CommandError> {
        let ids: Vec<i64> = items.iter().map(|m| m.id).collect();
        let command_id = self.poller.submit(&ids).await?;
        Ok(self.poller.wait(command_id).await)
    }
}
