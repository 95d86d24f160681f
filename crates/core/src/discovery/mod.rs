//! Upgrade discovery.
//!
//! Finds library items that should be searched for a better release:
//! - `CutoffScanner` walks the remote cutoff-unmet listing page by page
//! - `RandomSampler` draws a few items from one random page of that listing
//! - `CfGapDetector` finds items whose custom format score trails their
//!   profile's threshold even though the remote considers the cutoff met
//! - `LibraryProbe` covers missing movies and the download queue size
//!
//! Every pass returns a [`Discovery`], which keeps "nothing found" apart from
//! "found this much before the remote stopped cooperating".

mod cf_gap;
mod library;
mod retry;
mod sampler;
mod scanner;

pub use cf_gap::CfGapDetector;
pub use library::LibraryProbe;
pub use retry::RetryPolicy;
pub use sampler::RandomSampler;
pub use scanner::CutoffScanner;

use std::collections::HashSet;

use tracing::warn;

use crate::remote::{LibraryItem, RemoteError};

/// Remote path of the cutoff-unmet listing.
pub(crate) const CUTOFF_ENDPOINT: &str = "wanted/cutoff";

/// A failure that cut a discovery pass short.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradeCause {
    /// What was being fetched (e.g. "wanted/cutoff page 3").
    pub context: String,
    /// The error that ended the attempt.
    pub error: RemoteError,
}

impl DegradeCause {
    pub fn new(context: impl Into<String>, error: RemoteError) -> Self {
        Self {
            context: context.into(),
            error,
        }
    }
}

/// Result of a discovery pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    /// The pass ran to completion.
    Complete(Vec<LibraryItem>),
    /// The pass hit remote failures; `items` is whatever was gathered.
    Degraded {
        items: Vec<LibraryItem>,
        causes: Vec<DegradeCause>,
    },
}

impl Discovery {
    /// Build a result, degraded iff any cause was recorded.
    pub fn from_parts(items: Vec<LibraryItem>, causes: Vec<DegradeCause>) -> Self {
        if causes.is_empty() {
            Discovery::Complete(items)
        } else {
            Discovery::Degraded { items, causes }
        }
    }

    /// A degraded result carrying nothing but one cause.
    pub fn failed(context: impl Into<String>, error: RemoteError) -> Self {
        Discovery::Degraded {
            items: Vec::new(),
            causes: vec![DegradeCause::new(context, error)],
        }
    }

    pub fn items(&self) -> &[LibraryItem] {
        match self {
            Discovery::Complete(items) => items,
            Discovery::Degraded { items, .. } => items,
        }
    }

    pub fn into_items(self) -> Vec<LibraryItem> {
        match self {
            Discovery::Complete(items) => items,
            Discovery::Degraded { items, .. } => items,
        }
    }

    pub fn causes(&self) -> &[DegradeCause] {
        match self {
            Discovery::Complete(_) => &[],
            Discovery::Degraded { causes, .. } => causes,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Discovery::Degraded { .. })
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Union with another pass; see [`union_candidates`].
    pub fn merge(self, other: Discovery) -> Discovery {
        let (items, mut causes) = self.into_parts();
        let (other_items, other_causes) = other.into_parts();
        causes.extend(other_causes);
        Discovery::from_parts(union_candidates(items, other_items), causes)
    }

    fn into_parts(self) -> (Vec<LibraryItem>, Vec<DegradeCause>) {
        match self {
            Discovery::Complete(items) => (items, Vec::new()),
            Discovery::Degraded { items, causes } => (items, causes),
        }
    }
}

/// Union the cutoff-unmet candidates with the CF gap candidates.
///
/// The two sets are disjoint when produced by `CutoffScanner`/`RandomSampler`
/// and `CfGapDetector` from the same snapshot: the detector drops every item
/// the remote flags `qualityCutoffNotMet`. Items present in both (e.g. from
/// snapshots taken at different times) are kept once, first occurrence wins.
pub fn union_candidates(primary: Vec<LibraryItem>, secondary: Vec<LibraryItem>) -> Vec<LibraryItem> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(primary.len() + secondary.len());
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());

    for item in primary.into_iter().chain(secondary) {
        if seen.insert(item.id) {
            merged.push(item);
        } else {
            warn!(movie_id = item.id, "Candidate reported by more than one detector");
        }
    }

    merged
}

/// Keep only monitored items.
pub(crate) fn retain_monitored(items: &mut Vec<LibraryItem>) {
    items.retain(|item| item.monitored);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_from_parts_without_causes_is_complete() {
        let discovery = Discovery::from_parts(vec![fixtures::movie(1, "A")], vec![]);
        assert!(!discovery.is_degraded());
        assert_eq!(discovery.len(), 1);
        assert!(discovery.causes().is_empty());
    }

    #[test]
    fn test_failed_is_degraded_and_empty() {
        let discovery = Discovery::failed("movie", RemoteError::Timeout);
        assert!(discovery.is_degraded());
        assert!(discovery.is_empty());
        assert_eq!(discovery.causes()[0].context, "movie");
        assert_eq!(discovery.causes()[0].error, RemoteError::Timeout);
    }

    #[test]
    fn test_union_candidates_deduplicates_by_id() {
        let primary = vec![fixtures::movie(1, "A"), fixtures::movie(2, "B")];
        let secondary = vec![fixtures::movie(2, "B"), fixtures::movie(3, "C")];

        let merged = union_candidates(primary, secondary);
        let ids: Vec<i64> = merged.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_combines_causes() {
        let complete = Discovery::Complete(vec![fixtures::movie(1, "A")]);
        let degraded = Discovery::from_parts(
            vec![fixtures::movie(2, "B")],
            vec![DegradeCause::new("moviefile?movieId=9", RemoteError::EmptyBody)],
        );

        let merged = complete.merge(degraded);
        assert!(merged.is_degraded());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.causes().len(), 1);
    }

    #[test]
    fn test_retain_monitored() {
        let mut items = vec![
            fixtures::movie(1, "A"),
            fixtures::unmonitored_movie(2, "B"),
        ];
        retain_monitored(&mut items);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 1);
    }
}
