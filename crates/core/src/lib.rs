//! Quality upgrade discovery for Radarr-style media libraries.
//!
//! Finds movies that should be searched for a better release and drives the
//! remote search command to completion.

pub mod command;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod remote;
pub mod testing;

pub use command::{CommandError, CommandOutcome, CommandPoller};
pub use config::{
    load_config, load_config_from_str, validate_config, CommandConfig, Config, ConfigError,
    DiscoveryConfig, RadarrConfig, SanitizedConfig,
};
pub use discovery::{
    union_candidates, CfGapDetector, CutoffScanner, DegradeCause, Discovery, LibraryProbe,
    RandomSampler, RetryPolicy,
};
pub use engine::UpgradeEngine;
pub use remote::{
    ApiRequest, CommandId, CommandState, LibraryItem, Method, MovieFile, QualityProfile,
    RadarrClient, RemoteClient, RemoteError,
};
