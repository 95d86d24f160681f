//! Wire types of the remote API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A movie as reported by the remote library.
///
/// Only the fields the engine reads are typed; everything else is kept in
/// `extra` so the record round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub quality_profile_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_file: Option<MovieFile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LibraryItem {
    /// Whether the remote already flags this item's file as below cutoff.
    pub fn quality_cutoff_not_met(&self) -> bool {
        self.movie_file
            .as_ref()
            .map(|f| f.quality_cutoff_not_met)
            .unwrap_or(false)
    }

    /// Display label used in log lines.
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// A downloaded file attached to a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFile {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub custom_format_score: Option<i64>,
    #[serde(default)]
    pub quality_cutoff_not_met: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityWrapper>,
}

impl MovieFile {
    /// Custom format score, with a missing score counted as 0.
    pub fn score(&self) -> i64 {
        self.custom_format_score.unwrap_or(0)
    }

    /// Name of the file's quality, if reported.
    pub fn quality_name(&self) -> &str {
        self.quality
            .as_ref()
            .and_then(|q| q.quality.as_ref())
            .map(|q| q.name.as_str())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityWrapper {
    #[serde(default)]
    pub quality: Option<Quality>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quality {
    #[serde(default)]
    pub name: String,
}

/// A quality profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProfile {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Minimum custom format score; 0 means unused.
    #[serde(default)]
    pub cutoff_format_score: i64,
    #[serde(default)]
    pub upgrade_allowed: bool,
}

impl QualityProfile {
    /// A profile also gates on custom format score when it has a positive
    /// threshold and allows upgrades.
    pub fn is_cf_gated(&self) -> bool {
        self.cutoff_format_score > 0 && self.upgrade_allowed
    }
}

/// One page of a paged listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

/// State of a remote command.
///
/// Only `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandState {
    Queued,
    Started,
    Completed,
    Failed,
}

impl CommandState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandState::Completed | CommandState::Failed)
    }
}

impl FromStr for CommandState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queued" => Ok(CommandState::Queued),
            "started" => Ok(CommandState::Started),
            "completed" => Ok(CommandState::Completed),
            "failed" => Ok(CommandState::Failed),
            other => Err(format!("unknown command state: {}", other)),
        }
    }
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandState::Queued => "queued",
            CommandState::Started => "started",
            CommandState::Completed => "completed",
            CommandState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Identifier the remote assigns to a submitted command.
pub type CommandId = i64;

/// Response to a command submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandResource {
    #[serde(default)]
    pub id: Option<CommandId>,
}

/// Status of a previously submitted command.
///
/// `state` is kept as the raw string so values outside the known set decode
/// cleanly; see [`CommandStatus::state`].
#[derive(Debug, Clone, Deserialize)]
pub struct CommandStatus {
    #[serde(default)]
    pub id: Option<CommandId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "state")]
    pub raw_state: Option<String>,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended: Option<DateTime<Utc>>,
}

impl CommandStatus {
    /// Parsed state; `None` when the state is absent or unrecognised.
    pub fn state(&self) -> Option<CommandState> {
        self.raw_state.as_deref().and_then(|s| s.parse().ok())
    }
}
