//! Remote search commands.
//!
//! `CommandPoller` submits a `MoviesSearch` command and polls it until it
//! reaches a terminal state or the attempt budget runs out:
//!
//! ```text
//! submitted -> queued / started -> completed | failed
//! ```
//!
//! Running out of attempts is reported as `TimedOut`, separate from
//! `Failed`: the remote may still finish the command later.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::CommandConfig;
use crate::remote::{
    fetch, ApiRequest, CommandId, CommandResource, CommandState, CommandStatus, RemoteClient,
    RemoteError,
};

const COMMAND_ENDPOINT: &str = "command";
const SEARCH_COMMAND: &str = "MoviesSearch";

/// Errors that can occur when submitting a command.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    /// No item ids were given.
    #[error("no movie ids provided for search")]
    EmptySelection,

    /// The submission request failed.
    #[error("command submission failed: {0}")]
    Remote(#[from] RemoteError),

    /// The remote accepted the request but returned no command id.
    #[error("command submission returned no id")]
    MissingId,
}

/// How a polled command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    Failed,
    TimedOut,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Completed)
    }
}

/// Submits search commands and waits for them.
pub struct CommandPoller {
    client: Arc<dyn RemoteClient>,
    delay: Duration,
    max_attempts: u32,
}

impl CommandPoller {
    pub fn new(client: Arc<dyn RemoteClient>, config: &CommandConfig) -> Self {
        Self {
            client,
            delay: config.poll_delay(),
            max_attempts: config.poll_max_attempts,
        }
    }

    /// Trigger a search for the given movies.
    pub async fn submit(&self, movie_ids: &[i64]) -> Result<CommandId, CommandError> {
        if movie_ids.is_empty() {
            warn!("No movie IDs provided for search");
            return Err(CommandError::EmptySelection);
        }

        let body = json!({ "name": SEARCH_COMMAND, "movieIds": movie_ids });
        let resource: CommandResource =
            fetch(self.client.as_ref(), ApiRequest::post(COMMAND_ENDPOINT, body))
                .await
                .map_err(|e| {
                    error!(?movie_ids, error = %e, "Failed to trigger search command");
                    e
                })?;

        match resource.id {
            Some(id) => {
                debug!(?movie_ids, command_id = id, "Triggered search");
                Ok(id)
            }
            None => {
                error!(?movie_ids, "Search command response carried no id");
                Err(CommandError::MissingId)
            }
        }
    }

    /// Poll with the configured delay and attempt budget.
    pub async fn wait(&self, command_id: CommandId) -> CommandOutcome {
        self.await_command(command_id, self.delay, self.max_attempts)
            .await
    }

    /// Poll `command/<id>` up to `max_attempts` times, `delay` apart.
    ///
    /// A failed status request counts as a non-terminal attempt.
    pub async fn await_command(
        &self,
        command_id: CommandId,
        delay: Duration,
        max_attempts: u32,
    ) -> CommandOutcome {
        let path = format!("{}/{}", COMMAND_ENDPOINT, command_id);

        for attempt in 1..=max_attempts {
            match fetch::<CommandStatus>(self.client.as_ref(), ApiRequest::get(&path)).await {
                Ok(status) => match status.state() {
                    Some(CommandState::Completed) => {
                        debug!(command_id, attempt, "Command completed");
                        return CommandOutcome::Completed;
                    }
                    Some(CommandState::Failed) => {
                        error!(command_id, "Command failed");
                        return CommandOutcome::Failed;
                    }
                    Some(state) => {
                        debug!(command_id, attempt, %state, "Command still running");
                    }
                    None => {
                        debug!(
                            command_id,
                            attempt,
                            state = ?status.raw_state,
                            "Unrecognised command state, still polling"
                        );
                    }
                },
                Err(e) => {
                    warn!(command_id, attempt, error = %e, "Failed to poll command status");
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        warn!(command_id, max_attempts, "Timed out waiting for command to complete");
        CommandOutcome::TimedOut
    }
}
