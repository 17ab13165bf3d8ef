//! Channel repository
//!
//! Maps channel ids to their reconcilers and fans submissions out to them.
//! Two lock levels: the map lock protects the channel table only and is
//! released before any message is applied; each channel's entry lock covers
//! that channel's state and buffer for the whole protocol execution. Lock
//! order is map before entry, never the reverse.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use types::envelope::RocketMessage;
use types::rocket::{RocketState, RocketSummary};

use crate::channel::{Reconciler, SubmitOutcome};
use crate::sort::{sort_summaries, SortOptions};
use crate::sync::{ContextMutex, LockError};

/// Engine policy knobs
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Maximum buffered out-of-order messages per channel.
    pub buffer_capacity: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 10_000,
        }
    }
}

type ChannelEntry = Arc<ContextMutex<Reconciler>>;

/// In-memory mapping from channel id to per-channel reconciler
pub struct Repository {
    channels: ContextMutex<HashMap<String, ChannelEntry>>,
    config: RepositoryConfig,
}

impl Repository {
    pub fn new(config: RepositoryConfig) -> Self {
        info!(
            buffer_capacity = config.buffer_capacity,
            "repository initialized"
        );
        Self {
            channels: ContextMutex::new(HashMap::new()),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RepositoryConfig::default())
    }

    /// Locate or create the entry for a channel.
    ///
    /// The map lock is held only for the lookup/insert and released before
    /// the caller touches the entry lock, keeping the hot map lock out of
    /// the application path.
    async fn find_or_create(&self, channel: &str) -> Result<ChannelEntry, LockError> {
        let mut channels = self.channels.lock().await?;
        if let Some(entry) = channels.get(channel) {
            return Ok(Arc::clone(entry));
        }

        debug!(channel, "creating channel entry");
        let entry: ChannelEntry = Arc::new(ContextMutex::new(Reconciler::new(
            channel,
            self.config.buffer_capacity,
        )));
        channels.insert(channel.to_string(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Submit a validated message to its channel.
    pub async fn submit(&self, msg: RocketMessage) -> Result<SubmitOutcome, LockError> {
        let entry = self.find_or_create(&msg.channel).await?;
        let mut reconciler = entry.lock().await?;
        Ok(reconciler.submit(msg))
    }

    /// Look up one rocket, returning an isolated copy of its state.
    pub async fn get(&self, id: &str) -> Result<Option<RocketState>, LockError> {
        let entry = {
            let channels = self.channels.lock().await?;
            channels.get(id).map(Arc::clone)
        };

        let Some(entry) = entry else {
            return Ok(None);
        };

        let reconciler = entry.lock().await?;
        Ok(Some(reconciler.state().clone()))
    }

    /// Snapshot every channel and return a sorted projection.
    ///
    /// Each entry is snapshotted under its own lock; entries sampled later
    /// may reflect later writes than entries sampled earlier. The sort is
    /// stable.
    pub async fn list(&self, options: SortOptions) -> Result<Vec<RocketSummary>, LockError> {
        let entries: Vec<ChannelEntry> = {
            let channels = self.channels.lock().await?;
            channels.values().map(Arc::clone).collect()
        };

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            let reconciler = entry.lock().await?;
            summaries.push(reconciler.summary());
        }

        sort_summaries(&mut summaries, options);
        Ok(summaries)
    }

    /// Number of channels seen so far.
    pub async fn channel_count(&self) -> Result<usize, LockError> {
        Ok(self.channels.lock().await?.len())
    }

    /// Shut the repository down: subsequent operations fail with
    /// `LockError::Cancelled`. In-flight holders finish undisturbed.
    pub fn close(&self) {
        info!("repository closed");
        self.channels.close();
    }
}
