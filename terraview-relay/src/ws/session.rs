//! Per-connection poll-and-push lifecycle
//!
//! A session moves through `Initializing -> Active -> Closed`. Initialization
//! fetches the viewer set and delivers the initial snapshot directly to the
//! owning connection; the active phase is a cancellable poll task that
//! publishes fresh readings through the hub to every open connection.

use std::sync::Arc;
use std::time::Duration;

use terraview_core::models::{AccountId, Terrarium};
use terraview_core::upstream::ReadingSource;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::hub::{ConnectionId, ReadingHub};

/// One viewer connection's poll-and-push lifecycle
pub struct ConnectionSession {
    connection_id: ConnectionId,
    account_id: AccountId,
    source: Arc<dyn ReadingSource>,
    hub: Arc<ReadingHub>,
    poll_interval: Duration,
    viewer_set: Vec<Terrarium>,
    cancel: CancellationToken,
}

impl ConnectionSession {
    pub fn new(
        connection_id: ConnectionId,
        account_id: AccountId,
        source: Arc<dyn ReadingSource>,
        hub: Arc<ReadingHub>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            connection_id,
            account_id,
            source,
            hub,
            poll_interval,
            viewer_set: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Fetch the viewer set and deliver initial readings to this connection
    /// only (never broadcast).
    ///
    /// The session becomes active regardless of how much of the snapshot was
    /// available: an empty viewer set just makes every tick a no-op.
    pub async fn initialize(&mut self) {
        self.viewer_set = self.source.fetch_viewer_terrariums(self.account_id).await;

        info!(
            connection_id = %self.connection_id,
            account_id = %self.account_id,
            terrariums = self.viewer_set.len(),
            "Session initializing"
        );

        for terrarium in &self.viewer_set {
            let Some(reading) = self.source.fetch_latest_reading(terrarium.id).await else {
                debug!(
                    connection_id = %self.connection_id,
                    terrarium_id = %terrarium.id,
                    "No initial reading available"
                );
                continue;
            };

            if let Err(e) = self.hub.send_to(&self.connection_id, &reading) {
                warn!(
                    connection_id = %self.connection_id,
                    error = %e,
                    "Failed to deliver initial reading, connection is gone"
                );
                return;
            }
        }
    }

    /// Spawn the recurring poll task.
    ///
    /// Ticks for one session never overlap (the task runs them sequentially),
    /// and no tick starts once `close` has been called. A tick already in
    /// flight is allowed to finish; its publish may still reach other open
    /// connections.
    pub fn spawn_poll_task(&self) -> JoinHandle<()> {
        let cancel = self.cancel.clone();
        let source = Arc::clone(&self.source);
        let hub = Arc::clone(&self.hub);
        let viewer_set = self.viewer_set.clone();
        let connection_id = self.connection_id.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial snapshot
            // already covered it.
            interval.tick().await;

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        debug!(connection_id = %connection_id, "Poll task cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        poll_once(source.as_ref(), &hub, &viewer_set, &connection_id).await;
                    }
                }
            }
        })
    }

    /// Transition to `Closed`: cancel the poll task and deregister from the
    /// hub. Calling this on an already-closed session is a no-op.
    pub fn close(&self) {
        self.cancel.cancel();
        self.hub.deregister(&self.connection_id);
    }

    /// Terrariums tracked by this session's account
    #[must_use]
    pub fn viewer_set(&self) -> &[Terrarium] {
        &self.viewer_set
    }
}

/// Run a single poll tick: fetch the latest reading for every terrarium in
/// the viewer set and publish each one found to all open connections.
/// A fetch that comes back empty for one terrarium never aborts the tick.
async fn poll_once(
    source: &dyn ReadingSource,
    hub: &ReadingHub,
    viewer_set: &[Terrarium],
    connection_id: &str,
) {
    for terrarium in viewer_set {
        match source.fetch_latest_reading(terrarium.id).await {
            Some(reading) => {
                let sent = hub.publish(&reading);
                debug!(
                    connection_id = %connection_id,
                    terrarium_id = %terrarium.id,
                    sent,
                    "Published polled reading"
                );
            }
            None => {
                debug!(
                    connection_id = %connection_id,
                    terrarium_id = %terrarium.id,
                    "No reading this cycle"
                );
            }
        }
    }
}
