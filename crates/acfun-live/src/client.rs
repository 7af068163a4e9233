//! Query facade composing the directory, identity, session, and manifest
//! layers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::{HttpApi, LiveApi};
use crate::cache::{DirectorySnapshot, LiveRoomCache};
use crate::config::AcfunConfig;
use crate::directory::DirectoryFetcher;
use crate::error::AcfunError;
use crate::models::{StreamUrls, Streamer};
use crate::retry::RetryPolicy;
use crate::{identity, manifest, session};

/// Client for the AcFun live platform.
///
/// Directory refresh and per-broadcaster resolution are independent paths:
/// refresh writes the cache through its atomic replace, resolutions only
/// read it, so any number of them may run concurrently.
pub struct AcfunLive {
    api: Arc<dyn LiveApi>,
    cache: Arc<LiveRoomCache>,
    retry: RetryPolicy,
}

impl AcfunLive {
    pub fn new(config: AcfunConfig) -> Self {
        let retry = config.retry.clone();
        Self::with_api(Arc::new(HttpApi::new(&config)), retry)
    }

    /// Build the client on an injected transport.
    pub fn with_api(api: Arc<dyn LiveApi>, retry: RetryPolicy) -> Self {
        Self {
            api,
            cache: Arc::new(LiveRoomCache::new()),
            retry,
        }
    }

    /// Rebuild the live directory from a full paginated scan and publish it
    /// atomically.
    pub async fn refresh_directory(&self) -> Result<(), AcfunError> {
        self.fetcher().refresh().await
    }

    /// Whether the broadcaster is live as of the last directory scan.
    pub fn is_live(&self, uid: u64) -> bool {
        self.cache.contains(uid)
    }

    /// Current broadcast title, empty if the broadcaster is not live.
    pub fn current_title(&self, uid: u64) -> String {
        self.cache
            .get(uid)
            .map(|room| room.title)
            .unwrap_or_default()
    }

    /// Snapshot of all currently-live rooms.
    pub fn live_rooms(&self) -> DirectorySnapshot {
        self.cache.snapshot()
    }

    /// Resolve a broadcaster's identity. `None` means no such user.
    pub async fn resolve_streamer(&self, uid: u64) -> Result<Option<Streamer>, AcfunError> {
        let name = identity::resolve_name(self.api.as_ref(), &self.retry, uid).await?;
        if name.is_empty() {
            return Ok(None);
        }
        Ok(Some(Streamer { uid, name }))
    }

    /// Resolve the HLS/FLV stream URL pair for a broadcaster.
    ///
    /// Unknown users and offline broadcasters short-circuit to an empty
    /// pair without negotiating a session. An empty pair can also mean the
    /// manifest step found no playable stream.
    pub async fn resolve_stream_urls(&self, uid: u64) -> Result<StreamUrls, AcfunError> {
        let Some(streamer) = self.resolve_streamer(uid).await? else {
            debug!(uid, "unknown user");
            return Ok(StreamUrls::empty());
        };

        if !self.is_live(streamer.uid) {
            debug!(uid, name = %streamer.name, "not currently live");
            return Ok(StreamUrls::empty());
        }

        let Some(token) = session::negotiate(self.api.as_ref(), &self.retry, uid).await? else {
            return Ok(StreamUrls::empty());
        };

        manifest::resolve(self.api.as_ref(), &self.retry, &token, uid).await
    }

    /// Spawn a background task refreshing the directory at a fixed
    /// interval. Dropping the handle does not stop the task; abort it to do
    /// so.
    pub fn spawn_refresh_task(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let fetcher = self.fetcher();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(err) = fetcher.refresh().await {
                    warn!(error = %err, "directory refresh failed");
                }
            }
        })
    }

    fn fetcher(&self) -> DirectoryFetcher {
        DirectoryFetcher::new(
            Arc::clone(&self.api),
            Arc::clone(&self.cache),
            self.retry.clone(),
        )
    }
}
