//! Paginated scan of the live channel listing.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::api::LiveApi;
use crate::cache::LiveRoomCache;
use crate::error::AcfunError;
use crate::models::LiveRoom;
use crate::retry::{self, RetryPolicy};

/// Cursor value signalling the end of the listing.
pub const CURSOR_SENTINEL: &str = "no_more";

const FIRST_CURSOR: &str = "0";

/// Walks the channel listing page by page and publishes the result as one
/// atomic snapshot.
pub struct DirectoryFetcher {
    api: Arc<dyn LiveApi>,
    cache: Arc<LiveRoomCache>,
    retry: RetryPolicy,
}

impl DirectoryFetcher {
    pub fn new(api: Arc<dyn LiveApi>, cache: Arc<LiveRoomCache>, retry: RetryPolicy) -> Self {
        Self { api, cache, retry }
    }

    /// Rebuild the live directory from a full paginated scan.
    ///
    /// Pages accumulate into a private scratch map; the published snapshot
    /// is only touched once the scan has reached the sentinel cursor, so
    /// readers never see a half-built directory. A failing page restarts
    /// only that page's fetch; pages already folded in are retained.
    ///
    /// An upstream error page yields an empty cursor, which re-enters the
    /// listing from the start on the next iteration (the upstream treats an
    /// empty cursor as the first page).
    pub async fn refresh(&self) -> Result<(), AcfunError> {
        let mut rooms: FxHashMap<u64, LiveRoom> = FxHashMap::default();
        let mut cursor = FIRST_CURSOR.to_string();

        while cursor != CURSOR_SENTINEL {
            let page = retry::run(&self.retry, "channel page fetch", || {
                self.api.channel_page(&cursor)
            })
            .await?;

            for (uid, room) in page.rooms {
                rooms.insert(uid, room);
            }
            cursor = page.cursor;
        }

        debug!(rooms = rooms.len(), "publishing live directory snapshot");
        self.cache.replace(rooms);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::api::testing::FakeApi;
    use crate::models::ChannelPage;

    fn page(rooms: &[(u64, &str, &str)], cursor: &str) -> ChannelPage {
        ChannelPage {
            rooms: rooms
                .iter()
                .map(|(uid, name, title)| {
                    (
                        *uid,
                        LiveRoom {
                            name: name.to_string(),
                            title: title.to_string(),
                        },
                    )
                })
                .collect(),
            cursor: cursor.to_string(),
        }
    }

    fn fetcher(api: FakeApi) -> (DirectoryFetcher, Arc<LiveRoomCache>) {
        let cache = Arc::new(LiveRoomCache::new());
        let retry = RetryPolicy::with_max_attempts(5, Duration::from_millis(1));
        (
            DirectoryFetcher::new(Arc::new(api), Arc::clone(&cache), retry),
            cache,
        )
    }

    #[tokio::test]
    async fn unions_all_pages_until_sentinel() {
        let mut api = FakeApi::default();
        api.pages
            .insert("0".into(), page(&[(1, "a", "t1"), (2, "b", "t2")], "10"));
        api.pages
            .insert("10".into(), page(&[(3, "c", "t3")], "20"));
        api.pages
            .insert("20".into(), page(&[(4, "d", "t4")], CURSOR_SENTINEL));

        let (fetcher, cache) = fetcher(api);
        fetcher.refresh().await.unwrap();

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 4);
        for uid in 1..=4 {
            assert!(snapshot.contains_key(&uid), "missing uid {uid}");
        }
        assert_eq!(snapshot[&3].name, "c");
    }

    #[tokio::test]
    async fn duplicate_uid_across_pages_is_not_duplicated() {
        let mut api = FakeApi::default();
        api.pages
            .insert("0".into(), page(&[(1, "a", "old title")], "10"));
        api.pages
            .insert("10".into(), page(&[(1, "a", "new title")], CURSOR_SENTINEL));

        let (fetcher, cache) = fetcher(api);
        fetcher.refresh().await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().title, "new title");
    }

    #[tokio::test]
    async fn page_failure_retries_only_that_page_and_keeps_accumulated_entries() {
        let mut api = FakeApi::default();
        api.pages.insert("0".into(), page(&[(1, "a", "t1")], "10"));
        api.pages
            .insert("10".into(), page(&[(2, "b", "t2")], CURSOR_SENTINEL));
        api.page_failures.lock().insert("10".into(), 2);

        let (fetcher, cache) = fetcher(api);
        fetcher.refresh().await.unwrap();

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key(&1));
        assert!(snapshot.contains_key(&2));
    }

    #[tokio::test]
    async fn upstream_error_page_reenters_listing_from_empty_cursor() {
        // An error page lowers to an empty page with an empty cursor; the
        // upstream serves the first page again for an empty cursor.
        let mut api = FakeApi::default();
        api.pages.insert("0".into(), ChannelPage::default());
        api.pages
            .insert(String::new(), page(&[(7, "g", "t7")], CURSOR_SENTINEL));

        let (fetcher, cache) = fetcher(api);
        fetcher.refresh().await.unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(7));
    }

    #[tokio::test]
    async fn refreshing_twice_with_unchanged_upstream_is_idempotent() {
        let mut api = FakeApi::default();
        api.pages
            .insert("0".into(), page(&[(1, "a", "t1"), (2, "b", "t2")], "10"));
        api.pages
            .insert("10".into(), page(&[(3, "c", "t3")], CURSOR_SENTINEL));

        let (fetcher, cache) = fetcher(api);
        fetcher.refresh().await.unwrap();
        let first = cache.snapshot();
        fetcher.refresh().await.unwrap();
        let second = cache.snapshot();

        assert_eq!(*first, *second);
    }

    #[tokio::test]
    async fn empty_listing_publishes_empty_snapshot() {
        let mut api = FakeApi::default();
        api.pages.insert("0".into(), page(&[], CURSOR_SENTINEL));

        let (fetcher, cache) = fetcher(api);
        // Seed with stale content to prove it is fully replaced.
        let mut stale = FxHashMap::default();
        stale.insert(
            9,
            LiveRoom {
                name: "stale".to_string(),
                title: "stale".to_string(),
            },
        );
        cache.replace(stale);

        fetcher.refresh().await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn exhausted_page_retries_surface_the_error() {
        let api = FakeApi::default(); // no fixtures: every fetch fails
        let calls = Arc::new(api);
        let cache = Arc::new(LiveRoomCache::new());
        let fetcher = DirectoryFetcher::new(
            Arc::clone(&calls) as Arc<dyn LiveApi>,
            Arc::clone(&cache),
            RetryPolicy::with_max_attempts(3, Duration::from_millis(1)),
        );

        assert!(fetcher.refresh().await.is_err());
        assert_eq!(calls.page_calls.load(Ordering::Relaxed), 3);
        assert!(cache.is_empty());
    }
}
