use serde::{Deserialize, Serialize};

/// A currently-live broadcast, keyed externally by the broadcaster uid.
/// Records are immutable once built into a directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveRoom {
    /// Broadcaster display name.
    pub name: String,
    /// Current broadcast title.
    pub title: String,
}

/// Identity pair for a broadcaster. The name is resolved from the profile
/// endpoint once per query and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streamer {
    pub uid: u64,
    pub name: String,
}

/// Anonymous visitor credential authorizing a single manifest retrieval.
/// Derived fresh per resolution call, never persisted or reused.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub user_id: i64,
    pub service_token: String,
    pub device_id: String,
}

/// Resolved stream address pair. Both fields empty means the stream is
/// unavailable, which is an expected outcome rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamUrls {
    pub hls: String,
    pub flv: String,
}

impl StreamUrls {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hls.is_empty() && self.flv.is_empty()
    }
}

/// One page of the channel-list API, already lowered to domain terms.
#[derive(Debug, Clone, Default)]
pub struct ChannelPage {
    pub rooms: Vec<(u64, LiveRoom)>,
    pub cursor: String,
}

impl ChannelPage {
    /// Lower a decoded channel-list envelope into a page.
    ///
    /// A non-zero result code means the upstream served an error page; it
    /// surfaces as an empty page with an empty (non-sentinel) cursor, so the
    /// pagination loop re-enters the listing from the start.
    pub(crate) fn from_envelope(envelope: ChannelListEnvelope) -> Self {
        let data = envelope.channel_list_data;
        if data.result != 0 {
            return Self::default();
        }

        let rooms = data
            .live_list
            .into_iter()
            .map(|entry| {
                (
                    entry.author_id,
                    LiveRoom {
                        name: entry.user.name,
                        title: entry.title,
                    },
                )
            })
            .collect();

        Self {
            rooms,
            cursor: data.pcursor,
        }
    }
}

// Wire models below mirror the upstream JSON verbatim; field names are the
// upstream's camelCase ones.

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelListEnvelope {
    #[serde(rename = "channelListData")]
    pub channel_list_data: ChannelListData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelListData {
    pub result: i32,
    #[serde(rename = "liveList", default)]
    pub live_list: Vec<LiveListEntry>,
    #[serde(default)]
    pub pcursor: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveListEntry {
    #[serde(rename = "authorId")]
    pub author_id: u64,
    pub user: LiveListUser,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveListUser {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfileResponse {
    pub result: i32,
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitorLoginResponse {
    pub result: i32,
    #[serde(rename = "userId", default)]
    pub user_id: i64,
    #[serde(rename = "acfun.api.visitor_st", default)]
    pub visitor_st: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartPlayResponse {
    pub result: i32,
    pub data: Option<StartPlayData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartPlayData {
    /// A JSON document encoded as a string; decoded in a second stage into
    /// [`VideoPlayRes`].
    #[serde(rename = "videoPlayRes")]
    pub video_play_res: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoPlayRes {
    #[serde(rename = "streamName", default)]
    pub stream_name: String,
    #[serde(rename = "liveAdaptiveManifest", default)]
    pub live_adaptive_manifest: Vec<LiveAdaptiveManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveAdaptiveManifest {
    #[serde(rename = "adaptationSet")]
    pub adaptation_set: AdaptationSet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdaptationSet {
    #[serde(default)]
    pub representation: Vec<Representation>,
}

/// One encoding offered in a stream manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Representation {
    #[serde(default)]
    pub bitrate: i64,
    #[serde(default)]
    pub url: String,
}
