//! Stream manifest retrieval and representation selection.

use tracing::debug;

use crate::api::LiveApi;
use crate::error::AcfunError;
use crate::models::{Representation, SessionToken, StreamUrls, VideoPlayRes};
use crate::retry::{self, RetryPolicy};

/// Resolve the stream URL pair for a broadcaster using a negotiated session.
///
/// A non-success play result or an empty manifest yields empty URLs (the
/// stream is simply unavailable); decoding faults re-run the whole
/// resolution under the retry policy.
pub(crate) async fn resolve(
    api: &dyn LiveApi,
    retry: &RetryPolicy,
    token: &SessionToken,
    uid: u64,
) -> Result<StreamUrls, AcfunError> {
    retry::run(retry, "manifest resolution", || {
        resolve_once(api, token, uid)
    })
    .await
}

async fn resolve_once(
    api: &dyn LiveApi,
    token: &SessionToken,
    uid: u64,
) -> Result<StreamUrls, AcfunError> {
    let response = api.start_play(token, uid).await?;

    if response.result != 1 {
        debug!(uid, result = response.result, "stream unavailable");
        return Ok(StreamUrls::empty());
    }

    let data = response
        .data
        .ok_or_else(|| AcfunError::Protocol("start play response missing data".to_string()))?;

    // The manifest envelope is a JSON document carried inside a JSON string
    // field; it is decoded as an independent second stage.
    let manifest: VideoPlayRes = serde_json::from_str(&data.video_play_res)?;

    stream_urls_from_manifest(&manifest)
}

fn stream_urls_from_manifest(manifest: &VideoPlayRes) -> Result<StreamUrls, AcfunError> {
    let Some(adaptive) = manifest.live_adaptive_manifest.first() else {
        return Ok(StreamUrls::empty());
    };

    let Some(best) = best_representation(&adaptive.adaptation_set.representation) else {
        return Ok(StreamUrls::empty());
    };

    let hls = derive_hls_url(&best.url, &manifest.stream_name)?;
    Ok(StreamUrls {
        hls,
        flv: best.url.clone(),
    })
}

/// Pick the representation with the maximum bitrate. Ties resolve to the
/// first-encountered maximal entry, so selection is deterministic.
fn best_representation(representations: &[Representation]) -> Option<&Representation> {
    representations
        .iter()
        .reduce(|best, rep| if rep.bitrate > best.bitrate { rep } else { best })
}

/// Derive the HLS URL from the FLV URL.
///
/// CDN naming convention: everything before the stream name, with the
/// literal path segment `pull` replaced by `hlspull`, followed by the
/// stream name and `.m3u8`. Must be reproduced character for character for
/// playback compatibility.
fn derive_hls_url(flv_url: &str, stream_name: &str) -> Result<String, AcfunError> {
    if stream_name.is_empty() {
        return Err(AcfunError::Protocol(
            "manifest missing stream name".to_string(),
        ));
    }

    let index = flv_url.find(stream_name).ok_or_else(|| {
        AcfunError::Protocol(format!("stream name `{stream_name}` not found in flv url"))
    })?;

    let prefix = flv_url[..index].replace("pull", "hlspull");
    Ok(format!("{prefix}{stream_name}.m3u8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::api::testing::FakeApi;
    use crate::models::StartPlayResponse;

    fn representation(bitrate: i64, url: &str) -> Representation {
        Representation {
            bitrate,
            url: url.to_string(),
        }
    }

    fn token() -> SessionToken {
        SessionToken {
            user_id: 3837271,
            service_token: "ChFhY2Z1bg".to_string(),
            device_id: "web_861001".to_string(),
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::with_max_attempts(2, Duration::from_millis(1))
    }

    #[test]
    fn selects_maximum_bitrate() {
        let reps = [
            representation(100, "a"),
            representation(500, "b"),
            representation(300, "c"),
        ];
        assert_eq!(best_representation(&reps).unwrap().url, "b");
    }

    #[test]
    fn bitrate_ties_resolve_to_first_encountered() {
        let reps = [
            representation(500, "first"),
            representation(500, "second"),
            representation(200, "third"),
        ];
        assert_eq!(best_representation(&reps).unwrap().url, "first");
    }

    #[test]
    fn empty_representation_list_selects_nothing() {
        assert!(best_representation(&[]).is_none());
    }

    #[test]
    fn derives_hls_url_per_cdn_convention() {
        let hls = derive_hls_url(
            "https://edgepull.example.com/streamName123?auth=1",
            "streamName123",
        )
        .unwrap();
        assert_eq!(hls, "https://edgehlspull.example.com/streamName123.m3u8");
    }

    #[test]
    fn stream_name_absent_from_flv_url_is_a_fault() {
        let result = derive_hls_url("https://edgepull.example.com/other.flv", "streamName123");
        assert!(matches!(result, Err(AcfunError::Protocol(_))));
    }

    #[test]
    fn two_stage_decode_of_start_play_body() {
        let outer = r#"{
            "result": 1,
            "data": {
                "videoPlayRes": "{\"streamName\":\"sn1\",\"liveAdaptiveManifest\":[{\"adaptationSet\":{\"representation\":[{\"bitrate\":100,\"url\":\"https://pull.example.com/live/sn1.flv?auth=1\"}]}}]}"
            }
        }"#;
        let response: StartPlayResponse = serde_json::from_str(outer).unwrap();
        let manifest: VideoPlayRes =
            serde_json::from_str(&response.data.unwrap().video_play_res).unwrap();

        let urls = stream_urls_from_manifest(&manifest).unwrap();
        assert_eq!(urls.flv, "https://pull.example.com/live/sn1.flv?auth=1");
        assert_eq!(urls.hls, "https://hlspull.example.com/live/sn1.m3u8");
    }

    #[tokio::test]
    async fn non_success_play_result_yields_empty_urls() {
        let mut api = FakeApi::default();
        api.play = Some(StartPlayResponse {
            result: 0,
            data: None,
        });

        let urls = resolve(&api, &policy(), &token(), 23512).await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn empty_manifest_yields_empty_urls() {
        let inner = serde_json::json!({
            "streamName": "sn1",
            "liveAdaptiveManifest": [{"adaptationSet": {"representation": []}}]
        })
        .to_string();
        let mut api = FakeApi::default();
        api.play = Some(StartPlayResponse {
            result: 1,
            data: Some(crate::models::StartPlayData {
                video_play_res: inner,
            }),
        });

        let urls = resolve(&api, &policy(), &token(), 23512).await.unwrap();
        assert!(urls.is_empty());
    }
}
