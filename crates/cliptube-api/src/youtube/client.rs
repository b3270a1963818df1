use reqwest::Client;

use cliptube_core::models::VideoId;

use super::error::YouTubeError;
use super::formats::select_stream;
use super::types::{ClientInfo, PlayerRequest, PlayerResponse, RequestContext};
use crate::traits::{ResolvedVideo, VideoResolver};

const BASE_URL: &str = "https://www.youtube.com/youtubei/v1";

// The Android client receives unciphered progressive stream URLs.
const CLIENT_NAME: &str = "ANDROID";
const CLIENT_NAME_ID: &str = "3";
const CLIENT_VERSION: &str = "19.09.37";
const ANDROID_SDK_VERSION: u32 = 30;
const USER_AGENT: &str = "com.google.android.youtube/19.09.37 (Linux; U; Android 11) gzip";

/// InnerTube player client.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    base_url: String,
}

impl Default for YouTubeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YouTubeClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at another InnerTube-compatible endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, YouTubeError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(YouTubeError::Api {
                status,
                message: body,
            })
        }
    }

    /// Fetch the raw player response for a video.
    pub async fn player(&self, id: &VideoId) -> Result<PlayerResponse, YouTubeError> {
        let request = PlayerRequest {
            video_id: id.as_str(),
            context: RequestContext {
                client: ClientInfo {
                    client_name: CLIENT_NAME,
                    client_version: CLIENT_VERSION,
                    android_sdk_version: ANDROID_SDK_VERSION,
                    hl: "en",
                    gl: "US",
                },
            },
            content_check_ok: true,
            racy_check_ok: true,
        };

        let resp = self
            .http
            .post(format!("{}/player", self.base_url))
            .query(&[("prettyPrint", "false")])
            .header("User-Agent", USER_AGENT)
            .header("X-YouTube-Client-Name", CLIENT_NAME_ID)
            .header("X-YouTube-Client-Version", CLIENT_VERSION)
            .json(&request)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| YouTubeError::Parse(e.to_string()))
    }
}

impl VideoResolver for YouTubeClient {
    type Error = YouTubeError;

    #[tracing::instrument(name = "resolve", skip(self), fields(id = %id))]
    async fn resolve(&self, id: &VideoId) -> Result<ResolvedVideo, YouTubeError> {
        let response = self.player(id).await?;
        let resolved = into_resolved(id, response)?;
        tracing::debug!(title = %resolved.title, stream = %resolved.stream.kind, "Video resolved");
        Ok(resolved)
    }
}

/// Turn a player response into a playable video, enforcing playability and
/// the stream preference order.
pub fn into_resolved(id: &VideoId, response: PlayerResponse) -> Result<ResolvedVideo, YouTubeError> {
    let status = response.playability_status;
    if status.status != "OK" {
        return Err(YouTubeError::Unplayable {
            reason: status.reason.unwrap_or_else(|| "no reason given".into()),
            status: status.status,
        });
    }

    let details = response
        .video_details
        .ok_or_else(|| YouTubeError::Parse("missing videoDetails".into()))?;
    if details.video_id != id.as_str() {
        return Err(YouTubeError::Parse(format!(
            "asked for {id}, got {}",
            details.video_id
        )));
    }

    let stream = response
        .streaming_data
        .as_ref()
        .and_then(select_stream)
        .ok_or(YouTubeError::NoSupportedStream)?;

    Ok(ResolvedVideo {
        id: id.clone(),
        title: details.title,
        author: details.author,
        length_seconds: details
            .length_seconds
            .as_deref()
            .and_then(|s| s.parse().ok())
            .filter(|_| !details.is_live),
        stream,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StreamKind;

    fn id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    fn parse(json: serde_json::Value) -> PlayerResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_playable_response() {
        let response = parse(serde_json::json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": {
                "videoId": "dQw4w9WgXcQ",
                "title": "Never Gonna Give You Up",
                "author": "Rick Astley",
                "lengthSeconds": "213",
                "isLive": false
            },
            "streamingData": {
                "formats": [
                    { "itag": 18, "url": "https://rr1.googlevideo.com/videoplayback?itag=18", "mimeType": "video/mp4" }
                ],
                "adaptiveFormats": [
                    { "itag": 137, "url": "https://rr1.googlevideo.com/videoplayback?itag=137" }
                ]
            }
        }));

        let video = into_resolved(&id(), response).unwrap();
        assert_eq!(video.title, "Never Gonna Give You Up");
        assert_eq!(video.author.as_deref(), Some("Rick Astley"));
        assert_eq!(video.length_seconds, Some(213));
        assert_eq!(video.stream.kind, StreamKind::Progressive { itag: 18 });
    }

    #[test]
    fn test_unplayable_response() {
        let response = parse(serde_json::json!({
            "playabilityStatus": { "status": "LOGIN_REQUIRED", "reason": "Sign in to confirm your age" }
        }));
        match into_resolved(&id(), response) {
            Err(YouTubeError::Unplayable { status, reason }) => {
                assert_eq!(status, "LOGIN_REQUIRED");
                assert_eq!(reason, "Sign in to confirm your age");
            }
            other => panic!("Expected Unplayable, got {other:?}"),
        }
    }

    #[test]
    fn test_live_uses_hls() {
        let response = parse(serde_json::json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": {
                "videoId": "dQw4w9WgXcQ",
                "title": "Live now",
                "lengthSeconds": "0",
                "isLive": true
            },
            "streamingData": {
                "hlsManifestUrl": "https://manifest.googlevideo.com/api/manifest/hls_variant/x.m3u8"
            }
        }));
        let video = into_resolved(&id(), response).unwrap();
        assert_eq!(video.stream.kind, StreamKind::Hls);
        assert_eq!(video.length_seconds, None);
    }

    #[test]
    fn test_no_streams() {
        let response = parse(serde_json::json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": { "videoId": "dQw4w9WgXcQ", "title": "t" }
        }));
        assert!(matches!(
            into_resolved(&id(), response),
            Err(YouTubeError::NoSupportedStream)
        ));
    }

    #[test]
    fn test_mismatched_id() {
        let response = parse(serde_json::json!({
            "playabilityStatus": { "status": "OK" },
            "videoDetails": { "videoId": "9bZkp7q19f0", "title": "other" }
        }));
        assert!(matches!(
            into_resolved(&id(), response),
            Err(YouTubeError::Parse(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let request = PlayerRequest {
            video_id: "dQw4w9WgXcQ",
            context: RequestContext {
                client: ClientInfo {
                    client_name: CLIENT_NAME,
                    client_version: CLIENT_VERSION,
                    android_sdk_version: ANDROID_SDK_VERSION,
                    hl: "en",
                    gl: "US",
                },
            },
            content_check_ok: true,
            racy_check_ok: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["videoId"], "dQw4w9WgXcQ");
        assert_eq!(json["context"]["client"]["clientName"], "ANDROID");
        assert_eq!(json["context"]["client"]["androidSdkVersion"], 30);
        assert_eq!(json["contentCheckOk"], true);
    }
}
