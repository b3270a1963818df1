use serde::{Deserialize, Serialize};

// ── Request ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest<'a> {
    pub video_id: &'a str,
    pub context: RequestContext<'a>,
    pub content_check_ok: bool,
    pub racy_check_ok: bool,
}

#[derive(Debug, Serialize)]
pub struct RequestContext<'a> {
    pub client: ClientInfo<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo<'a> {
    pub client_name: &'a str,
    pub client_version: &'a str,
    pub android_sdk_version: u32,
    pub hl: &'a str,
    pub gl: &'a str,
}

// ── Response ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub playability_status: PlayabilityStatus,
    pub video_details: Option<VideoDetails>,
    pub streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
pub struct PlayabilityStatus {
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub author: Option<String>,
    /// Seconds, encoded as a decimal string.
    pub length_seconds: Option<String>,
    #[serde(default)]
    pub is_live: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    #[serde(default)]
    pub formats: Vec<Format>,
    pub hls_manifest_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    pub itag: u32,
    /// Absent when the stream URL is ciphered.
    pub url: Option<String>,
}
