//! Stream format preference.
//!
//! Only muxed (audio+video) progressive streams and HLS manifests are
//! accepted, since the player is handed a single URL.

use url::Url;

use super::types::StreamingData;
use crate::traits::{StreamKind, StreamSource};

/// MP4, H.264 720p, AAC 192 kbit.
pub const ITAG_MP4_720P: u32 = 22;
/// MP4, H.264 360p, AAC 96 kbit.
pub const ITAG_MP4_360P: u32 = 18;
/// 3GP, MPEG-4 Visual 240p, AAC 32 kbit.
pub const ITAG_3GP_240P: u32 = 36;

/// A format the selector may choose, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preferred {
    Itag(u32),
    Hls,
}

pub const PREFERRED_FORMATS: &[Preferred] = &[
    Preferred::Itag(ITAG_MP4_720P),
    Preferred::Itag(ITAG_MP4_360P),
    Preferred::Hls,
    Preferred::Itag(ITAG_3GP_240P),
];

/// Pick the most preferred stream available in `data`.
///
/// Formats without a direct URL, or with an unparseable one, are skipped.
pub fn select_stream(data: &StreamingData) -> Option<StreamSource> {
    PREFERRED_FORMATS.iter().find_map(|preferred| match preferred {
        Preferred::Itag(itag) => data
            .formats
            .iter()
            .find(|f| f.itag == *itag)
            .and_then(|f| f.url.as_deref())
            .and_then(|raw| Url::parse(raw).ok())
            .map(|url| StreamSource {
                url,
                kind: StreamKind::Progressive { itag: *itag },
            }),
        Preferred::Hls => data
            .hls_manifest_url
            .as_deref()
            .and_then(|raw| Url::parse(raw).ok())
            .map(|url| StreamSource {
                url,
                kind: StreamKind::Hls,
            }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::types::Format;

    fn format(itag: u32, url: Option<&str>) -> Format {
        Format {
            itag,
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_prefers_720p() {
        let data = StreamingData {
            formats: vec![
                format(18, Some("https://r1.example/360")),
                format(22, Some("https://r1.example/720")),
            ],
            ..Default::default()
        };
        let stream = select_stream(&data).unwrap();
        assert_eq!(stream.kind, StreamKind::Progressive { itag: 22 });
        assert_eq!(stream.url.as_str(), "https://r1.example/720");
    }

    #[test]
    fn test_hls_before_240p() {
        let data = StreamingData {
            formats: vec![format(36, Some("https://r1.example/240"))],
            hls_manifest_url: Some("https://manifest.example/live.m3u8".into()),
        };
        assert_eq!(select_stream(&data).unwrap().kind, StreamKind::Hls);
    }

    #[test]
    fn test_skips_ciphered_formats() {
        let data = StreamingData {
            formats: vec![
                format(22, None),
                format(18, Some("https://r1.example/360")),
            ],
            ..Default::default()
        };
        assert_eq!(
            select_stream(&data).unwrap().kind,
            StreamKind::Progressive { itag: 18 }
        );
    }

    #[test]
    fn test_unlisted_itags_are_unsupported() {
        let data = StreamingData {
            formats: vec![format(137, Some("https://r1.example/1080-video"))],
            ..Default::default()
        };
        assert!(select_stream(&data).is_none());
        assert!(select_stream(&StreamingData::default()).is_none());
    }
}
