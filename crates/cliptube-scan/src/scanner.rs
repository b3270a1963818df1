use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use cliptube_core::models::{VideoId, VIDEO_ID_LEN};

/// Scheme, optional single subdomain label, then one of the host forms.
/// Group 1 is the host form; the id search starts right after it.
static RE_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:[0-9a-z-]+\.)?(youtu\.be/|youtube(?:-nocookie)?\.com)")
        .expect("host pattern is valid")
});

/// A located id and the byte offset where its URL (id plus query remainder) ends.
struct Found {
    id: VideoId,
    end: usize,
}

/// Collect all distinct video ids mentioned in `text`.
///
/// Recognizes `youtu.be/<id>` and `youtube.com` / `youtube-nocookie.com`
/// URLs with the id anywhere in the path or query. Links that are already
/// part of an HTML anchor (inside a start tag or as the anchor's text) are
/// skipped.
pub fn find_video_ids(text: &str) -> BTreeSet<VideoId> {
    let mut ids = BTreeSet::new();
    let mut pos = 0;

    while let Some(caps) = RE_HOST.captures_at(text, pos) {
        let Some(form) = caps.get(1) else { break };
        let is_short = form.as_str().eq_ignore_ascii_case("youtu.be/");
        let found = if is_short {
            accept_at(text, form.end())
        } else {
            scan_long_form(text, form.end())
        };

        match found {
            Some(found) => {
                tracing::trace!(id = %found.id, "Video id found");
                ids.insert(found.id);
                pos = found.end;
            }
            None => pos = form.end(),
        }
    }

    ids
}

/// Whether `text` mentions at least one video id.
pub fn has_video_ids(text: &str) -> bool {
    !find_video_ids(text).is_empty()
}

/// Walk the non-whitespace run after a `youtube.com` host and try every id
/// position that follows a non-id, non-space character.
fn scan_long_form(text: &str, start: usize) -> Option<Found> {
    for (offset, c) in text[start..].char_indices() {
        if c.is_whitespace() {
            break;
        }
        if is_id_char(c) {
            continue;
        }
        if let Some(found) = accept_at(text, start + offset + c.len_utf8()) {
            return Some(found);
        }
    }
    None
}

/// Accept an id starting exactly at `start`: a run of exactly 11 id
/// characters that is not part of a pre-linked URL.
fn accept_at(text: &str, start: usize) -> Option<Found> {
    let rest = &text[start..];
    let run_end = rest
        .char_indices()
        .find(|(_, c)| !is_id_char(*c))
        .map_or(rest.len(), |(i, _)| i);
    if rest[..run_end].chars().count() != VIDEO_ID_LEN {
        return None;
    }
    let id = VideoId::parse(&rest[..run_end]).ok()?;

    let id_end = start + run_end;
    let remainder_end = id_end + query_remainder_len(&text[id_end..]);
    if is_prelinked(&text[remainder_end..]) {
        return None;
    }

    Some(Found {
        id,
        end: remainder_end,
    })
}

/// Length of the URL (query) remainder `[?=&+%\w.-]*` at the start of `s`.
fn query_remainder_len(s: &str) -> usize {
    s.char_indices()
        .find(|(_, c)| !(is_word_char(*c) || matches!(c, '?' | '=' | '&' | '+' | '%' | '.' | '-')))
        .map_or(s.len(), |(i, _)| i)
}

/// Text right after a URL shows it is already a hyperlink: either we are
/// inside a start tag attribute (`"...>`) or inside anchor text (`</a>`).
fn is_prelinked(after_url: &str) -> bool {
    if let Some(quoted) = after_url
        .strip_prefix('"')
        .or_else(|| after_url.strip_prefix('\''))
    {
        if let Some(i) = quoted.find(['<', '>']) {
            if quoted[i..].starts_with('>') {
                return true;
            }
        }
    }
    after_url
        .get(..4)
        .is_some_and(|tag| tag.eq_ignore_ascii_case("</a>"))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_id_char(c: char) -> bool {
    is_word_char(c) || c == '-'
}
