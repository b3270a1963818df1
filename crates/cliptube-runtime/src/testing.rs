//! In-memory resolver, player and clipboard for session and runtime tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use cliptube_api::{ResolvedVideo, StreamKind, StreamSource, VideoResolver};
use cliptube_core::history::HistoryEntry;
use cliptube_core::{VideoId, WindowId};
use cliptube_detect::{ClipboardError, ClipboardSource};

use crate::player::{Player, PlayerError};
use crate::session::WindowCloser;

pub fn vid(c: char) -> VideoId {
    VideoId::parse(&c.to_string().repeat(11)).unwrap()
}

pub fn entry_ids(entries: &[HistoryEntry]) -> Vec<VideoId> {
    entries.iter().map(|e| e.id.clone()).collect()
}

#[derive(Debug, thiserror::Error)]
#[error("no such video: {0}")]
pub struct FakeError(String);

/// Resolves every id to a fixed stream, counting calls. Optionally fails
/// for one id or holds each resolution until released.
#[derive(Clone, Default)]
pub struct FakeResolver {
    calls: Arc<AtomicUsize>,
    failing: Option<VideoId>,
    gate: Option<Arc<Notify>>,
}

impl FakeResolver {
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    pub fn failing_for(id: VideoId) -> Self {
        Self {
            failing: Some(id),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VideoResolver for FakeResolver {
    type Error = FakeError;

    async fn resolve(&self, id: &VideoId) -> Result<ResolvedVideo, FakeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.failing.as_ref() == Some(id) {
            return Err(FakeError(id.to_string()));
        }
        Ok(ResolvedVideo {
            id: id.clone(),
            title: format!("Title {id}"),
            author: Some("Uploader".into()),
            length_seconds: Some(60),
            stream: StreamSource {
                url: url::Url::parse(&format!("https://stream.test/{id}.mp4")).unwrap(),
                kind: StreamKind::Progressive { itag: 18 },
            },
        })
    }
}

#[derive(Default)]
struct PlayerState {
    opened: Vec<VideoId>,
    volumes: Vec<f32>,
    focused: Vec<WindowId>,
    closed: Vec<WindowId>,
    closers: HashMap<WindowId, WindowCloser>,
}

/// Records calls; windows stay open until the test or the session closes them.
#[derive(Clone, Default)]
pub struct FakePlayer {
    state: Arc<Mutex<PlayerState>>,
    broken: bool,
}

impl FakePlayer {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// Simulate the user closing a window.
    pub fn user_closes(&self, window: WindowId) {
        let closer = self.state.lock().unwrap().closers.remove(&window);
        if let Some(closer) = closer {
            closer.notify();
        }
    }

    pub fn opened(&self) -> Vec<VideoId> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.state.lock().unwrap().volumes.clone()
    }

    pub fn focused(&self) -> Vec<WindowId> {
        self.state.lock().unwrap().focused.clone()
    }

    pub fn closed(&self) -> Vec<WindowId> {
        self.state.lock().unwrap().closed.clone()
    }
}

impl Player for FakePlayer {
    fn open(
        &mut self,
        window: WindowId,
        video: &ResolvedVideo,
        volume: f32,
        on_close: WindowCloser,
    ) -> Result<(), PlayerError> {
        if self.broken {
            return Err(PlayerError::Spawn {
                command: "fake".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        let mut state = self.state.lock().unwrap();
        state.opened.push(video.id.clone());
        state.volumes.push(volume);
        state.closers.insert(window, on_close);
        Ok(())
    }

    fn focus(&mut self, window: WindowId) {
        self.state.lock().unwrap().focused.push(window);
    }

    fn close(&mut self, window: WindowId) {
        let closer = {
            let mut state = self.state.lock().unwrap();
            state.closed.push(window);
            state.closers.remove(&window)
        };
        if let Some(closer) = closer {
            closer.notify();
        }
    }
}

/// Shared in-memory clipboard. Every clone sees the same contents.
#[derive(Clone, Default)]
pub struct FakeClipboard {
    state: Arc<Mutex<(u64, Option<String>)>>,
}

impl FakeClipboard {
    pub fn copy(&self, text: &str) {
        let mut state = self.state.lock().unwrap();
        state.0 += 1;
        state.1 = Some(text.to_string());
    }

    pub fn contents(&self) -> Option<String> {
        self.state.lock().unwrap().1.clone()
    }
}

impl ClipboardSource for FakeClipboard {
    fn change_count(&mut self) -> u64 {
        self.state.lock().unwrap().0
    }

    fn text(&mut self) -> Option<String> {
        self.contents()
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.copy(text);
        Ok(())
    }
}
