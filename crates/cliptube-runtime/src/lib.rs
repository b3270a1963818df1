mod player;
mod session;
mod watch;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, RwLock};

use cliptube_api::{VideoResolver, YouTubeClient};
use cliptube_core::config::{AppConfig, ConfigObserver};
use cliptube_core::history::HistoryEntry;
use cliptube_core::notify::Notification;
use cliptube_core::persist::HistoryFile;
use cliptube_core::{History, VideoId};
use cliptube_detect::{ClipboardError, ClipboardSource, SystemClipboard};
use cliptube_scan::{find_video_ids, has_video_ids};

pub use player::{MpvPlayer, Player, PlayerError};
pub use session::{
    OpenOutcome, SessionEvent, SessionEvents, SessionHandle, SessionSetup, WindowCloser,
};
pub use watch::ClipboardFactory;

use watch::WatchControl;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),
    #[error("session is no longer running")]
    SessionClosed,
    #[error("not open: {0}")]
    NotOpen(VideoId),
    #[error("clipboard task failed: {0}")]
    ClipboardTask(#[from] tokio::task::JoinError),
}

/// Everything a [`Runtime`] is assembled from.
pub struct RuntimeParts<R, P> {
    pub resolver: R,
    pub player: P,
    pub config: AppConfig,
    /// Where config updates are saved; `None` keeps them in memory.
    pub config_path: Option<PathBuf>,
    pub history_file: Option<HistoryFile>,
    pub clipboard: ClipboardFactory,
}

/// The application: session actor, clipboard watcher and settings.
pub struct Runtime {
    session: SessionHandle,
    config: Arc<RwLock<AppConfig>>,
    config_path: Option<PathBuf>,
    clipboard: Arc<Mutex<Box<dyn ClipboardSource>>>,
    watch: tokio::sync::Mutex<WatchControl>,
}

impl Runtime {
    /// Load config and history from their default locations and start with
    /// the YouTube resolver, the configured player and the system clipboard.
    pub fn new() -> Result<(Self, SessionEvents), RuntimeError> {
        let config = AppConfig::load().map_err(|e| RuntimeError::Config(e.to_string()))?;
        let player = MpvPlayer::new(config.player.command.clone());
        Ok(Self::start(RuntimeParts {
            resolver: YouTubeClient::new(),
            player,
            config,
            config_path: Some(AppConfig::config_path()),
            history_file: Some(HistoryFile::new(AppConfig::history_path())),
            clipboard: Arc::new(|| Box::new(SystemClipboard::new()) as Box<dyn ClipboardSource>),
        }))
    }

    /// Start from explicit parts. Must be called within a tokio runtime.
    pub fn start<R, P>(parts: RuntimeParts<R, P>) -> (Self, SessionEvents)
    where
        R: VideoResolver + 'static,
        P: Player,
    {
        let config = parts.config;
        let history = match &parts.history_file {
            Some(file) => file.load(config.history.size),
            None => History::new(config.history.size),
        };
        let (session, events) = SessionHandle::spawn(
            Arc::new(parts.resolver),
            parts.player,
            SessionSetup {
                history,
                history_file: parts.history_file,
                volume: config.player.volume,
            },
        );

        let (clip_tx, clip_rx) = mpsc::unbounded_channel();
        tokio::spawn(watch::forward_clipboard(clip_rx, session.clone()));
        let mut watch = WatchControl::new(Arc::clone(&parts.clipboard), clip_tx);
        watch.apply(&config);

        tracing::info!(
            history = config.history.size,
            watching = config.general.watch_clipboard,
            "Runtime started"
        );

        let runtime = Self {
            session,
            config: Arc::new(RwLock::new(config)),
            config_path: parts.config_path,
            clipboard: Arc::new(Mutex::new((parts.clipboard)())),
            watch: tokio::sync::Mutex::new(watch),
        };
        (runtime, events)
    }

    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    pub async fn get_config(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Save and apply a new configuration.
    ///
    /// Observers see the old and new values synchronously; the session's
    /// share of the change is queued behind requests already sent to it.
    pub async fn update_config(&self, new_config: AppConfig) -> Result<(), RuntimeError> {
        self.edit_config(|config| *config = new_config).await
    }

    pub async fn set_watch_clipboard(&self, enabled: bool) -> Result<(), RuntimeError> {
        self.edit_config(|config| config.general.watch_clipboard = enabled).await
    }

    pub async fn set_history_size(&self, size: usize) -> Result<(), RuntimeError> {
        self.edit_config(|config| config.history.size = size).await
    }

    pub async fn set_volume(&self, volume: f32) -> Result<(), RuntimeError> {
        self.edit_config(|config| config.player.volume = volume).await
    }

    pub async fn is_watching(&self) -> bool {
        self.watch.lock().await.is_watching()
    }

    /// Open every video mentioned in `text`. Returns nothing if there are none.
    pub async fn open_in_text(&self, text: &str) -> Result<Vec<(VideoId, OpenOutcome)>, RuntimeError> {
        let ids = find_video_ids(text);
        if ids.is_empty() {
            tracing::debug!("No video links in text");
            return Ok(Vec::new());
        }
        watch::open_all(&self.session, ids).await
    }

    /// Open every video mentioned on the clipboard.
    pub async fn paste_and_open(&self) -> Result<Vec<(VideoId, OpenOutcome)>, RuntimeError> {
        let text = self.clipboard_text().await?.unwrap_or_default();
        self.open_in_text(&text).await
    }

    /// Open a history entry again (or focus it if still open).
    pub async fn reopen(&self, id: VideoId) -> Result<OpenOutcome, RuntimeError> {
        self.session.open(id).await
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>, RuntimeError> {
        self.session.history().await
    }

    /// Clear history except for videos that are open right now.
    pub async fn clear_history(&self) -> Result<usize, RuntimeError> {
        self.session.clear_history().await
    }

    pub async fn can_clear_history(&self) -> Result<bool, RuntimeError> {
        self.session.can_clear_history().await
    }

    pub async fn open_videos(&self) -> Result<Vec<VideoId>, RuntimeError> {
        self.session.open_ids().await
    }

    /// Whether a paste would open anything.
    pub async fn clipboard_has_videos(&self) -> Result<bool, RuntimeError> {
        let text = self.clipboard_text().await?;
        Ok(text.is_some_and(|text| has_video_ids(&text)))
    }

    /// Put the canonical URL of an open video on the clipboard.
    pub async fn copy_url(&self, id: &VideoId) -> Result<(), RuntimeError> {
        if !self.open_videos().await?.contains(id) {
            return Err(RuntimeError::NotOpen(id.clone()));
        }
        let url = id.canonical_url();
        self.with_clipboard(move |clipboard| clipboard.set_text(&url))
            .await??;
        tracing::debug!(%id, "URL copied");
        Ok(())
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>, RuntimeError> {
        self.session.notifications().await
    }

    pub async fn dismiss_notification(&self, id: u64) -> Result<bool, RuntimeError> {
        self.session.dismiss(id).await
    }

    /// Stop watching, persist history and close every window.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        drop(self.watch.into_inner());
        self.session.shutdown().await
    }

    /// Apply `edit` to a copy of the current config, then save it and
    /// notify observers.
    ///
    /// The write lock is held until the session has taken the change, so
    /// concurrent updates reach the file, the watcher and the session in
    /// the same order.
    async fn edit_config(&self, edit: impl FnOnce(&mut AppConfig)) -> Result<(), RuntimeError> {
        let mut config = self.config.write().await;
        let mut new_config = config.clone();
        edit(&mut new_config);
        let new_config = new_config.sanitized();

        if let Some(path) = &self.config_path {
            new_config
                .save_to(path)
                .map_err(|e| RuntimeError::Config(e.to_string()))?;
        }
        if *config == new_config {
            return Ok(());
        }

        let old_config = std::mem::replace(&mut *config, new_config.clone());
        self.watch
            .lock()
            .await
            .config_changed(&old_config, &new_config);
        self.session.config_changed(old_config, new_config).await
    }

    async fn clipboard_text(&self) -> Result<Option<String>, RuntimeError> {
        self.with_clipboard(|clipboard| clipboard.text()).await
    }

    /// Run a clipboard call on the blocking pool.
    async fn with_clipboard<T, F>(&self, f: F) -> Result<T, RuntimeError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn ClipboardSource) -> T + Send + 'static,
    {
        let clipboard = Arc::clone(&self.clipboard);
        let result = tokio::task::spawn_blocking(move || {
            let mut clipboard = clipboard.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut **clipboard)
        })
        .await?;
        Ok(result)
    }
}
