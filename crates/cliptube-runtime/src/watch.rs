use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;

use cliptube_core::config::{AppConfig, ConfigObserver};
use cliptube_core::VideoId;
use cliptube_detect::{ClipboardSource, ClipboardWatcher};
use cliptube_scan::find_video_ids;

use crate::session::{OpenOutcome, SessionHandle};
use crate::RuntimeError;

/// Creates a fresh clipboard handle each time one is needed.
pub type ClipboardFactory = Arc<dyn Fn() -> Box<dyn ClipboardSource> + Send + Sync>;

/// Owns the clipboard watcher and follows the `general.*` settings.
pub(crate) struct WatchControl {
    watcher: Option<ClipboardWatcher>,
    clipboard: ClipboardFactory,
    tx: mpsc::UnboundedSender<String>,
}

impl WatchControl {
    pub(crate) fn new(clipboard: ClipboardFactory, tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            watcher: None,
            clipboard,
            tx,
        }
    }

    pub(crate) fn apply(&mut self, config: &AppConfig) {
        self.watcher = None;
        if config.general.watch_clipboard {
            let period = Duration::from_millis(config.general.poll_interval_ms);
            self.watcher = Some(ClipboardWatcher::spawn(
                (self.clipboard)(),
                period,
                self.tx.clone(),
            ));
        }
    }

    pub(crate) fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(ClipboardWatcher::is_running)
    }
}

impl ConfigObserver for WatchControl {
    fn config_changed(&mut self, old: &AppConfig, new: &AppConfig) {
        if old.general != new.general {
            self.apply(new);
        }
    }
}

/// Open every id found in the texts the watcher sends, until the watcher
/// side of the channel is gone.
pub(crate) async fn forward_clipboard(
    mut rx: mpsc::UnboundedReceiver<String>,
    session: SessionHandle,
) {
    while let Some(text) = rx.recv().await {
        let ids = find_video_ids(&text);
        if ids.is_empty() {
            continue;
        }
        tracing::info!(count = ids.len(), "Video links copied");
        if let Err(e) = open_all(&session, ids).await {
            tracing::warn!(error = %e, "Session gone, clipboard forwarding stopped");
            break;
        }
    }
}

/// Request every id at once; each lands in the session queue independently.
pub(crate) async fn open_all(
    session: &SessionHandle,
    ids: BTreeSet<VideoId>,
) -> Result<Vec<(VideoId, OpenOutcome)>, RuntimeError> {
    let requests = ids.into_iter().map(|id| async move {
        let outcome = session.open(id.clone()).await?;
        Ok::<_, RuntimeError>((id, outcome))
    });
    join_all(requests).await.into_iter().collect()
}
