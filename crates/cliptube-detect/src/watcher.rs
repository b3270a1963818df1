use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clipboard::ClipboardSource;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Background task polling a clipboard and sending the text of each change.
///
/// Contents present when the watcher starts are not sent. Stopping (or
/// dropping) the watcher aborts the task between polls; the channel closes
/// once the task is gone.
#[derive(Debug)]
pub struct ClipboardWatcher {
    task: JoinHandle<()>,
}

impl ClipboardWatcher {
    /// Start polling `source` every `period`, sending changed text on `tx`.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn<S: ClipboardSource>(
        source: S,
        period: Duration,
        tx: mpsc::UnboundedSender<String>,
    ) -> Self {
        let task = tokio::spawn(poll_loop(source, period, tx));
        tracing::info!(period_ms = period.as_millis() as u64, "Clipboard watcher started");
        Self { task }
    }

    pub fn stop(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ClipboardWatcher {
    fn drop(&mut self) {
        self.task.abort();
        tracing::info!("Clipboard watcher stopped");
    }
}

async fn poll_loop<S: ClipboardSource>(
    source: S,
    period: Duration,
    tx: mpsc::UnboundedSender<String>,
) {
    let Some((mut source, mut last, _)) = read_clipboard(source, None).await else {
        return;
    };
    let mut ticker = tokio::time::interval(period);
    // Late ticks are not replayed in a burst; the schedule just shifts.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some((returned, current, text)) = read_clipboard(source, Some(last)).await else {
            break;
        };
        source = returned;
        if current == last {
            continue;
        }
        last = current;

        let Some(text) = text else {
            continue;
        };
        tracing::debug!(change = current, len = text.len(), "Clipboard changed");
        if tx.send(text).is_err() {
            tracing::debug!("Clipboard receiver closed");
            break;
        }
    }
}

/// Read the change counter, and the text if the counter moved past `last`,
/// on the blocking pool. System clipboard reads can stall on the display
/// server.
async fn read_clipboard<S: ClipboardSource>(
    mut source: S,
    last: Option<u64>,
) -> Option<(S, u64, Option<String>)> {
    let read = tokio::task::spawn_blocking(move || {
        let current = source.change_count();
        let text = match last {
            Some(last) if last != current => source.text(),
            _ => None,
        };
        (source, current, text)
    });
    match read.await {
        Ok(read) => Some(read),
        Err(e) => {
            tracing::error!(error = %e, "Clipboard read failed, watcher stopping");
            None
        }
    }
}
