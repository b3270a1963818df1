//! Player windows.
//!
//! The session allocates [`WindowId`]s and owns the document index; a
//! [`Player`] owns the window table those ids point into. Windows report
//! their own closing through the [`WindowCloser`] they were opened with.

use std::collections::HashMap;
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::oneshot;

use cliptube_api::ResolvedVideo;
use cliptube_core::WindowId;

use crate::session::WindowCloser;

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("failed to start player `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is already open")]
    WindowInUse(WindowId),
}

/// Opens, focuses and closes playback windows.
///
/// Calls come from the session actor only, one at a time.
pub trait Player: Send + 'static {
    /// Show `video` in a new window identified by `window`.
    ///
    /// `on_close` must be notified once the window goes away, whether the
    /// user closed it or [`Player::close`] was called.
    fn open(
        &mut self,
        window: WindowId,
        video: &ResolvedVideo,
        volume: f32,
        on_close: WindowCloser,
    ) -> Result<(), PlayerError>;

    /// Bring an open window to the front.
    fn focus(&mut self, window: WindowId);

    /// Close `window` and release it. Unknown windows are ignored.
    fn close(&mut self, window: WindowId);
}

/// Plays each video in its own external player process (mpv by default).
#[derive(Debug)]
pub struct MpvPlayer {
    command: String,
    windows: HashMap<WindowId, oneshot::Sender<()>>,
}

impl MpvPlayer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            windows: HashMap::new(),
        }
    }

    fn args(video: &ResolvedVideo, volume: f32) -> Vec<String> {
        let title = match &video.author {
            Some(author) => format!("{} - {author}", video.title),
            None => video.title.clone(),
        };
        vec![
            format!("--title={title}"),
            format!("--volume={}", (volume.clamp(0.0, 1.0) * 100.0).round() as u32),
            "--force-window=immediate".into(),
            "--".into(),
            video.stream.url.to_string(),
        ]
    }
}

impl Player for MpvPlayer {
    fn open(
        &mut self,
        window: WindowId,
        video: &ResolvedVideo,
        volume: f32,
        on_close: WindowCloser,
    ) -> Result<(), PlayerError> {
        if self.windows.contains_key(&window) {
            return Err(PlayerError::WindowInUse(window));
        }

        let mut child = Command::new(&self.command)
            .args(Self::args(video, volume))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlayerError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    tracing::debug!(%window, ?status, "Player process exited");
                }
                _ = kill_rx => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(%window, error = %e, "Failed to kill player process");
                    }
                }
            }
            on_close.notify();
        });

        self.windows.insert(window, kill_tx);
        tracing::info!(%window, id = %video.id, stream = %video.stream.kind, "Player window opened");
        Ok(())
    }

    fn focus(&mut self, window: WindowId) {
        // External processes cannot be raised portably.
        tracing::debug!(%window, "Focus requested");
    }

    fn close(&mut self, window: WindowId) {
        if let Some(kill) = self.windows.remove(&window) {
            // The process may already have exited on its own.
            let _ = kill.send(());
        }
    }
}
