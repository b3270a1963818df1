//! The session actor.
//!
//! One tokio task owns the history, the open documents, the player and the
//! notification log. Everything else talks to it through [`SessionHandle`].
//! Resolutions run on their own tasks and post their result back as a
//! command, so every state change happens in channel order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use cliptube_api::{ResolvedVideo, VideoResolver};
use cliptube_core::config::{AppConfig, ConfigObserver};
use cliptube_core::history::HistoryEntry;
use cliptube_core::notify::{Notification, NotificationLog};
use cliptube_core::persist::HistoryFile;
use cliptube_core::{History, OpenDocuments, VideoId, WindowId};

use crate::player::Player;
use crate::RuntimeError;

/// What an open request did right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Already open; the window was focused and the history entry touched.
    Focused(WindowId),
    /// A resolution was started.
    Resolving,
    /// A resolution for this id was already running.
    AlreadyResolving,
}

/// Things that happened in the session, for whoever renders them.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Opened {
        id: VideoId,
        title: String,
        author: Option<String>,
        /// `None` for live streams and unknown lengths.
        length_seconds: Option<u64>,
        window: WindowId,
    },
    Focused {
        id: VideoId,
        window: WindowId,
    },
    Failed(Notification),
    Closed {
        id: VideoId,
        window: WindowId,
    },
}

pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

/// Handed to the player with each window; reports that the window closed.
#[derive(Debug)]
pub struct WindowCloser {
    tx: mpsc::UnboundedSender<SessionCommand>,
    id: VideoId,
    window: WindowId,
}

impl WindowCloser {
    pub fn notify(self) {
        let _ = self.tx.send(SessionCommand::WindowClosed {
            id: self.id,
            window: self.window,
        });
    }

    #[cfg(test)]
    pub(crate) fn detached(
        id: VideoId,
        window: WindowId,
    ) -> (Self, mpsc::UnboundedReceiver<SessionCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, id, window }, rx)
    }
}

/// Initial state for a session.
#[derive(Debug)]
pub struct SessionSetup {
    pub history: History,
    /// Where history is written after each change; `None` keeps it in memory.
    pub history_file: Option<HistoryFile>,
    pub volume: f32,
}

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

pub(crate) enum SessionCommand {
    Open {
        id: VideoId,
        reply: oneshot::Sender<OpenOutcome>,
    },
    Resolved {
        id: VideoId,
        result: Result<ResolvedVideo, String>,
    },
    WindowClosed {
        id: VideoId,
        window: WindowId,
    },
    History {
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    ClearHistory {
        reply: oneshot::Sender<usize>,
    },
    CanClearHistory {
        reply: oneshot::Sender<bool>,
    },
    OpenIds {
        reply: oneshot::Sender<Vec<VideoId>>,
    },
    ConfigChanged {
        old: Box<AppConfig>,
        new: Box<AppConfig>,
        reply: oneshot::Sender<()>,
    },
    Notifications {
        reply: oneshot::Sender<Vec<Notification>>,
    },
    Dismiss {
        id: u64,
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

impl SessionHandle {
    /// Start the session actor on the current tokio runtime.
    pub fn spawn<R, P>(resolver: Arc<R>, player: P, setup: SessionSetup) -> (Self, SessionEvents)
    where
        R: VideoResolver + 'static,
        P: Player,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let session = Session {
            history: setup.history,
            documents: OpenDocuments::new(),
            titles: HashMap::new(),
            pending: HashSet::new(),
            notifications: NotificationLog::new(),
            history_file: setup.history_file,
            volume: setup.volume,
            next_window: 1,
            player,
            resolver,
            tx: tx.clone(),
            events: events_tx,
        };
        tokio::spawn(actor_loop(session, rx));

        (Self { tx }, events_rx)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(make(reply));
        rx.await.map_err(|_| RuntimeError::SessionClosed)
    }

    /// Open `id`, or focus it if it is already open.
    pub async fn open(&self, id: VideoId) -> Result<OpenOutcome, RuntimeError> {
        self.request(|reply| SessionCommand::Open { id, reply }).await
    }

    /// History items, most recent first.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, RuntimeError> {
        self.request(|reply| SessionCommand::History { reply }).await
    }

    /// Drop every history entry that is not currently open. Returns the
    /// number of entries left.
    pub async fn clear_history(&self) -> Result<usize, RuntimeError> {
        self.request(|reply| SessionCommand::ClearHistory { reply })
            .await
    }

    pub async fn can_clear_history(&self) -> Result<bool, RuntimeError> {
        self.request(|reply| SessionCommand::CanClearHistory { reply })
            .await
    }

    pub async fn open_ids(&self) -> Result<Vec<VideoId>, RuntimeError> {
        self.request(|reply| SessionCommand::OpenIds { reply }).await
    }

    /// Queue a configuration change behind everything already sent.
    pub async fn config_changed(&self, old: AppConfig, new: AppConfig) -> Result<(), RuntimeError> {
        self.request(|reply| SessionCommand::ConfigChanged {
            old: Box::new(old),
            new: Box::new(new),
            reply,
        })
        .await
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>, RuntimeError> {
        self.request(|reply| SessionCommand::Notifications { reply })
            .await
    }

    pub async fn dismiss(&self, id: u64) -> Result<bool, RuntimeError> {
        self.request(|reply| SessionCommand::Dismiss { id, reply })
            .await
    }

    /// Persist history, close all windows and stop the actor.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }
}

struct Session<R, P> {
    history: History,
    documents: OpenDocuments,
    /// Titles of open windows, so focusing can touch history even after
    /// the entry was evicted.
    titles: HashMap<WindowId, String>,
    pending: HashSet<VideoId>,
    notifications: NotificationLog,
    history_file: Option<HistoryFile>,
    volume: f32,
    next_window: u64,
    player: P,
    resolver: Arc<R>,
    tx: mpsc::UnboundedSender<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

async fn actor_loop<R, P>(mut session: Session<R, P>, mut rx: mpsc::UnboundedReceiver<SessionCommand>)
where
    R: VideoResolver + 'static,
    P: Player,
{
    while let Some(cmd) = rx.recv().await {
        match cmd {
            SessionCommand::Open { id, reply } => {
                let _ = reply.send(session.open(id));
            }
            SessionCommand::Resolved { id, result } => {
                session.resolved(id, result);
            }
            SessionCommand::WindowClosed { id, window } => {
                session.window_closed(id, window);
            }
            SessionCommand::History { reply } => {
                let _ = reply.send(session.history.items());
            }
            SessionCommand::ClearHistory { reply } => {
                let _ = reply.send(session.clear_history());
            }
            SessionCommand::CanClearHistory { reply } => {
                let _ = reply.send(session.can_clear_history());
            }
            SessionCommand::OpenIds { reply } => {
                let mut ids: Vec<VideoId> = session.documents.ids().cloned().collect();
                ids.sort();
                let _ = reply.send(ids);
            }
            SessionCommand::ConfigChanged { old, new, reply } => {
                session.config_changed(&old, &new);
                let _ = reply.send(());
            }
            SessionCommand::Notifications { reply } => {
                let _ = reply.send(session.notifications.snapshot());
            }
            SessionCommand::Dismiss { id, reply } => {
                let _ = reply.send(session.notifications.dismiss(id));
            }
            SessionCommand::Shutdown { reply } => {
                session.shutdown();
                let _ = reply.send(());
                break;
            }
        }
    }
    tracing::debug!("Session actor stopped");
}

impl<R, P> Session<R, P>
where
    R: VideoResolver + 'static,
    P: Player,
{
    fn open(&mut self, id: VideoId) -> OpenOutcome {
        if let Some(window) = self.documents.find_open(&id) {
            self.player.focus(window);
            let title = self.titles.get(&window).cloned().unwrap_or_default();
            self.history.add(id.clone(), title);
            self.persist();
            tracing::debug!(%id, %window, "Already open, focused");
            self.emit(SessionEvent::Focused { id, window });
            return OpenOutcome::Focused(window);
        }

        if !self.pending.insert(id.clone()) {
            tracing::debug!(%id, "Resolution already in flight");
            return OpenOutcome::AlreadyResolving;
        }

        let resolver = Arc::clone(&self.resolver);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = resolver.resolve(&id).await.map_err(|e| e.to_string());
            let _ = tx.send(SessionCommand::Resolved { id, result });
        });
        OpenOutcome::Resolving
    }

    fn resolved(&mut self, id: VideoId, result: Result<ResolvedVideo, String>) {
        self.pending.remove(&id);

        let video = match result {
            Ok(video) => video,
            Err(reason) => {
                self.fail(id, reason);
                return;
            }
        };

        if let Some(window) = self.documents.find_open(&id) {
            tracing::debug!(%id, %window, "Opened meanwhile, discarding resolution");
            return;
        }

        let window = WindowId(self.next_window);
        self.next_window += 1;
        let closer = WindowCloser {
            tx: self.tx.clone(),
            id: id.clone(),
            window,
        };
        if let Err(e) = self.player.open(window, &video, self.volume, closer) {
            self.fail(id, e.to_string());
            return;
        }

        if let Err(rejected) = self.documents.register(id.clone(), window) {
            tracing::error!(%id, window = %rejected, "Duplicate registration, closing window");
            self.player.close(rejected);
            return;
        }

        self.titles.insert(window, video.title.clone());
        self.history.add(id.clone(), video.title.clone());
        self.persist();
        self.emit(SessionEvent::Opened {
            id,
            title: video.title,
            author: video.author,
            length_seconds: video.length_seconds,
            window,
        });
    }

    fn window_closed(&mut self, id: VideoId, window: WindowId) {
        self.player.close(window);
        self.titles.remove(&window);
        if self.documents.unregister_window(&id, window) {
            tracing::debug!(%id, %window, "Window closed");
            self.emit(SessionEvent::Closed { id, window });
        }
    }

    fn clear_history(&mut self) -> usize {
        let keep: HashSet<VideoId> = self.documents.ids().cloned().collect();
        self.history.clear(&keep);
        self.persist();
        tracing::info!(remaining = self.history.count(), "History cleared");
        self.history.count()
    }

    fn can_clear_history(&self) -> bool {
        self.history
            .items()
            .iter()
            .any(|entry| self.documents.find_open(&entry.id).is_none())
    }

    fn fail(&mut self, id: VideoId, reason: String) {
        tracing::warn!(%id, %reason, "Failed to open video");
        let message = format!("The video {} could not be opened: {reason}", id.canonical_url());
        let notification = self.notifications.push(Some(id), message);
        self.emit(SessionEvent::Failed(notification));
    }

    fn persist(&self) {
        let Some(file) = &self.history_file else {
            return;
        };
        if let Err(e) = file.save(&self.history) {
            tracing::warn!(path = %file.path().display(), error = %e, "Failed to save history");
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn shutdown(&mut self) {
        self.persist();
        let windows: Vec<WindowId> = self.documents.windows().map(|(_, w)| w).collect();
        for window in windows {
            self.player.close(window);
        }
        tracing::info!(history = self.history.count(), "Session shut down");
    }
}

impl<R, P> ConfigObserver for Session<R, P>
where
    R: VideoResolver + 'static,
    P: Player,
{
    fn config_changed(&mut self, old: &AppConfig, new: &AppConfig) {
        if old.history.size != new.history.size {
            let evicted = self.history.set_max_size(new.history.size);
            tracing::info!(size = new.history.size, evicted, "History size changed");
            if evicted {
                self.persist();
            }
        }
        if old.player.volume != new.player.volume {
            self.volume = new.player.volume;
            tracing::debug!(volume = self.volume, "Volume changed");
        }
    }
}
