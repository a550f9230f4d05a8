use super::session::{Session, SessionId, SessionStatus};
use crate::error::SyncError;
use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

/// Notification from a session's transport task
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelEvent {
    pub session: SessionId,
    pub kind: ChannelEventKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEventKind {
    Opened,
    /// One text frame, unmodified
    Frame(String),
    Closed,
    Errored(String),
}

impl ChannelEvent {
    pub fn new(session: SessionId, kind: ChannelEventKind) -> Self {
        Self { session, kind }
    }
}

/// Owns the push connection for one channel at a time.
///
/// Each `connect` spawns a transport task that feeds [`ChannelEvent`]s into
/// the shared intake queue. Connecting again aborts the previous task and
/// makes its id stale, so anything it already queued is ignored downstream.
pub struct ChannelManager {
    base_url: Url,
    events_tx: mpsc::Sender<ChannelEvent>,
    current: Option<Session>,
    task: Option<JoinHandle<()>>,
}

impl ChannelManager {
    /// Create a manager and the bounded intake queue it feeds.
    ///
    /// `base_url` is the listen endpoint, e.g. `ws://localhost:7700/listen`.
    pub fn new(
        base_url: &str,
        queue_capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<ChannelEvent>), SyncError> {
        let base_url = parse_base_url(base_url)?;
        let (events_tx, events_rx) = mpsc::channel(queue_capacity.max(1));

        Ok((
            Self {
                base_url,
                events_tx,
                current: None,
                task: None,
            },
            events_rx,
        ))
    }

    /// Open a session on `channel`, replacing any current one
    pub fn connect(&mut self, channel: &str) -> Result<Session, SyncError> {
        let url = channel_url(&self.base_url, channel)?;
        self.close();

        let session = Session::new(channel, url);
        info!(
            channel = %channel,
            session_id = %session.id,
            url = %session.url,
            "Opening channel session"
        );

        let task = tokio::spawn(run_session(
            session.url.clone(),
            session.id,
            self.events_tx.clone(),
        ));

        self.task = Some(task);
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Register a session on `channel` without starting a transport.
    ///
    /// For transports driven outside this crate: the caller feeds
    /// [`ChannelEvent`]s for the returned session through [`Self::sender`].
    pub fn attach(&mut self, channel: &str) -> Result<Session, SyncError> {
        let url = channel_url(&self.base_url, channel)?;
        self.close();

        let session = Session::new(channel, url);
        debug!(channel = %channel, session_id = %session.id, "Attached external session");
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Re-open the current channel with a fresh session
    pub fn reconnect(&mut self) -> Result<Session, SyncError> {
        let channel = match &self.current {
            Some(session) => session.channel.clone(),
            None => return Err(SyncError::Transport("no channel to reconnect".to_string())),
        };
        self.connect(&channel)
    }

    /// Stop the current session's transport task and mark it closed.
    ///
    /// The session stays current so its final status can still be read, but
    /// no further frames will be applied from it. Returns whether the status
    /// changed.
    pub fn close(&mut self) -> bool {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        match self.current.as_mut() {
            Some(session) => {
                let changed = session.transition(SessionStatus::Closed);
                if changed {
                    debug!(
                        session_id = %session.id,
                        opened_at = ?session.opened_at,
                        "Closed channel session"
                    );
                }
                changed
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_current(&self, id: &SessionId) -> bool {
        self.current.as_ref().is_some_and(|s| &s.id == id)
    }

    /// Apply a status change to the current session.
    ///
    /// Returns the new status if `id` is current and the transition was
    /// accepted.
    pub fn update_status(
        &mut self,
        id: &SessionId,
        status: SessionStatus,
    ) -> Option<SessionStatus> {
        let session = self.current.as_mut().filter(|s| &s.id == id)?;
        if session.transition(status) {
            Some(session.status.clone())
        } else {
            None
        }
    }

    /// Sender for the intake queue (used to inject events in-process)
    pub fn sender(&self) -> mpsc::Sender<ChannelEvent> {
        self.events_tx.clone()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        self.close();
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, SyncError> {
    let url = Url::parse(base_url)
        .map_err(|e| SyncError::Transport(format!("invalid base url '{}': {}", base_url, e)))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(SyncError::Transport(format!(
                "unsupported scheme '{}': expected ws or wss",
                other
            )))
        }
    }
    if url.cannot_be_a_base() {
        return Err(SyncError::Transport(format!(
            "invalid base url '{}'",
            base_url
        )));
    }

    Ok(url)
}

/// Validates a channel name.
///
/// Channel names become a single path segment, so they must be non-empty and
/// free of separators, whitespace and query/fragment markers.
pub fn is_valid_channel_name(channel: &str) -> bool {
    !channel.is_empty()
        && !channel
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '\\'))
}

/// `<base>/<channel>`
pub fn channel_url(base: &Url, channel: &str) -> Result<Url, SyncError> {
    if !is_valid_channel_name(channel) {
        return Err(SyncError::Transport(format!(
            "invalid channel name '{}'",
            channel
        )));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SyncError::Transport(format!("invalid base url '{}'", base)))?
        .pop_if_empty()
        .push(channel);
    Ok(url)
}

/// Transport task for one session: always ends with `Closed` or `Errored`
async fn run_session(url: Url, session: SessionId, events_tx: mpsc::Sender<ChannelEvent>) {
    let kind = match stream_frames(&url, session, &events_tx).await {
        Ok(()) => ChannelEventKind::Closed,
        Err(e) => {
            warn!(session_id = %session, error = %e, "Channel session failed");
            ChannelEventKind::Errored(format!("{:#}", e))
        }
    };
    let _ = events_tx.send(ChannelEvent::new(session, kind)).await;
}

async fn stream_frames(
    url: &Url,
    session: SessionId,
    events_tx: &mpsc::Sender<ChannelEvent>,
) -> Result<()> {
    let (mut socket, _response) = connect_async(url.as_str())
        .await
        .with_context(|| format!("Failed to connect to {}", url))?;

    info!(session_id = %session, url = %url, "WebSocket connection established");
    if events_tx
        .send(ChannelEvent::new(session, ChannelEventKind::Opened))
        .await
        .is_err()
    {
        return Ok(());
    }

    while let Some(msg) = socket.next().await {
        match msg.context("WebSocket receive failed")? {
            Message::Text(text) => {
                let event = ChannelEvent::new(session, ChannelEventKind::Frame(text));
                if events_tx.send(event).await.is_err() {
                    // Consumer is gone
                    break;
                }
            }
            Message::Close(frame) => {
                debug!(session_id = %session, ?frame, "Server closed channel");
                break;
            }
            _ => {
                // Ping/pong handled by tungstenite; binary frames are not events
            }
        }
    }

    info!(session_id = %session, "WebSocket connection closed");
    Ok(())
}
