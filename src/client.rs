use crate::channel::{
    ChannelEvent, ChannelEventKind, ChannelManager, Session, SessionId, SessionStatus,
};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::render::{FeatureLayer, StatusDisplay};
use crate::state::{Applied, EntityChange, EntityTableReader, Reconciler, SyncStats};
use std::future::Future;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Outcome of handling one channel event
#[derive(Clone, Debug, PartialEq)]
pub enum Handled {
    /// Session status changed (and was shown)
    Status(SessionStatus),
    /// Frame decoded and applied (or rejected by the decoder)
    Frame(Applied),
    /// Event ignored: stale session, frame outside `Open`, or no-op status
    Dropped,
}

/// Context object tying the channel manager to the reconciler.
///
/// Everything the frame path touches is owned here and handled on a single
/// consumer: events are pulled from the intake queue one at a time and fully
/// applied before the next one.
pub struct SyncClient<D, L> {
    channels: ChannelManager,
    events_rx: mpsc::Receiver<ChannelEvent>,
    reconciler: Reconciler<D, L>,
}

impl<D, L> SyncClient<D, L>
where
    D: StatusDisplay,
    L: FeatureLayer,
{
    pub fn new(config: &SyncConfig, display: D, layer: L) -> Result<Self, SyncError> {
        let (channels, events_rx) =
            ChannelManager::new(&config.channel.base_url, config.channel.queue_capacity)?;
        let reconciler = Reconciler::new(config.geofence.clone(), display, layer)
            .with_echo(config.display.echo_payloads);

        Ok(Self {
            channels,
            events_rx,
            reconciler,
        })
    }

    /// Subscribe to `channel`, replacing any current session
    pub fn connect(&mut self, channel: &str) -> Result<Session, SyncError> {
        let session = self.channels.connect(channel).map_err(|e| {
            warn!(channel = %channel, error = %e, "Unable to open channel");
            e
        })?;
        self.reconciler
            .display_mut()
            .status(&session.channel, &session.status);
        Ok(session)
    }

    /// Subscribe to `channel` on an externally driven transport; events are
    /// fed through [`Self::sender`]
    pub fn attach(&mut self, channel: &str) -> Result<Session, SyncError> {
        let session = self.channels.attach(channel)?;
        self.reconciler
            .display_mut()
            .status(&session.channel, &session.status);
        Ok(session)
    }

    /// Explicitly re-open the current channel
    pub fn reconnect(&mut self) -> Result<Session, SyncError> {
        let session = self.channels.reconnect()?;
        info!(channel = %session.channel, session_id = %session.id, "Reconnecting");
        self.reconciler
            .display_mut()
            .status(&session.channel, &session.status);
        Ok(session)
    }

    /// Close the current session; frames still queued from it are dropped
    pub fn close(&mut self) {
        if self.channels.close() {
            if let Some(session) = self.channels.current() {
                let (channel, status) = (session.channel.clone(), session.status.clone());
                self.reconciler.display_mut().status(&channel, &status);
            }
        }
    }

    /// Handle one event from the intake queue
    pub fn handle_event(&mut self, event: ChannelEvent) -> Handled {
        let ChannelEvent { session, kind } = event;

        if !self.channels.is_current(&session) {
            debug!(session_id = %session, "Ignoring event from replaced session");
            if matches!(kind, ChannelEventKind::Frame(_)) {
                self.reconciler.stats().record_dropped();
            }
            return Handled::Dropped;
        }

        match kind {
            ChannelEventKind::Opened => self.transition(&session, SessionStatus::Open),
            ChannelEventKind::Closed => self.transition(&session, SessionStatus::Closed),
            ChannelEventKind::Errored(reason) => {
                self.transition(&session, SessionStatus::Errored(reason))
            }
            ChannelEventKind::Frame(text) => {
                let open = self.channels.current().is_some_and(|s| s.status.is_open());
                if !open {
                    debug!(session_id = %session, "Dropping frame outside open session");
                    self.reconciler.stats().record_dropped();
                    return Handled::Dropped;
                }
                Handled::Frame(self.reconciler.handle_frame(&text))
            }
        }
    }

    fn transition(&mut self, session: &SessionId, status: SessionStatus) -> Handled {
        let Some(status) = self.channels.update_status(session, status) else {
            return Handled::Dropped;
        };
        if let Some(current) = self.channels.current() {
            let channel = current.channel.clone();
            self.reconciler.display_mut().status(&channel, &status);
        }
        Handled::Status(status)
    }

    /// Wait for and handle the next event
    pub async fn next(&mut self) -> Option<Handled> {
        let event = self.events_rx.recv().await?;
        Some(self.handle_event(event))
    }

    /// Process events until `shutdown` resolves
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                handled = self.next() => {
                    if handled.is_none() {
                        break;
                    }
                }
            }
        }

        self.close();
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.channels.current()
    }

    /// Sender for the intake queue, for feeding events in-process
    pub fn sender(&self) -> mpsc::Sender<ChannelEvent> {
        self.channels.sender()
    }

    /// Read-only view of the entity table
    pub fn reader(&self) -> EntityTableReader {
        self.reconciler.table().reader()
    }

    /// Subscribe to entity changes
    pub fn subscribe(&self) -> broadcast::Receiver<EntityChange> {
        self.reconciler.table().subscribe()
    }

    pub fn stats(&self) -> SyncStats {
        self.reconciler.stats().clone()
    }

    pub fn reconciler(&self) -> &Reconciler<D, L> {
        &self.reconciler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FeatureId;
    use crate::render::{GeofenceSet, LogDisplay};

    const OBJECT_FRAME: &str =
        r#"{"object_id":1,"location":{"longitude":-126.4,"latitude":45.3},"color":"red"}"#;

    fn client() -> SyncClient<LogDisplay, GeofenceSet> {
        let mut config = SyncConfig::default();
        // Nothing listens here; transport events are injected by hand
        config.channel.base_url = "ws://127.0.0.1:1/listen".to_string();
        SyncClient::new(&config, LogDisplay::new(), GeofenceSet::new()).unwrap()
    }

    fn frame(session: SessionId, text: &str) -> ChannelEvent {
        ChannelEvent::new(session, ChannelEventKind::Frame(text.to_string()))
    }

    #[tokio::test]
    async fn test_frames_applied_only_while_open() {
        let mut client = client();
        let session = client.connect("objects").unwrap();

        // Not open yet
        assert_eq!(client.handle_event(frame(session.id, OBJECT_FRAME)), Handled::Dropped);
        assert!(client.reader().is_empty());

        assert_eq!(
            client.handle_event(ChannelEvent::new(session.id, ChannelEventKind::Opened)),
            Handled::Status(SessionStatus::Open)
        );
        assert!(matches!(
            client.handle_event(frame(session.id, OBJECT_FRAME)),
            Handled::Frame(Applied::Entity { .. })
        ));
        assert!(client.reader().get(&FeatureId::Number(1)).is_some());

        assert_eq!(
            client.handle_event(ChannelEvent::new(session.id, ChannelEventKind::Closed)),
            Handled::Status(SessionStatus::Closed)
        );
        assert_eq!(
            client.handle_event(frame(session.id, r#"{"user_name":"Amy","message":"hi"}"#)),
            Handled::Dropped
        );
        assert_eq!(client.reconciler().display().chat_lines(), 0);
        assert_eq!(client.stats().snapshot().dropped, 2);
    }

    #[tokio::test]
    async fn test_replaced_session_is_ignored() {
        let mut client = client();
        let old = client.connect("objects").unwrap();
        client.handle_event(ChannelEvent::new(old.id, ChannelEventKind::Opened));

        let new = client.reconnect().unwrap();
        assert_ne!(old.id, new.id);

        assert_eq!(client.handle_event(frame(old.id, OBJECT_FRAME)), Handled::Dropped);
        assert_eq!(
            client.handle_event(ChannelEvent::new(old.id, ChannelEventKind::Closed)),
            Handled::Dropped
        );
        assert!(client.reader().is_empty());

        client.handle_event(ChannelEvent::new(new.id, ChannelEventKind::Opened));
        assert!(matches!(
            client.handle_event(frame(new.id, OBJECT_FRAME)),
            Handled::Frame(_)
        ));
        assert_eq!(client.reader().len(), 1);
    }

    #[tokio::test]
    async fn test_errored_session_drops_late_frames() {
        let mut client = client();
        let session = client.connect("objects").unwrap();
        client.handle_event(ChannelEvent::new(session.id, ChannelEventKind::Opened));

        let handled = client.handle_event(ChannelEvent::new(
            session.id,
            ChannelEventKind::Errored("connection reset".to_string()),
        ));
        assert_eq!(
            handled,
            Handled::Status(SessionStatus::Errored("connection reset".to_string()))
        );
        assert_eq!(client.handle_event(frame(session.id, OBJECT_FRAME)), Handled::Dropped);
        assert!(client.reader().is_empty());
    }

    #[tokio::test]
    async fn test_close_stops_applying_frames() {
        let mut client = client();
        let session = client.connect("objects").unwrap();
        client.handle_event(ChannelEvent::new(session.id, ChannelEventKind::Opened));

        client.close();
        assert_eq!(
            client.current_session().unwrap().status,
            SessionStatus::Closed
        );
        assert_eq!(client.handle_event(frame(session.id, OBJECT_FRAME)), Handled::Dropped);
    }

    #[tokio::test]
    async fn test_invalid_channel_is_transport_error() {
        let mut client = client();
        assert!(matches!(
            client.connect("bad/channel"),
            Err(SyncError::Transport(_))
        ));
        assert!(client.current_session().is_none());
    }

    #[tokio::test]
    async fn test_queued_events_processed_in_order() {
        let mut client = client();
        let session = client.attach("objects").unwrap();
        let tx = client.sender();

        tx.send(ChannelEvent::new(session.id, ChannelEventKind::Opened))
            .await
            .unwrap();
        tx.send(frame(session.id, r#"{"user_name":"Amy","message":"one"}"#))
            .await
            .unwrap();
        tx.send(frame(session.id, r#"{"user_name":"Amy","message":"two"}"#))
            .await
            .unwrap();

        let mut lines = Vec::new();
        while lines.len() < 2 {
            match client.next().await {
                Some(Handled::Frame(Applied::ChatLine(line))) => lines.push(line),
                Some(_) => {}
                None => break,
            }
        }
        assert_eq!(lines, vec!["[Amy] one".to_string(), "[Amy] two".to_string()]);
    }
}
