use super::*;
use crate::error::SyncError;
use std::time::Duration;
use url::Url;

fn base() -> Url {
    Url::parse("ws://localhost:7700/listen").unwrap()
}

#[test]
fn test_channel_url_appends_channel() {
    let url = channel_url(&base(), "objects").unwrap();
    assert_eq!(url.as_str(), "ws://localhost:7700/listen/objects");
}

#[test]
fn test_channel_url_tolerates_trailing_slash() {
    let base = Url::parse("ws://localhost:7700/listen/").unwrap();
    let url = channel_url(&base, "public").unwrap();
    assert_eq!(url.as_str(), "ws://localhost:7700/listen/public");
}

#[test]
fn test_invalid_channel_names() {
    assert!(is_valid_channel_name("objects"));
    assert!(is_valid_channel_name("moving_objects-2"));
    assert!(!is_valid_channel_name(""));
    assert!(!is_valid_channel_name("a/b"));
    assert!(!is_valid_channel_name("a b"));
    assert!(!is_valid_channel_name("a?b"));
    assert!(!is_valid_channel_name("a#b"));

    let result = channel_url(&base(), "a/b");
    assert!(matches!(result, Err(SyncError::Transport(_))));
}

#[test]
fn test_manager_rejects_non_websocket_base() {
    assert!(matches!(
        ChannelManager::new("http://localhost:7700/listen", 8),
        Err(SyncError::Transport(_))
    ));
    assert!(matches!(
        ChannelManager::new("not a url", 8),
        Err(SyncError::Transport(_))
    ));
}

#[test]
fn test_session_state_machine() {
    let mut session = Session::new("objects", base());
    assert_eq!(session.status, SessionStatus::Connecting);

    assert!(session.transition(SessionStatus::Open));
    assert!(session.status.is_open());

    // No-op transition
    assert!(!session.transition(SessionStatus::Open));
    // Never back to connecting
    assert!(!session.transition(SessionStatus::Connecting));

    assert!(session.transition(SessionStatus::Errored("boom".to_string())));
    assert!(session.status.is_terminal());

    // Terminal states are final
    assert!(!session.transition(SessionStatus::Open));
    assert!(!session.transition(SessionStatus::Closed));
}

#[test]
fn test_opened_at_stamped_on_open() {
    let mut session = Session::new("objects", base());
    assert!(session.opened_at.is_none());

    session.transition(SessionStatus::Open);
    let opened_at = session.opened_at.unwrap();
    assert!(opened_at >= session.created_at);

    session.transition(SessionStatus::Closed);
    assert_eq!(session.opened_at, Some(opened_at));
}

#[test]
fn test_session_that_never_opens_has_no_opened_at() {
    let mut session = Session::new("objects", base());
    session.transition(SessionStatus::Errored("refused".to_string()));
    assert!(session.opened_at.is_none());
}

#[test]
fn test_session_ids_are_unique() {
    let a = SessionId::new();
    let b = SessionId::new();
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_reconnect_replaces_session() {
    let (mut manager, _rx) = ChannelManager::new("ws://127.0.0.1:1/listen", 8).unwrap();

    assert!(matches!(manager.reconnect(), Err(SyncError::Transport(_))));

    let first = manager.connect("objects").unwrap();
    assert!(manager.is_current(&first.id));

    let second = manager.reconnect().unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(second.channel, "objects");
    assert!(!manager.is_current(&first.id));
    assert!(manager.is_current(&second.id));

    // Status updates for the replaced session are ignored
    assert_eq!(manager.update_status(&first.id, SessionStatus::Open), None);
    assert_eq!(
        manager.update_status(&second.id, SessionStatus::Open),
        Some(SessionStatus::Open)
    );
}

#[tokio::test]
async fn test_close_marks_session_closed() {
    let (mut manager, _rx) = ChannelManager::new("ws://127.0.0.1:1/listen", 8).unwrap();
    assert!(!manager.close());

    let session = manager.connect("objects").unwrap();
    assert!(manager.close());
    assert!(manager.is_current(&session.id));
    assert_eq!(manager.current().unwrap().status, SessionStatus::Closed);
}

#[tokio::test]
async fn test_refused_connection_reports_error() {
    let (mut manager, mut rx) = ChannelManager::new("ws://127.0.0.1:1/listen", 8).unwrap();
    let session = manager.connect("objects").unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for channel event")
        .expect("intake queue closed");

    assert_eq!(event.session, session.id);
    assert!(matches!(event.kind, ChannelEventKind::Errored(_)));
}
