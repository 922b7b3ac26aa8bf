//! Organization rooms in the WebSocket connection manager.

use axum::extract::ws::Message;
use tripcheck_api::ws::WsManager;

fn text(s: &str) -> Message {
    Message::Text(s.into())
}

#[tokio::test]
async fn org_messages_reach_only_that_room() {
    let manager = WsManager::new();
    let mut a = manager.add("a".into(), 1, Some(10)).await;
    let mut b = manager.add("b".into(), 2, Some(10)).await;
    let mut c = manager.add("c".into(), 3, Some(20)).await;
    let mut solo = manager.add("d".into(), 4, None).await;

    assert_eq!(manager.send_to_org(10, text("hello")).await, 2);
    assert!(matches!(a.try_recv(), Ok(Message::Text(_))));
    assert!(matches!(b.try_recv(), Ok(Message::Text(_))));
    assert!(c.try_recv().is_err());
    assert!(solo.try_recv().is_err());
    assert_eq!(manager.org_connection_count(10).await, 2);
}

#[tokio::test]
async fn membership_change_moves_every_connection_of_a_user() {
    let manager = WsManager::new();
    let _phone = manager.add("phone".into(), 1, None).await;
    let _tablet = manager.add("tablet".into(), 1, None).await;
    let _other = manager.add("other".into(), 2, None).await;

    assert_eq!(manager.set_user_org(1, Some(10)).await, 2);
    assert_eq!(manager.org_connection_count(10).await, 2);

    assert_eq!(manager.set_user_org(1, None).await, 2);
    assert_eq!(manager.org_connection_count(10).await, 0);
}

#[tokio::test]
async fn closed_receivers_are_skipped() {
    let manager = WsManager::new();
    let rx = manager.add("gone".into(), 1, Some(10)).await;
    let _live = manager.add("live".into(), 2, Some(10)).await;
    drop(rx);

    assert_eq!(manager.send_to_org(10, text("x")).await, 1);
}

#[tokio::test]
async fn remove_and_shutdown() {
    let manager = WsManager::new();
    let _a = manager.add("a".into(), 1, Some(10)).await;
    let mut b = manager.add("b".into(), 2, Some(10)).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("a").await;
    assert_eq!(manager.connection_count().await, 1);

    manager.shutdown_all().await;
    assert_eq!(manager.connection_count().await, 0);
    assert!(matches!(b.try_recv(), Ok(Message::Close(None))));
}

#[tokio::test]
async fn ping_reaches_everyone() {
    let manager = WsManager::new();
    let mut a = manager.add("a".into(), 1, Some(10)).await;
    let mut b = manager.add("b".into(), 2, None).await;

    manager.ping_all().await;
    assert!(matches!(a.try_recv(), Ok(Message::Ping(_))));
    assert!(matches!(b.try_recv(), Ok(Message::Ping(_))));
}
