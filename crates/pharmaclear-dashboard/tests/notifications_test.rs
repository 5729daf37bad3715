mod common;

use common::{credential, notification, wait_until, FakeBackend, POLL};
use pharmaclear_dashboard::NotificationPoller;
use std::sync::Arc;

fn unread_feed() -> FakeBackend {
    FakeBackend::new().with_notifications(vec![
        notification(1, "New Class I recall for ibuprofen"),
        notification(2, "Watchlist match: metformin"),
    ])
}

#[tokio::test(start_paused = true)]
async fn test_fetches_immediately_then_every_period() {
    let backend = Arc::new(unread_feed());
    let poller = NotificationPoller::new(backend.clone(), credential(), POLL);

    poller.start().await;
    wait_until(|| backend.calls("list_notifications") == 1).await;

    tokio::time::advance(POLL / 2).await;
    tokio::task::yield_now().await;
    assert_eq!(backend.calls("list_notifications"), 1);

    tokio::time::advance(POLL / 2).await;
    wait_until(|| backend.calls("list_notifications") == 2).await;

    tokio::time::advance(POLL).await;
    wait_until(|| backend.calls("list_notifications") == 3).await;

    assert_eq!(poller.unread_count().await, 2);
    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_fetch_after_stop() {
    let backend = Arc::new(unread_feed());
    let poller = NotificationPoller::new(backend.clone(), credential(), POLL);

    poller.start().await;
    wait_until(|| backend.calls("list_notifications") == 1).await;
    poller.stop().await;
    assert!(!poller.is_running().await);

    tokio::time::advance(POLL * 5).await;
    tokio::task::yield_now().await;
    assert_eq!(backend.calls("list_notifications"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_fetch_is_not_applied_after_stop() {
    let backend = Arc::new(unread_feed());
    let gate = backend.gate("list_notifications");
    let poller = NotificationPoller::new(backend.clone(), credential(), POLL);

    poller.start().await;
    wait_until(|| backend.calls("list_notifications") == 1).await;

    poller.stop().await;
    gate.notify_one();
    tokio::task::yield_now().await;

    let view = poller.view().await;
    assert!(view.items.is_empty());
    assert_eq!(view.unread_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_invalidated_credential_stops_polling() {
    let backend = Arc::new(unread_feed());
    let credential = credential();
    let poller = NotificationPoller::new(backend.clone(), credential.clone(), POLL);

    poller.start().await;
    wait_until(|| backend.calls("list_notifications") == 1).await;

    credential.invalidate();
    for _ in 0..100 {
        if !poller.is_running().await {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(!poller.is_running().await);

    tokio::time::advance(POLL * 3).await;
    tokio::task::yield_now().await;
    assert_eq!(backend.calls("list_notifications"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_replaces_running_task() {
    let backend = Arc::new(unread_feed());
    let poller = NotificationPoller::new(backend.clone(), credential(), POLL);

    poller.start().await;
    wait_until(|| backend.calls("list_notifications") == 1).await;
    poller.start().await;
    wait_until(|| backend.calls("list_notifications") == 2).await;

    tokio::time::advance(POLL).await;
    wait_until(|| backend.calls("list_notifications") == 3).await;
    tokio::task::yield_now().await;
    assert_eq!(backend.calls("list_notifications"), 3);

    poller.stop().await;
}

#[tokio::test]
async fn test_opening_bell_marks_everything_read() {
    let backend = Arc::new(unread_feed());
    let poller = NotificationPoller::new(backend.clone(), credential(), POLL);
    assert!(poller.refresh().await);
    assert_eq!(poller.unread_count().await, 2);

    assert!(poller.toggle_view().await);

    let view = poller.view().await;
    assert!(view.visible);
    assert_eq!(view.unread_count, 0);
    assert!(view.items.iter().all(|n| n.is_read));
    assert_eq!(backend.calls("mark_notifications_read"), 1);

    // Closing does not talk to the server
    assert!(!poller.toggle_view().await);
    assert_eq!(backend.calls("mark_notifications_read"), 1);
}

#[tokio::test]
async fn test_opening_bell_with_nothing_unread_skips_server() {
    let backend = Arc::new(FakeBackend::new());
    let poller = NotificationPoller::new(backend.clone(), credential(), POLL);
    poller.refresh().await;

    assert!(poller.toggle_view().await);
    assert_eq!(backend.calls("mark_notifications_read"), 0);
}

#[tokio::test]
async fn test_read_state_survives_failed_mark_and_later_poll() {
    let backend = Arc::new(unread_feed());
    backend.fail("mark_notifications_read");
    let poller = NotificationPoller::new(backend.clone(), credential(), POLL);
    poller.refresh().await;

    poller.toggle_view().await;
    assert_eq!(poller.unread_count().await, 0);

    // The server still reports both as unread
    assert!(poller.refresh().await);
    assert_eq!(poller.unread_count().await, 0);
    assert_eq!(poller.view().await.items.len(), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_feed() {
    let backend = Arc::new(unread_feed());
    let poller = NotificationPoller::new(backend.clone(), credential(), POLL);
    poller.refresh().await;

    backend.fail("list_notifications");
    assert!(!poller.refresh().await);
    assert_eq!(poller.view().await.items.len(), 2);
}
