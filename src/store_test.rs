use std::time::Duration;

use serde_json::Map;

use super::*;

fn plot(id: &str) -> Plot {
    Plot { id: id.into(), name: format!("plot {id}"), points: Vec::new(), owner_ref: None, attributes: Map::new() }
}

#[test]
fn starts_ready_with_no_plots_or_user() {
    let store = AppStore::new();
    assert_eq!(store.status(), INITIAL_STATUS);
    assert!(store.plots().is_empty());
    assert!(store.current_user().is_none());
}

#[test]
fn push_plot_keeps_order_and_notifies() {
    let store = AppStore::new();
    let mut rx = store.subscribe_plots();
    store.set_plots(vec![plot("PL0001")]);
    store.push_plot(plot("PL0002"));

    assert!(rx.has_changed().unwrap());
    let ids: Vec<String> = rx.borrow_and_update().iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, vec!["PL0001", "PL0002"]);
}

#[test]
fn clones_share_state() {
    let store = AppStore::new();
    let other = store.clone();
    other.set_current_user(Some(UserRef { id: "u1".into(), username: "ama".into(), phone: None }));
    assert_eq!(store.current_user().unwrap().username, "ama");
}

#[test]
fn status_outside_runtime_is_set_without_reset() {
    let store = AppStore::new();
    assert!(store.set_status("Offline", Duration::from_millis(1)).is_none());
    assert_eq!(store.status(), "Offline");
}

#[test]
fn writes_succeed_without_subscribers() {
    let store = AppStore::new();
    store.set_plots(vec![plot("a")]);
    store.set_current_user(None);
    assert_eq!(store.plots().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn status_clears_after_duration() {
    let store = AppStore::new();
    store.set_status("Saved", Duration::from_millis(100));
    assert_eq!(store.status(), "Saved");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(store.status(), "");
}

#[tokio::test(start_paused = true)]
async fn status_persists_until_duration_elapses() {
    let store = AppStore::new();
    store.set_status("Saved", Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.status(), "Saved");
}

#[tokio::test(start_paused = true)]
async fn rapid_messages_each_timer_only_clears_its_own() {
    let store = AppStore::new();
    store.set_status("Saved", Duration::from_millis(100));
    store.set_status("Saving…", Duration::from_millis(100));
    assert_eq!(store.status(), "Saving…");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(store.status(), "");
}

#[tokio::test(start_paused = true)]
async fn older_timer_does_not_clobber_newer_message() {
    let store = AppStore::new();
    store.set_status("Saved", Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.set_status("Loaded 3 plots", Duration::from_millis(1000));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.status(), "Loaded 3 plots");

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(store.status(), "");
}

#[tokio::test(start_paused = true)]
async fn same_message_reset_clears_at_first_timer() {
    let store = AppStore::new();
    let first = store.set_status("Saved", Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(60)).await;
    store.set_status("Saved", Duration::from_millis(100));

    first.unwrap().await.unwrap();
    assert_eq!(store.status(), "");
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_set_and_clear() {
    let store = AppStore::new();
    let mut rx = store.subscribe_status();
    let handle = store.set_status("Saved", Duration::from_millis(10));

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), "Saved");

    handle.unwrap().await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), "");
}

#[tokio::test(start_paused = true)]
async fn flash_status_uses_default_duration() {
    let store = AppStore::new();
    store.flash_status("Hello");
    tokio::time::sleep(DEFAULT_STATUS_DURATION - Duration::from_millis(1)).await;
    assert_eq!(store.status(), "Hello");
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(store.status(), "");
}
