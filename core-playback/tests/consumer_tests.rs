//! Tests for `PlaybackConsumer`: several widgets sharing one controller.

mod common;

use common::{controller, FakeBackend, PlayMode};
use core_playback::TrackView;

#[tokio::test]
async fn test_only_one_consumer_is_active() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);

    let wren = controller.consumer("rec-wren", "https://x/wren.mp3", Some("Wren".to_string()));
    let robin = controller.consumer("rec-robin", "https://x/robin.mp3", None);

    assert_eq!(wren.view(), TrackView::Inactive);
    assert_eq!(robin.view(), TrackView::Inactive);

    assert!(wren.toggle().await);
    assert!(wren.is_active());
    assert!(wren.is_playing());
    assert_eq!(wren.view(), TrackView::Playing);
    assert!(!robin.is_active());
    assert!(!robin.is_playing());
    assert_eq!(controller.state().track_title.as_deref(), Some("Wren"));

    assert!(robin.toggle().await);
    assert_eq!(wren.view(), TrackView::Inactive);
    assert_eq!(robin.view(), TrackView::Playing);
    assert_eq!(backend.live_count(), 1);
}

#[tokio::test]
async fn test_toggle_pauses_own_track() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);
    let wren = controller.consumer("rec-wren", "https://x/wren.mp3", None);

    assert!(wren.toggle().await);
    assert!(!wren.toggle().await);
    assert_eq!(wren.view(), TrackView::Paused);
    assert!(wren.is_active());
    assert!(!wren.is_playing());
}

#[tokio::test]
async fn test_stop_ignored_for_inactive_track() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);
    let wren = controller.consumer("rec-wren", "https://x/wren.mp3", None);
    let robin = controller.consumer("rec-robin", "https://x/robin.mp3", None);

    assert!(wren.toggle().await);

    robin.stop();
    assert_eq!(wren.view(), TrackView::Playing);

    wren.stop();
    assert_eq!(wren.view(), TrackView::Inactive);
    assert!(controller.state().is_idle());
}

#[tokio::test]
async fn test_views_follow_controller_without_shadow_state() {
    let backend = FakeBackend::new();
    backend.set_mode("https://x/wren.mp3", PlayMode::Gated { duration: 20.0 });
    let controller = controller(&backend);

    let mut wren = controller.consumer("rec-wren", "https://x/wren.mp3", None);
    let observer = wren.clone();

    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.request("rec-wren", "https://x/wren.mp3", None).await })
    };

    wren.changed().await;
    assert_eq!(wren.view(), TrackView::Loading);
    assert!(observer.is_loading());
    assert!(!observer.is_playing());

    backend.last().open_gate();
    assert!(pending.await.unwrap());

    assert_eq!(wren.view(), TrackView::Playing);
    assert_eq!(observer.view(), TrackView::Playing);
    assert_eq!(wren.state().duration, 20.0);

    // A stop issued elsewhere is visible to every consumer.
    controller.stop();
    assert_eq!(observer.view(), TrackView::Inactive);
}

#[tokio::test]
async fn test_failed_toggle_reports_error() {
    let backend = FakeBackend::new();
    let controller = controller(&backend);
    let broken = controller.consumer("rec-broken", "bad-uri", None);

    assert!(!broken.toggle().await);
    assert_eq!(broken.view(), TrackView::Inactive);
    assert!(broken.state().error.is_some());
}
