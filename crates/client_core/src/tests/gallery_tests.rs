use std::time::Duration;

use super::*;
use crate::test_support::{image, logged_in, logged_out, Call, FakeApi};

async fn view_with(count: usize) -> (Arc<FakeApi>, GalleryView) {
    let listing = (0..count)
        .map(|i| image(&format!("img-{i}"), i as u64))
        .collect();
    let api = FakeApi::new(listing);
    let session = logged_in(Arc::clone(&api)).await;
    let view = GalleryView::new(api.clone(), session, &ClientSettings::default());
    view.load_featured().await.expect("load");
    (api, view)
}

fn id(i: usize) -> ImageId {
    ImageId::new(format!("img-{i}"))
}

#[test]
fn lightbox_wraps_in_both_directions() {
    let mut lightbox = Lightbox::default();
    lightbox.reset(vec![id(0), id(1), id(2)]);

    assert_eq!(lightbox.next(), None);
    assert_eq!(lightbox.open_at(2), Some(&id(2)));
    assert_eq!(lightbox.next(), Some(0));
    assert_eq!(lightbox.previous(), Some(2));
    assert_eq!(lightbox.previous(), Some(1));
    assert_eq!(lightbox.counter().as_deref(), Some("2 / 3"));

    assert!(lightbox.close());
    assert!(!lightbox.close());
    assert_eq!(lightbox.open_at(3), None);
    assert_eq!(lightbox.counter(), None);
}

#[tokio::test(start_paused = true)]
async fn single_tap_opens_lightbox_after_window() {
    let (_api, view) = view_with(3).await;
    let mut events = view.subscribe_events();

    assert!(matches!(
        view.interact(&id(1), 50_000).await,
        Interaction::PendingOpen
    ));
    assert!(!view.lightbox().is_open());

    tokio::time::sleep(Duration::from_millis(301)).await;
    assert_eq!(view.lightbox().selected_index(), Some(1));
    assert_eq!(
        events.recv().await.expect("event"),
        GalleryEvent::LightboxOpened {
            index: 1,
            item_id: id(1)
        }
    );
}

#[tokio::test(start_paused = true)]
async fn double_tap_likes_without_opening() {
    let (api, view) = view_with(3).await;
    let target = id(2);

    view.interact(&target, 50_000).await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    let outcome = match view.interact(&target, 50_250).await {
        Interaction::Liked(outcome) => outcome.expect("like"),
        other => panic!("expected like, got {other:?}"),
    };
    assert_eq!(outcome, LikeOutcome::Liked { likes_count: 3 });
    assert!(view.burst_active(&target));
    assert_eq!(api.calls().await, vec![Call::Like(target.clone())]);

    tokio::time::sleep(Duration::from_millis(1001)).await;
    assert!(!view.lightbox().is_open());
    assert!(!view.burst_active(&target));
}

#[tokio::test(start_paused = true)]
async fn double_tap_on_liked_image_unlikes_it() {
    let (api, view) = view_with(2).await;
    let target = id(1);
    view.toggle_like(&target).await.expect("like");

    view.interact(&target, 50_000).await;
    let outcome = match view.interact(&target, 50_100).await {
        Interaction::Liked(outcome) => outcome.expect("unlike"),
        other => panic!("expected like toggle, got {other:?}"),
    };
    assert_eq!(outcome, LikeOutcome::Unliked { likes_count: 1 });
    assert_eq!(
        api.calls().await,
        vec![Call::Like(target.clone()), Call::Unlike(target.clone())]
    );
}

#[tokio::test]
async fn keys_drive_the_open_lightbox() {
    let (api, view) = view_with(3).await;

    assert!(matches!(
        view.handle_key(LightboxKey::ArrowRight).await,
        KeyOutcome::Ignored
    ));

    assert!(view.open_at(0).await);
    assert!(matches!(
        view.handle_key(LightboxKey::ArrowLeft).await,
        KeyOutcome::Moved { index: 2 }
    ));
    assert!(matches!(
        view.handle_key(LightboxKey::ArrowRight).await,
        KeyOutcome::Moved { index: 0 }
    ));

    match view.handle_key(LightboxKey::Char('L')).await {
        KeyOutcome::Like(Ok(LikeOutcome::Liked { likes_count })) => assert_eq!(likes_count, 1),
        other => panic!("expected like, got {other:?}"),
    }
    assert_eq!(api.calls().await, vec![Call::Like(id(0))]);

    assert!(matches!(
        view.handle_key(LightboxKey::Char('x')).await,
        KeyOutcome::Ignored
    ));
    assert!(matches!(
        view.handle_key(LightboxKey::Escape).await,
        KeyOutcome::Closed
    ));
    assert!(!view.lightbox().is_open());
}

#[tokio::test]
async fn double_click_in_lightbox_toggles_with_burst() {
    let (_api, view) = view_with(2).await;
    assert!(view.double_click_selected().await.is_none());

    view.open_at(1).await;
    let outcome = view
        .double_click_selected()
        .await
        .expect("selected")
        .expect("like");
    assert_eq!(outcome, LikeOutcome::Liked { likes_count: 2 });
    assert!(view.burst_active(&id(1)));
}

#[tokio::test]
async fn anonymous_double_tap_requires_login() {
    let api = FakeApi::new(vec![image("img-0", 4)]);
    let session = logged_out(Arc::clone(&api));
    let view = GalleryView::new(api.clone(), session, &ClientSettings::default());
    view.load_featured().await.expect("load");
    let mut events = view.subscribe_events();

    view.interact(&id(0), 50_000).await;
    match view.interact(&id(0), 50_100).await {
        Interaction::Liked(Err(LikeError::Unauthenticated)) => {}
        other => panic!("expected login requirement, got {other:?}"),
    }

    let mut saw_login_required = false;
    while let Ok(event) = events.try_recv() {
        saw_login_required |= event == GalleryEvent::LoginRequired;
    }
    assert!(saw_login_required);
    assert_eq!(view.items().await[0].likes_count(), 4);
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn reload_replaces_listing_and_closes_lightbox() {
    let (api, view) = view_with(3).await;
    view.open_at(2).await;

    api.listing.lock().await.truncate(1);
    assert_eq!(view.load_featured().await.expect("reload"), 1);
    assert!(!view.lightbox().is_open());
    assert_eq!(view.items().await.len(), 1);
}

#[tokio::test]
async fn artist_listing_filters_by_username() {
    let (api, view) = view_with(2).await;
    let mut other = image("other-1", 3);
    other.artist_username = "jun".to_string();
    api.listing.lock().await.push(other);

    assert_eq!(view.load_artist("jun").await.expect("load"), 1);
    assert_eq!(view.items().await[0].id(), &ImageId::new("other-1"));
}
