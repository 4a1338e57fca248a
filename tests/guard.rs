//! Route guard decisions against a live mock backend: silent recovery,
//! the one-shot redirect latch and the hard-navigation fallback.

mod common;

use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use authgate::{
    guard::{GuardOutcome, RouteGuard},
    navigator::RecordingNavigator,
};

#[tokio::test]
async fn authenticated_session_renders_without_network() {
    let h = common::harness().await;
    h.controller.login("some-token", common::admin_user());

    let guard = RouteGuard::protected(&h.controller);
    assert_eq!(guard.evaluate(&h.controller).await, GuardOutcome::Render);
    assert!(h.server.received_requests().await.expect("recording").is_empty());
}

#[tokio::test]
async fn redirect_fires_exactly_once_across_render_passes() {
    let h = common::harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    h.controller.initialize("/dashboard").await;

    let guard = RouteGuard::protected(&h.controller);
    for _ in 0..3 {
        assert_eq!(
            guard.evaluate(&h.controller).await,
            GuardOutcome::Redirect("/auth/login".to_owned())
        );
    }

    // Three render passes, one navigation.
    assert_eq!(h.navigator.navigations(), vec!["/auth/login"]);
    assert!(h.navigator.forced_navigations().is_empty());
}

#[tokio::test]
async fn silent_refresh_defers_the_redirect() {
    let h = common::harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": "fresh-token" })),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::profile_body("admin@example.com")),
        )
        .mount(&h.server)
        .await;

    // Loading has settled but the session never authenticated.
    h.controller.initialize("/auth/login").await;

    let guard = RouteGuard::protected(&h.controller);
    // The guard recovers a token instead of redirecting.
    assert_eq!(guard.evaluate(&h.controller).await, GuardOutcome::Loading);
    assert!(h.navigator.navigations().is_empty());

    // The next initialization pass picks the fresh token up.
    h.controller.initialize("/dashboard").await;
    assert_eq!(guard.evaluate(&h.controller).await, GuardOutcome::Render);
}

#[tokio::test]
async fn authenticated_visitor_leaves_public_routes() {
    let h = common::harness().await;
    h.controller.login("some-token", common::admin_user());

    let guard = RouteGuard::public(&h.controller);
    assert_eq!(
        guard.evaluate(&h.controller).await,
        GuardOutcome::Redirect("/dashboard".to_owned())
    );
    assert_eq!(h.navigator.navigations(), vec!["/dashboard"]);
}

#[tokio::test]
async fn unresponsive_router_falls_back_to_hard_navigation() {
    let h = common::harness_with(RecordingNavigator::unresponsive()).await;

    h.controller.initialize("/auth/login").await;
    // Suppression makes the silent refresh fail fast without a server.
    h.controller.session().set_suppressed(true);

    let guard = RouteGuard::protected(&h.controller);
    assert_eq!(
        guard.evaluate(&h.controller).await,
        GuardOutcome::Redirect("/auth/login".to_owned())
    );

    assert_eq!(h.navigator.navigations(), vec!["/auth/login"]);
    assert_eq!(h.navigator.forced_navigations(), vec!["/auth/login"]);
}

#[tokio::test]
async fn custom_redirect_target_is_honored() {
    let h = common::harness().await;

    h.controller.initialize("/auth/login").await;
    h.controller.session().set_suppressed(true);

    let guard = RouteGuard::new(&h.controller, true, Some("/auth/signin".to_owned()));
    assert_eq!(
        guard.evaluate(&h.controller).await,
        GuardOutcome::Redirect("/auth/signin".to_owned())
    );
    assert_eq!(h.navigator.navigations(), vec!["/auth/signin"]);
}
