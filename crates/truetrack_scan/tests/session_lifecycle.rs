//! Lifecycle properties of `ScanSession` against a counting camera.

use std::sync::Arc;
use std::time::Duration;

use truetrack_scan::{
    AcquireError, DecodeEvent, ErrorKind, ManualDecoder, ScanContext, ScanSession,
    ScriptedDecoder, SessionState, SimulatedCamera, SimulatedDecoder,
};

fn scripted(camera: &SimulatedCamera, decoder: ScriptedDecoder) -> ScanContext {
    ScanContext::new(Arc::new(camera.clone()), Arc::new(decoder))
}

fn assert_handle_invariant(session: &ScanSession, camera: &SimulatedCamera) {
    let held = camera.held();
    assert!(held <= 1, "more than one stream outstanding: {}", held);
    if session.state().holds_camera() {
        assert!(session.holds_camera(), "{} without camera", session.state());
    } else {
        assert!(!session.holds_camera(), "{} still holds camera", session.state());
        assert_eq!(held, 0, "stream outstanding in {}", session.state());
    }
}

#[tokio::test]
async fn handle_held_only_while_acquiring_or_active() {
    let camera = SimulatedCamera::granting();
    let decoder = ManualDecoder::new();
    let injector = decoder.injector();
    let ctx = ScanContext::new(Arc::new(camera.clone()), Arc::new(decoder));
    let mut session = ctx.session();
    assert_handle_invariant(&session, &camera);

    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Active);
    assert_handle_invariant(&session, &camera);
    assert_eq!(camera.held(), 1);

    injector.present(Ok(DecodeEvent::miss()));
    injector.present_code("TT-123");
    session.drive().await;
    assert_eq!(session.state(), SessionState::Resulted);
    assert_handle_invariant(&session, &camera);

    session.close();
    assert_handle_invariant(&session, &camera);
    assert_eq!(camera.acquired() - camera.released(), 0);
}

#[tokio::test]
async fn close_from_idle_is_a_no_op() {
    let camera = SimulatedCamera::granting();
    let mut session = scripted(&camera, ScriptedDecoder::new(vec![])).session();

    assert_eq!(session.close(), SessionState::Idle);
    assert_eq!(session.error(), None);
    assert_eq!(camera.requests(), 0);
    assert_eq!(camera.released(), 0);
}

#[tokio::test]
async fn closing_twice_releases_once() {
    let camera = SimulatedCamera::granting();
    let mut session = scripted(&camera, ScriptedDecoder::new(vec![])).session();
    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Active);

    assert_eq!(session.close(), SessionState::Closed);
    assert_eq!(session.close(), SessionState::Closed);
    assert_eq!(camera.acquired(), 1);
    assert_eq!(camera.released(), 1);
}

#[tokio::test]
async fn only_first_decode_is_kept() {
    let camera = SimulatedCamera::granting();
    let ctx = scripted(&camera, ScriptedDecoder::payloads(["TT-123", "TT-456"]));
    let mut session = ctx.session();
    session.start().await.unwrap();

    assert_eq!(session.drive().await, SessionState::Resulted);
    assert_eq!(session.payload().unwrap().as_str(), "TT-123");
    assert_eq!(camera.held(), 0);
}

#[tokio::test]
async fn permission_denied_never_reaches_active() {
    let camera = SimulatedCamera::denying(AcquireError::PermissionDenied)
        .with_latency(Duration::from_millis(5));
    let mut session = scripted(&camera, ScriptedDecoder::payloads(["TT-1"])).session();

    assert_eq!(session.start().await.unwrap(), SessionState::Closed);
    assert_eq!(session.error(), Some(ErrorKind::PermissionDenied));
    assert_eq!(session.payload(), None);
    assert!(!session.holds_camera());
    assert_eq!(camera.acquired(), 0);
}

#[tokio::test]
async fn teardown_while_active_releases_exactly_once() {
    let camera = SimulatedCamera::granting();
    let mut session = scripted(&camera, ScriptedDecoder::new(vec![])).session();
    session.start().await.unwrap();
    assert_eq!(camera.held(), 1);

    session.teardown();
    drop(session);
    assert_eq!(camera.acquired(), 1);
    assert_eq!(camera.released(), 1);
}

#[tokio::test]
async fn dropping_an_active_session_releases_camera() {
    let camera = SimulatedCamera::granting();
    let ctx = ScanContext::new(
        Arc::new(camera.clone()),
        Arc::new(SimulatedDecoder::new(Duration::from_millis(10), 1_000)),
    );
    {
        let mut session = ctx.session();
        session.start().await.unwrap();
        assert_eq!(camera.held(), 1);
    }
    assert_eq!(camera.released(), 1);
    assert!(ctx.gate().is_free());
}

#[tokio::test]
async fn second_session_cannot_start_while_camera_is_held() {
    let camera = SimulatedCamera::granting();
    let ctx = scripted(&camera, ScriptedDecoder::new(vec![]));
    let mut first = ctx.session();
    let mut second = ctx.session();

    first.start().await.unwrap();
    assert_eq!(second.start().await.unwrap(), SessionState::Closed);
    assert_eq!(second.error(), Some(ErrorKind::DeviceUnavailable));
    assert_eq!(camera.requests(), 1);

    first.close();
    second.dismiss().unwrap();
    assert_eq!(second.start().await.unwrap(), SessionState::Active);
    assert_eq!(camera.held(), 1);
}

#[tokio::test]
async fn unplugged_camera_closes_with_device_unavailable() {
    let camera = SimulatedCamera::granting();
    let decoder = ManualDecoder::new();
    let injector = decoder.injector();
    let ctx = ScanContext::new(Arc::new(camera.clone()), Arc::new(decoder));
    let mut session = ctx.session();
    session.start().await.unwrap();

    injector.disconnect();
    assert_eq!(session.drive().await, SessionState::Closed);
    assert_eq!(session.error(), Some(ErrorKind::DeviceUnavailable));
    assert_eq!(camera.held(), 0);
}

#[tokio::test(start_paused = true)]
async fn simulated_decoder_yields_a_verifiable_code() {
    use truetrack_scan::{CatalogVerifier, ProductMetadata, Verdict, Verifier};

    let camera = SimulatedCamera::granting();
    let ctx = ScanContext::new(
        Arc::new(camera.clone()),
        Arc::new(SimulatedDecoder::new(Duration::from_millis(150), 3)),
    );
    let mut session = ctx.session();
    session.start().await.unwrap();
    assert_eq!(session.drive().await, SessionState::Resulted);

    let verifier = CatalogVerifier::new(ProductMetadata {
        product_id: String::new(),
        name: "Medicine Sample".into(),
        manufacturer: "Unknown".into(),
        batch_number: "B0".into(),
        expiry_date: "2026-12-31".into(),
        purchase_location: "Current Store".into(),
        scan_location: "Current Store".into(),
    });
    let outcome = verifier.verify(session.payload().unwrap()).unwrap();
    assert_eq!(outcome.verdict, Verdict::Genuine);
}
