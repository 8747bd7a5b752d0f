//! Scan context wiring shared by the CLI and the TUI.

use std::sync::Arc;
use truetrack_scan::{
    AcquireError, DecodeAdapter, ScanContext, SessionObserver, SimulatedCamera, SimulatedDecoder,
};

use crate::config::Settings;

/// Camera as configured: granting, or denying every request the way a user
/// refusing the permission prompt would.
pub fn simulated_camera(settings: &Settings) -> SimulatedCamera {
    if settings.camera.deny_permission {
        SimulatedCamera::denying(AcquireError::PermissionDenied)
    } else {
        SimulatedCamera::granting()
    }
}

pub fn simulated_decoder(settings: &Settings) -> SimulatedDecoder {
    SimulatedDecoder::new(
        settings.scan.frame_interval(),
        settings.scan.frames_before_decode,
    )
}

pub fn build_context(
    settings: &Settings,
    decoder: Arc<dyn DecodeAdapter>,
    observer: Option<Arc<dyn SessionObserver>>,
) -> ScanContext {
    let ctx = ScanContext::new(Arc::new(simulated_camera(settings)), decoder)
        .with_facing(settings.scan.facing);
    match observer {
        Some(observer) => ctx.with_observer(observer),
        None => ctx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use truetrack_scan::{ErrorKind, ScriptedDecoder, SessionState};

    #[tokio::test]
    async fn denied_permission_closes_the_session() {
        let mut settings = Settings::default();
        settings.camera.deny_permission = true;
        let ctx = build_context(&settings, Arc::new(ScriptedDecoder::payloads(["TT-1"])), None);

        let mut session = ctx.session();
        assert_eq!(session.start().await.unwrap(), SessionState::Closed);
        assert_eq!(session.error(), Some(ErrorKind::PermissionDenied));
    }

    #[tokio::test]
    async fn granted_camera_scans_scripted_code() {
        let ctx = build_context(
            &Settings::default(),
            Arc::new(ScriptedDecoder::payloads(["TT-12345"])),
            None,
        );
        let mut session = ctx.session();
        session.start().await.unwrap();
        assert_eq!(session.drive().await, SessionState::Resulted);
        assert_eq!(session.payload().unwrap().as_str(), "TT-12345");
    }
}
