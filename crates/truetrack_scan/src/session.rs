//! Scan session controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, info, warn};
use truetrack_ids::SessionId;

use crate::camera::{CameraGate, CameraHandle, CameraProvider, FacingMode};
use crate::decode::{DecodeAdapter, DecodeItem, DecodeStream, StopSignal};
use crate::error::{ErrorKind, ScanError};
use crate::verify::DecodedPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Acquiring,
    Active,
    Resulted,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Acquiring => "acquiring",
            SessionState::Active => "active",
            SessionState::Resulted => "resulted",
            SessionState::Closed => "closed",
        }
    }

    /// States in which the session owns the camera.
    pub fn holds_camera(&self) -> bool {
        matches!(self, SessionState::Acquiring | SessionState::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle notifications delivered to a [`SessionObserver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Started { facing: FacingMode },
    CameraAcquired { device: String },
    CameraReleased,
    DecodeFailed { reason: String },
    DecodeIgnored,
    Decoded { payload: DecodedPayload },
    Closed { error: Option<ErrorKind> },
    Dismissed,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Started { .. } => "started",
            SessionEvent::CameraAcquired { .. } => "camera_acquired",
            SessionEvent::CameraReleased => "camera_released",
            SessionEvent::DecodeFailed { .. } => "decode_failed",
            SessionEvent::DecodeIgnored => "decode_ignored",
            SessionEvent::Decoded { .. } => "decoded",
            SessionEvent::Closed { .. } => "closed",
            SessionEvent::Dismissed => "dismissed",
        }
    }
}

pub trait SessionObserver: Send + Sync {
    fn on_event(&self, session: &SessionId, event: &SessionEvent);
}

/// Everything a session needs from its surroundings. Cheap to clone; every
/// session created from one context shares its camera gate.
#[derive(Clone)]
pub struct ScanContext {
    camera: Arc<dyn CameraProvider>,
    decoder: Arc<dyn DecodeAdapter>,
    gate: CameraGate,
    facing: FacingMode,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl ScanContext {
    pub fn new(camera: Arc<dyn CameraProvider>, decoder: Arc<dyn DecodeAdapter>) -> Self {
        Self {
            camera,
            decoder,
            gate: CameraGate::new(),
            facing: FacingMode::default(),
            observer: None,
        }
    }

    pub fn with_gate(mut self, gate: CameraGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn gate(&self) -> &CameraGate {
        &self.gate
    }

    pub fn session(&self) -> ScanSession {
        ScanSession::new(self.clone())
    }
}

impl fmt::Debug for ScanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanContext")
            .field("gate", &self.gate)
            .field("facing", &self.facing)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

/// Where decode attempts come from while `Active`.
enum DecodeSource {
    None,
    Stream(DecodeStream),
    Feed {
        rx: mpsc::UnboundedReceiver<DecodeItem>,
        stop: StopSignal,
    },
}

impl DecodeSource {
    fn stop(&mut self) {
        match std::mem::replace(self, DecodeSource::None) {
            DecodeSource::None => {}
            DecodeSource::Stream(stream) => stream.stop(),
            DecodeSource::Feed { stop, .. } => {
                stop.stop();
            }
        }
    }

    fn is_attached(&self) -> bool {
        !matches!(self, DecodeSource::None)
    }
}

/// One attempt to scan and verify a single code.
///
/// Invariant: the camera (or the gate claim for a pending acquisition) is held
/// exactly while the state is `Acquiring` or `Active`. Every path out of those
/// states, including drop, releases it.
pub struct ScanSession {
    id: SessionId,
    ctx: ScanContext,
    state: SessionState,
    payload: Option<DecodedPayload>,
    error: Option<ErrorKind>,
    claim: Option<OwnedSemaphorePermit>,
    camera: Option<CameraHandle>,
    decode: DecodeSource,
}

impl ScanSession {
    pub fn new(ctx: ScanContext) -> Self {
        Self {
            id: SessionId::new(),
            ctx,
            state: SessionState::Idle,
            payload: None,
            error: None,
            claim: None,
            camera: None,
            decode: DecodeSource::None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn payload(&self) -> Option<&DecodedPayload> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    pub fn holds_camera(&self) -> bool {
        self.claim.is_some() || self.camera.is_some()
    }

    /// Request the camera and begin decoding.
    ///
    /// Only valid from `Idle`. Camera failures are not errors of this call:
    /// they leave the session `Closed` with [`ScanSession::error`] set.
    pub async fn start(&mut self) -> Result<SessionState, ScanError> {
        if self.state != SessionState::Idle {
            return Err(ScanError::InvalidTransition {
                state: self.state,
                operation: "start",
            });
        }
        self.payload = None;
        self.error = None;

        let Some(claim) = self.ctx.gate.try_claim() else {
            warn!(session_id = %self.id, "camera is held by another session");
            self.finish(Some(ErrorKind::DeviceUnavailable));
            return Ok(self.state);
        };
        self.claim = Some(claim);
        self.transition(SessionState::Acquiring);
        self.emit(SessionEvent::Started {
            facing: self.ctx.facing,
        });

        match self.ctx.camera.acquire(self.ctx.facing).await {
            Ok(stream) => {
                let handle = CameraHandle::new(stream, self.claim.take());
                let source = handle.frame_source().clone();
                info!(session_id = %self.id, device = %source.device, facing = %source.facing, "camera acquired");
                self.emit(SessionEvent::CameraAcquired {
                    device: source.device.clone(),
                });
                self.camera = Some(handle);
                self.decode = DecodeSource::Stream(self.ctx.decoder.attach(&source));
                self.transition(SessionState::Active);
            }
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "camera acquisition failed");
                self.claim = None;
                self.finish(Some(err.kind()));
            }
        }
        Ok(self.state)
    }

    /// First successful decode. Stops decoding, releases the camera and moves
    /// to `Resulted`. Returns `false` if the session already left `Active`,
    /// in which case the payload is discarded.
    pub fn on_decoded(&mut self, payload: DecodedPayload) -> bool {
        if self.state != SessionState::Active {
            debug!(session_id = %self.id, state = %self.state, "discarding late decode");
            self.emit(SessionEvent::DecodeIgnored);
            return false;
        }
        self.decode.stop();
        self.release_camera();
        info!(session_id = %self.id, payload_len = payload.as_str().len(), "code decoded");
        self.emit(SessionEvent::Decoded {
            payload: payload.clone(),
        });
        self.payload = Some(payload);
        self.transition(SessionState::Resulted);
        true
    }

    /// Apply one decode attempt. Misses and decoder errors keep scanning.
    pub fn handle_decode(&mut self, item: DecodeItem) -> SessionState {
        match item {
            Ok(event) => {
                if let Some(text) = event.payload() {
                    self.on_decoded(DecodedPayload::new(text));
                } else if event.found {
                    warn!(session_id = %self.id, "decoder reported a code without text");
                }
            }
            Err(err) => {
                if self.state == SessionState::Active {
                    warn!(session_id = %self.id, error = %err, "decode attempt failed; still scanning");
                    self.emit(SessionEvent::DecodeFailed {
                        reason: err.to_string(),
                    });
                }
            }
        }
        self.state
    }

    /// The decode stream ended on its own: the device went away.
    pub fn on_stream_closed(&mut self) -> SessionState {
        if self.state == SessionState::Active {
            warn!(session_id = %self.id, "decode stream closed while scanning");
            self.finish(Some(ErrorKind::DeviceUnavailable));
        }
        self.state
    }

    /// Scan until the session leaves `Active`.
    pub async fn drive(&mut self) -> SessionState {
        while self.state == SessionState::Active {
            let next = match &mut self.decode {
                DecodeSource::Stream(stream) => stream.next().await,
                DecodeSource::Feed { rx, .. } => rx.recv().await,
                DecodeSource::None => None,
            };
            match next {
                Some(item) => {
                    self.handle_decode(item);
                }
                None => {
                    self.on_stream_closed();
                }
            }
        }
        self.state
    }

    /// Move decoding onto a background task so an event loop can drain it
    /// with [`ScanSession::pump`] instead of awaiting [`ScanSession::drive`].
    ///
    /// Calling it again once the stream is forwarded leaves the feed alone.
    pub fn forward_decodes(&mut self) {
        if !matches!(self.decode, DecodeSource::Stream(_)) {
            return;
        }
        if let DecodeSource::Stream(stream) =
            std::mem::replace(&mut self.decode, DecodeSource::None)
        {
            let stop = stream.stop_signal();
            let rx = stream.forward();
            self.decode = DecodeSource::Feed { rx, stop };
        }
    }

    /// Apply every decode attempt already delivered by the forwarded stream.
    /// Never waits.
    pub fn pump(&mut self) -> SessionState {
        while self.state == SessionState::Active {
            let DecodeSource::Feed { rx, .. } = &mut self.decode else {
                break;
            };
            match rx.try_recv() {
                Ok(item) => {
                    self.handle_decode(item);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.on_stream_closed();
                }
            }
        }
        self.state
    }

    /// Stop scanning and release the camera from any state.
    ///
    /// `Idle` and `Closed` are left untouched, so closing twice releases once.
    pub fn close(&mut self) -> SessionState {
        match self.state {
            SessionState::Idle | SessionState::Closed => {}
            SessionState::Acquiring | SessionState::Active | SessionState::Resulted => {
                self.finish(self.error);
            }
        }
        self.state
    }

    /// Acknowledge a result or notice and return to `Idle`.
    pub fn dismiss(&mut self) -> Result<SessionState, ScanError> {
        match self.state {
            SessionState::Idle => Ok(self.state),
            SessionState::Resulted | SessionState::Closed => {
                self.payload = None;
                self.error = None;
                self.emit(SessionEvent::Dismissed);
                self.transition(SessionState::Idle);
                Ok(self.state)
            }
            SessionState::Acquiring | SessionState::Active => Err(ScanError::InvalidTransition {
                state: self.state,
                operation: "dismiss",
            }),
        }
    }

    /// Release everything without waiting for a result. Used when the owner
    /// goes away mid-scan; also runs on drop.
    pub fn teardown(&mut self) {
        if self.state.holds_camera() || self.holds_camera() || self.decode.is_attached() {
            debug!(session_id = %self.id, state = %self.state, "tearing down scan session");
            self.finish(self.error);
        }
    }

    fn finish(&mut self, error: Option<ErrorKind>) {
        self.decode.stop();
        self.release_camera();
        self.error = error;
        self.emit(SessionEvent::Closed { error });
        self.transition(SessionState::Closed);
    }

    fn release_camera(&mut self) {
        self.claim = None;
        if let Some(mut handle) = self.camera.take() {
            if handle.release() {
                info!(session_id = %self.id, "camera released");
                self.emit(SessionEvent::CameraReleased);
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(session_id = %self.id, from = %self.state, to = %next, "session transition");
            self.state = next;
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(observer) = &self.ctx.observer {
            observer.on_event(&self.id, &event);
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("payload", &self.payload)
            .field("error", &self.error)
            .field("holds_camera", &self.holds_camera())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SimulatedCamera;
    use crate::decode::{DecodeEvent, ManualDecoder, ScriptedDecoder};
    use crate::error::{AcquireError, DecodeError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<SessionEvent>>,
    }

    impl Recorder {
        fn names(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().iter().map(|e| e.name()).collect()
        }
    }

    impl SessionObserver for Recorder {
        fn on_event(&self, _session: &SessionId, event: &SessionEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn context(camera: &SimulatedCamera, decoder: impl DecodeAdapter + 'static) -> ScanContext {
        ScanContext::new(Arc::new(camera.clone()), Arc::new(decoder))
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let camera = SimulatedCamera::granting();
        let mut session = context(&camera, ScriptedDecoder::new(vec![])).session();
        assert_eq!(session.start().await.unwrap(), SessionState::Active);

        let err = session.start().await.unwrap_err();
        assert_eq!(
            err,
            ScanError::InvalidTransition {
                state: SessionState::Active,
                operation: "start"
            }
        );
        assert_eq!(camera.requests(), 1);
    }

    #[tokio::test]
    async fn decode_errors_do_not_end_the_session() {
        let camera = SimulatedCamera::granting();
        let decoder = ScriptedDecoder::new(vec![
            Err(DecodeError::Frame("blurred".into())),
            Ok(DecodeEvent::miss()),
            Ok(DecodeEvent::found("TT-1")),
        ]);
        let mut session = context(&camera, decoder).session();
        session.start().await.unwrap();

        assert_eq!(session.drive().await, SessionState::Resulted);
        assert_eq!(session.payload().map(|p| p.as_str()), Some("TT-1"));
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn stream_end_is_device_unavailable() {
        let camera = SimulatedCamera::granting();
        let decoder = ScriptedDecoder::new(vec![Ok(DecodeEvent::miss())]).ending();
        let mut session = context(&camera, decoder).session();
        session.start().await.unwrap();

        assert_eq!(session.drive().await, SessionState::Closed);
        assert_eq!(session.error(), Some(ErrorKind::DeviceUnavailable));
        assert_eq!(camera.held(), 0);
    }

    #[tokio::test]
    async fn dismiss_returns_to_idle_and_allows_restart() {
        let camera = SimulatedCamera::denying(AcquireError::PermissionDenied);
        let mut session = context(&camera, ScriptedDecoder::new(vec![])).session();
        session.start().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);

        assert_eq!(session.dismiss().unwrap(), SessionState::Idle);
        assert_eq!(session.error(), None);
        assert_eq!(session.start().await.unwrap(), SessionState::Closed);
        assert_eq!(camera.requests(), 2);
    }

    #[tokio::test]
    async fn dismiss_while_scanning_is_rejected() {
        let camera = SimulatedCamera::granting();
        let mut session = context(&camera, ScriptedDecoder::new(vec![])).session();
        session.start().await.unwrap();
        assert!(session.dismiss().is_err());
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn pump_applies_forwarded_decodes() {
        let camera = SimulatedCamera::granting();
        let decoder = ManualDecoder::new();
        let injector = decoder.injector();
        let mut session = context(&camera, decoder).session();
        session.start().await.unwrap();
        session.forward_decodes();

        assert_eq!(session.pump(), SessionState::Active);
        injector.present_code("TT-42");
        for _ in 0..50 {
            if session.pump() != SessionState::Active {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(session.state(), SessionState::Resulted);
        assert_eq!(session.payload().unwrap().as_str(), "TT-42");
        assert_eq!(camera.held(), 0);
    }

    #[tokio::test]
    async fn forwarding_on_every_tick_keeps_the_feed() {
        let camera = SimulatedCamera::granting();
        let decoder = ManualDecoder::new();
        let injector = decoder.injector();
        let mut session = context(&camera, decoder).session();
        session.start().await.unwrap();

        session.forward_decodes();
        assert_eq!(session.pump(), SessionState::Active);
        session.forward_decodes();
        injector.present_code("TT-43");
        for _ in 0..50 {
            session.forward_decodes();
            if session.pump() != SessionState::Active {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(session.state(), SessionState::Resulted);
        assert_eq!(session.payload().unwrap().as_str(), "TT-43");
        assert_eq!(camera.held(), 0);
    }

    #[tokio::test]
    async fn observer_sees_lifecycle_in_order() {
        let camera = SimulatedCamera::granting();
        let recorder = Arc::new(Recorder::default());
        let ctx = context(&camera, ScriptedDecoder::payloads(["TT-7"]))
            .with_observer(recorder.clone());
        let mut session = ctx.session();
        session.start().await.unwrap();
        session.drive().await;
        session.dismiss().unwrap();

        assert_eq!(
            recorder.names(),
            vec!["started", "camera_acquired", "camera_released", "decoded", "dismissed"]
        );
    }

    #[tokio::test]
    async fn late_decode_is_reported_as_ignored() {
        let camera = SimulatedCamera::granting();
        let recorder = Arc::new(Recorder::default());
        let ctx =
            context(&camera, ScriptedDecoder::new(vec![])).with_observer(recorder.clone());
        let mut session = ctx.session();
        session.start().await.unwrap();
        session.close();

        assert!(!session.on_decoded(DecodedPayload::new("TT-late")));
        assert_eq!(session.payload(), None);
        assert_eq!(recorder.names().last(), Some(&"decode_ignored"));
    }
}
