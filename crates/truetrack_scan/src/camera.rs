//! Camera acquisition and exclusive ownership.
//!
//! A [`CameraProvider`] hands out live streams. Exclusive use across sessions
//! is enforced by a [`CameraGate`], a single-permit semaphore: a session
//! claims the permit before asking the provider for a stream and gives it
//! back when its [`CameraHandle`] is released.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::AcquireError;

/// Which camera to prefer. Scanning a label wants the rear camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    Environment,
    User,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque description of a live video feed, passed to decode adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSource {
    pub device: String,
    pub facing: FacingMode,
}

/// A live camera stream. `stop` ends every track of the stream.
pub trait CameraStream: Send {
    fn frame_source(&self) -> FrameSource;

    fn stop(&mut self);
}

#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn CameraStream>, AcquireError>;
}

/// Mutual exclusion on the physical camera across sessions.
#[derive(Debug, Clone)]
pub struct CameraGate {
    permit: Arc<Semaphore>,
}

impl CameraGate {
    pub fn new() -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Claim the camera, or `None` when another session holds it.
    pub fn try_claim(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.permit).try_acquire_owned().ok()
    }

    pub fn is_free(&self) -> bool {
        self.permit.available_permits() > 0
    }
}

impl Default for CameraGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned camera stream plus its gate claim.
///
/// Releasing stops the stream and frees the gate. Release happens at most once,
/// either explicitly or when the handle is dropped.
pub struct CameraHandle {
    stream: Option<Box<dyn CameraStream>>,
    source: FrameSource,
    claim: Option<OwnedSemaphorePermit>,
}

impl CameraHandle {
    pub fn new(stream: Box<dyn CameraStream>, claim: Option<OwnedSemaphorePermit>) -> Self {
        let source = stream.frame_source();
        Self {
            stream: Some(stream),
            source,
            claim,
        }
    }

    pub fn frame_source(&self) -> &FrameSource {
        &self.source
    }

    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    /// Stop the stream and free the gate. Returns `true` only for the call
    /// that actually released.
    pub fn release(&mut self) -> bool {
        let released = match self.stream.take() {
            Some(mut stream) => {
                stream.stop();
                true
            }
            None => false,
        };
        self.claim = None;
        released
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for CameraHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraHandle")
            .field("source", &self.source)
            .field("released", &self.is_released())
            .finish()
    }
}

#[derive(Debug, Default)]
struct CameraCounters {
    requests: AtomicUsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// In-process camera used by the demo and by tests.
///
/// Grants or denies every request according to its configuration and counts
/// requests, granted streams and stopped streams. Clones share counters.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    denial: Option<AcquireError>,
    latency: Duration,
    device: String,
    counters: Arc<CameraCounters>,
}

impl SimulatedCamera {
    pub fn granting() -> Self {
        Self {
            denial: None,
            latency: Duration::ZERO,
            device: "simulated-camera-0".to_string(),
            counters: Arc::default(),
        }
    }

    pub fn denying(error: AcquireError) -> Self {
        Self {
            denial: Some(error),
            ..Self::granting()
        }
    }

    /// Delay each acquisition, like a permission prompt would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn requests(&self) -> usize {
        self.counters.requests.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Streams handed out and not yet stopped.
    pub fn held(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }
}

#[async_trait]
impl CameraProvider for SimulatedCamera {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn CameraStream>, AcquireError> {
        self.counters.requests.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(error) = &self.denial {
            return Err(error.clone());
        }
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedStream {
            source: FrameSource {
                device: self.device.clone(),
                facing,
            },
            counters: Arc::clone(&self.counters),
            stopped: false,
        }))
    }
}

struct SimulatedStream {
    source: FrameSource,
    counters: Arc<CameraCounters>,
    stopped: bool,
}

impl CameraStream for SimulatedStream {
    fn frame_source(&self) -> FrameSource {
        self.source.clone()
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_allows_one_claim_at_a_time() {
        let gate = CameraGate::new();
        let first = gate.try_claim();
        assert!(first.is_some());
        assert!(gate.try_claim().is_none());
        assert!(!gate.is_free());

        drop(first);
        assert!(gate.is_free());
        assert!(gate.try_claim().is_some());
    }

    #[tokio::test]
    async fn handle_release_is_idempotent() {
        let camera = SimulatedCamera::granting();
        let gate = CameraGate::new();
        let stream = camera.acquire(FacingMode::Environment).await.unwrap();
        let mut handle = CameraHandle::new(stream, gate.try_claim());

        assert_eq!(handle.frame_source().facing, FacingMode::Environment);
        assert!(handle.release());
        assert!(!handle.release());
        drop(handle);

        assert_eq!(camera.acquired(), 1);
        assert_eq!(camera.released(), 1);
        assert!(gate.is_free());
    }

    #[tokio::test]
    async fn dropping_handle_releases_camera() {
        let camera = SimulatedCamera::granting();
        let stream = camera.acquire(FacingMode::User).await.unwrap();
        let handle = CameraHandle::new(stream, None);
        assert_eq!(camera.held(), 1);

        drop(handle);
        assert_eq!(camera.held(), 0);
    }

    #[tokio::test]
    async fn denying_camera_counts_request_but_no_stream() {
        let camera = SimulatedCamera::denying(AcquireError::PermissionDenied);
        let result = camera.acquire(FacingMode::Environment).await;

        assert!(matches!(result, Err(AcquireError::PermissionDenied)));
        assert_eq!(camera.requests(), 1);
        assert_eq!(camera.acquired(), 0);
    }
}
