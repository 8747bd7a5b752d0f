//! Scan-to-verification session flow.
//!
//! A [`ScanSession`] owns one attempt to scan and verify a code. It holds the
//! device camera exclusively while scanning and gives it back on every exit
//! path.
//!
//! ```text
//!            start()                grant               first decode
//!   ┌──────┐ ───────► ┌───────────┐ ─────► ┌────────┐ ─────────────► ┌──────────┐
//!   │ Idle │          │ Acquiring │        │ Active │                │ Resulted │
//!   └──────┘ ◄─┐      └─────┬─────┘        └───┬────┘                └────┬─────┘
//!              │            │ deny / busy      │ close() / stream ends     │ close()
//!              │            ▼                  ▼                           ▼
//!              │      ┌──────────────────────────────────────────────────────┐
//!              └──────┤                        Closed                        │
//!   dismiss()         └──────────────────────────────────────────────────────┘
//! ```
//!
//! The camera is held if and only if the session is `Acquiring` or `Active`.
//! Only one session per [`CameraGate`] may hold it at a time.
//!
//! Decoding and verification are capabilities supplied by the caller:
//! [`DecodeAdapter`] turns a frame source into a stream of decode attempts and
//! [`Verifier`] turns a decoded payload into a [`VerificationOutcome`].

pub mod camera;
pub mod decode;
pub mod error;
pub mod session;
pub mod verify;

pub use camera::{
    CameraGate, CameraHandle, CameraProvider, CameraStream, FacingMode, FrameSource,
    SimulatedCamera,
};
pub use decode::{
    simulated_payload, DecodeAdapter, DecodeEvent, DecodeInjector, DecodeItem, DecodeStream,
    ManualDecoder, ScriptedDecoder, SimulatedDecoder, StopSignal,
};
pub use error::{AcquireError, DecodeError, ErrorKind, ScanError, VerifyError};
pub use session::{ScanContext, ScanSession, SessionEvent, SessionObserver, SessionState};
pub use verify::{
    payload_checksum, sign_serial, CatalogVerifier, DecodedPayload, ProductMetadata,
    SingleUseVerifier, Verdict, VerificationOutcome, Verifier,
};
pub use truetrack_ids::SessionId;
