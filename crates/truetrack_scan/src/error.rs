//! Error taxonomy for scan sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::session::SessionState;

/// Session-scoped failure code recorded on a closed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionDenied,
    DeviceUnavailable,
    InvalidPayload,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::DeviceUnavailable => "device_unavailable",
            ErrorKind::InvalidPayload => "invalid_payload",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Dismissible notice shown to the user.
    pub fn notice(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "Unable to access camera. Please check permissions.",
            ErrorKind::DeviceUnavailable => "Camera is unavailable or in use by another scan.",
            ErrorKind::InvalidPayload => "The scanned code is not a TrueTrack code.",
            ErrorKind::Unknown => "Something went wrong while scanning. Please try again.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a [`crate::CameraProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("camera error: {0}")]
    Unknown(String),
}

impl AcquireError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquireError::PermissionDenied => ErrorKind::PermissionDenied,
            AcquireError::DeviceUnavailable(_) => ErrorKind::DeviceUnavailable,
            AcquireError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

/// A single decode attempt failed. Scanning continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unreadable frame: {0}")]
    Frame(String),
    #[error("decoder fault: {0}")]
    Decoder(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },
}

impl VerifyError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        VerifyError::InvalidPayload {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::InvalidPayload { .. } => ErrorKind::InvalidPayload,
        }
    }
}

/// Misuse of the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("cannot {operation} a session that is {state}")]
    InvalidTransition {
        state: SessionState,
        operation: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_errors_map_to_kinds() {
        assert_eq!(AcquireError::PermissionDenied.kind(), ErrorKind::PermissionDenied);
        assert_eq!(
            AcquireError::DeviceUnavailable("busy".into()).kind(),
            ErrorKind::DeviceUnavailable
        );
        assert_eq!(AcquireError::Unknown("?".into()).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn invalid_transition_names_state_and_operation() {
        let err = ScanError::InvalidTransition {
            state: SessionState::Active,
            operation: "start",
        };
        assert_eq!(err.to_string(), "cannot start a session that is active");
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::PermissionDenied).unwrap();
        assert_eq!(json, "\"permission_denied\"");
    }
}
