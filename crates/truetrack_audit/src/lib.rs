//! Append-only audit trail for scan sessions.
//!
//! Every record is one JSON object per line (NDJSON) wrapped in an
//! [`AuditRecord`] envelope with a schema version, a UUID, a strictly
//! increasing sequence number and a UTC timestamp.
//!
//! Decoded payloads are never written. They are replaced by a BLAKE3 digest
//! keyed with a per-trail salt, so two records of the same code can be
//! correlated within one trail but not across trails.
//!
//! ```no_run
//! use std::sync::Arc;
//! use truetrack_audit::{AuditObserver, AuditWriter};
//!
//! let writer = Arc::new(AuditWriter::open("/tmp/scans.ndjson".as_ref()).unwrap());
//! let observer = AuditObserver::new(writer.clone());
//! // ScanContext::with_observer(Arc::new(observer)) ...
//! writer.close().unwrap();
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;
use truetrack_ids::SessionId;
use truetrack_scan::{
    ErrorKind, FacingMode, SessionEvent, SessionObserver, Verdict, VerificationOutcome,
};
use uuid::Uuid;

pub const SCHEMA_VERSION: u32 = 1;

const DIGEST_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to acquire lock")]
    LockError,

    #[error("audit trail is closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub schema_version: u32,
    pub event_id: String,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub event: AuditEvent,
}

/// What happened. Mirrors [`SessionEvent`] with payload text redacted, plus
/// trail bracketing and verification results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    AuditStarted {
        salt_hash: String,
        hostname: String,
    },
    AuditStopped {
        records: u64,
    },
    SessionStarted {
        facing: FacingMode,
    },
    CameraAcquired {
        device: String,
    },
    CameraReleased,
    DecodeFailed {
        reason: String,
    },
    DecodeIgnored,
    Decoded {
        payload_digest: String,
        payload_len: usize,
    },
    SessionClosed {
        error: Option<ErrorKind>,
    },
    Dismissed,
    Verified {
        payload_digest: String,
        verdict: Verdict,
        verified_by: String,
    },
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::AuditStarted { .. } => "audit_started",
            AuditEvent::AuditStopped { .. } => "audit_stopped",
            AuditEvent::SessionStarted { .. } => "session_started",
            AuditEvent::CameraAcquired { .. } => "camera_acquired",
            AuditEvent::CameraReleased => "camera_released",
            AuditEvent::DecodeFailed { .. } => "decode_failed",
            AuditEvent::DecodeIgnored => "decode_ignored",
            AuditEvent::Decoded { .. } => "decoded",
            AuditEvent::SessionClosed { .. } => "session_closed",
            AuditEvent::Dismissed => "dismissed",
            AuditEvent::Verified { .. } => "verified",
        }
    }
}

struct Sink {
    file: BufWriter<File>,
    next_seq: u64,
}

/// NDJSON audit writer.
///
/// Sequence numbers are assigned under the same lock that writes the line,
/// so file order and `seq` order always agree.
pub struct AuditWriter {
    sink: Mutex<Sink>,
    salt: [u8; 32],
    closed: AtomicBool,
}

impl AuditWriter {
    /// Open (or create) the trail at `path` and append an `audit_started`
    /// record.
    pub fn open(path: &Path) -> Result<Self, AuditError> {
        let mut salt = [0u8; 32];
        salt[..16].copy_from_slice(Uuid::new_v4().as_bytes());
        salt[16..].copy_from_slice(Uuid::new_v4().as_bytes());
        Self::open_with_salt(path, salt)
    }

    fn open_with_salt(path: &Path, salt: [u8; 32]) -> Result<Self, AuditError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = Self {
            sink: Mutex::new(Sink {
                file: BufWriter::new(file),
                next_seq: 0,
            }),
            salt,
            closed: AtomicBool::new(false),
        };

        let hostname = std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("HOST"))
            .unwrap_or_else(|_| "unknown".to_string());
        let started = AuditEvent::AuditStarted {
            salt_hash: writer.digest_bytes(&writer.salt),
            hostname,
        };
        writer.record(None, started)?;
        Ok(writer)
    }

    /// Append one record. Returns its sequence number.
    pub fn record(&self, session: Option<&SessionId>, event: AuditEvent) -> Result<u64, AuditError> {
        let mut sink = self.sink.lock().map_err(|_| AuditError::LockError)?;
        if self.closed.load(Ordering::SeqCst) {
            return Err(AuditError::Closed);
        }
        Self::append(&mut sink, session, event)
    }

    /// Append a session lifecycle event, redacting any payload.
    pub fn record_session(&self, session: &SessionId, event: &SessionEvent) -> Result<u64, AuditError> {
        let event = match event {
            SessionEvent::Started { facing } => AuditEvent::SessionStarted { facing: *facing },
            SessionEvent::CameraAcquired { device } => AuditEvent::CameraAcquired {
                device: device.clone(),
            },
            SessionEvent::CameraReleased => AuditEvent::CameraReleased,
            SessionEvent::DecodeFailed { reason } => AuditEvent::DecodeFailed {
                reason: reason.clone(),
            },
            SessionEvent::DecodeIgnored => AuditEvent::DecodeIgnored,
            SessionEvent::Decoded { payload } => AuditEvent::Decoded {
                payload_digest: self.digest(payload.as_str()),
                payload_len: payload.as_str().len(),
            },
            SessionEvent::Closed { error } => AuditEvent::SessionClosed { error: *error },
            SessionEvent::Dismissed => AuditEvent::Dismissed,
        };
        self.record(Some(session), event)
    }

    pub fn record_verification(
        &self,
        session: Option<&SessionId>,
        outcome: &VerificationOutcome,
    ) -> Result<u64, AuditError> {
        self.record(
            session,
            AuditEvent::Verified {
                payload_digest: self.digest(outcome.payload.as_str()),
                verdict: outcome.verdict,
                verified_by: outcome.verified_by.clone(),
            },
        )
    }

    /// Salted digest of `text`: 16 hex characters.
    pub fn digest(&self, text: &str) -> String {
        self.digest_bytes(text.as_bytes())
    }

    /// Append `audit_stopped`. Later calls, and later records, are refused.
    pub fn close(&self) -> Result<(), AuditError> {
        // One guard covers the flag, the count and the final line, so no
        // record can slip in after `audit_stopped`.
        let mut sink = self.sink.lock().map_err(|_| AuditError::LockError)?;
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let records = sink.next_seq;
        Self::append(&mut sink, None, AuditEvent::AuditStopped { records })?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn append(sink: &mut Sink, session: Option<&SessionId>, event: AuditEvent) -> Result<u64, AuditError> {
        let seq = sink.next_seq;
        let record = AuditRecord {
            schema_version: SCHEMA_VERSION,
            event_id: Uuid::new_v4().to_string(),
            seq,
            timestamp: Utc::now(),
            session_id: session.map(|id| id.as_str().to_string()),
            event,
        };
        let line = serde_json::to_string(&record)?;
        writeln!(sink.file, "{}", line)?;
        sink.file.flush()?;
        sink.next_seq += 1;
        Ok(seq)
    }

    fn digest_bytes(&self, data: &[u8]) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.salt);
        hasher.update(data);
        hasher.finalize().to_hex()[..DIGEST_LEN].to_string()
    }
}

impl Drop for AuditWriter {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close audit trail");
        }
    }
}

/// Read every record of a trail, in file order.
pub fn read_records(path: &Path) -> Result<Vec<AuditRecord>, AuditError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Forwards session events to an [`AuditWriter`]. Write failures are logged
/// and never reach the session.
#[derive(Clone)]
pub struct AuditObserver {
    writer: Arc<AuditWriter>,
}

impl AuditObserver {
    pub fn new(writer: Arc<AuditWriter>) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &Arc<AuditWriter> {
        &self.writer
    }
}

impl SessionObserver for AuditObserver {
    fn on_event(&self, session: &SessionId, event: &SessionEvent) {
        if let Err(err) = self.writer.record_session(session, event) {
            warn!(session_id = %session, event = event.name(), error = %err, "audit write failed");
        }
    }
}
