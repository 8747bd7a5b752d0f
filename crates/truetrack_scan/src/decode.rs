//! Decode adapter contract and the bindings shipped with TrueTrack.
//!
//! A [`DecodeAdapter`] attaches to a [`FrameSource`] and returns a
//! [`DecodeStream`]: a lazy, unbounded sequence of decode attempts that stops
//! yielding as soon as [`DecodeStream::stop`] is called.

use futures::stream::{self, BoxStream, StreamExt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use crate::camera::FrameSource;
use crate::error::DecodeError;
use crate::verify::{payload_checksum, sign_serial};

/// Outcome of decoding one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeEvent {
    pub found: bool,
    pub text: Option<String>,
}

impl DecodeEvent {
    /// No code in this frame.
    pub fn miss() -> Self {
        Self {
            found: false,
            text: None,
        }
    }

    pub fn found(text: impl Into<String>) -> Self {
        Self {
            found: true,
            text: Some(text.into()),
        }
    }

    /// Decoded text, if this attempt found a non-empty code.
    pub fn payload(&self) -> Option<&str> {
        match (self.found, self.text.as_deref()) {
            (true, Some(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

pub type DecodeItem = Result<DecodeEvent, DecodeError>;

/// Shared stop flag for a decode stream. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Returns `true` for the first call only.
    pub fn stop(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::SeqCst);
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once [`StopSignal::stop`] has been called.
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

/// Cancellable stream of decode attempts.
pub struct DecodeStream {
    inner: BoxStream<'static, DecodeItem>,
    stop: StopSignal,
}

impl DecodeStream {
    pub fn new(inner: BoxStream<'static, DecodeItem>) -> Self {
        Self {
            inner,
            stop: StopSignal::new(),
        }
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Halt frame processing. Safe to call repeatedly.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Next decode attempt, or `None` once stopped or exhausted.
    pub async fn next(&mut self) -> Option<DecodeItem> {
        if self.stop.is_stopped() {
            return None;
        }
        let stop = self.stop.clone();
        tokio::select! {
            biased;
            _ = stop.stopped() => None,
            item = self.inner.next() => {
                if stop.is_stopped() { None } else { item }
            }
        }
    }

    /// Move the stream onto a tokio task and receive its items over a channel.
    ///
    /// The task ends when the stream is stopped, exhausted, or the receiver is
    /// dropped. A closed channel therefore means the stream is gone.
    pub fn forward(mut self) -> mpsc::UnboundedReceiver<DecodeItem> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(item) = self.next().await {
                if tx.send(item).is_err() {
                    break;
                }
            }
        });
        rx
    }
}

pub trait DecodeAdapter: Send + Sync {
    fn attach(&self, source: &FrameSource) -> DecodeStream;
}

/// Replays a fixed list of decode results, then either ends the stream or
/// keeps it open with no further frames.
#[derive(Debug, Clone)]
pub struct ScriptedDecoder {
    script: Vec<DecodeItem>,
    interval: Duration,
    end_after_script: bool,
}

impl ScriptedDecoder {
    pub fn new(script: Vec<DecodeItem>) -> Self {
        Self {
            script,
            interval: Duration::ZERO,
            end_after_script: false,
        }
    }

    /// Every scripted payload as a successful decode, in order.
    pub fn payloads<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            payloads
                .into_iter()
                .map(|p| Ok(DecodeEvent::found(p)))
                .collect(),
        )
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// End the stream after the script instead of idling.
    pub fn ending(mut self) -> Self {
        self.end_after_script = true;
        self
    }
}

impl DecodeAdapter for ScriptedDecoder {
    fn attach(&self, _source: &FrameSource) -> DecodeStream {
        let interval = self.interval;
        let scripted = stream::iter(self.script.clone()).then(move |item| async move {
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            item
        });
        let inner = if self.end_after_script {
            scripted.boxed()
        } else {
            scripted.chain(stream::pending()).boxed()
        };
        DecodeStream::new(inner)
    }
}

/// Camera-less stand-in for a real decoder: a few empty frames, then a
/// genuine signed payload, then empty frames until stopped.
#[derive(Debug, Clone)]
pub struct SimulatedDecoder {
    frame_interval: Duration,
    frames_before_decode: u32,
}

impl SimulatedDecoder {
    pub fn new(frame_interval: Duration, frames_before_decode: u32) -> Self {
        Self {
            frame_interval,
            frames_before_decode,
        }
    }
}

impl DecodeAdapter for SimulatedDecoder {
    fn attach(&self, _source: &FrameSource) -> DecodeStream {
        let interval = self.frame_interval;
        let decode_at = self.frames_before_decode;
        let frames = stream::unfold(0u32, move |frame| async move {
            tokio::time::sleep(interval).await;
            let event = if frame == decode_at {
                DecodeEvent::found(simulated_payload(true))
            } else {
                DecodeEvent::miss()
            };
            Some((Ok(event), frame.saturating_add(1)))
        });
        DecodeStream::new(frames.boxed())
    }
}

/// Decoder driven by the user: each [`DecodeInjector::present`] call is one
/// decode attempt on the currently attached stream.
#[derive(Debug, Clone, Default)]
pub struct ManualDecoder {
    current: Arc<Mutex<Option<mpsc::UnboundedSender<DecodeItem>>>>,
}

/// Sending half of a [`ManualDecoder`].
#[derive(Debug, Clone)]
pub struct DecodeInjector {
    current: Arc<Mutex<Option<mpsc::UnboundedSender<DecodeItem>>>>,
}

impl ManualDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn injector(&self) -> DecodeInjector {
        DecodeInjector {
            current: Arc::clone(&self.current),
        }
    }
}

impl DecodeAdapter for ManualDecoder {
    fn attach(&self, _source: &FrameSource) -> DecodeStream {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        let inner = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        DecodeStream::new(inner.boxed())
    }
}

impl DecodeInjector {
    /// Feed one attempt to the attached stream. Returns `false` when no
    /// stream is listening.
    pub fn present(&self, item: DecodeItem) -> bool {
        let guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(tx) => tx.send(item).is_ok(),
            None => false,
        }
    }

    pub fn present_code(&self, text: impl Into<String>) -> bool {
        self.present(Ok(DecodeEvent::found(text)))
    }

    /// Drop the sender so the attached stream ends, as an unplugged camera would.
    pub fn disconnect(&self) {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

/// Payload shaped like a freshly printed label: `TT-<millis>-<9 base36>-<check>`.
///
/// Genuine payloads carry the checksum of their serial; others carry a
/// checksum of a different serial and fail verification.
pub fn simulated_payload(genuine: bool) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    let serial = format!("{}-{}", chrono::Utc::now().timestamp_millis(), suffix);
    if genuine {
        sign_serial(&serial)
    } else {
        let forged = payload_checksum(&format!("{}x", serial));
        format!("TT-{}-{}", serial, forged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FacingMode;

    fn source() -> FrameSource {
        FrameSource {
            device: "test".into(),
            facing: FacingMode::Environment,
        }
    }

    #[test]
    fn payload_requires_found_and_text() {
        assert_eq!(DecodeEvent::found("TT-1").payload(), Some("TT-1"));
        assert_eq!(DecodeEvent::miss().payload(), None);
        assert_eq!(DecodeEvent::found("").payload(), None);
        let odd = DecodeEvent {
            found: false,
            text: Some("TT-1".into()),
        };
        assert_eq!(odd.payload(), None);
    }

    #[tokio::test]
    async fn scripted_stream_yields_in_order_then_ends() {
        let decoder = ScriptedDecoder::payloads(["TT-1", "TT-2"]).ending();
        let mut stream = decoder.attach(&source());

        assert_eq!(stream.next().await, Some(Ok(DecodeEvent::found("TT-1"))));
        assert_eq!(stream.next().await, Some(Ok(DecodeEvent::found("TT-2"))));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn stopped_stream_yields_nothing() {
        let decoder = ScriptedDecoder::payloads(["TT-1"]);
        let mut stream = decoder.attach(&source());
        stream.stop();
        stream.stop();

        assert!(stream.is_stopped());
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn stop_wakes_a_pending_stream() {
        let decoder = ScriptedDecoder::new(Vec::new());
        let mut stream = decoder.attach(&source());
        let stop = stream.stop_signal();

        let waiter = tokio::spawn(async move { stream.next().await });
        tokio::task::yield_now().await;
        assert!(stop.stop());
        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_decoder_finds_after_configured_frames() {
        let decoder = SimulatedDecoder::new(Duration::from_millis(100), 2);
        let mut stream = decoder.attach(&source());

        assert_eq!(stream.next().await, Some(Ok(DecodeEvent::miss())));
        assert_eq!(stream.next().await, Some(Ok(DecodeEvent::miss())));
        let found = stream.next().await.unwrap().unwrap();
        assert!(found.payload().unwrap().starts_with("TT-"));
    }

    #[tokio::test]
    async fn manual_decoder_delivers_presented_codes() {
        let decoder = ManualDecoder::new();
        let injector = decoder.injector();
        assert!(!injector.present_code("TT-early"));

        let mut stream = decoder.attach(&source());
        assert!(injector.present_code("TT-9"));
        assert_eq!(stream.next().await, Some(Ok(DecodeEvent::found("TT-9"))));

        injector.disconnect();
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn forwarded_stream_closes_channel_when_stopped() {
        let decoder = ScriptedDecoder::payloads(["TT-1"]);
        let stream = decoder.attach(&source());
        let stop = stream.stop_signal();
        let mut rx = stream.forward();

        assert_eq!(rx.recv().await, Some(Ok(DecodeEvent::found("TT-1"))));
        stop.stop();
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn simulated_payloads_have_four_segments() {
        let payload = simulated_payload(true);
        assert_eq!(payload.split('-').count(), 4);
        assert_ne!(payload, simulated_payload(true));
    }
}
