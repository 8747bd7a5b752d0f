//! Event handling for the TUI
//!
//! Terminal input is read on one blocking task for the lifetime of the
//! handler, and ticks come from a tokio interval. Both feed the same
//! channel, so a burst of typing never delays the tick that drains a scan.

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

/// How long one terminal poll may block before the reader rechecks `stop`.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Application events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Key press
    Key(KeyEvent),
    /// Periodic tick; scan progress is polled here
    Tick,
    /// Terminal resize
    Resize(u16, u16),
}

/// Map a raw terminal event to an app event. Key releases and repeats are
/// dropped (Windows reports them), as are mouse and focus events.
pub fn translate(raw: CrosstermEvent) -> Option<Event> {
    match raw {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}

pub struct EventHandler {
    rx: UnboundedReceiver<Event>,
    stop: Arc<AtomicBool>,
    ticker: JoinHandle<()>,
}

impl EventHandler {
    /// Start reading the terminal and ticking every `tick_rate`.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        spawn_reader(tx.clone(), Arc::clone(&stop));
        let ticker = spawn_ticker(tx, tick_rate);
        Self { rx, stop, ticker }
    }

    /// Next event in arrival order. `None` once both producers are gone.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.ticker.abort();
    }
}

fn spawn_reader(tx: UnboundedSender<Event>, stop: Arc<AtomicBool>) {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::SeqCst) {
            let ready = match event::poll(INPUT_POLL) {
                Ok(ready) => ready,
                Err(err) => {
                    warn!(error = %err, "terminal input unavailable");
                    return;
                }
            };
            if !ready {
                continue;
            }
            match event::read() {
                Ok(raw) => {
                    if let Some(event) = translate(raw) {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to read terminal event");
                    return;
                }
            }
        }
    });
}

fn spawn_ticker(tx: UnboundedSender<Event>, tick_rate: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_rate);
        // A stalled frame should not be followed by a burst of catch-up ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.send(Event::Tick).is_err() {
                break;
            }
        }
    })
}
