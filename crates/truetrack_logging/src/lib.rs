//! Logging setup for TrueTrack binaries.
//!
//! Two sinks: a size-rotated file under `$TRUETRACK_HOME/logs` and stderr.
//! The TUI owns the terminal, so in TUI mode stderr only carries errors.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable that relocates every TrueTrack path.
pub const HOME_ENV: &str = "TRUETRACK_HOME";

const DEFAULT_LOG_FILTER: &str = "truetrack=info,truetrack_scan=info,truetrack_audit=info";
const VERBOSE_LOG_FILTER: &str = "truetrack=debug,truetrack_scan=debug,truetrack_audit=debug";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Options for [`init_logging`].
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    pub tui_mode: bool,
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = ensure_logs_dir()?;
    let file_writer = RotatingWriter::open(&log_dir, config.app_name)
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = match (config.verbose, config.tui_mode) {
        (true, _) => EnvFilter::new(VERBOSE_LOG_FILTER),
        (false, true) => EnvFilter::new("error"),
        (false, false) => EnvFilter::new("warn,truetrack=info"),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(())
}

/// TrueTrack home: `$TRUETRACK_HOME`, else `~/.truetrack`, else `./.truetrack`.
pub fn truetrack_home() -> PathBuf {
    if let Some(path) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".truetrack")
}

/// `$TRUETRACK_HOME/logs`
pub fn logs_dir() -> PathBuf {
    truetrack_home().join("logs")
}

pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

/// Size-capped log file: `<name>.log`, rotated to `<name>.log.1` .. `<name>.log.N`.
struct RotatingFile {
    dir: PathBuf,
    stem: String,
    keep: usize,
    max_size: u64,
    file: Option<File>,
    written: u64,
}

impl RotatingFile {
    fn open(dir: &Path, name: &str, keep: usize, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut rotating = Self {
            dir: dir.to_path_buf(),
            stem: file_stem(name),
            keep: keep.max(1),
            max_size,
            file: None,
            written: 0,
        };
        rotating.reopen()?;
        if rotating.written > rotating.max_size {
            rotating.rotate()?;
        }
        Ok(rotating)
    }

    fn path(&self, generation: usize) -> PathBuf {
        if generation == 0 {
            self.dir.join(format!("{}.log", self.stem))
        } else {
            self.dir.join(format!("{}.log.{}", self.stem, generation))
        }
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(self.path(0))?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        let oldest = self.keep - 1;
        if oldest > 0 {
            let doomed = self.path(oldest);
            if doomed.exists() {
                fs::remove_file(doomed)?;
            }
            for generation in (0..oldest).rev() {
                let from = self.path(generation);
                if from.exists() {
                    fs::rename(from, self.path(generation + 1))?;
                }
            }
        }

        self.reopen()
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// `MakeWriter` adapter sharing one rotating file between tracing layers.
#[derive(Clone)]
struct RotatingWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl RotatingWriter {
    fn open(dir: &Path, name: &str) -> io::Result<Self> {
        let file = RotatingFile::open(dir, name, MAX_LOG_FILES, MAX_LOG_FILE_SIZE)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RotatingWriter {
    type Writer = RotatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .flush()
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
