//! Rolling Logger
//!
//! Installs a `tracing` fmt subscriber that writes plain lines to
//! `<dir>/<app>.log`, rotating by size into `<app>.log.1 .. <app>.log.N`,
//! and keeps the most recent lines in memory for in-app diagnostics.
//! `log` records are bridged, so library code can stay on the `log` facade.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::Local;

/// Limits for one logger instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerConfig {
    pub max_bytes: u64,
    /// Rotated files to keep besides the live one
    pub keep_files: usize,
    /// Lines held by `recent_lines()`
    pub buffer_lines: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            keep_files: 3,
            buffer_lines: 500,
        }
    }
}

// ========================
// Rolling file
// ========================

/// Size-rotated log file
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    max_bytes: u64,
    keep_files: usize,
    file: File,
    written: u64,
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, max_bytes: u64, keep_files: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", app_name));
        let file = open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            max_bytes,
            keep_files,
            file,
            written,
        })
    }

    /// `0` is the live file
    pub fn path(&self, index: usize) -> PathBuf {
        match index {
            0 => self.dir.join(format!("{}.log", self.app_name)),
            i => self.dir.join(format!("{}.log.{}", self.app_name, i)),
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let live = self.path(0);
        if self.keep_files == 0 {
            self.file = File::create(&live)?;
        } else {
            let oldest = self.path(self.keep_files);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for i in (1..self.keep_files).rev() {
                let from = self.path(i);
                if from.exists() {
                    fs::rename(&from, self.path(i + 1))?;
                }
            }
            fs::rename(&live, self.path(1))?;
            self.file = open_append(&live)?;
        }

        let header = format!(
            "--- {} log rotated at {} ---\n",
            self.app_name,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.file.write_all(header.as_bytes())?;
        self.written = header.len() as u64;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

// ========================
// Circular buffer
// ========================

/// Last N complete lines
#[derive(Debug, Default)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    partial: String,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            partial: String::new(),
        }
    }

    /// Feed raw output; only finished lines are kept
    pub fn push(&mut self, bytes: &[u8]) {
        self.partial.push_str(&String::from_utf8_lossy(bytes));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            self.push_line(line.trim_end().to_string());
        }
    }

    fn push_line(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

// ========================
// Subscriber wiring
// ========================

struct Sink {
    file: RollingFile,
    buffer: LogBuffer,
}

#[derive(Clone)]
struct SinkWriter(Arc<Mutex<Sink>>);

impl SinkWriter {
    fn lock(&self) -> MutexGuard<'_, Sink> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sink = self.lock();
        sink.buffer.push(buf);
        sink.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

static SINK: OnceLock<SinkWriter> = OnceLock::new();

/// Install the global logger with default limits
pub fn init_logger(dir: impl AsRef<Path>, app_name: &str) -> Result<(), String> {
    init_logger_with(dir, app_name, LoggerConfig::default())
}

/// Install the global logger. Fails if one is already installed.
pub fn init_logger_with(dir: impl AsRef<Path>, app_name: &str, config: LoggerConfig) -> Result<(), String> {
    let file = RollingFile::open(dir.as_ref(), app_name, config.max_bytes, config.keep_files)
        .map_err(|e| format!("Cannot open log file in {}: {}", dir.as_ref().display(), e))?;
    let writer = SinkWriter(Arc::new(Mutex::new(Sink {
        file,
        buffer: LogBuffer::new(config.buffer_lines),
    })));
    SINK.set(writer.clone())
        .map_err(|_| "Logger already initialized".to_string())?;

    tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .map_err(|e| e.to_string())
}

/// Most recent formatted lines, oldest first. Empty before init.
pub fn recent_lines() -> Vec<String> {
    SINK.get()
        .map(|writer| writer.lock().buffer.lines())
        .unwrap_or_default()
}

pub fn info(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    log::info!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    log::error!("{}", msg);
    Ok(())
}

fn ensure_initialized() -> Result<(), String> {
    SINK.get()
        .map(|_| ())
        .ok_or_else(|| "Logger not initialized".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_keeps_last_complete_lines() {
        let mut buffer = LogBuffer::new(2);
        buffer.push(b"one\ntwo\nthr");
        assert_eq!(buffer.lines(), vec!["one", "two"]);

        buffer.push(b"ee\n");
        assert_eq!(buffer.lines(), vec!["two", "three"]);
    }

    #[test]
    fn test_file_rotates_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "Test", 64, 2).unwrap();
        let chunk = [b'x'; 50];

        for _ in 0..5 {
            file.write_all(&chunk).unwrap();
        }
        file.flush().unwrap();

        assert!(file.path(0).exists());
        assert!(file.path(1).exists());
        assert!(file.path(2).exists());
        assert!(!file.path(3).exists());

        let live = fs::read_to_string(file.path(0)).unwrap();
        assert!(live.starts_with("--- Test log rotated at "));
        assert!(live.ends_with(&"x".repeat(50)));
    }

    #[test]
    fn test_reopen_continues_size_count() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut file = RollingFile::open(dir.path(), "Test", 1024, 1).unwrap();
            file.write_all(b"hello\n").unwrap();
        }
        let file = RollingFile::open(dir.path(), "Test", 1024, 1).unwrap();
        assert_eq!(file.written, 6);
    }

    // The only test that touches the global subscriber
    #[test]
    fn test_global_logger_bridges_log_records() {
        assert!(info("too early").is_err());

        let dir = tempfile::tempdir().unwrap();
        init_logger(dir.path(), "App").unwrap();
        assert!(init_logger(dir.path(), "App").is_err());

        info("db ready").unwrap();
        error("sync failed").unwrap();

        let lines = recent_lines();
        assert!(lines.iter().any(|l| l.contains("INFO") && l.contains("db ready")));
        assert!(lines.iter().any(|l| l.contains("ERROR") && l.contains("sync failed")));
        assert!(fs::read_to_string(dir.path().join("App.log"))
            .unwrap()
            .contains("db ready"));
    }
}
