// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cell::Cell;
use std::fmt;
use std::fmt::Arguments;
use std::panic::Location;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;

use self::worker::Worker;
use crate::Config;
use crate::Error;
use crate::Level;
use crate::append::RollingFileWriter;
use crate::append::Sink;
use crate::append::Stdout;
use crate::append::initial_path;
use crate::clock::Clock;
use crate::db::Param;
use crate::layout::Caller;
use crate::layout::TextLayout;

mod worker;

thread_local! {
    // set while this thread runs a trap; flushes started from inside the trap are deferred
    static TRAPPING: Cell<bool> = const { Cell::new(false) };
}

/// The byte size every buffered line is assumed to take when checking the flush watermark.
///
/// The buffer is flushed early once `lines * ESTIMATED_LINE_SIZE` exceeds the configured file
/// size. This is a line count check, not byte accounting.
pub const ESTIMATED_LINE_SIZE: u64 = 1024;

/// A buffered logger.
///
/// Entries are formatted into lines and kept in memory. The buffer is flushed:
///
/// * every `interval` by a background thread, unless the logger is paused;
/// * right after an append once the buffered line count crosses the watermark;
/// * on [`Log::flush`], [`Log::shutdown`], and when the last handle is dropped.
///
/// Flushed content goes to stdout in [`Environment::Console`](crate::Environment::Console),
/// otherwise to size-rotated files derived from the path template.
///
/// `Log` is a cheap handle; clones share the same buffer.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use buflog::Config;
/// use buflog::Log;
///
/// let log = Log::new(Duration::from_secs(1), "logs/app.log", Config::default());
/// log.info("service started");
/// buflog::warn!(log, "disk usage at {}%", 91);
/// log.flush();
/// ```
#[derive(Clone)]
pub struct Log {
    shared: Arc<Shared>,
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log")
            .field("interval", &self.shared.interval)
            .field("target", &self.target_path())
            .field("paused", &self.shared.is_paused())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct State {
    lines: Vec<String>,
    writer: Option<RollingFileWriter>,
}

pub(crate) struct Shared {
    state: Mutex<State>,
    // serializes flushes so that blocks reach the sink in the order they were drained
    flushing: Mutex<()>,
    paused: AtomicBool,
    interval: Duration,
    config: Config,
    layout: TextLayout,
    clock: Clock,
    console: Stdout,
    shutdown: Mutex<Option<(Sender<()>, JoinHandle<()>)>>,
}

impl Log {
    /// Create a logger flushing every `interval`, writing files derived from `template`.
    ///
    /// `template` may be `name.ext` or a bare `name`; the first file is
    /// `name-<YYYYMMDD>_0.ext` (or `name-<YYYYMMDD>_0.log`) in the template's directory. An empty
    /// template sends everything to stdout.
    ///
    /// A zero `interval` disables the periodic flush.
    pub fn new(interval: Duration, template: impl AsRef<Path>, config: Config) -> Log {
        Log::create(interval, template.as_ref(), config, Clock::DefaultClock)
    }

    fn create(interval: Duration, template: &Path, config: Config, clock: Clock) -> Log {
        let has_file = !template.as_os_str().is_empty();
        let writer = match Sink::select(config.environment, has_file) {
            Sink::Console => None,
            Sink::File => {
                let target = initial_path(template, &clock.now());
                Some(RollingFileWriter::new(target, config.file_size))
            }
        };

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                lines: vec![],
                writer,
            }),
            flushing: Mutex::new(()),
            paused: AtomicBool::new(false),
            interval,
            layout: TextLayout::new(config.time_format.clone()),
            config,
            clock,
            console: Stdout::default(),
            shutdown: Mutex::new(None),
        });

        if !interval.is_zero() {
            let (sender, receiver) = crossbeam_channel::bounded(1);
            let worker = Worker::new(Arc::downgrade(&shared), interval, receiver);
            match worker.make_thread("buflog-flusher".to_string()) {
                Ok(handle) => *shared.shutdown() = Some((sender, handle)),
                Err(err) => {
                    shared.trap(Error::new("failed to spawn periodic flusher").with_source(err));
                }
            }
        }

        Log { shared }
    }

    /// Log a message at [`Level::Info`].
    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.log_fmt(Level::Info, format_args!("{message}"));
    }

    /// Log a message at [`Level::Warn`].
    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.log_fmt(Level::Warn, format_args!("{message}"));
    }

    /// Log a message at [`Level::Debug`], tagged with the caller's file and line.
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.log_fmt(Level::Debug, format_args!("{message}"));
    }

    /// Log a message at [`Level::Error`].
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.log_fmt(Level::Error, format_args!("{message}"));
    }

    /// Log a message at [`Level::Panic`], tagged with the current stack trace.
    ///
    /// This only logs; it does not panic.
    #[track_caller]
    pub fn panic(&self, message: impl fmt::Display) {
        self.log_fmt(Level::Panic, format_args!("{message}"));
    }

    /// Log formatted arguments at [`Level::Info`]. See also [`info!`](crate::info).
    #[track_caller]
    pub fn info_fmt(&self, args: Arguments) {
        self.log_fmt(Level::Info, args);
    }

    /// Log formatted arguments at [`Level::Warn`]. See also [`warn!`](crate::warn).
    #[track_caller]
    pub fn warn_fmt(&self, args: Arguments) {
        self.log_fmt(Level::Warn, args);
    }

    /// Log formatted arguments at [`Level::Debug`]. See also [`debug!`](crate::debug).
    #[track_caller]
    pub fn debug_fmt(&self, args: Arguments) {
        self.log_fmt(Level::Debug, args);
    }

    /// Log formatted arguments at [`Level::Error`]. See also [`error!`](crate::error).
    #[track_caller]
    pub fn error_fmt(&self, args: Arguments) {
        self.log_fmt(Level::Error, args);
    }

    /// Log formatted arguments at [`Level::Panic`].
    #[track_caller]
    pub fn panic_fmt(&self, args: Arguments) {
        self.log_fmt(Level::Panic, args);
    }

    /// Log a message at the given level.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        self.log_fmt(level, format_args!("{message}"));
    }

    /// Log formatted arguments at the given level. See also [`log!`](crate::log).
    #[track_caller]
    pub fn log_fmt(&self, level: Level, args: Arguments) {
        self.log_at(level, Caller::from(Location::caller()), args);
    }

    pub(crate) fn log_at(&self, level: Level, caller: Caller<'_>, args: Arguments) {
        if self.shared.is_paused() {
            return;
        }
        let now = self.shared.clock.now();
        let line = self.shared.layout.format(&now, level, caller, args);
        self.shared.append(line);
    }

    /// Record a database statement in the log and execute it.
    ///
    /// The record goes through the buffer like any other entry, and is dropped while paused.
    /// The statement is executed regardless.
    ///
    /// # Errors
    ///
    /// Return exactly the error produced by the configured [`Database`](crate::db::Database), or
    /// an error if no database is configured.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use buflog::Config;
    /// use buflog::Error;
    /// use buflog::Log;
    /// use buflog::db::Database;
    /// use buflog::db::Param;
    ///
    /// #[derive(Debug)]
    /// struct Discard;
    ///
    /// impl Database for Discard {
    ///     fn exec(&self, _: &str, _: &[Param]) -> Result<(), Error> {
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let log = Log::new(Duration::ZERO, "", Config::default().database(Discard));
    /// log.db("INSERT INTO t VALUES (?, ?)", &[1.into(), 2.into()])
    ///     .unwrap();
    /// ```
    pub fn db(&self, statement: &str, params: &[Param]) -> Result<(), Error> {
        if !self.shared.is_paused() {
            let now = self.shared.clock.now();
            let line = self.shared.layout.format_sql(&now, statement, params);
            self.shared.append(line);
        }

        match self.shared.config.database.as_ref() {
            Some(database) => database.exec(statement, params),
            None => Err(Error::new("no database configured").with_context("statement", statement)),
        }
    }

    /// Write out everything buffered so far.
    ///
    /// Does nothing if the buffer is empty. Write failures are reported to the configured
    /// [`Trap`](crate::trap::Trap) and the content is lost.
    pub fn flush(&self) {
        self.shared.flush();
    }

    /// Stop accepting entries and suspend the periodic flush.
    ///
    /// Entries logged while paused are dropped, not queued.
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Relaxed);
    }

    /// Accept entries and flush periodically again.
    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Relaxed);
    }

    /// Whether the logger is paused.
    pub fn is_paused(&self) -> bool {
        self.shared.is_paused()
    }

    /// The file the next flush writes to.
    ///
    /// Return `None` when output goes to stdout. The path moves forward when the file grows beyond
    /// the configured size.
    pub fn target_path(&self) -> Option<PathBuf> {
        let state = self.shared.state();
        state.writer.as_ref().map(|w| w.target().to_path_buf())
    }

    /// The number of lines currently buffered.
    pub fn buffered(&self) -> usize {
        self.shared.state().lines.len()
    }

    /// Stop the periodic flush thread and flush what is left.
    ///
    /// The logger stays usable afterward; entries are then written only on explicit flushes and
    /// watermark crossings. Calling this more than once is harmless.
    pub fn shutdown(&self) {
        let stopped = self.shared.shutdown().take();
        if let Some((sender, handle)) = stopped {
            let _ = sender.send(());
            if handle.join().is_err() {
                self.shared.trap(Error::new("periodic flusher panicked"));
            }
        }
        self.shared.flush();
    }
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn shutdown(&self) -> MutexGuard<'_, Option<(Sender<()>, JoinHandle<()>)>> {
        self.shutdown.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn append(&self, line: String) {
        if self.is_paused() {
            return;
        }

        let count = {
            let mut state = self.state();
            state.lines.push(line);
            state.lines.len() as u64
        };

        // the guard is released before flushing, which takes it again
        if count.saturating_mul(ESTIMATED_LINE_SIZE) > self.config.file_size {
            self.flush();
        }
    }

    pub(crate) fn flush(&self) {
        if TRAPPING.get() {
            return;
        }

        let result = {
            let _flushing = self.flushing.lock().unwrap_or_else(|e| e.into_inner());

            let lines = std::mem::take(&mut self.state().lines);
            if lines.is_empty() {
                return;
            }
            self.write_out(lines.concat().as_bytes())
        };

        // the trap may log into this logger again, so it runs outside the flushing lock
        if let Err(err) = result {
            self.trap(Error::new("failed to flush log buffer").with_source(err));
        }
    }

    fn write_out(&self, content: &[u8]) -> Result<(), Error> {
        let mut state = self.state();
        if let Some(writer) = state.writer.as_mut() {
            return writer.write_content(content);
        }
        drop(state);
        self.console.write_content(content)
    }

    fn trap(&self, err: Error) {
        let trapping = TRAPPING.replace(true);
        self.config.trap.trap(&err);
        TRAPPING.set(trapping);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.flush();
    }
}
