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

use crate::Level;
use crate::Log;
use crate::filter::EnvFilter;
use crate::layout::Caller;

struct LogCrateLogger {
    log: Log,
    filter: Option<EnvFilter>,
}

impl log::Log for LogCrateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        !self.log.is_paused() && self.filter.as_ref().is_none_or(|f| f.enabled(metadata))
    }

    fn log(&self, record: &log::Record) {
        if let Some(filter) = self.filter.as_ref() {
            if !filter.matches(record) {
                return;
            }
        }

        let level = Level::from(record.level());
        let caller = Caller::new(record.file().unwrap_or_default(), record.line().unwrap_or_default());
        self.log.log_at(level, caller, *record.args());
    }

    fn flush(&self) {
        self.log.flush();
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_boxed_logger`] so that all logs from the log crate are
/// buffered by the given [`Log`]. Records rejected by `filter` are skipped; without a filter
/// every record is accepted.
///
/// The global maximum log level is set to the most verbose level `filter` lets through, or
/// `Trace` without a filter.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use buflog::Config;
/// use buflog::Log;
/// use buflog::filter::EnvFilter;
///
/// let log = Log::new(Duration::from_secs(1), "", Config::default());
/// if let Err(err) = buflog::bridge::try_setup_log_crate(log, Some(EnvFilter::from_default_env_or("info"))) {
///     eprintln!("failed to setup log crate: {err}");
/// }
/// ```
pub fn try_setup_log_crate(log: Log, filter: Option<EnvFilter>) -> Result<(), log::SetLoggerError> {
    let max_level = filter
        .as_ref()
        .map_or(log::LevelFilter::Trace, |f| f.max_level());
    log::set_boxed_logger(Box::new(LogCrateLogger { log, filter }))?;
    log::set_max_level(max_level);
    Ok(())
}

/// Set up the log crate global logger.
///
/// See [`try_setup_log_crate`] for details.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
pub fn setup_log_crate(log: Log, filter: Option<EnvFilter>) {
    try_setup_log_crate(log, filter).expect(
        "buflog::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}
