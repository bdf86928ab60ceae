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

//! Configuration shared by a [`Log`](crate::Log) for its whole lifetime.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::Error;
use crate::db::Database;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

const DEFAULT_ENVIRONMENT_ENV: &str = "BUFLOG_ENV";
const DEFAULT_TIME_FORMAT_ENV: &str = "BUFLOG_TIME_FORMAT";
const DEFAULT_FILE_SIZE_ENV: &str = "BUFLOG_FILE_SIZE";

/// The default timestamp format, rendering as `2024/03/01 15:04:05.000`.
pub const DEFAULT_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S.%3f";

/// The default file size threshold: 20 MiB.
pub const DEFAULT_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Where flushed content goes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Always write to standard output.
    #[default]
    Console,
    /// Write to rotating files.
    Develop,
    /// Write to rotating files.
    Product,
}

impl Environment {
    /// Return the string representation of the `Environment`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Console => "console",
            Environment::Develop => "develop",
            Environment::Product => "product",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;
    fn from_str(s: &str) -> Result<Environment, Self::Err> {
        for (name, env) in [
            ("console", Environment::Console),
            ("develop", Environment::Develop),
            ("development", Environment::Develop),
            ("product", Environment::Product),
            ("production", Environment::Product),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(env);
            }
        }

        Err(Error::new(format!("malformed environment: {s:?}")))
    }
}

/// Settings read by a [`Log`](crate::Log).
///
/// A `Config` is moved into the logger on construction and never changes afterward, so
/// reconfiguring means building a new logger.
///
/// # Examples
///
/// ```
/// use buflog::Config;
/// use buflog::Environment;
///
/// let config = Config::default()
///     .environment(Environment::Product)
///     .file_size(4 * 1024 * 1024)
///     .time_format("%Y-%m-%dT%H:%M:%S");
/// ```
#[derive(Debug)]
pub struct Config {
    pub(crate) environment: Environment,
    pub(crate) time_format: Cow<'static, str>,
    pub(crate) file_size: u64,
    pub(crate) database: Option<Arc<dyn Database>>,
    pub(crate) trap: Box<dyn Trap>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            time_format: Cow::Borrowed(DEFAULT_TIME_FORMAT),
            file_size: DEFAULT_FILE_SIZE,
            database: None,
            trap: Box::new(DefaultTrap::default()),
        }
    }
}

impl Config {
    /// Create a config with defaults overridden by `BUFLOG_ENV`, `BUFLOG_TIME_FORMAT` and
    /// `BUFLOG_FILE_SIZE`.
    ///
    /// Malformed values are reported to the default trap and ignored.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(s) = std::env::var(DEFAULT_ENVIRONMENT_ENV) {
            match s.parse() {
                Ok(environment) => config.environment = environment,
                Err(err) => config
                    .trap
                    .trap(&err.with_context("env", DEFAULT_ENVIRONMENT_ENV)),
            }
        }

        if let Ok(s) = std::env::var(DEFAULT_TIME_FORMAT_ENV) {
            config.time_format = Cow::Owned(s);
        }

        if let Ok(s) = std::env::var(DEFAULT_FILE_SIZE_ENV) {
            match s.trim().parse::<u64>() {
                Ok(size) => config.file_size = size,
                Err(err) => {
                    let err = Error::new(format!("malformed file size: {s:?}"))
                        .with_context("env", DEFAULT_FILE_SIZE_ENV)
                        .with_source(err);
                    config.trap.trap(&err);
                }
            }
        }

        config
    }

    /// Set where flushed content goes.
    ///
    /// Default to [`Environment::Console`].
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the strftime-style format of entry timestamps.
    ///
    /// Default to [`DEFAULT_TIME_FORMAT`].
    pub fn time_format(mut self, time_format: impl Into<Cow<'static, str>>) -> Self {
        self.time_format = time_format.into();
        self
    }

    /// Set the size in bytes above which a log file is rotated.
    ///
    /// The same threshold drives the early flush watermark of the buffer.
    ///
    /// Default to [`DEFAULT_FILE_SIZE`].
    pub fn file_size(mut self, file_size: u64) -> Self {
        self.file_size = file_size;
        self
    }

    /// Set the handle that [`Log::db`](crate::Log::db) executes statements against.
    pub fn database(mut self, database: impl Database) -> Self {
        self.database = Some(Arc::new(database));
        self
    }

    /// Set the trap for errors swallowed while writing.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }
}
