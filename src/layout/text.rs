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

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::Arguments;
use std::fmt::Write;
use std::panic::Location;

use jiff::Zoned;

use crate::Level;
use crate::config::DEFAULT_TIME_FORMAT;
use crate::db::DisplayParams;
use crate::db::Param;

/// The source position a [`Level::Debug`] entry is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller<'a> {
    file: &'a str,
    line: u32,
}

impl<'a> Caller<'a> {
    /// Create a caller from a file name and line number.
    pub fn new(file: &'a str, line: u32) -> Self {
        Self { file, line }
    }
}

impl<'a> From<&'a Location<'a>> for Caller<'a> {
    fn from(location: &'a Location<'a>) -> Self {
        Caller::new(location.file(), location.line())
    }
}

/// A layout that formats log entries as text lines.
///
/// Output format:
///
/// ```text
/// [2024/03/01 22:44:57.172: INFO] Hello info!
/// [2024/03/01 22:44:57.172: WARN] Hello warn!
/// [2024/03/01 22:44:57.172: DEBUG][FL:src/main.rs,54] Hello debug!
/// [2024/03/01 22:44:57.172: ERROR] Hello error!
/// [2024/03/01 22:44:57.172: PANIC][Stack:<backtrace>] Hello panic!
/// [2024/03/01 22:44:57.172: SQL][INSERT INTO t VALUES (?, ?) params:1 2]
/// ```
///
/// Every line ends with a single `\n`, so flushed blocks are plain concatenations of lines.
#[derive(Debug, Clone)]
pub struct TextLayout {
    time_format: Cow<'static, str>,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            time_format: Cow::Borrowed(DEFAULT_TIME_FORMAT),
        }
    }
}

impl TextLayout {
    /// Create a text layout rendering timestamps with the given strftime-style format.
    pub fn new(time_format: impl Into<Cow<'static, str>>) -> Self {
        Self {
            time_format: time_format.into(),
        }
    }

    /// Render a leveled entry.
    ///
    /// [`Level::Debug`] entries carry `caller`; [`Level::Panic`] entries carry a stack trace
    /// captured here.
    pub fn format(
        &self,
        now: &Zoned,
        level: Level,
        caller: Caller<'_>,
        message: Arguments,
    ) -> String {
        let time = self.timestamp(now);
        let mut text = String::new();
        // SAFETY: write to a string always succeeds
        match level {
            Level::Debug => {
                let Caller { file, line } = caller;
                write!(&mut text, "[{time}: {level}][FL:{file},{line}] ").unwrap();
            }
            Level::Panic => {
                let stack = Backtrace::force_capture();
                write!(&mut text, "[{time}: {level}][Stack:{stack}] ").unwrap();
            }
            Level::Info | Level::Warn | Level::Error => {
                write!(&mut text, "[{time}: {level}] ").unwrap();
            }
        }
        writeln!(&mut text, "{message}").unwrap();
        text
    }

    /// Render the record of a database statement.
    pub fn format_sql(&self, now: &Zoned, statement: &str, params: &[Param]) -> String {
        let time = self.timestamp(now);
        let params = DisplayParams(params);
        format!("[{time}: SQL][{statement} params:{params}]\n")
    }

    fn timestamp(&self, now: &Zoned) -> String {
        // a malformed format must not break logging; fall back to RFC 3339
        jiff::fmt::strtime::format(self.time_format.as_bytes(), now)
            .unwrap_or_else(|_| now.timestamp().to_string())
    }
}
