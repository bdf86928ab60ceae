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

use std::borrow::Cow;

pub use env_filter::Builder as EnvFilterBuilder;

const DEFAULT_FILTER_ENV: &str = "RUST_LOG";

/// Decides which `log` crate records the bridge forwards, using `RUST_LOG` style directives.
///
/// Directives such as `warn,app::db=debug` are described in
/// [the `env_logger` documentation](https://docs.rs/env_logger/#enabling-logging).
#[derive(Debug)]
pub struct EnvFilter(env_filter::Filter);

impl EnvFilter {
    /// Read directives from `RUST_LOG`. An unset variable lets only errors through.
    ///
    /// # Examples
    ///
    /// ```
    /// use buflog::filter::EnvFilter;
    /// let filter = EnvFilter::from_default_env();
    /// ```
    pub fn from_default_env() -> Self {
        EnvFilter::from_env(DEFAULT_FILTER_ENV)
    }

    /// Read directives from `RUST_LOG`, falling back to `default` when it is unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use buflog::filter::EnvFilter;
    /// let filter = EnvFilter::from_default_env_or("info");
    /// ```
    pub fn from_default_env_or<'a>(default: impl Into<Cow<'a, str>>) -> Self {
        EnvFilter::from_env_or(DEFAULT_FILTER_ENV, default)
    }

    /// Read directives from the variable `name`.
    pub fn from_env<'a>(name: impl Into<Cow<'a, str>>) -> Self {
        EnvFilter::parse_env(&name.into(), None)
    }

    /// Read directives from the variable `name`, falling back to `default` when it is unset.
    pub fn from_env_or<'a, 'b>(
        name: impl Into<Cow<'a, str>>,
        default: impl Into<Cow<'b, str>>,
    ) -> Self {
        EnvFilter::parse_env(&name.into(), Some(&default.into()))
    }

    /// Build the filter from directives already parsed into `builder`.
    pub fn new(mut builder: EnvFilterBuilder) -> Self {
        EnvFilter(builder.build())
    }

    fn parse_env(name: &str, default: Option<&str>) -> Self {
        let mut builder = EnvFilterBuilder::new();
        match std::env::var(name) {
            Ok(directives) => {
                builder.parse(&directives);
            }
            Err(_) => {
                if let Some(directives) = default {
                    builder.parse(directives);
                }
            }
        }
        EnvFilter::new(builder)
    }

    pub(crate) fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.0.enabled(metadata)
    }

    pub(crate) fn matches(&self, record: &log::Record) -> bool {
        self.0.matches(record)
    }

    /// The most verbose level any directive lets through.
    pub(crate) fn max_level(&self) -> log::LevelFilter {
        self.0.filter()
    }
}
