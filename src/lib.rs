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

//! Buflog is a buffered logger: entries are kept in memory and written out periodically, to the
//! console or to files rotated by size.
//!
//! # Overview
//!
//! A [`Log`] formats each entry into a line and appends it to an in-memory buffer. A background
//! thread drains the buffer every interval; a crowded buffer is drained right away. Drained
//! lines go to stdout in [`Environment::Console`], or to `<name>-<YYYYMMDD>_<N>.<ext>` files
//! that move on to `N + 1` once they grow beyond the configured size.
//!
//! Logging never fails the caller. Write errors go to a [`Trap`](trap::Trap) and the content is
//! lost. The one exception is [`Log::db`], which returns the database's own result.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use buflog::Config;
//! use buflog::Environment;
//! use buflog::Log;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = Config::default()
//!     .environment(Environment::Product)
//!     .file_size(20 * 1024 * 1024);
//! let log = Log::new(Duration::from_secs(1), dir.path().join("app.log"), config);
//!
//! log.info("service started");
//! buflog::debug!(log, "loaded {} routes", 12);
//!
//! log.pause();
//! log.info("dropped while paused");
//! log.resume();
//!
//! log.shutdown();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod bridge;
pub mod config;
pub mod db;
pub mod filter;
pub mod layout;
pub mod trap;

mod clock;
mod error;
mod level;
mod logger;
mod macros;

pub use self::config::Config;
pub use self::config::Environment;
pub use self::error::Error;
pub use self::level::Level;
pub use self::logger::ESTIMATED_LINE_SIZE;
pub use self::logger::Log;
