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

//! Destinations for flushed content.

use crate::Environment;

mod rolling;
mod stdio;

pub use self::rolling::RollingFileWriter;
pub use self::rolling::initial_path;
pub use self::rolling::next_path;
pub(crate) use self::stdio::Stdout;

/// The destination a flushed block is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// Standard output.
    Console,
    /// The rotating file writer.
    File,
}

impl Sink {
    /// Choose the sink for a logger running in `environment`.
    ///
    /// The console wins in [`Environment::Console`], or when no file is configured.
    pub fn select(environment: Environment, has_file: bool) -> Sink {
        if environment == Environment::Console || !has_file {
            Sink::Console
        } else {
            Sink::File
        }
    }
}
