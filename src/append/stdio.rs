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

use std::io::Write;

use crate::Error;

/// Writes flushed blocks to stdout.
#[derive(Debug, Default)]
pub(crate) struct Stdout {}

impl Stdout {
    pub(crate) fn write_content(&self, content: &[u8]) -> Result<(), Error> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(content).map_err(Error::from_io_error)?;
        stdout.flush().map_err(Error::from_io_error)?;
        Ok(())
    }
}
