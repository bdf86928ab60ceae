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

use std::io;
use std::sync::Weak;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvTimeoutError;

use super::Shared;

/// The periodic flusher of one logger.
///
/// The worker only holds a weak reference, so dropping every [`Log`](crate::Log) handle
/// disconnects the shutdown channel and ends the thread.
pub(super) struct Worker {
    shared: Weak<Shared>,
    interval: Duration,
    shutdown: Receiver<()>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(super) enum WorkerState {
    Flushed,
    Paused,
    Shutdown,
    Disconnected,
}

impl Worker {
    pub(super) fn new(shared: Weak<Shared>, interval: Duration, shutdown: Receiver<()>) -> Worker {
        Self {
            shared,
            interval,
            shutdown,
        }
    }

    /// Wait one interval, then flush unless paused.
    ///
    /// A paused logger is re-checked after the next interval.
    pub(super) fn work(&self) -> WorkerState {
        match self.shutdown.recv_timeout(self.interval) {
            Err(RecvTimeoutError::Timeout) => match self.shared.upgrade() {
                Some(shared) if shared.is_paused() => WorkerState::Paused,
                Some(shared) => {
                    shared.flush();
                    WorkerState::Flushed
                }
                None => WorkerState::Disconnected,
            },
            Ok(()) => WorkerState::Shutdown,
            Err(RecvTimeoutError::Disconnected) => WorkerState::Disconnected,
        }
    }

    pub(super) fn make_thread(self, name: String) -> io::Result<JoinHandle<()>> {
        std::thread::Builder::new().name(name).spawn(move || {
            loop {
                match self.work() {
                    WorkerState::Flushed | WorkerState::Paused => {}
                    WorkerState::Shutdown | WorkerState::Disconnected => break,
                }
            }
        })
    }
}
