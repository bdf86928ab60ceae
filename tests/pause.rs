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

use std::fs;
use std::time::Duration;

use buflog::Config;
use buflog::Environment;
use buflog::Level;
use buflog::Log;
use tempfile::TempDir;

fn file_log(temp_dir: &TempDir, interval: Duration) -> Log {
    let config = Config::default()
        .environment(Environment::Develop)
        .time_format("%Y");
    Log::new(interval, temp_dir.path().join("app.log"), config)
}

#[test]
fn test_paused_lines_never_appear() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let log = file_log(&temp_dir, Duration::ZERO);

    log.info("before");
    log.pause();
    log.info("during");
    log.log(Level::Error, "during");
    buflog::warn!(log, "during {}", 1);
    log.flush();
    log.resume();
    log.info("after");
    log.flush();

    let content = fs::read_to_string(log.target_path().unwrap()).unwrap();
    assert!(content.contains("INFO] before\n"));
    assert!(content.contains("INFO] after\n"));
    assert!(!content.contains("during"));
}

#[test]
fn test_paused_logger_skips_periodic_flush() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let log = file_log(&temp_dir, Duration::from_millis(5));

    log.info("buffered");
    log.pause();
    // a flush already in flight when pausing may still complete
    std::thread::sleep(Duration::from_millis(20));
    let before = log.buffered();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(log.buffered(), before);

    log.resume();
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while log.buffered() > 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(log.buffered(), 0);

    log.shutdown();
    let content = fs::read_to_string(log.target_path().unwrap()).unwrap();
    assert!(content.ends_with("INFO] buffered\n"));
}
