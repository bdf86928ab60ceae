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
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use buflog::Config;
use buflog::Environment;
use buflog::Log;
use tempfile::TempDir;

const WRITERS: usize = 8;
const LINES_PER_WRITER: usize = 500;

fn ordinal_of(path: &Path) -> u64 {
    let stem = path.file_stem().unwrap().to_str().unwrap();
    stem.rsplit_once('_').unwrap().1.parse().unwrap()
}

/// Concatenate every log file in the directory, oldest ordinal first.
fn read_all(dir: &Path) -> String {
    let mut files = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect::<Vec<PathBuf>>();
    files.sort_by_key(|path| ordinal_of(path));
    files
        .iter()
        .map(|path| fs::read_to_string(path).unwrap())
        .collect()
}

fn run_writers(file_size: u64) -> (TempDir, String) {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let config = Config::default()
        .environment(Environment::Product)
        .time_format("%H:%M:%S")
        .file_size(file_size);
    let log = Log::new(
        Duration::from_millis(5),
        temp_dir.path().join("app.log"),
        config,
    );

    let handles = (0..WRITERS)
        .map(|writer| {
            let log = log.clone();
            std::thread::spawn(move || {
                for i in 0..LINES_PER_WRITER {
                    buflog::info!(log, "writer={writer} seq={i}");
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    log.shutdown();
    let content = read_all(temp_dir.path());
    (temp_dir, content)
}

fn check_every_line_once_in_order(content: &str) {
    let mut next_seq = [0usize; WRITERS];
    let mut total = 0;
    for line in content.lines() {
        let (_, message) = line.split_once("] ").unwrap();
        let (writer, seq) = message.split_once(' ').unwrap();
        let writer = writer.strip_prefix("writer=").unwrap().parse::<usize>().unwrap();
        let seq = seq.strip_prefix("seq=").unwrap().parse::<usize>().unwrap();

        assert_eq!(seq, next_seq[writer], "writer {writer} out of order");
        next_seq[writer] += 1;
        total += 1;
    }

    assert_eq!(total, WRITERS * LINES_PER_WRITER);
    assert!(next_seq.iter().all(|&n| n == LINES_PER_WRITER));
}

#[test]
fn test_concurrent_writers_lose_nothing() {
    let (temp_dir, content) = run_writers(1 << 30);
    check_every_line_once_in_order(&content);
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_concurrent_writers_across_rotations() {
    // small enough to cross both the flush watermark and the rotation threshold
    let (temp_dir, content) = run_writers(16 * 1024);
    check_every_line_once_in_order(&content);
    assert!(fs::read_dir(temp_dir.path()).unwrap().count() > 1);
}
