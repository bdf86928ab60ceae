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
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use jiff::Zoned;

use crate::Error;

const DEFAULT_EXTENSION: &str = "log";
const DATE_FORMAT: &str = "%Y%m%d";

/// Derive the first file of a logger from a user supplied template.
///
/// `logs/app.log` becomes `logs/app-20240301_0.log`; a template without extension such as
/// `logs/app` becomes `logs/app-20240301_0.log` as well.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use std::str::FromStr;
///
/// use buflog::append::initial_path;
///
/// let date = jiff::Zoned::from_str("2024-03-01T10:00:00[UTC]").unwrap();
/// let path = initial_path(Path::new("logs/app.log"), &date);
/// assert_eq!(path, Path::new("logs/app-20240301_0.log"));
/// ```
pub fn initial_path(template: &Path, date: &Zoned) -> PathBuf {
    let date = date.strftime(DATE_FORMAT);
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let filename = match template.extension() {
        Some(ext) => format!("{stem}-{date}_0.{}", ext.to_string_lossy()),
        None => format!("{stem}-{date}_0.{DEFAULT_EXTENSION}"),
    };
    template.with_file_name(filename)
}

/// Compute the path following `path` in the rotation sequence.
///
/// The filename is split into `<base>_<ordinal>[.<ext>]` and the ordinal is incremented, so
/// `app-20240301_3.log` is followed by `app-20240301_4.log`. Return `None` if the filename has no
/// numeric ordinal.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use buflog::append::next_path;
///
/// let next = next_path(Path::new("logs/app-20240301_3.log")).unwrap();
/// assert_eq!(next, Path::new("logs/app-20240301_4.log"));
/// assert!(next_path(Path::new("logs/app.log")).is_none());
/// ```
pub fn next_path(path: &Path) -> Option<PathBuf> {
    let filename = path.file_name()?.to_str()?;
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    };

    let (base, ordinal) = stem.rsplit_once('_')?;
    if ordinal.is_empty() || !ordinal.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let next = ordinal.parse::<u64>().ok()?.checked_add(1)?;

    let filename = match ext {
        Some(ext) => format!("{base}_{next}.{ext}"),
        None => format!("{base}_{next}"),
    };
    Some(path.with_file_name(filename))
}

/// A writer appending flushed blocks to size-rotated files.
///
/// Before each write the current target is checked: a missing file is created along with its
/// parent directories, and a file larger than the size threshold makes the writer move on to the
/// next ordinal. The ordinal never goes backward.
#[derive(Debug)]
pub struct RollingFileWriter {
    target: PathBuf,
    max_size: u64,
}

impl RollingFileWriter {
    /// Create a writer starting at `target`, rotating once a file grows beyond `max_size` bytes.
    pub fn new(target: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            target: target.into(),
            max_size,
        }
    }

    /// The file the next write goes to, unless it has to rotate first.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Resolve the target file and append `content` to it.
    ///
    /// # Errors
    ///
    /// Return an error if the target cannot be inspected, created, opened or written.
    pub fn write_content(&mut self, content: &[u8]) -> Result<(), Error> {
        self.resolve_target()?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.target)
            .map_err(|err| {
                Error::new("failed to open log file")
                    .with_context("path", self.target.display())
                    .with_source(err)
            })?;
        file.write_all(content).map_err(|err| {
            Error::new("failed to write log file")
                .with_context("path", self.target.display())
                .with_source(err)
        })
    }

    fn resolve_target(&mut self) -> Result<(), Error> {
        loop {
            match fs::metadata(&self.target) {
                Ok(metadata) if metadata.len() > self.max_size => match next_path(&self.target) {
                    Some(next) => self.target = next,
                    // nowhere to rotate to; keep growing the current file
                    None => return Ok(()),
                },
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => return self.create_target(),
                Err(err) => {
                    return Err(Error::new("failed to stat log file")
                        .with_context("path", self.target.display())
                        .with_source(err));
                }
            }
        }
    }

    fn create_target(&self) -> Result<(), Error> {
        match self.target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(|err| {
                    Error::new("failed to create log directory")
                        .with_context("path", dir.display())
                        .with_source(err)
                })?;
            }
            _ => {}
        }

        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.target)
            .map(|_| ())
            .map_err(|err| {
                Error::new("failed to create log file")
                    .with_context("path", self.target.display())
                    .with_source(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::str::FromStr;

    use jiff::Zoned;
    use rand::Rng;
    use rand::distr::Alphanumeric;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_initial_path() {
        let date = Zoned::from_str("2024-03-01T23:59:59+08[+08]").unwrap();
        assert_eq!(
            initial_path(Path::new("app.log"), &date),
            Path::new("app-20240301_0.log")
        );
        assert_eq!(
            initial_path(Path::new("logs/service.txt"), &date),
            Path::new("logs/service-20240301_0.txt")
        );
        assert_eq!(
            initial_path(Path::new("logs/app"), &date),
            Path::new("logs/app-20240301_0.log")
        );
    }

    #[test]
    fn test_next_path() {
        assert_eq!(
            next_path(Path::new("app-20240301_3.log")).unwrap(),
            Path::new("app-20240301_4.log")
        );
        assert_eq!(
            next_path(Path::new("logs/app-20240301_9.log")).unwrap(),
            Path::new("logs/app-20240301_10.log")
        );
        assert_eq!(
            next_path(Path::new("logs/app_1")).unwrap(),
            Path::new("logs/app_2")
        );
        // digits in the extension are left alone
        assert_eq!(
            next_path(Path::new("clip_1.mp4")).unwrap(),
            Path::new("clip_2.mp4")
        );
        assert!(next_path(Path::new("app.log")).is_none());
        assert!(next_path(Path::new("app_.log")).is_none());
        assert!(next_path(Path::new("app_1a.log")).is_none());
    }

    #[test]
    fn test_create_missing_target() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let target = temp_dir.path().join("nested/dir/app-20240301_0.log");

        let mut writer = RollingFileWriter::new(&target, 1024);
        writer.write_content(b"hello\n").unwrap();

        assert_eq!(writer.target(), target);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello\n");
    }

    #[test]
    fn test_rotate_oversized_target() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let target = temp_dir.path().join("app-20240301_3.log");
        fs::write(&target, "x".repeat(101)).unwrap();

        let mut writer = RollingFileWriter::new(&target, 100);
        writer.write_content(b"next\n").unwrap();

        let rotated = temp_dir.path().join("app-20240301_4.log");
        assert_eq!(writer.target(), rotated);
        assert_eq!(fs::read_to_string(&rotated).unwrap(), "next\n");
        assert_eq!(fs::read_to_string(&target).unwrap().len(), 101);
    }

    #[test]
    fn test_rotate_skips_every_oversized_file() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        for i in 0..3 {
            let path = temp_dir.path().join(format!("app-20240301_{i}.log"));
            fs::write(path, "x".repeat(11)).unwrap();
        }

        let mut writer = RollingFileWriter::new(temp_dir.path().join("app-20240301_0.log"), 10);
        writer.write_content(b"y").unwrap();
        assert_eq!(writer.target(), temp_dir.path().join("app-20240301_3.log"));
    }

    #[test]
    fn test_size_threshold_is_exclusive() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let target = temp_dir.path().join("app-20240301_0.log");
        fs::write(&target, "x".repeat(10)).unwrap();

        let mut writer = RollingFileWriter::new(&target, 10);
        writer.write_content(b"y").unwrap();
        assert_eq!(writer.target(), target);
        assert_eq!(fs::read_to_string(&target).unwrap().len(), 11);
    }

    #[test]
    fn test_file_rolling_via_file_size() {
        test_file_rolling_for_specific_file_size(1000);
        test_file_rolling_for_specific_file_size(8888);
        test_file_rolling_for_specific_file_size(10000);
    }

    fn test_file_rolling_for_specific_file_size(max_size: u64) {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let mut writer = RollingFileWriter::new(temp_dir.path().join("test-20240810_0.log"), max_size);

        let mut last_ordinal = 0;
        let mut written = 0;
        while written < max_size * 5 {
            let rand_str = generate_random_string();
            written += rand_str.len() as u64;
            writer.write_content(rand_str.as_bytes()).unwrap();

            let ordinal = ordinal_of(writer.target());
            assert!(ordinal >= last_ordinal, "rotation must never go backward");
            last_ordinal = ordinal;
        }

        let files = fs::read_dir(temp_dir.path()).unwrap().count() as u64;
        assert_eq!(files, last_ordinal + 1);
        for entry in fs::read_dir(temp_dir.path()).unwrap() {
            let entry = entry.unwrap();
            let len = entry.metadata().unwrap().len();
            // a file is only left once it exceeds the threshold, by at most one write
            assert!(len <= max_size + 100, "{} is {len} bytes", entry.path().display());
        }
    }

    fn ordinal_of(path: &Path) -> u64 {
        let stem = path.file_stem().unwrap().to_str().unwrap();
        stem.rsplit_once('_').unwrap().1.parse().unwrap()
    }

    fn generate_random_string() -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(50..=100);
        let random_string: String = std::iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .map(char::from)
            .take(len)
            .collect();

        random_string
    }
}
