use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, trace};

const FILE_SUFFIX: &str = "-app.log";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Size at which a file is rolled over unless configured otherwise (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Number of days files are kept unless configured otherwise
pub const DEFAULT_RETENTION_DAYS: i64 = 14;

/// Line-oriented archive writing one file per day
///
/// Lines are appended to `<directory>/<YYYY-MM-DD>-app.log`. Once a file would exceed the
/// maximum size it is renamed with the next free numeric suffix (`.1`, `.2`, ...) and a fresh
/// file is started. Files dated before the retention period are deleted once per day.
pub struct RotatingFileArchive {
    directory: PathBuf,
    max_size: u64,
    retention: Duration,
    last_prune: Mutex<Option<NaiveDate>>,
}

impl RotatingFileArchive {
    /// Creates a new archive, the directory is created on first write
    pub fn new(directory: impl Into<PathBuf>, max_size: u64, retention: Duration) -> Self {
        Self {
            directory: directory.into(),
            max_size,
            retention,
            last_prune: Mutex::new(None),
        }
    }

    /// Directory containing the archive files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file receiving lines on a given day
    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.directory
            .join(format!("{}{}", date.format(DATE_FORMAT), FILE_SUFFIX))
    }

    /// Appends a line using the current time
    pub async fn append(&self, line: &str) -> io::Result<()> {
        self.append_at(line, Utc::now()).await
    }

    /// Appends a line to the file of the day `now` falls on
    pub async fn append_at(&self, line: &str, now: DateTime<Utc>) -> io::Result<()> {
        let date = now.date_naive();
        let mut last_prune = self.last_prune.lock().await;

        fs::create_dir_all(&self.directory).await?;

        if *last_prune != Some(date) {
            self.prune(date).await?;
            *last_prune = Some(date);
        }

        let path = self.file_for(date);
        let incoming = line.len() as u64 + 1;

        if let Ok(metadata) = fs::metadata(&path).await {
            if metadata.len() > 0 && metadata.len() + incoming > self.max_size {
                self.roll_over(&path).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;

        trace!(?path, "Appended line to archive");
        Ok(())
    }

    /// Deletes files dated before the retention period, returns the number of deleted files
    pub async fn prune(&self, today: NaiveDate) -> io::Result<usize> {
        let cutoff = today - self.retention;
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let date = name.to_str().and_then(archive_date);

            if matches!(date, Some(date) if date < cutoff) {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, %cutoff, "Pruned expired archive files");
        }

        Ok(removed)
    }

    async fn roll_over(&self, path: &Path) -> io::Result<()> {
        let mut index = 1;

        loop {
            let mut candidate = path.as_os_str().to_owned();
            candidate.push(format!(".{}", index));
            let candidate = PathBuf::from(candidate);

            if fs::metadata(&candidate).await.is_err() {
                debug!(?path, ?candidate, "Rolling over archive file");
                return fs::rename(path, candidate).await;
            }

            index += 1;
        }
    }
}

fn archive_date(file_name: &str) -> Option<NaiveDate> {
    if !file_name.contains(FILE_SUFFIX) {
        return None;
    }

    NaiveDate::parse_from_str(file_name.get(..10)?, DATE_FORMAT).ok()
}

#[cfg(test)]
mod does {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn write_one_file_per_day() {
        let dir = tempdir().unwrap();
        let archive =
            RotatingFileArchive::new(dir.path(), DEFAULT_MAX_FILE_SIZE, Duration::days(14));

        archive.append_at("first", at(2021, 5, 1)).await.unwrap();
        archive.append_at("second", at(2021, 5, 1)).await.unwrap();
        archive.append_at("third", at(2021, 5, 2)).await.unwrap();

        let first = std::fs::read_to_string(dir.path().join("2021-05-01-app.log")).unwrap();
        let second = std::fs::read_to_string(dir.path().join("2021-05-02-app.log")).unwrap();

        assert_eq!(first, "first\nsecond\n");
        assert_eq!(second, "third\n");
    }

    #[tokio::test]
    async fn roll_over_large_files() {
        let dir = tempdir().unwrap();
        let archive = RotatingFileArchive::new(dir.path(), 16, Duration::days(14));
        let now = at(2021, 5, 1);

        archive.append_at("0123456789", now).await.unwrap();
        archive.append_at("abcdefghij", now).await.unwrap();
        archive.append_at("ABCDEFGHIJ", now).await.unwrap();

        let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();

        assert_eq!(read("2021-05-01-app.log.1"), "0123456789\n");
        assert_eq!(read("2021-05-01-app.log.2"), "abcdefghij\n");
        assert_eq!(read("2021-05-01-app.log"), "ABCDEFGHIJ\n");
    }

    #[tokio::test]
    async fn delete_expired_files() {
        let dir = tempdir().unwrap();
        let archive =
            RotatingFileArchive::new(dir.path(), DEFAULT_MAX_FILE_SIZE, Duration::days(14));

        std::fs::write(dir.path().join("2021-04-01-app.log"), "old\n").unwrap();
        std::fs::write(dir.path().join("2021-04-01-app.log.1"), "old\n").unwrap();
        std::fs::write(dir.path().join("2021-04-20-app.log"), "recent\n").unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), "keep\n").unwrap();

        assert_eq!(archive.prune(date(2021, 5, 1)).await.unwrap(), 2);

        assert!(!dir.path().join("2021-04-01-app.log").exists());
        assert!(!dir.path().join("2021-04-01-app.log.1").exists());
        assert!(dir.path().join("2021-04-20-app.log").exists());
        assert!(dir.path().join("unrelated.txt").exists());
    }

    #[tokio::test]
    async fn prune_when_the_day_changes() {
        let dir = tempdir().unwrap();
        let archive =
            RotatingFileArchive::new(dir.path(), DEFAULT_MAX_FILE_SIZE, Duration::days(1));

        archive.append_at("day one", at(2021, 5, 1)).await.unwrap();
        archive.append_at("day five", at(2021, 5, 5)).await.unwrap();

        assert!(!dir.path().join("2021-05-01-app.log").exists());
        assert!(dir.path().join("2021-05-05-app.log").exists());
    }

    #[tokio::test]
    async fn tolerate_missing_directories() {
        let dir = tempdir().unwrap();
        let archive = RotatingFileArchive::new(dir.path().join("missing"), 16, Duration::days(1));

        assert_eq!(archive.prune(date(2021, 5, 1)).await.unwrap(), 0);
    }
}
