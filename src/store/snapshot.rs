use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::info;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::{StoreError, json::create_parent};

pub const DEFAULT_SNAPSHOT_LOG: &str = "var/models/snapshots.jsonl";

/// Resolves a model repository into a local snapshot folder, downloading it
/// if needed.
pub trait SnapshotSource {
    fn download(&self, repo_id: &str, allow_patterns: Option<&[String]>)
    -> Result<PathBuf, StoreError>;
}

/// Line of the snapshot log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub repo_id: String,
    pub resolved_revision: String,
    pub snapshot_path: String,
    pub timestamp_utc: String,
    pub files: Vec<String>,
}

impl SnapshotRecord {
    /// The revision is the name of the snapshot folder; files are listed
    /// relative to it. With `allow_patterns`, only files matching one of the
    /// globs are listed.
    pub fn from_snapshot(
        repo_id: &str,
        snapshot: &Path,
        allow_patterns: Option<&[String]>,
    ) -> Result<Self, StoreError> {
        let filter = allow_patterns.map(pattern_set).transpose()?;
        let mut files = Vec::new();
        for entry in WalkDir::new(snapshot).sort_by_file_name() {
            let entry =
                entry.map_err(|err| StoreError::ListFiles(err, snapshot.display().to_string()))?;
            if !entry.path().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(snapshot) else {
                continue;
            };
            if filter.as_ref().is_some_and(|set| !set.is_match(relative)) {
                continue;
            }
            files.push(relative.display().to_string());
        }
        let resolved_revision = snapshot
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            repo_id: repo_id.to_owned(),
            resolved_revision,
            snapshot_path: snapshot.display().to_string(),
            timestamp_utc: Utc::now().to_rfc3339(),
            files,
        })
    }
}

fn pattern_set(patterns: &[String]) -> Result<GlobSet, StoreError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| StoreError::Pattern(err, pattern.clone()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| StoreError::Pattern(err, patterns.join(", ")))
}

/// Appends `value` to a JSON lines file.
pub fn append_json_line<T: Serialize>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), StoreError> {
    let path = path.as_ref();
    create_parent(path)?;
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(line.as_bytes()))
        .map_err(|err| StoreError::Write(err, path.display().to_string()))
}

/// Downloads a snapshot through `source` and appends its record to `log_path`.
pub fn download_and_log(
    source: &impl SnapshotSource,
    repo_id: &str,
    allow_patterns: Option<&[String]>,
    log_path: impl AsRef<Path>,
) -> Result<SnapshotRecord, StoreError> {
    let snapshot = source
        .download(repo_id, allow_patterns)
        .map_err(|err| StoreError::Download(repo_id.to_owned(), Box::new(err)))?;
    let record = SnapshotRecord::from_snapshot(repo_id, &snapshot, allow_patterns)?;
    append_json_line(log_path.as_ref(), &record)?;
    info!(
        "logged snapshot {} of {} ({} files)",
        record.resolved_revision,
        repo_id,
        record.files.len()
    );
    Ok(record)
}

/// Snapshots already present in a local hub cache.
///
/// A repository `org/name` lives in `models--org--name`, whose `refs/main`
/// holds the revision of the folder under `snapshots/`. Cached snapshots are
/// complete, so the allow patterns only restrict the logged file list.
pub struct HubCache {
    root: PathBuf,
}

impl HubCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SnapshotSource for HubCache {
    fn download(
        &self,
        repo_id: &str,
        _allow_patterns: Option<&[String]>,
    ) -> Result<PathBuf, StoreError> {
        let repo_dir = self
            .root
            .join(format!("models--{}", repo_id.replace('/', "--")));
        let main_ref = repo_dir.join("refs").join("main");
        let revision = fs::read_to_string(&main_ref)
            .map_err(|err| StoreError::Read(err, main_ref.display().to_string()))?;
        let snapshot = repo_dir.join("snapshots").join(revision.trim());
        if !snapshot.is_dir() {
            return Err(StoreError::Read(
                io::Error::new(io::ErrorKind::NotFound, "snapshot folder not found"),
                snapshot.display().to_string(),
            ));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_cache(root: &Path) -> PathBuf {
        let repo_dir = root.join("models--org--tiny-model");
        let snapshot = repo_dir.join("snapshots").join("abc123");
        fs::create_dir_all(snapshot.join("tokenizer")).unwrap();
        fs::create_dir_all(repo_dir.join("refs")).unwrap();
        fs::write(repo_dir.join("refs/main"), "abc123\n").unwrap();
        fs::write(snapshot.join("config.json"), "{}").unwrap();
        fs::write(snapshot.join("tokenizer").join("vocab.txt"), "a\nb\n").unwrap();
        snapshot
    }

    #[test]
    fn record_lists_files() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = fake_cache(dir.path());

        let record = SnapshotRecord::from_snapshot("org/tiny-model", &snapshot, None).unwrap();

        assert_eq!(record.resolved_revision, "abc123");
        assert_eq!(
            record.files,
            vec![
                "config.json".to_string(),
                Path::new("tokenizer").join("vocab.txt").display().to_string()
            ]
        );
        assert!(record.timestamp_utc.ends_with("+00:00"));
    }

    #[test]
    fn download_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = fake_cache(dir.path());
        let cache = HubCache::new(dir.path());
        let log_path = dir.path().join("var/models/snapshots.jsonl");

        let record = download_and_log(&cache, "org/tiny-model", None, &log_path).unwrap();
        download_and_log(&cache, "org/tiny-model", None, &log_path).unwrap();

        assert_eq!(record.snapshot_path, snapshot.display().to_string());
        let contents = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: SnapshotRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.repo_id, "org/tiny-model");
        assert_eq!(first.files.len(), 2);
    }

    #[test]
    fn allow_patterns_filter_files() {
        let dir = tempfile::tempdir().unwrap();
        fake_cache(dir.path());
        let cache = HubCache::new(dir.path());
        let log_path = dir.path().join("snapshots.jsonl");
        let patterns = ["*.json".to_string()];

        let record =
            download_and_log(&cache, "org/tiny-model", Some(&patterns[..]), &log_path).unwrap();

        assert_eq!(record.files, vec!["config.json".to_string()]);
        let logged: SnapshotRecord =
            serde_json::from_str(fs::read_to_string(&log_path).unwrap().trim()).unwrap();
        assert_eq!(logged.files, vec!["config.json".to_string()]);
    }

    #[test]
    fn nested_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = fake_cache(dir.path());
        let patterns = ["tokenizer/*".to_string()];

        let record =
            SnapshotRecord::from_snapshot("org/tiny-model", &snapshot, Some(&patterns[..])).unwrap();

        assert_eq!(
            record.files,
            vec![Path::new("tokenizer").join("vocab.txt").display().to_string()]
        );
    }

    #[test]
    fn invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = fake_cache(dir.path());
        let patterns = ["[config".to_string()];

        let err = SnapshotRecord::from_snapshot("org/tiny-model", &snapshot, Some(&patterns[..]))
            .unwrap_err();

        assert!(matches!(err, StoreError::Pattern(_, ref p) if p == "[config"));
    }

    #[test]
    fn missing_repository() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HubCache::new(dir.path());
        let log_path = dir.path().join("snapshots.jsonl");

        let err = download_and_log(&cache, "org/missing", None, &log_path).unwrap_err();

        assert!(matches!(err, StoreError::Download(ref repo, _) if repo == "org/missing"));
        assert!(!log_path.exists());
    }
}
