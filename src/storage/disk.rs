use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::base::{PersistSummary, SnapshotStore, StorageResult};
use crate::collector::RunRecord;

pub const HISTORICAL_DIR: &str = "historical";
pub const LATEST_FILE: &str = "latest.json";
pub const LEDGER_FILE: &str = "popularity_scores.csv";
const LEDGER_HEADER: &str = "artist_name,date,popularity_score,followers,monthly_listeners,youtube_subscribers,youtube_total_views,youtube_video_count";

/// Writes run records under a base directory:
///
/// - `historical/<date>.json`, one snapshot per run date
/// - `latest.json`, the most recent run
/// - `popularity_scores.csv`, one flattened row per artist and date
#[derive(Debug, Clone)]
pub struct DiskSnapshotStore {
    base_path: PathBuf,
}

impl DiskSnapshotStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn write_json(&self, path: &Path, record: &RunRecord) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(path, json).await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    /// Appends rows for artists not yet recorded on this date.
    async fn append_ledger(&self, path: &Path, record: &RunRecord) -> StorageResult<usize> {
        let existing = match fs::read_to_string(path).await {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let recorded: HashSet<(String, String)> = existing
            .as_deref()
            .map(|contents| contents.lines().skip(1).filter_map(ledger_key).collect())
            .unwrap_or_default();

        let date = record.date.to_string();
        let mut output = String::new();
        if existing.as_deref().map_or(true, str::is_empty) {
            output.push_str(LEDGER_HEADER);
            output.push('\n');
        } else if existing.as_deref().is_some_and(|contents| !contents.ends_with('\n')) {
            output.push('\n');
        }

        let mut rows = 0;
        for artist in &record.artists {
            if recorded.contains(&(artist.name.clone(), date.clone())) {
                debug!("Ledger already has {} for {}", artist.name, date);
                continue;
            }
            let fields = [
                csv_field(&artist.name),
                date.clone(),
                artist.spotify.popularity_score.to_string(),
                artist.spotify.followers.to_string(),
                artist.spotify.monthly_listeners.to_string(),
                artist.youtube.subscribers.to_string(),
                artist.youtube.total_views.to_string(),
                artist.youtube.video_count.to_string(),
            ];
            output.push_str(&fields.join(","));
            output.push('\n');
            rows += 1;
        }

        if rows > 0 {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(output.as_bytes()).await?;
            file.flush().await?;
        }
        Ok(rows)
    }
}

#[async_trait]
impl SnapshotStore for DiskSnapshotStore {
    async fn persist(&self, record: &RunRecord) -> StorageResult<PersistSummary> {
        let historical_dir = self.base_path.join(HISTORICAL_DIR);
        fs::create_dir_all(&historical_dir).await?;

        let historical = historical_dir.join(format!("{}.json", record.date));
        self.write_json(&historical, record).await?;

        let latest = self.base_path.join(LATEST_FILE);
        self.write_json(&latest, record).await?;

        let ledger = self.base_path.join(LEDGER_FILE);
        let rows_appended = self.append_ledger(&ledger, record).await?;
        info!(
            "Saved {} artists to {} ({} new CSV rows)",
            record.artists.len(),
            self.base_path.display(),
            rows_appended
        );

        Ok(PersistSummary {
            historical,
            latest,
            ledger,
            rows_appended,
        })
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `(artist_name, date)` of one ledger line.
fn ledger_key(line: &str) -> Option<(String, String)> {
    let (name, rest) = if let Some(quoted) = line.strip_prefix('"') {
        let mut name = String::new();
        let mut chars = quoted.char_indices();
        loop {
            let (index, c) = chars.next()?;
            if c != '"' {
                name.push(c);
                continue;
            }
            if quoted[index + 1..].starts_with('"') {
                name.push('"');
                chars.next();
            } else {
                break (name, quoted[index + 1..].strip_prefix(',')?);
            }
        }
    } else {
        let (name, rest) = line.split_once(',')?;
        (name.to_string(), rest)
    };

    let date = rest.split(',').next()?;
    Some((name, date.to_string()))
}
