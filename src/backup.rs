use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// One stored snapshot of a base file.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackupVersion {
    pub key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    pub size: u64,
}

impl Display for BackupVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

/// Versions grouped by the base filename they are a backup of.
pub type VersionHistory = BTreeMap<String, Vec<BackupVersion>>;

pub fn newest_first(versions: &mut [BackupVersion]) {
    versions.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
}

/// Human readable size using powers of 1024, at most two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    while unit + 1 < SIZE_UNITS.len() && bytes >= 1024u64.pow(unit as u32 + 1) {
        unit += 1;
    }
    let scaled = bytes as f64 / 1024f64.powi(unit as i32);
    // Ties round up; f64's Display drops the trailing zeros.
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

pub fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| timestamp.to_string())
}
