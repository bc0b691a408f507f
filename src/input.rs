use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const UNKNOWN_DEPARTMENT: &str = "UNKNOWN";

/// One scraped catalog page: its URL and the raw course blobs found on it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScrapeEntry {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub courses: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScrapeFile {
    Many(Vec<RawScrapeEntry>),
    One(RawScrapeEntry),
}

impl RawScrapeEntry {
    pub fn blobs(&self) -> &[String] {
        self.courses.as_deref().unwrap_or_default()
    }

    /// Second-to-last path segment of the URL, uppercased.
    /// ".../course-descriptions/cs/" gives "CS".
    pub fn department(&self) -> Option<String> {
        department_from_url(self.url.as_deref()?)
    }
}

pub fn department_from_url(url: &str) -> Option<String> {
    let parts: Vec<&str> = url.split('/').collect();
    if parts.len() < 2 {
        return None;
    }
    let segment = parts[parts.len() - 2].trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_uppercase())
    }
}

/// Load scrape results. A single top-level object counts as one entry.
pub fn load_entries(path: &Path) -> Result<Vec<RawScrapeEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_entries(&raw).with_context(|| format!("Invalid scrape results in {}", path.display()))
}

pub fn parse_entries(json: &str) -> Result<Vec<RawScrapeEntry>> {
    let entries = match serde_json::from_str::<ScrapeFile>(json)? {
        ScrapeFile::Many(v) => v,
        ScrapeFile::One(e) => vec![e],
    };
    Ok(entries)
}

// ── Tests ──
