use thiserror::Error;

/// Record-local conditions met while building a catalog. None of them stop a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIssue {
    #[error("fragment has no strict header: {preview}")]
    MalformedFragment { preview: String },
    #[error("blob from {source_id} has no course-code boundary ({chars} chars)")]
    NoBoundaryFound { source_id: String, chars: usize },
    #[error("text before the first course in a blob from {source_id} dropped ({chars} chars)")]
    LeadingTextDropped { source_id: String, chars: usize },
    #[error("cannot derive department from {identifier:?}")]
    MissingIdentifier { identifier: Option<String> },
    #[error("duplicate course code {code}")]
    DuplicateCode { code: String },
    #[error("record without course code dropped: {preview}")]
    MissingCode { preview: String },
    #[error("scrape of {url} failed: {message}")]
    ScrapeFailed { url: String, message: String },
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub entries: usize,
    pub blobs: usize,
    pub fragments: usize,
    pub records: usize,
    pub courses: usize,
    pub malformed: usize,
    pub unbounded_blobs: usize,
    pub leading_text_dropped: usize,
    pub missing_identifier: usize,
    pub duplicates: usize,
    pub uncoded: usize,
    pub scrape_errors: usize,
}

impl RunReport {
    pub fn note(&mut self, issue: &ParseIssue) {
        match issue {
            ParseIssue::MalformedFragment { .. } => self.malformed += 1,
            ParseIssue::NoBoundaryFound { .. } => self.unbounded_blobs += 1,
            ParseIssue::LeadingTextDropped { .. } => self.leading_text_dropped += 1,
            ParseIssue::MissingIdentifier { .. } => self.missing_identifier += 1,
            ParseIssue::DuplicateCode { .. } => self.duplicates += 1,
            ParseIssue::MissingCode { .. } => self.uncoded += 1,
            ParseIssue::ScrapeFailed { .. } => self.scrape_errors += 1,
        }
    }

    pub fn print(&self) {
        println!(
            "Read {} entries, {} blobs -> {} fragments -> {} records.",
            self.entries, self.blobs, self.fragments, self.records
        );
        println!(
            "Kept {} courses ({} duplicates, {} without code).",
            self.courses, self.duplicates, self.uncoded
        );
        println!(
            "Malformed headers: {} | blobs without boundary: {} | leading text dropped: {} | unknown department: {} | failed pages: {}",
            self.malformed,
            self.unbounded_blobs,
            self.leading_text_dropped,
            self.missing_identifier,
            self.scrape_errors
        );
    }
}

/// First `max` chars of a fragment, for log lines.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

// ── Tests ──
