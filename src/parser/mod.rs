pub mod extract;
pub mod normalize;
pub mod split;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::catalog::{Catalog, CourseRecord};
use crate::input::{RawScrapeEntry, UNKNOWN_DEPARTMENT};
use crate::report::{preview, ParseIssue, RunReport};
use crate::settings::{NoBoundaryPolicy, Settings};
use extract::Header;
use normalize::normalize;

/// Pipeline output for one scrape entry, in blob order.
#[derive(Debug, Clone, Default)]
pub struct ParsedEntry {
    pub blobs: usize,
    pub fragments: usize,
    pub records: Vec<CourseRecord>,
    pub issues: Vec<ParseIssue>,
}

/// Normalize → split → extract for every blob of one entry.
pub fn process_entry(entry: &RawScrapeEntry, policy: NoBoundaryPolicy) -> ParsedEntry {
    let source_id = entry.url.as_deref().unwrap_or("<no url>");
    let mut out = ParsedEntry {
        blobs: entry.blobs().len(),
        ..ParsedEntry::default()
    };

    if let Some(message) = &entry.error {
        out.issues.push(ParseIssue::ScrapeFailed {
            url: source_id.to_string(),
            message: message.clone(),
        });
    }
    if entry.blobs().is_empty() {
        return out;
    }

    let department = entry.department().unwrap_or_else(|| {
        out.issues.push(ParseIssue::MissingIdentifier { identifier: entry.url.clone() });
        UNKNOWN_DEPARTMENT.to_string()
    });

    for blob in entry.blobs() {
        let split::Split { mut fragments, leading } = split::split_blob(blob);
        if !leading.is_empty() {
            out.issues.push(ParseIssue::LeadingTextDropped {
                source_id: source_id.to_string(),
                chars: leading.chars().count(),
            });
        }
        if fragments.is_empty() {
            let text = normalize(blob);
            if text.is_empty() {
                continue;
            }
            out.issues.push(ParseIssue::NoBoundaryFound {
                source_id: source_id.to_string(),
                chars: text.chars().count(),
            });
            match policy {
                NoBoundaryPolicy::Drop => continue,
                NoBoundaryPolicy::WholeBlob => fragments.push(text),
            }
        }

        out.fragments += fragments.len();
        for fragment in &fragments {
            let parsed = extract::parse_fragment(fragment, &department);
            if parsed.header != Header::Strict {
                out.issues.push(ParseIssue::MalformedFragment { preview: preview(fragment, 60) });
            }
            out.records.push(parsed.record);
        }
    }

    out
}

/// Run the pipeline over a batch of entries. Output order matches input order,
/// whether or not the batch is processed in parallel.
pub fn process_entries(entries: &[RawScrapeEntry], settings: &Settings) -> Vec<ParsedEntry> {
    if settings.parallel {
        entries
            .par_iter()
            .map(|e| process_entry(e, settings.no_boundary))
            .collect()
    } else {
        entries
            .iter()
            .map(|e| process_entry(e, settings.no_boundary))
            .collect()
    }
}

/// Merge parsed entries into the catalog in order, logging notable conditions.
pub fn merge_into(catalog: &mut Catalog, parsed: Vec<ParsedEntry>, report: &mut RunReport) {
    for entry in parsed {
        for issue in &entry.issues {
            match issue {
                ParseIssue::NoBoundaryFound { .. }
                | ParseIssue::LeadingTextDropped { .. }
                | ParseIssue::ScrapeFailed { .. } => warn!("{}", issue),
                _ => debug!("{}", issue),
            }
        }
        catalog.absorb(entry, report);
    }
}

/// Build the catalog for all entries.
pub fn build_catalog(entries: &[RawScrapeEntry], settings: &Settings) -> (Catalog, RunReport) {
    build_catalog_with(entries, settings, |_| {})
}

/// Build the catalog chunk by chunk, calling `on_chunk` with each chunk's
/// entry count once it has been merged.
pub fn build_catalog_with<F>(
    entries: &[RawScrapeEntry],
    settings: &Settings,
    mut on_chunk: F,
) -> (Catalog, RunReport)
where
    F: FnMut(usize),
{
    let mut catalog = Catalog::new();
    let mut report = RunReport::default();
    for chunk in entries.chunks(settings.chunk_size.max(1)) {
        let parsed = process_entries(chunk, settings);
        merge_into(&mut catalog, parsed, &mut report);
        on_chunk(chunk.len());
    }
    (catalog, report)
}

// ── Tests ──
