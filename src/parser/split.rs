use std::sync::LazyLock;

use regex::Regex;

use super::normalize::normalize;

/// Course code followed by a period: "CS 4100.", "CHEM1211L.".
static BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{2,}\s*\d{4}[A-Za-z]*\.").unwrap());

/// A split blob: course fragments plus whatever text preceded the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Split {
    pub fragments: Vec<String>,
    /// Normalized text before the first boundary. Belongs to no course.
    pub leading: String,
}

/// Partition a raw blob into per-course fragments.
///
/// The blob is normalized first. Each fragment runs from one boundary match up
/// to the next one (or the end of the blob). A blob with no boundary yields no
/// fragments and empty `leading`; the caller decides whether to keep it.
pub fn split_blob(blob: &str) -> Split {
    let text = normalize(blob);
    let starts: Vec<usize> = BOUNDARY_RE.find_iter(&text).map(|m| m.start()).collect();
    let Some(&first) = starts.first() else {
        return Split::default();
    };

    let fragments = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end].trim()
        })
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();

    Split {
        fragments,
        leading: text[..first].trim().to_string(),
    }
}

/// Fragments only; text before the first boundary is discarded.
pub fn split_fragments(blob: &str) -> Vec<String> {
    split_blob(blob).fragments
}

// ── Tests ──
