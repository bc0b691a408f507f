use std::sync::LazyLock;

use regex::Regex;

use super::normalize::normalize;
use crate::catalog::CourseRecord;

/// `<CODE>. <TITLE>. (<CREDITS>)` at the start of a fragment.
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{2,}\s*\d+[A-Za-z]*)\.\s*(.*?)\.\s*\((.*?)\)").unwrap()
});
static LEADING_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,}\s*\d+[A-Za-z]*").unwrap());
static ELECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:elective|optional course)\b").unwrap());
static PREREQ_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Prerequisite(?:\(s\))?:").unwrap());
static ATTRIBUTE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Attribute\(s\):").unwrap());

/// How the course header was recovered from a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    /// Code, title and credits all matched.
    Strict,
    /// Header malformed; only a leading code token was found.
    CodeOnly,
    /// Header malformed and no code found.
    Missing,
}

#[derive(Debug, Clone)]
pub struct ParsedFragment {
    pub record: CourseRecord,
    pub header: Header,
}

/// Parse one course fragment into a record. Never fails; see [`parse_fragment`].
pub fn extract(fragment: &str, department: &str) -> CourseRecord {
    parse_fragment(fragment, department).record
}

/// Parse one course fragment, also reporting how much of the header matched.
///
/// When the strict header does not match, the whole fragment becomes the
/// description and only a leading code token is salvaged. Elective,
/// prerequisite and attribute detection always run on the full fragment.
pub fn parse_fragment(fragment: &str, department: &str) -> ParsedFragment {
    let text = normalize(fragment);

    let (course_code, title, credits, description, header) = match HEADER_RE.captures(&text) {
        Some(caps) => {
            let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
            (
                Some(normalize(&caps[1])),
                Some(normalize(&caps[2])),
                Some(normalize(&caps[3])),
                normalize(&text[end..]),
                Header::Strict,
            )
        }
        None => {
            let code = LEADING_CODE_RE.find(&text).map(|m| normalize(m.as_str()));
            let header = if code.is_some() { Header::CodeOnly } else { Header::Missing };
            (code, None, None, text.clone(), header)
        }
    };

    let record = CourseRecord {
        course_code,
        title,
        description,
        credits,
        prerequisites: prerequisites(&text),
        attributes: attributes(&text),
        department: department.to_string(),
        elective: ELECTIVE_RE.is_match(&text),
    };

    ParsedFragment { record, header }
}

/// Text after "Prerequisite(s):" up to the next "Attribute(s):" label.
/// The sentence-ending period before the next label is dropped.
fn prerequisites(text: &str) -> Option<String> {
    let label = PREREQ_LABEL_RE.find(text)?;
    let rest = &text[label.end()..];
    let end = ATTRIBUTE_LABEL_RE.find(rest).map(|m| m.start()).unwrap_or(rest.len());
    let value = normalize(&rest[..end]);
    let value = value.strip_suffix('.').unwrap_or(&value).trim_end();
    non_empty(value)
}

/// Everything after "Attribute(s):".
fn attributes(text: &str) -> Option<String> {
    let label = ATTRIBUTE_LABEL_RE.find(text)?;
    non_empty(text[label.end()..].trim())
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

// ── Tests ──
