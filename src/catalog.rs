use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::ParsedEntry;
use crate::report::{preview, ParseIssue, RunReport};

/// One structured course. `description` and `department` are always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub course_code: Option<String>,
    pub title: Option<String>,
    pub description: String,
    pub credits: Option<String>,
    pub prerequisites: Option<String>,
    pub attributes: Option<String>,
    pub department: String,
    #[serde(default)]
    pub elective: bool,
}

/// Course code → record, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CourseRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the record unless its code is missing or already taken.
    /// The first record for a code is kept verbatim.
    pub fn insert(&mut self, record: CourseRecord) -> Result<(), ParseIssue> {
        let Some(code) = record.course_code.clone() else {
            return Err(ParseIssue::MissingCode { preview: preview(&record.description, 60) });
        };
        if self.index.contains_key(&code) {
            return Err(ParseIssue::DuplicateCode { code });
        }
        self.index.insert(code, self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Merge one entry's pipeline output, counting everything into `report`.
    pub fn absorb(&mut self, parsed: ParsedEntry, report: &mut RunReport) {
        report.entries += 1;
        report.blobs += parsed.blobs;
        report.fragments += parsed.fragments;
        report.records += parsed.records.len();
        for issue in &parsed.issues {
            report.note(issue);
        }
        for record in parsed.records {
            if let Err(issue) = self.insert(record) {
                debug!("{}", issue);
                report.note(&issue);
            }
        }
        report.courses = self.len();
    }

    pub fn get(&self, code: &str) -> Option<&CourseRecord> {
        self.index.get(code).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CourseRecord> {
        self.records
    }
}

/// Deduplicate a record stream: first-seen wins, records without a code are dropped.
pub fn aggregate<I>(records: I) -> Catalog
where
    I: IntoIterator<Item = CourseRecord>,
{
    let mut catalog = Catalog::new();
    for record in records {
        // Rejections are a data condition, not a failure.
        let _ = catalog.insert(record);
    }
    catalog
}

/// Write the catalog as a pretty-printed JSON array.
pub fn write_json(path: &Path, catalog: &Catalog) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, catalog.records())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: Option<&str>, title: &str) -> CourseRecord {
        CourseRecord {
            course_code: code.map(str::to_string),
            title: Some(title.to_string()),
            description: String::new(),
            credits: None,
            prerequisites: None,
            attributes: None,
            department: "CS".to_string(),
            elective: false,
        }
    }

    #[test]
    fn first_seen_wins() {
        let catalog = aggregate(vec![
            record(Some("CS 2500"), "first"),
            record(Some("CS 1800"), "discrete"),
            record(Some("CS 2500"), "second"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("CS 2500").and_then(|r| r.title.as_deref()), Some("first"));
        let codes: Vec<_> = catalog.iter().filter_map(|r| r.course_code.as_deref()).collect();
        assert_eq!(codes, vec!["CS 2500", "CS 1800"]);
    }

    #[test]
    fn uncoded_records_are_excluded() {
        let catalog = aggregate(vec![record(None, "orphan"), record(Some("DS 3000"), "data")]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.iter().all(|r| r.course_code.is_some()));
    }

    #[test]
    fn insert_reports_rejections() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(record(Some("CS 3000"), "a")).is_ok());
        assert_eq!(
            catalog.insert(record(Some("CS 3000"), "b")),
            Err(ParseIssue::DuplicateCode { code: "CS 3000".into() })
        );
        assert!(matches!(
            catalog.insert(record(None, "c")),
            Err(ParseIssue::MissingCode { .. })
        ));
    }

    #[test]
    fn codes_are_unique_for_any_input() {
        let codes = ["A 1", "BB 2", "A 1", "CC 3", "BB 2", "BB 2", "DD 4"];
        let input: Vec<_> = codes
            .iter()
            .enumerate()
            .map(|(i, c)| record(Some(*c), &i.to_string()))
            .collect();
        let catalog = aggregate(input.clone());
        let mut seen = std::collections::HashSet::new();
        for r in catalog.iter() {
            assert!(seen.insert(r.course_code.clone().unwrap()));
            let first = input.iter().find(|x| x.course_code == r.course_code).unwrap();
            assert_eq!(r, first);
        }
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn json_export_keeps_order_and_nulls() {
        let catalog = aggregate(vec![record(Some("CS 2"), "b"), record(Some("CS 1"), "a")]);
        let path = std::env::temp_dir().join(format!("catalog_export_{}.json", std::process::id()));
        write_json(&path, &catalog).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let back: Vec<CourseRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, catalog.into_records());
        assert!(text.contains("\"credits\": null"));
        assert!(text.find("CS 2").unwrap() < text.find("CS 1").unwrap());
    }
}
