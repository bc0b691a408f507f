use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::catalog::CourseRecord;
use crate::report::RunReport;

pub const DEFAULT_DB_PATH: &str = "data/catalog.sqlite";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS runs (
            id                 INTEGER PRIMARY KEY,
            input              TEXT NOT NULL,
            entries            INTEGER NOT NULL,
            blobs              INTEGER NOT NULL,
            fragments          INTEGER NOT NULL,
            records            INTEGER NOT NULL,
            courses            INTEGER NOT NULL,
            malformed          INTEGER NOT NULL,
            unbounded_blobs    INTEGER NOT NULL,
            leading_dropped    INTEGER NOT NULL,
            missing_identifier INTEGER NOT NULL,
            duplicates         INTEGER NOT NULL,
            uncoded            INTEGER NOT NULL,
            scrape_errors      INTEGER NOT NULL,
            created_at         TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS courses (
            course_code   TEXT PRIMARY KEY,
            position      INTEGER NOT NULL,
            title         TEXT,
            description   TEXT NOT NULL,
            credits       TEXT,
            prerequisites TEXT,
            attributes    TEXT,
            department    TEXT NOT NULL,
            elective      BOOLEAN NOT NULL DEFAULT 0,
            run_id        INTEGER REFERENCES runs(id),
            updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_courses_department ON courses(department);
        ",
    )?;
    Ok(())
}

// ── Runs ──

pub fn insert_run(conn: &Connection, input: &str, r: &RunReport) -> Result<i64> {
    conn.execute(
        "INSERT INTO runs
         (input, entries, blobs, fragments, records, courses, malformed, unbounded_blobs,
          leading_dropped, missing_identifier, duplicates, uncoded, scrape_errors)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
        rusqlite::params![
            input,
            r.entries as i64,
            r.blobs as i64,
            r.fragments as i64,
            r.records as i64,
            r.courses as i64,
            r.malformed as i64,
            r.unbounded_blobs as i64,
            r.leading_text_dropped as i64,
            r.missing_identifier as i64,
            r.duplicates as i64,
            r.uncoded as i64,
            r.scrape_errors as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Courses ──

/// Replace the stored catalog with `records`, keyed by course code.
/// Records without a code are skipped.
pub fn save_catalog(conn: &Connection, run_id: Option<i64>, records: &[CourseRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM courses", [])?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO courses
             (course_code, position, title, description, credits, prerequisites,
              attributes, department, elective, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for (i, r) in records.iter().enumerate() {
            let Some(code) = &r.course_code else { continue };
            count += stmt.execute(rusqlite::params![
                code, i as i64, r.title, r.description, r.credits, r.prerequisites,
                r.attributes, r.department, r.elective, run_id,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

const COURSE_COLUMNS: &str =
    "course_code, title, description, credits, prerequisites, attributes, department, elective";

fn course_from_row(row: &Row) -> rusqlite::Result<CourseRecord> {
    Ok(CourseRecord {
        course_code: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        credits: row.get(3)?,
        prerequisites: row.get(4)?,
        attributes: row.get(5)?,
        department: row.get(6)?,
        elective: row.get(7)?,
    })
}

pub fn fetch_course(conn: &Connection, code: &str) -> Result<Option<CourseRecord>> {
    let sql = format!("SELECT {} FROM courses WHERE course_code = ?1", COURSE_COLUMNS);
    let row = conn.query_row(&sql, [code], course_from_row).optional()?;
    Ok(row)
}

pub fn fetch_courses(
    conn: &Connection,
    department: Option<&str>,
    electives_only: bool,
    limit: usize,
) -> Result<Vec<CourseRecord>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(d) = department {
        conditions.push(format!("department = ?{}", params.len() + 1));
        params.push(Box::new(d.to_uppercase()));
    }
    if electives_only {
        conditions.push("elective = 1".to_string());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT {} FROM courses{} ORDER BY position, course_code LIMIT {}",
        COURSE_COLUMNS, where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub courses: usize,
    pub electives: usize,
    pub departments: usize,
    pub unknown_department: usize,
    pub with_prerequisites: usize,
    pub runs: usize,
    pub last_run: Option<String>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let courses: usize = conn.query_row("SELECT COUNT(*) FROM courses", [], |r| r.get(0))?;
    let electives: usize =
        conn.query_row("SELECT COUNT(*) FROM courses WHERE elective = 1", [], |r| r.get(0))?;
    let departments: usize =
        conn.query_row("SELECT COUNT(DISTINCT department) FROM courses", [], |r| r.get(0))?;
    let unknown_department: usize = conn.query_row(
        "SELECT COUNT(*) FROM courses WHERE department = 'UNKNOWN'",
        [],
        |r| r.get(0),
    )?;
    let with_prerequisites: usize = conn.query_row(
        "SELECT COUNT(*) FROM courses WHERE prerequisites IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let runs: usize = conn.query_row("SELECT COUNT(*) FROM runs", [], |r| r.get(0))?;
    let last_run: Option<String> = conn
        .query_row("SELECT created_at FROM runs ORDER BY id DESC LIMIT 1", [], |r| r.get(0))
        .optional()?;
    Ok(Stats {
        courses,
        electives,
        departments,
        unknown_department,
        with_prerequisites,
        runs,
        last_run,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::build_catalog;
    use crate::settings::Settings;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn sample_records() -> Vec<CourseRecord> {
        let entries = crate::input::load_entries(Path::new("tests/fixtures/all_courses.json")).unwrap();
        build_catalog(&entries, &Settings::default()).0.into_records()
    }

    #[test]
    fn catalog_round_trip() {
        let conn = memory_db();
        let records = sample_records();
        let run_id = insert_run(&conn, "fixture", &RunReport::default()).unwrap();
        assert_eq!(save_catalog(&conn, Some(run_id), &records).unwrap(), records.len());

        let all = fetch_courses(&conn, None, false, 100).unwrap();
        assert_eq!(all, records);
        let one = fetch_course(&conn, "CS 2510").unwrap().unwrap();
        assert_eq!(one.prerequisites.as_deref(), Some("CS 2500 with a minimum grade of D-"));
        assert!(fetch_course(&conn, "CS 9999").unwrap().is_none());
    }

    #[test]
    fn filters_and_stats() {
        let conn = memory_db();
        save_catalog(&conn, None, &sample_records()).unwrap();

        let ds = fetch_courses(&conn, Some("ds"), false, 100).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].course_code.as_deref(), Some("DS 3000"));

        let electives = fetch_courses(&conn, None, true, 100).unwrap();
        assert_eq!(electives.len(), 1);
        assert_eq!(fetch_courses(&conn, None, false, 2).unwrap().len(), 2);

        let s = get_stats(&conn).unwrap();
        assert_eq!(s.courses, 6);
        assert_eq!(s.electives, 1);
        assert_eq!(s.departments, 3);
        assert_eq!(s.unknown_department, 1);
        assert_eq!(s.with_prerequisites, 2);
        assert_eq!(s.runs, 0);
        assert!(s.last_run.is_none());
    }

    #[test]
    fn resave_replaces_rows() {
        let conn = memory_db();
        let mut records = sample_records();
        save_catalog(&conn, None, &records).unwrap();
        records[0].title = Some("Renamed".into());
        save_catalog(&conn, None, &records).unwrap();
        assert_eq!(get_stats(&conn).unwrap().courses, records.len());
        assert_eq!(
            fetch_course(&conn, "CS 1800").unwrap().unwrap().title.as_deref(),
            Some("Renamed")
        );
    }

    #[test]
    fn later_run_drops_vanished_courses() {
        let conn = memory_db();
        let course = |code: &str| CourseRecord {
            course_code: Some(code.into()),
            title: Some("T".into()),
            description: String::new(),
            credits: Some("4".into()),
            prerequisites: None,
            attributes: None,
            department: "CS".into(),
            elective: false,
        };

        let first = insert_run(&conn, "run1", &RunReport::default()).unwrap();
        save_catalog(&conn, Some(first), &[course("CS 1000"), course("CS 2000")]).unwrap();
        let second = insert_run(&conn, "run2", &RunReport::default()).unwrap();
        save_catalog(&conn, Some(second), &[course("CS 3000")]).unwrap();

        let codes: Vec<_> = fetch_courses(&conn, None, false, 100)
            .unwrap()
            .into_iter()
            .filter_map(|r| r.course_code)
            .collect();
        assert_eq!(codes, vec!["CS 3000"]);
        assert!(fetch_course(&conn, "CS 1000").unwrap().is_none());
        let s = get_stats(&conn).unwrap();
        assert_eq!(s.courses, 1);
        assert_eq!(s.runs, 2);
    }
}
