use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;

use course_catalog::catalog::{self, Catalog};
use course_catalog::input::{self, RawScrapeEntry};
use course_catalog::report::RunReport;
use course_catalog::settings::{NoBoundaryPolicy, Settings};
use course_catalog::{db, parser};

#[derive(Parser)]
#[command(name = "course_catalog", about = "Structure scraped course-catalog text into course records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse scrape results into a deduplicated course catalog
    Parse {
        /// Scrape results (JSON list of {url, courses, error})
        #[arg(short, long, default_value = "all_courses.json")]
        input: PathBuf,
        /// Structured catalog output (JSON list of course records)
        #[arg(short, long, default_value = "all_courses_structured.json")]
        output: PathBuf,
        /// Also store the catalog in this SQLite database
        #[arg(long)]
        db: Option<PathBuf>,
        /// Keep blobs with no course-code boundary as a single fragment
        #[arg(long)]
        keep_unbounded: bool,
        /// Process entries on a single thread
        #[arg(long)]
        sequential: bool,
    },
    /// Show catalog database statistics
    Stats {
        #[arg(long, default_value = db::DEFAULT_DB_PATH)]
        db: PathBuf,
    },
    /// Stored courses table
    Show {
        #[arg(long, default_value = db::DEFAULT_DB_PATH)]
        db: PathBuf,
        /// Filter by department (e.g. "CS")
        #[arg(short, long)]
        department: Option<String>,
        /// Only courses flagged as electives
        #[arg(short, long)]
        electives: bool,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Print one stored course
    Lookup {
        /// Course code, e.g. "CS 4100"
        code: String,
        #[arg(long, default_value = db::DEFAULT_DB_PATH)]
        db: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output, db: db_path, keep_unbounded, sequential } => {
            let mut settings = Settings::load()?;
            if keep_unbounded {
                settings.no_boundary = NoBoundaryPolicy::WholeBlob;
            }
            if sequential {
                settings.parallel = false;
            }
            info!(settings = ?settings, "Starting catalog parse");

            let entries = input::load_entries(&input)?;
            if entries.is_empty() {
                println!("No scrape entries in {}.", input.display());
                return Ok(());
            }
            println!("Parsing {} scrape entries...", entries.len());
            let (catalog, report) = process_entries(&entries, &settings);

            catalog::write_json(&output, &catalog)?;
            if let Some(path) = db_path {
                save_to_db(&path, &input, &catalog, &report)?;
            }
            report.print();
            println!("Saved {} courses to {}", catalog.len(), output.display());
            Ok(())
        }
        Commands::Stats { db: db_path } => {
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Courses:       {}", s.courses);
            println!("Electives:     {}", s.electives);
            println!("Departments:   {}", s.departments);
            println!("Unknown dept:  {}", s.unknown_department);
            println!("With prereqs:  {}", s.with_prerequisites);
            println!("Runs:          {}", s.runs);
            println!("Last run:      {}", s.last_run.as_deref().unwrap_or("-"));
            Ok(())
        }
        Commands::Show { db: db_path, department, electives, limit } => {
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_courses(&conn, department.as_deref(), electives, limit)?;
            if rows.is_empty() {
                println!("No courses found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<10} | {:<36} | {:<10} | {:<8} | {:<3} | {:<24}",
                "#", "Code", "Title", "Credits", "Dept", "El", "Prerequisites"
            );
            println!("{}", "-".repeat(112));

            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<10} | {:<36} | {:<10} | {:<8} | {:<3} | {:<24}",
                    i + 1,
                    r.course_code.as_deref().unwrap_or("-"),
                    truncate(r.title.as_deref().unwrap_or("-"), 36),
                    truncate(r.credits.as_deref().unwrap_or("-"), 10),
                    truncate(&r.department, 8),
                    if r.elective { "yes" } else { "" },
                    truncate(r.prerequisites.as_deref().unwrap_or(""), 24),
                );
            }

            println!("\n{} courses", rows.len());
            Ok(())
        }
        Commands::Lookup { code, db: db_path } => {
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let code = parser::normalize::normalize(&code).to_uppercase();
            match db::fetch_course(&conn, &code)? {
                Some(course) => println!("{}", serde_json::to_string_pretty(&course)?),
                None => println!("No course {}.", code),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Chunked pipeline with a progress bar; each chunk is merged in input order.
fn process_entries(entries: &[RawScrapeEntry], settings: &Settings) -> (Catalog, RunReport) {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(entries.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let (catalog, report) =
        parser::build_catalog_with(entries, settings, |n| pb.inc(n as u64));

    pb.finish_and_clear();
    info!(courses = catalog.len(), unbounded_blobs = report.unbounded_blobs, "Catalog built");
    (catalog, report)
}

fn save_to_db(path: &Path, input: &Path, catalog: &Catalog, report: &RunReport) -> anyhow::Result<()> {
    let conn = db::connect(path)?;
    db::init_schema(&conn)?;
    let run_id = db::insert_run(&conn, &input.display().to_string(), report)?;
    let saved = db::save_catalog(&conn, Some(run_id), catalog.records())?;
    info!(saved, db = %path.display(), "Stored catalog");
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_width() {
        assert_eq!(truncate("CS", 8), "CS");
        assert_eq!(truncate("Foundations of Artificial Intelligence", 12), "Foundatio...");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(std::time::Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn progress_pipeline_matches_plain_build() {
        let entries = input::load_entries(Path::new("tests/fixtures/all_courses.json")).unwrap();
        let settings = Settings { chunk_size: 2, ..Settings::default() };
        let (a, ra) = process_entries(&entries, &settings);
        let (b, rb) = parser::build_catalog(&entries, &Settings::default());
        assert_eq!(a.records(), b.records());
        assert_eq!(ra, rb);
    }

    #[test]
    fn cli_parses_parse_flags() {
        let cli = Cli::try_parse_from([
            "course_catalog", "parse", "-i", "in.json", "--keep-unbounded", "--sequential",
        ])
        .unwrap();
        match cli.command {
            Commands::Parse { input, output, db, keep_unbounded, sequential } => {
                assert_eq!(input, PathBuf::from("in.json"));
                assert_eq!(output, PathBuf::from("all_courses_structured.json"));
                assert!(db.is_none());
                assert!(keep_unbounded && sequential);
            }
            _ => panic!("expected parse"),
        }
    }
}
