//! Turns scraped course-catalog text into a deduplicated catalog of course records.
//!
//! Per blob: normalize → split into course fragments → extract fields.
//! Records from all blobs are then aggregated by course code, first seen wins.

pub mod catalog;
pub mod db;
pub mod input;
pub mod parser;
pub mod report;
pub mod settings;

pub use catalog::{aggregate, Catalog, CourseRecord};
pub use input::RawScrapeEntry;
pub use parser::extract::extract;
pub use parser::normalize::normalize;
pub use parser::split::split_fragments;
pub use parser::{build_catalog, process_entry};
