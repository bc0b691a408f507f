use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// What to do with a blob that contains no course-code boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoBoundaryPolicy {
    /// Skip the blob (counted in the run report).
    #[default]
    Drop,
    /// Treat the whole normalized blob as one fragment.
    WholeBlob,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub no_boundary: NoBoundaryPolicy,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_parallel() -> bool {
    true
}

fn default_chunk_size() -> usize {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            no_boundary: NoBoundaryPolicy::default(),
            parallel: default_parallel(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Settings {
    /// Defaults overridden by `CATALOG_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::from_source(Environment::with_prefix("CATALOG").try_parsing(true))
    }

    fn from_source(env: Environment) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(env)
            .build()
            .context("Failed to read CATALOG_* settings")?
            .try_deserialize()
            .context("Invalid CATALOG_* settings")?;
        Ok(Settings {
            chunk_size: settings.chunk_size.max(1),
            ..settings
        })
    }
}

// ── Tests ──
