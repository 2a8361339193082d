use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top band of the page treated as header (fraction of page height).
pub const HEADER_FROM_HEIGHT_PERCENTAGE: f64 = 0.09;
/// Words starting below this fraction of page height are footer.
pub const FOOTER_FROM_HEIGHT_PERCENTAGE: f64 = 0.92;
pub const WORDS_PER_PAGE_THRESHOLD: f64 = 10.0;
pub const TEXT_LENGTH_THRESHOLD: usize = 100;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_header_percentage() -> f64 {
    HEADER_FROM_HEIGHT_PERCENTAGE
}

fn default_footer_percentage() -> f64 {
    FOOTER_FROM_HEIGHT_PERCENTAGE
}

/// Comparator used to put words into reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortAlgorithm {
    /// Row-tolerant: words whose y0 differ by at most half the mean height share a row.
    #[default]
    Robust,
    /// Plain `(y0, x0)` ordering.
    Simple,
}

/// Clustering used by the compact line assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactLineAlgorithm {
    /// Group midpoint overlap, same test as full line assembly.
    #[default]
    #[serde(alias = "middleY")]
    MiddleY,
    /// First line whose leading word's y0 is within a fixed tolerance.
    Y0,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannedThreshold {
    /// Average whitespace-delimited tokens per page below which a set counts as scanned
    pub words_per_page: f64,
    /// Total extracted characters below which a set counts as scanned
    pub text_length: usize,
}

impl Default for ScannedThreshold {
    fn default() -> Self {
        Self {
            words_per_page: WORDS_PER_PAGE_THRESHOLD,
            text_length: TEXT_LENGTH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Ask the extractor for diagnostic output
    #[serde(default)]
    pub verbose: bool,
    /// Drop words in the top band of the page
    #[serde(default = "default_true")]
    pub exclude_header: bool,
    /// Drop words in the bottom band of the page
    #[serde(default = "default_true")]
    pub exclude_footer: bool,
    #[serde(default = "default_header_percentage")]
    pub header_from_height_percentage: f64,
    #[serde(default = "default_footer_percentage")]
    pub footer_from_height_percentage: f64,
    /// Keep fragment text untouched (no spaced-letter collapsing)
    #[serde(default)]
    pub raw: bool,
    /// Coalesce split glyphs, short runs and bullet markers into words
    #[serde(default = "default_true")]
    pub merge_close_text_neighbor: bool,
    #[serde(default)]
    pub sort_algorithm: SortAlgorithm,
    #[serde(default)]
    pub compact_line_algorithm: CompactLineAlgorithm,
    #[serde(default)]
    pub scanned_threshold: ScannedThreshold,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            exclude_header: true,
            exclude_footer: true,
            header_from_height_percentage: HEADER_FROM_HEIGHT_PERCENTAGE,
            footer_from_height_percentage: FOOTER_FROM_HEIGHT_PERCENTAGE,
            raw: false,
            merge_close_text_neighbor: true,
            sort_algorithm: SortAlgorithm::default(),
            compact_line_algorithm: CompactLineAlgorithm::default(),
            scanned_threshold: ScannedThreshold::default(),
        }
    }
}

impl ReaderConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config in {path}"))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ReaderConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                warn!("Failed to load config from {}: {:#}, using defaults", p, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
