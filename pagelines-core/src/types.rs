use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::{Transform, IDENTITY};

// ===== EXTRACTOR-FACING TYPES =====
// Field names follow the text-content dump format (camelCase, `str`, `dir`,
// `hasEOL`) so fragments deserialize straight from extractor output.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
    /// Vertical text, top to bottom
    Ttb,
}

/// Raw positioned text run as produced by a page text extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    #[serde(rename = "str", default)]
    pub text: String,
    #[serde(rename = "dir", default)]
    pub direction: TextDirection,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Text-space to user-space transform; `[4]`/`[5]` hold the origin.
    #[serde(default = "identity_transform")]
    pub transform: Transform,
    #[serde(default)]
    pub font_name: String,
    #[serde(rename = "hasEOL", default)]
    pub has_eol: bool,
}

fn identity_transform() -> Transform {
    IDENTITY
}

/// Page geometry reported by the extractor at scale 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    #[serde(default)]
    pub width: f64,
    pub height: f64,
    /// Maps user space to viewport space (y grows downward).
    pub transform: Transform,
}

/// Text fragments of one page plus the language the extractor reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextContent {
    pub fragments: Vec<Fragment>,
    #[serde(default)]
    pub lang: String,
}

// ===== WORD AND LINE RECORDS =====

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }

    pub fn middle_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordMetadata {
    pub direction: TextDirection,
    pub font_name: String,
    /// Fragment height rounded to 4 decimals.
    pub font_size: f64,
    #[serde(rename = "hasEOL")]
    pub has_eol: bool,
    pub page_num: u32,
}

/// Normalized, positioned text unit - the core record of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
    pub dimension: Dimension,
    pub metadata: WordMetadata,
    /// Dense per-page index, assigned once the word survives region filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
}

impl Word {
    pub fn font_size(&self) -> f64 {
        self.metadata.font_size
    }

    pub fn has_eol(&self) -> bool {
        self.metadata.has_eol
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub text: String,
    pub bbox: BoundingBox,
    pub dimension: Dimension,
    pub average_font_size: f64,
    /// Member words in ascending x0 order.
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactWord {
    pub text: String,
    pub bbox: BoundingBox,
}

impl From<&Word> for CompactWord {
    fn from(word: &Word) -> Self {
        Self {
            text: word.text.clone(),
            bbox: word.bbox,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactLine {
    pub text: String,
    pub bbox: BoundingBox,
    pub words: Vec<CompactWord>,
}

// ===== PAGE COLLECTIONS =====

/// Filtered words of one page and its reported language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub words: Vec<Word>,
    #[serde(default)]
    pub lang: String,
}

/// 1-based page number to page words.
pub type PageTexts = BTreeMap<u32, PageText>;
/// 1-based page number to assembled lines.
pub type PageLines = BTreeMap<u32, Vec<Line>>;
/// 1-based page number to compact lines.
pub type CompactPageLines = BTreeMap<u32, Vec<CompactLine>>;

/// Intermediate outputs of every stage for one page.
/// Used for diagnostics - lets you inspect/compare each boundary.
#[derive(Debug, Clone, Serialize)]
pub struct PageStages {
    pub page_num: u32,
    pub viewport: Viewport,
    pub lang: String,
    pub fragments: Vec<Fragment>,
    pub mapped: Vec<Word>,
    /// `(stage name, words after that stage)` in execution order.
    pub stages: Vec<(String, Vec<Word>)>,
}

impl PageStages {
    /// Words after the last stage (the page's final words).
    pub fn final_words(&self) -> &[Word] {
        self.stages
            .last()
            .map(|(_, words)| words.as_slice())
            .unwrap_or(&self.mapped)
    }
}
