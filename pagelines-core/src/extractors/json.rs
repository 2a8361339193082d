//! Text-content dump backend
//!
//! Reads fragments that another tool already extracted, in the shape
//! pdf.js-style `getTextContent()` produces:
//!
//! ```json
//! {
//!   "pages": [
//!     {
//!       "viewport": { "width": 612, "height": 792, "transform": [1, 0, 0, -1, 0, 792] },
//!       "lang": "en",
//!       "items": [
//!         { "str": "Hello", "dir": "ltr", "width": 27.1, "height": 12,
//!           "transform": [12, 0, 0, 12, 72, 700], "fontName": "g_d0_f1", "hasEOL": false }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Page `n` is the `n`-th entry of `pages`.

use super::traits::{check_page_index, has_extension, ExtractedDocument, ExtractedPage, OpenOptions, PageTextExtractor};
use crate::error::{ExtractError, ExtractResult};
use crate::types::{Fragment, TextContent, Viewport};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentDump {
    pub pages: Vec<DumpPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpPage {
    pub viewport: Viewport,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub items: Vec<Fragment>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFragmentExtractor;

impl JsonFragmentExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl PageTextExtractor for JsonFragmentExtractor {
    fn open(&self, bytes: &[u8], options: &OpenOptions) -> ExtractResult<Box<dyn ExtractedDocument>> {
        let dump: FragmentDump = serde_json::from_slice(bytes)
            .map_err(|e| ExtractError::DocumentOpen(format!("invalid fragment dump: {e}")))?;

        if options.verbose {
            debug!(
                pages = dump.pages.len(),
                fragments = dump.pages.iter().map(|p| p.items.len()).sum::<usize>(),
                "Loaded fragment dump"
            );
        }

        Ok(Box::new(JsonDocument { dump }))
    }

    fn name(&self) -> &str {
        "JsonFragmentExtractor"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }
}

pub struct JsonDocument {
    dump: FragmentDump,
}

impl ExtractedDocument for JsonDocument {
    fn page_count(&self) -> u32 {
        self.dump.pages.len() as u32
    }

    fn page(&self, page_num: u32) -> ExtractResult<Box<dyn ExtractedPage + '_>> {
        check_page_index(page_num, self.page_count())?;
        Ok(Box::new(JsonPage {
            page: &self.dump.pages[(page_num - 1) as usize],
        }))
    }
}

struct JsonPage<'a> {
    page: &'a DumpPage,
}

impl ExtractedPage for JsonPage<'_> {
    fn viewport(&self) -> Viewport {
        self.page.viewport
    }

    fn text_content(&self) -> ExtractResult<TextContent> {
        Ok(TextContent {
            fragments: self.page.items.clone(),
            lang: self.page.lang.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextDirection;

    const DUMP: &str = r#"{
        "pages": [
            {
                "viewport": { "width": 612, "height": 792, "transform": [1, 0, 0, -1, 0, 792] },
                "lang": "en",
                "items": [
                    { "str": "Hello", "dir": "ltr", "width": 27.5, "height": 12,
                      "transform": [12, 0, 0, 12, 72, 700], "fontName": "g_d0_f1", "hasEOL": true },
                    { "type": "beginMarkedContent", "id": "mc0" }
                ]
            },
            { "viewport": { "height": 792, "transform": [1, 0, 0, -1, 0, 792] } }
        ]
    }"#;

    fn open_dump() -> Box<dyn ExtractedDocument> {
        JsonFragmentExtractor::new()
            .open(DUMP.as_bytes(), &OpenOptions::default())
            .unwrap()
    }

    #[test]
    fn test_reads_pages_and_fragments() {
        let doc = open_dump();
        assert_eq!(doc.page_count(), 2);

        let page = doc.page(1).unwrap();
        assert_eq!(page.viewport().height, 792.0);

        let content = page.text_content().unwrap();
        assert_eq!(content.lang, "en");
        assert_eq!(content.fragments.len(), 2);

        let hello = &content.fragments[0];
        assert_eq!(hello.text, "Hello");
        assert_eq!(hello.direction, TextDirection::Ltr);
        assert_eq!(hello.font_name, "g_d0_f1");
        assert!(hello.has_eol);

        // Marked-content items become empty fragments
        assert_eq!(content.fragments[1].text, "");
        assert_eq!(content.fragments[1].width, 0.0);
    }

    #[test]
    fn test_page_without_items_is_empty() {
        let doc = open_dump();
        let content = doc.page(2).unwrap().text_content().unwrap();
        assert!(content.fragments.is_empty());
        assert_eq!(content.lang, "");
    }

    #[test]
    fn test_vertical_text_direction_is_accepted() {
        let dump = r#"{ "pages": [ { "viewport": { "height": 792, "transform": [1, 0, 0, -1, 0, 792] },
            "items": [ { "str": "縦", "dir": "ttb", "width": 12, "height": 12, "transform": [12, 0, 0, 12, 300, 700] } ] } ] }"#;
        let doc = JsonFragmentExtractor::new()
            .open(dump.as_bytes(), &OpenOptions::default())
            .unwrap();

        let content = doc.page(1).unwrap().text_content().unwrap();
        assert_eq!(content.fragments[0].direction, TextDirection::Ttb);
    }

    #[test]
    fn test_page_out_of_range() {
        let doc = open_dump();
        assert!(matches!(
            doc.page(0),
            Err(ExtractError::PageIndex { page: 0, page_count: 2 })
        ));
        assert!(matches!(doc.page(3), Err(ExtractError::PageIndex { page: 3, .. })));
    }

    #[test]
    fn test_malformed_input_is_document_open_error() {
        let result = JsonFragmentExtractor::new().open(b"%PDF-1.7 not json", &OpenOptions::default());
        assert!(matches!(result, Err(ExtractError::DocumentOpen(_))));
    }

    #[test]
    fn test_supports_json_extension_only() {
        let extractor = JsonFragmentExtractor::new();
        assert!(extractor.supports_file_type(Path::new("page.JSON")));
        assert!(!extractor.supports_file_type(Path::new("page.pdf")));
    }
}
