//! lopdf backend for PDF documents
//!
//! Walks each page's content stream and emits one fragment per text-showing
//! operator (`Tj`, `TJ`, `'`, `"`), positioned the way pdf.js positions its
//! text items:
//!
//! - fragment transform = `CTM × Tm × [fontSize·Th, 0, 0, fontSize, 0, rise]`
//! - viewport transform = `[1, 0, 0, -1, -llx, ury]` from the MediaBox
//! - width = advance of the shown glyphs in user space (font `/Widths` when
//!   the font has them, half an em per glyph otherwise)
//!
//! A fragment is flagged end-of-line when the next fragment starts on a
//! different baseline.

use super::traits::{check_page_index, has_extension, ExtractedDocument, ExtractedPage, OpenOptions, PageTextExtractor};
use crate::error::{ExtractError, ExtractResult};
use crate::geometry::{self, Transform, IDENTITY};
use crate::types::{Fragment, TextContent, TextDirection, Viewport};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// US Letter, used when no MediaBox can be found
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];
/// Glyph advance (1/1000 em) when the font carries no width table
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;
/// TJ adjustments beyond this (1/1000 em) read as a word gap
const TJ_SPACE_THRESHOLD: f64 = 200.0;
/// Parent chain limit when resolving inherited page attributes
const MAX_INHERITANCE_DEPTH: usize = 32;

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl LopdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl PageTextExtractor for LopdfExtractor {
    fn open(&self, bytes: &[u8], options: &OpenOptions) -> ExtractResult<Box<dyn ExtractedDocument>> {
        let doc = Document::load_mem(bytes).map_err(|e| ExtractError::DocumentOpen(e.to_string()))?;
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

        if options.verbose {
            debug!(pages = page_ids.len(), version = %doc.version, "Opened PDF with lopdf");
        }

        Ok(Box::new(LopdfDocument {
            doc,
            page_ids,
            verbose: options.verbose,
        }))
    }

    fn name(&self) -> &str {
        "LopdfExtractor"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }
}

pub struct LopdfDocument {
    doc: Document,
    page_ids: Vec<ObjectId>,
    verbose: bool,
}

impl LopdfDocument {
    /// Document-level `/Lang` from the catalog, if any
    fn catalog_lang(&self) -> String {
        self.doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .and_then(|id| self.doc.get_dictionary(id))
            .and_then(|catalog| catalog.get(b"Lang"))
            .ok()
            .and_then(|lang| match lang {
                Object::String(bytes, _) => Some(decode_text_simple(bytes)),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl ExtractedDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    fn page(&self, page_num: u32) -> ExtractResult<Box<dyn ExtractedPage + '_>> {
        check_page_index(page_num, self.page_count())?;
        Ok(Box::new(LopdfPage {
            owner: self,
            page_num,
            page_id: self.page_ids[(page_num - 1) as usize],
        }))
    }
}

struct LopdfPage<'a> {
    owner: &'a LopdfDocument,
    page_num: u32,
    page_id: ObjectId,
}

impl LopdfPage<'_> {
    fn media_box(&self) -> [f64; 4] {
        let doc = &self.owner.doc;
        let mut current = doc.get_dictionary(self.page_id).ok();

        for _ in 0..MAX_INHERITANCE_DEPTH {
            let Some(dict) = current else { break };
            if let Some(media_box) = dict.get(b"MediaBox").ok().and_then(|obj| read_rect(doc, obj)) {
                return media_box;
            }
            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| doc.get_dictionary(id))
                .ok();
        }

        DEFAULT_MEDIA_BOX
    }

    fn content_error(&self, reason: impl ToString) -> ExtractError {
        ExtractError::PageContent {
            page: self.page_num,
            reason: reason.to_string(),
        }
    }
}

impl ExtractedPage for LopdfPage<'_> {
    fn viewport(&self) -> Viewport {
        let [llx, lly, urx, ury] = self.media_box();
        Viewport {
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
            transform: [1.0, 0.0, 0.0, -1.0, -llx, ury],
        }
    }

    fn text_content(&self) -> ExtractResult<TextContent> {
        let doc = &self.owner.doc;
        let fonts = doc.get_page_fonts(self.page_id).unwrap_or_default();
        let data = doc
            .get_page_content(self.page_id)
            .map_err(|e| self.content_error(e))?;
        let content = Content::decode(&data).map_err(|e| self.content_error(e))?;

        let mut walker = TextWalker::new(doc, &fonts, self.owner.verbose);
        for op in &content.operations {
            walker.apply(&op.operator, &op.operands);
        }

        let mut fragments = walker.fragments;
        mark_line_ends(&mut fragments);

        Ok(TextContent {
            fragments,
            lang: self.owner.catalog_lang(),
        })
    }
}

/// Glyph metrics needed to estimate advances
struct FontMetrics {
    base_font: String,
    first_char: i64,
    widths: Vec<f64>,
    missing_width: f64,
    two_byte: bool,
}

impl FontMetrics {
    fn from_dict(doc: &Document, font: &Dictionary, resource_name: &[u8]) -> Self {
        let name_of = |key: &[u8]| {
            font.get(key)
                .and_then(Object::as_name)
                .map(|n| String::from_utf8_lossy(n).to_string())
                .ok()
        };
        let base_font = name_of(b"BaseFont").unwrap_or_else(|| String::from_utf8_lossy(resource_name).to_string());
        let two_byte = name_of(b"Subtype").as_deref() == Some("Type0");
        let first_char = font.get(b"FirstChar").ok().and_then(|o| read_number(doc, o)).unwrap_or(0.0) as i64;
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| arr.iter().map(|w| read_number(doc, w).unwrap_or(0.0)).collect())
            .unwrap_or_default();
        let missing_width = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(|o| read_number(doc, o))
            .unwrap_or(DEFAULT_GLYPH_WIDTH);

        Self {
            base_font,
            first_char,
            widths,
            missing_width,
            two_byte,
        }
    }

    /// Advance of one character code in 1/1000 em
    fn glyph_width(&self, code: u8) -> f64 {
        let index = code as i64 - self.first_char;
        if index >= 0 {
            if let Some(w) = self.widths.get(index as usize) {
                return *w;
            }
        }
        if self.widths.is_empty() {
            DEFAULT_GLYPH_WIDTH
        } else {
            self.missing_width
        }
    }
}

/// Text state machine over content-stream operators
struct TextWalker<'a> {
    doc: &'a Document,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    metrics: HashMap<Vec<u8>, FontMetrics>,
    verbose: bool,
    ctm_stack: Vec<Transform>,
    ctm: Transform,
    text_matrix: Transform,
    line_matrix: Transform,
    font_key: Vec<u8>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
    fragments: Vec<Fragment>,
}

impl<'a> TextWalker<'a> {
    fn new(doc: &'a Document, fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>, verbose: bool) -> Self {
        Self {
            doc,
            fonts,
            metrics: HashMap::new(),
            verbose,
            ctm_stack: Vec::new(),
            ctm: IDENTITY,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_key: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            fragments: Vec::new(),
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        let doc = self.doc;
        let num = |i: usize| operands.get(i).and_then(|o| read_number(doc, o));

        match operator {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.ctm_stack.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = read_matrix(doc, operands) {
                    self.ctm = geometry::transform(&self.ctm, &m);
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.font_key = name.clone();
                }
                self.font_size = num(1).unwrap_or(self.font_size);
            }
            "Tc" => self.char_spacing = num(0).unwrap_or(0.0),
            "Tw" => self.word_spacing = num(0).unwrap_or(0.0),
            "Tz" => self.horizontal_scale = num(0).unwrap_or(100.0) / 100.0,
            "TL" => self.leading = num(0).unwrap_or(0.0),
            "Ts" => self.rise = num(0).unwrap_or(0.0),
            "Td" => self.move_line(num(0).unwrap_or(0.0), num(1).unwrap_or(0.0)),
            "TD" => {
                let ty = num(1).unwrap_or(0.0);
                self.leading = -ty;
                self.move_line(num(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if let Some(m) = read_matrix(doc, operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(&[TextPiece::Bytes(bytes)]);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let pieces: Vec<TextPiece> = items
                        .iter()
                        .filter_map(|item| match item {
                            Object::String(bytes, _) => Some(TextPiece::Bytes(bytes)),
                            other => read_number(doc, other).map(TextPiece::Adjust),
                        })
                        .collect();
                    self.show(&pieces);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(&[TextPiece::Bytes(bytes)]);
                }
            }
            "\"" => {
                self.word_spacing = num(0).unwrap_or(self.word_spacing);
                self.char_spacing = num(1).unwrap_or(self.char_spacing);
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(&[TextPiece::Bytes(bytes)]);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = geometry::transform(&self.line_matrix, &[1.0, 0.0, 0.0, 1.0, tx, ty]);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn current_metrics(&mut self) -> Option<&FontMetrics> {
        if !self.metrics.contains_key(&self.font_key) {
            let fonts = self.fonts;
            let font = fonts.get(&self.font_key)?;
            let metrics = FontMetrics::from_dict(self.doc, font, &self.font_key);
            self.metrics.insert(self.font_key.clone(), metrics);
        }
        self.metrics.get(&self.font_key)
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let encoding = self
            .fonts
            .get(&self.font_key)
            .and_then(|font| font.get_font_encoding(self.doc).ok());

        match encoding {
            Some(enc) => Document::decode_text(&enc, bytes).unwrap_or_else(|_| decode_text_simple(bytes)),
            None => {
                if self.verbose {
                    debug!(font = %String::from_utf8_lossy(&self.font_key), "No font encoding, decoding bytes directly");
                }
                decode_text_simple(bytes)
            }
        }
    }

    /// Emit one fragment for a text-showing operator and advance Tm
    fn show(&mut self, pieces: &[TextPiece]) {
        let font_size = self.font_size;
        let th = self.horizontal_scale;
        let (char_spacing, word_spacing) = (self.char_spacing, self.word_spacing);

        let mut text = String::new();
        let mut advance = 0.0;
        let mut font_name = String::from_utf8_lossy(&self.font_key).to_string();

        for piece in pieces {
            match piece {
                TextPiece::Bytes(bytes) => {
                    let decoded = self.decode(bytes);
                    let glyphs = match self.current_metrics() {
                        Some(metrics) => {
                            font_name = metrics.base_font.clone();
                            if metrics.two_byte {
                                decoded.chars().map(|_| DEFAULT_GLYPH_WIDTH).collect::<Vec<_>>()
                            } else {
                                bytes.iter().map(|b| metrics.glyph_width(*b)).collect()
                            }
                        }
                        None => decoded.chars().map(|_| DEFAULT_GLYPH_WIDTH).collect(),
                    };
                    let spaces = bytes.iter().filter(|b| **b == b' ').count() as f64;
                    advance += glyphs.iter().map(|w| w / 1000.0 * font_size + char_spacing).sum::<f64>()
                        + spaces * word_spacing;
                    text.push_str(&decoded);
                }
                TextPiece::Adjust(n) => {
                    if -n > TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                    advance -= n / 1000.0 * font_size;
                }
            }
        }
        let advance = advance * th;

        if !text.is_empty() {
            let user_matrix = geometry::transform(&self.ctm, &self.text_matrix);
            let rendering = geometry::transform(&user_matrix, &[font_size * th, 0.0, 0.0, font_size, 0.0, self.rise]);
            let x_scale = user_matrix[0].hypot(user_matrix[1]);

            self.fragments.push(Fragment {
                text,
                direction: TextDirection::Ltr,
                width: advance * x_scale,
                height: rendering[2].hypot(rendering[3]),
                transform: rendering,
                font_name,
                has_eol: false,
            });
        }

        self.text_matrix = geometry::transform(&self.text_matrix, &[1.0, 0.0, 0.0, 1.0, advance, 0.0]);
    }
}

enum TextPiece<'b> {
    Bytes(&'b [u8]),
    Adjust(f64),
}

/// Flag fragments followed by a fragment on a different baseline
fn mark_line_ends(fragments: &mut [Fragment]) {
    for i in 1..fragments.len() {
        let (prev_y, prev_height) = (fragments[i - 1].transform[5], fragments[i - 1].height);
        let y = fragments[i].transform[5];
        if (y - prev_y).abs() > prev_height / 2.0 {
            fragments[i - 1].has_eol = true;
        }
    }
    if let Some(last) = fragments.last_mut() {
        last.has_eol = true;
    }
}

fn resolve<'d>(doc: &'d Document, obj: &'d Object) -> Option<&'d Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn read_number(doc: &Document, obj: &Object) -> Option<f64> {
    match resolve(doc, obj)? {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn read_matrix(doc: &Document, operands: &[Object]) -> Option<Transform> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = read_number(doc, obj)?;
    }
    Some(m)
}

fn read_rect(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let arr = resolve(doc, obj)?.as_array().ok()?;
    if arr.len() < 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, obj) in rect.iter_mut().zip(arr) {
        *slot = read_number(doc, obj)?;
    }
    Some(rect)
}

fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream};

    fn build_pdf(operations: Vec<Operation>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn two_line_pdf() -> Vec<u8> {
        build_pdf(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal("Hello")]),
            Operation::new("Td", vec![0.into(), (-20).into()]),
            Operation::new("Tj", vec![Object::string_literal("World")]),
            Operation::new("ET", vec![]),
        ])
    }

    #[test]
    fn test_inherited_media_box_viewport() {
        let doc = LopdfExtractor::new()
            .open(&two_line_pdf(), &OpenOptions::default())
            .unwrap();
        assert_eq!(doc.page_count(), 1);

        let viewport = doc.page(1).unwrap().viewport();
        assert_eq!(viewport.width, 595.0);
        assert_eq!(viewport.height, 842.0);
        assert_eq!(viewport.transform, [1.0, 0.0, 0.0, -1.0, 0.0, 842.0]);
    }

    #[test]
    fn test_fragments_follow_text_matrix() {
        let doc = LopdfExtractor::new()
            .open(&two_line_pdf(), &OpenOptions::default())
            .unwrap();
        let content = doc.page(1).unwrap().text_content().unwrap();

        assert_eq!(content.fragments.len(), 2);
        let hello = &content.fragments[0];
        assert_eq!(hello.text, "Hello");
        assert_eq!(hello.transform, [12.0, 0.0, 0.0, 12.0, 100.0, 600.0]);
        assert_eq!(hello.height, 12.0);
        assert_eq!(hello.font_name, "Courier");
        assert!(hello.width > 0.0);
        assert!(hello.has_eol);

        let world = &content.fragments[1];
        assert_eq!(world.transform[5], 580.0);
        assert!(world.has_eol);
    }

    #[test]
    fn test_same_baseline_fragments_are_not_line_ends() {
        let pdf = build_pdf(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("one")]),
            Operation::new("Tj", vec![Object::string_literal("two")]),
            Operation::new("ET", vec![]),
        ]);
        let doc = LopdfExtractor::new().open(&pdf, &OpenOptions::default()).unwrap();
        let content = doc.page(1).unwrap().text_content().unwrap();

        assert_eq!(content.fragments.len(), 2);
        assert!(!content.fragments[0].has_eol);
        // "two" starts where "one" ended
        assert!(content.fragments[1].transform[4] > content.fragments[0].transform[4]);
        assert!(content.fragments[1].has_eol);
    }

    #[test]
    fn test_garbage_bytes_fail_to_open() {
        let result = LopdfExtractor::new().open(b"definitely not a pdf", &OpenOptions::default());
        assert!(matches!(result, Err(ExtractError::DocumentOpen(_))));
    }

    #[test]
    fn test_page_out_of_range() {
        let doc = LopdfExtractor::new()
            .open(&two_line_pdf(), &OpenOptions::default())
            .unwrap();
        assert!(matches!(doc.page(2), Err(ExtractError::PageIndex { page: 2, page_count: 1 })));
    }

    #[test]
    fn test_decode_text_simple_handles_utf16_bom() {
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]), "AB");
        assert_eq!(decode_text_simple(b"plain"), "plain");
        assert_eq!(decode_text_simple(&[0xE9]), "é");
    }
}
