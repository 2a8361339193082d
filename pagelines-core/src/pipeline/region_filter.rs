use super::engine::WordStage;
use crate::config::ReaderConfig;
use crate::types::Word;

/// Drops zero-size text and words in the header/footer bands, then numbers
/// the survivors `0..n`.
#[derive(Debug, Clone, Copy)]
pub struct RegionFilter {
    page_height: f64,
    exclude_header: bool,
    exclude_footer: bool,
    header_from_height_percentage: f64,
    footer_from_height_percentage: f64,
}

impl RegionFilter {
    pub fn new(config: &ReaderConfig, page_height: f64) -> Self {
        Self {
            page_height,
            exclude_header: config.exclude_header,
            exclude_footer: config.exclude_footer,
            header_from_height_percentage: config.header_from_height_percentage,
            footer_from_height_percentage: config.footer_from_height_percentage,
        }
    }

    fn header_threshold(&self) -> f64 {
        self.page_height * self.header_from_height_percentage
    }

    fn footer_threshold(&self) -> f64 {
        self.page_height * self.footer_from_height_percentage
    }

    fn keeps(&self, word: &Word) -> bool {
        let has_font_size = word.font_size() != 0.0;
        let after_header = word.bbox.y0 > self.header_threshold();
        let before_footer = word.bbox.y0 < self.footer_threshold();

        has_font_size && (!self.exclude_header || after_header) && (!self.exclude_footer || before_footer)
    }
}

impl WordStage for RegionFilter {
    fn name(&self) -> &'static str {
        "RegionFilter"
    }

    fn apply(&self, words: Vec<Word>) -> Vec<Word> {
        words
            .into_iter()
            .filter(|word| self.keeps(word))
            .enumerate()
            .map(|(id, word)| Word { id: Some(id), ..word })
            .collect()
    }
}

pub fn filter_regions(words: Vec<Word>, config: &ReaderConfig, page_height: f64) -> Vec<Word> {
    RegionFilter::new(config, page_height).apply(words)
}
