use crate::config::ScannedThreshold;
use crate::types::PageTexts;
use tracing::debug;

/// Whether a document looks like scanned images with little or no text layer.
///
/// Scanned when the average token count per page falls below
/// `words_per_page`, or the whole text is shorter than `text_length` chars.
/// An empty page set is not scanned.
pub fn is_scanned(pages: &PageTexts, threshold: &ScannedThreshold) -> bool {
    if pages.is_empty() {
        return false;
    }

    let mut text = String::new();
    let mut total_tokens = 0usize;

    for page in pages.values() {
        let page_text = page.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
        total_tokens += page_text.split_whitespace().count();
        text.push_str(&page_text);
        text.push(' ');
    }

    let words_per_page = total_tokens as f64 / pages.len() as f64;
    let text_length = text.chars().count();

    debug!(
        pages = pages.len(),
        words_per_page,
        text_length,
        "Scan heuristic"
    );

    words_per_page < threshold.words_per_page || text_length < threshold.text_length
}
