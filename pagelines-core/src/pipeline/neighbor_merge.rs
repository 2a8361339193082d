use super::engine::WordStage;
use crate::types::{BoundingBox, Dimension, Word, WordMetadata};

/// Unordered-list markers that absorb the word following them.
const BULLET_MARKERS: [&str; 5] = ["•", "-", "◦", "▪", "▫"];

/// Font sizes closer than this are the same size.
const FONT_SIZE_EPSILON: f64 = 0.01;

/// Gap (in page units) under which two runs are glued without a space.
const GLUE_GAP: f64 = 1.0;

pub struct NeighborMerger;

impl WordStage for NeighborMerger {
    fn name(&self) -> &'static str {
        "NeighborMerge"
    }

    fn apply(&self, words: Vec<Word>) -> Vec<Word> {
        merge_neighbors(words)
    }
}

/// Coalesce adjacent words of a reading-ordered page.
///
/// Glyphs split by the extractor, short runs on the same baseline and a
/// bullet marker with the text after it end up as one word. Words that
/// carry an end-of-line flag close the group they end up in.
pub fn merge_neighbors(words: Vec<Word>) -> Vec<Word> {
    let mut result = Vec::with_capacity(words.len());
    let mut group: Option<Word> = None;

    for word in words {
        if is_noise(&word) {
            continue;
        }

        let has_eol = word.has_eol();

        group = Some(match group.take() {
            None => word,
            Some(current) => match fold_kind(&current, &word) {
                Some(kind) => fold(current, word, kind),
                None => {
                    result.push(current);
                    word
                }
            },
        });

        if has_eol {
            result.extend(group.take());
        }
    }

    result.extend(group);
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FoldKind {
    Bullet,
    Neighbor,
}

fn is_noise(word: &Word) -> bool {
    let empty = word.text.is_empty() && (word.dimension.width == 0.0 || word.has_eol());
    let blank = word.text == " " && word.font_size() == 0.0 && !word.has_eol();
    empty || blank
}

fn fold_kind(group: &Word, word: &Word) -> Option<FoldKind> {
    let group_mid_y = group.bbox.middle_y();
    let within_y = word.bbox.y0 <= group_mid_y && group_mid_y <= word.bbox.y1;

    if within_y && is_bullet(&group.text) {
        return Some(FoldKind::Bullet);
    }

    let within_x = word.bbox.x0 <= group.bbox.x1 + group.font_size();
    let same_font_size = (word.font_size() - group.font_size()).abs() < FONT_SIZE_EPSILON;

    if within_x && within_y && same_font_size && !group.has_eol() {
        Some(FoldKind::Neighbor)
    } else {
        None
    }
}

fn is_bullet(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.chars().count() == 1 && BULLET_MARKERS.contains(&trimmed)
}

fn fold(group: Word, word: Word, kind: FoldKind) -> Word {
    let separator = if word.bbox.x0 - group.bbox.x1 < GLUE_GAP { "" } else { " " };

    let font_size = match kind {
        FoldKind::Bullet => word.font_size(),
        FoldKind::Neighbor => group.font_size(),
    };

    Word {
        text: format!("{}{}{}", group.text, separator, word.text),
        bbox: BoundingBox {
            x0: group.bbox.x0,
            y0: group.bbox.y0.min(word.bbox.y0),
            x1: word.bbox.x1,
            y1: group.bbox.y1.max(word.bbox.y1),
        },
        dimension: Dimension {
            width: word.bbox.x1 - group.bbox.x0,
            height: group.dimension.height.max(word.dimension.height),
        },
        metadata: WordMetadata {
            font_size,
            ..word.metadata
        },
        id: None,
    }
}
