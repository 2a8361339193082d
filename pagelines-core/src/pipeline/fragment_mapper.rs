use crate::geometry::{self, Transform};
use crate::types::{BoundingBox, Dimension, Fragment, Word, WordMetadata};
use regex::Regex;
use std::sync::LazyLock;

// Letter-spaced headings such as "S U M M A R Y"
static SPACED_LETTERS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]\s)+[A-Z]$").unwrap());

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());

/// Collapse letter-spaced uppercase runs; everything else passes through.
pub fn normalize_text(text: &str) -> String {
    if SPACED_LETTERS_REGEX.is_match(text) {
        WHITESPACE_REGEX.replace_all(text, "").into_owned()
    } else {
        text.to_string()
    }
}

/// Map one page's fragments into words in absolute page coordinates.
///
/// Output order equals input order; reading order is established later.
pub fn map_fragments(fragments: &[Fragment], page_transform: &Transform, page_num: u32, raw: bool) -> Vec<Word> {
    fragments
        .iter()
        .map(|fragment| map_fragment(fragment, page_transform, page_num, raw))
        .collect()
}

fn map_fragment(fragment: &Fragment, page_transform: &Transform, page_num: u32, raw: bool) -> Word {
    let composed = geometry::transform(page_transform, &fragment.transform);
    let (x, y) = geometry::origin(&composed);

    // Extractors are not consistent about the sign/scale of the viewport;
    // derive it from how the x translation changed.
    let scale = x / fragment.transform[4];
    let scale = if scale.is_finite() { scale } else { 1.0 };

    let text = if raw {
        fragment.text.clone()
    } else {
        normalize_text(&fragment.text)
    };

    Word {
        text,
        bbox: BoundingBox {
            x0: x,
            y0: y - fragment.height * scale,
            x1: x + fragment.width * scale,
            y1: y,
        },
        dimension: Dimension {
            width: fragment.width,
            height: fragment.height,
        },
        metadata: WordMetadata {
            direction: fragment.direction,
            font_name: fragment.font_name.clone(),
            font_size: round_to(fragment.height, 4),
            has_eol: fragment.has_eol,
            page_num,
        },
        id: None,
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IDENTITY;
    use crate::types::TextDirection;

    fn fragment(text: &str, x: f64, y: f64, width: f64, height: f64) -> Fragment {
        Fragment {
            text: text.to_string(),
            direction: TextDirection::Ltr,
            width,
            height,
            transform: [height, 0.0, 0.0, height, x, y],
            font_name: "g_d0_f1".to_string(),
            has_eol: false,
        }
    }

    #[test]
    fn test_normalize_collapses_spaced_capitals() {
        assert_eq!(normalize_text("S U M M A R Y"), "SUMMARY");
        assert_eq!(normalize_text("T E X T"), "TEXT");
    }

    #[test]
    fn test_normalize_leaves_other_text_alone() {
        assert_eq!(normalize_text("A"), "A");
        assert_eq!(normalize_text("S u m"), "S u m");
        assert_eq!(normalize_text("AB C"), "AB C");
        assert_eq!(normalize_text("Summary of results"), "Summary of results");
        assert_eq!(normalize_text("S  U"), "S  U");
    }

    #[test]
    fn test_spaced_heading_fragment_becomes_single_word() {
        let words = map_fragments(&[fragment("S U M M A R Y", 72.0, 700.0, 80.0, 12.0)], &IDENTITY, 1, false);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "SUMMARY");
    }

    #[test]
    fn test_raw_mode_keeps_text() {
        let words = map_fragments(&[fragment("S U M", 72.0, 700.0, 30.0, 12.0)], &IDENTITY, 1, true);
        assert_eq!(words[0].text, "S U M");
    }

    #[test]
    fn test_flipped_viewport_bbox() {
        let viewport = [1.0, 0.0, 0.0, -1.0, 0.0, 792.0];
        let words = map_fragments(&[fragment("Hello", 72.0, 700.0, 27.5, 12.0)], &viewport, 3, false);
        let word = &words[0];

        assert_eq!(word.bbox.x0, 72.0);
        assert_eq!(word.bbox.y1, 92.0);
        assert_eq!(word.bbox.y0, 80.0);
        assert_eq!(word.bbox.x1, 99.5);
        assert_eq!(word.dimension.width, 27.5);
        assert_eq!(word.metadata.page_num, 3);
        assert_eq!(word.metadata.font_name, "g_d0_f1");
        assert_eq!(word.id, None);
    }

    #[test]
    fn test_scaled_viewport_scales_box() {
        let viewport = [2.0, 0.0, 0.0, -2.0, 0.0, 1584.0];
        let words = map_fragments(&[fragment("Hi", 50.0, 700.0, 10.0, 12.0)], &viewport, 1, false);
        let word = &words[0];

        assert_eq!(word.bbox.x0, 100.0);
        assert_eq!(word.bbox.x1, 120.0);
        assert_eq!(word.bbox.y1, 184.0);
        assert_eq!(word.bbox.y0, 160.0);
        // Font size stays in unscaled units
        assert_eq!(word.metadata.font_size, 12.0);
    }

    #[test]
    fn test_zero_translation_falls_back_to_unit_scale() {
        let words = map_fragments(&[fragment("edge", 0.0, 50.0, 20.0, 10.0)], &IDENTITY, 1, false);
        let bbox = words[0].bbox;
        assert_eq!((bbox.x0, bbox.y0, bbox.x1, bbox.y1), (0.0, 40.0, 20.0, 50.0));
    }

    #[test]
    fn test_font_size_rounded_to_four_decimals() {
        let words = map_fragments(&[fragment("x", 10.0, 10.0, 5.0, 9.963_216)], &IDENTITY, 1, false);
        assert_eq!(words[0].metadata.font_size, 9.9632);
    }

    #[test]
    fn test_output_preserves_input_order() {
        let fragments = vec![
            fragment("b", 200.0, 100.0, 5.0, 10.0),
            fragment("a", 100.0, 100.0, 5.0, 10.0),
        ];
        let words = map_fragments(&fragments, &IDENTITY, 1, false);
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "a"]);
    }
}
