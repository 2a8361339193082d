use super::line_assembly::{cluster_by_middle_y, union_bbox};
use crate::config::CompactLineAlgorithm;
use crate::types::{BoundingBox, CompactLine, CompactWord, Word};

/// Vertical distance under which `Y0` puts a word on an existing line.
const Y0_TOLERANCE: f64 = 5.0;

/// Group a page's words into text-and-box-only lines.
pub fn compact_lines(words: &[Word], algorithm: CompactLineAlgorithm) -> Vec<CompactLine> {
    let compact: Vec<CompactWord> = words.iter().map(CompactWord::from).collect();

    match algorithm {
        CompactLineAlgorithm::MiddleY => cluster_by_middle_y(compact, |w| w.bbox)
            .into_iter()
            .map(finalize_middle_y)
            .collect(),
        CompactLineAlgorithm::Y0 => cluster_by_leading_y0(compact)
            .into_iter()
            .map(finalize_y0)
            .collect(),
    }
}

fn cluster_by_leading_y0(words: Vec<CompactWord>) -> Vec<Vec<CompactWord>> {
    let mut lines: Vec<Vec<CompactWord>> = Vec::new();

    for word in words {
        let target = lines
            .iter_mut()
            .find(|line| (line[0].bbox.y0 - word.bbox.y0).abs() <= Y0_TOLERANCE);

        match target {
            Some(line) => line.push(word),
            None => lines.push(vec![word]),
        }
    }

    lines
}

fn finalize_middle_y(mut words: Vec<CompactWord>) -> CompactLine {
    debug_assert!(!words.is_empty(), "line groups are created with one word");

    let bbox = union_bbox(words.iter().map(|w| &w.bbox));
    sort_by_x0(&mut words);

    CompactLine {
        text: join_text(&words),
        bbox,
        words,
    }
}

// x1/y1 start at zero here, not -inf; output consumers depend on it.
fn finalize_y0(mut words: Vec<CompactWord>) -> CompactLine {
    debug_assert!(!words.is_empty(), "line groups are created with one word");

    sort_by_x0(&mut words);
    let seed = BoundingBox {
        x0: f64::INFINITY,
        y0: f64::INFINITY,
        x1: 0.0,
        y1: 0.0,
    };
    let bbox = words.iter().fold(seed, |acc, w| acc.union(&w.bbox));

    CompactLine {
        text: join_text(&words),
        bbox,
        words,
    }
}

fn sort_by_x0(words: &mut [CompactWord]) {
    words.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
}

fn join_text(words: &[CompactWord]) -> String {
    words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::word;

    fn sample() -> Vec<Word> {
        vec![
            word("b", 30.0, 104.0, 40.0, 114.0, 10.0),
            word("a", 10.0, 100.0, 20.0, 110.0, 10.0),
            word("c", 10.0, 200.0, 20.0, 210.0, 10.0),
        ]
    }

    #[test]
    fn test_middle_y_matches_line_assembly() {
        let words = sample();
        let compact = compact_lines(&words, CompactLineAlgorithm::MiddleY);
        let full = crate::pipeline::assemble_lines(&words);

        assert_eq!(compact.len(), full.len());
        for (c, f) in compact.iter().zip(&full) {
            assert_eq!(c.text, f.text);
            assert_eq!(c.bbox, f.bbox);
        }
        assert_eq!(compact[0].text, "a b");
    }

    #[test]
    fn test_y0_groups_by_leading_word() {
        let lines = compact_lines(&sample(), CompactLineAlgorithm::Y0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "a b");
        assert_eq!(lines[0].bbox, BoundingBox { x0: 10.0, y0: 100.0, x1: 40.0, y1: 114.0 });
        assert_eq!(lines[1].text, "c");
    }

    #[test]
    fn test_y0_tolerance_is_against_first_member() {
        // 104 is within 5 of 100, 108 is not, even though it is within 5 of 104
        let words = vec![
            word("a", 10.0, 100.0, 20.0, 110.0, 10.0),
            word("b", 30.0, 104.0, 40.0, 114.0, 10.0),
            word("c", 50.0, 108.0, 60.0, 118.0, 10.0),
        ];
        let lines = compact_lines(&words, CompactLineAlgorithm::Y0);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a b", "c"]);
    }

    #[test]
    fn test_y0_zero_seed_clamps_negative_coordinates() {
        let words = vec![word("neg", -30.0, -20.0, -10.0, -12.0, 8.0)];
        let lines = compact_lines(&words, CompactLineAlgorithm::Y0);
        assert_eq!(lines[0].bbox, BoundingBox { x0: -30.0, y0: -20.0, x1: 0.0, y1: 0.0 });
    }

    #[test]
    fn test_single_word_line_text_is_word_text() {
        let words = vec![word("Lonely", 10.0, 100.0, 60.0, 110.0, 10.0)];
        for algorithm in [CompactLineAlgorithm::MiddleY, CompactLineAlgorithm::Y0] {
            let lines = compact_lines(&words, algorithm);
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0].text, "Lonely");
            assert_eq!(lines[0].words.len(), 1);
        }
    }
}
