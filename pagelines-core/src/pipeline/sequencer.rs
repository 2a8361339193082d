use super::engine::WordStage;
use crate::config::SortAlgorithm;
use crate::types::Word;
use std::cmp::Ordering;

/// Reading-order stage.
pub struct Sequencer {
    algorithm: SortAlgorithm,
}

impl Sequencer {
    pub fn new(algorithm: SortAlgorithm) -> Self {
        Self { algorithm }
    }
}

impl WordStage for Sequencer {
    fn name(&self) -> &'static str {
        match self.algorithm {
            SortAlgorithm::Robust => "RobustSort",
            SortAlgorithm::Simple => "SimpleSort",
        }
    }

    fn apply(&self, words: Vec<Word>) -> Vec<Word> {
        sequence_words(words, self.algorithm)
    }
}

/// Put words into reading order. Never panics, whatever the coordinates.
pub fn sequence_words(mut words: Vec<Word>, algorithm: SortAlgorithm) -> Vec<Word> {
    match algorithm {
        SortAlgorithm::Simple => {
            words.sort_by(simple_cmp);
            words
        }
        SortAlgorithm::Robust => merge_sort_by(words, robust_cmp),
    }
}

/// Same-row test first: rows are `|Δy0| <= half the mean box height`.
///
/// Not transitive (a~b and b~c does not give a~c), so it must not be
/// fed to `slice::sort_by`.
pub fn robust_cmp(a: &Word, b: &Word) -> Ordering {
    let avg_height = (a.bbox.height() + b.bbox.height()) / 2.0;
    let threshold = avg_height * 0.5;

    if (a.bbox.y0 - b.bbox.y0).abs() <= threshold {
        a.bbox.x0.total_cmp(&b.bbox.x0)
    } else {
        a.bbox.y0.total_cmp(&b.bbox.y0)
    }
}

pub fn simple_cmp(a: &Word, b: &Word) -> Ordering {
    a.bbox
        .y0
        .total_cmp(&b.bbox.y0)
        .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
}

/// Top-down stable merge sort that only relies on `cmp` being callable.
/// Terminates and returns a permutation for any comparator.
fn merge_sort_by<T, F>(items: Vec<T>, cmp: F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering + Copy,
{
    if items.len() <= 1 {
        return items;
    }

    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort_by(left, cmp);
    let right = merge_sort_by(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::{texts, word};

    #[test]
    fn test_robust_keeps_jittered_row_together() {
        // Same visual row, baseline jitter smaller than half the height
        let words = vec![
            word("world", 60.0, 101.0, 90.0, 111.0, 10.0),
            word("Next", 10.0, 130.0, 40.0, 140.0, 10.0),
            word("Hello", 10.0, 103.0, 50.0, 113.0, 10.0),
        ];
        let sorted = sequence_words(words, SortAlgorithm::Robust);
        assert_eq!(texts(&sorted), vec!["Hello", "world", "Next"]);
    }

    #[test]
    fn test_simple_orders_by_y_then_x() {
        let words = vec![
            word("world", 60.0, 101.0, 90.0, 111.0, 10.0),
            word("Next", 10.0, 130.0, 40.0, 140.0, 10.0),
            word("Hello", 10.0, 103.0, 50.0, 113.0, 10.0),
            word("Same", 5.0, 130.0, 9.0, 140.0, 10.0),
        ];
        let sorted = sequence_words(words, SortAlgorithm::Simple);
        assert_eq!(texts(&sorted), vec!["world", "Hello", "Same", "Next"]);
    }

    #[test]
    fn test_robust_is_stable_for_equal_keys() {
        let words = vec![
            word("first", 10.0, 100.0, 20.0, 110.0, 10.0),
            word("second", 10.0, 100.0, 20.0, 110.0, 10.0),
        ];
        let sorted = sequence_words(words, SortAlgorithm::Robust);
        assert_eq!(texts(&sorted), vec!["first", "second"]);
    }

    #[test]
    fn test_robust_survives_intransitive_input() {
        // Staircase: each neighbour shares a row, the ends do not
        let mut words = Vec::new();
        for i in 0..64 {
            let y0 = 100.0 + (i as f64) * 3.0;
            let x0 = ((i * 37) % 64) as f64 * 10.0;
            words.push(word(&format!("w{i}"), x0, y0, x0 + 5.0, y0 + 10.0, 10.0));
        }
        words.push(word("nan", f64::NAN, f64::NAN, 1.0, 1.0, 10.0));

        let sorted = sequence_words(words, SortAlgorithm::Robust);
        assert_eq!(sorted.len(), 65);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(sequence_words(Vec::new(), SortAlgorithm::Robust).is_empty());
        let one = sequence_words(vec![word("a", 0.0, 0.0, 1.0, 1.0, 1.0)], SortAlgorithm::Robust);
        assert_eq!(texts(&one), vec!["a"]);
    }

    #[test]
    fn test_stage_name_follows_algorithm() {
        assert_eq!(Sequencer::new(SortAlgorithm::Robust).name(), "RobustSort");
        assert_eq!(Sequencer::new(SortAlgorithm::Simple).name(), "SimpleSort");
    }
}
