use crate::types::{BoundingBox, Dimension, Line, Word};

/// Group a page's words into lines.
///
/// Lines come out in the order their first word was seen; words inside a
/// line are ordered by x0.
pub fn assemble_lines(words: &[Word]) -> Vec<Line> {
    cluster_by_middle_y(words.to_vec(), |w| w.bbox)
        .into_iter()
        .map(finalize_line)
        .collect()
}

/// Greedy first-match clustering: an item joins the first existing group
/// whose vertical midpoint lies inside the item's `[y0, y1]`.
pub(crate) fn cluster_by_middle_y<T, F>(items: Vec<T>, bbox_of: F) -> Vec<Vec<T>>
where
    F: Fn(&T) -> BoundingBox,
{
    let mut groups: Vec<Vec<T>> = Vec::new();

    for item in items {
        let bbox = bbox_of(&item);
        let target = groups.iter().position(|group| {
            let mid_y = group_middle_y(group, &bbox_of);
            bbox.y0 <= mid_y && bbox.y1 >= mid_y
        });

        match target {
            Some(index) => groups[index].push(item),
            None => groups.push(vec![item]),
        }
    }

    groups
}

fn group_middle_y<T, F>(group: &[T], bbox_of: &F) -> f64
where
    F: Fn(&T) -> BoundingBox,
{
    let (y0, y1) = group.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(y0, y1), item| {
        let bbox = bbox_of(item);
        (y0.min(bbox.y0), y1.max(bbox.y1))
    });
    (y0 + y1) / 2.0
}

/// Union of the boxes, seeded with `±∞`.
pub(crate) fn union_bbox<'a>(boxes: impl Iterator<Item = &'a BoundingBox>) -> BoundingBox {
    let seed = BoundingBox {
        x0: f64::INFINITY,
        y0: f64::INFINITY,
        x1: f64::NEG_INFINITY,
        y1: f64::NEG_INFINITY,
    };
    boxes.fold(seed, |acc, bbox| acc.union(bbox))
}

fn finalize_line(mut words: Vec<Word>) -> Line {
    debug_assert!(!words.is_empty(), "line groups are created with one word");

    let bbox = union_bbox(words.iter().map(|w| &w.bbox));
    words.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

    let average_font_size = words.iter().map(Word::font_size).sum::<f64>() / words.len() as f64;
    let text = words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");

    Line {
        text,
        bbox,
        dimension: Dimension {
            width: bbox.x1 - bbox.x0,
            height: bbox.y1 - bbox.y0,
        },
        average_font_size,
        words,
    }
}
