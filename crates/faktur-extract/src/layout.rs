//! Spatial helpers over the fragment sequence.
//!
//! The engine reports fragments in approximate reading order, but skewed
//! scans reorder them. Extraction strategies work on a defensively sorted
//! view and use spatial proximity rather than sequence position wherever a
//! label anchors a value.

use std::cmp::Ordering;

use faktur_core::types::TextFragment;

/// Returns fragments sorted into reading order: page, then row, then x.
///
/// Two fragments belong to the same row when their vertical offset is small
/// relative to their height, which keeps slightly skewed lines together.
pub fn reading_order(fragments: &[TextFragment]) -> Vec<&TextFragment> {
    let mut ordered: Vec<&TextFragment> = fragments.iter().collect();
    ordered.sort_by(|a, b| compare_reading_order(a, b));
    ordered
}

fn compare_reading_order(a: &TextFragment, b: &TextFragment) -> Ordering {
    if a.page_index != b.page_index {
        return a.page_index.cmp(&b.page_index);
    }

    let row_tolerance = 0.6 * a.bounds.height.min(b.bounds.height).max(1.0);
    if (a.bounds.y - b.bounds.y).abs() <= row_tolerance {
        a.bounds.x.total_cmp(&b.bounds.x)
    } else {
        a.bounds.y.total_cmp(&b.bounds.y)
    }
}

/// Returns fragments on the label's page whose center lies within `radius`
/// of the label's center, excluding the label itself.
pub fn neighbors<'a>(
    label: &TextFragment,
    fragments: &[&'a TextFragment],
    radius: f32,
) -> Vec<&'a TextFragment> {
    fragments
        .iter()
        .copied()
        .filter(|candidate| {
            candidate.page_index == label.page_index
                && !std::ptr::eq(*candidate, label)
                && candidate.bounds.center_distance(&label.bounds) <= radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use faktur_core::types::BoundingBox;

    use super::*;

    fn fragment(text: &str, x: f32, y: f32, page: u32) -> TextFragment {
        TextFragment::new(text, BoundingBox::new(x, y, 50.0, 12.0), 0.9, page)
    }

    #[test]
    fn test_reading_order_sorts_rows_then_columns() {
        let fragments = vec![
            fragment("right", 200.0, 100.0, 0),
            fragment("below", 10.0, 200.0, 0),
            fragment("left", 10.0, 103.0, 0), // same row as "right", slight skew
        ];

        let ordered = reading_order(&fragments);
        let texts: Vec<&str> = ordered.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["left", "right", "below"]);
    }

    #[test]
    fn test_reading_order_respects_pages() {
        let fragments = vec![fragment("second", 0.0, 0.0, 1), fragment("first", 0.0, 500.0, 0)];
        let ordered = reading_order(&fragments);
        assert_eq!(ordered[0].text, "first");
        assert_eq!(ordered[1].text, "second");
    }

    #[test]
    fn test_neighbors_stay_on_page_and_within_radius() {
        let label = fragment("Total", 100.0, 100.0, 0);
        let near = fragment("12.00", 170.0, 100.0, 0);
        let far = fragment("99.00", 900.0, 900.0, 0);
        let other_page = fragment("55.00", 100.0, 100.0, 1);

        let all = vec![&label, &near, &far, &other_page];
        let found = neighbors(&label, &all, 160.0);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "12.00");
    }
}
