use crate::ocr::{Rect, TextOccurrence};

pub(crate) fn clamp_rect(rect: Rect, width: u32, height: u32) -> Option<Rect> {
    let clamped = Rect {
        left: rect.left.min(width),
        top: rect.top.min(height),
        right: rect.right.min(width),
        bottom: rect.bottom.min(height),
    };
    if clamped.is_empty() {
        None
    } else {
        Some(clamped)
    }
}

fn intersection_area(a: &Rect, b: &Rect) -> u64 {
    let ix1 = a.left.max(b.left);
    let iy1 = a.top.max(b.top);
    let ix2 = a.right.min(b.right);
    let iy2 = a.bottom.min(b.bottom);
    if ix2 <= ix1 || iy2 <= iy1 {
        return 0;
    }
    (ix2 - ix1) as u64 * (iy2 - iy1) as u64
}

fn iou(a: &Rect, b: &Rect) -> f32 {
    let inter = intersection_area(a, b) as f32;
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = a.width() as f32 * a.height() as f32;
    let area_b = b.width() as f32 * b.height() as f32;
    inter / (area_a + area_b - inter).max(1.0)
}

/// Id pairs `(a, b, iou)` with `a < b` whose rectangles share at least one pixel.
pub fn overlapping_pairs(occurrences: &[TextOccurrence]) -> Vec<(usize, usize, f32)> {
    let rects = occurrences
        .iter()
        .map(|occ| (occ.occurrence_id, occ.rectangle()))
        .collect::<Vec<_>>();
    let mut pairs = Vec::new();
    for (idx, (a_id, a)) in rects.iter().enumerate() {
        for (b_id, b) in &rects[idx + 1..] {
            if intersection_area(a, b) > 0 {
                pairs.push(((*a_id).min(*b_id), (*a_id).max(*b_id), iou(a, b)));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::occurrence;

    fn rect(left: u32, top: u32, right: u32, bottom: u32) -> Rect {
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    #[test]
    fn clamp_trims_to_bounds() {
        assert_eq!(
            clamp_rect(rect(90, 5, 120, 30), 100, 20),
            Some(rect(90, 5, 100, 20))
        );
        assert_eq!(clamp_rect(rect(100, 0, 120, 10), 100, 20), None);
    }

    #[test]
    fn iou_of_identical_and_disjoint() {
        let a = rect(0, 0, 10, 10);
        assert!((iou(&a, &a) - 1.0).abs() < f32::EPSILON);
        assert_eq!(iou(&a, &rect(10, 0, 20, 10)), 0.0);
        let half = iou(&a, &rect(5, 0, 15, 10));
        assert!((half - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn finds_overlapping_boxes_only() {
        let occurrences = vec![
            occurrence(0, "a", 0, 0, 10, 10),
            occurrence(1, "b", 10, 0, 10, 10),
            occurrence(2, "c", 15, 5, 10, 10),
        ];
        let pairs = overlapping_pairs(&occurrences);
        assert_eq!(pairs.len(), 1);
        let (a, b, ratio) = pairs[0];
        assert_eq!((a, b), (1, 2));
        assert!((ratio - 25.0 / 175.0).abs() < 1e-6);
    }
}
