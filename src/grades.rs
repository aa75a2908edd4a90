use crate::models::GradeItem;

/// Letter bands, highest first: (minimum mark, letter, grade points).
const BANDS: [(f64, &str, f64); 9] = [
    (90.0, "A", 4.0),
    (85.0, "A-", 3.7),
    (80.0, "B+", 3.3),
    (75.0, "B", 3.0),
    (70.0, "B-", 2.7),
    (65.0, "C+", 2.3),
    (60.0, "C", 2.0),
    (55.0, "C-", 1.7),
    (50.0, "D", 1.0),
];

/// Weighted mark of a course: `sum(score / max_score * weight)`.
///
/// Zero-weight items are ignored. Returns `None` when no item carries weight or
/// when a weighted item has a non-positive `max_score`. The result is not clamped.
pub fn compute_mark(items: &[GradeItem]) -> Option<f64> {
    let mut weighted = items.iter().filter(|item| item.weight != 0.0).peekable();
    weighted.peek()?;

    weighted.try_fold(0.0, |total, item| {
        if item.max_score <= 0.0 {
            None
        } else {
            Some(total + item.score / item.max_score * item.weight)
        }
    })
}

pub fn total_weight(items: &[GradeItem]) -> f64 {
    items.iter().map(|item| item.weight).sum()
}

pub fn letter_grade(mark: f64) -> &'static str {
    BANDS
        .iter()
        .find(|(min, _, _)| mark >= *min)
        .map(|(_, letter, _)| *letter)
        .unwrap_or("F")
}

pub fn grade_points(mark: f64) -> f64 {
    BANDS
        .iter()
        .find(|(min, _, _)| mark >= *min)
        .map(|(_, _, points)| *points)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn item(score: f64, max_score: f64, weight: f64) -> GradeItem {
        GradeItem {
            id: Uuid::new_v4(),
            course_id: Uuid::nil(),
            item_type: "quiz".to_string(),
            title: "Quiz".to_string(),
            score,
            max_score,
            weight,
        }
    }

    #[test]
    fn empty_ledger_has_no_mark() {
        assert_eq!(compute_mark(&[]), None);
    }

    #[test]
    fn mark_sums_weighted_fractions() {
        let items = vec![item(45.0, 50.0, 30.0), item(80.0, 100.0, 70.0)];
        let mark = compute_mark(&items).unwrap();
        assert!((mark - (27.0 + 56.0)).abs() < 1e-9);
    }

    #[test]
    fn invalid_max_score_voids_the_mark() {
        let items = vec![item(10.0, 10.0, 20.0), item(5.0, 0.0, 20.0)];
        assert_eq!(compute_mark(&items), None);
    }

    #[test]
    fn zero_weight_items_are_ignored() {
        assert_eq!(compute_mark(&[item(5.0, 0.0, 0.0)]), None);
        let items = vec![item(10.0, 10.0, 40.0), item(0.0, 0.0, 0.0)];
        assert_eq!(compute_mark(&items), Some(40.0));
    }

    #[test]
    fn weights_over_one_hundred_are_not_clamped() {
        let items = vec![item(100.0, 100.0, 80.0), item(100.0, 100.0, 40.0)];
        assert_eq!(compute_mark(&items), Some(120.0));
    }

    #[test]
    fn letters_and_points_follow_bands() {
        assert_eq!(letter_grade(95.0), "A");
        assert_eq!(letter_grade(85.0), "A-");
        assert_eq!(letter_grade(72.4), "B-");
        assert_eq!(letter_grade(50.0), "D");
        assert_eq!(letter_grade(49.9), "F");
        assert_eq!(grade_points(88.0), 3.7);
        assert_eq!(grade_points(61.0), 2.0);
        assert_eq!(grade_points(12.0), 0.0);
    }

    fn arb_items() -> impl Strategy<Value = Vec<GradeItem>> {
        prop::collection::vec(
            (0.0f64..100.0, 1.0f64..100.0, 0.0f64..30.0)
                .prop_map(|(score, max_score, weight)| item(score, max_score, weight)),
            0..12,
        )
    }

    proptest! {
        #[test]
        fn mark_ignores_item_order(items in arb_items()) {
            let mut reversed = items.clone();
            reversed.reverse();
            match (compute_mark(&items), compute_mark(&reversed)) {
                (Some(a), Some(b)) => prop_assert!((a - b).abs() < 1e-9),
                (a, b) => prop_assert_eq!(a, b),
            }
        }

        #[test]
        fn mark_ignores_inserted_zero_weight_item(
            items in arb_items(),
            position in any::<prop::sample::Index>(),
            score in 0.0f64..100.0,
        ) {
            let mut padded = items.clone();
            let at = position.index(padded.len() + 1);
            padded.insert(at, item(score, 100.0, 0.0));
            match (compute_mark(&items), compute_mark(&padded)) {
                (Some(a), Some(b)) => prop_assert!((a - b).abs() < 1e-9),
                (a, b) => prop_assert_eq!(a, b),
            }
        }
    }
}
