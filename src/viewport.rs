use std::ops::Range;

/// Visible slice of `total` rows for a viewport `rows` tall, keeping `cursor`
/// on screen and centered where the ends allow it.
pub fn window(total: usize, cursor: usize, rows: usize) -> Range<usize> {
    if total <= rows {
        return 0..total;
    }
    if rows == 0 {
        return 0..0;
    }
    let cursor = cursor.min(total - 1);
    let start = cursor.saturating_sub(rows / 2).min(total - rows);
    start..start + rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn short_lists_show_everything(total in 0usize..50, extra in 0usize..20, cursor in 0usize..60) {
            prop_assert_eq!(window(total, cursor, total + extra), 0..total);
        }

        #[test]
        fn long_lists_keep_cursor_visible(rows in 1usize..40, extra in 1usize..200, cursor in 0usize..240) {
            let total = rows + extra;
            let cursor = cursor % total;
            let range = window(total, cursor, rows);
            prop_assert_eq!(range.len(), rows);
            prop_assert!(range.start <= cursor && cursor < range.end);
            prop_assert!(range.end <= total);
        }
    }

    #[test]
    fn cursor_is_centered_mid_list() {
        assert_eq!(window(100, 50, 10), 45..55);
        assert_eq!(window(100, 50, 11), 45..56);
    }

    #[test]
    fn window_clamps_at_both_ends() {
        assert_eq!(window(100, 0, 10), 0..10);
        assert_eq!(window(100, 2, 10), 0..10);
        assert_eq!(window(100, 99, 10), 90..100);
        assert_eq!(window(100, 97, 10), 90..100);
    }

    #[test]
    fn zero_rows_is_empty() {
        assert_eq!(window(5, 2, 0), 0..0);
        assert_eq!(window(0, 0, 0), 0..0);
    }

    #[test]
    fn cursor_past_end_is_clamped() {
        assert_eq!(window(20, 50, 5), 15..20);
    }
}
