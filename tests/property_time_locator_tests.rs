use proptest::prelude::*;
use stripchart_rs::core::{ReferenceZone, STEP_CANDIDATES, TimeLocator, select_formatter};

const DAY: i64 = 86_400_000_000;

proptest! {
    #[test]
    fn ticks_are_aligned_evenly_spaced_and_below_view_max(
        view_min in -4_000_000_000_000_000i64..4_000_000_000_000_000,
        span in 1i64..(3_000 * DAY),
        offset_seconds in -43_200i32..50_400
    ) {
        let zone = ReferenceZone::from_offset_seconds(offset_seconds);
        let mut locator = TimeLocator::new(zone);
        let view_max = view_min + span;

        let ticks = locator.tick_values(view_min, view_max).expect("span fits the step table");
        let step = locator.active_step_us().expect("step recorded");

        prop_assert!(!ticks.is_empty());
        prop_assert!(ticks.iter().all(|tick| *tick < view_max));
        prop_assert!(ticks.windows(2).all(|pair| pair[1] - pair[0] == step));

        let first = ticks[0];
        prop_assert_eq!((first + zone.offset_micros()).rem_euclid(step), 0);
        prop_assert!(first <= view_min);
        prop_assert!(first + step > view_min);
    }

    #[test]
    fn selected_step_is_smallest_covering_threshold(raw in 0.0f64..(365.0 * DAY as f64)) {
        let candidate = select_formatter(raw).expect("raw step fits the table");
        prop_assert!(candidate.threshold_us as f64 >= raw);

        let index = STEP_CANDIDATES
            .iter()
            .position(|c| *c == candidate)
            .expect("candidate comes from the table");
        if index > 0 {
            prop_assert!((STEP_CANDIDATES[index - 1].threshold_us as f64) < raw);
        }
    }
}
