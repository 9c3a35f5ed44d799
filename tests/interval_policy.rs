//! Property tests for the interval policy.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use proptest::prelude::*;

use candlecast::models::interval::IntervalSpec;
use candlecast::models::window::TimeWindow;

fn window_strategy() -> impl Strategy<Value = TimeWindow> {
    prop_oneof![
        Just(TimeWindow::Hour),
        Just(TimeWindow::Day),
        Just(TimeWindow::Week),
        Just(TimeWindow::Month),
        Just(TimeWindow::Year),
    ]
}

// 2001-09-09 .. 2033-05-18, comfortably inside chrono's range.
fn now_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (1_000_000_000i64..2_000_000_000i64)
        .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
}

proptest! {
    #[test]
    fn start_precedes_end_and_granularity_is_positive(
        window in window_strategy(),
        now in now_strategy(),
    ) {
        let spec = IntervalSpec::compute(window, now, None).unwrap();
        prop_assert!(spec.start < spec.end);
        prop_assert_eq!(spec.end, now);
        prop_assert!(spec.granularity.get() >= 1);
    }

    #[test]
    fn clamped_year_never_starts_before_inception(
        now in now_strategy(),
        days_listed in 0i64..2_000,
    ) {
        let inception = (now - Duration::days(days_listed)).date_naive();
        match IntervalSpec::compute(TimeWindow::Year, now, Some(inception)) {
            Ok(spec) => {
                prop_assert!(spec.start.date_naive() >= inception || spec.elapsed_months.is_none());
                if let Some(months) = spec.elapsed_months {
                    prop_assert!(months <= 12);
                }
            }
            // Markets listed less than ~7 minutes ago have no chartable span.
            Err(_) => prop_assert!(days_listed == 0),
        }
    }

    #[test]
    fn compute_is_pure(
        window in window_strategy(),
        now in now_strategy(),
    ) {
        let a = IntervalSpec::compute(window, now, None).unwrap();
        let b = IntervalSpec::compute(window, now, None).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn all_cycle_windows_compute_for_a_fixed_now() {
    let now = "2024-06-15T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
    let inception = NaiveDate::from_ymd_opt(2015, 7, 20).unwrap();
    for window in TimeWindow::CYCLE_ORDER {
        let spec = IntervalSpec::compute(window, now, Some(inception)).unwrap();
        assert!(spec.granularity.get() >= 1, "{window}");
    }
}
