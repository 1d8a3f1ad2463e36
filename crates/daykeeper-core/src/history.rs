//! History queries over the daily [`Save`] records.
//!
//! The heatmap widget consumes a date-keyed completion series ending
//! yesterday (today is still in progress and has no save yet). Rendering
//! lives in the presentation layer; this module only shapes the data.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::clock::Clock;
use crate::timer::Save;

/// Completion percentage per calendar day over the last `window_days`
/// days, ending yesterday. Duplicate days keep the latest record.
pub fn completion_by_day(
    saves: &[Save],
    clock: &dyn Clock,
    window_days: i64,
) -> BTreeMap<NaiveDate, u8> {
    // A century bounds the window; beyond that chrono date math overflows.
    let window_days = window_days.clamp(0, 36_500);
    let today = clock.day_of(clock.now_ms());
    let start = today - Duration::days(window_days);
    let mut out = BTreeMap::new();
    for save in saves {
        let day = clock.day_of(save.date);
        if day >= start && day < today {
            out.insert(day, save.completion);
        }
    }
    out
}

/// Heat intensity bucket `0..=4` for a completion percentage, one bucket
/// per 25 points.
pub fn heat_bucket(completion: u8) -> u8 {
    ((completion as f64 / 25.0).round() as u8).min(4)
}

/// Number of consecutive days ending yesterday with completion at or
/// above `min_completion`.
pub fn current_streak(saves: &[Save], clock: &dyn Clock, min_completion: u8) -> u32 {
    let by_day = completion_by_day(saves, clock, 36_500);
    let today = clock.day_of(clock.now_ms());
    let mut streak = 0;
    let mut day = today - Duration::days(1);
    while let Some(&completion) = by_day.get(&day) {
        if completion < min_completion {
            break;
        }
        streak += 1;
        day = day - Duration::days(1);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, MS_PER_DAY};
    use crate::timer::Save;

    // 2024-03-10T12:00:00Z
    const NOW: i64 = 1_710_072_000_000;

    fn save(days_ago: i64, completion: u8) -> Save {
        Save {
            date: NOW - days_ago * MS_PER_DAY,
            timers: Vec::new(),
            completion,
        }
    }

    #[test]
    fn series_excludes_today_and_window_tail() {
        let clock = ManualClock::new(NOW);
        let saves = vec![save(0, 10), save(1, 40), save(2, 80), save(100, 99)];
        let series = completion_by_day(&saves, &clock, 7);
        assert_eq!(series.len(), 2);
        let values: Vec<u8> = series.values().copied().collect();
        assert_eq!(values, vec![80, 40]);
    }

    #[test]
    fn duplicate_days_keep_latest() {
        let clock = ManualClock::new(NOW);
        let saves = vec![save(1, 10), save(1, 90)];
        let series = completion_by_day(&saves, &clock, 7);
        assert_eq!(series.values().copied().collect::<Vec<_>>(), vec![90]);
    }

    #[test]
    fn buckets_follow_quarter_scale() {
        assert_eq!(heat_bucket(0), 0);
        assert_eq!(heat_bucket(12), 0);
        assert_eq!(heat_bucket(13), 1);
        assert_eq!(heat_bucket(50), 2);
        assert_eq!(heat_bucket(88), 4);
        assert_eq!(heat_bucket(100), 4);
    }

    #[test]
    fn streak_counts_back_from_yesterday() {
        let clock = ManualClock::new(NOW);
        let saves = vec![save(1, 80), save(2, 60), save(3, 10), save(4, 90)];
        assert_eq!(current_streak(&saves, &clock, 50), 2);
    }

    #[test]
    fn streak_requires_yesterday() {
        let clock = ManualClock::new(NOW);
        let saves = vec![save(2, 80), save(3, 80)];
        assert_eq!(current_streak(&saves, &clock, 50), 0);
    }

    #[test]
    fn streak_on_empty_history_is_zero() {
        let clock = ManualClock::new(NOW);
        assert_eq!(current_streak(&[], &clock, 50), 0);
    }
}
