//! Consecutive-day reading streak calculations.

use chrono::NaiveDate;

/// Current consecutive-day streak ending at `today` (or yesterday).
///
/// A streak that was last fed yesterday still counts as alive, so the first
/// gap may be 0 or 1 days; every later gap must be exactly 1 day.
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = dates.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut iter = days.into_iter().filter(|d| *d <= today);

    let most_recent = match iter.next() {
        Some(d) => d,
        None => return 0,
    };

    // Streak is broken unless the last activity was today or yesterday
    if (today - most_recent).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    let mut prev = most_recent;
    for day in iter {
        if (prev - day).num_days() == 1 {
            streak += 1;
            prev = day;
        } else {
            break;
        }
    }

    streak
}

/// Longest consecutive-day streak anywhere in the history.
pub fn longest_streak(dates: &[NaiveDate]) -> u32 {
    let mut days: Vec<NaiveDate> = dates.to_vec();
    days.sort_unstable();
    days.dedup();

    if days.is_empty() {
        return 0;
    }

    let mut longest = 1;
    let mut run = 1;
    for pair in days.windows(2) {
        if (pair[1] - pair[0]).num_days() == 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    longest
}
