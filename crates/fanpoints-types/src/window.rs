//! Rate-limit windows and cap predicates.

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Start of the sliding one-hour session window (inclusive).
pub fn hour_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(1)
}

/// Midnight UTC of the calendar day containing `now`.
pub fn utc_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// The hourly rule trips only when the count is strictly above the cap.
pub fn exceeds_hourly_cap(sessions_in_window: usize, max_sessions_per_hour: u32) -> bool {
    sessions_in_window > max_sessions_per_hour as usize
}

/// True if paying `reward` on top of `earned_today` would pass the cap.
pub fn exceeds_daily_cap(earned_today: u64, reward: u64, daily_cap: u64) -> bool {
    match earned_today.checked_add(reward) {
        Some(total) => total > daily_cap,
        None => true,
    }
}

/// Remaining budget (`budget - spent`) covers `cost`.
pub fn has_budget_for(budget_points: u64, spent_points: u64, cost: u64) -> bool {
    budget_points.saturating_sub(spent_points) >= cost
}
