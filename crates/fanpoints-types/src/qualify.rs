//! Listening qualification rule.

/// No campaign can require less than this many seconds of listening.
pub const MIN_LISTEN_FLOOR_SECS: u32 = 10;
/// Reported completion percentage that qualifies on its own.
pub const COMPLETION_PCT_THRESHOLD: u8 = 70;

/// `max(min_listen_seconds, 10)`.
pub fn required_listen_seconds(min_listen_seconds: u32) -> u32 {
    min_listen_seconds.max(MIN_LISTEN_FLOOR_SECS)
}

/// A session qualifies when it has been played for the required time AND
/// either the reported completion reached 70% or the playback position
/// reached 80% of the track (floored). The second arm covers players whose
/// completion percentage lags the real position.
pub fn qualifies(
    progress_sec: u32,
    completion_pct: u8,
    min_listen_seconds: u32,
    track_duration_sec: u32,
) -> bool {
    if progress_sec < required_listen_seconds(min_listen_seconds) {
        return false;
    }
    let position_threshold = (u64::from(track_duration_sec) * 8 / 10) as u32;
    completion_pct >= COMPLETION_PCT_THRESHOLD || progress_sec >= position_threshold
}
