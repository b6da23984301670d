//! Prometheus metrics (lock-free atomics, zero allocation on hot path).

use fanpoints_types::RejectReason;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Metrics = Metrics::new();

const REASONS: usize = RejectReason::ALL.len();

pub struct Metrics {
    // --- Player traffic ---
    pub sessions_started: AtomicU64,
    pub heartbeats: AtomicU64,
    pub completions: AtomicU64,

    // --- Settlement ---
    pub rewards_settled: AtomicU64,
    pub points_awarded: AtomicU64,
    pub settlement_conflicts: AtomicU64,

    // --- Latency (μs, updated via CAS) ---
    pub settle_duration_us_sum: AtomicU64,
    pub settle_duration_us_max: AtomicU64,

    // --- Rejections, indexed by RejectReason::index() ---
    rejections: [AtomicU64; REASONS],
}

impl Metrics {
    const fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            heartbeats: AtomicU64::new(0),
            completions: AtomicU64::new(0),
            rewards_settled: AtomicU64::new(0),
            points_awarded: AtomicU64::new(0),
            settlement_conflicts: AtomicU64::new(0),
            settle_duration_us_sum: AtomicU64::new(0),
            settle_duration_us_max: AtomicU64::new(0),
            rejections: [const { AtomicU64::new(0) }; REASONS],
        }
    }

    pub fn record_rejection(&self, reason: RejectReason) {
        self.rejections[reason.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejections(&self, reason: RejectReason) -> u64 {
        self.rejections[reason.index()].load(Ordering::Relaxed)
    }

    pub fn record_settlement(&self, amount: u64, start: Instant) {
        self.rewards_settled.fetch_add(1, Ordering::Relaxed);
        self.points_awarded.fetch_add(amount, Ordering::Relaxed);

        let us = start.elapsed().as_micros() as u64;
        self.settle_duration_us_sum.fetch_add(us, Ordering::Relaxed);
        // CAS loop for max tracking
        let mut cur = self.settle_duration_us_max.load(Ordering::Relaxed);
        while us > cur {
            match self.settle_duration_us_max.compare_exchange_weak(
                cur,
                us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let sessions = self.sessions_started.load(Ordering::Relaxed);
        let heartbeats = self.heartbeats.load(Ordering::Relaxed);
        let completions = self.completions.load(Ordering::Relaxed);
        let settled = self.rewards_settled.load(Ordering::Relaxed);
        let points = self.points_awarded.load(Ordering::Relaxed);
        let conflicts = self.settlement_conflicts.load(Ordering::Relaxed);
        let dur_sum = self.settle_duration_us_sum.load(Ordering::Relaxed);
        let dur_max = self.settle_duration_us_max.swap(0, Ordering::Relaxed);

        // Convert μs to seconds for Prometheus conventions
        let dur_sum_s = dur_sum as f64 / 1_000_000.0;
        let dur_max_s = dur_max as f64 / 1_000_000.0;

        let mut out = format!(
            "\
# HELP fanpoints_sessions_started_total Listening sessions started.\n\
# TYPE fanpoints_sessions_started_total counter\n\
fanpoints_sessions_started_total {sessions}\n\
# HELP fanpoints_heartbeats_total Accepted progress heartbeats.\n\
# TYPE fanpoints_heartbeats_total counter\n\
fanpoints_heartbeats_total {heartbeats}\n\
# HELP fanpoints_completions_total Completion requests evaluated.\n\
# TYPE fanpoints_completions_total counter\n\
fanpoints_completions_total {completions}\n\
# HELP fanpoints_rewards_settled_total Rewards committed.\n\
# TYPE fanpoints_rewards_settled_total counter\n\
fanpoints_rewards_settled_total {settled}\n\
# HELP fanpoints_points_awarded_total Points credited to wallets by settlement.\n\
# TYPE fanpoints_points_awarded_total counter\n\
fanpoints_points_awarded_total {points}\n\
# HELP fanpoints_settlement_conflicts_total Settlements aborted by the atomic re-check.\n\
# TYPE fanpoints_settlement_conflicts_total counter\n\
fanpoints_settlement_conflicts_total {conflicts}\n\
# HELP fanpoints_settle_duration_seconds_sum Total settlement time (seconds).\n\
# TYPE fanpoints_settle_duration_seconds_sum counter\n\
fanpoints_settle_duration_seconds_sum {dur_sum_s:.6}\n\
# HELP fanpoints_settle_duration_seconds_max Max settlement time since last scrape (seconds).\n\
# TYPE fanpoints_settle_duration_seconds_max gauge\n\
fanpoints_settle_duration_seconds_max {dur_max_s:.6}\n\
# HELP fanpoints_rejections_total Completions rejected, by reason.\n\
# TYPE fanpoints_rejections_total counter\n"
        );
        for reason in RejectReason::ALL {
            let _ = writeln!(
                out,
                "fanpoints_rejections_total{{reason=\"{}\"}} {}",
                reason.code(),
                self.rejections(reason)
            );
        }
        out
    }
}
