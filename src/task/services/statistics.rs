//! Per-chat task statistics.

use crate::task::domain::{Task, TaskStatus};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;

/// Aggregated view over every task of one chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatStatistics {
    total: usize,
    new: usize,
    in_progress: usize,
    done: usize,
    archived: usize,
    tracked_seconds: u64,
    rated: u32,
    rating_sum: u32,
}

impl ChatStatistics {
    /// Aggregates the given tasks.
    #[must_use]
    pub fn collect(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut stats, task| {
            stats.total = stats.total.saturating_add(1);
            let counter = match task.status() {
                TaskStatus::New => &mut stats.new,
                TaskStatus::InProgress => &mut stats.in_progress,
                TaskStatus::Done => &mut stats.done,
                TaskStatus::Archived => &mut stats.archived,
            };
            *counter = counter.saturating_add(1);
            stats.tracked_seconds = stats
                .tracked_seconds
                .saturating_add(task.accumulated_time_seconds());
            if let Some(rating) = task.rating() {
                stats.rated = stats.rated.saturating_add(1);
                stats.rating_sum = stats.rating_sum.saturating_add(u32::from(rating.value()));
            }
            stats
        })
    }

    /// Returns the number of tasks.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Returns the number of tasks in `status`.
    #[must_use]
    pub const fn count(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::New => self.new,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Done => self.done,
            TaskStatus::Archived => self.archived,
        }
    }

    /// Returns the accumulated in-progress time of all tasks.
    #[must_use]
    pub const fn tracked_seconds(&self) -> u64 {
        self.tracked_seconds
    }

    /// Returns the number of rated tasks.
    #[must_use]
    pub const fn rated(&self) -> u32 {
        self.rated
    }

    /// Returns the mean rating, or `None` when nothing is rated.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "a mean of small integer ratings is reported as a fraction"
    )]
    pub fn average_rating(&self) -> Option<f64> {
        (self.rated > 0).then(|| f64::from(self.rating_sum) / f64::from(self.rated))
    }
}

/// Formats seconds as compact text such as `1d 2h`, `1h 30m` or `45s`.
///
/// Seconds are only shown for durations under a minute.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    let hours = seconds.rem_euclid(SECONDS_PER_DAY).div_euclid(SECONDS_PER_HOUR);
    let minutes = seconds
        .rem_euclid(SECONDS_PER_HOUR)
        .div_euclid(SECONDS_PER_MINUTE);

    let parts: Vec<String> = [(days, 'd'), (hours, 'h'), (minutes, 'm')]
        .into_iter()
        .filter(|&(value, _)| value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        format!("{seconds}s")
    } else {
        parts.join(" ")
    }
}
