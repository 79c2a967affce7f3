//! Ease-factor and interval computation for review items.
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but the answer was recognised
//! - 2: Incorrect, but the answer seemed easy once shown
//! - 3: Correct with serious difficulty
//! - 4: Correct after hesitation
//! - 5: Perfect recall
//!
//! Items walk through their profile's fixed intervals first (learning phase).
//! Once every fixed interval has been used the item graduates and each
//! interval is the previous one scaled by the ease factor.

use chrono::{DateTime, TimeDelta, Utc};

use crate::data::models::{PerformanceEntry, ReviewError, ReviewItem, SpacingProfile};

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 2.5;
pub const MAX_QUALITY: u8 = 5;

/// A recall rating already checked to be on the 0-5 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: i32) -> Result<Self, ReviewError> {
        u8::try_from(value)
            .ok()
            .filter(|q| *q <= MAX_QUALITY)
            .map(Quality)
            .ok_or(ReviewError::InvalidQuality(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Checks a learner's answer time, in seconds
pub fn validate_elapsed_time(seconds: f64) -> Result<f64, ReviewError> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(ReviewError::InvalidElapsedTime(seconds))
    }
}

/// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), clamped to [1.3, 2.5]
pub fn next_ease(current_ease: f64, quality: Quality) -> f64 {
    let miss = f64::from(MAX_QUALITY - quality.value());
    let raw = current_ease + (0.1 - miss * (0.08 + miss * 0.02));
    raw.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR)
}

/// Which half of the schedule an item is in for a given review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Still walking the profile's fixed intervals; holds the next one
    Learning(i64),
    Graduated,
}

pub fn phase(profile: &SpacingProfile, review_count_before: u32) -> Phase {
    match profile.intervals.get(review_count_before as usize) {
        Some(&fixed) => Phase::Learning(fixed),
        None => Phase::Graduated,
    }
}

/// Interval in hours that follows a review.
///
/// `review_count_before` is the item's review count before this review is
/// counted.
pub fn next_interval(
    current_interval: i64,
    profile: &SpacingProfile,
    review_count_before: u32,
    new_ease: f64,
) -> i64 {
    match phase(profile, review_count_before) {
        Phase::Learning(fixed) => fixed,
        // `as` saturates, so runaway growth pins at i64::MAX instead of wrapping
        Phase::Graduated => (current_interval as f64 * new_ease).round() as i64,
    }
}

/// Returns the item as it stands after one more review, leaving the input untouched.
pub fn apply_review(
    item: &ReviewItem,
    profile: &SpacingProfile,
    quality: Quality,
    elapsed_time: f64,
    now: DateTime<Utc>,
) -> Result<ReviewItem, ReviewError> {
    let new_ease = next_ease(item.ease_factor, quality);
    let new_interval = next_interval(item.interval, profile, item.review_count, new_ease);

    let next_review = TimeDelta::try_hours(new_interval)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or(ReviewError::ScheduleOverflow {
            interval_hours: new_interval,
        })?;

    let mut performance_history = item.performance_history.clone();
    performance_history.push(PerformanceEntry {
        timestamp: now,
        quality: quality.value(),
        elapsed_time,
    });

    Ok(ReviewItem {
        ease_factor: new_ease,
        interval: new_interval,
        last_reviewed: Some(now),
        next_review: Some(next_review),
        review_count: item.review_count + 1,
        performance_history,
        ..item.clone()
    })
}
