use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

use crate::data::models::{ReviewError, StorageError};
use crate::schema::review_items;

/// One entry of a review item's append-only audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub timestamp: DateTime<Utc>,
    pub quality: u8,
    /// Seconds the learner spent before answering
    pub elapsed_time: f64,
}

/// Scheduling state of one question for one learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: i32,
    pub question_id: i32,
    pub user_id: i32,
    pub spacing_profile_id: i32,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
    pub ease_factor: f64,
    /// Current interval in hours
    pub interval: i64,
    /// Number of accepted reviews; doubles as the optimistic-concurrency version.
    pub review_count: u32,
    pub performance_history: Vec<PerformanceEntry>,
}

impl ReviewItem {
    /// Never-reviewed items have no next review and stay out of the due set.
    pub fn is_scheduled(&self) -> bool {
        self.next_review.is_some()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review.is_some_and(|next| next <= now)
    }
}

/// Fields required to create a review item
#[derive(Debug, Clone, PartialEq)]
pub struct NewReviewItem {
    pub question_id: i32,
    pub user_id: i32,
    pub spacing_profile_id: i32,
    pub ease_factor: f64,
    pub interval: i64,
}

/// Options accepted by the due-set query
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListOptions {
    #[serde(default)]
    pub due_only: bool,
    pub limit: Option<usize>,
    #[serde(skip)]
    pub user_id: Option<i32>,
}

/// Storage-level filter over items that have a next review time.
/// Results are ordered by `next_review` ascending, then by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduledQuery {
    pub user_id: Option<i32>,
    pub due_at_or_before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// A scheduled item together with the question it asks, as a review
/// session needs it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItemWithQuestion {
    #[serde(flatten)]
    pub item: ReviewItem,
    pub question_text: String,
    pub answer_text: String,
}

/// Due and upcoming partitions of a learner's scheduled items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewSchedule {
    pub due: Vec<ReviewItemWithQuestion>,
    pub upcoming: Vec<ReviewItemWithQuestion>,
}

/// Review item row as stored in SQLite
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = review_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReviewItemRow {
    pub review_item_id: i32,
    pub question_id: i32,
    pub user_id: i32,
    pub spacing_profile_id: i32,
    /// Unix milliseconds, so SQLite compares and sorts them numerically
    pub last_reviewed: Option<i64>,
    pub next_review: Option<i64>,
    pub ease_factor: f64,
    pub interval_hours: i64,
    pub review_count: i64,
    pub performance_history: String,
}

#[derive(Insertable)]
#[diesel(table_name = review_items)]
pub struct NewReviewItemRow {
    pub question_id: i32,
    pub user_id: i32,
    pub spacing_profile_id: i32,
    pub ease_factor: f64,
    pub interval_hours: i64,
    pub review_count: i64,
    pub performance_history: String,
}

impl From<&NewReviewItem> for NewReviewItemRow {
    fn from(item: &NewReviewItem) -> Self {
        NewReviewItemRow {
            question_id: item.question_id,
            user_id: item.user_id,
            spacing_profile_id: item.spacing_profile_id,
            ease_factor: item.ease_factor,
            interval_hours: item.interval,
            review_count: 0,
            performance_history: "[]".to_string(),
        }
    }
}

impl TryFrom<ReviewItemRow> for ReviewItem {
    type Error = ReviewError;

    fn try_from(row: ReviewItemRow) -> Result<Self, Self::Error> {
        let performance_history: Vec<PerformanceEntry> =
            serde_json::from_str(&row.performance_history)?;
        let review_count = u32::try_from(row.review_count).map_err(|_| {
            StorageError::Corrupt(format!(
                "review item {} has review_count {}",
                row.review_item_id, row.review_count
            ))
        })?;

        if performance_history.len() != review_count as usize {
            return Err(StorageError::Corrupt(format!(
                "review item {} has {} history entries for review_count {}",
                row.review_item_id,
                performance_history.len(),
                review_count
            ))
            .into());
        }

        Ok(ReviewItem {
            id: row.review_item_id,
            question_id: row.question_id,
            user_id: row.user_id,
            spacing_profile_id: row.spacing_profile_id,
            last_reviewed: row
                .last_reviewed
                .map(|ms| from_millis(row.review_item_id, ms))
                .transpose()?,
            next_review: row
                .next_review
                .map(|ms| from_millis(row.review_item_id, ms))
                .transpose()?,
            ease_factor: row.ease_factor,
            interval: row.interval_hours,
            review_count,
            performance_history,
        })
    }
}

fn from_millis(id: i32, ms: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        StorageError::Corrupt(format!("review item {} has timestamp {}", id, ms))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(history: &str, review_count: i64) -> ReviewItemRow {
        ReviewItemRow {
            review_item_id: 7,
            question_id: 3,
            user_id: 1,
            spacing_profile_id: 2,
            last_reviewed: None,
            next_review: None,
            ease_factor: 2.5,
            interval_hours: 1,
            review_count,
            performance_history: history.to_string(),
        }
    }

    #[test]
    fn test_row_history_uses_stored_field_names() {
        let history = r#"[{"timestamp":"2026-01-02T03:04:05Z","quality":4,"elapsed_time":12.5}]"#;
        let item = ReviewItem::try_from(row(history, 1)).unwrap();

        assert_eq!(
            item.performance_history,
            vec![PerformanceEntry {
                timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
                quality: 4,
                elapsed_time: 12.5,
            }]
        );
    }

    #[test]
    fn test_row_with_mismatched_history_is_rejected() {
        let err = ReviewItem::try_from(row("[]", 2)).unwrap_err();
        assert!(matches!(err, ReviewError::Storage(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_row_timestamps_are_millis() {
        let mut stored = row(r#"[{"timestamp":"2026-01-02T03:04:05Z","quality":4,"elapsed_time":1.0}]"#, 1);
        let reviewed = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        stored.last_reviewed = Some(reviewed.timestamp_millis());
        stored.next_review = Some(reviewed.timestamp_millis() + 3_600_000);

        let item = ReviewItem::try_from(stored).unwrap();
        assert_eq!(item.last_reviewed, Some(reviewed));
        assert_eq!(item.next_review, Some(reviewed + chrono::TimeDelta::hours(1)));
    }

    #[test]
    fn test_row_with_unrepresentable_timestamp_is_rejected() {
        let mut stored = row("[]", 0);
        stored.next_review = Some(i64::MAX);
        let err = ReviewItem::try_from(stored).unwrap_err();
        assert!(matches!(err, ReviewError::Storage(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_unreviewed_item_is_never_due() {
        let item = ReviewItem::try_from(row("[]", 0)).unwrap();
        assert!(!item.is_scheduled());
        assert!(!item.is_due(Utc::now()));
    }
}
