use diesel::result::Error as DieselError;
use serde_json::Error as JsonError;
use thiserror::Error;

// Spacing profile and environment configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Spacing profile has no intervals")]
    EmptyIntervals,
    #[error("Interval {value} at position {position} must be a positive number of hours")]
    NonPositiveInterval { position: usize, value: i64 },
    #[error("Default ease factor {0} is outside [1.3, 2.5]")]
    EaseFactorOutOfRange(f64),
    #[error("Spacing profile name must not be blank")]
    BlankProfileName,
    #[error("Invalid value {value:?} for {key}")]
    InvalidSetting { key: &'static str, value: String },
}

// Opaque failures from the persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] JsonError),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

// Errors surfaced by the review scheduler and its repositories
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Quality {0} is outside the 0-5 scale")]
    InvalidQuality(i32),
    #[error("Elapsed time {0} must be a finite, non-negative number of seconds")]
    InvalidElapsedTime(f64),
    #[error("Review item {0} not found")]
    ReviewItemNotFound(i32),
    #[error("Spacing profile {0} not found")]
    SpacingProfileNotFound(i32),
    #[error("Question {0} not found")]
    QuestionNotFound(i32),
    #[error("Question {question_id} is already scheduled with spacing profile {spacing_profile_id}")]
    AlreadyScheduled {
        question_id: i32,
        spacing_profile_id: i32,
    },
    #[error("Review item {id} was modified concurrently (expected version {expected_version})")]
    ConcurrentModification { id: i32, expected_version: u32 },
    #[error("Interval of {interval_hours} hours cannot be scheduled")]
    ScheduleOverflow { interval_hours: i64 },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ReviewError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReviewError::ReviewItemNotFound(_)
                | ReviewError::SpacingProfileNotFound(_)
                | ReviewError::QuestionNotFound(_)
        )
    }
}

impl From<DieselError> for ReviewError {
    fn from(err: DieselError) -> Self {
        ReviewError::Storage(StorageError::Database(err))
    }
}

impl From<r2d2::Error> for ReviewError {
    fn from(err: r2d2::Error) -> Self {
        ReviewError::Storage(StorageError::Pool(err))
    }
}

impl From<JsonError> for ReviewError {
    fn from(err: JsonError) -> Self {
        ReviewError::Storage(StorageError::Serialization(err))
    }
}

// Errors returned by the HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not logged in")]
    Unauthorized,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error("Internal error: {0}")]
    Internal(String),
}
