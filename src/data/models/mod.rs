pub mod api_models;
pub mod error_models;
pub mod review_models;
pub mod spacing_models;

pub use api_models::{CreateReviewItemRequest, ErrorBody, SubmitReviewRequest};
pub use error_models::{ApiError, ConfigError, ReviewError, StorageError};
pub use review_models::{
    ListOptions, NewReviewItem, NewReviewItemRow, PerformanceEntry, ReviewItem, ReviewItemRow,
    ReviewItemWithQuestion, ReviewSchedule, ScheduledQuery,
};
pub use spacing_models::{NewSpacingProfile, NewSpacingProfileRow, SpacingProfile, SpacingProfileRow};
