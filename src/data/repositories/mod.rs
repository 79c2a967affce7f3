pub mod memory;
pub mod sqlite;

pub use memory::InMemoryReviewRepository;
pub use sqlite::SqliteReviewRepository;

use crate::data::models::{
    NewReviewItem, NewSpacingProfile, ReviewError, ReviewItem, ReviewItemWithQuestion,
    ScheduledQuery, SpacingProfile,
};

/// Persistence contract the review scheduler runs against.
///
/// `save_review_item` is the only write path for scheduling state. It must
/// replace every mutable field in one step, and only when the stored
/// `review_count` still equals `expected_version`. Otherwise it fails with
/// `ReviewError::ConcurrentModification` and leaves the record untouched.
pub trait ReviewRepository: Send + Sync {
    fn get_spacing_profile(&self, id: i32) -> Result<SpacingProfile, ReviewError>;

    fn list_spacing_profiles(&self) -> Result<Vec<SpacingProfile>, ReviewError>;

    fn find_spacing_profile_by_name(&self, name: &str)
    -> Result<Option<SpacingProfile>, ReviewError>;

    fn insert_spacing_profile(
        &self,
        profile: &NewSpacingProfile,
    ) -> Result<SpacingProfile, ReviewError>;

    fn question_exists(&self, question_id: i32) -> Result<bool, ReviewError>;

    /// Fails with `AlreadyScheduled` if the question already has an item for the profile.
    fn insert_review_item(&self, item: &NewReviewItem) -> Result<ReviewItem, ReviewError>;

    fn get_review_item(&self, id: i32) -> Result<ReviewItem, ReviewError>;

    fn save_review_item(&self, item: &ReviewItem, expected_version: u32)
    -> Result<(), ReviewError>;

    /// Items with a next review time joined with their question, ordered by
    /// that time then by id.
    fn list_scheduled(
        &self,
        query: &ScheduledQuery,
    ) -> Result<Vec<ReviewItemWithQuestion>, ReviewError>;
}
