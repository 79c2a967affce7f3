use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

use crate::data::models::{
    ConfigError, ListOptions, NewReviewItem, NewSpacingProfile, ReviewError, ReviewItem,
    ReviewItemWithQuestion, ReviewSchedule, ScheduledQuery, SpacingProfile,
};
use crate::data::repositories::ReviewRepository;
use crate::features::scheduler::algorithm::{self, Quality};

/// Schedules review items on top of an injected repository
#[derive(Clone)]
pub struct ReviewScheduler {
    repository: Arc<dyn ReviewRepository>,
}

impl ReviewScheduler {
    pub fn new(repository: Arc<dyn ReviewRepository>) -> Self {
        Self { repository }
    }

    pub fn get_spacing_profile(&self, id: i32) -> Result<SpacingProfile, ReviewError> {
        self.repository.get_spacing_profile(id)
    }

    pub fn list_spacing_profiles(&self) -> Result<Vec<SpacingProfile>, ReviewError> {
        self.repository.list_spacing_profiles()
    }

    /// Stores a profile unless one with the same name already exists
    pub fn register_spacing_profile(
        &self,
        profile: &NewSpacingProfile,
    ) -> Result<SpacingProfile, ReviewError> {
        profile.validate()?;

        if let Some(existing) = self.repository.find_spacing_profile_by_name(&profile.name)? {
            if existing.intervals != profile.intervals
                || existing.ease_factor != profile.ease_factor
            {
                log::warn!(
                    "Spacing profile {} already exists with a different schedule; keeping the stored one",
                    existing.name
                );
            }
            return Ok(existing);
        }

        self.repository.insert_spacing_profile(profile)
    }

    /// Links a question to a spacing profile for one learner
    pub fn create_review_item(
        &self,
        question_id: i32,
        spacing_profile_id: i32,
        user_id: i32,
    ) -> Result<ReviewItem, ReviewError> {
        if !self.repository.question_exists(question_id)? {
            return Err(ReviewError::QuestionNotFound(question_id));
        }
        let profile = self.repository.get_spacing_profile(spacing_profile_id)?;
        let first_interval = *profile
            .intervals
            .first()
            .ok_or(ConfigError::EmptyIntervals)?;

        let item = self.repository.insert_review_item(&NewReviewItem {
            question_id,
            user_id,
            spacing_profile_id,
            ease_factor: profile.ease_factor,
            interval: first_interval,
        })?;

        log::info!(
            "Created review item {} for question {} with profile {}",
            item.id,
            question_id,
            profile.name
        );
        Ok(item)
    }

    pub fn get_review_item(&self, id: i32) -> Result<ReviewItem, ReviewError> {
        self.repository.get_review_item(id)
    }

    pub fn submit_review(
        &self,
        item_id: i32,
        quality: i32,
        elapsed_time: f64,
    ) -> Result<ReviewItem, ReviewError> {
        self.submit_review_at(item_id, quality, elapsed_time, Utc::now())
    }

    /// Records one review and reschedules the item.
    ///
    /// Fails with `ConcurrentModification` if another submission for the same
    /// item was stored after this one read it; the caller re-fetches and
    /// decides whether to retry. On any error the stored item is unchanged.
    pub fn submit_review_at(
        &self,
        item_id: i32,
        quality: i32,
        elapsed_time: f64,
        now: DateTime<Utc>,
    ) -> Result<ReviewItem, ReviewError> {
        let quality = Quality::new(quality)?;
        let elapsed_time = algorithm::validate_elapsed_time(elapsed_time)?;
        // Review times are stored at millisecond precision
        let now = now.trunc_subsecs(3);

        let item = self.repository.get_review_item(item_id)?;
        let profile = self.repository.get_spacing_profile(item.spacing_profile_id)?;
        let version = item.review_count;

        let reviewed = algorithm::apply_review(&item, &profile, quality, elapsed_time, now)?;

        match self.repository.save_review_item(&reviewed, version) {
            Ok(()) => {
                log::debug!(
                    "Review item {} reviewed (quality {}): interval {}h, ease {:.2}",
                    reviewed.id,
                    quality.value(),
                    reviewed.interval,
                    reviewed.ease_factor
                );
                Ok(reviewed)
            }
            Err(e @ ReviewError::ConcurrentModification { .. }) => {
                log::warn!("Review of item {} lost a concurrent update: {}", item_id, e);
                Err(e)
            }
            Err(e) => {
                log::error!("Failed to store review for item {}: {}", item_id, e);
                Err(e)
            }
        }
    }

    /// Scheduled items with their question, ordered by next review time.
    ///
    /// Due items (`next_review <= now`) come first, then upcoming ones.
    /// Items that were never reviewed have no next review time and are not
    /// returned in either case. A limit of 0 means no limit.
    pub fn list_review_items(
        &self,
        options: &ListOptions,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReviewItemWithQuestion>, ReviewError> {
        self.repository.list_scheduled(&ScheduledQuery {
            user_id: options.user_id,
            due_at_or_before: options.due_only.then_some(now),
            limit: options.limit.filter(|&limit| limit > 0),
        })
    }

    /// Splits a learner's scheduled items into due and upcoming
    pub fn review_schedule(
        &self,
        user_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<ReviewSchedule, ReviewError> {
        let items = self.repository.list_scheduled(&ScheduledQuery {
            user_id,
            ..Default::default()
        })?;

        let (due, upcoming) = items.into_iter().partition(|entry| entry.item.is_due(now));
        Ok(ReviewSchedule { due, upcoming })
    }
}
