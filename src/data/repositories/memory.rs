use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::data::models::{
    NewReviewItem, NewSpacingProfile, ReviewError, ReviewItem, ReviewItemWithQuestion,
    ScheduledQuery, SpacingProfile,
};
use crate::data::repositories::ReviewRepository;

struct Question {
    question_text: String,
    answer_text: String,
}

#[derive(Default)]
struct State {
    profiles: BTreeMap<i32, SpacingProfile>,
    items: BTreeMap<i32, ReviewItem>,
    questions: BTreeMap<i32, Question>,
    next_profile_id: i32,
    next_item_id: i32,
}

/// Process-local store used by tests and tooling.
///
/// Every operation takes the lock once, so a save is a single
/// compare-and-swap and readers see either the old or the new record.
#[derive(Default)]
pub struct InMemoryReviewRepository {
    state: RwLock<State>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a question owned by the surrounding application.
    pub fn add_question(
        &self,
        question_id: i32,
        question_text: impl Into<String>,
        answer_text: impl Into<String>,
    ) {
        self.state.write().questions.insert(
            question_id,
            Question {
                question_text: question_text.into(),
                answer_text: answer_text.into(),
            },
        );
    }

    /// Drops a question together with every review item that references it.
    pub fn remove_question(&self, question_id: i32) {
        let mut state = self.state.write();
        state.questions.remove(&question_id);
        state.items.retain(|_, item| item.question_id != question_id);
    }
}

impl ReviewRepository for InMemoryReviewRepository {
    fn get_spacing_profile(&self, id: i32) -> Result<SpacingProfile, ReviewError> {
        self.state
            .read()
            .profiles
            .get(&id)
            .cloned()
            .ok_or(ReviewError::SpacingProfileNotFound(id))
    }

    fn list_spacing_profiles(&self) -> Result<Vec<SpacingProfile>, ReviewError> {
        Ok(self.state.read().profiles.values().cloned().collect())
    }

    fn find_spacing_profile_by_name(
        &self,
        name: &str,
    ) -> Result<Option<SpacingProfile>, ReviewError> {
        Ok(self
            .state
            .read()
            .profiles
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    fn insert_spacing_profile(
        &self,
        profile: &NewSpacingProfile,
    ) -> Result<SpacingProfile, ReviewError> {
        profile.validate()?;

        let mut state = self.state.write();
        state.next_profile_id += 1;
        let stored = SpacingProfile {
            id: state.next_profile_id,
            name: profile.name.clone(),
            intervals: profile.intervals.clone(),
            ease_factor: profile.ease_factor,
            created_at: Utc::now(),
        };
        state.profiles.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn question_exists(&self, question_id: i32) -> Result<bool, ReviewError> {
        Ok(self.state.read().questions.contains_key(&question_id))
    }

    fn insert_review_item(&self, item: &NewReviewItem) -> Result<ReviewItem, ReviewError> {
        let mut state = self.state.write();

        let duplicate = state.items.values().any(|existing| {
            existing.question_id == item.question_id
                && existing.spacing_profile_id == item.spacing_profile_id
        });
        if duplicate {
            return Err(ReviewError::AlreadyScheduled {
                question_id: item.question_id,
                spacing_profile_id: item.spacing_profile_id,
            });
        }

        state.next_item_id += 1;
        let stored = ReviewItem {
            id: state.next_item_id,
            question_id: item.question_id,
            user_id: item.user_id,
            spacing_profile_id: item.spacing_profile_id,
            last_reviewed: None,
            next_review: None,
            ease_factor: item.ease_factor,
            interval: item.interval,
            review_count: 0,
            performance_history: Vec::new(),
        };
        state.items.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn get_review_item(&self, id: i32) -> Result<ReviewItem, ReviewError> {
        self.state
            .read()
            .items
            .get(&id)
            .cloned()
            .ok_or(ReviewError::ReviewItemNotFound(id))
    }

    fn save_review_item(
        &self,
        item: &ReviewItem,
        expected_version: u32,
    ) -> Result<(), ReviewError> {
        let mut state = self.state.write();
        let stored = state
            .items
            .get_mut(&item.id)
            .ok_or(ReviewError::ReviewItemNotFound(item.id))?;

        if stored.review_count != expected_version {
            return Err(ReviewError::ConcurrentModification {
                id: item.id,
                expected_version,
            });
        }

        stored.last_reviewed = item.last_reviewed;
        stored.next_review = item.next_review;
        stored.ease_factor = item.ease_factor;
        stored.interval = item.interval;
        stored.review_count = item.review_count;
        stored.performance_history = item.performance_history.clone();
        Ok(())
    }

    fn list_scheduled(
        &self,
        query: &ScheduledQuery,
    ) -> Result<Vec<ReviewItemWithQuestion>, ReviewError> {
        let state = self.state.read();

        let mut items: Vec<ReviewItemWithQuestion> = state
            .items
            .values()
            .filter(|item| query.user_id.is_none_or(|user| item.user_id == user))
            .filter(|item| item.is_scheduled())
            .filter(|item| query.due_at_or_before.is_none_or(|cutoff| item.is_due(cutoff)))
            .filter_map(|item| {
                let question = state.questions.get(&item.question_id)?;
                Some(ReviewItemWithQuestion {
                    item: item.clone(),
                    question_text: question.question_text.clone(),
                    answer_text: question.answer_text.clone(),
                })
            })
            .collect();

        items.sort_by(|a, b| {
            a.item
                .next_review
                .cmp(&b.item.next_review)
                .then(a.item.id.cmp(&b.item.id))
        });
        if let Some(limit) = query.limit {
            items.truncate(limit);
        }
        Ok(items)
    }
}
