use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Integer;

use crate::data::db::DbPool;
use crate::data::models::{
    NewReviewItem, NewReviewItemRow, NewSpacingProfile, NewSpacingProfileRow, ReviewError,
    ReviewItem, ReviewItemRow, ReviewItemWithQuestion, ScheduledQuery, SpacingProfile,
    SpacingProfileRow,
};
use crate::data::repositories::ReviewRepository;
use crate::schema::{questions, review_items, spacing_profiles};

/// Review repository backed by a pooled SQLite database
#[derive(Clone)]
pub struct SqliteReviewRepository {
    pool: DbPool,
}

impl SqliteReviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn last_insert_rowid(conn: &mut SqliteConnection) -> Result<i32, DieselError> {
        diesel::select(diesel::dsl::sql::<Integer>("last_insert_rowid()")).get_result(conn)
    }

    fn load_review_item(
        conn: &mut SqliteConnection,
        id: i32,
    ) -> Result<Option<ReviewItemRow>, DieselError> {
        review_items::table
            .filter(review_items::review_item_id.eq(id))
            .select(ReviewItemRow::as_select())
            .first(conn)
            .optional()
    }
}

impl ReviewRepository for SqliteReviewRepository {
    fn get_spacing_profile(&self, id: i32) -> Result<SpacingProfile, ReviewError> {
        let mut conn = self.pool.get()?;

        spacing_profiles::table
            .filter(spacing_profiles::profile_id.eq(id))
            .select(SpacingProfileRow::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(ReviewError::SpacingProfileNotFound(id))?
            .try_into()
    }

    fn list_spacing_profiles(&self) -> Result<Vec<SpacingProfile>, ReviewError> {
        let mut conn = self.pool.get()?;

        spacing_profiles::table
            .order_by(spacing_profiles::profile_id.asc())
            .select(SpacingProfileRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(SpacingProfile::try_from)
            .collect()
    }

    fn find_spacing_profile_by_name(
        &self,
        name: &str,
    ) -> Result<Option<SpacingProfile>, ReviewError> {
        let mut conn = self.pool.get()?;

        spacing_profiles::table
            .filter(spacing_profiles::name.eq(name))
            .select(SpacingProfileRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(SpacingProfile::try_from)
            .transpose()
    }

    fn insert_spacing_profile(
        &self,
        profile: &NewSpacingProfile,
    ) -> Result<SpacingProfile, ReviewError> {
        profile.validate()?;
        let intervals = serde_json::to_string(&profile.intervals)?;
        let mut conn = self.pool.get()?;

        let profile_id = conn.transaction::<_, DieselError, _>(|conn| {
            diesel::insert_into(spacing_profiles::table)
                .values(&NewSpacingProfileRow {
                    name: &profile.name,
                    intervals,
                    ease_factor: profile.ease_factor,
                    created_at: Utc::now().naive_utc(),
                })
                .execute(conn)?;
            Self::last_insert_rowid(conn)
        })?;

        log::info!("Registered spacing profile {} ({})", profile.name, profile_id);
        self.get_spacing_profile(profile_id)
    }

    fn question_exists(&self, question_id: i32) -> Result<bool, ReviewError> {
        use diesel::dsl::exists;
        use diesel::select;

        let mut conn = self.pool.get()?;
        let found = select(exists(
            questions::table.filter(questions::question_id.eq(question_id)),
        ))
        .get_result(&mut conn)?;
        Ok(found)
    }

    fn insert_review_item(&self, item: &NewReviewItem) -> Result<ReviewItem, ReviewError> {
        let mut conn = self.pool.get()?;

        let inserted = conn.transaction::<_, DieselError, _>(|conn| {
            diesel::insert_into(review_items::table)
                .values(&NewReviewItemRow::from(item))
                .execute(conn)?;
            let id = Self::last_insert_rowid(conn)?;
            review_items::table
                .filter(review_items::review_item_id.eq(id))
                .select(ReviewItemRow::as_select())
                .first(conn)
        });

        match inserted {
            Ok(row) => row.try_into(),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(ReviewError::AlreadyScheduled {
                    question_id: item.question_id,
                    spacing_profile_id: item.spacing_profile_id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_review_item(&self, id: i32) -> Result<ReviewItem, ReviewError> {
        let mut conn = self.pool.get()?;

        Self::load_review_item(&mut conn, id)?
            .ok_or(ReviewError::ReviewItemNotFound(id))?
            .try_into()
    }

    fn save_review_item(
        &self,
        item: &ReviewItem,
        expected_version: u32,
    ) -> Result<(), ReviewError> {
        let history = serde_json::to_string(&item.performance_history)?;
        let mut conn = self.pool.get()?;

        // One conditional UPDATE: the version check and every field change
        // land together or not at all.
        let updated = diesel::update(
            review_items::table
                .filter(review_items::review_item_id.eq(item.id))
                .filter(review_items::review_count.eq(i64::from(expected_version))),
        )
        .set((
            review_items::last_reviewed.eq(item.last_reviewed.map(|t| t.timestamp_millis())),
            review_items::next_review.eq(item.next_review.map(|t| t.timestamp_millis())),
            review_items::ease_factor.eq(item.ease_factor),
            review_items::interval_hours.eq(item.interval),
            review_items::review_count.eq(i64::from(item.review_count)),
            review_items::performance_history.eq(history),
        ))
        .execute(&mut conn)?;

        if updated == 1 {
            return Ok(());
        }

        match Self::load_review_item(&mut conn, item.id)? {
            Some(_) => Err(ReviewError::ConcurrentModification {
                id: item.id,
                expected_version,
            }),
            None => Err(ReviewError::ReviewItemNotFound(item.id)),
        }
    }

    fn list_scheduled(
        &self,
        query: &ScheduledQuery,
    ) -> Result<Vec<ReviewItemWithQuestion>, ReviewError> {
        let mut conn = self.pool.get()?;

        let mut sql = review_items::table
            .inner_join(questions::table)
            .filter(review_items::next_review.is_not_null())
            .select((
                ReviewItemRow::as_select(),
                questions::question_text,
                questions::answer_text,
            ))
            .order_by((
                review_items::next_review.asc(),
                review_items::review_item_id.asc(),
            ))
            .into_boxed();

        if let Some(user_id) = query.user_id {
            sql = sql.filter(review_items::user_id.eq(user_id));
        }
        if let Some(cutoff) = query.due_at_or_before {
            sql = sql.filter(review_items::next_review.le(cutoff.timestamp_millis()));
        }
        if let Some(limit) = query.limit {
            sql = sql.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        sql.load::<(ReviewItemRow, String, String)>(&mut conn)?
            .into_iter()
            .map(|(row, question_text, answer_text)| -> Result<_, ReviewError> {
                Ok(ReviewItemWithQuestion {
                    item: row.try_into()?,
                    question_text,
                    answer_text,
                })
            })
            .collect()
    }
}
