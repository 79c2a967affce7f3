use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

use crate::data::models::{ConfigError, ReviewError};
use crate::features::scheduler::algorithm::{MAX_EASE_FACTOR, MIN_EASE_FACTOR};
use crate::schema::spacing_profiles;

/// A named learning schedule shared by many review items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingProfile {
    pub id: i32,
    pub name: String,
    /// Fixed learning-phase intervals, in hours. Never empty.
    pub intervals: Vec<i64>,
    /// Starting ease factor for items created against this profile.
    pub ease_factor: f64,
    pub created_at: DateTime<Utc>,
}

/// A profile that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewSpacingProfile {
    pub name: String,
    pub intervals: Vec<i64>,
    pub ease_factor: f64,
}

impl NewSpacingProfile {
    /// Builds a profile, rejecting schedules the scheduler cannot run.
    pub fn new(
        name: impl Into<String>,
        intervals: Vec<i64>,
        ease_factor: f64,
    ) -> Result<Self, ConfigError> {
        let profile = Self {
            name: name.into(),
            intervals,
            ease_factor,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::BlankProfileName);
        }
        validate_schedule(&self.intervals, self.ease_factor)
    }
}

fn validate_schedule(intervals: &[i64], ease_factor: f64) -> Result<(), ConfigError> {
    if intervals.is_empty() {
        return Err(ConfigError::EmptyIntervals);
    }

    if let Some((position, &value)) = intervals.iter().enumerate().find(|(_, v)| **v <= 0) {
        return Err(ConfigError::NonPositiveInterval { position, value });
    }

    if !(MIN_EASE_FACTOR..=MAX_EASE_FACTOR).contains(&ease_factor) {
        return Err(ConfigError::EaseFactorOutOfRange(ease_factor));
    }

    Ok(())
}

/// Spacing profile row as stored in SQLite
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = spacing_profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SpacingProfileRow {
    pub profile_id: i32,
    pub name: String,
    pub intervals: String,
    pub ease_factor: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = spacing_profiles)]
pub struct NewSpacingProfileRow<'a> {
    pub name: &'a str,
    pub intervals: String,
    pub ease_factor: f64,
    pub created_at: NaiveDateTime,
}

impl TryFrom<SpacingProfileRow> for SpacingProfile {
    type Error = ReviewError;

    fn try_from(row: SpacingProfileRow) -> Result<Self, Self::Error> {
        let intervals: Vec<i64> = serde_json::from_str(&row.intervals)?;
        // Rows written by other tools are held to the same rules as new profiles.
        validate_schedule(&intervals, row.ease_factor)?;

        Ok(SpacingProfile {
            id: row.profile_id,
            name: row.name,
            intervals,
            ease_factor: row.ease_factor,
            created_at: row.created_at.and_utc(),
        })
    }
}
