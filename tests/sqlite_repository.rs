use std::sync::Arc;
use std::thread;

use chrono::{Datelike, TimeDelta, TimeZone, Utc};
use diesel::prelude::*;
use tempfile::TempDir;

use spaced_review::data::db::{build_pool, run_schema, DbPool};
use spaced_review::data::models::{ListOptions, NewSpacingProfile, ReviewError};
use spaced_review::data::repositories::{ReviewRepository, SqliteReviewRepository};
use spaced_review::features::scheduler::ReviewScheduler;
use spaced_review::schema::questions;

struct TestDb {
    // Keeps the database file alive for the duration of the test
    _dir: TempDir,
    pool: DbPool,
    scheduler: ReviewScheduler,
    profile_id: i32,
}

fn setup() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study.db");
    let pool = build_pool(path.to_str().unwrap(), 4).unwrap();
    run_schema(&pool).unwrap();

    let repo = SqliteReviewRepository::new(pool.clone());
    let scheduler = ReviewScheduler::new(Arc::new(repo));
    let profile = scheduler
        .register_spacing_profile(&NewSpacingProfile::new("Standard", vec![1, 6, 24], 2.5).unwrap())
        .unwrap();

    TestDb {
        _dir: dir,
        pool,
        scheduler,
        profile_id: profile.id,
    }
}

fn add_question(pool: &DbPool, user_id: i32) -> i32 {
    let mut conn = pool.get().unwrap();
    diesel::insert_into(questions::table)
        .values((
            questions::user_id.eq(user_id),
            questions::question_text.eq("你好"),
            questions::answer_text.eq("hello"),
            questions::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)
        .unwrap();
    questions::table
        .select(questions::question_id)
        .order_by(questions::question_id.desc())
        .first(&mut conn)
        .unwrap()
}

#[test]
fn test_schema_is_idempotent() {
    let db = setup();
    run_schema(&db.pool).unwrap();

    // Registering the same profile again reuses the stored row
    let again = db
        .scheduler
        .register_spacing_profile(&NewSpacingProfile::new("Standard", vec![1, 6, 24], 2.5).unwrap())
        .unwrap();
    assert_eq!(again.id, db.profile_id);
    assert_eq!(db.scheduler.list_spacing_profiles().unwrap().len(), 1);
}

#[test]
fn test_progression_is_persisted() {
    let db = setup();
    let question_id = add_question(&db.pool, 1);
    let item = db
        .scheduler
        .create_review_item(question_id, db.profile_id, 1)
        .unwrap();
    assert_eq!(item.review_count, 0);
    assert_eq!(item.next_review, None);
    assert_eq!(item.interval, 1);

    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let mut intervals = Vec::new();
    for step in 0..4 {
        let now = start + TimeDelta::days(step);
        let reviewed = db.scheduler.submit_review_at(item.id, 5, 2.25, now).unwrap();
        assert_eq!(reviewed.next_review, Some(now + TimeDelta::hours(reviewed.interval)));
        intervals.push(reviewed.interval);
    }
    assert_eq!(intervals, vec![1, 6, 24, 60]);

    let stored = db.scheduler.get_review_item(item.id).unwrap();
    assert_eq!(stored.review_count, 4);
    assert_eq!(stored.ease_factor, 2.5);
    assert_eq!(stored.performance_history.len(), 4);
    assert_eq!(stored.performance_history[0].elapsed_time, 2.25);
    assert_eq!(stored.last_reviewed, Some(start + TimeDelta::days(3)));
}

#[test]
fn test_duplicate_item_is_rejected() {
    let db = setup();
    let question_id = add_question(&db.pool, 1);
    db.scheduler
        .create_review_item(question_id, db.profile_id, 1)
        .unwrap();

    let err = db
        .scheduler
        .create_review_item(question_id, db.profile_id, 1)
        .unwrap_err();
    assert!(matches!(err, ReviewError::AlreadyScheduled { .. }));

    let err = db.scheduler.create_review_item(9999, db.profile_id, 1).unwrap_err();
    assert!(matches!(err, ReviewError::QuestionNotFound(9999)));
}

#[test]
fn test_deleting_question_removes_items() {
    let db = setup();
    let question_id = add_question(&db.pool, 1);
    let item = db
        .scheduler
        .create_review_item(question_id, db.profile_id, 1)
        .unwrap();

    let mut conn = db.pool.get().unwrap();
    diesel::delete(questions::table.filter(questions::question_id.eq(question_id)))
        .execute(&mut conn)
        .unwrap();

    let err = db.scheduler.get_review_item(item.id).unwrap_err();
    assert!(matches!(err, ReviewError::ReviewItemNotFound(_)));
}

#[test]
fn test_stale_save_is_rejected() {
    let db = setup();
    let question_id = add_question(&db.pool, 1);
    let item = db
        .scheduler
        .create_review_item(question_id, db.profile_id, 1)
        .unwrap();
    db.scheduler.submit_review(item.id, 4, 1.0).unwrap();

    // A writer that read the item before the review above
    let repo = SqliteReviewRepository::new(db.pool.clone());
    let mut stale = item.clone();
    stale.interval = 999;
    let err = repo.save_review_item(&stale, 0).unwrap_err();
    assert!(matches!(
        err,
        ReviewError::ConcurrentModification { expected_version: 0, .. }
    ));

    let stored = repo.get_review_item(item.id).unwrap();
    assert_eq!(stored.review_count, 1);
    assert_ne!(stored.interval, 999);
}

#[test]
fn test_concurrent_reviews_never_lose_updates() {
    let db = setup();
    let question_id = add_question(&db.pool, 1);
    let item = db
        .scheduler
        .create_review_item(question_id, db.profile_id, 1)
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scheduler = db.scheduler.clone();
            thread::spawn(move || scheduler.submit_review(item.id, 3, 1.0))
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => accepted += 1,
            Err(ReviewError::ConcurrentModification { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let stored = db.scheduler.get_review_item(item.id).unwrap();
    assert!(accepted >= 1);
    assert_eq!(stored.review_count, accepted);
    assert_eq!(stored.performance_history.len(), accepted as usize);
}

#[test]
fn test_due_listing_is_scoped_and_ordered() {
    let db = setup();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let question_id = add_question(&db.pool, 1);
        let item = db
            .scheduler
            .create_review_item(question_id, db.profile_id, 1)
            .unwrap();
        ids.push(item.id);
    }
    let other_question = add_question(&db.pool, 2);
    let other = db
        .scheduler
        .create_review_item(other_question, db.profile_id, 2)
        .unwrap();

    // ids[0]: one review, due after 1h. ids[1]: two reviews, due after 6h.
    // ids[2]: never reviewed.
    db.scheduler.submit_review_at(ids[0], 4, 1.0, start).unwrap();
    db.scheduler.submit_review_at(ids[1], 4, 1.0, start).unwrap();
    db.scheduler.submit_review_at(ids[1], 4, 1.0, start).unwrap();
    db.scheduler.submit_review_at(other.id, 4, 1.0, start).unwrap();

    let all = db
        .scheduler
        .list_review_items(
            &ListOptions {
                user_id: Some(1),
                ..Default::default()
            },
            start,
        )
        .unwrap();
    assert_eq!(all.iter().map(|i| i.item.id).collect::<Vec<_>>(), vec![ids[0], ids[1]]);
    assert!(all.iter().all(|i| i.question_text == "你好" && i.answer_text == "hello"));

    let due = db
        .scheduler
        .list_review_items(
            &ListOptions {
                due_only: true,
                limit: None,
                user_id: Some(1),
            },
            start + TimeDelta::hours(2),
        )
        .unwrap();
    assert_eq!(due.iter().map(|i| i.item.id).collect::<Vec<_>>(), vec![ids[0]]);

    let schedule = db
        .scheduler
        .review_schedule(Some(1), start + TimeDelta::hours(2))
        .unwrap();
    assert_eq!(schedule.due.len(), 1);
    assert_eq!(schedule.upcoming[0].item.id, ids[1]);
}

#[test]
fn test_reviews_past_year_9999_are_not_due() {
    let db = setup();
    let long = db
        .scheduler
        .register_spacing_profile(
            &NewSpacingProfile::new("Long", vec![1, 6, 24, 72, 168], 2.5).unwrap(),
        )
        .unwrap();
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

    let far_question = add_question(&db.pool, 1);
    let far = db
        .scheduler
        .create_review_item(far_question, long.id, 1)
        .unwrap();
    // Perfect reviews submitted early keep growing the interval by 2.5x
    let reviewed = (0..20)
        .map(|_| db.scheduler.submit_review_at(far.id, 5, 1.0, now).unwrap())
        .last()
        .unwrap();
    let far_next = reviewed.next_review.unwrap();
    assert!(far_next.year() > 9999);

    let near_question = add_question(&db.pool, 1);
    let near = db
        .scheduler
        .create_review_item(near_question, db.profile_id, 1)
        .unwrap();
    db.scheduler.submit_review_at(near.id, 4, 1.0, now).unwrap();

    let due_only = ListOptions {
        due_only: true,
        ..Default::default()
    };
    assert!(db.scheduler.list_review_items(&due_only, now).unwrap().is_empty());

    let due = db
        .scheduler
        .list_review_items(&due_only, now + TimeDelta::hours(1))
        .unwrap();
    assert_eq!(due.iter().map(|i| i.item.id).collect::<Vec<_>>(), vec![near.id]);

    let all = db
        .scheduler
        .list_review_items(&ListOptions::default(), now)
        .unwrap();
    assert_eq!(all.iter().map(|i| i.item.id).collect::<Vec<_>>(), vec![near.id, far.id]);
    assert_eq!(db.scheduler.get_review_item(far.id).unwrap().next_review, Some(far_next));
}

#[test]
fn test_zero_limit_lists_everything() {
    let db = setup();
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    for _ in 0..3 {
        let question_id = add_question(&db.pool, 1);
        let item = db
            .scheduler
            .create_review_item(question_id, db.profile_id, 1)
            .unwrap();
        db.scheduler.submit_review_at(item.id, 4, 1.0, now).unwrap();
    }

    let listed = db
        .scheduler
        .list_review_items(
            &ListOptions {
                limit: Some(0),
                ..Default::default()
            },
            now,
        )
        .unwrap();
    assert_eq!(listed.len(), 3);
}
