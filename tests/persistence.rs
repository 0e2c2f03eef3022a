use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc, Weekday};
use tempfile::tempdir;
use timewise::{
    tracker::{HistoryStore, TrackerStatus},
    Database, RoutineInput, SettingsStore, TrackerConfig, TrackerController,
};

async fn open(dir: &std::path::Path) -> TrackerController {
    let db = Database::new(dir.join("timewise.sqlite3")).unwrap();
    let settings = Arc::new(SettingsStore::new(dir.join("settings.json")).unwrap());
    TrackerController::new(db, settings, TrackerConfig::default(), Utc::now())
        .await
        .unwrap()
}

fn morning_run() -> RoutineInput {
    RoutineInput {
        name: "Morning run".into(),
        activity: "Exercise".into(),
        days: vec![Weekday::Mon, Weekday::Wed],
        start: "07:00".parse().unwrap(),
        end: "07:45".parse().unwrap(),
    }
}

#[tokio::test]
async fn history_and_routines_survive_reopen() {
    let dir = tempdir().unwrap();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

    {
        let tracker = open(dir.path()).await;
        tracker.start_activity("Writing", start).await.unwrap();
        tracker
            .start_activity("Reading", start + Duration::minutes(40))
            .await
            .unwrap();
        tracker
            .stop_activity(start + Duration::minutes(70))
            .await
            .unwrap();
        tracker.db().create_routine(morning_run()).await.unwrap();

        // Left running when the process goes away
        tracker
            .start_activity("Email", start + Duration::hours(2))
            .await
            .unwrap();
        tracker.shutdown().await;
    }

    let tracker = open(dir.path()).await;
    let names: Vec<_> = tracker
        .history()
        .await
        .unwrap()
        .iter()
        .map(|record| record.activity_name().to_string())
        .collect();
    assert_eq!(names, vec!["Writing", "Reading"]);

    let snapshot = tracker.snapshot(Utc::now()).await.unwrap();
    assert_eq!(snapshot.status, TrackerStatus::Idle);
    assert!(snapshot.current.is_none());

    let store: &dyn HistoryStore = tracker.db();
    assert!(store.load_active().unwrap().is_none());

    let routines = tracker.db().list_routines().await.unwrap();
    assert_eq!(routines.len(), 1);
    assert_eq!(routines[0].days, vec![Weekday::Mon, Weekday::Wed]);
    assert_eq!(routines[0].start.to_string(), "07:00");
}

#[tokio::test]
async fn routine_crud_round_trip() {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("timewise.sqlite3")).unwrap();

    let created = db.create_routine(morning_run()).await.unwrap();
    assert_eq!(created.name, "Morning run");

    let mut changed = morning_run();
    changed.name = "  Night shift ".into();
    changed.days = vec![Weekday::Fri, Weekday::Tue, Weekday::Fri];
    changed.start = "22:00".parse().unwrap();
    changed.end = "06:00".parse().unwrap();
    let updated = db.update_routine(&created.id, changed).await.unwrap();
    assert_eq!(updated.name, "Night shift");
    assert_eq!(updated.days, vec![Weekday::Tue, Weekday::Fri]);
    assert!(updated.is_overnight());
    assert!(updated.is_active_at("23:30".parse().unwrap()));
    assert!(updated.is_active_at("05:00".parse().unwrap()));
    assert!(!updated.is_active_at("12:00".parse().unwrap()));

    let fetched = db.get_routine(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched, updated);

    db.delete_routine(&created.id).await.unwrap();
    assert!(db.get_routine(&created.id).await.unwrap().is_none());
    assert!(db.delete_routine(&created.id).await.is_err());
}

#[tokio::test]
async fn invalid_routines_are_rejected() {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("timewise.sqlite3")).unwrap();

    let mut no_days = morning_run();
    no_days.days.clear();
    assert!(db.create_routine(no_days).await.is_err());

    let mut unnamed = morning_run();
    unnamed.name = "   ".into();
    assert!(db.create_routine(unnamed).await.is_err());

    assert!(db.list_routines().await.unwrap().is_empty());
}
