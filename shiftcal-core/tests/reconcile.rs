mod common;

use common::*;
use shiftcal_core::SubPeriodIndex;
use shiftcal_core::gateway::CalendarGateway;

const DAY: &str = "2026-01-26";

fn morning() -> shiftcal_core::ServiceRecord {
    single("rec-1", "41343", DAY, period("05:30", "12:06", &["056"]))
}

#[tokio::test]
async fn test_worked_example() {
    let fx = Fixture::new(vec![morning()]);

    let report = fx.engine().sync_user(USER, "work").await.unwrap();
    assert_eq!(report.part1.created, 1);
    assert_eq!(report.links_written, 1);

    let events = fx.gateway.events("work").await;
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.title, "STIB 41343 L056");
    assert_eq!(event.start, utc(2026, 1, 26, 4, 30));
    assert_eq!(event.end, utc(2026, 1, 26, 11, 6));
    assert!(event.description.contains("Time: 05:30 - 12:06"));

    let link = fx.link("rec-1").await;
    assert_eq!(link.part1.as_deref(), Some(event.id.as_str()));
    assert!(link.part2.is_none());
    assert!(link.last_synced.is_some());
}

#[tokio::test]
async fn test_second_pass_changes_nothing() {
    let fx = Fixture::new(vec![
        morning(),
        split(
            "rec-2",
            "51200",
            "2026-01-27",
            period("06:00", "10:00", &["092"]),
            period("15:00", "19:00", &["093"]),
        ),
    ]);
    let engine = fx.engine();

    let first = engine.sync_user(USER, "work").await.unwrap();
    assert_eq!(first.created(), 3);
    let links_before = (fx.link("rec-1").await, fx.link("rec-2").await);

    let second = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(second.created(), 0);
    assert_eq!(second.repaired(), 0);
    assert_eq!(second.skipped(), 3);
    assert_eq!(second.links_written, 0);
    assert_eq!(second.orphans_deleted(), 0);
    assert_eq!(fx.gateway.events("work").await.len(), 3);
    assert_eq!((fx.link("rec-1").await, fx.link("rec-2").await), links_before);
}

#[tokio::test]
async fn test_adopts_existing_event_instead_of_inserting() {
    let fx = Fixture::new(vec![morning()]);
    let existing = fx
        .insert_external("work", "STIB 41343 L056", utc(2026, 1, 26, 4, 30))
        .await;

    let report = fx.engine().sync_user(USER, "work").await.unwrap();

    assert_eq!(report.part1.repaired, 1);
    assert_eq!(report.part1.created, 0);
    assert_eq!(fx.gateway.insert_count().await, 1);
    assert_eq!(fx.link("rec-1").await.part1, Some(existing.clone()));

    // The pass collected orphans, and the event it just adopted is not one
    assert!(report.orphans.is_some());
    assert_eq!(report.orphans_deleted(), 0);
    assert!(fx.gateway.event(&existing).await.is_some());
}

#[tokio::test]
async fn test_recreates_event_deleted_outside() {
    let fx = Fixture::new(vec![morning()]);
    let engine = fx.engine();
    engine.sync_user(USER, "work").await.unwrap();

    let old_id = fx.link("rec-1").await.part1.unwrap();
    fx.gateway.delete(&old_id).await.unwrap();

    let report = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(report.part1.created, 1);
    let new_id = fx.link("rec-1").await.part1.unwrap();
    assert_ne!(new_id, old_id);
    assert_eq!(fx.gateway.events("work").await.len(), 1);
}

#[tokio::test]
async fn test_sub_periods_heal_independently() {
    let fx = Fixture::new(vec![split(
        "rec-1",
        "51200",
        DAY,
        period("06:00", "10:00", &["092"]),
        period("15:00", "19:00", &["093"]),
    )]);
    let engine = fx.engine();
    engine.sync_user(USER, "work").await.unwrap();

    let before = fx.link("rec-1").await;
    fx.gateway.delete(before.part2.as_deref().unwrap()).await.unwrap();

    let report = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(report.counts(SubPeriodIndex::First).skipped, 1);
    assert_eq!(report.counts(SubPeriodIndex::Second).created, 1);
    let after = fx.link("rec-1").await;
    assert_eq!(after.part1, before.part1);
    assert_ne!(after.part2, before.part2);

    let titles: Vec<String> = fx
        .gateway
        .events("work")
        .await
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert!(titles.contains(&"STIB 51200 P1 L092".to_string()));
    assert!(titles.contains(&"STIB 51200 P2 L093".to_string()));
}

#[tokio::test]
async fn test_orphans_collected_only_when_app_generated() {
    let fx = Fixture::new(vec![morning()]);
    let engine = fx.engine();
    engine.sync_user(USER, "work").await.unwrap();

    let meeting = fx.insert_external("work", "Team meeting", utc(2026, 1, 26, 9, 0)).await;
    let union = fx
        .insert_external("work", "STIB union meeting", utc(2026, 1, 26, 9, 0))
        .await;
    let orphan = fx
        .insert_external("work", "STIB 99999 L001", utc(2026, 1, 26, 9, 0))
        .await;
    let elsewhere = fx
        .insert_external("personal", "STIB 88888", utc(2026, 1, 26, 9, 0))
        .await;

    let report = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(report.orphans_deleted(), 1);
    assert!(fx.gateway.event(&orphan).await.is_none());
    assert!(fx.gateway.event(&meeting).await.is_some());
    assert!(fx.gateway.event(&union).await.is_some());
    assert!(fx.gateway.event(&elsewhere).await.is_some());
    assert!(fx.link("rec-1").await.part1.is_some());
}

#[tokio::test]
async fn test_no_collection_in_a_pass_that_created() {
    let fx = Fixture::new(vec![morning()]);
    let orphan = fx
        .insert_external("work", "STIB 99999 L001", utc(2026, 1, 26, 9, 0))
        .await;
    let engine = fx.engine();

    let first = engine.sync_user(USER, "work").await.unwrap();
    assert_eq!(first.created(), 1);
    assert!(first.orphans.is_none());
    assert!(fx.gateway.event(&orphan).await.is_some());

    let second = engine.sync_user(USER, "work").await.unwrap();
    assert_eq!(second.orphans_deleted(), 1);
    assert!(fx.gateway.event(&orphan).await.is_none());
}

#[tokio::test]
async fn test_failing_record_does_not_block_others() {
    let fx = Fixture::new(vec![
        morning(),
        single("rec-2", "51200", DAY, period("14:00", "20:00", &["092"])),
    ]);
    fx.gateway.fail_title("STIB 51200 L092").await;
    let engine = fx.engine();

    let report = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(report.part1.created, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].record_id, "rec-2");
    assert!(report.orphans.is_none());
    assert!(fx.link("rec-1").await.part1.is_some());
    assert!(fx.link("rec-2").await.is_empty());

    fx.gateway.heal().await;
    let retry = engine.sync_user(USER, "work").await.unwrap();

    assert!(retry.is_clean());
    assert_eq!(retry.part1.skipped, 1);
    assert_eq!(retry.part1.created, 1);
    assert_eq!(fx.gateway.events("work").await.len(), 2);
}

#[tokio::test]
async fn test_failure_anywhere_suppresses_collection() {
    let fx = Fixture::new(vec![
        morning(),
        single("rec-2", "51200", DAY, period("14:00", "20:00", &["092"])),
    ]);
    let engine = fx.engine();
    engine.sync_user(USER, "work").await.unwrap();

    let orphan = fx
        .insert_external("work", "STIB 99999 L001", utc(2026, 1, 26, 9, 0))
        .await;
    let rec2_event = fx.link("rec-2").await.part1.unwrap();
    fx.gateway.delete(&rec2_event).await.unwrap();
    fx.gateway.fail_title("STIB 51200 L092").await;

    let report = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(report.created(), 0);
    assert_eq!(report.failures.len(), 1);
    assert!(report.orphans.is_none());
    assert!(fx.gateway.event(&orphan).await.is_some());
}

#[tokio::test]
async fn test_partial_success_is_persisted() {
    let fx = Fixture::new(vec![split(
        "rec-1",
        "51200",
        DAY,
        period("06:00", "10:00", &["092"]),
        period("15:00", "19:00", &["093"]),
    )]);
    fx.gateway.fail_title("STIB 51200 P2 L093").await;
    let engine = fx.engine();

    let report = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(report.part1.created, 1);
    assert_eq!(report.part2.created, 0);
    assert_eq!(report.failures.len(), 1);
    let link = fx.link("rec-1").await;
    assert!(link.part1.is_some());
    assert!(link.part2.is_none());

    fx.gateway.heal().await;
    let retry = engine.sync_user(USER, "work").await.unwrap();
    assert_eq!(retry.part1.skipped, 1);
    assert_eq!(retry.part2.created, 1);
}

#[tokio::test]
async fn test_lost_link_write_is_repaired_next_pass() {
    let fx = Fixture::new(vec![morning()]);
    fx.store.fail_writes_for("rec-1").await;
    let engine = fx.engine();

    let report = engine.sync_user(USER, "work").await.unwrap();
    assert_eq!(report.part1.created, 1);
    assert_eq!(report.links_written, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(fx.link("rec-1").await.is_empty());

    fx.store.heal().await;
    let retry = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(retry.part1.repaired, 1);
    assert_eq!(retry.part1.created, 0);
    assert_eq!(fx.gateway.insert_count().await, 1);
    let adopted = fx.link("rec-1").await.part1.unwrap();

    assert!(retry.orphans.is_some());
    assert_eq!(retry.orphans_deleted(), 0);
    assert!(fx.gateway.event(&adopted).await.is_some());
}

#[tokio::test]
async fn test_identical_records_never_share_an_event() {
    let fx = Fixture::new(vec![
        morning(),
        single("rec-2", "41343", DAY, period("05:30", "12:06", &["056"])),
    ]);
    let engine = fx.engine();

    let report = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(report.part1.created, 2);
    let first = fx.link("rec-1").await.part1.unwrap();
    let second = fx.link("rec-2").await.part1.unwrap();
    assert_ne!(first, second);

    let again = engine.sync_user(USER, "work").await.unwrap();
    assert_eq!(again.part1.skipped, 2);
    assert_eq!(again.orphans_deleted(), 0);
}

#[tokio::test]
async fn test_other_users_records_are_left_alone() {
    let mut foreign = single("rec-9", "70000", DAY, period("08:00", "16:00", &["007"]));
    foreign.user_id = "someone-else".to_string();
    let fx = Fixture::new(vec![morning(), foreign]);

    let report = fx.engine().sync_user(USER, "work").await.unwrap();

    assert_eq!(report.created(), 1);
    assert!(fx.link("rec-9").await.is_empty());
}

#[tokio::test]
async fn test_stale_event_with_spaced_line_is_collected() {
    let fx = Fixture::new(vec![single("rec-1", "41343", DAY, period("05:30", "12:06", &["12 bis"]))]);
    let engine = fx.engine();
    engine.sync_user(USER, "work").await.unwrap();
    let stale = fx.link("rec-1").await.part1.unwrap();

    // Replaced without its link, so the old event is no longer referenced
    fx.store.put_record(morning()).await;
    let first = engine.sync_user(USER, "work").await.unwrap();
    assert_eq!(first.part1.created, 1);

    let second = engine.sync_user(USER, "work").await.unwrap();

    assert_eq!(second.orphans_deleted(), 1);
    assert!(fx.gateway.event(&stale).await.is_none());
    let titles: Vec<String> = fx.gateway.events("work").await.into_iter().map(|e| e.title).collect();
    assert_eq!(titles, vec!["STIB 41343 L056"]);
}
