use std::{fs, sync::Arc};

use pharmledger::mirror::{self, SpreadsheetMirror, MIRROR_HEADERS};
use pharmledger::service::LedgerService;
use pharmledger::storage::{LedgerStore, SqliteStorage};
use pharmledger::{LedgerEntryCommand, SetupCommand, SetupOutcome};

fn setup() -> (Arc<dyn LedgerStore>, LedgerService) {
    let storage: Arc<dyn LedgerStore> = Arc::new(SqliteStorage::new(":memory:").unwrap());
    let service = LedgerService::new(storage.clone(), "1234");
    (storage, service)
}

fn day(date: &str, total: f64) -> LedgerEntryCommand {
    LedgerEntryCommand {
        date: date.to_string(),
        total_sale: total,
        cash_sale: total * 0.6,
        card_sale: total * 0.4,
        opening_petty: 150.0,
        closing_petty: 180.0,
        ..Default::default()
    }
}

#[test]
fn test_ids_strictly_increase() {
    let (_, svc) = setup();
    let mut last = 0;
    for i in 0..20 {
        let id = svc.add_entry(day("2024-01-01", i as f64)).unwrap();
        assert!(id > last);
        last = id;
    }
}

#[test]
fn test_duplicate_dates_are_allowed() {
    let (storage, svc) = setup();
    svc.add_entry(day("2024-01-01", 1.0)).unwrap();
    svc.add_entry(day("2024-01-01", 2.0)).unwrap();
    assert_eq!(storage.list_all().unwrap().len(), 2);
}

#[test]
fn test_delete_missing_id_is_noop() {
    let (storage, svc) = setup();
    svc.add_entry(day("2024-01-01", 10.0)).unwrap();
    let before = storage.list_all().unwrap();

    svc.delete_entry(999).unwrap();
    svc.delete_entry(999).unwrap();

    assert_eq!(storage.list_all().unwrap(), before);
}

#[test]
fn test_update_missing_id_is_noop() {
    let (storage, svc) = setup();
    svc.add_entry(day("2024-01-01", 10.0)).unwrap();
    let before = storage.list_all().unwrap();

    svc.update_entry(999, &day("2030-12-31", 1.0)).unwrap();

    assert_eq!(storage.list_all().unwrap(), before);
}

#[test]
fn test_update_overwrites_every_field() {
    let (_, svc) = setup();
    let id = svc.add_entry(day("2024-01-01", 10.0)).unwrap();

    let replacement = LedgerEntryCommand {
        date: "2024-01-02".to_string(),
        discrepancy: 7.5,
        ..Default::default()
    };
    svc.update_entry(id, &replacement).unwrap();

    let latest = svc.latest().unwrap().unwrap();
    assert_eq!(latest.id, id);
    assert_eq!(latest.values, replacement);
}

#[test]
fn test_history_is_capped_at_fifty() {
    let (_, svc) = setup();
    for i in 0..75 {
        svc.add_entry(day(&format!("2024-02-{:02}", i % 28 + 1), i as f64)).unwrap();
    }
    let history = svc.history().unwrap();
    assert_eq!(history.len(), 50);
    for pair in history.windows(2) {
        assert!(pair[0].values.date >= pair[1].values.date);
    }
}

#[test]
fn test_history_orders_dates_lexically_not_chronologically() {
    let (_, svc) = setup();
    svc.add_entry(day("2024-01-10", 1.0)).unwrap();
    svc.add_entry(day("2024-1-2", 2.0)).unwrap();
    svc.add_entry(day("2023-12-31", 3.0)).unwrap();

    let dates: Vec<String> = svc
        .history()
        .unwrap()
        .into_iter()
        .map(|e| e.values.date)
        .collect();
    // Non-padded dates compare as strings: "2024-1-2" > "2024-01-10".
    assert_eq!(dates, vec!["2024-1-2", "2024-01-10", "2023-12-31"]);
}

#[test]
fn test_latest_is_highest_id_not_latest_date() {
    let (_, svc) = setup();
    assert!(svc.latest().unwrap().is_none());

    svc.add_entry(day("2024-05-01", 1.0)).unwrap();
    let id = svc.add_entry(day("2023-01-01", 2.0)).unwrap();
    assert_eq!(svc.latest().unwrap().unwrap().id, id);
}

#[test]
fn test_setup_twice_same_day_updates_opening_petty() {
    let (storage, svc) = setup();
    let first = svc
        .setup_on(&SetupCommand { password: "a".to_string(), opening_petty: 100.0 }, "2024-03-01")
        .unwrap();
    let second = svc
        .setup_on(&SetupCommand { password: "b".to_string(), opening_petty: 250.0 }, "2024-03-01")
        .unwrap();

    assert!(matches!(first, SetupOutcome::Created(_)));
    assert_eq!(second, SetupOutcome::Updated(first.entry_id()));

    let all = storage.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].values.opening_petty, 250.0);
    assert!(svc.validate_admin("b").unwrap());
}

#[test]
fn test_setup_keeps_other_fields_of_existing_day() {
    let (storage, svc) = setup();
    let id = svc.add_entry(day("2024-03-01", 900.0)).unwrap();

    svc.setup_on(&SetupCommand { password: "pw".to_string(), opening_petty: 42.0 }, "2024-03-01")
        .unwrap();

    let entry = storage.latest_entry().unwrap().unwrap();
    assert_eq!(entry.id, id);
    let mut expected = day("2024-03-01", 900.0);
    expected.opening_petty = 42.0;
    assert_eq!(entry.values, expected);
}

#[test]
fn test_setup_with_duplicate_dates_updates_lowest_id() {
    let (storage, svc) = setup();
    let first_id = svc.add_entry(day("2024-03-01", 100.0)).unwrap();
    let second_id = svc.add_entry(day("2024-03-01", 200.0)).unwrap();

    let outcome = svc
        .setup_on(&SetupCommand { password: "pw".to_string(), opening_petty: 33.0 }, "2024-03-01")
        .unwrap();
    assert_eq!(outcome, SetupOutcome::Updated(first_id));

    let all = storage.list_all().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].values.opening_petty, 33.0);
    assert_eq!(all[1].id, second_id);
    assert_eq!(all[1].values.opening_petty, 150.0);
}

#[test]
fn test_setup_on_different_days_creates_two_rows() {
    let (storage, svc) = setup();
    let cmd = SetupCommand { password: "pw".to_string(), opening_petty: 10.0 };
    svc.setup_on(&cmd, "2024-03-01").unwrap();
    svc.setup_on(&cmd, "2024-03-02").unwrap();
    assert_eq!(storage.list_all().unwrap().len(), 2);
}

#[test]
fn test_setup_uses_today() {
    let (storage, svc) = setup();
    svc.setup(&SetupCommand { password: "pw".to_string(), opening_petty: 10.0 }).unwrap();
    assert!(svc.is_setup().unwrap());
    assert!(storage.find_by_date(&pharmledger::service::today()).unwrap().is_some());
}

#[test]
fn test_export_empty_store_is_header_only() {
    let (_, svc) = setup();
    let csv = String::from_utf8(svc.export_csv().unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 1);
    assert!(csv.starts_with("ID,Date,Total Sale,"));
    assert!(csv.trim_end().ends_with(",Closing Petty,Discrepancy"));
}

#[test]
fn test_export_includes_every_row_and_does_not_mutate() {
    let (storage, svc) = setup();
    for i in 0..60 {
        svc.add_entry(day(&format!("2024-04-{:02}", i % 30 + 1), i as f64)).unwrap();
    }
    let before = storage.list_all().unwrap();

    let csv = String::from_utf8(svc.export_csv().unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 61);
    assert!(csv.lines().nth(1).unwrap().starts_with("1,2024-04-01,"));

    assert_eq!(storage.list_all().unwrap(), before);
}

#[tokio::test]
async fn test_mirror_receives_created_entries_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Pharmacy_Ledger.csv");
    let (queue, worker) = mirror::spawn(SpreadsheetMirror::new(&path));

    let (_, svc) = setup();
    let svc = svc.with_mirror(queue);
    let id = svc.add_entry(day("2024-06-01", 100.0)).unwrap();
    svc.add_entry(day("2024-06-02", 200.0)).unwrap();
    svc.update_entry(id, &day("2024-06-01", 999.0)).unwrap();
    svc.delete_entry(id).unwrap();
    drop(svc);

    assert_eq!(worker.join().await.unwrap(), 0);

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], MIRROR_HEADERS.join(","));
    // The mirror is write-once: the update and delete never reach it.
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2024-06-01,100.0,"));
    assert!(lines[2].starts_with("2024-06-02,200.0,"));
}

#[tokio::test]
async fn test_mirror_failure_does_not_fail_create() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Pharmacy_Ledger.csv");
    fs::write(&path, "not,a,ledger\n").unwrap();
    let (queue, worker) = mirror::spawn(SpreadsheetMirror::new(&path));

    let (storage, svc) = setup();
    let svc = svc.with_mirror(queue);
    let id = svc.add_entry(day("2024-06-01", 100.0)).unwrap();
    drop(svc);

    assert_eq!(worker.join().await.unwrap(), 1);
    assert_eq!(storage.latest_entry().unwrap().unwrap().id, id);
    assert_eq!(fs::read_to_string(&path).unwrap(), "not,a,ledger\n");
}

#[tokio::test]
async fn test_mirror_appends_to_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Pharmacy_Ledger.csv");
    SpreadsheetMirror::new(&path).append(&day("2024-05-31", 1.0)).unwrap();

    let (queue, worker) = mirror::spawn(SpreadsheetMirror::new(&path));
    let (_, svc) = setup();
    let svc = svc.with_mirror(queue);
    svc.add_entry(day("2024-06-01", 2.0)).unwrap();
    drop(svc);
    worker.join().await.unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let dates: Vec<&str> = contents
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-05-31", "2024-06-01"]);
}
