use std::time::SystemTime;

use super::*;
use crate::test_utils::test_diagnostic;
use crate::UnitId;

fn entry(
    id: &str,
    version: u64,
    diagnostics: Vec<Diagnostic>,
) -> ResultEntry {
    ResultEntry {
        unit_id: UnitId::from(id),
        unit_name: format!("unit-{id}"),
        diagnostics,
        produced_at: SystemTime::now(),
        snapshot_version: version,
    }
}

#[test]
fn publish_replaces_entries_wholesale() {
    let store = ResultStore::new();
    let id = UnitId::from("a");

    store.publish(entry(
        "a",
        1,
        vec![test_diagnostic("D001", "first"), test_diagnostic("D002", "second")],
    ));
    store.publish(entry("a", 2, vec![test_diagnostic("D003", "third")]));

    let latest = store.get(&id).unwrap();
    // never merged with the superseded entry
    assert_eq!(latest.snapshot_version, 2);
    assert_eq!(latest.diagnostics.len(), 1);
    assert_eq!(latest.diagnostics[0].id, "D003");
    assert_eq!(store.len(), 1);
}

#[test]
fn collect_flattens_in_requested_order() {
    let store = ResultStore::new();
    store.publish(entry("a", 1, vec![test_diagnostic("DA", "from a")]));
    store.publish(entry("b", 1, vec![test_diagnostic("DB1", "from b"), test_diagnostic("DB2", "from b")]));

    let flattened = store.collect(&[UnitId::from("b"), UnitId::from("a")]);

    let ids: Vec<&str> = flattened.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["DB1", "DB2", "DA"]);
}

#[test]
fn collect_skips_units_without_results() {
    let store = ResultStore::new();
    store.publish(entry("a", 1, vec![test_diagnostic("DA", "from a")]));

    let flattened = store.collect(&[UnitId::from("missing"), UnitId::from("a")]);

    assert_eq!(flattened.len(), 1);
    assert_eq!(flattened[0].id, "DA");
}

#[test]
fn empty_result_entries_are_still_entries() {
    let store = ResultStore::new();
    store.publish(entry("a", 1, Vec::new()));

    assert!(store.get(&UnitId::from("a")).is_some());
    assert!(store.collect(&[UnitId::from("a")]).is_empty());
}
