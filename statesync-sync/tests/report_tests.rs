use pretty_assertions::assert_eq;
use statesync_sync::{ConflictRecord, Platform, RunId, SyncReport, SyncResult};

fn result(run_id: RunId, target: &str, synced: usize, failed: usize, conflicts: usize) -> SyncResult {
    let mut result = SyncResult::new(run_id, Platform::new("local"), Platform::new(target));
    result.entries_synced = synced;
    result.entries_failed = failed;
    result.conflicts = (0..conflicts)
        .map(|i| ConflictRecord {
            entry_id: format!("CARD-{i}"),
            source_hash: "s".into(),
            target_hash: "t".into(),
        })
        .collect();
    result.duration_ms = 40;
    result.success = failed == 0;
    result
}

#[test]
fn report_totals_every_target() {
    let run_id = RunId::new();
    let results = vec![
        result(run_id, "github", 3, 0, 1),
        result(run_id, "cloudflare", 2, 1, 0),
    ];

    let report = SyncReport::from_results(&results);

    assert_eq!(report.run_id, Some(run_id));
    assert!(!report.overall_success);
    assert_eq!(report.total_entries_synced, 5);
    assert_eq!(report.total_entries_failed, 1);
    assert_eq!(report.total_conflicts, 1);
    assert_eq!(report.total_duration_ms, 80);
    assert_eq!(report.results_by_target.len(), 2);
    assert!(report.results_by_target["github"].success);
    assert_eq!(report.results_by_target["github"].conflicts, 1);
    assert!(!report.results_by_target["cloudflare"].success);
}

#[test]
fn conflicts_alone_keep_a_report_successful() {
    let report = SyncReport::from_results(&[result(RunId::new(), "github", 0, 0, 2)]);
    assert!(report.overall_success);
    assert_eq!(report.total_conflicts, 2);
}

#[test]
fn empty_run_is_successful() {
    let report = SyncReport::from_results(&[]);
    assert!(report.overall_success);
    assert_eq!(report.run_id, None);
    assert!(report.results_by_target.is_empty());
}

#[test]
fn report_json_shape() {
    let report = SyncReport::from_results(&[result(RunId::new(), "github", 1, 0, 0)]);
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    let timestamp = json["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    for key in [
        "overall_success",
        "total_entries_synced",
        "total_entries_failed",
        "total_conflicts",
        "total_duration_ms",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["results_by_target"]["github"]["entries_synced"], 1);
}
