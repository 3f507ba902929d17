use statesync_types::{Error, Platform, RunId};
use std::collections::BTreeSet;
use std::str::FromStr;

// ── Platform ──────────────────────────────────────────────────────

#[test]
fn platform_display_matches_name() {
    let platform = Platform::new("cloudflare");
    assert_eq!(platform.to_string(), "cloudflare");
    assert_eq!(platform.as_str(), "cloudflare");
}

#[test]
fn platform_from_str_and_string_agree() {
    assert_eq!(Platform::from("local"), Platform::from("local".to_string()));
}

#[test]
fn platform_serializes_as_plain_string() {
    let json = serde_json::to_string(&Platform::new("github")).unwrap();
    assert_eq!(json, "\"github\"");
}

#[test]
fn platform_orders_by_name() {
    let set: BTreeSet<Platform> = ["local", "cloudflare", "github"]
        .into_iter()
        .map(Platform::from)
        .collect();
    let names: Vec<&str> = set.iter().map(Platform::as_str).collect();
    assert_eq!(names, vec!["cloudflare", "github", "local"]);
}

// ── RunId ─────────────────────────────────────────────────────────

#[test]
fn run_id_new_is_unique() {
    assert_ne!(RunId::new(), RunId::new());
}

#[test]
fn run_id_display_and_parse() {
    let id = RunId::new();
    let parsed = RunId::from_str(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn run_id_parse_invalid() {
    let err = RunId::from_str("not-a-uuid").unwrap_err();
    assert!(matches!(err, Error::InvalidRunId(_)));
    assert!(err.to_string().starts_with("invalid run id"));
}

#[test]
fn run_ids_sort_by_creation() {
    let first = RunId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = RunId::new();
    assert!(first < second);
}
