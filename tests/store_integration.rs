//! Integration tests for the JSON state store: on-disk format and
//! degradation on missing or corrupt files.

use std::collections::BTreeSet;
use std::fs;

use serde_json::{Value, json};
use tempfile::TempDir;
use vortexflow_core::store::{BANNED_FILE, FAILED_FILE, SESSION_FILE};
use vortexflow_core::{DownloadJob, JsonStateStore, StateStore};

fn jobs() -> Vec<DownloadJob> {
    vec![
        DownloadJob::single("chat.html", "https://terabox.com/s/one", "Movie").unwrap(),
        DownloadJob::new(
            "chat.html",
            vec![
                "https://terabox.com/s/two".to_string(),
                "https://terabox.com/s/three".to_string(),
            ],
            "Message_Group_chat.html_4",
        )
        .unwrap(),
    ]
}

fn read_json(store: &JsonStateStore, file: &str) -> Value {
    serde_json::from_slice(&fs::read(store.path_of(file)).unwrap()).unwrap()
}

#[test]
fn test_session_file_uses_documented_schema() {
    let dir = TempDir::new().unwrap();
    let store = JsonStateStore::new(dir.path());

    store.save_session(&jobs(), "/media/out").unwrap();

    let value = read_json(&store, SESSION_FILE);
    assert_eq!(value["outputFolder"], "/media/out");
    assert_eq!(
        value["remainingJobs"][0],
        json!({
            "sourceFile": "chat.html",
            "links": ["https://terabox.com/s/one"],
            "type": "SINGLE",
            "folderName": "Movie"
        })
    );
    assert_eq!(value["remainingJobs"][1]["type"], "MULTI");

    let session = store.load_session().unwrap();
    assert_eq!(session.remaining_jobs, jobs());
    assert_eq!(session.remaining_links(), 3);
}

#[test]
fn test_failed_links_are_job_shaped_with_one_link() {
    let dir = TempDir::new().unwrap();
    let store = JsonStateStore::new(dir.path());
    let multi = &jobs()[1];
    let record = multi.failed_record("https://terabox.com/s/three");

    store.save_failed_links(&[record.clone()]).unwrap();

    let value = read_json(&store, FAILED_FILE);
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["links"], json!(["https://terabox.com/s/three"]));
    assert_eq!(value[0]["type"], "MULTI");
    assert_eq!(value[0]["folderName"], "Message_Group_chat.html_4");
    assert_eq!(store.load_failed_links(), vec![record]);
}

#[test]
fn test_banned_links_are_plain_strings() {
    let dir = TempDir::new().unwrap();
    let store = JsonStateStore::new(dir.path());
    let banned = BTreeSet::from(["https://b.com/2".to_string(), "https://a.com/1".to_string()]);

    store.save_banned_links(&banned).unwrap();

    assert_eq!(
        read_json(&store, BANNED_FILE),
        json!(["https://a.com/1", "https://b.com/2"])
    );
    assert_eq!(store.load_banned_links(), banned);
}

#[test]
fn test_missing_files_load_as_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonStateStore::new(dir.path().join("never-created"));

    assert!(store.load_session().is_none());
    assert!(store.load_failed_links().is_empty());
    assert!(store.load_banned_links().is_empty());
    store.clear_session().unwrap();
}

#[test]
fn test_corrupt_files_load_as_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonStateStore::new(dir.path());
    fs::write(store.path_of(SESSION_FILE), "{ not json").unwrap();
    fs::write(store.path_of(BANNED_FILE), "42").unwrap();
    // A failed record with two links violates the one-link shape.
    fs::write(
        store.path_of(FAILED_FILE),
        r#"[{"sourceFile":"c.html","links":["https://x/1","https://x/2"],"type":"MULTI","folderName":"g"}]"#,
    )
    .unwrap();

    assert!(store.load_session().is_none());
    assert!(store.load_banned_links().is_empty());
    assert!(store.load_failed_links().is_empty());
}

#[test]
fn test_save_overwrites_and_clear_removes_session() {
    let dir = TempDir::new().unwrap();
    let store = JsonStateStore::new(dir.path());

    store.save_session(&jobs(), "/first").unwrap();
    store.save_session(&jobs()[1..], "/second").unwrap();
    let session = store.load_session().unwrap();
    assert_eq!(session.output_folder, "/second");
    assert_eq!(session.remaining_jobs.len(), 1);

    store.clear_session().unwrap();
    assert!(store.load_session().is_none());
    assert!(!store.path_of(SESSION_FILE).exists());
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .filter(|name| name.to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
