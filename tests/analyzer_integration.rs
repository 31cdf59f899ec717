//! Integration tests for link analysis over chat-export files.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use vortexflow_core::analyzer::SourceDocument;
use vortexflow_core::{JobKind, LinkAnalyzer};

fn message(anchors: &[(&str, &str)]) -> String {
    let body: String = anchors
        .iter()
        .map(|(href, text)| format!(r#"<a href="{href}">{text}</a> "#))
        .collect();
    format!(r#"<div class="message default"><div class="body"><div class="text">{body}</div></div></div>"#)
}

fn export(messages: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Chat</title></head><body><div class=\"history\">{}</div></body></html>",
        messages.concat()
    )
}

fn write_export(dir: &TempDir, name: &str, messages: &[String]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, export(messages)).unwrap();
    path
}

#[test]
fn test_repeated_link_in_later_message_creates_no_job() {
    let dir = TempDir::new().unwrap();
    let path = write_export(
        &dir,
        "messages.html",
        &[
            message(&[
                ("https://terabox.com/s/aaa", "Part 1"),
                ("https://terabox.com/s/bbb", "Part 2"),
            ]),
            message(&[("https://terabox.com/s/bbb", "Part 2 again")]),
        ],
    );

    let report = LinkAnalyzer::default().analyze(&[path], &BTreeSet::new());

    assert_eq!(report.jobs.len(), 1);
    let job = &report.jobs[0];
    assert_eq!(job.kind(), JobKind::Multi);
    assert_eq!(job.links(), ["https://terabox.com/s/aaa", "https://terabox.com/s/bbb"]);
    assert_eq!(job.folder_name(), "Message_Group_messages.html_1");
    assert_eq!(report.raw_count, 3);
    assert_eq!(report.duplicate_count, 1);
    assert_eq!(report.target_count, 2);
}

#[test]
fn test_banned_link_is_counted_and_excluded() {
    let dir = TempDir::new().unwrap();
    let banned_link = "https://terabox.com/s/banned";
    let path = write_export(
        &dir,
        "chat.html",
        &[
            message(&[(banned_link, "Nope")]),
            message(&[("https://terabox.com/s/keep", "Keep Me")]),
        ],
    );
    let banned = BTreeSet::from([banned_link.to_string()]);

    let report = LinkAnalyzer::default().analyze(&[path], &banned);

    assert_eq!(report.banned_count, 1);
    assert!(!report.unique_links.iter().any(|link| link == banned_link));
    assert!(report.jobs.iter().all(|job| !job.links().iter().any(|l| l == banned_link)));
    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.jobs[0].folder_name(), "Keep Me");
}

#[test]
fn test_jobs_are_disjoint_across_documents() {
    let dir = TempDir::new().unwrap();
    let first = write_export(
        &dir,
        "a.html",
        &[
            message(&[("https://terabox.com/s/1", "One"), ("https://t.me/chan", "tg")]),
            message(&[("https://1024terabox.com/s/2", "Two"), ("https://terabox.com/s/1", "One")]),
        ],
    );
    let second = write_export(
        &dir,
        "b.html",
        &[
            message(&[("https://terabox.com/s/2", "Two b"), ("https://1024terabox.com/s/2", "dup")]),
            message(&[("https://youtube.com/watch?v=x", "video")]),
        ],
    );

    let report = LinkAnalyzer::default().analyze(&[first, second], &BTreeSet::new());

    let mut seen = HashSet::new();
    for job in &report.jobs {
        for link in job.links() {
            assert!(seen.insert(link.clone()), "link {link} placed twice");
        }
        match job.kind() {
            JobKind::Single => assert_eq!(job.links().len(), 1),
            JobKind::Multi => assert!(job.links().len() >= 2),
        }
    }
    assert_eq!(report.target_count, seen.len());
    assert_eq!(report.jobs.len(), 3);
    assert_eq!(report.jobs[2].source_file(), "b.html");
    assert_eq!(report.jobs[2].links(), ["https://terabox.com/s/2"]);
    assert_eq!(report.other_domains.get("Telegram"), Some(&1));
    assert_eq!(report.other_domains.get("youtube.com"), Some(&1));
}

#[test]
fn test_analysis_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write_export(
        &dir,
        "chat.html",
        &[
            message(&[("https://terabox.com/s/x", "Great Film (2020)")]),
            message(&[("https://terabox.com/s/y", "!!!")]),
            message(&[("https://terabox.com/s/z", "z"), ("https://terabox.app/s/w", "w")]),
        ],
    );
    let banned = BTreeSet::from(["https://terabox.com/s/nothing".to_string()]);
    let analyzer = LinkAnalyzer::default();

    let first = analyzer.analyze(std::slice::from_ref(&path), &banned);
    let second = analyzer.analyze(&[path], &banned);

    assert_eq!(first.jobs, second.jobs);
    assert_eq!(first.unique_links, second.unique_links);
    let names: Vec<&str> = first.jobs.iter().map(|job| job.folder_name()).collect();
    assert_eq!(
        names,
        ["Great Film 2020", "Single_Download_chat.html_2", "Message_Group_chat.html_3"]
    );
    for name in names {
        assert!(
            name.starts_with("Single_Download_")
                || name.starts_with("Message_Group_")
                || name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
        );
    }
}

#[test]
fn test_unreadable_document_is_skipped() {
    let dir = TempDir::new().unwrap();
    let good = write_export(&dir, "good.html", &[message(&[("https://terabox.com/s/ok", "Ok")])]);
    let missing = dir.path().join("missing.html");

    let report = LinkAnalyzer::default().analyze(&[missing.clone(), good], &BTreeSet::new());

    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.skipped_documents.len(), 1);
    assert_eq!(report.skipped_documents[0].path, missing);
}

#[test]
fn test_analyze_documents_from_memory() {
    let documents = vec![SourceDocument {
        name: "inline.html".to_string(),
        html: export(&[message(&[
            ("https://terabox.com/s/m1", "a"),
            ("https://terabox.com/s/m1", "a again"),
        ])]),
    }];

    let report = LinkAnalyzer::default().analyze_documents(&documents, &BTreeSet::new());

    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.jobs[0].kind(), JobKind::Single);
    assert_eq!(report.jobs[0].folder_name(), "a");
    assert_eq!(report.duplicate_count, 1);
}
