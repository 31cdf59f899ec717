//! End-to-end CLI tests for the vortexflow binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Command with config lookup and state confined to `home`.
fn vortexflow(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vortexflow").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("HOME", home)
        .env("NO_PROXY", "127.0.0.1,localhost")
        .env_remove("RUST_LOG")
        .arg("--state-dir")
        .arg(home.join("state"));
    cmd
}

fn write_export(dir: &Path, name: &str, anchors: &[(&str, &str)]) -> PathBuf {
    let messages: String = anchors
        .iter()
        .map(|(href, text)| {
            format!(r#"<div class="message"><div class="text"><a href="{href}">{text}</a></div></div>"#)
        })
        .collect();
    let path = dir.join(name);
    fs::write(&path, format!("<html><body>{messages}</body></html>")).unwrap();
    path
}

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    vortexflow(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat exports"))
        .stdout(predicate::str::contains("resume"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    vortexflow(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vortexflow"));
}

#[test]
fn test_binary_without_subcommand_fails() {
    let home = TempDir::new().unwrap();
    vortexflow(home.path()).assert().failure();
}

#[test]
fn test_analyze_prints_summary() {
    let home = TempDir::new().unwrap();
    let export = write_export(
        home.path(),
        "chat.html",
        &[
            ("https://terabox.com/s/1abc", "Movie Night"),
            ("https://youtube.com/watch?v=1", "trailer"),
            ("https://terabox.com/s/1abc", "again"),
        ],
    );

    vortexflow(home.path())
        .arg("analyze")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Links found:       3"))
        .stdout(predicate::str::contains("Duplicates:        1"))
        .stdout(predicate::str::contains("1 single, 0 multi"))
        .stdout(predicate::str::contains("youtube.com: 1"));
}

#[test]
fn test_analyze_json_includes_jobs() {
    let home = TempDir::new().unwrap();
    let export = write_export(home.path(), "chat.html", &[("https://terabox.com/s/1abc", "Movie Night")]);

    let output = vortexflow(home.path())
        .args(["analyze", "--json"])
        .arg(&export)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["jobs"][0]["folderName"], "Movie Night");
    assert_eq!(report["jobs"][0]["type"], "SINGLE");
}

#[test]
fn test_analyze_missing_document_fails() {
    let home = TempDir::new().unwrap();
    vortexflow(home.path())
        .arg("analyze")
        .arg(home.path().join("nope.html"))
        .assert()
        .code(1);
}

#[test]
fn test_banned_links_are_excluded_from_analysis() {
    let home = TempDir::new().unwrap();
    let export = write_export(
        home.path(),
        "chat.html",
        &[("https://terabox.com/s/bad", "Bad"), ("https://terabox.com/s/good", "Good")],
    );

    vortexflow(home.path())
        .args(["ban", "https://terabox.com/s/bad"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Banned 1 new links"));
    vortexflow(home.path())
        .arg("banned")
        .assert()
        .success()
        .stdout("https://terabox.com/s/bad\n");
    vortexflow(home.path())
        .arg("analyze")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Banned (skipped):  1"))
        .stdout(predicate::str::contains("1 single, 0 multi"));

    vortexflow(home.path())
        .args(["unban", "https://terabox.com/s/bad"])
        .assert()
        .success();
    vortexflow(home.path())
        .arg("banned")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_discard_and_resume_without_session() {
    let home = TempDir::new().unwrap();
    vortexflow(home.path())
        .arg("discard")
        .assert()
        .success()
        .stdout(predicate::str::contains("No interrupted session."));
    vortexflow(home.path())
        .arg("resume")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No interrupted session to resume"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("config").join("vortexflow");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "concurrency = 4\n").unwrap();

    vortexflow(home.path())
        .arg("banned")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_run_without_target_links_downloads_nothing() {
    let home = TempDir::new().unwrap();
    let export = write_export(home.path(), "chat.html", &[("https://example.com/page", "page")]);

    vortexflow(home.path())
        .arg("run")
        .arg(&export)
        .arg("-o")
        .arg(home.path().join("out"))
        .assert()
        .success();
    assert!(!home.path().join("out").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_downloads_and_sorts_into_output_tree() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video bytes".to_vec()))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let link = format!("{}/s/clip.mp4", server.uri());
    let export = write_export(home.path(), "chat.html", &[(link.as_str(), "Clip")]);
    let out = home.path().join("out");

    let home_path = home.path().to_path_buf();
    let export_path = export.clone();
    let out_path = out.clone();
    let result = tokio::task::spawn_blocking(move || {
        vortexflow(&home_path)
            .arg("-q")
            .arg("run")
            .arg(&export_path)
            .arg("-o")
            .arg(&out_path)
            .arg("-d")
            .arg(home_path.join("downloads"))
            .args(["--target-domain", "127.0.0.1", "--retry-delay-ms", "0"])
            .assert()
    })
    .await
    .unwrap();
    result
        .success()
        .stdout(predicate::str::contains("Run complete."));

    let folder = out.join("Single_File_Downloads").join("Clip");
    let files: Vec<_> = fs::read_dir(&folder).unwrap().collect();
    assert_eq!(files.len(), 1);
    let file = files.into_iter().next().unwrap().unwrap().path();
    assert_eq!(fs::read(file).unwrap(), b"video bytes");
    assert!(!home.path().join("state").join("session.json").exists());
}
