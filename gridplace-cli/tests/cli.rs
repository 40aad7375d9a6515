use std::{net::SocketAddr, path::Path, process::Output};

use assert_cmd::cargo::cargo_bin_cmd;
use axum::{Router, http::StatusCode, routing::get};
use predicates::prelude::*;
use serde_json::Value;
use tokio::net::TcpListener;

const PROXY_VARS: [&str; 6] = [
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "ALL_PROXY",
    "all_proxy",
];

async fn spawn_image_server() -> SocketAddr {
    let app = Router::new()
        .route("/a.png", get(|| async { &b"first image"[..] }))
        .route("/b.png", get(|| async { &b"second"[..] }))
        .route("/missing.png", get(|| async { StatusCode::NOT_FOUND }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn write_local_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("gridplace.toml");
    std::fs::write(
        &path,
        r#"
pacing_ms = 0

[allow_list]
scheme_prefix = "http://"
host_fragment = "127.0.0.1"

[retry]
max_attempts = 1
initial_delay_ms = 1
attempt_timeout_ms = 5000
"#,
    )
    .unwrap();
    path
}

async fn run_gridplace(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        let mut cmd = cargo_bin_cmd!("gridplace");
        for var in PROXY_VARS {
            cmd.env_remove(var);
        }
        cmd.env("RUST_LOG", "warn").args(&args).output().unwrap()
    })
    .await
    .unwrap()
}

fn json_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout is JSON lines"))
        .collect()
}

#[test]
fn help_lists_subcommands() {
    cargo_bin_cmd!("gridplace")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("place"))
        .stdout(predicate::str::contains("check-url"));

    cargo_bin_cmd!("gridplace")
        .args(["place", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-size"))
        .stdout(predicate::str::contains("--store"));
}

#[test]
fn check_url_uses_default_allow_list() {
    cargo_bin_cmd!("gridplace")
        .args(["check-url", "https://cdn.example.com/a.png"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("accepted"));

    cargo_bin_cmd!("gridplace")
        .args(["check-url", "http://cdn.example.com/a.png"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("rejected"));
}

#[test]
fn check_url_honours_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_local_config(dir.path());

    cargo_bin_cmd!("gridplace")
        .arg("check-url")
        .arg("http://127.0.0.1:9/x.png")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
}

#[test]
fn place_requires_some_input() {
    cargo_bin_cmd!("gridplace").arg("place").assert().code(1);
}

#[test]
fn disallowed_urls_end_in_error_event() {
    let output = cargo_bin_cmd!("gridplace")
        .args(["place", "--url", "ftp://nowhere.invalid/a.png"])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let events = json_lines(&output);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "error");
}

#[tokio::test(flavor = "multi_thread")]
async fn places_downloaded_images_and_reports_scene() {
    let addr = spawn_image_server().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_local_config(dir.path());
    let store = dir.path().join("sizes.json");
    let a = format!("http://{addr}/a.png");
    let mut seeded = serde_json::Map::new();
    seeded.insert(
        format!("image-size:{a}"),
        Value::from(r#"{"width":300,"height":200}"#),
    );
    std::fs::write(&store, Value::Object(seeded).to_string()).unwrap();

    let output = run_gridplace(vec![
        "place".into(),
        "--config".into(),
        config.display().to_string(),
        "--store".into(),
        store.display().to_string(),
        "--center".into(),
        "100,-50".into(),
        "--url".into(),
        a,
        "--url".into(),
        format!("http://{addr}/missing.png"),
        "--url".into(),
        format!("http://{addr}/b.png"),
    ])
    .await;

    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let lines = json_lines(&output);
    assert_eq!(lines[0]["stage"], "received");
    assert_eq!(lines[0]["total"], 3);
    assert!(lines.iter().any(|line| line["stage"] == "error"));
    assert_eq!(lines[lines.len() - 2]["type"], "placed");
    assert_eq!(lines[lines.len() - 2]["count"], 2);

    let scene = &lines[lines.len() - 1];
    assert_eq!(scene["type"], "scene");
    let nodes = scene["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["name"], "a.png");
    assert_eq!(nodes[0]["width"], 300);
    assert_eq!(nodes[0]["height"], 200);
    assert_eq!(nodes[0]["payloadBytes"], 11);
    assert_eq!(nodes[1]["name"], "b.png");
    assert_eq!(nodes[1]["width"], 1600);
    assert!(nodes.iter().all(|node| node["selected"] == true));
}

#[tokio::test(flavor = "multi_thread")]
async fn nothing_placed_exits_with_two() {
    let addr = spawn_image_server().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_local_config(dir.path());

    let output = run_gridplace(vec![
        "place".into(),
        "--config".into(),
        config.display().to_string(),
        "--url".into(),
        format!("http://{addr}/missing.png"),
    ])
    .await;

    assert_eq!(output.status.code(), Some(2), "{output:?}");
    let lines = json_lines(&output);
    assert!(lines.iter().all(|line| line["type"] != "placed"));
    assert_eq!(lines[lines.len() - 2]["type"], "error");
    assert_eq!(lines[lines.len() - 1]["nodes"], serde_json::json!([]));
}
