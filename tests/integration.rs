//! End-to-end HTTP tests for the PCB control surface, covering the
//! scenarios in `spec.md` §8. Grounded in `tumf-agent-exec`'s
//! `tests/integration.rs` style of driving the real binary surface
//! end-to-end rather than calling library functions directly, adapted here
//! to hit an in-process Axum server over a loopback socket instead of
//! spawning a compiled binary.

use pcb_host::Registry;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;

async fn spawn_test_server() -> (String, tempfile::TempDir) {
    let log_dir = tempfile::tempdir().expect("tempdir");
    let registry = Registry::new(log_dir.path().to_path_buf());
    let app = pcb_host::http::router(registry);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr: SocketAddr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{addr}"), log_dir)
}

async fn wait_for_status(client: &reqwest::Client, base: &str, id: &str, expected: &str) -> Value {
    for _ in 0..100 {
        let resp: Value = client
            .get(format!("{base}/inspect/{id}"))
            .send()
            .await
            .expect("inspect request")
            .json()
            .await
            .expect("inspect body");
        if resp["status"] == expected {
            return resp;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("status never reached {expected}");
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, _guard) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let resp: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("health request")
        .json()
        .await
        .expect("health body");
    assert_eq!(resp["message"], "ok");
}

/// S1: run a process that echoes to stdout, observe status flip to
/// `finished_ok`, read the output back with cursor advance and tail.
#[tokio::test]
async fn happy_echo_finishes_ok_and_is_readable() {
    let (base, _guard) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let run_resp = client
        .post(format!("{base}/run"))
        .json(&json!({
            "identifier": "s1",
            "command_str": "bash -c 'echo one; echo two'",
        }))
        .send()
        .await
        .expect("run request");
    assert_eq!(run_resp.status(), reqwest::StatusCode::CREATED);

    wait_for_status(&client, &base, "s1", "finished_ok").await;

    let tail: Value = client
        .get(format!("{base}/tail/stdout/s1?lines=5"))
        .send()
        .await
        .expect("tail request")
        .json()
        .await
        .expect("tail body");
    assert_eq!(tail["lines"], json!(["one", "two"]));
    assert_eq!(tail["lines_read_count"], 2);

    let first: Value = client
        .get(format!("{base}/stdout/s1?lines=5"))
        .send()
        .await
        .expect("stdout request")
        .json()
        .await
        .expect("stdout body");
    assert_eq!(first["lines"], json!(["one", "two"]));
    assert_eq!(first["lines_read_count"], 2);

    let second: Value = client
        .get(format!("{base}/stdout/s1?lines=5"))
        .send()
        .await
        .expect("stdout request")
        .json()
        .await
        .expect("stdout body");
    assert_eq!(second["lines"], json!([]));
    assert_eq!(second["lines_read_count"], 0);
}

/// S3 (graceful kill): `/terminate` on a process that honors SIGTERM
/// reaches `terminated` well inside the combined timeout budget.
#[tokio::test]
async fn terminate_gracefully_stops_a_sleeping_process() {
    let (base, _guard) = spawn_test_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/run"))
        .json(&json!({
            "identifier": "s3",
            "command_str": "sleep 30",
        }))
        .send()
        .await
        .expect("run request");

    wait_for_status(&client, &base, "s3", "running").await;

    let term: Value = client
        .delete(format!("{base}/terminate/s3"))
        .send()
        .await
        .expect("terminate request")
        .json()
        .await
        .expect("terminate body");
    assert_eq!(term["status"], "terminated");
}

/// S5 (replace-in-place): starting a second process under the same
/// identifier kills the first and the registry only ever tracks the most
/// recent PCB for that identifier.
#[tokio::test]
async fn running_twice_under_same_identifier_replaces_the_prior_process() {
    let (base, _guard) = spawn_test_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/run"))
        .json(&json!({"identifier": "s5", "command_str": "sleep 30"}))
        .send()
        .await
        .expect("first run request");
    wait_for_status(&client, &base, "s5", "running").await;

    client
        .post(format!("{base}/run"))
        .json(&json!({"identifier": "s5", "command_str": "bash -c 'echo replaced'"}))
        .send()
        .await
        .expect("second run request");

    wait_for_status(&client, &base, "s5", "finished_ok").await;

    let tail: Value = client
        .get(format!("{base}/tail/stdout/s5?lines=5"))
        .send()
        .await
        .expect("tail request")
        .json()
        .await
        .expect("tail body");
    assert_eq!(tail["lines"], json!(["replaced"]));
}

/// S6: stdin plumbing through `/stdin/{id}` reaches the child.
#[tokio::test]
async fn stdin_is_delivered_and_echoed_back() {
    let (base, _guard) = spawn_test_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/run"))
        .json(&json!({
            "identifier": "s6",
            "command_str": "bash -c 'read line; echo \"got: $line\"'",
        }))
        .send()
        .await
        .expect("run request");
    wait_for_status(&client, &base, "s6", "running").await;

    let stdin_resp: Value = client
        .post(format!("{base}/stdin/s6"))
        .json(&json!({"data": "hello"}))
        .send()
        .await
        .expect("stdin request")
        .json()
        .await
        .expect("stdin body");
    assert_eq!(stdin_resp["success"], true);

    wait_for_status(&client, &base, "s6", "finished_ok").await;
    let tail: Value = client
        .get(format!("{base}/tail/stdout/s6?lines=5"))
        .send()
        .await
        .expect("tail request")
        .json()
        .await
        .expect("tail body");
    assert_eq!(tail["lines"], json!(["got: hello"]));
}

#[tokio::test]
async fn unknown_identifier_returns_404() {
    let (base, _guard) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{base}/inspect/does-not-exist"))
        .send()
        .await
        .expect("inspect request");
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_identifier_is_rejected_with_400() {
    let (base, _guard) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/run"))
        .json(&json!({"identifier": "", "command_str": "true"}))
        .send()
        .await
        .expect("run request");
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_lines_query_is_rejected_with_400() {
    let (base, _guard) = spawn_test_server().await;
    let client = reqwest::Client::new();
    client
        .post(format!("{base}/run"))
        .json(&json!({"identifier": "s-lines", "command_str": "true"}))
        .send()
        .await
        .expect("run request");

    let resp = client
        .get(format!("{base}/tail/stdout/s-lines?lines=500"))
        .send()
        .await
        .expect("tail request");
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}

/// List sorts most recently started first.
#[tokio::test]
async fn processes_list_is_sorted_newest_first() {
    let (base, _guard) = spawn_test_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/run"))
        .json(&json!({"identifier": "older", "command_str": "true"}))
        .send()
        .await
        .expect("run request");
    tokio::time::sleep(Duration::from_millis(1100)).await;
    client
        .post(format!("{base}/run"))
        .json(&json!({"identifier": "newer", "command_str": "true"}))
        .send()
        .await
        .expect("run request");

    let list: Value = client
        .get(format!("{base}/processes"))
        .send()
        .await
        .expect("processes request")
        .json()
        .await
        .expect("processes body");
    let identifiers: Vec<&str> = list["processes"]
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["identifier"].as_str().expect("identifier"))
        .collect();
    assert_eq!(identifiers, vec!["newer", "older"]);
}
