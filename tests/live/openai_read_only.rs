use assert_cmd::Command;
use std::io::Write;

fn run(req: &serde_json::Value) -> anyhow::Result<String> {
    let mut cmd = Command::cargo_bin("openai-rate-limits")?;
    let input = serde_json::to_string(req)?;
    let assert = cmd
        .arg("--log-level")
        .arg("warn")
        .write_stdin({
            let mut b = Vec::new();
            writeln!(b, "{}", input).unwrap();
            b
        })
        .assert();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    Ok(output)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn should_run_live() -> bool {
    matches!(env_var("LIVE_API_TESTS").as_deref(), Some("1"))
        && (env_var("OPENAI_ADMIN_KEY").is_some() || env_var("OPENAI_API_KEY").is_some())
}

#[ignore]
#[test]
fn live_list_rate_limits() -> anyhow::Result<()> {
    if !should_run_live() {
        eprintln!("skipping live test: LIVE_API_TESTS!=1 or admin key missing");
        return Ok(());
    }
    let project = match env_var("E2E_PROJECT_ID") {
        Some(v) => v,
        None => {
            eprintln!("skipping: E2E_PROJECT_ID not set");
            return Ok(());
        }
    };

    let req = serde_json::json!({
        "jsonrpc":"2.0",
        "method":"tools/call",
        "id": 1,
        "params": {"name": "list_rate_limits", "arguments": {"project_id": project}}
    });
    let out = run(&req)?;
    assert!(out.contains("\"structuredContent\""));
    assert!(out.contains("\"items\""));
    Ok(())
}

#[ignore]
#[test]
fn live_get_rate_limit_if_fixture_provided() -> anyhow::Result<()> {
    if !should_run_live() {
        eprintln!("skipping live test: LIVE_API_TESTS!=1 or admin key missing");
        return Ok(());
    }
    let project = match env_var("E2E_PROJECT_ID") {
        Some(v) => v,
        None => return Ok(()),
    };
    let model = env_var("E2E_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

    let req = serde_json::json!({
        "jsonrpc":"2.0",
        "method":"tools/call",
        "id": 1,
        "params": {"name": "get_rate_limit", "arguments": {"project_id": project, "identifier": model}}
    });
    let out = run(&req)?;
    assert!(out.contains("\"structuredContent\""));
    assert!(out.contains("\"item\""));
    Ok(())
}
