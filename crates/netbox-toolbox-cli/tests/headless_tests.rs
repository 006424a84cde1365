// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::fs;
use std::process::{Command, Output};
use std::thread;
use tiny_http::{Header, Response, Server};

fn netbox_toolbox(config_dir: &tempfile::TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_netbox-toolbox"));
    command
        .env(
            "NETBOX_TOOLBOX_CONFIG_PATH",
            config_dir.path().join("config.toml"),
        )
        .env_remove("NETBOX_API_URL")
        .env_remove("NETBOX_API_TOKEN")
        .env_remove("RUST_LOG");
    command
}

fn json_response(body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body).with_header(
        Header::from_bytes("Content-Type", "application/json").expect("valid content type header"),
    )
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn missing_environment_fails_fast_naming_the_variable() -> Result<()> {
    let config_dir = tempfile::tempdir()?;
    let output = netbox_toolbox(&config_dir)
        .args(["--query", "1"])
        .output()?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("NETBOX_API_URL is not set"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn headless_all_interfaces_prints_table() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let base = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/dcim/interfaces/?limit=1000");
        let body = r#"{"count": 2, "next": null, "results": [
            {"id": 1, "url": "https://x/1", "name": "eth0", "device": {"id": 9, "name": "leaf-1"}},
            {"id": 2, "url": "https://x/2", "name": "eth1", "device": {"id": 9, "name": "leaf-1"}}]}"#;
        request
            .respond(json_response(body))
            .expect("response should succeed");
    });

    let config_dir = tempfile::tempdir()?;
    let output = netbox_toolbox(&config_dir)
        .env("NETBOX_API_URL", &base)
        .env("NETBOX_API_TOKEN", "token")
        .args(["--query", "2"])
        .output()?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = stdout_of(&output);
    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "device | name | id | url");
    assert_eq!(lines[2], "leaf-1 | eth0 | 1  | https://x/1");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn headless_unknown_rack_reports_and_exits_cleanly() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let base = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/dcim/racks/?name=R9&limit=1000");
        request
            .respond(json_response(r#"{"count": 0, "next": null, "results": []}"#))
            .expect("response should succeed");
    });

    let config_dir = tempfile::tempdir()?;
    let output = netbox_toolbox(&config_dir)
        .env("NETBOX_API_URL", &base)
        .env("NETBOX_API_TOKEN", "token")
        .args(["--query", "4", "--rack-name", "R9"])
        .output()?;

    assert!(output.status.success());
    assert_eq!(
        stdout_of(&output),
        "R9 does not have an entry. Please provide a valid Rack Name.\n"
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn print_example_config_needs_no_connection_settings() -> Result<()> {
    let config_dir = tempfile::tempdir()?;
    let output = netbox_toolbox(&config_dir)
        .arg("--print-example-config")
        .output()?;

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("version = 1"));
    assert!(stdout.contains("[netbox]"));
    Ok(())
}

#[test]
fn dotenv_in_working_directory_supplies_connection() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let base = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/dcim/devices/?limit=1000");
        let token = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Authorization"))
            .map(|header| header.value.as_str().to_owned());
        assert_eq!(token.as_deref(), Some("Token from-dotenv"));
        request
            .respond(json_response(r#"{"count": 0, "next": null, "results": []}"#))
            .expect("response should succeed");
    });

    let config_dir = tempfile::tempdir()?;
    let work_dir = tempfile::tempdir()?;
    fs::write(
        work_dir.path().join(".env"),
        format!("# netbox\nNETBOX_API_URL={base}\nNETBOX_API_TOKEN=from-dotenv\n"),
    )?;
    let output = netbox_toolbox(&config_dir)
        .current_dir(work_dir.path())
        .args(["--query", "1"])
        .output()?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout_of(&output).starts_with("rack | position | name"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn malformed_dotenv_is_reported() -> Result<()> {
    let config_dir = tempfile::tempdir()?;
    let work_dir = tempfile::tempdir()?;
    fs::write(
        work_dir.path().join(".env"),
        "NETBOX_API_URL http://missing-equals\n",
    )?;
    let output = netbox_toolbox(&config_dir)
        .current_dir(work_dir.path())
        .args(["--query", "1"])
        .output()?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(".env"), "stderr: {stderr}");
    Ok(())
}
