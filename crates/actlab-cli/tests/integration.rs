#![allow(deprecated)]
use assert_cmd::Command;
use mockito::{Matcher, Mock, Server};
use predicates::prelude::*;
use tempfile::TempDir;

fn actlab(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("actlab").unwrap();
    cmd.current_dir(dir.path())
        .env("ACTLAB_ROOT", dir.path())
        .env("HOME", dir.path())
        .env_remove("ACTLAB_HOST")
        .env_remove("ACTLAB_KEY")
        .env_remove("ACTLAB_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Command pointed at a mock server with a key that passes the trial lookup.
fn connected(dir: &TempDir, server: &Server) -> Command {
    let mut cmd = actlab(dir);
    cmd.args(["--host", &server.url(), "--key", "k-1"]);
    cmd
}

fn trial(server: &mut Server) -> Mock {
    server
        .mock("GET", "/api/v1/companies")
        .match_header("X-Angie-AuthApiToken", "k-1")
        .with_status(200)
        .with_body("[]")
        .create()
}

fn cmd_path(path: &str) -> Matcher {
    Matcher::UrlEncoded("path_info".into(), path.into())
}

// ---------------------------------------------------------------------------
// actlab render
// ---------------------------------------------------------------------------

#[test]
fn render_prints_html_with_code_blockquote() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.md"), "# Notes\n\n```\na < b\n```\n").unwrap();
    actlab(&dir)
        .args(["render", "notes.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Notes</h1>"))
        .stdout(predicate::str::contains(
            "<blockquote style='font-family:monospace'><p>a&nbsp;&lt;&nbsp;b</p></blockquote>",
        ));
}

#[test]
fn render_to_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.md"), "*hi*\n").unwrap();
    actlab(&dir)
        .args(["render", "notes.md", "-o", "out/notes.html"])
        .assert()
        .success();
    let html = std::fs::read_to_string(dir.path().join("out/notes.html")).unwrap();
    assert!(html.contains("<em>hi</em>"));
}

#[test]
fn render_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    actlab(&dir)
        .args(["render", "nope.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read 'nope.md'"));
}

// ---------------------------------------------------------------------------
// actlab init / config
// ---------------------------------------------------------------------------

#[test]
fn init_requires_host() {
    let dir = TempDir::new().unwrap();
    actlab(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--host"));
}

#[test]
fn init_writes_config() {
    let dir = TempDir::new().unwrap();
    actlab(&dir)
        .args(["--host", "https://collab.example.com", "--key", "1-secret", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .actlab/config.yaml"));

    let yaml = std::fs::read_to_string(dir.path().join(".actlab/config.yaml")).unwrap();
    assert!(yaml.contains("host: https://collab.example.com"));
    assert!(yaml.contains("key: 1-secret"));
    assert!(yaml.contains("render_markdown: true"));
}

#[test]
fn init_keeps_existing_config_without_force() {
    let dir = TempDir::new().unwrap();
    actlab(&dir)
        .args(["--host", "https://a.example.com", "--key", "k", "init"])
        .assert()
        .success();
    actlab(&dir)
        .args(["--host", "https://b.example.com", "--key", "k", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exists"));
    let yaml = std::fs::read_to_string(dir.path().join(".actlab/config.yaml")).unwrap();
    assert!(yaml.contains("a.example.com"));
}

#[test]
fn config_show_masks_key() {
    let dir = TempDir::new().unwrap();
    actlab(&dir)
        .args(["--host", "https://h", "--key", "1-abcdefgh", "init"])
        .assert()
        .success();
    actlab(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1-ab…"))
        .stdout(predicate::str::contains("abcdefgh").not());
}

#[test]
fn config_validate_fails_without_credentials() {
    let dir = TempDir::new().unwrap();
    actlab(&dir)
        .args(["--host", "https://h", "init"])
        .assert()
        .success();
    actlab(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] neither key nor email is set"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn commands_need_config() {
    let dir = TempDir::new().unwrap();
    actlab(&dir)
        .args(["project", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

// ---------------------------------------------------------------------------
// actlab project / task
// ---------------------------------------------------------------------------

#[test]
fn rejected_key_is_reported() {
    let mut server = Server::new();
    server
        .mock("GET", "/api/v1/companies")
        .with_status(401)
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["project", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid api key"));
}

#[test]
fn project_list_json() {
    let mut server = Server::new();
    trial(&mut server);
    server
        .mock("GET", "/api/v1/projects")
        .with_status(200)
        .with_body(r#"[{"id": 1, "name": "Website", "status": "active", "budget": "100"}]"#)
        .create();
    let dir = TempDir::new().unwrap();
    let out = connected(&dir, &server)
        .args(["--json", "project", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value[0]["name"], "Website");
    assert_eq!(value[0]["budget"], 100.0);
    assert_eq!(value[0]["kind"], "project");
}

#[test]
fn project_list_table() {
    let mut server = Server::new();
    trial(&mut server);
    server
        .mock("GET", "/api/v1/projects")
        .with_status(200)
        .with_body(r#"[{"id": 1, "name": "Website", "status": "active"}]"#)
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ID  NAME     STATUS"))
        .stdout(predicate::str::contains("1   Website  active"));
}

#[test]
fn project_set_posts_edit() {
    let mut server = Server::new();
    trial(&mut server);
    server
        .mock("GET", "/api.php")
        .match_query(cmd_path("projects/4"))
        .with_status(200)
        .with_body(r#"{"id": 4, "name": "Old"}"#)
        .create();
    let edit = server
        .mock("POST", "/api.php")
        .match_query(cmd_path("projects/4/edit"))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("project[name]".into(), "New name".into()),
            Matcher::UrlEncoded("project[leader_id]".into(), "7".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"id": 4, "name": "New name", "leader_id": 7}"#)
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["project", "set", "4", "name=New name", "leader_id=7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated project 4"));
    edit.assert();
}

#[test]
fn project_set_rejects_unknown_field() {
    let mut server = Server::new();
    trial(&mut server);
    server
        .mock("GET", "/api.php")
        .match_query(cmd_path("projects/4"))
        .with_status(200)
        .with_body(r#"{"id": 4, "name": "Old"}"#)
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["project", "set", "4", "colour=red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot set 'colour'"));
}

#[test]
fn project_set_null_clears_field() {
    let mut server = Server::new();
    trial(&mut server);
    server
        .mock("GET", "/api.php")
        .match_query(cmd_path("projects/4"))
        .with_status(200)
        .with_body(r#"{"id": 4, "name": "Site", "overview": "old text"}"#)
        .create();
    let edit = server
        .mock("POST", "/api.php")
        .match_query(cmd_path("projects/4/edit"))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("project[name]".into(), "Site".into()),
            Matcher::UrlEncoded("project[overview]".into(), "".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"id": 4, "name": "Site"}"#)
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["project", "set", "4", "overview=null"])
        .assert()
        .success();
    edit.assert();
}

#[test]
fn task_new_posts_to_api() {
    let mut server = Server::new();
    trial(&mut server);
    let create = server
        .mock("POST", "/api/v1/projects/2/tasks")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "name": "Write docs",
            "is_important": 0,
            "task_list_id": 3
        })))
        .with_status(200)
        .with_body(r#"{"single": {"id": 301, "task_id": 13, "name": "Write docs"}}"#)
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["task", "new", "2", "name=Write docs", "task_list_id=3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created task 301"));
    create.assert();
}

#[test]
fn task_lists_show_one() {
    let mut server = Server::new();
    trial(&mut server);
    server
        .mock("GET", "/api/v1/projects/2/task-lists/3")
        .with_status(200)
        .with_body(r#"{"single": {"id": 3, "name": "Backlog"}}"#)
        .create();
    server
        .mock("GET", "/api/v1/projects/2/task-lists/8")
        .with_status(404)
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["task", "lists", "2", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backlog"));
    connected(&dir, &server)
        .args(["task", "lists", "2", "8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("task list 8 not found"));
}

#[test]
fn file_add_sends_mime_type() {
    let mut server = Server::new();
    trial(&mut server);
    let upload = server
        .mock("POST", "/api.php")
        .match_query(cmd_path("projects/2/files/files/upload"))
        .match_body(Matcher::Regex("Content-Type: text/plain".into()))
        .with_status(200)
        .with_body(r#"{"id": 5, "name": "notes.txt"}"#)
        .create();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();
    connected(&dir, &server)
        .args(["file", "add", "2", "notes.txt", "--mime-type", "text/plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Uploaded file 5"));
    upload.assert();
}

#[test]
fn task_list_hides_completed() {
    let mut server = Server::new();
    trial(&mut server);
    server
        .mock("GET", "/api/v1/projects/2/tasks")
        .with_status(200)
        .with_body(
            r#"{"tasks": [
                {"id": 10, "task_id": 1, "name": "Open one", "is_completed": 0},
                {"id": 11, "task_id": 2, "name": "Done one", "is_completed": 1}
            ]}"#,
        )
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["task", "list", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Open one"))
        .stdout(predicate::str::contains("#1"))
        .stdout(predicate::str::contains("Done one").not());
}

#[test]
fn comment_add_on_task() {
    let mut server = Server::new();
    trial(&mut server);
    server
        .mock("GET", "/api/v1/projects/2/tasks/10")
        .with_status(200)
        .with_body(r#"{"single": {"id": 10, "task_id": 1, "name": "Open one"}}"#)
        .create();
    let add = server
        .mock("POST", "/api.php")
        .match_query(cmd_path("projects/2/tasks/1/comments/add"))
        .match_body(Matcher::UrlEncoded("comment[body]".into(), "on it".into()))
        .with_status(200)
        .with_body(r#"{"id": 99, "body": "on it"}"#)
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["comment", "add", "--project", "2", "--task", "10", "on it"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added comment 99"));
    add.assert();
}

#[test]
fn notebook_show_prints_page_tree() {
    let mut server = Server::new();
    trial(&mut server);
    server
        .mock("GET", "/api.php")
        .match_query(cmd_path("projects/3/notebooks/9"))
        .with_status(200)
        .with_body(
            r#"{"id": 9, "name": "Docs", "subpages": [
                {"name": "Intro", "permalink": "http://h/projects/site/notebooks/9/pages/40",
                 "subpages": [{"id": 41, "name": "Setup"}]}
            ]}"#,
        )
        .create();
    let dir = TempDir::new().unwrap();
    connected(&dir, &server)
        .args(["notebook", "show", "3", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("40  Intro"))
        .stdout(predicate::str::contains("  41  Setup"));
}

// ---------------------------------------------------------------------------
// actlab hook
// ---------------------------------------------------------------------------

#[test]
fn hook_install_writes_executable_script() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".git/hooks")).unwrap();
    actlab(&dir)
        .args(["hook", "install"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installed"));

    let hook = dir.path().join(".git/hooks/post-commit");
    let script = std::fs::read_to_string(&hook).unwrap();
    assert!(script.starts_with("#!/bin/sh"));
    assert!(script.contains("hook post-commit"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&hook).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0);
    }
}

#[test]
fn hook_install_outside_git_fails() {
    let dir = TempDir::new().unwrap();
    actlab(&dir)
        .args(["hook", "install"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a git repository"));
}
