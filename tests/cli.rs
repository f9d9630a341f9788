use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> std::path::PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("typestat").unwrap();
        cmd.arg("--db")
            .arg(self.path("state").join("stats.db"))
            .arg("--config")
            .arg(self.path("config.json"));
        cmd
    }

    fn run(&self, args: &[&str]) -> String {
        let out = self.cmd().args(args).assert().success();
        String::from_utf8(out.get_output().stdout.clone()).unwrap()
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn pack_prints_lessons_without_storing() {
    let ws = Workspace::new();
    let file = ws.write("doc.txt", "The cat sat. Mr. Smith came home.\n\nA new paragraph.");
    let out = ws.run(&["pack", arg(&file), "--min-chars", "20", "--max-chars", "40"]);
    assert_eq!(out, "The cat sat. Mr. Smith came home.\n\nA new paragraph.\n");
    assert!(!ws.path("state").exists());
}

#[test]
fn empty_store_offers_the_welcome_text() {
    let ws = Workspace::new();
    let out = ws.run(&["next"]);
    assert!(out.contains("Welcome to typestat!"));
    let stats = ws.run(&["stats"]);
    assert!(stats.contains("texts: 0"));
    assert!(stats.contains("results: 0"));
}

#[test]
fn imported_texts_are_selected_in_order() {
    let ws = Workspace::new();
    let file = ws.write("doc.txt", "First text here.\n\nSecond text here.");
    ws.run(&["config", "set", "min_chars", "5"]);
    let out = ws.run(&["import", arg(&file), "--source", "doc"]);
    assert_eq!(out, "added 2 of 2 texts to doc\n");

    let next = ws.run(&["next", "--method", "in-order"]);
    assert!(next.ends_with("First text here.\n"));

    // a second import of the same file is a no-op
    let out = ws.run(&["import", arg(&file), "--source", "doc"]);
    assert_eq!(out, "added 0 of 2 texts to doc\n");
}

#[test]
fn replayed_log_is_scored_and_recorded() {
    let ws = Workspace::new();
    let log = ws.write("keys.csv", "time,buffer\n10.0,\" \"\n10.25,h\n10.5,hi\n");
    let out = ws.run(&["replay", arg(&log), "--text", "hi"]);
    assert_eq!(out, "48.0 wpm, 100.0% accuracy, viscosity 0.00\npassed\n");

    let history = ws.run(&["history", "--csv"]);
    let mut lines = history.lines();
    assert_eq!(
        lines.next(),
        Some("text_id,w,source,sessions,wpm,accuracy,viscosity")
    );
    let row = lines.next().unwrap();
    assert!(row.contains("<Replays>"));
    assert!(row.ends_with(",48.0,1.0,0.0"));
    assert_eq!(lines.next(), None);

    let stats = ws.run(&["stats"]);
    assert!(stats.contains("results: 1"));
    assert!(stats.contains("typed: 2 characters"));
}

#[test]
fn unfinished_log_is_an_error() {
    let ws = Workspace::new();
    let log = ws.write("keys.csv", "time,buffer\n10.0,\" \"\n10.25,h\n");
    ws.cmd()
        .args(["replay", arg(&log), "--text", "hi"])
        .assert()
        .failure();
}

#[test]
fn config_set_persists_and_rejects_unknown_keys() {
    let ws = Workspace::new();
    ws.run(&["config", "set", "min_wpm", "40"]);
    ws.run(&["config", "set", "select_method", "easy"]);
    let shown = ws.run(&["config", "show"]);
    assert!(shown.contains("\"min_wpm\": 40.0"));
    assert!(shown.contains("\"select_method\": \"easy\""));

    ws.cmd()
        .args(["config", "set", "no_such_key", "1"])
        .assert()
        .failure();
    ws.cmd()
        .args(["config", "set", "min_wpm", "fast"])
        .assert()
        .failure();

    ws.run(&["config", "reset"]);
    assert!(ws.run(&["config"]).contains("\"min_wpm\": 0.0"));
}
