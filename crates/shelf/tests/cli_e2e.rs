#![allow(deprecated)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Sandbox {
    _temp: TempDir,
    home: PathBuf,
    storage: PathBuf,
    trash: PathBuf,
    shares: PathBuf,
    config: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let sandbox = Self {
            home: root.join("home"),
            storage: root.join("storage"),
            trash: root.join("trash"),
            shares: root.join("shares"),
            config: root.join("config"),
            _temp: temp,
        };
        fs::create_dir_all(&sandbox.home).unwrap();
        fs::create_dir_all(&sandbox.storage).unwrap();
        sandbox
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(cargo_bin("shelf"));
        cmd.env("HOME", &self.home)
            .env("STORAGE_PATH", &self.storage)
            .env("TRASH_PATH", &self.trash)
            .env("SHARE_PATH", &self.shares)
            .env("SHELF_CONFIG_DIR", &self.config)
            .env_remove("RUST_LOG")
            .env_remove("SHELF_ARCHIVE_WORKERS");
        cmd
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.storage.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().args(args).arg("--json").output().unwrap();
        assert!(
            output.status.success(),
            "{:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn zip_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn ls_lists_directories_first() {
    let sandbox = Sandbox::new();
    sandbox.write("b.txt", "bee");
    sandbox.write("a/inner.txt", "x");

    sandbox
        .cmd()
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("a/").and(predicate::str::contains("b.txt")));

    let listing = sandbox.json(&["ls"]);
    let names: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b.txt"]);
}

#[test]
fn rm_then_restore_round_trip() {
    let sandbox = Sandbox::new();
    sandbox.write("docs/note.txt", "hello");

    let outcome = sandbox.json(&["rm", "docs/note.txt"]);
    let id = outcome["items"][0].as_str().unwrap().to_string();
    assert!(!sandbox.storage.join("docs/note.txt").exists());

    let listed = sandbox.json(&["trash", "list"]);
    assert_eq!(listed[0]["id"], id.as_str());
    assert_eq!(listed[0]["path"], "docs/note.txt");

    sandbox
        .cmd()
        .args(["trash", "restore", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("docs/note.txt"));
    assert_eq!(
        fs::read_to_string(sandbox.storage.join("docs/note.txt")).unwrap(),
        "hello"
    );

    sandbox
        .cmd()
        .args(["trash", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trash is empty."));
}

#[test]
fn partial_batch_exits_with_two() {
    let sandbox = Sandbox::new();
    sandbox.write("here.txt", "1");

    sandbox
        .cmd()
        .args(["rm", "here.txt", "gone.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("gone.txt"));
    assert!(!sandbox.storage.join("here.txt").exists());
}

#[test]
fn share_fetch_counts_downloads() {
    let sandbox = Sandbox::new();
    sandbox.write("pub/report.txt", "quarterly");

    let created = sandbox.json(&["share", "create", "pub/report.txt"]);
    let id = created["items"][0].as_str().unwrap().to_string();

    sandbox
        .cmd()
        .args(["share", "fetch", &id])
        .assert()
        .success()
        .stdout("quarterly");

    let out = sandbox.home.join("copy.txt");
    sandbox
        .cmd()
        .args(["share", "fetch", &id, "-o"])
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("2 downloads"));
    assert_eq!(fs::read_to_string(&out).unwrap(), "quarterly");

    let listed = sandbox.json(&["share", "list"]);
    assert_eq!(listed[0]["downloads"], 2);
    assert_eq!(listed[0]["status"], "normal");

    sandbox
        .cmd()
        .args(["share", "cancel", &id])
        .assert()
        .success();
    sandbox
        .cmd()
        .args(["share", "fetch", &id])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Share not found"));
}

#[test]
fn archive_waits_and_reports_the_file() {
    let sandbox = Sandbox::new();
    sandbox.write("proj/a.txt", "a");
    sandbox.write("proj/sub/b.txt", "b");

    let status = sandbox.json(&["archive", "proj"]);
    assert_eq!(status["state"], "SUCCESS");
    assert_eq!(status["total_files"], 2);
    assert_eq!(status["percent"], 100);

    let result = PathBuf::from(status["result"].as_str().unwrap());
    assert_eq!(result.parent().unwrap(), sandbox.storage.as_path());
    assert_eq!(zip_names(&result), vec!["proj/a.txt", "proj/sub/b.txt"]);
}

#[test]
fn archive_format_flag_overrides_config() {
    let sandbox = Sandbox::new();
    sandbox.write("one.txt", "1");

    sandbox
        .cmd()
        .args(["archive", "one.txt", "--format", "tar.gz"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".tar.gz"));
}

#[test]
fn archiving_the_root_itself_is_rejected() {
    let sandbox = Sandbox::new();
    sandbox.write("a.txt", "a");

    sandbox
        .cmd()
        .args(["archive", "."])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid path"));
    let parent = sandbox.storage.parent().unwrap();
    let stray = fs::read_dir(parent)
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("archive_"));
    assert!(!stray);
}

#[test]
fn put_then_cat_round_trip() {
    let sandbox = Sandbox::new();
    let local = sandbox.home.join("scan.txt");
    fs::write(&local, "scanned page").unwrap();

    sandbox
        .cmd()
        .args(["put", "--to", "inbox/2024"])
        .arg(&local)
        .assert()
        .success()
        .stdout(predicate::str::contains("inbox/2024/scan.txt"));

    sandbox
        .cmd()
        .args(["cat", "inbox/2024/scan.txt"])
        .assert()
        .success()
        .stdout("scanned page");

    sandbox
        .cmd()
        .args(["cat", "inbox/2024/missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn escaping_the_root_is_rejected() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["ls", "../"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid path"));
}

#[test]
fn config_save_writes_effective_settings() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["config", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("storage_path"));

    let saved = fs::read_to_string(sandbox.config.join("config.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["storage_path"], sandbox.storage.to_str().unwrap());
}
