use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

#[allow(deprecated)]
fn homemap(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("homemap").expect("binary");
    cmd.current_dir(workdir).env_remove("RUST_LOG");
    cmd
}

fn run_json(workdir: &Path, args: &[&str]) -> Value {
    let output = homemap(workdir).args(args).output().expect("command run");
    assert!(
        output.status.success(),
        "args {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["status"], "ok");
    body["data"].clone()
}

/// A built source under `<tmp>/site`, indexed from `<tmp>/tree`.
fn setup_source() -> TempDir {
    let temp = tempdir().unwrap();
    let tree = temp.path().join("tree");
    fs::create_dir_all(tree.join("src")).unwrap();
    fs::create_dir_all(tree.join("docs")).unwrap();
    fs::write(tree.join("src/a.txt"), "alpha notes\nabout the model\n").unwrap();
    fs::write(tree.join("src/b.txt"), "beta\n").unwrap();
    fs::write(tree.join("docs/readme.md"), "# Readme\n").unwrap();
    fs::write(temp.path().join("tags.txt"), "model\tsrc/a.txt\nagi\tsrc/a.txt\n").unwrap();

    let data = run_json(
        temp.path(),
        &[
            "build",
            "tree",
            "--out-dir",
            "site",
            "--tags",
            "tags.txt",
            "--part-size",
            "16",
            "--json",
        ],
    );
    assert_eq!(data["paths"], 3);
    assert_eq!(data["tags"], 2);
    temp
}

#[test]
fn build_then_browse() {
    let temp = setup_source();
    let root = temp.path();
    assert!(root.join("site/home.index.bin.manifest.json").exists());
    assert!(root.join("site/home.index.bin.part_01").exists());
    assert!(!root.join("site/home.index.bin").exists());

    let listed = run_json(root, &["--source", "site", "--no-cache", "ls", "src/", "--json"]);
    assert_eq!(listed, serde_json::json!(["src/a.txt", "src/b.txt"]));

    let children = run_json(root, &["--source", "site", "--no-cache", "children", "--json"]);
    assert_eq!(children[0]["name"], "docs");
    assert_eq!(children[0]["is_leaf"], false);

    let found = run_json(root, &["--source", "site", "--no-cache", "find", "README", "--json"]);
    assert_eq!(found, serde_json::json!(["docs/readme.md"]));

    let tagged = run_json(
        root,
        &["--source", "site", "--no-cache", "tags", "--path", "src/a.txt", "--json"],
    );
    assert_eq!(tagged, serde_json::json!(["agi", "model"]));
}

#[test]
fn ask_ranks_with_previews() {
    let temp = setup_source();
    let answer = run_json(
        temp.path(),
        &["--source", "site", "--no-cache", "ask", "a", "txt", "--json"],
    );
    let results = answer["results"].as_array().expect("results");
    assert_eq!(results[0]["path"], "src/a.txt");
    // 3 + 3 on the path, + 2 for "alpha" in the preview.
    assert_eq!(results[0]["score"], 8);
    assert_eq!(results[0]["snippet"], "alpha notes");
    assert_eq!(results[1]["path"], "src/b.txt");
    assert_eq!(results.len(), 2);
}

#[test]
fn assemble_writes_original_bytes() {
    let temp = setup_source();
    let root = temp.path();
    homemap(root)
        .args(["--source", "site", "assemble", "home.tags.bin", "--output", "tags.out"])
        .assert()
        .success();
    assert_eq!(
        fs::read(root.join("tags.out")).unwrap(),
        fs::read(root.join("tags.txt")).unwrap()
    );
}

fn rebuild(root: &Path) {
    run_json(
        root,
        &[
            "build", "tree", "--out-dir", "site", "--tags", "tags.txt", "--part-size", "16", "--json",
        ],
    );
}

#[test]
fn cache_serves_parts_while_descriptor_is_unchanged() {
    let temp = setup_source();
    let root = temp.path();
    run_json(root, &["--source", "site", "describe", "--json"]);
    fs::remove_file(root.join("site/home.index.bin.part_00")).unwrap();

    let summary = run_json(root, &["--source", "site", "describe", "--json"]);
    assert_eq!(summary["primary"]["path_count"], 3);

    homemap(root)
        .args(["--source", "site", "--no-cache", "describe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("home.index.bin"));
}

#[test]
fn rebuilt_source_is_not_served_from_cache() {
    let temp = setup_source();
    let root = temp.path();
    let before = run_json(root, &["--source", "site", "ls", "--json"]);
    assert_eq!(before.as_array().map(Vec::len), Some(3));

    fs::write(root.join("tree/new.txt"), "fresh\n").unwrap();
    rebuild(root);

    let cached = run_json(root, &["--source", "site", "ls", "--json"]);
    let uncached = run_json(root, &["--source", "site", "--no-cache", "ls", "--json"]);
    assert_eq!(cached, uncached);
    assert!(cached
        .as_array()
        .expect("paths")
        .iter()
        .any(|p| p == "new.txt"));
}

#[test]
fn same_size_rewrite_changes_previews() {
    let temp = setup_source();
    let root = temp.path();
    let snippet_of_b = |answer: &Value| {
        answer["results"]
            .as_array()
            .expect("results")
            .iter()
            .find(|r| r["path"] == "src/b.txt")
            .map(|r| r["snippet"].clone())
            .expect("src/b.txt ranked")
    };
    let first = run_json(root, &["--source", "site", "ask", "b", "txt", "--json"]);
    assert_eq!(snippet_of_b(&first), "beta");

    fs::write(root.join("tree/src/b.txt"), "gamm\n").unwrap();
    rebuild(root);

    let second = run_json(root, &["--source", "site", "ask", "b", "txt", "--json"]);
    assert_eq!(snippet_of_b(&second), "gamm");
}

#[test]
fn missing_part_reports_json_error() {
    let temp = setup_source();
    let root = temp.path();
    fs::remove_file(root.join("site/home.index.bin.part_00")).unwrap();

    let output = homemap(root)
        .args(["--source", "site", "--no-cache", "ls", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("json error");
    assert_eq!(body["status"], "error");
    assert_eq!(body["data"]["code"], "part_fetch_failed");
}

#[test]
fn split_and_compare() {
    let temp = setup_source();
    let root = temp.path();
    fs::write(root.join("blob.bin"), vec![7u8; 40]).unwrap();

    let split = run_json(
        root,
        &["split", "blob.bin", "--out-dir", "parts", "--part-size", "16", "--json"],
    );
    assert_eq!(split["parts"].as_array().map(Vec::len), Some(3));
    assert_eq!(split["total_size"], 40);

    let comparison = run_json(
        root,
        &["--source", "site", "--no-cache", "compare", "site", "--json"],
    );
    assert_eq!(comparison["shared"], 3);
}

#[test]
fn invalid_pattern_is_reported() {
    let temp = setup_source();
    homemap(temp.path())
        .args(["--source", "site", "--no-cache", "ls", "--pattern", "src/[*.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --pattern"));

    let listed = run_json(
        temp.path(),
        &["--source", "site", "--no-cache", "ls", "--pattern", "src/[a].txt", "--json"],
    );
    assert_eq!(listed, serde_json::json!(["src/a.txt"]));
}

#[test]
fn missing_source_is_explained() {
    let temp = tempdir().unwrap();
    homemap(temp.path())
        .args(["ls"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No source configured"));
}

#[test]
fn config_file_supplies_source() {
    let temp = setup_source();
    let root = temp.path();
    fs::write(
        root.join("homemap.toml"),
        "source = \"site\"\n[cache]\nenabled = false\n",
    )
    .unwrap();
    let listed = run_json(root, &["ls", "docs", "--json"]);
    assert_eq!(listed, serde_json::json!(["docs/readme.md"]));
}
