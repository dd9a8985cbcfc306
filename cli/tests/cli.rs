use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct TestWorkspace {
    dir: TempDir,
    config_home: TempDir,
}

impl TestWorkspace {
    fn new() -> Self {
        let workspace = Self {
            dir: tempfile::tempdir().unwrap(),
            config_home: tempfile::tempdir().unwrap(),
        };
        workspace.write("README.md", "# Demo");
        workspace.write("src/main.ts", "console.log('hi');");
        workspace.write("src/util/helper.js", "export const one = 1;");
        workspace.write("node_modules/dep/index.js", "module.exports = {};");
        workspace
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, contents: &str) {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.dir.path().join(relative)).unwrap()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("llm-bundler").unwrap();
        cmd.current_dir(self.root())
            .env("XDG_CONFIG_HOME", self.config_home.path())
            .env("NO_COLOR", "1")
            .env_remove("LLM_BUNDLER_WORKSPACE")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn tree_writes_document_and_notifies() {
    let ws = TestWorkspace::new();
    ws.cmd()
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("Project tree generated successfully"))
        .stdout(predicate::str::contains("llm_tree.md"));

    let tree = ws.read("llm_tree.md");
    assert!(tree.starts_with("# Project Directory Tree\n\n**Generated:** "));
    assert!(tree.contains("├── 📁 **src/**\n"));
    assert!(tree.contains("📄 `helper.js`"));
    assert!(!tree.contains("node_modules"));
}

#[test]
fn bundle_can_print_the_document() {
    let ws = TestWorkspace::new();
    ws.cmd()
        .args(["bundle", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Code Bundle for LLM Analysis"))
        .stdout(predicate::str::contains("**Files included:** All eligible files"))
        .stdout(predicate::str::contains("## 📄 src/main.ts\n```ts\nconsole.log('hi');\n```"))
        .stdout(predicate::str::contains("node_modules").not())
        .stderr(predicate::str::contains("Code bundle created successfully (all eligible files)"));

    assert!(ws.root().join("llm_bundle.md").is_file());
}

#[test]
fn select_reads_paths_from_stdin() {
    let ws = TestWorkspace::new();
    ws.cmd()
        .arg("select")
        .write_stdin("# picked by the model\nsrc/main.ts\nmissing.txt\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Code bundle created successfully (2 files)"));

    let bundle = ws.read("llm_partial_bundle.md");
    assert!(bundle.contains("**Files included:** 2\n"));
    assert!(bundle.contains("## 📄 src/main.ts"));
    assert!(!bundle.contains("missing.txt"));
}

#[test]
fn select_reads_paths_from_file() {
    let ws = TestWorkspace::new();
    let list = ws.config_home.path().join("picked.txt");
    fs::write(&list, "README.md\nnode_modules/dep/index.js\n").unwrap();

    ws.cmd().arg("select").arg(&list).assert().success();

    let bundle = ws.read("llm_partial_bundle.md");
    assert!(bundle.contains("## 📄 README.md\n```md\n# Demo\n```"));
    assert!(bundle.contains("## 📄 node_modules/dep/index.js"));
}

#[test]
fn empty_selection_fails() {
    let ws = TestWorkspace::new();
    ws.cmd()
        .arg("select")
        .write_stdin("\n// nothing here\n")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Please provide at least one file path"));
    assert!(!ws.root().join("llm_partial_bundle.md").exists());
}

#[test]
fn missing_workspace_is_reported() {
    let ws = TestWorkspace::new();
    ws.cmd()
        .args(["tree", "--workspace"])
        .arg(ws.root().join("does-not-exist"))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Please open a workspace first"));
}

#[test]
fn workspace_config_and_flags_are_layered() {
    let ws = TestWorkspace::new();
    ws.write(
        ".llm-bundler/config.toml",
        "[llm-code-bundler]\nmaxDepth = 4\nmaxFileSize = 50\n",
    );

    ws.cmd()
        .args(["config", "--format", "json", "--max-file-size", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"maxDepth\": 4"))
        .stdout(predicate::str::contains("\"maxFileSize\": 7"));

    ws.cmd()
        .args(["config", "--no-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("maxDepth = 10"));
}

#[test]
fn exclude_flag_replaces_default_patterns() {
    let ws = TestWorkspace::new();
    ws.cmd()
        .args(["bundle", "--stdout", "-q", "--exclude", "src/**"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## 📄 node_modules/dep/index.js"))
        .stdout(predicate::str::contains("src/main.ts").not());
}

#[test]
fn broken_config_file_fails_before_scanning() {
    let ws = TestWorkspace::new();
    ws.write(".llm-bundler/config.toml", "maxDepth = \n");
    ws.cmd()
        .arg("tree")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TOML Parsing Error"));
    assert!(!ws.root().join("llm_tree.md").exists());
}

#[test]
fn completion_prints_script() {
    let ws = TestWorkspace::new();
    ws.cmd()
        .args(["completion", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("llm-bundler"));
}
