use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn azd(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_azd"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run azd")
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create dir");
    }
    fs::write(path, content).expect("Failed to write file");
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_check_clean_tree() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "views/post.blade.php", "@allows('edit') e @endallows");
    write(dir.path(), "views/plain.blade.php", "<p>hi</p>");

    let output = azd(dir.path(), &["views"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "No problems found in 2 files");
}

#[test]
fn test_check_reports_errors_and_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "views/post.blade.php", "<div>\n  @allows('edit') e\n</div>");

    let output = azd(dir.path(), &["views"]);

    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("2:3: error @allows is never closed by @endallows (unclosed-directive)"));
    assert!(text.contains("Found 1 error"));
}

#[test]
fn test_check_json_output() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "a.blade.php", "@endallows");

    let output = azd(dir.path(), &["-f", "json", "a.blade.php"]);
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Invalid JSON");

    assert_eq!(parsed["stats"]["errors"], 1);
    assert_eq!(parsed["files"][0]["diagnostics"][0]["code"], "unexpected-end");
    assert_eq!(parsed["files"][0]["compiled"], false);
}

#[test]
fn test_compile_to_stdout() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "a.blade.php", "@denies('post', $post) hidden @enddenies");

    let output = azd(dir.path(), &["compile", "a.blade.php"]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "<?php $enforcer = \\App::make(\"policies\"); ?>\
         <?php if ($enforcer->denies('post', \\Auth::user(), [$post]) === true) : ?> hidden <?php endif; ?>"
    );
}

#[test]
fn test_compile_neutral_from_stdin() {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let mut child = Command::new(env!("CARGO_BIN_EXE_azd"))
        .args(["compile", "--dialect", "neutral", "-"])
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to run azd");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"@allows('edit-post') stuff @endallows")
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for azd");
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "LET enforcer = lookup(\"policies\")\nIF enforcer.allows('edit-post', currentUser()) == true THEN stuff END IF"
    );
}

#[test]
fn test_compile_out_dir_mirrors_tree() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "views/admin/panel.blade.php", "@allows('admin') panel @endallows");
    write(dir.path(), "views/broken.blade.php", "@allows('admin') panel");

    let output = azd(dir.path(), &["compile", "--out-dir", "build", "views"]);

    assert_eq!(output.status.code(), Some(1));
    let compiled = fs::read_to_string(dir.path().join("build/admin/panel.blade.php")).expect("Missing output");
    assert!(compiled.contains("<?php if ($enforcer->allows('admin', \\Auth::user()) === true): ?>"));
    assert!(!dir.path().join("build/broken.blade.php").exists());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unclosed-directive"));
}

#[test]
fn test_compile_out_dir_keeps_explicit_file_paths() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "a/x.blade.php", "@allows('A') a @endallows");
    write(dir.path(), "b/x.blade.php", "@allows('B') b @endallows");

    let output = azd(dir.path(), &["compile", "-o", "build", "a/x.blade.php", "b/x.blade.php"]);

    assert!(output.status.success());
    let first = fs::read_to_string(dir.path().join("build/a/x.blade.php")).expect("Missing a/x output");
    let second = fs::read_to_string(dir.path().join("build/b/x.blade.php")).expect("Missing b/x output");
    assert!(first.contains("allows('A'"));
    assert!(second.contains("allows('B'"));
    assert!(!dir.path().join("build/x.blade.php").exists());
}

#[test]
fn test_compile_dry_run_writes_nothing() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "views/a.blade.php", "@allows('x') x @endallows");

    let output = azd(dir.path(), &["compile", "--dry-run", "-o", "build", "views"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Would write build"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_config_file_is_picked_up() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), ".azd.yaml", "extends: strict\ntemplate-files: ['*.tpl']\n");
    write(dir.path(), "views/a.tpl", "@allows(A) @allows(B) x @endallows @endallows");
    write(dir.path(), "views/b.blade.php", "@endallows");

    let output = azd(dir.path(), &["views"]);

    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("nested-directive"));
    assert!(!text.contains("b.blade.php"));
}

#[test]
fn test_set_override() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "a.blade.php", "@allows('x') x @endallows");

    let output = azd(dir.path(), &["compile", "--set", "user=auth()->user()", "a.blade.php"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("$enforcer->allows('x', auth()->user())"));
}

#[test]
fn test_invalid_override_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "a.blade.php", "");

    let output = azd(dir.path(), &["--set", "open-simple=if:", "a.blade.php"]);
    assert!(!output.status.success());
}

#[test]
fn test_codes_subcommand() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = azd(dir.path(), &["codes"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("mismatched-end"));
    assert!(text.contains("unterminated-directive"));
}
