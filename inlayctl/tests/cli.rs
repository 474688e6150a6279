use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::tempdir;

fn stdout_of(args: &[&str]) -> String {
    let mut cmd = cargo_bin_cmd!("inlayctl");
    let output = cmd
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8_lossy(&output).into_owned()
}

#[test]
fn help_lists_subcommands() {
    let text = stdout_of(&["--help"]);
    for subcommand in ["key", "scan", "resolve", "entries", "sweep"] {
        assert!(text.contains(subcommand), "help missing '{subcommand}'");
    }
}

#[test]
fn resolve_help_mentions_options() {
    let text = stdout_of(&["resolve", "--help"]);
    for flag in ["--cache-dir", "--width", "--config", "--base-url"] {
        assert!(text.contains(flag), "resolve help missing {flag}");
    }
}

#[test]
fn key_prints_stable_cache_names() {
    let text = stdout_of(&["key", "abc"]);
    assert_eq!(text.trim(), "ba7816bf8f01cfea  abc");
}

#[test]
fn scan_lists_references_in_document_order() {
    let tmp = tempdir().expect("tempdir");
    let document = tmp.path().join("article.html");
    std::fs::write(
        &document,
        "<p><img src=\"https://img.example.com/a.png\"></p>\n![b](https://img.example.com/b.png)\n",
    )
    .expect("write document");

    let text = stdout_of(&["scan", document.to_str().expect("utf-8 path")]);
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec!["https://img.example.com/a.png", "https://img.example.com/b.png"]
    );
}

#[test]
fn entries_of_an_empty_cache() {
    let tmp = tempdir().expect("tempdir");
    let cache_dir = tmp.path().join("images");
    let text = stdout_of(&[
        "entries",
        "--cache-dir",
        cache_dir.to_str().expect("utf-8 path"),
    ]);
    assert!(text.starts_with("0 entries, 0 bytes"), "unexpected output: {text}");
}

#[test]
fn missing_document_fails() {
    let mut cmd = cargo_bin_cmd!("inlayctl");
    cmd.args(["scan", "/definitely/not/here.md"]).assert().failure();
}
