use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::fixture::{FileWriteStr, PathChild};
use fake::Fake;
use fake::faker::lorem::en::{Word, Words};
use predicates::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn init_reports_the_repository_path() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;

    let mut cmd = Command::cargo_bin("twig")?;
    cmd.current_dir(dir.path()).arg("init");

    cmd.assert().success().stdout(predicate::str::contains(
        "Initialized empty repository in",
    ));

    assert!(dir.child(".git/HEAD").path().exists());
    assert!(dir.child(".git/objects").path().is_dir());

    Ok(())
}

#[test]
fn add_then_commit_reports_a_root_commit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    let file_name = format!("{}.txt", Word().fake::<String>());
    let file_content = Words(5..10).fake::<Vec<String>>().join(" ");
    dir.child(&file_name).write_str(&file_content)?;

    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .arg("add")
        .arg(&file_name)
        .assert()
        .success();

    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .env("GIT_AUTHOR_NAME", "Jane Doe")
        .env("GIT_AUTHOR_EMAIL", "jane@example.com")
        .args(["commit", "-m", "first commit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(root-commit)"))
        .stdout(predicate::str::contains("first commit"));

    Ok(())
}

#[test]
fn checkout_restores_a_committed_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    dir.child("file.txt").write_str("committed content")?;

    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .args(["add", "file.txt"])
        .assert()
        .success();
    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .env("GIT_AUTHOR_NAME", "Jane Doe")
        .env("GIT_AUTHOR_EMAIL", "jane@example.com")
        .args(["commit", "-m", "snapshot"])
        .assert()
        .success();

    dir.child("file.txt").write_str("local edit")?;

    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .args(["checkout", "HEAD", "file.txt"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(dir.child("file.txt").path())?,
        "committed content"
    );

    Ok(())
}

#[test]
fn checkout_of_an_unknown_revision_fails_with_its_name()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .args(["checkout", "fail", "file.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fail"));

    Ok(())
}

#[test]
fn check_ignore_lists_only_excluded_paths() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    dir.child(".gitignore").write_str("*.log\n")?;

    Command::cargo_bin("twig")?
        .current_dir(dir.path())
        .args(["check-ignore", "trace.log", "main.rs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trace.log"))
        .stdout(predicate::str::contains("main.rs").not());

    Ok(())
}
