use assert_fs::TempDir;
use assert_fs::fixture::PathChild;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use twig::builders::{CheckoutBuilder, CommitBuilder};

mod common;

fn commit_fixture(
    dir: &TempDir,
    repository: &twig::areas::repository::Repository,
    files: &[(&str, &str)],
) -> Result<(), Box<dyn std::error::Error>> {
    for (path, content) in files {
        common::write_file(dir, path, content);
    }

    CommitBuilder::new(repository)
        .author("Jane Doe", "jane@example.com")
        .message("fixture")
        .add_all(files.iter().map(|(path, _)| PathBuf::from(*path)))
        .write()?;

    Ok(())
}

#[test]
fn checkout_restores_committed_content() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);
    commit_fixture(&dir, &repository, &[("file.txt", "committed")])?;

    common::write_file(&dir, "file.txt", "local edit");

    CheckoutBuilder::new(&repository)
        .revision("HEAD")?
        .file("file.txt", "file.txt")?
        .checkout()?;

    assert_eq!(std::fs::read_to_string(dir.child("file.txt").path())?, "committed");

    Ok(())
}

#[test]
fn checkout_writes_to_a_different_destination() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);
    commit_fixture(&dir, &repository, &[("src/app.rs", "fn main() {}")])?;

    CheckoutBuilder::new(&repository)
        .revision("master")?
        .file("src/app.rs", "restored/app.rs")?
        .checkout()?;

    assert_eq!(
        std::fs::read_to_string(dir.child("restored/app.rs").path())?,
        "fn main() {}"
    );

    Ok(())
}

#[test]
fn backup_renames_use_orig_then_numbered_names() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);
    commit_fixture(&dir, &repository, &[("a", "committed")])?;

    common::write_file(&dir, "a", "first local");

    CheckoutBuilder::new(&repository)
        .revision("HEAD")?
        .file("a", "a")?
        .backup(true)
        .checkout()?;

    assert_eq!(std::fs::read_to_string(dir.child("a").path())?, "committed");
    assert_eq!(std::fs::read_to_string(dir.child("a.orig").path())?, "first local");

    common::write_file(&dir, "a", "second local");

    CheckoutBuilder::new(&repository)
        .revision("HEAD")?
        .file("a", "a")?
        .backup(true)
        .checkout()?;

    assert_eq!(std::fs::read_to_string(dir.child("a.orig").path())?, "first local");
    assert_eq!(
        std::fs::read_to_string(dir.child("a.0.orig").path())?,
        "second local"
    );

    Ok(())
}

#[test]
fn without_backup_the_destination_is_overwritten_in_place()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);
    commit_fixture(&dir, &repository, &[("a", "committed")])?;

    common::write_file(&dir, "a", "local");

    CheckoutBuilder::new(&repository)
        .revision("HEAD")?
        .file("a", "a")?
        .checkout()?;

    assert_eq!(std::fs::read_to_string(dir.child("a").path())?, "committed");
    assert!(!dir.child("a.orig").path().exists());

    Ok(())
}

#[test]
fn unresolved_revision_fails_immediately_with_its_name()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);
    commit_fixture(&dir, &repository, &[("file.txt", "content")])?;

    let error = CheckoutBuilder::new(&repository)
        .revision("fail")
        .unwrap_err();

    assert_eq!(error.to_string(), "fail");

    Ok(())
}

#[test]
fn missing_source_path_fails_immediately_with_its_path()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);
    commit_fixture(&dir, &repository, &[("present.txt", "content")])?;

    let error = CheckoutBuilder::new(&repository)
        .revision("HEAD")?
        .file("nested/missing.txt", "anywhere.txt")
        .unwrap_err();

    assert_eq!(error.to_string(), "nested/missing.txt");

    Ok(())
}

#[test]
fn files_reports_the_first_missing_source() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);
    commit_fixture(&dir, &repository, &[("present.txt", "content")])?;

    let error = CheckoutBuilder::new(&repository)
        .revision("HEAD")?
        .files([
            (PathBuf::from("present.txt"), PathBuf::from("out.txt")),
            (PathBuf::from("gone-first.txt"), PathBuf::from("x.txt")),
            (PathBuf::from("gone-second.txt"), PathBuf::from("y.txt")),
        ])
        .unwrap_err();

    assert_eq!(error.to_string(), "gone-first.txt");

    // the failed configuration never wrote anything
    assert!(!dir.child("out.txt").path().exists());

    Ok(())
}

#[cfg(unix)]
#[test]
fn checkout_restores_the_executable_bit() -> Result<(), Box<dyn std::error::Error>> {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "run.sh", "#!/bin/sh\n");
    std::fs::set_permissions(
        dir.child("run.sh").path(),
        std::fs::Permissions::from_mode(0o755),
    )?;

    CommitBuilder::new(&repository)
        .author("Jane Doe", "jane@example.com")
        .message("script")
        .add_all(["run.sh"])
        .write()?;

    std::fs::remove_file(dir.child("run.sh").path())?;

    CheckoutBuilder::new(&repository)
        .revision("HEAD")?
        .file("run.sh", "run.sh")?
        .checkout()?;

    let mode = std::fs::metadata(dir.child("run.sh").path())?
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111);

    Ok(())
}

#[test]
fn checkout_by_full_object_id_resolves_the_commit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "file.txt", "by oid");
    let commit_id = CommitBuilder::new(&repository)
        .author("Jane Doe", "jane@example.com")
        .message("fixture")
        .add_all(["file.txt"])
        .write()?;

    common::write_file(&dir, "file.txt", "local edit");

    CheckoutBuilder::new(&repository)
        .revision(commit_id.as_ref())?
        .file("file.txt", "file.txt")?
        .checkout()?;

    assert_eq!(std::fs::read_to_string(dir.child("file.txt").path())?, "by oid");

    Ok(())
}
