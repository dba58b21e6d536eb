use assert_fs::TempDir;
use assert_fs::fixture::PathChild;
use fake::Fake;
use fake::faker::lorem::en::Words;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use twig::builders::{CommitBuilder, IndexBuilder};

mod common;

#[test]
fn staging_a_file_records_a_sorted_index_entry() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "b.txt", "second");
    common::write_file(&dir, "a.txt", "first");

    IndexBuilder::new(&repository)
        .add("b.txt")
        .add("a.txt")
        .write()?;

    let index = repository.index();
    let mut index = index.lock().unwrap();
    index.rehydrate()?;

    let names: Vec<PathBuf> = index.entries().map(|entry| entry.name.clone()).collect();
    assert_eq!(names, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);

    Ok(())
}

#[test]
fn restaging_a_path_replaces_its_entry() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "note.txt", "before");
    IndexBuilder::new(&repository).add("note.txt").write()?;

    common::write_file(&dir, "note.txt", "after");
    IndexBuilder::new(&repository).add("note.txt").write()?;

    let index = repository.index();
    let mut index = index.lock().unwrap();
    index.rehydrate()?;

    assert_eq!(index.entries().count(), 1);
    let entry = index.entry_by_path(Path::new("note.txt")).unwrap();
    let blob = repository
        .database()
        .parse_object_as_blob(&entry.oid)?
        .unwrap();
    assert_eq!(blob.content(), "after");

    Ok(())
}

#[test]
fn write_with_no_mutations_reproduces_index_byte_for_byte()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    let content = Words(5..10).fake::<Vec<String>>().join(" ");
    common::write_file(&dir, "tracked.txt", &content);
    IndexBuilder::new(&repository).add("tracked.txt").write()?;

    let index_path = dir.child(".git/index");
    let before = std::fs::read(index_path.path())?;

    IndexBuilder::new(&repository).write()?;

    let after = std::fs::read(index_path.path())?;
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn deleting_an_absent_entry_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "kept.txt", "kept");
    IndexBuilder::new(&repository).add("kept.txt").write()?;

    let index_path = dir.child(".git/index");
    let before = std::fs::read(index_path.path())?;

    IndexBuilder::new(&repository)
        .delete("never-staged.txt")
        .write()?;

    let after = std::fs::read(index_path.path())?;
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn move_updates_index_bookkeeping_after_a_disk_rename()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "old.txt", "payload");
    IndexBuilder::new(&repository).add("old.txt").write()?;

    std::fs::rename(dir.child("old.txt").path(), dir.child("new.txt").path())?;
    IndexBuilder::new(&repository)
        .move_file("old.txt", "new.txt")
        .write()?;

    let index = repository.index();
    let mut index = index.lock().unwrap();
    index.rehydrate()?;

    assert!(index.entry_by_path(Path::new("old.txt")).is_none());
    assert!(index.entry_by_path(Path::new("new.txt")).is_some());

    Ok(())
}

#[test]
fn move_without_the_destination_on_disk_fails_with_its_path()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "old.txt", "payload");
    IndexBuilder::new(&repository).add("old.txt").write()?;

    let error = IndexBuilder::new(&repository)
        .move_file("old.txt", "new.txt")
        .write()
        .unwrap_err();

    assert_eq!(error.to_string(), "new.txt");

    // nothing was persisted
    let index = repository.index();
    let mut index = index.lock().unwrap();
    index.rehydrate()?;
    assert!(index.entry_by_path(Path::new("old.txt")).is_some());

    Ok(())
}

#[test]
fn commit_without_a_resolvable_ref_has_zero_parents() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "file.txt", "content");

    let commit_id = CommitBuilder::new(&repository)
        .author("Jane Doe", "jane@example.com")
        .time(common::fixed_time())
        .message("Initial import")
        .add_all(["file.txt"])
        .write()?;

    let commit = repository
        .database()
        .parse_object_as_commit(&commit_id)?
        .unwrap();
    assert!(commit.parents().is_empty());

    Ok(())
}

#[test]
fn same_tree_time_and_message_rederive_the_same_commit()
-> Result<(), Box<dyn std::error::Error>> {
    let mut commit_ids = Vec::new();

    for _ in 0..2 {
        let dir = TempDir::new()?;
        let (repository, _monitor) = common::init_repository(&dir);
        common::write_file(&dir, "file.txt", "identical content");

        let commit_id = CommitBuilder::new(&repository)
            .author("Jane Doe", "jane@example.com")
            .time(common::fixed_time())
            .message("Same message")
            .add_all(["file.txt"])
            .write()?;
        commit_ids.push(commit_id);
    }

    assert_eq!(commit_ids[0], commit_ids[1]);

    Ok(())
}

#[test]
fn second_commit_links_to_the_first() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "file.txt", "first");
    let first = CommitBuilder::new(&repository)
        .author("Jane Doe", "jane@example.com")
        .message("first")
        .add_all(["file.txt"])
        .write()?;

    common::write_file(&dir, "file.txt", "second");
    let second = CommitBuilder::new(&repository)
        .author("Jane Doe", "jane@example.com")
        .message("second")
        .add_all(["file.txt"])
        .write()?;

    let commit = repository.database().parse_object_as_commit(&second)?.unwrap();
    assert_eq!(commit.parents(), &[first]);
    assert_eq!(repository.refs().read_head()?, Some(second));

    Ok(())
}

#[test]
fn added_file_appears_as_tree_entry_with_mode_hash_and_path()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "nested/dir/file.txt", "tree payload");

    let commit_id = CommitBuilder::new(&repository)
        .author("Jane Doe", "jane@example.com")
        .message("nested")
        .add_all(["nested/dir/file.txt"])
        .write()?;

    let commit = repository
        .database()
        .parse_object_as_commit(&commit_id)?
        .unwrap();
    let entry = repository
        .database()
        .find_entry(commit.tree_oid(), Path::new("nested/dir/file.txt"))?
        .unwrap();

    assert!(!entry.is_tree());
    assert_eq!(entry.mode.as_str(), "100644");

    let index = repository.index();
    let mut index = index.lock().unwrap();
    index.rehydrate()?;
    let staged = index
        .entry_by_path(Path::new("nested/dir/file.txt"))
        .unwrap();
    assert_eq!(staged.oid, entry.oid);

    Ok(())
}

#[cfg(unix)]
#[test]
fn executable_bit_is_captured_from_the_filesystem() -> Result<(), Box<dyn std::error::Error>> {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "run.sh", "#!/bin/sh\n");
    std::fs::set_permissions(
        dir.child("run.sh").path(),
        std::fs::Permissions::from_mode(0o755),
    )?;

    let commit_id = CommitBuilder::new(&repository)
        .author("Jane Doe", "jane@example.com")
        .message("script")
        .add_all(["run.sh"])
        .write()?;

    let commit = repository
        .database()
        .parse_object_as_commit(&commit_id)?
        .unwrap();
    let entry = repository
        .database()
        .find_entry(commit.tree_oid(), Path::new("run.sh"))?
        .unwrap();

    assert_eq!(entry.mode.as_str(), "100755");

    Ok(())
}

#[test]
fn commit_message_is_stripspace_normalized() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, "file.txt", "content");

    let commit_id = CommitBuilder::new(&repository)
        .author("Jane Doe", "jane@example.com")
        .message("\n\n\nsubject   \n\n\n\nbody\n")
        .add_all(["file.txt"])
        .write()?;

    let commit = repository
        .database()
        .parse_object_as_commit(&commit_id)?
        .unwrap();
    assert_eq!(commit.message(), "subject\n\nbody\n");

    Ok(())
}

#[test]
fn directory_expansion_skips_excluded_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let (repository, _monitor) = common::init_repository(&dir);

    common::write_file(&dir, ".gitignore", "*.log\n");
    common::write_file(&dir, "src/app.rs", "fn main() {}");
    common::write_file(&dir, "src/trace.log", "noise");

    IndexBuilder::new(&repository).add("src").write()?;

    let index = repository.index();
    let mut index = index.lock().unwrap();
    index.rehydrate()?;

    assert!(index.entry_by_path(Path::new("src/app.rs")).is_some());
    assert!(index.entry_by_path(Path::new("src/trace.log")).is_none());

    Ok(())
}
