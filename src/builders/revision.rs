//! Revision name resolution
//!
//! A revision name is a branch name, `HEAD`, an alias, or a full 40-character
//! object id. Refs win over object ids on ambiguity. The resolution error
//! carries the unresolved name as its entire message, so callers can surface
//! it verbatim.

use crate::areas::repository::Repository;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;

/// Shorthand names accepted wherever a revision is expected
pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
};

/// Resolve a revision name to the tree it denotes
///
/// A commit resolves to its tree; a tree resolves to itself. Any failure
/// (unknown ref, unknown oid, blob target) reports the name itself.
pub fn resolve_tree_oid(repository: &Repository, name: &str) -> anyhow::Result<ObjectId> {
    let oid = resolve_oid(repository, name).ok_or_else(|| anyhow::anyhow!("{}", name))?;

    match repository.database().parse_object(&oid) {
        Ok(ObjectBox::Commit(commit)) => Ok(commit.tree_oid().clone()),
        Ok(ObjectBox::Tree(_)) => Ok(oid),
        _ => Err(anyhow::anyhow!("{}", name)),
    }
}

/// Resolve a revision name to an object id, trying refs before raw oids
fn resolve_oid(repository: &Repository, name: &str) -> Option<ObjectId> {
    let target = REF_ALIASES.get(name).copied().unwrap_or(name);

    if let Ok(Some(oid)) = repository.refs().read_ref(target) {
        return Some(oid);
    }

    if looks_like_oid(target) {
        let oid = ObjectId::try_parse(target.to_string()).ok()?;
        if repository.database().contains(&oid) {
            return Some(oid);
        }
    }

    None
}

fn looks_like_oid(name: &str) -> bool {
    name.len() == OBJECT_ID_LENGTH && name.chars().all(|c| c.is_ascii_hexdigit())
}
