//! Read-only handles the engine passes to filters.

use std::path::Path;

use bstr::BStr;
use gix_hash::oid;

use crate::Situation;

/// The repository a traversal runs in.
///
/// Filters receive it with every call but must not rely on anything beyond what is exposed here.
#[derive(Debug, Clone, Copy)]
pub struct Repository<'a> {
    /// The `.git` directory of the repository.
    pub git_dir: &'a Path,
    /// The hash kind used by all objects in this repository.
    pub object_hash: gix_hash::Kind,
}

impl<'a> Repository<'a> {
    /// Create a new handle.
    pub fn new(git_dir: &'a (impl AsRef<Path> + ?Sized), object_hash: gix_hash::Kind) -> Self {
        Repository {
            git_dir: git_dir.as_ref(),
            object_hash,
        }
    }
}

/// An object in the engine's object store, identified by its content address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Object<'a> {
    /// The content address of the object.
    pub id: &'a oid,
    /// The kind of object, either a tree or a blob.
    pub kind: gix_object::Kind,
}

impl<'a> Object<'a> {
    /// A tree with the given `id`.
    pub fn tree(id: &'a oid) -> Self {
        Object {
            id,
            kind: gix_object::Kind::Tree,
        }
    }

    /// A blob with the given `id`.
    pub fn blob(id: &'a oid) -> Self {
        Object {
            id,
            kind: gix_object::Kind::Blob,
        }
    }
}

/// A single call into a filter's decision function.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    /// What happened.
    pub situation: Situation,
    /// The object it happened to.
    pub object: Object<'a>,
    /// The slash-separated path of the object relative to the traversal root.
    pub path: &'a BStr,
    /// The last component of `path`.
    pub filename: &'a BStr,
}

impl<'a> Visit<'a> {
    /// Entering the tree `id` at `path`.
    pub fn begin_tree(id: &'a oid, path: &'a BStr, filename: &'a BStr) -> Self {
        Visit {
            situation: Situation::BeginTree,
            object: Object::tree(id),
            path,
            filename,
        }
    }

    /// Leaving the tree `id` at `path`.
    pub fn end_tree(id: &'a oid, path: &'a BStr, filename: &'a BStr) -> Self {
        Visit {
            situation: Situation::EndTree,
            object: Object::tree(id),
            path,
            filename,
        }
    }

    /// Reaching the blob `id` at `path`.
    pub fn blob(id: &'a oid, path: &'a BStr, filename: &'a BStr) -> Self {
        Visit {
            situation: Situation::Blob,
            object: Object::blob(id),
            path,
            filename,
        }
    }
}
