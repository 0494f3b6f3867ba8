//! A depth-first walk over an in-memory listing of trees and blobs, applying a filter the way the
//! object listing of `rev-list` and `upload-pack` does.
//!
//! Objects marked as seen are never submitted again, shown objects are collected in visitation order
//! and omit directives edit a set that lives as long as the [`Walk`].

use std::collections::{BTreeSet, HashSet};

use bstr::{BStr, BString, ByteSlice, ByteVec};
use gix_hash::ObjectId;

use crate::trace::Sink;
use crate::{OmitDirective, Session, Visit};

/// A node of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A tree with its entries.
    Tree {
        /// The tree id.
        id: ObjectId,
        /// The entry name in the parent tree, empty for a root.
        name: BString,
        /// The entries of the tree, in order.
        entries: Vec<Entry>,
    },
    /// A blob.
    Blob {
        /// The blob id.
        id: ObjectId,
        /// The entry name in the parent tree.
        name: BString,
    },
}

impl Entry {
    /// Create a tree entry.
    pub fn tree(id: ObjectId, name: impl Into<BString>, entries: Vec<Entry>) -> Self {
        Entry::Tree {
            id,
            name: name.into(),
            entries,
        }
    }

    /// Create a blob entry.
    pub fn blob(id: ObjectId, name: impl Into<BString>) -> Self {
        Entry::Blob { id, name: name.into() }
    }

    /// The id of this entry.
    pub fn id(&self) -> &ObjectId {
        match self {
            Entry::Tree { id, .. } | Entry::Blob { id, .. } => id,
        }
    }

    /// The name of this entry.
    pub fn name(&self) -> &BStr {
        match self {
            Entry::Tree { name, .. } | Entry::Blob { name, .. } => name.as_bstr(),
        }
    }
}

/// The result of one or more walks.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Objects to include, in the order they were shown.
    pub shown: Vec<ObjectId>,
    /// Objects deliberately excluded.
    pub omitted: BTreeSet<ObjectId>,
}

/// Walk state spanning one traversal, which may consist of several roots.
#[derive(Debug, Default)]
pub struct Walk {
    seen: HashSet<ObjectId>,
    outcome: Outcome,
    path: BString,
}

impl Walk {
    /// Walk `root` and everything below it, consulting `session` for every object not yet seen.
    pub fn visit<S: Sink>(&mut self, root: &Entry, session: &mut Session<'_, S>) {
        let filename = root.name();
        let prev_len = self.path.len();
        if !filename.is_empty() {
            if !self.path.is_empty() {
                self.path.push_byte(b'/');
            }
            self.path.push_str(filename);
        }
        match root {
            Entry::Tree { id, entries, .. } => {
                if self.seen.contains(id) {
                    self.path.truncate(prev_len);
                    return;
                }
                let (decision, _) = session.decide(&Visit::begin_tree(id, self.path.as_bstr(), filename));
                self.apply(id, decision);
                for entry in entries {
                    self.visit(entry, session);
                }
                let (decision, _) = session.decide(&Visit::end_tree(id, self.path.as_bstr(), filename));
                self.apply(id, decision);
            }
            Entry::Blob { id, .. } => {
                if !self.seen.contains(id) {
                    let (decision, omit) = session.decide(&Visit::blob(id, self.path.as_bstr(), filename));
                    match omit {
                        OmitDirective::Omit => {
                            self.outcome.omitted.insert(*id);
                        }
                        OmitDirective::Keep => {
                            self.outcome.omitted.remove(id);
                        }
                        OmitDirective::Ignore => {}
                    }
                    self.apply(id, decision);
                }
            }
        }
        self.path.truncate(prev_len);
    }

    fn apply(&mut self, id: &ObjectId, decision: crate::Decision) {
        if decision.marks_seen() {
            self.seen.insert(*id);
        }
        if decision.shows() {
            self.outcome.shown.push(*id);
        }
    }

    /// Return true if `id` was marked as seen.
    pub fn is_seen(&self, id: &ObjectId) -> bool {
        self.seen.contains(id)
    }

    /// The outcome so far.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Finish the walk and return its outcome.
    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }
}
