//! Pluggable filters for object traversals.
//!
//! A traversal engine walks trees and blobs depth-first and asks a bound [`Filter`] what to do with
//! every object it visits. The filter answers with a [`Decision`] (mark the object as seen, show it,
//! both or neither) and, for blobs, an [`OmitDirective`] that edits the traversal-wide omit set.
//!
//! Filters are bound from a filter specification of the form `<mechanism>:<name>=<argument>`:
//!
//! - `extension:<name>` looks `<name>` up in a compile-time [`extension::Table`].
//! - `profile:<name>` reads `filter.profile:<name>.plugin` from the git configuration and opens the
//!   library found there through a [`profile::Loader`], resolving its three well-known entry points.
//!
//! Both mechanisms end up with the same [`EntryPoints`], and both are driven through a [`Session`]
//! which guarantees that initialization happens once, that no decision is requested before it or
//! after finalization, and that finalization happens exactly once.
//!
//! # Example
//!
//! ```
//! use gix_object_filter::{trace, traverse, Registry, Repository};
//!
//! let registry = Registry::builtin();
//! let bound = registry.bind("extension:rand=100")?;
//!
//! let repo = Repository::new(".git", gix_hash::Kind::Sha1);
//! let mut sink = trace::Recorder::default();
//! let mut session = bound.start(repo, &mut sink)?;
//!
//! let blob = traverse::Entry::blob(gix_hash::ObjectId::empty_blob(gix_hash::Kind::Sha1), "README");
//! let root = traverse::Entry::tree(gix_hash::ObjectId::empty_tree(gix_hash::Kind::Sha1), "", vec![blob]);
//!
//! let mut walk = traverse::Walk::default();
//! walk.visit(&root, &mut session);
//! session.finalize();
//!
//! let outcome = walk.into_outcome();
//! assert_eq!(outcome.shown.len(), 2);
//! assert!(outcome.omitted.is_empty());
//! # Ok::<(), gix_object_filter::Error>(())
//! ```
#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod binding;
pub mod decision;
pub mod extension;
pub mod filter;
pub mod object;
pub mod profile;
pub mod sample;
pub mod session;
pub mod spec;
pub mod trace;
pub mod traverse;

mod error;

pub use binding::{Binding, Bound, Registry};
pub use decision::{Decision, OmitDirective, Situation};
pub use error::{Error, Kind, Result};
pub use filter::{Context, EntryPoints, Filter};
pub use object::{Object, Repository, Visit};
pub use session::Session;
