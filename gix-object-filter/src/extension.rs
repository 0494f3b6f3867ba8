//! Filters compiled into the binary, found by name.

use crate::filter::{EntryPoints, Noop};
use crate::sample::Sample;

/// A named filter with its entry points.
#[derive(Debug, Clone, Copy)]
pub struct Extension {
    /// The name used in `extension:<name>`.
    pub name: &'static str,
    /// The filter behind the name.
    pub entry_points: EntryPoints,
}

impl Extension {
    /// Create a new table entry.
    pub const fn new(name: &'static str, entry_points: EntryPoints) -> Self {
        Extension { name, entry_points }
    }
}

/// The extensions shipped with this crate.
///
/// - `rand` shows a random percentage of blobs, see [`Sample`].
/// - `all` shows everything, see [`Noop`].
pub static BUILTIN: &[Extension] = &[
    Extension::new("rand", EntryPoints::of::<Sample>()),
    Extension::new("all", EntryPoints::of::<Noop>()),
];

/// An immutable lookup table of extensions, built once at startup.
#[derive(Debug, Clone)]
pub struct Table {
    entries: Vec<Extension>,
}

impl Table {
    /// A table holding the [builtin](BUILTIN) extensions only.
    pub fn builtin() -> Self {
        Table {
            entries: BUILTIN.to_vec(),
        }
    }

    /// A table holding `entries`. If names repeat, the first entry wins.
    pub fn new(entries: impl IntoIterator<Item = Extension>) -> Self {
        Table {
            entries: entries.into_iter().collect(),
        }
    }

    /// The builtin extensions followed by `entries`.
    pub fn builtin_and(entries: impl IntoIterator<Item = Extension>) -> Self {
        Self::new(BUILTIN.iter().copied().chain(entries))
    }

    /// Find the extension called exactly `name`.
    pub fn find(&self, name: &str) -> Option<&Extension> {
        self.entries.iter().find(|ext| ext.name == name)
    }

    /// The names of all extensions, in table order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|ext| ext.name)
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::builtin()
    }
}
