//! Filters bound at runtime through configuration.
//!
//! A profile called `<name>` is configured with
//!
//! ```text
//! [filter "profile:<name>"]
//!     plugin = /absolute/or/relative/path/to/library
//! ```
//!
//! The library is opened through a [`Loader`] when the filter is bound, and must export the three
//! well-known symbols [`load::INIT_SYMBOL`], [`load::OBJECT_SYMBOL`] and [`load::FREE_SYMBOL`].
//! Everything that can go wrong here happens before the traversal starts.

use std::path::{Path, PathBuf};

pub mod config;
pub mod load;

pub use load::{Exports, Library, Loader, Registered, Symbol};

use crate::filter::EntryPoints;

/// Options for resolving profile libraries.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// The directory relative plugin paths are resolved against.
    ///
    /// If unset, the directory holding git's core programs is used, if it can be determined.
    pub install_dir: Option<PathBuf>,
}

impl Options {
    /// Use `dir` to resolve relative plugin paths.
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    /// Turn a configured plugin path into the path to open.
    ///
    /// Absolute paths are used as they are. Relative paths are joined to the installation directory,
    /// or used as they are if there is none.
    pub fn resolve(&self, configured: &Path) -> PathBuf {
        if configured.is_absolute() {
            return configured.to_owned();
        }
        let install_dir: Option<&Path> = match self.install_dir.as_deref() {
            Some(dir) => Some(dir),
            None => gix_path::env::core_dir(),
        };
        match install_dir {
            Some(dir) => dir.join(configured),
            None => configured.to_owned(),
        }
    }
}

/// The reason a library could not provide all entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingSymbol(pub &'static str);

/// Resolve the three well-known entry points of `library` by name.
pub fn entry_points(library: &dyn Library) -> Result<EntryPoints, MissingSymbol> {
    let init = match library.symbol(load::INIT_SYMBOL) {
        Some(Symbol::Init(f)) => f,
        _ => return Err(MissingSymbol(load::INIT_SYMBOL)),
    };
    let decide = match library.symbol(load::OBJECT_SYMBOL) {
        Some(Symbol::Decide(f)) => f,
        _ => return Err(MissingSymbol(load::OBJECT_SYMBOL)),
    };
    let free = match library.symbol(load::FREE_SYMBOL) {
        Some(Symbol::Free(f)) => f,
        _ => return Err(MissingSymbol(load::FREE_SYMBOL)),
    };
    Ok(EntryPoints { init, decide, free })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Noop;

    #[test]
    fn absolute_paths_are_kept() {
        let opts = Options::default().with_install_dir("/opt/git");
        let abs = if cfg!(windows) { Path::new("C:\\plugins\\rand.so") } else { Path::new("/plugins/rand.so") };
        assert_eq!(opts.resolve(abs), abs);
    }

    #[test]
    fn relative_paths_are_joined_to_install_dir() {
        let opts = Options::default().with_install_dir("/opt/git");
        assert_eq!(
            opts.resolve(Path::new("filters/rand.so")),
            Path::new("/opt/git").join("filters/rand.so")
        );
    }

    #[test]
    fn all_three_symbols_are_required() {
        assert!(entry_points(&Exports::of::<Noop>()).is_ok());

        let partial = Exports::default()
            .with(load::INIT_SYMBOL, Symbol::Init(EntryPoints::of::<Noop>().init))
            .with(load::OBJECT_SYMBOL, Symbol::Decide(EntryPoints::of::<Noop>().decide));
        assert_eq!(entry_points(&partial).unwrap_err(), MissingSymbol(load::FREE_SYMBOL));
    }

    #[test]
    fn symbols_of_the_wrong_kind_do_not_count() {
        let ep = EntryPoints::of::<Noop>();
        let swapped = Exports::default()
            .with(load::INIT_SYMBOL, Symbol::Free(ep.free))
            .with(load::OBJECT_SYMBOL, Symbol::Decide(ep.decide))
            .with(load::FREE_SYMBOL, Symbol::Free(ep.free));
        assert_eq!(entry_points(&swapped).unwrap_err(), MissingSymbol(load::INIT_SYMBOL));
    }
}
