//! Open profile libraries and look up their symbols.
//!
//! Libraries are provided by the host through a [`Loader`]. A single closed binary registers its
//! profile libraries up front with [`Registered`], matching them by file name against the
//! configured plugin path.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::filter::{DecideFn, EntryPoints, Filter, FreeFn, InitFn};

/// The name of the entry point creating the filter context.
pub const INIT_SYMBOL: &str = "git_filter_profile_init";
/// The name of the entry point deciding about a single object.
pub const OBJECT_SYMBOL: &str = "git_filter_profile_object";
/// The name of the entry point releasing the filter context.
pub const FREE_SYMBOL: &str = "git_filter_profile_free";

/// The error returned by [`Loader::open()`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("plugin library '{}' does not exist", path.display())]
    NotFound { path: PathBuf },
    #[error("'{}' is not a loadable plugin library", path.display())]
    NotALibrary { path: PathBuf },
    #[error("could not access plugin library '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An exported symbol of a library.
#[derive(Clone, Copy)]
pub enum Symbol {
    /// An initialization entry point.
    Init(InitFn),
    /// A decision entry point.
    Decide(DecideFn),
    /// A finalization entry point.
    Free(FreeFn),
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (kind, addr) = match self {
            Symbol::Init(func) => ("Init", *func as *const ()),
            Symbol::Decide(func) => ("Decide", *func as *const ()),
            Symbol::Free(func) => ("Free", *func as *const ()),
        };
        f.debug_tuple(kind).field(&addr).finish()
    }
}

/// An opened library whose symbols can be resolved by name.
///
/// Its code is shared by all sessions using it, which may run on different threads.
pub trait Library: Send + Sync {
    /// Return the symbol called `name`, if it is exported.
    fn symbol(&self, name: &str) -> Option<Symbol>;
}

/// Opens libraries by path.
pub trait Loader: Send + Sync {
    /// Open the library at `path`, which was already resolved against the installation directory.
    fn open(&self, path: &Path) -> Result<Arc<dyn Library>, Error>;
}

/// A symbol table, the in-process form of a library.
#[derive(Debug, Clone, Default)]
pub struct Exports {
    symbols: Vec<(&'static str, Symbol)>,
}

impl Exports {
    /// Export the filter `F` under the three well-known symbol names.
    pub fn of<F: Filter>() -> Self {
        let EntryPoints { init, decide, free } = EntryPoints::of::<F>();
        Exports::default()
            .with(INIT_SYMBOL, Symbol::Init(init))
            .with(OBJECT_SYMBOL, Symbol::Decide(decide))
            .with(FREE_SYMBOL, Symbol::Free(free))
    }

    /// Export `symbol` as `name`, replacing a previous export of the same name.
    pub fn with(mut self, name: &'static str, symbol: Symbol) -> Self {
        self.symbols.retain(|(existing, _)| *existing != name);
        self.symbols.push((name, symbol));
        self
    }
}

impl Library for Exports {
    fn symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols
            .iter()
            .find_map(|(exported, symbol)| (*exported == name).then_some(*symbol))
    }
}

/// A loader for libraries linked into the binary and registered under their file name.
///
/// By default the configured file must also exist on disk, so that configuration pointing to a
/// missing plugin fails the same way it would with a dynamic linker.
#[derive(Clone)]
pub struct Registered {
    libraries: HashMap<OsString, Arc<dyn Library>>,
    require_file: bool,
}

impl Default for Registered {
    fn default() -> Self {
        Registered {
            libraries: HashMap::new(),
            require_file: true,
        }
    }
}

impl Registered {
    /// Register `library` to be returned for paths whose file name is `file_name`.
    pub fn with_library(mut self, file_name: impl AsRef<OsStr>, library: impl Library + 'static) -> Self {
        self.libraries.insert(file_name.as_ref().to_owned(), Arc::new(library));
        self
    }

    /// If `yes`, paths must point to an existing file before a registered library is returned.
    pub fn require_file(mut self, yes: bool) -> Self {
        self.require_file = yes;
        self
    }

    /// The file names of all registered libraries.
    pub fn file_names(&self) -> impl Iterator<Item = &OsStr> + '_ {
        self.libraries.keys().map(OsString::as_os_str)
    }
}

impl std::fmt::Debug for Registered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registered")
            .field("libraries", &self.libraries.keys().collect::<Vec<_>>())
            .field("require_file", &self.require_file)
            .finish()
    }
}

impl Loader for Registered {
    fn open(&self, path: &Path) -> Result<Arc<dyn Library>, Error> {
        if self.require_file {
            match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => return Err(Error::NotALibrary { path: path.to_owned() }),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    return Err(Error::NotFound { path: path.to_owned() })
                }
                Err(source) => {
                    return Err(Error::Io {
                        path: path.to_owned(),
                        source,
                    })
                }
            }
        }
        path.file_name()
            .and_then(|name| self.libraries.get(name))
            .cloned()
            .ok_or_else(|| Error::NotALibrary { path: path.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Noop;

    #[test]
    fn exports_resolve_by_exact_name() {
        let exports = Exports::of::<Noop>();
        assert!(matches!(exports.symbol(INIT_SYMBOL), Some(Symbol::Init(_))));
        assert!(matches!(exports.symbol(OBJECT_SYMBOL), Some(Symbol::Decide(_))));
        assert!(matches!(exports.symbol(FREE_SYMBOL), Some(Symbol::Free(_))));
        assert!(exports.symbol("git_filter_profile").is_none());
    }

    #[test]
    fn registered_libraries_are_found_by_file_name() {
        let loader = Registered::default()
            .require_file(false)
            .with_library("noop.so", Exports::of::<Noop>());
        assert!(loader.open(Path::new("/anywhere/noop.so")).is_ok());
        assert!(matches!(
            loader.open(Path::new("/anywhere/other.so")),
            Err(Error::NotALibrary { .. })
        ));
    }

    #[test]
    fn missing_files_are_reported_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Registered::default().with_library("noop.so", Exports::of::<Noop>());

        let path = dir.path().join("noop.so");
        assert!(matches!(loader.open(&path), Err(Error::NotFound { .. })));

        std::fs::write(&path, b"").unwrap();
        assert!(loader.open(&path).is_ok());

        assert!(matches!(loader.open(dir.path()), Err(Error::NotALibrary { .. })));
    }
}
