//! Turn a filter specification into a bound filter, before any traversal starts.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::extension::{self, Extension};
use crate::filter::EntryPoints;
use crate::profile::{self, Library, Loader};
use crate::spec::{self, Mechanism};
use crate::trace::Sink;
use crate::{Error, Repository, Result, Session};

/// Which implementation answers for a traversal.
#[derive(Clone)]
pub enum Binding {
    /// An entry of the extension table.
    Extension(Extension),
    /// A library opened for a configured profile.
    Profile {
        /// The profile name.
        name: String,
        /// The resolved path the library was opened from.
        path: PathBuf,
        /// The library, kept alive for as long as the binding or any of its sessions exist.
        library: Arc<dyn Library>,
        /// The entry points resolved from `library`.
        entry_points: EntryPoints,
    },
}

impl Binding {
    /// The name of the bound filter.
    pub fn name(&self) -> &str {
        match self {
            Binding::Extension(ext) => ext.name,
            Binding::Profile { name, .. } => name,
        }
    }

    /// The mechanism the filter was found with.
    pub fn mechanism(&self) -> Mechanism {
        match self {
            Binding::Extension(_) => Mechanism::Extension,
            Binding::Profile { .. } => Mechanism::Profile,
        }
    }

    /// The entry points of the bound filter.
    pub fn entry_points(&self) -> EntryPoints {
        match self {
            Binding::Extension(ext) => ext.entry_points,
            Binding::Profile { entry_points, .. } => *entry_points,
        }
    }

    /// Initialize the bound filter with `argument` for a traversal of `repo`.
    pub fn start<'repo, S: Sink>(&self, repo: Repository<'repo>, argument: &str, trace: S) -> Result<Session<'repo, S>> {
        let library = match self {
            Binding::Extension(_) => None,
            Binding::Profile { library, .. } => Some(Arc::clone(library)),
        };
        Session::start(repo, self.entry_points(), argument, trace)
            .map(|session| session.keep_alive(library))
            .map_err(|source| Error::Init {
                name: self.name().to_owned(),
                source,
            })
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Extension(ext) => f.debug_tuple("Extension").field(ext).finish(),
            Binding::Profile {
                name,
                path,
                entry_points,
                ..
            } => f
                .debug_struct("Profile")
                .field("name", name)
                .field("path", path)
                .field("entry_points", entry_points)
                .finish_non_exhaustive(),
        }
    }
}

/// A binding together with the argument to initialize it with.
#[derive(Debug, Clone)]
pub struct Bound {
    /// The filter implementation.
    pub binding: Binding,
    /// The argument from the filter specification.
    pub argument: String,
}

impl Bound {
    /// Initialize the filter for a traversal of `repo`.
    pub fn start<'repo, S: Sink>(&self, repo: Repository<'repo>, trace: S) -> Result<Session<'repo, S>> {
        self.binding.start(repo, &self.argument, trace)
    }
}

/// Everything needed to resolve filter specifications: the extension table, and optionally the
/// configuration and loader for profiles.
///
/// It is immutable once built and can be shared by concurrent traversals.
pub struct Registry {
    extensions: extension::Table,
    profiles: Option<Profiles>,
}

struct Profiles {
    /// Configured, unresolved plugin paths by profile name.
    plugins: BTreeMap<String, PathBuf>,
    loader: Arc<dyn Loader>,
    options: profile::Options,
}

impl Registry {
    /// A registry with the given extensions and no support for profiles.
    pub fn new(extensions: extension::Table) -> Self {
        Registry {
            extensions,
            profiles: None,
        }
    }

    /// A registry with the builtin extensions only.
    pub fn builtin() -> Self {
        Self::new(extension::Table::builtin())
    }

    /// Enable profiles, reading their plugin paths from `config` and opening them with `loader`.
    ///
    /// The plugin paths are read once, later changes to `config` are not seen.
    pub fn with_profiles(
        mut self,
        config: &gix_config::File<'_>,
        loader: impl Loader + 'static,
        options: profile::Options,
    ) -> Self {
        let plugins = profile::config::profile_names(config)
            .into_iter()
            .filter_map(|name| {
                let path = profile::config::plugin_path(config, &name)?;
                Some((name, path))
            })
            .collect();
        self.profiles = Some(Profiles {
            plugins,
            loader: Arc::new(loader),
            options,
        });
        self
    }

    /// The extension table.
    pub fn extensions(&self) -> &extension::Table {
        &self.extensions
    }

    /// The names of all profiles with a configured plugin, sorted.
    pub fn profile_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.profiles
            .iter()
            .flat_map(|profiles| profiles.plugins.keys().map(String::as_str))
    }

    /// Parse `spec` and bind the filter it names.
    pub fn bind(&self, spec: &str) -> Result<Bound> {
        let spec = spec::parse(spec)?;
        let binding = match spec.mechanism {
            Mechanism::Extension => self.extension(spec.name)?,
            Mechanism::Profile => self.profile(spec.name)?,
        };
        Ok(Bound {
            binding,
            argument: spec.argument.to_owned(),
        })
    }

    /// Bind the extension called `name`.
    pub fn extension(&self, name: &str) -> Result<Binding> {
        self.extensions
            .find(name)
            .copied()
            .map(Binding::Extension)
            .ok_or_else(|| Error::UnknownExtension { name: name.to_owned() })
    }

    /// Bind the profile called `name` by opening its configured library.
    pub fn profile(&self, name: &str) -> Result<Binding> {
        let unknown = || Error::UnknownProfile { name: name.to_owned() };
        let profiles = self.profiles.as_ref().ok_or_else(unknown)?;
        let configured = profiles.plugins.get(name).ok_or_else(unknown)?;
        let path = profiles.options.resolve(configured);

        let library = profiles.loader.open(&path).map_err(|source| Error::Load {
            name: name.to_owned(),
            source,
        })?;
        let entry_points = profile::entry_points(&*library).map_err(|profile::MissingSymbol(symbol)| {
            Error::MissingSymbol {
                name: name.to_owned(),
                path: path.clone(),
                symbol,
            }
        })?;
        Ok(Binding::Profile {
            name: name.to_owned(),
            path,
            library,
            entry_points,
        })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("extensions", &self.extensions)
            .field("profiles", &self.profile_names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Exports, Registered};
    use crate::sample::Sample;
    use crate::Kind;

    fn config(text: &'static str) -> gix_config::File<'static> {
        gix_config::File::try_from(text).unwrap()
    }

    #[test]
    fn registry_and_bindings_can_be_shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
        assert_send_sync::<Binding>();
        assert_send_sync::<Bound>();
    }

    #[test]
    fn plugin_paths_are_read_once_from_configuration() {
        let registry = Registry::builtin().with_profiles(
            &config(
                "[filter \"profile:sparse\"]\n\tplugin = sparse.so\n\
                 [filter \"profile:empty\"]\n\tplugin =\n\
                 [filter \"profile:rand\"]\n\tplugin = rand.so\n",
            ),
            Registered::default(),
            profile::Options::default(),
        );
        assert_eq!(registry.profile_names().collect::<Vec<_>>(), ["rand", "sparse"]);
        assert_eq!(Registry::builtin().profile_names().count(), 0);
    }

    #[test]
    fn extensions_bind_by_name() {
        let bound = Registry::builtin().bind("extension:rand=5").unwrap();
        assert_eq!(bound.binding.name(), "rand");
        assert_eq!(bound.binding.mechanism(), Mechanism::Extension);
        assert_eq!(bound.argument, "5");
    }

    #[test]
    fn unknown_extension_is_a_configuration_error() {
        let err = Registry::builtin().bind("static:doesnotexist=5").unwrap_err();
        assert!(matches!(err, Error::UnknownExtension { ref name } if name == "doesnotexist"));
        assert_eq!(err.kind(), Kind::Configuration);
    }

    #[test]
    fn profiles_need_configuration() {
        let err = Registry::builtin().bind("profile:rand=5").unwrap_err();
        assert!(matches!(err, Error::UnknownProfile { .. }));

        let registry = Registry::builtin().with_profiles(
            &config("[filter \"profile:other\"]\n\tplugin = other.so\n"),
            Registered::default(),
            profile::Options::default(),
        );
        let err = registry.bind("profile:rand=5").unwrap_err();
        assert_eq!(
            err.to_string(),
            "filter profile 'rand' has no plugin configured in 'filter.profile:rand.plugin'"
        );
    }

    #[test]
    fn profiles_resolve_relative_to_install_dir() {
        let registry = Registry::builtin().with_profiles(
            &config("[filter \"profile:rand\"]\n\tplugin = plugins/rand.so\n"),
            Registered::default()
                .require_file(false)
                .with_library("rand.so", Exports::of::<Sample>()),
            profile::Options::default().with_install_dir("/usr/libexec/git-core"),
        );
        let bound = registry.bind("profile:rand=10").unwrap();
        match &bound.binding {
            Binding::Profile { name, path, .. } => {
                assert_eq!(name, "rand");
                assert_eq!(path, &std::path::Path::new("/usr/libexec/git-core").join("plugins/rand.so"));
            }
            other => panic!("expected a profile, got {other:?}"),
        }
    }
}
