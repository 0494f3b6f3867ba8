use std::path::PathBuf;

use crate::filter::init;
use crate::profile::load;
use crate::spec;

/// Result type alias for binding and starting filters.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable high-level error classification.
///
/// None of these are retried, a filter is bound once per traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The filter specification or the configuration it refers to is wrong.
    Configuration,
    /// A profile library could not be opened or lacks an entry point.
    Loading,
    /// The filter could not set itself up.
    Resource,
}

/// The error returned when binding or starting a filter, always before the traversal begins.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Spec(#[from] spec::Error),
    #[error("unknown filter extension '{name}'")]
    UnknownExtension { name: String },
    #[error("filter profile '{name}' has no plugin configured in 'filter.profile:{name}.plugin'")]
    UnknownProfile { name: String },
    #[error("could not load the plugin of filter profile '{name}'")]
    Load {
        name: String,
        #[source]
        source: load::Error,
    },
    #[error("plugin '{}' of filter profile '{name}' does not export '{symbol}'", path.display())]
    MissingSymbol {
        name: String,
        path: PathBuf,
        symbol: &'static str,
    },
    #[error("filter '{name}' failed to initialize")]
    Init {
        name: String,
        #[source]
        source: init::Error,
    },
}

impl Error {
    /// Fast classification helper returning a stable error kind.
    pub fn kind(&self) -> Kind {
        match self {
            Error::Spec(_) | Error::UnknownExtension { .. } | Error::UnknownProfile { .. } => Kind::Configuration,
            Error::Load { .. } | Error::MissingSymbol { .. } => Kind::Loading,
            Error::Init { .. } => Kind::Resource,
        }
    }
}
