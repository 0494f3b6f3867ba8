//! Read profile configuration from git configuration.
//!
//! # Configuration Keys
//!
//! - `filter.profile:<name>.plugin`: path to the library implementing the profile `<name>`

use std::path::PathBuf;

use bstr::{BStr, ByteSlice};

/// The section holding profile configuration.
pub const SECTION: &str = "filter";
/// The prefix of the subsection name, followed by the profile name.
pub const SUBSECTION_PREFIX: &str = "profile:";
/// The key holding the library path.
pub const PLUGIN_KEY: &str = "plugin";

/// Return the configured, unresolved library path for the profile `name`.
///
/// An empty value counts as unset.
pub fn plugin_path(config: &gix_config::File<'_>, name: &str) -> Option<PathBuf> {
    let subsection = format!("{SUBSECTION_PREFIX}{name}");
    let value = config.string_by(SECTION, Some(subsection.as_str().into()), PLUGIN_KEY)?;
    if value.trim().is_empty() {
        return None;
    }
    Some(gix_path::from_bstr(value).into_owned())
}

/// The names of all profiles mentioned in `config`, in order of appearance and without duplicates.
pub fn profile_names(config: &gix_config::File<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let Some(sections) = config.sections_by_name(SECTION) else {
        return names;
    };
    for section in sections {
        let Some(name) = section
            .header()
            .subsection_name()
            .and_then(|sub: &BStr| sub.strip_prefix(SUBSECTION_PREFIX.as_bytes()))
        else {
            continue;
        };
        let name = name.to_str_lossy().into_owned();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
