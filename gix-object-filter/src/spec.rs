//! Parse filter specifications of the form `<mechanism>:<name>=<argument>`.

use std::fmt;

/// How the filter implementation named in a specification is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mechanism {
    /// Look the name up in the compile-time extension table. Spelled `extension` or `static`.
    Extension,
    /// Resolve the name through `filter.profile:<name>.plugin`. Spelled `profile` or `dynamic`.
    Profile,
}

impl Mechanism {
    /// Parse the mechanism prefix of a specification.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Some(match prefix {
            "extension" | "static" => Mechanism::Extension,
            "profile" | "dynamic" => Mechanism::Profile,
            _ => return None,
        })
    }

    /// The canonical prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mechanism::Extension => "extension",
            Mechanism::Profile => "profile",
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned by [`parse()`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("filter specification '{spec}' lacks a '<mechanism>:' prefix")]
    MissingMechanism { spec: String },
    #[error("unknown filter mechanism '{mechanism}', expected 'extension' or 'profile'")]
    UnknownMechanism { mechanism: String },
    #[error("filter specification '{spec}' does not name a filter")]
    MissingName { spec: String },
}

/// A parsed filter specification, borrowing from its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spec<'a> {
    /// How to find the filter.
    pub mechanism: Mechanism,
    /// The name of the filter.
    pub name: &'a str,
    /// Everything after the first `=`, passed verbatim to the filter. Empty if there is no `=`.
    pub argument: &'a str,
}

impl fmt::Display for Spec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.mechanism, self.name, self.argument)
    }
}

/// Parse `spec` into its mechanism, name and argument.
pub fn parse(spec: &str) -> Result<Spec<'_>, Error> {
    let (mechanism, rest) = spec.split_once(':').ok_or_else(|| Error::MissingMechanism { spec: spec.into() })?;
    let mechanism = Mechanism::from_prefix(mechanism).ok_or_else(|| Error::UnknownMechanism {
        mechanism: mechanism.into(),
    })?;
    let (name, argument) = rest.split_once('=').unwrap_or((rest, ""));
    if name.is_empty() {
        return Err(Error::MissingName { spec: spec.into() });
    }
    Ok(Spec {
        mechanism,
        name,
        argument,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extension_with_argument() {
        let spec = parse("extension:rand=5").unwrap();
        assert_eq!(spec.mechanism, Mechanism::Extension);
        assert_eq!(spec.name, "rand");
        assert_eq!(spec.argument, "5");
    }

    #[test]
    fn aliases_select_the_same_mechanism() {
        assert_eq!(parse("static:rand=1").unwrap().mechanism, Mechanism::Extension);
        assert_eq!(parse("dynamic:rand=1").unwrap().mechanism, Mechanism::Profile);
        assert_eq!(parse("profile:rand=1").unwrap().to_string(), "profile:rand=1");
    }

    #[test]
    fn argument_is_everything_after_first_equals() {
        let spec = parse("profile:sparse=path=a=b").unwrap();
        assert_eq!(spec.name, "sparse");
        assert_eq!(spec.argument, "path=a=b");
    }

    #[test]
    fn missing_argument_is_empty() {
        let spec = parse("extension:all").unwrap();
        assert_eq!(spec.name, "all");
        assert_eq!(spec.argument, "");
    }

    #[test]
    fn malformed_specs_are_rejected() {
        assert!(matches!(parse("rand=5"), Err(Error::MissingMechanism { .. })));
        assert_eq!(
            parse("blob:none"),
            Err(Error::UnknownMechanism {
                mechanism: "blob".into()
            })
        );
        assert!(matches!(parse("extension:=5"), Err(Error::MissingName { .. })));
        assert!(matches!(parse("profile:"), Err(Error::MissingName { .. })));
    }
}
