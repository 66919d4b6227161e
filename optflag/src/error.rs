#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("bad flag syntax: {0}")]
    BadSyntax(String),

    #[error("flag provided but not defined: -{0}")]
    Unknown(String),

    #[error("flag needs an argument: -{0}")]
    MissingValue(String),

    #[error("invalid value {value:?} for flag -{name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("invalid boolean value {value:?} for -{name}: {reason}")]
    InvalidBoolean {
        name: String,
        value: String,
        reason: String,
    },

    #[error("no such flag -{0}")]
    NoSuchFlag(String),

    #[error("subcommand provided but not defined: {0}")]
    UnknownSubcommand(String),

    #[error("{0}")]
    Callback(String),

    #[error("flag: help requested")]
    HelpRequested,

    #[error("flag: version requested")]
    VersionRequested,
}

impl Error {
    /// True for the `-h`/`-V` outcomes, which are requests rather than
    /// failures.
    pub fn is_help_or_version(&self) -> bool {
        matches!(self, Error::HelpRequested | Error::VersionRequested)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(Error::BadSyntax("---x".into()).to_string(), "bad flag syntax: ---x");
        assert_eq!(
            Error::Unknown("z".into()).to_string(),
            "flag provided but not defined: -z"
        );
        assert_eq!(
            Error::MissingValue("n".into()).to_string(),
            "flag needs an argument: -n"
        );
        let err = Error::InvalidValue {
            name: "int".into(),
            value: "x1".into(),
            reason: "parsing \"x1\": invalid syntax".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"x1\" for flag -int: parsing \"x1\": invalid syntax"
        );
        assert!(Error::HelpRequested.is_help_or_version());
        assert!(Error::VersionRequested.is_help_or_version());
        assert!(!Error::NoSuchFlag("q".into()).is_help_or_version());
    }
}
