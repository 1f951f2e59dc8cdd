use std::io;

/// Errors surfaced by the store, the calendar engine and the CLI.
///
/// Nothing in the crate retries or recovers from these; the binary prints
/// the message and exits non-zero.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Input was well-formed but not acceptable, e.g. a hangout with no
    /// participants or a filter naming a friend that does not exist.
    #[error("{0}")]
    Validation(String),

    /// A date expression could not be resolved to a calendar date.
    #[error("could not understand date '{input}'")]
    DateParse { input: String },

    /// The data directory could not be read or written, or holds data that
    /// does not deserialize.
    #[error("storage error: {0}")]
    Storage(#[from] io::Error),

    /// Output could not be written, e.g. a closed stdout.
    #[error("could not write output: {0}")]
    Output(#[source] io::Error),

    /// The operation exists on the command line but is deliberately not
    /// carried out.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn unknown_friend(name: &str) -> Self {
        Error::Validation(format!("no friend named '{name}'"))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
