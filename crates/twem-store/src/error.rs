//! Error types for shard command execution.

use crate::command::CommandName;

/// Errors returned by a shard, or by decoding what it returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The command name is not part of the known command surface.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The backend does not implement this command.
    #[error("command {0} is not supported by this shard backend")]
    UnsupportedCommand(CommandName),

    /// Wrong number of arguments for the command.
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(CommandName),

    /// The key holds a value of a different type.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// An argument could not be parsed or is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The reply did not have the shape the caller asked for.
    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        /// Reply kind the caller wanted.
        expected: &'static str,
        /// Reply kind that arrived.
        got: &'static str,
    },

    /// The connection to the shard failed.
    #[error("connection error: {0}")]
    Connection(String),
}
