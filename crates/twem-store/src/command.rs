//! The command surface a router can send to a shard.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::StoreError;

macro_rules! define_commands {
    ($($(#[$meta:meta])* $variant:ident => $name:literal,)*) => {
        /// Every store command known to the router.
        ///
        /// Names parse case-insensitively and render in upper case.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum CommandName {
            $($(#[$meta])* $variant,)*
        }

        impl CommandName {
            /// All command names, in declaration order.
            pub const ALL: &'static [CommandName] = &[$(CommandName::$variant,)*];

            /// The wire name of the command.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(CommandName::$variant => $name,)*
                }
            }
        }

        impl FromStr for CommandName {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().as_str() {
                    $($name => Ok(CommandName::$variant),)*
                    _ => Err(StoreError::UnknownCommand(s.to_string())),
                }
            }
        }
    };
}

define_commands! {
    // Strings
    Get => "GET",
    Set => "SET",
    Del => "DEL",
    Exists => "EXISTS",
    Incr => "INCR",
    IncrBy => "INCRBY",
    Decr => "DECR",
    Append => "APPEND",
    Strlen => "STRLEN",
    Type => "TYPE",
    // Hashes
    Hset => "HSET",
    Hget => "HGET",
    Hdel => "HDEL",
    Hgetall => "HGETALL",
    // Sets
    Sadd => "SADD",
    Srem => "SREM",
    Smembers => "SMEMBERS",
    Sismember => "SISMEMBER",
    // Sorted sets
    Zadd => "ZADD",
    Zrem => "ZREM",
    Zscore => "ZSCORE",
    Zcard => "ZCARD",
    Zrange => "ZRANGE",
    // Lists
    Lpush => "LPUSH",
    Rpush => "RPUSH",
    Lrange => "LRANGE",
    Llen => "LLEN",
    // Multi-key and whole-store
    Mget => "MGET",
    Mset => "MSET",
    Keys => "KEYS",
    Scan => "SCAN",
    Hscan => "HSCAN",
    Sscan => "SSCAN",
    Zscan => "ZSCAN",
    Flushdb => "FLUSHDB",
    Flushall => "FLUSHALL",
    Dbsize => "DBSIZE",
    Randomkey => "RANDOMKEY",
    Ping => "PING",
}

impl CommandName {
    /// Whether the command spans several keys or a whole store, so its
    /// first argument does not decide where it belongs.
    pub fn is_multi_key(&self) -> bool {
        matches!(
            self,
            CommandName::Mget
                | CommandName::Mset
                | CommandName::Keys
                | CommandName::Scan
                | CommandName::Hscan
                | CommandName::Sscan
                | CommandName::Zscan
                | CommandName::Flushdb
                | CommandName::Flushall
                | CommandName::Dbsize
                | CommandName::Randomkey
                | CommandName::Ping
        )
    }

    /// Whether every argument is a key (`DEL k1 k2 ...`), so the command
    /// only belongs to one shard when all of its keys do.
    pub fn is_variadic_key(&self) -> bool {
        matches!(self, CommandName::Del | CommandName::Exists)
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command name plus its arguments, key first where there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Which command to run.
    pub name: CommandName,
    /// Raw arguments.
    pub args: Vec<Bytes>,
}

impl Command {
    /// Start a command with no arguments.
    pub fn new(name: CommandName) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    /// Append several arguments.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args
            .extend(args.into_iter().map(|a| Bytes::copy_from_slice(a.as_ref())));
        self
    }

    /// The first argument, which is the key for single-key commands.
    pub fn first_key(&self) -> Option<&Bytes> {
        self.args.first()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}
