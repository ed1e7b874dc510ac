//! Values returned by a shard.

use bytes::Bytes;

use crate::error::StoreError;

/// A shard's answer to one command, shaped like a RESP2 reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Missing value.
    Nil,
    /// Simple status line such as `OK` or `PONG`.
    Status(String),
    /// Signed integer.
    Integer(i64),
    /// Binary-safe string.
    Bulk(Bytes),
    /// Ordered list of replies.
    Array(Vec<Reply>),
}

impl Reply {
    /// The `OK` status.
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    /// Short name of the reply kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Nil => "nil",
            Reply::Status(_) => "status",
            Reply::Integer(_) => "integer",
            Reply::Bulk(_) => "bulk",
            Reply::Array(_) => "array",
        }
    }

    /// A bulk string, or `None` for nil.
    pub fn into_optional_bulk(self) -> Result<Option<Bytes>, StoreError> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Bulk(b) => Ok(Some(b)),
            other => Err(unexpected("bulk or nil", &other)),
        }
    }

    /// A bulk string.
    pub fn into_bulk(self) -> Result<Bytes, StoreError> {
        match self {
            Reply::Bulk(b) => Ok(b),
            other => Err(unexpected("bulk", &other)),
        }
    }

    /// An integer.
    pub fn into_integer(self) -> Result<i64, StoreError> {
        match self {
            Reply::Integer(n) => Ok(n),
            other => Err(unexpected("integer", &other)),
        }
    }

    /// A status line.
    pub fn into_status(self) -> Result<String, StoreError> {
        match self {
            Reply::Status(s) => Ok(s),
            other => Err(unexpected("status", &other)),
        }
    }

    /// An array of replies.
    pub fn into_array(self) -> Result<Vec<Reply>, StoreError> {
        match self {
            Reply::Array(items) => Ok(items),
            other => Err(unexpected("array", &other)),
        }
    }

    /// An array of bulk strings.
    pub fn into_bulk_array(self) -> Result<Vec<Bytes>, StoreError> {
        self.into_array()?
            .into_iter()
            .map(Reply::into_bulk)
            .collect()
    }

    /// An array of bulk strings where entries may be nil (MGET).
    pub fn into_optional_bulk_array(self) -> Result<Vec<Option<Bytes>>, StoreError> {
        self.into_array()?
            .into_iter()
            .map(Reply::into_optional_bulk)
            .collect()
    }
}

impl From<Bytes> for Reply {
    fn from(b: Bytes) -> Self {
        Reply::Bulk(b)
    }
}

impl From<i64> for Reply {
    fn from(n: i64) -> Self {
        Reply::Integer(n)
    }
}

fn unexpected(expected: &'static str, got: &Reply) -> StoreError {
    StoreError::UnexpectedReply {
        expected,
        got: got.kind(),
    }
}
