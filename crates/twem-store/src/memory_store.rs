//! In-memory shard backend.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use crate::command::{Command, CommandName};
use crate::error::StoreError;
use crate::glob::glob_match;
use crate::reply::Reply;
use crate::traits::ShardConnection;

/// A value held under one key.
#[derive(Debug, Clone)]
enum Value {
    Str(Bytes),
    Hash(HashMap<Bytes, Bytes>),
    Set(HashSet<Bytes>),
    ZSet(HashMap<Bytes, f64>),
    List(VecDeque<Bytes>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Hash(_) => "hash",
            Value::Set(_) => "set",
            Value::ZSet(_) => "zset",
            Value::List(_) => "list",
        }
    }

    fn is_empty_collection(&self) -> bool {
        match self {
            Value::Str(_) => false,
            Value::Hash(h) => h.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::ZSet(z) => z.is_empty(),
            Value::List(l) => l.is_empty(),
        }
    }
}

/// Fetch (creating if absent) the value under `$key` as `Value::$variant`,
/// returning `WrongType` from the enclosing function on a type clash.
macro_rules! entry_as {
    ($map:expr, $key:expr, $variant:ident) => {
        match $map
            .entry($key.clone())
            .or_insert_with(|| Value::$variant(Default::default()))
        {
            Value::$variant(inner) => inner,
            _ => return Err(StoreError::WrongType),
        }
    };
}

/// In-memory shard backed by a `RwLock<HashMap>`.
///
/// Implements the string, hash, set, sorted-set and list commands plus
/// `KEYS`, `MGET`/`MSET` and a few whole-store commands. Cursor scans are
/// not implemented.
#[derive(Debug, Default)]
pub struct MemoryShard {
    entries: RwLock<HashMap<Bytes, Value>>,
}

impl MemoryShard {
    /// Create an empty shard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Whether the shard holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ShardConnection for MemoryShard {
    async fn execute(&self, command: &Command) -> Result<Reply, StoreError> {
        let mut map = self.entries.write().expect("lock poisoned");
        debug!(command = %command.name, args = command.args.len(), "executing on memory shard");
        apply(&mut map, command)
    }
}

fn apply(map: &mut HashMap<Bytes, Value>, cmd: &Command) -> Result<Reply, StoreError> {
    use CommandName as C;

    let args = cmd.args.as_slice();
    match cmd.name {
        C::Ping => Ok(Reply::Status("PONG".to_string())),

        // ---- strings ----
        C::Get => {
            let [key] = exact::<1>(cmd)?;
            match map.get(key) {
                None => Ok(Reply::Nil),
                Some(Value::Str(v)) => Ok(Reply::Bulk(v.clone())),
                Some(_) => Err(StoreError::WrongType),
            }
        }
        C::Set => {
            let [key, value] = exact::<2>(cmd)?;
            map.insert(key.clone(), Value::Str(value.clone()));
            Ok(Reply::ok())
        }
        C::Del => {
            at_least(cmd, 1)?;
            let removed = args.iter().filter(|k| map.remove(*k).is_some()).count();
            Ok(Reply::Integer(removed as i64))
        }
        C::Exists => {
            at_least(cmd, 1)?;
            let present = args.iter().filter(|k| map.contains_key(*k)).count();
            Ok(Reply::Integer(present as i64))
        }
        C::Incr => {
            let [key] = exact::<1>(cmd)?;
            incr_by(map, key, 1)
        }
        C::Decr => {
            let [key] = exact::<1>(cmd)?;
            incr_by(map, key, -1)
        }
        C::IncrBy => {
            let [key, delta] = exact::<2>(cmd)?;
            incr_by(map, key, parse_i64(delta)?)
        }
        C::Append => {
            let [key, suffix] = exact::<2>(cmd)?;
            let current = match map.get(key) {
                None => Bytes::new(),
                Some(Value::Str(v)) => v.clone(),
                Some(_) => return Err(StoreError::WrongType),
            };
            let mut joined = Vec::with_capacity(current.len() + suffix.len());
            joined.extend_from_slice(&current);
            joined.extend_from_slice(suffix);
            let len = joined.len();
            map.insert(key.clone(), Value::Str(Bytes::from(joined)));
            Ok(Reply::Integer(len as i64))
        }
        C::Strlen => {
            let [key] = exact::<1>(cmd)?;
            match map.get(key) {
                None => Ok(Reply::Integer(0)),
                Some(Value::Str(v)) => Ok(Reply::Integer(v.len() as i64)),
                Some(_) => Err(StoreError::WrongType),
            }
        }
        C::Type => {
            let [key] = exact::<1>(cmd)?;
            let name = map.get(key).map_or("none", Value::type_name);
            Ok(Reply::Status(name.to_string()))
        }
        C::Mget => {
            at_least(cmd, 1)?;
            let values = args
                .iter()
                .map(|k| match map.get(k) {
                    Some(Value::Str(v)) => Reply::Bulk(v.clone()),
                    _ => Reply::Nil,
                })
                .collect();
            Ok(Reply::Array(values))
        }
        C::Mset => {
            if args.is_empty() || args.len() % 2 != 0 {
                return Err(StoreError::WrongArity(cmd.name));
            }
            for pair in args.chunks_exact(2) {
                map.insert(pair[0].clone(), Value::Str(pair[1].clone()));
            }
            Ok(Reply::ok())
        }

        // ---- hashes ----
        C::Hset => {
            if args.len() < 3 || args.len() % 2 == 0 {
                return Err(StoreError::WrongArity(cmd.name));
            }
            let hash = entry_as!(map, args[0], Hash);
            let added = args[1..]
                .chunks_exact(2)
                .filter(|pair| hash.insert(pair[0].clone(), pair[1].clone()).is_none())
                .count();
            Ok(Reply::Integer(added as i64))
        }
        C::Hget => {
            let [key, field] = exact::<2>(cmd)?;
            match map.get(key) {
                None => Ok(Reply::Nil),
                Some(Value::Hash(h)) => Ok(h.get(field).cloned().map_or(Reply::Nil, Reply::Bulk)),
                Some(_) => Err(StoreError::WrongType),
            }
        }
        C::Hdel => {
            at_least(cmd, 2)?;
            let removed = match map.get_mut(&args[0]) {
                None => 0,
                Some(Value::Hash(h)) => args[1..].iter().filter(|f| h.remove(*f).is_some()).count(),
                Some(_) => return Err(StoreError::WrongType),
            };
            drop_if_empty(map, &args[0]);
            Ok(Reply::Integer(removed as i64))
        }
        C::Hgetall => {
            let [key] = exact::<1>(cmd)?;
            match map.get(key) {
                None => Ok(Reply::Array(Vec::new())),
                Some(Value::Hash(h)) => {
                    let mut fields: Vec<_> = h.iter().collect();
                    fields.sort_by(|a, b| a.0.cmp(b.0));
                    Ok(Reply::Array(
                        fields
                            .into_iter()
                            .flat_map(|(f, v)| [Reply::Bulk(f.clone()), Reply::Bulk(v.clone())])
                            .collect(),
                    ))
                }
                Some(_) => Err(StoreError::WrongType),
            }
        }

        // ---- sets ----
        C::Sadd => {
            at_least(cmd, 2)?;
            let set = entry_as!(map, args[0], Set);
            let added = args[1..].iter().filter(|m| set.insert((*m).clone())).count();
            Ok(Reply::Integer(added as i64))
        }
        C::Srem => {
            at_least(cmd, 2)?;
            let removed = match map.get_mut(&args[0]) {
                None => 0,
                Some(Value::Set(s)) => args[1..].iter().filter(|m| s.remove(*m)).count(),
                Some(_) => return Err(StoreError::WrongType),
            };
            drop_if_empty(map, &args[0]);
            Ok(Reply::Integer(removed as i64))
        }
        C::Smembers => {
            let [key] = exact::<1>(cmd)?;
            match map.get(key) {
                None => Ok(Reply::Array(Vec::new())),
                Some(Value::Set(s)) => {
                    let mut members: Vec<_> = s.iter().cloned().collect();
                    members.sort();
                    Ok(Reply::Array(members.into_iter().map(Reply::Bulk).collect()))
                }
                Some(_) => Err(StoreError::WrongType),
            }
        }
        C::Sismember => {
            let [key, member] = exact::<2>(cmd)?;
            match map.get(key) {
                None => Ok(Reply::Integer(0)),
                Some(Value::Set(s)) => Ok(Reply::Integer(i64::from(s.contains(member)))),
                Some(_) => Err(StoreError::WrongType),
            }
        }

        // ---- sorted sets ----
        C::Zadd => {
            if args.len() < 3 || args.len() % 2 == 0 {
                return Err(StoreError::WrongArity(cmd.name));
            }
            let scored = args[1..]
                .chunks_exact(2)
                .map(|pair| Ok((parse_f64(&pair[0])?, pair[1].clone())))
                .collect::<Result<Vec<_>, StoreError>>()?;
            let zset = entry_as!(map, args[0], ZSet);
            let added = scored
                .into_iter()
                .filter(|(score, member)| zset.insert(member.clone(), *score).is_none())
                .count();
            Ok(Reply::Integer(added as i64))
        }
        C::Zrem => {
            at_least(cmd, 2)?;
            let removed = match map.get_mut(&args[0]) {
                None => 0,
                Some(Value::ZSet(z)) => args[1..].iter().filter(|m| z.remove(*m).is_some()).count(),
                Some(_) => return Err(StoreError::WrongType),
            };
            drop_if_empty(map, &args[0]);
            Ok(Reply::Integer(removed as i64))
        }
        C::Zscore => {
            let [key, member] = exact::<2>(cmd)?;
            match map.get(key) {
                None => Ok(Reply::Nil),
                Some(Value::ZSet(z)) => Ok(z.get(member).map_or(Reply::Nil, |s| format_score(*s))),
                Some(_) => Err(StoreError::WrongType),
            }
        }
        C::Zcard => {
            let [key] = exact::<1>(cmd)?;
            match map.get(key) {
                None => Ok(Reply::Integer(0)),
                Some(Value::ZSet(z)) => Ok(Reply::Integer(z.len() as i64)),
                Some(_) => Err(StoreError::WrongType),
            }
        }
        C::Zrange => {
            let with_scores = match args.len() {
                3 => false,
                4 if args[3].eq_ignore_ascii_case(b"WITHSCORES") => true,
                4 => return Err(StoreError::InvalidArgument("syntax error".to_string())),
                _ => return Err(StoreError::WrongArity(cmd.name)),
            };
            let (start, stop) = (parse_i64(&args[1])?, parse_i64(&args[2])?);
            let zset = match map.get(&args[0]) {
                None => return Ok(Reply::Array(Vec::new())),
                Some(Value::ZSet(z)) => z,
                Some(_) => return Err(StoreError::WrongType),
            };
            let mut ordered: Vec<(&Bytes, f64)> = zset.iter().map(|(m, s)| (m, *s)).collect();
            ordered.sort_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.0.cmp(b.0))
            });
            let Some((first, last)) = normalize_range(start, stop, ordered.len()) else {
                return Ok(Reply::Array(Vec::new()));
            };
            let mut out = Vec::new();
            for (member, score) in &ordered[first..=last] {
                out.push(Reply::Bulk((*member).clone()));
                if with_scores {
                    out.push(format_score(*score));
                }
            }
            Ok(Reply::Array(out))
        }

        // ---- lists ----
        C::Lpush | C::Rpush => {
            at_least(cmd, 2)?;
            let list = entry_as!(map, args[0], List);
            for value in &args[1..] {
                if cmd.name == C::Lpush {
                    list.push_front(value.clone());
                } else {
                    list.push_back(value.clone());
                }
            }
            Ok(Reply::Integer(list.len() as i64))
        }
        C::Lrange => {
            let [key, start, stop] = exact::<3>(cmd)?;
            let (start, stop) = (parse_i64(start)?, parse_i64(stop)?);
            let list = match map.get(key) {
                None => return Ok(Reply::Array(Vec::new())),
                Some(Value::List(l)) => l,
                Some(_) => return Err(StoreError::WrongType),
            };
            let items = match normalize_range(start, stop, list.len()) {
                Some((first, last)) => list
                    .range(first..=last)
                    .cloned()
                    .map(Reply::Bulk)
                    .collect(),
                None => Vec::new(),
            };
            Ok(Reply::Array(items))
        }
        C::Llen => {
            let [key] = exact::<1>(cmd)?;
            match map.get(key) {
                None => Ok(Reply::Integer(0)),
                Some(Value::List(l)) => Ok(Reply::Integer(l.len() as i64)),
                Some(_) => Err(StoreError::WrongType),
            }
        }

        // ---- whole store ----
        C::Keys => {
            let [pattern] = exact::<1>(cmd)?;
            let mut keys: Vec<Bytes> = map
                .keys()
                .filter(|k| glob_match(pattern, k))
                .cloned()
                .collect();
            keys.sort();
            Ok(Reply::Array(keys.into_iter().map(Reply::Bulk).collect()))
        }
        C::Dbsize => Ok(Reply::Integer(map.len() as i64)),
        C::Randomkey => Ok(map.keys().next().cloned().map_or(Reply::Nil, Reply::Bulk)),
        C::Flushdb | C::Flushall => {
            map.clear();
            Ok(Reply::ok())
        }

        C::Scan | C::Hscan | C::Sscan | C::Zscan => Err(StoreError::UnsupportedCommand(cmd.name)),
    }
}

/// Borrow exactly `N` arguments or fail with `WrongArity`.
fn exact<const N: usize>(cmd: &Command) -> Result<&[Bytes; N], StoreError> {
    cmd.args
        .as_slice()
        .try_into()
        .map_err(|_| StoreError::WrongArity(cmd.name))
}

fn at_least(cmd: &Command, n: usize) -> Result<(), StoreError> {
    if cmd.args.len() < n {
        return Err(StoreError::WrongArity(cmd.name));
    }
    Ok(())
}

fn incr_by(map: &mut HashMap<Bytes, Value>, key: &Bytes, delta: i64) -> Result<Reply, StoreError> {
    let current = match map.get(key) {
        None => 0,
        Some(Value::Str(v)) => parse_i64(v)?,
        Some(_) => return Err(StoreError::WrongType),
    };
    let next = current.checked_add(delta).ok_or_else(|| {
        StoreError::InvalidArgument("increment or decrement would overflow".to_string())
    })?;
    map.insert(key.clone(), Value::Str(Bytes::from(next.to_string())));
    Ok(Reply::Integer(next))
}

/// Remove `key` if it now holds an empty collection.
fn drop_if_empty(map: &mut HashMap<Bytes, Value>, key: &Bytes) {
    if map.get(key).is_some_and(Value::is_empty_collection) {
        map.remove(key);
    }
}

fn parse_i64(raw: &[u8]) -> Result<i64, StoreError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::InvalidArgument("value is not an integer or out of range".to_string()))
}

fn parse_f64(raw: &[u8]) -> Result<f64, StoreError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|f| !f.is_nan())
        .ok_or_else(|| StoreError::InvalidArgument("value is not a valid float".to_string()))
}

fn format_score(score: f64) -> Reply {
    Reply::Bulk(Bytes::from(score.to_string()))
}

/// Resolve Redis-style inclusive `start..=stop` indices (negative counts
/// from the end) against a collection of `len` items.
fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}
