//! Resolved router configuration and shard naming.
//!
//! Parsing configuration files is the caller's job; a [`RouterConfig`] is
//! the already-deserialized value the router is built from.

use serde::Deserialize;
use twem_hashkit::{DEFAULT_SEARCH_AMPLIFIER, HashTag};
use twem_store::CommandName;

use crate::dispatch::Denylist;
use crate::error::RouterError;

/// Port sentinels listen on unless configured otherwise.
pub const DEFAULT_SENTINEL_PORT: u16 = 8422;

/// Everything the router needs to know about the cluster layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Total shard count.
    pub num_shards: usize,
    /// Two-character hash tag, e.g. `"{}"`.
    pub hash_tag: String,
    /// Shard name template with one integer slot, e.g. `"tdb{0:03d}"`.
    pub shard_name_format: String,
    /// Sentinel hostnames, handed to the shard connector.
    pub sentinels: Vec<String>,
    /// Port the sentinels listen on.
    pub sentinel_port: u16,
    /// Commands barred from key-routed dispatch. `None` keeps the default
    /// set of multi-key and whole-store commands.
    pub disallowed_commands: Option<Vec<String>>,
    /// Multiplier bounding the canonical key search.
    pub search_amplifier: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            num_shards: 10,
            hash_tag: "{}".to_string(),
            shard_name_format: "tdb{0:03d}".to_string(),
            sentinels: Vec::new(),
            sentinel_port: DEFAULT_SENTINEL_PORT,
            disallowed_commands: None,
            search_amplifier: DEFAULT_SEARCH_AMPLIFIER,
        }
    }
}

impl RouterConfig {
    /// Check every field that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), RouterError> {
        if self.num_shards == 0 {
            return Err(RouterError::InvalidConfig(
                "num_shards must be positive".to_string(),
            ));
        }
        self.hash_tag()?;
        self.shard_names()?;
        self.denylist()?;
        Ok(())
    }

    /// The parsed hash tag.
    pub fn hash_tag(&self) -> Result<HashTag, RouterError> {
        Ok(HashTag::parse(&self.hash_tag)?)
    }

    /// The parsed shard name template.
    pub fn shard_names(&self) -> Result<ShardNameFormat, RouterError> {
        ShardNameFormat::parse(&self.shard_name_format)
    }

    /// The effective dispatch denylist.
    pub fn denylist(&self) -> Result<Denylist, RouterError> {
        match &self.disallowed_commands {
            None => Ok(Denylist::default()),
            Some(names) => names
                .iter()
                .map(|name| {
                    name.parse::<CommandName>().map_err(|_| {
                        RouterError::InvalidConfig(format!(
                            "unknown command in disallowed_commands: {name}"
                        ))
                    })
                })
                .collect::<Result<Denylist, RouterError>>(),
        }
    }

    /// Sentinel endpoints as `host:port`.
    pub fn sentinel_addrs(&self) -> Vec<String> {
        self.sentinels
            .iter()
            .map(|host| format!("{host}:{}", self.sentinel_port))
            .collect()
    }
}

/// A shard name template with exactly one integer slot.
///
/// Accepts the Python `str.format` subset used for shard names: `{}`,
/// `{0}`, an optional width with optional zero padding (`{0:03d}`,
/// `{:3}`), and `{{` / `}}` escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardNameFormat {
    prefix: String,
    suffix: String,
    width: usize,
    zero_pad: bool,
}

impl ShardNameFormat {
    /// Parse a template such as `tdb{0:03d}`.
    pub fn parse(template: &str) -> Result<Self, RouterError> {
        let invalid =
            |why: &str| RouterError::InvalidConfig(format!("shard_name_format {template:?}: {why}"));

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut slot: Option<(bool, usize)> = None;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if slot.is_some() { &mut suffix } else { &mut prefix };
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    if slot.is_some() {
                        return Err(invalid("more than one replacement field"));
                    }
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => field.push(ch),
                            None => return Err(invalid("unterminated replacement field")),
                        }
                    }
                    slot = Some(
                        parse_field(&field)
                            .ok_or_else(|| invalid("unsupported replacement field"))?,
                    );
                }
                '}' => return Err(invalid("single '}' encountered")),
                other => out.push(other),
            }
        }

        let (zero_pad, width) = slot.ok_or_else(|| invalid("no replacement field"))?;
        Ok(Self {
            prefix,
            suffix,
            width,
            zero_pad,
        })
    }

    /// Render the name of shard `shard_num`.
    pub fn format(&self, shard_num: usize) -> String {
        let width = self.width;
        let num = if self.zero_pad {
            format!("{shard_num:0width$}")
        } else {
            format!("{shard_num:>width$}")
        };
        format!("{}{num}{}", self.prefix, self.suffix)
    }
}

/// Parse the inside of a `{...}` field: `""`, `"0"`, `":03d"`, `"0:3"`...
/// Returns `(zero_pad, width)`.
fn parse_field(field: &str) -> Option<(bool, usize)> {
    let (index, spec) = field.split_once(':').unwrap_or((field, ""));
    if !(index.is_empty() || index == "0") {
        return None;
    }
    let spec = spec.strip_suffix('d').unwrap_or(spec);
    if spec.is_empty() {
        return Some((false, 0));
    }
    let width = spec.parse().ok()?;
    Some((spec.starts_with('0'), width))
}
