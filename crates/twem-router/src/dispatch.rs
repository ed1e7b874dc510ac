//! Key-routed dispatch of single-key commands.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};
use twem_store::{Command, CommandName, Reply};

use crate::error::RouterError;
use crate::registry::ShardRegistry;

/// Commands that must not be sent to whichever shard their first argument
/// happens to hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist(BTreeSet<CommandName>);

impl Denylist {
    /// A denylist containing exactly `names`.
    pub fn new(names: impl IntoIterator<Item = CommandName>) -> Self {
        Self(names.into_iter().collect())
    }

    /// Whether `name` is barred from key-routed dispatch.
    pub fn contains(&self, name: CommandName) -> bool {
        self.0.contains(&name)
    }

    /// The barred commands, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = CommandName> + '_ {
        self.0.iter().copied()
    }
}

impl Default for Denylist {
    /// Every multi-key or whole-store command.
    fn default() -> Self {
        Self::new(
            CommandName::ALL
                .iter()
                .copied()
                .filter(CommandName::is_multi_key),
        )
    }
}

impl FromIterator<CommandName> for Denylist {
    fn from_iter<I: IntoIterator<Item = CommandName>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Forwards single-key commands to the shard that owns the key.
///
/// The command goes out unmodified, key included, and the shard's reply or
/// error comes back unmodified.
pub struct CommandDispatcher {
    registry: Arc<ShardRegistry>,
    denylist: Denylist,
}

impl CommandDispatcher {
    /// Create a dispatcher over `registry`.
    pub fn new(registry: Arc<ShardRegistry>, denylist: Denylist) -> Self {
        Self { registry, denylist }
    }

    /// The active denylist.
    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    /// Resolve which shard `command` belongs to without running it.
    pub fn route(&self, command: &Command) -> Result<usize, RouterError> {
        if self.denylist.contains(command.name) {
            warn!(command = %command.name, "rejected key-routed dispatch of denylisted command");
            return Err(RouterError::UnsupportedSharded {
                command: command.name,
            });
        }
        let key = command
            .first_key()
            .ok_or(RouterError::MissingKey(command.name))?;
        let shard_num = self.shard_of(key)?;

        if command.name.is_variadic_key() {
            for key in &command.args[1..] {
                if self.shard_of(key)? != shard_num {
                    warn!(command = %command.name, "rejected key-routed dispatch spanning shards");
                    return Err(RouterError::CrossShardKeys {
                        command: command.name,
                    });
                }
            }
        }
        Ok(shard_num)
    }

    fn shard_of(&self, key: &[u8]) -> Result<usize, RouterError> {
        let key = std::str::from_utf8(key).map_err(|_| RouterError::InvalidKey)?;
        Ok(self.registry.keyspace().shard_num_by_key(key))
    }

    /// Run `command` on the shard its key routes to.
    pub async fn invoke(&self, command: &Command) -> Result<Reply, RouterError> {
        let shard_num = self.route(command)?;
        debug!(command = %command.name, shard_num, "dispatching");
        Ok(self.registry.shard(shard_num).execute(command).await?)
    }
}
