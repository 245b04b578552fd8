//! External collaborators consumed by ingestion.
//!
//! The store never computes a metric or looks up chat metadata itself. Hosts
//! plug those in through the two traits below.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Legacy boards whose metric lives under a different lookup key.
const METRIC_ALIASES: &[(&str, &str)] = &[
    ("ajpk_stats_highscore", "ajpk_stats_highscore_nocache"),
    ("ajtr_stats_wins", "ajtr_stats_wins_nocache"),
    ("ajtr_stats_losses", "ajtr_stats_losses_nocache"),
    ("ajtr_stats_gamesplayed", "ajtr_stats_gamesplayer_nocache"),
];

/// The key to resolve for `board`, after applying the alias table.
pub fn metric_key(board: &str) -> &str {
    METRIC_ALIASES
        .iter()
        .find(|(from, _)| *from == board)
        .map(|(_, to)| *to)
        .unwrap_or(board)
}

/// The tracked subject of a board.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityRef {
    /// Stable identity, the primary key of every board row.
    pub id: Uuid,
    /// Current display name, cached on the row.
    pub name: String,
}

impl EntityRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Presentation metadata cached on a board row.
///
/// Best-effort: it is refreshed on every ingestion and may be stale in between.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayMeta {
    pub name: String,
    pub prefix: String,
    pub suffix: String,
}

impl DisplayMeta {
    /// Metadata with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Collect metadata for `entity` from an identity provider.
    pub fn for_entity(entity: &EntityRef, identity: &dyn IdentityProvider) -> Self {
        Self {
            name: entity.name.clone(),
            prefix: identity.prefix(entity),
            suffix: identity.suffix(entity),
        }
    }
}

/// Failure reported by a [`MetricResolver`].
#[derive(Debug, Error)]
#[error("metric resolver failed for {key}: {reason}")]
pub struct ResolveError {
    pub key: String,
    pub reason: String,
}

/// Resolves the raw metric for an entity.
#[async_trait]
pub trait MetricResolver: Send + Sync {
    /// Resolve `key` for `entity`, returning the metric as text.
    ///
    /// The text may contain thousands separators; anything that does not
    /// parse as a number is treated as "no value".
    async fn resolve(&self, entity: &EntityRef, key: &str) -> Result<String, ResolveError>;
}

/// Supplies presentation metadata for an entity.
pub trait IdentityProvider: Send + Sync {
    fn prefix(&self, entity: &EntityRef) -> String;

    fn suffix(&self, entity: &EntityRef) -> String;
}

/// Identity provider for hosts without chat metadata.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn prefix(&self, _entity: &EntityRef) -> String {
        String::new()
    }

    fn suffix(&self, _entity: &EntityRef) -> String {
        String::new()
    }
}
