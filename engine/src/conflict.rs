//! Conflict detection and resolution between client and server versions
//! of the same record.
//!
//! A conflict exists only when both sides changed since the last sync
//! checkpoint. Resolution is a pure function of the conflict and the
//! chosen strategy; it never fails.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Records that carry a last-modified timestamp.
pub trait Timestamped {
    /// Milliseconds since epoch of the last modification.
    fn updated_at(&self) -> Timestamp;
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn updated_at(&self) -> Timestamp {
        (**self).updated_at()
    }
}

/// Strategy for choosing between diverged versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    /// Server version always wins (default)
    #[default]
    ServerWins,
    /// Client version always wins
    ClientWins,
    /// Strictly later timestamp wins; ties go to the server
    LastWriteWins,
    /// Server version is kept until a person merges the two
    Manual,
    /// Any strategy name this engine does not know; resolves to the server
    #[serde(other)]
    Unrecognized,
}

impl std::str::FromStr for ConflictStrategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "server-wins" => ConflictStrategy::ServerWins,
            "client-wins" => ConflictStrategy::ClientWins,
            "last-write-wins" => ConflictStrategy::LastWriteWins,
            "manual" => ConflictStrategy::Manual,
            _ => ConflictStrategy::Unrecognized,
        })
    }
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictStrategy::ServerWins => write!(f, "server-wins"),
            ConflictStrategy::ClientWins => write!(f, "client-wins"),
            ConflictStrategy::LastWriteWins => write!(f, "last-write-wins"),
            ConflictStrategy::Manual => write!(f, "manual"),
            ConflictStrategy::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Which side a resolution picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Client,
    Server,
}

/// Both versions of a diverged record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictInfo<T> {
    pub client_data: T,
    pub server_data: T,
    pub client_timestamp: Timestamp,
    pub server_timestamp: Timestamp,
}

impl<T: Timestamped> ConflictInfo<T> {
    /// Build a conflict, taking timestamps from the records themselves.
    pub fn new(client_data: T, server_data: T) -> Self {
        Self {
            client_timestamp: client_data.updated_at(),
            server_timestamp: server_data.updated_at(),
            client_data,
            server_data,
        }
    }
}

/// True iff both sides were modified after `last_synced_at`.
///
/// If only one side changed this is not a conflict; the caller should take
/// the changed side.
pub fn detect_conflict<T: Timestamped>(client: &T, server: &T, last_synced_at: Timestamp) -> bool {
    server.updated_at() > last_synced_at && client.updated_at() > last_synced_at
}

/// The side `strategy` picks for `conflict`.
pub fn winning_side<T>(conflict: &ConflictInfo<T>, strategy: ConflictStrategy) -> Side {
    match strategy {
        ConflictStrategy::ClientWins => Side::Client,
        ConflictStrategy::LastWriteWins if conflict.client_timestamp > conflict.server_timestamp => {
            Side::Client
        }
        ConflictStrategy::LastWriteWins
        | ConflictStrategy::ServerWins
        | ConflictStrategy::Manual
        | ConflictStrategy::Unrecognized => Side::Server,
    }
}

/// Resolve a conflict to the winning version.
///
/// `Manual` returns the server version; callers are expected to offer the
/// user a merge separately.
pub fn resolve_conflict<T>(conflict: ConflictInfo<T>, strategy: ConflictStrategy) -> T {
    match winning_side(&conflict, strategy) {
        Side::Client => conflict.client_data,
        Side::Server => conflict.server_data,
    }
}
