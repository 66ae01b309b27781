//! Published Merkle roots and their provenance.

use serde::{Deserialize, Serialize};

/// Where a [`MerkleRoot`] came from. Set by the client, never the server:
/// `Arweave` means it was fetched independently from the publication
/// network; `Pangea` means it is a server assertion used as a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootSource {
    Arweave,
    Pangea,
}

/// A tree root at a given size, with the consistency proof from the
/// previous published size (if any) to this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleRoot {
    pub size: u64,
    pub root_hash: String,
    pub tree_name: String,
    #[serde(default)]
    pub consistency_proof: Vec<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_root_source")]
    pub source: RootSource,
}

fn default_root_source() -> RootSource {
    RootSource::Pangea
}
