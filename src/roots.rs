//! The published-roots cache and the external root-publication network
//! (Arweave) client that populates it.
//!
//! The cache maps tree size to a resolved [`MerkleRoot`] (or nothing, if
//! every source was tried and came back empty). It is private to one
//! client instance and lives for the duration of a search session —
//! nothing here persists across instances.

use crate::types::{MerkleRoot, RootSource};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const ARWEAVE_BASE_URL: &str = "https://arweave.net";

/// Published-roots cache, keyed by tree size.
#[derive(Debug, Default, Clone)]
pub struct RootsCache {
    roots: HashMap<u64, Option<MerkleRoot>>,
}

impl RootsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, size: u64) -> Option<&MerkleRoot> {
        self.roots.get(&size).and_then(|entry| entry.as_ref())
    }

    pub fn contains(&self, size: u64) -> bool {
        self.roots.contains_key(&size)
    }

    pub fn insert(&mut self, size: u64, root: MerkleRoot) {
        self.roots.insert(size, Some(root));
    }

    /// Record that `size` could not be resolved from any permitted source.
    pub fn mark_absent(&mut self, size: u64) {
        self.roots.entry(size).or_insert(None);
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// The set of tree sizes `update_published_roots` needs to resolve for a
/// batch of returned events plus the current root: `leaf_index + 1` for
/// every event, `leaf_index` too when `leaf_index > 0`, and the result
/// root's own size.
pub fn required_sizes(events: &[crate::types::ReturnedEvent], current_root_size: u64) -> HashSet<u64> {
    let mut sizes = HashSet::new();
    for event in events {
        sizes.insert(event.leaf_index + 1);
        if event.leaf_index > 0 {
            sizes.insert(event.leaf_index);
        }
    }
    sizes.insert(current_root_size);
    sizes
}

/// Thin client over the Arweave GraphQL endpoint used to discover
/// independently-published roots for a tree. Queried on a different
/// origin than the audit server, so it does not go through the
/// [`Transport`](crate::transport::Transport) abstraction.
pub struct ArweaveClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for ArweaveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArweaveClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: ARWEAVE_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url)
    }

    fn transaction_url(&self, id: &str) -> String {
        format!("{}/{}/", self.base_url, id)
    }

    /// Query the publication network for the given tree sizes, returning
    /// whatever it could resolve. A whole-query failure (network error,
    /// non-2xx, malformed JSON) returns an empty map rather than
    /// propagating — the caller falls back to server-sourced roots.
    /// Individual edges that fail to decode are skipped and logged.
    pub async fn published_roots(&self, tree_name: &str, sizes: &[u64]) -> HashMap<u64, MerkleRoot> {
        if sizes.is_empty() {
            return HashMap::new();
        }

        tracing::debug!(
            tree_name,
            sizes = ?sizes,
            "querying arweave for published roots"
        );

        let query = build_query(tree_name, sizes);

        let response = match self
            .http
            .post(self.graphql_url())
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "error querying arweave");
                return HashMap::new();
            }
        };

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "arweave returned non-success status");
            return HashMap::new();
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "malformed arweave response body");
                return HashMap::new();
            }
        };

        let edges = body
            .pointer("/data/transactions/edges")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut resolved = HashMap::new();
        for edge in edges {
            let tree_size = edge
                .pointer("/node/tags")
                .and_then(Value::as_array)
                .and_then(|tags| {
                    tags.iter().find_map(|tag| {
                        if tag.get("name").and_then(Value::as_str) == Some("tree_size") {
                            tag.get("value").and_then(Value::as_str)
                        } else {
                            None
                        }
                    })
                })
                .map(str::to_string);

            let node_id = edge.pointer("/node/id").and_then(Value::as_str).map(str::to_string);

            let (Some(tree_size), Some(node_id)) = (tree_size, node_id) else {
                tracing::error!("arweave edge missing tree_size tag or id");
                continue;
            };

            match self.fetch_root(&node_id).await {
                FetchOutcome::Root(mut root) => {
                    root.source = RootSource::Arweave;
                    if let Ok(size) = tree_size.parse::<u64>() {
                        resolved.insert(size, root);
                    }
                }
                FetchOutcome::Pending => {
                    tracing::warn!(tree_size, "published root is pending");
                }
                FetchOutcome::Error(msg) => {
                    tracing::error!(tree_size, error = %msg, "error fetching published root");
                }
            }
        }

        resolved
    }

    async fn fetch_root(&self, node_id: &str) -> FetchOutcome {
        let url = self.transaction_url(node_id);
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return FetchOutcome::Error(e.to_string()),
        };

        if !response.status().is_success() {
            return FetchOutcome::Error(format!("HTTP {}", response.status()));
        }

        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => return FetchOutcome::Error(e.to_string()),
        };

        if text == "Pending" {
            return FetchOutcome::Pending;
        }

        match serde_json::from_str::<MerkleRoot>(&text) {
            Ok(root) => FetchOutcome::Root(root),
            Err(e) => FetchOutcome::Error(e.to_string()),
        }
    }
}

enum FetchOutcome {
    Root(MerkleRoot),
    Pending,
    Error(String),
}

fn build_query(tree_name: &str, sizes: &[u64]) -> String {
    let sizes_list = sizes
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"
    {{
        transactions(
          tags: [
                {{
                    name: "tree_size"
                    values: [{sizes_list}]
                }},
                {{
                    name: "tree_name"
                    values: ["{tree_name}"]
                }}
            ]
        ) {{
            edges {{
                node {{
                    id
                    tags {{
                        name
                        value
                    }}
                }}
            }}
        }}
    }}
    "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;

    fn returned(leaf_index: u64) -> crate::types::ReturnedEvent {
        crate::types::ReturnedEvent {
            event: Event::default(),
            hash: "00".repeat(32),
            leaf_index,
            membership_proof: String::new(),
            published_at: None,
            received_at: None,
        }
    }

    #[test]
    fn required_sizes_includes_prefix_and_prior_size() {
        let events = vec![returned(0), returned(5)];
        let sizes = required_sizes(&events, 10);
        assert!(sizes.contains(&1)); // leaf_index 0 -> size 1, no prior size
        assert!(sizes.contains(&6)); // leaf_index 5 -> size 6
        assert!(sizes.contains(&5)); // prior size for leaf_index 5
        assert!(!sizes.contains(&0)); // leaf_index 0 has no prior size
        assert!(sizes.contains(&10)); // current root size
    }

    #[test]
    fn cache_distinguishes_absent_from_unqueried() {
        let mut cache = RootsCache::new();
        assert!(!cache.contains(3));
        cache.mark_absent(3);
        assert!(cache.contains(3));
        assert!(cache.get(3).is_none());
    }

    #[test]
    fn build_query_embeds_sizes_and_tree_name() {
        let q = build_query("my-tree", &[1, 2]);
        assert!(q.contains("\"1\""));
        assert!(q.contains("\"2\""));
        assert!(q.contains("my-tree"));
    }
}
