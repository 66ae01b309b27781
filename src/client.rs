//! The stateful façade: submits `log`/`search`/`root` requests, manages
//! the published-roots cache, applies verification to returned events,
//! and exposes pagination.

use crate::config::Config;
use crate::error::{AuditError, Result, VerificationKind};
use crate::hash::decode_hex;
use crate::proof::{decode_consistency_proof, decode_membership_proof};
use crate::roots::{required_sizes, ArweaveClient, RootsCache};
use crate::transport::{RawResponse, ReqwestTransport, Transport};
use crate::types::{
    EventVerification, LogResult, MerkleRoot, RawSearchResult, ReturnedEvent, RootSource, ServerResponse,
    VerifiedEvent,
};
use crate::verifier::{verify_consistency, verify_membership};
use serde_json::{json, Value};

/// Parameters for a `search` call.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: String,
    pub sources: Vec<String>,
    pub page_size: u32,
    pub start: Option<String>,
    pub end: Option<String>,
    pub last: Option<String>,
    pub verify: bool,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            sources: Vec::new(),
            page_size: 20,
            start: None,
            end: None,
            last: None,
            verify: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

/// The result of a `search` call: the events (each with its verification
/// outcome), the root they were checked against (if the server returned
/// one), and enough of the original request to page forward.
pub struct SearchWrapper {
    params: SearchParams,
    pub events: Vec<VerifiedEvent>,
    pub root: Option<MerkleRoot>,
    pub last: String,
    pub cache: RootsCache,
}

impl SearchWrapper {
    /// Number of events seen across this and all prior pages, per the
    /// `last` field's `"<count>|<total>|<opaque>"` encoding.
    pub fn count(&self) -> Result<u64> {
        Ok(parse_last(&self.last)?.0)
    }

    /// Total number of matching events across all pages.
    pub fn total(&self) -> Result<u64> {
        Ok(parse_last(&self.last)?.1)
    }
}

fn parse_last(last: &str) -> Result<(u64, u64, String)> {
    let mut parts = last.splitn(3, '|');
    let count = parts
        .next()
        .ok_or_else(|| AuditError::DecodeError(format!("malformed `last` field '{last}'")))?;
    let total = parts
        .next()
        .ok_or_else(|| AuditError::DecodeError(format!("malformed `last` field '{last}'")))?;
    let opaque = parts.next().unwrap_or("").to_string();

    let count: u64 = count
        .parse()
        .map_err(|_| AuditError::DecodeError(format!("non-numeric count in `last` field '{last}'")))?;
    let total: u64 = total
        .parse()
        .map_err(|_| AuditError::DecodeError(format!("non-numeric total in `last` field '{last}'")))?;

    Ok((count, total, opaque))
}

/// The stateful client. Generic over its [`Transport`] so tests can swap
/// in a mock.
pub struct AuditClient<T: Transport> {
    transport: T,
    arweave: ArweaveClient,
    config: Config,
}

impl AuditClient<ReqwestTransport> {
    /// Build a client against a live Pangea-style audit service.
    pub fn new(config: Config) -> Self {
        let transport = ReqwestTransport::new(
            config.base_domain.clone(),
            config.token.clone(),
            config.config_id.clone(),
        );
        Self {
            transport,
            arweave: ArweaveClient::new(),
            config,
        }
    }
}

impl<T: Transport> AuditClient<T> {
    /// Build a client against an arbitrary transport (used by tests).
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            transport,
            arweave: ArweaveClient::new(),
            config,
        }
    }

    /// Swap in a different publication-network client (used by tests, to
    /// avoid reaching the real network).
    #[cfg(test)]
    pub fn with_arweave(mut self, arweave: ArweaveClient) -> Self {
        self.arweave = arweave;
        self
    }

    /// Submit an event. Fails with `InvalidInput` if `message` is absent.
    pub async fn log(&self, event: &crate::types::Event) -> Result<LogResult> {
        let body = event.to_log_body()?;
        let request = json!({ "event": body, "return_hash": true });

        let response = self.transport.post("log", request).await?;
        let envelope = parse_envelope::<LogResult>(response)?;
        Ok(envelope.result)
    }

    /// Request the current (or size-pinned) root. Used directly by
    /// callers and as the fallback source in [`Self::update_published_roots`].
    pub async fn root(&self, tree_size: Option<u64>) -> Result<MerkleRoot> {
        let mut body = serde_json::Map::new();
        if let Some(size) = tree_size {
            body.insert("tree_size".to_string(), json!(size));
        }

        let response = self.transport.post("root", Value::Object(body)).await?;
        let envelope = parse_envelope::<MerkleRoot>(response)?;
        let mut root = envelope.result;
        root.source = RootSource::Pangea;
        Ok(root)
    }

    /// Search for events. When `params.verify` is set, populates the
    /// published-roots cache and verifies every returned event; a
    /// verification failure aborts the whole search.
    pub async fn search(&self, params: SearchParams) -> Result<SearchWrapper> {
        if params.page_size == 0 {
            return Err(AuditError::InvalidInput(
                "page_size must be a positive integer".to_string(),
            ));
        }

        let mut body = serde_json::Map::new();
        body.insert("query".to_string(), json!(params.query));
        body.insert("page_size".to_string(), json!(params.page_size));
        body.insert("include_membership_proof".to_string(), json!(true));
        body.insert("include_hash".to_string(), json!(true));
        body.insert("include_root".to_string(), json!(true));
        if let Some(start) = &params.start {
            body.insert("start".to_string(), json!(start));
        }
        if let Some(end) = &params.end {
            body.insert("end".to_string(), json!(end));
        }
        if let Some(last) = &params.last {
            body.insert("last".to_string(), json!(last));
        }
        if !params.sources.is_empty() {
            body.insert("sources".to_string(), json!(params.sources));
        }

        let response = self.transport.post("search", Value::Object(body)).await?;
        let envelope = parse_envelope::<RawSearchResult>(response)?;
        let raw = envelope.result;

        let Some(current_root) = raw.root.clone() else {
            // "root absent from server response: search succeeds, no
            // events are verified, no error raised."
            let events = raw
                .events
                .into_iter()
                .map(|event| VerifiedEvent { event, verification: EventVerification::NotRequested })
                .collect();
            return Ok(SearchWrapper {
                params,
                events,
                root: None,
                last: raw.last,
                cache: RootsCache::new(),
            });
        };

        if !params.verify {
            let events = raw
                .events
                .into_iter()
                .map(|event| VerifiedEvent { event, verification: EventVerification::NotRequested })
                .collect();
            return Ok(SearchWrapper {
                params,
                events,
                root: Some(current_root),
                last: raw.last,
                cache: RootsCache::new(),
            });
        }

        let mut cache = RootsCache::new();
        self.update_published_roots(&mut cache, &current_root.tree_name, &raw.events, &current_root)
            .await;

        let effective_current_root = cache.get(current_root.size).cloned().unwrap_or_else(|| current_root.clone());

        let mut verified_events = Vec::with_capacity(raw.events.len());
        for event in raw.events {
            let verification = self.verify_event(&event, &cache, &effective_current_root)?;
            verified_events.push(VerifiedEvent { event, verification });
        }

        Ok(SearchWrapper {
            params,
            events: verified_events,
            root: Some(current_root),
            last: raw.last,
            cache,
        })
    }

    /// Follow a search wrapper to its next page. Returns `None` once
    /// `count >= total`.
    pub async fn search_next(&self, wrapper: &SearchWrapper) -> Result<Option<SearchWrapper>> {
        let (count, total, _) = parse_last(&wrapper.last)?;
        if count >= total {
            return Ok(None);
        }

        let mut next_params = wrapper.params.clone();
        next_params.last = Some(wrapper.last.clone());

        Ok(Some(self.search(next_params).await?))
    }

    /// Resolve every tree size a batch of events needs for verification,
    /// preferring the independent publication network and falling back to
    /// server-sourced roots when permitted.
    pub async fn update_published_roots(
        &self,
        cache: &mut RootsCache,
        tree_name: &str,
        events: &[ReturnedEvent],
        current_root: &MerkleRoot,
    ) {
        let needed: Vec<u64> = required_sizes(events, current_root.size)
            .into_iter()
            .filter(|size| !cache.contains(*size))
            .collect();

        if needed.is_empty() {
            return;
        }

        // The current root is already known locally (it came back on this
        // very response) — avoid a redundant network round-trip for it,
        // but still record its provenance as unresolved until the
        // publication network (or server fallback) confirms it.
        let remaining: Vec<u64> = needed.clone();

        let from_arweave = self.arweave.published_roots(tree_name, &remaining).await;

        let mut still_missing = Vec::new();
        for size in &remaining {
            if let Some(root) = from_arweave.get(size) {
                cache.insert(*size, root.clone());
            } else if *size == current_root.size {
                // The server already handed us this root inline; treat it
                // as the pangea-sourced fallback instead of refetching.
                let mut root = current_root.clone();
                root.source = RootSource::Pangea;
                still_missing.push((*size, Some(root)));
            } else {
                still_missing.push((*size, None));
            }
        }

        for (size, inline_root) in still_missing {
            if !self.config.allow_server_roots {
                cache.mark_absent(size);
                continue;
            }

            if let Some(root) = inline_root {
                cache.insert(size, root);
                continue;
            }

            match self.root(Some(size)).await {
                Ok(root) => cache.insert(size, root),
                Err(e) => {
                    tracing::warn!(size, error = %e, "server root fallback failed");
                    cache.mark_absent(size);
                }
            }
        }
    }

    fn verify_event(
        &self,
        event: &ReturnedEvent,
        cache: &RootsCache,
        current_root: &MerkleRoot,
    ) -> Result<EventVerification> {
        if !self.config.allow_server_roots && current_root.source != RootSource::Arweave {
            return Err(AuditError::VerificationError(VerificationKind::Membership));
        }

        let node_hash = decode_hex(&event.hash)?;
        let root_hash = decode_hex(&current_root.root_hash)?;
        let membership_proof = decode_membership_proof(&event.membership_proof)?;

        if !verify_membership(&node_hash, &root_hash, &membership_proof) {
            return Err(AuditError::VerificationError(VerificationKind::Membership));
        }

        if event.leaf_index == 0 {
            return Ok(EventVerification::Verified);
        }

        let curr = cache.get(event.leaf_index + 1);
        let prev = cache.get(event.leaf_index);

        let (Some(curr), Some(prev)) = (curr, prev) else {
            return Ok(EventVerification::Unverifiable {
                reason: format!(
                    "root for size {} or {} not resolvable from any permitted source",
                    event.leaf_index + 1,
                    event.leaf_index
                ),
            });
        };

        if !self.config.allow_server_roots
            && (curr.source != RootSource::Arweave || prev.source != RootSource::Arweave)
        {
            return Err(AuditError::VerificationError(VerificationKind::Consistency));
        }

        let new_root = decode_hex(&curr.root_hash)?;
        let prev_root = decode_hex(&prev.root_hash)?;
        let consistency_proof = decode_consistency_proof(&curr.consistency_proof)?;

        if !verify_consistency(&new_root, &prev_root, &consistency_proof) {
            return Err(AuditError::VerificationError(VerificationKind::Consistency));
        }

        Ok(EventVerification::Verified)
    }
}

fn parse_envelope<TOut: serde::de::DeserializeOwned>(response: RawResponse) -> Result<ServerResponse<TOut>> {
    let envelope: ServerResponse<TOut> = response.into_typed()?;
    if !envelope.success {
        return Err(AuditError::TransportError(format!(
            "request {} failed: {} ({})",
            envelope.request_id, envelope.status, envelope.status_code
        )));
    }
    Ok(envelope)
}
