//! Wire response shapes and the client-side results built from them.

use super::event::Event;
use super::root::MerkleRoot;
use serde::{Deserialize, Serialize};

/// The envelope every server endpoint wraps its payload in.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerResponse<T> {
    pub success: bool,
    pub result: T,
    pub request_id: String,
    pub status_code: u16,
    pub status: String,
}

/// One event as echoed back by `search`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReturnedEvent {
    pub event: Event,
    pub hash: String,
    pub leaf_index: u64,
    pub membership_proof: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub received_at: Option<String>,
}

/// The outcome of verifying one returned event. `Unverifiable` is
/// in-band, not an error — spec.md is explicit that a root missing from
/// both the publication network and (if permitted) the server does not
/// raise.
#[derive(Debug, Clone, PartialEq)]
pub enum EventVerification {
    /// `verify` was not requested for this search.
    NotRequested,
    /// Both membership and (if `leaf_index > 0`) consistency checked out.
    Verified,
    /// Required root(s) could not be resolved from a permitted source.
    Unverifiable { reason: String },
}

/// One event plus the outcome of verifying it.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    pub event: ReturnedEvent,
    pub verification: EventVerification,
}

/// The raw `result` payload of a `search` response, before client-side
/// verification is applied.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchResult {
    pub events: Vec<ReturnedEvent>,
    pub last: String,
    #[serde(default)]
    pub root: Option<MerkleRoot>,
}

/// The `result` payload of a `log` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LogResult {
    pub hash: String,
}
