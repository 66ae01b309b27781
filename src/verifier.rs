//! Merkle membership and consistency proof verification.
//!
//! Pure functions over already-decoded proofs and digests — no network,
//! no state. Verification never early-exits on a data-dependent branch
//! over partner bytes; every proof step is folded the same way regardless
//! of digest content, only the declared `side` selects operand order.

use crate::error::{AuditError, Result, VerificationKind};
use crate::hash::{hash_pair, Digest32};
use crate::proof::{ConsistencyProof, MembershipProof, Side};

/// Recompute a root from a leaf/node hash and its membership proof, and
/// compare it against the claimed root.
///
/// An empty proof means `node_hash` must equal `root_hash` directly
/// (single-leaf tree).
pub fn verify_membership(node_hash: &Digest32, root_hash: &Digest32, proof: &MembershipProof) -> bool {
    let mut running = *node_hash;
    for step in proof {
        running = match step.side {
            Side::Left => hash_pair(&step.node_hash, &running),
            Side::Right => hash_pair(&running, &step.node_hash),
        };
    }
    running == *root_hash
}

/// Verify that `new_root` is a consistent, append-only extension of
/// `prev_root` per `proof`.
///
/// Phase 1 reconstructs `prev_root` by folding the proof's node hashes
/// together; phase 2 proves every one of those same nodes is reachable
/// from `new_root`. Both phases must succeed.
///
/// An empty proof is valid only when `new_root == prev_root`.
pub fn verify_consistency(new_root: &Digest32, prev_root: &Digest32, proof: &ConsistencyProof) -> bool {
    if proof.is_empty() {
        return new_root == prev_root;
    }

    let mut running = proof[0].node_hash;
    for item in &proof[1..] {
        running = hash_pair(&item.node_hash, &running);
    }
    if running != *prev_root {
        return false;
    }

    proof
        .iter()
        .all(|item| verify_membership(&item.node_hash, new_root, &item.sub_proof))
}

/// Same as [`verify_membership`] but raises a `VerificationError` on failure
/// instead of returning a bool, for call sites that want `?`-propagation.
pub fn require_membership(node_hash: &Digest32, root_hash: &Digest32, proof: &MembershipProof) -> Result<()> {
    if verify_membership(node_hash, root_hash, proof) {
        Ok(())
    } else {
        Err(AuditError::VerificationError(VerificationKind::Membership))
    }
}

/// Same as [`verify_consistency`] but raises a `VerificationError` on failure.
pub fn require_consistency(new_root: &Digest32, prev_root: &Digest32, proof: &ConsistencyProof) -> Result<()> {
    if verify_consistency(new_root, prev_root, proof) {
        Ok(())
    } else {
        Err(AuditError::VerificationError(VerificationKind::Consistency))
    }
}
