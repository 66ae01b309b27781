//! Compact textual encodings of membership and consistency proofs.
//!
//! Membership-proof string: comma-separated `<side>:<hex>` items, where
//! `<side>` is the single character `l` or `r`. Consistency-proof string:
//! a leading `x:<hex>` pair (the consistency node itself) followed by a
//! membership-proof encoding for that node in the new tree, split on the
//! *first* comma since the trailing segment itself contains commas.

use crate::error::{AuditError, Result};
use crate::hash::{decode_hex, encode_hex, Digest32};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MembershipProofItem {
    pub side: Side,
    pub node_hash: Digest32,
}

pub type MembershipProof = Vec<MembershipProofItem>;

#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyProofItem {
    pub node_hash: Digest32,
    pub sub_proof: MembershipProof,
}

pub type ConsistencyProof = Vec<ConsistencyProofItem>;

pub fn decode_membership_proof(data: &str) -> Result<MembershipProof> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    data.split(',').map(decode_membership_item).collect()
}

fn decode_membership_item(item: &str) -> Result<MembershipProofItem> {
    if item.is_empty() {
        return Err(AuditError::DecodeError("empty membership proof component".to_string()));
    }
    let mut parts = item.splitn(2, ':');
    let side_marker = parts
        .next()
        .ok_or_else(|| AuditError::DecodeError(format!("missing side marker in '{item}'")))?;
    let hex = parts
        .next()
        .ok_or_else(|| AuditError::DecodeError(format!("missing digest in '{item}'")))?;

    let side = match side_marker {
        "l" => Side::Left,
        "r" => Side::Right,
        other => {
            return Err(AuditError::DecodeError(format!(
                "malformed side marker '{other}', expected 'l' or 'r'"
            )))
        }
    };

    Ok(MembershipProofItem {
        side,
        node_hash: decode_hex(hex)?,
    })
}

pub fn encode_membership_proof(proof: &MembershipProof) -> String {
    proof
        .iter()
        .map(|item| {
            let marker = match item.side {
                Side::Left => "l",
                Side::Right => "r",
            };
            format!("{marker}:{}", encode_hex(&item.node_hash))
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn decode_consistency_proof(entries: &[String]) -> Result<ConsistencyProof> {
    entries.iter().map(|entry| decode_consistency_item(entry)).collect()
}

fn decode_consistency_item(entry: &str) -> Result<ConsistencyProofItem> {
    let comma = entry
        .find(',')
        .unwrap_or(entry.len());

    let head = &entry[..comma];
    let tail = entry.get(comma + 1..).unwrap_or("");

    let mut head_parts = head.splitn(2, ':');
    let marker = head_parts
        .next()
        .ok_or_else(|| AuditError::DecodeError(format!("empty consistency proof entry '{entry}'")))?;
    if marker != "x" {
        return Err(AuditError::DecodeError(format!(
            "missing 'x:' prefix in consistency proof entry '{entry}'"
        )));
    }
    let hex = head_parts
        .next()
        .ok_or_else(|| AuditError::DecodeError(format!("missing digest in consistency entry '{entry}'")))?;

    Ok(ConsistencyProofItem {
        node_hash: decode_hex(hex)?,
        sub_proof: decode_membership_proof(tail)?,
    })
}

pub fn encode_consistency_proof(proof: &ConsistencyProof) -> Vec<String> {
    proof
        .iter()
        .map(|item| {
            format!(
                "x:{},{}",
                encode_hex(&item.node_hash),
                encode_membership_proof(&item.sub_proof)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;

    #[test]
    fn decode_empty_membership_proof() {
        assert_eq!(decode_membership_proof("").unwrap(), Vec::new());
    }

    #[test]
    fn membership_roundtrip() {
        let h1 = hash_bytes(b"x");
        let h2 = hash_bytes(b"y");
        let proof = vec![
            MembershipProofItem { side: Side::Left, node_hash: h1 },
            MembershipProofItem { side: Side::Right, node_hash: h2 },
        ];
        let encoded = encode_membership_proof(&proof);
        assert_eq!(decode_membership_proof(&encoded).unwrap(), proof);
    }

    #[test]
    fn rejects_malformed_side_marker() {
        let hex = encode_hex(&hash_bytes(b"x"));
        assert!(decode_membership_item(&format!("z:{hex}")).is_err());
    }

    #[test]
    fn rejects_empty_component() {
        assert!(decode_membership_proof("l:abcd,,r:abcd").is_err());
    }

    #[test]
    fn rejects_missing_x_prefix() {
        let hex = encode_hex(&hash_bytes(b"x"));
        assert!(decode_consistency_item(&format!("y:{hex},")).is_err());
    }

    #[test]
    fn consistency_roundtrip_splits_on_first_comma_only() {
        let node = hash_bytes(b"node");
        let sib1 = hash_bytes(b"sib1");
        let sib2 = hash_bytes(b"sib2");
        let sub_proof = vec![
            MembershipProofItem { side: Side::Left, node_hash: sib1 },
            MembershipProofItem { side: Side::Right, node_hash: sib2 },
        ];
        let item = ConsistencyProofItem { node_hash: node, sub_proof };
        let encoded = encode_consistency_proof(&vec![item.clone()]);
        assert_eq!(encoded.len(), 1);
        // the encoded string has more than one comma; decode must still work
        assert!(encoded[0].matches(',').count() >= 2);
        let decoded = decode_consistency_proof(&encoded).unwrap();
        assert_eq!(decoded, vec![item]);
    }

    #[test]
    fn consistency_entry_with_empty_sub_proof() {
        let node = hash_bytes(b"root");
        let entry = format!("x:{},", encode_hex(&node));
        let decoded = decode_consistency_proof(&[entry]).unwrap();
        assert_eq!(decoded[0].node_hash, node);
        assert!(decoded[0].sub_proof.is_empty());
    }
}
