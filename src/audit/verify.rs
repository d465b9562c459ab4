//! Ledger Verification
//!
//! Single linear scan that reports the first broken position of a chain.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{debug, warn};

use crate::audit::chain::GENESIS_PREVIOUS_HASH;
use crate::audit::entry::{ActionKind, Block};

/// Why a position failed verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakReason {
    InvalidGenesis,
    IndexOutOfSequence,
    PreviousHashMismatch,
    HashMismatch,
    /// Stored record could not be decoded into a block
    MalformedBlock,
}

impl BreakReason {
    pub fn describe(&self) -> &'static str {
        match self {
            BreakReason::InvalidGenesis => "genesis block is malformed",
            BreakReason::IndexOutOfSequence => "block index does not match its position",
            BreakReason::PreviousHashMismatch => "previousHash does not match the preceding block",
            BreakReason::HashMismatch => "stored hash does not match block contents",
            BreakReason::MalformedBlock => "stored record is not a well-formed block",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub broken_at_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<BreakReason>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            broken_at_index: None,
            reason: None,
        }
    }

    pub fn broken(position: usize, reason: BreakReason) -> Self {
        Self {
            valid: false,
            broken_at_index: Some(position),
            reason: Some(reason),
        }
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        match (self.broken_at_index, self.reason) {
            (Some(position), Some(reason)) => {
                format!("Ledger broken at index {}: {}", position, reason.describe())
            }
            (Some(position), None) => format!("Ledger broken at index {}", position),
            _ => "Ledger is intact".to_string(),
        }
    }
}

/// Verify a complete chain, stopping at the first failure
pub fn verify(chain: &[Block]) -> ValidationResult {
    let Some(genesis) = chain.first() else {
        return ValidationResult::valid();
    };

    if let Some(reason) = check_genesis(genesis) {
        warn!("Ledger genesis invalid: {}", reason.describe());
        return ValidationResult::broken(0, reason);
    }

    for (position, pair) in chain.windows(2).enumerate() {
        let position = position + 1;
        let (previous, block) = (&pair[0], &pair[1]);

        if block.index != position as u64 {
            warn!(
                "Ledger broken at {}: stored index {}",
                position, block.index
            );
            return ValidationResult::broken(position, BreakReason::IndexOutOfSequence);
        }

        if let Some(reason) = check_link(previous, block) {
            warn!("Ledger broken at {}: {}", position, reason.describe());
            return ValidationResult::broken(position, reason);
        }
    }

    debug!("Ledger verification successful: {} blocks", chain.len());
    ValidationResult::valid()
}

/// Verify blocks decoded one by one from storage. The first record that
/// fails to decode is reported as a break at its position, unless the
/// decoded prefix before it is already broken.
pub fn verify_decoded<I, E>(records: I) -> ValidationResult
where
    I: IntoIterator<Item = Result<Block, E>>,
    E: Display,
{
    let mut chain = Vec::new();
    for (position, record) in records.into_iter().enumerate() {
        match record {
            Ok(block) => chain.push(block),
            Err(e) => {
                let prefix = verify(&chain);
                if !prefix.valid {
                    return prefix;
                }
                warn!("Ledger broken at {}: undecodable record: {}", position, e);
                return ValidationResult::broken(position, BreakReason::MalformedBlock);
            }
        }
    }
    verify(&chain)
}

/// Check that `block` is a well-formed genesis block
pub fn check_genesis(block: &Block) -> Option<BreakReason> {
    if block.previous_hash != GENESIS_PREVIOUS_HASH
        || block.index != 0
        || block.data.action != ActionKind::Genesis
    {
        return Some(BreakReason::InvalidGenesis);
    }
    if !block.verify_hash() {
        return Some(BreakReason::HashMismatch);
    }
    None
}

/// Check that `block` is a valid direct successor of `previous`
pub fn check_link(previous: &Block, block: &Block) -> Option<BreakReason> {
    if block.index != previous.index + 1 {
        return Some(BreakReason::IndexOutOfSequence);
    }
    if block.previous_hash != previous.hash {
        return Some(BreakReason::PreviousHashMismatch);
    }
    if !block.verify_hash() {
        return Some(BreakReason::HashMismatch);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::chain::{append_at, create_genesis_at};
    use crate::audit::entry::ActionData;

    fn sample_chain(len: usize) -> Vec<Block> {
        let mut chain = vec![create_genesis_at("2024-01-01T00:00:00.000Z")];
        for i in 1..len {
            let tail = chain.last().unwrap();
            let block = append_at(
                tail,
                ActionData::new(ActionKind::InventoryOut, format!("Hops: -{} (brew)", i), "anna"),
                format!("2024-01-01T00:{:02}:00.000Z", i),
            );
            chain.push(block);
        }
        chain
    }

    #[test]
    fn test_empty_chain_is_valid() {
        assert_eq!(verify(&[]), ValidationResult::valid());
    }

    #[test]
    fn test_valid_chain() {
        let result = verify(&sample_chain(5));
        assert!(result.valid);
        assert_eq!(result.broken_at_index, None);
        assert_eq!(result.summary(), "Ledger is intact");
    }

    #[test]
    fn test_genesis_must_link_to_zero() {
        let mut chain = sample_chain(2);
        chain[0].previous_hash = "1".to_string();
        let result = verify(&chain);
        assert_eq!(result, ValidationResult::broken(0, BreakReason::InvalidGenesis));
    }

    #[test]
    fn test_genesis_must_be_genesis_action() {
        let mut chain = sample_chain(1);
        chain[0].data.action = ActionKind::Adjustment;
        chain[0].hash = chain[0].calculate_hash();
        assert_eq!(verify(&chain).broken_at_index, Some(0));
    }

    #[test]
    fn test_tampered_details_detected() {
        let mut chain = sample_chain(4);
        chain[2].data.details = "Hops: -200 (brew)".to_string();
        let result = verify(&chain);
        assert_eq!(result, ValidationResult::broken(2, BreakReason::HashMismatch));
    }

    #[test]
    fn test_rehashed_block_breaks_forward_link() {
        let mut chain = sample_chain(4);
        chain[1].data.user = "mallory".to_string();
        chain[1].hash = chain[1].calculate_hash();
        let result = verify(&chain);
        assert_eq!(
            result,
            ValidationResult::broken(2, BreakReason::PreviousHashMismatch)
        );
    }

    #[test]
    fn test_index_gap_detected() {
        let mut chain = sample_chain(4);
        chain.remove(2);
        let result = verify(&chain);
        assert_eq!(result.broken_at_index, Some(2));
        assert_eq!(result.reason, Some(BreakReason::IndexOutOfSequence));
    }

    #[test]
    fn test_check_link_accepts_successor() {
        let chain = sample_chain(3);
        assert_eq!(check_link(&chain[1], &chain[2]), None);
        assert_eq!(
            check_link(&chain[0], &chain[2]),
            Some(BreakReason::IndexOutOfSequence)
        );
    }

    #[test]
    fn test_undecodable_record_breaks_at_its_position() {
        let chain = sample_chain(4);
        let mut records: Vec<Result<Block, String>> = chain.into_iter().map(Ok).collect();
        records[2] = Err("unknown variant `TELEPORT`".to_string());

        assert_eq!(
            verify_decoded(records),
            ValidationResult::broken(2, BreakReason::MalformedBlock)
        );
    }

    #[test]
    fn test_earlier_break_wins_over_undecodable_record() {
        let mut chain = sample_chain(4);
        chain[1].data.details = "Hops: -99 (brew)".to_string();
        let mut records: Vec<Result<Block, String>> = chain.into_iter().map(Ok).collect();
        records[3] = Err("bad json".to_string());

        assert_eq!(
            verify_decoded(records),
            ValidationResult::broken(1, BreakReason::HashMismatch)
        );
    }

    #[test]
    fn test_fully_decoded_records_verify_like_chain() {
        let records = sample_chain(5).into_iter().map(Ok::<Block, String>);
        assert!(verify_decoded(records).valid);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let json = serde_json::to_value(ValidationResult::broken(3, BreakReason::HashMismatch)).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["brokenAtIndex"], 3);
        assert_eq!(json["reason"], "HASH_MISMATCH");

        let json = serde_json::to_value(ValidationResult::valid()).unwrap();
        assert!(json["brokenAtIndex"].is_null());
        assert!(json.get("reason").is_none());
    }
}
