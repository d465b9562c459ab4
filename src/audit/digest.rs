//! Block Digest
//!
//! DJB2-style rolling hash over `index + previousHash + timestamp + data`.
//! This is a tamper-evidence fingerprint, not a cryptographic hash. The
//! output must stay bit-for-bit stable so stored ledgers keep verifying.

use serde_json::Value;

use crate::audit::entry::ActionData;

const DJB2_SEED: i32 = 5381;

/// Digest of a block's hashed fields, rendered as lowercase hex
pub fn digest(index: u64, previous_hash: &str, timestamp: &str, data: &ActionData) -> String {
    let mut input = String::with_capacity(previous_hash.len() + timestamp.len() + 96);
    input.push_str(&index.to_string());
    input.push_str(previous_hash);
    input.push_str(timestamp);
    input.push_str(&canonical_json(data));
    djb2_hex(&input)
}

/// `acc = (acc << 5) + acc + unit` over UTF-16 code units with i32
/// wraparound, printed as the unsigned reinterpretation.
pub fn djb2_hex(input: &str) -> String {
    let hash = input.encode_utf16().fold(DJB2_SEED, |acc, unit| {
        acc.wrapping_shl(5)
            .wrapping_add(acc)
            .wrapping_add(i32::from(unit))
    });
    format!("{:x}", hash as u32)
}

/// Compact JSON with a fixed key order. Every hashed payload goes through here.
pub fn canonical_json(data: &ActionData) -> String {
    format!(
        "{{\"action\":{},\"details\":{},\"user\":{}}}",
        json_string(data.action.as_str()),
        json_string(&data.details),
        json_string(&data.user)
    )
}

fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}
