//! Chain Construction
//!
//! Pure functions producing the genesis block and successor blocks.
//! Nothing here touches storage; callers own the tail and must fence
//! appends per brewery (see `AuditLogger`).

use chrono::{SecondsFormat, Utc};

use crate::audit::digest::digest;
use crate::audit::entry::{ActionData, Block};

/// `previousHash` of every genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn create_genesis() -> Block {
    create_genesis_at(current_timestamp())
}

pub fn create_genesis_at(timestamp: impl Into<String>) -> Block {
    let timestamp = timestamp.into();
    let data = ActionData::genesis();
    let hash = digest(0, GENESIS_PREVIOUS_HASH, &timestamp, &data);

    Block {
        index: 0,
        timestamp,
        data,
        previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        hash,
    }
}

/// Build the block that follows `last_block`. `last_block` is not modified.
pub fn append(last_block: &Block, data: ActionData) -> Block {
    append_at(last_block, data, current_timestamp())
}

pub fn append_at(last_block: &Block, data: ActionData, timestamp: impl Into<String>) -> Block {
    let timestamp = timestamp.into();
    let index = last_block.index + 1;
    let hash = digest(index, &last_block.hash, &timestamp, &data);

    Block {
        index,
        timestamp,
        data,
        previous_hash: last_block.hash.clone(),
        hash,
    }
}
