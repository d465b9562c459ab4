use serde::{Deserialize, Serialize};

use crate::audit::entry::{ActionData, Block};
use crate::error::LedgerError;

/// Row of the `logs` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogRow {
    pub index_num: i64,
    pub timestamp: String,
    pub data: String,
    pub previous_hash: String,
    pub hash: String,
    pub brewery_id: String,
}

impl LogRow {
    pub fn from_block(brewery_id: &str, block: &Block) -> Result<Self, LedgerError> {
        let index_num = i64::try_from(block.index).map_err(|_| {
            LedgerError::ValidationError(format!("Block index {} out of range", block.index))
        })?;

        Ok(Self {
            index_num,
            timestamp: block.timestamp.clone(),
            data: block.data.canonical_json(),
            previous_hash: block.previous_hash.clone(),
            hash: block.hash.clone(),
            brewery_id: brewery_id.to_string(),
        })
    }
}

impl TryFrom<LogRow> for Block {
    type Error = LedgerError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let index = u64::try_from(row.index_num).map_err(|_| {
            LedgerError::ValidationError(format!("Negative block index {}", row.index_num))
        })?;
        let data: ActionData = serde_json::from_str(&row.data)?;
        // The stored text is what readers export, so it must be exactly what was hashed.
        if data.canonical_json() != row.data {
            return Err(LedgerError::ValidationError(format!(
                "Stored data of block {} is not in canonical form",
                index
            )));
        }

        Ok(Block {
            index,
            timestamp: row.timestamp,
            data,
            previous_hash: row.previous_hash,
            hash: row.hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::chain::create_genesis_at;

    fn genesis_row() -> LogRow {
        LogRow::from_block("hopworks", &create_genesis_at("2024-01-01T00:00:00.000Z")).unwrap()
    }

    #[test]
    fn test_row_round_trips_to_block() {
        let block = Block::try_from(genesis_row()).unwrap();
        assert_eq!(block.hash, "3b45ca5a");
        assert!(block.verify_hash());
    }

    #[test]
    fn test_non_canonical_data_is_rejected() {
        let mut row = genesis_row();
        row.data = r#"{"details":"Blockchain Started","action":"GENESIS","user":"SYSTEM"}"#.to_string();
        assert!(matches!(
            Block::try_from(row),
            Err(LedgerError::ValidationError(_))
        ));
    }

    #[test]
    fn test_negative_index_is_rejected() {
        let mut row = genesis_row();
        row.index_num = -1;
        assert!(Block::try_from(row).is_err());
    }
}
