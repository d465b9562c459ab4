use sqlx::SqlitePool;
use tracing::debug;

use crate::audit::entry::Block;
use crate::database::models::LogRow;
use crate::error::LedgerError;

pub struct Queries;

impl Queries {
    /// Full chain for a brewery in index order
    pub async fn load_chain(pool: &SqlitePool, brewery_id: &str) -> Result<Vec<Block>, LedgerError> {
        let rows = Self::load_rows(pool, brewery_id).await?;
        rows.into_iter().map(Block::try_from).collect()
    }

    /// Undecoded rows for a brewery in index order
    pub async fn load_rows(pool: &SqlitePool, brewery_id: &str) -> Result<Vec<LogRow>, LedgerError> {
        let rows = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT index_num, timestamp, data, previous_hash, hash, brewery_id
            FROM logs
            WHERE brewery_id = ?
            ORDER BY index_num ASC
            "#,
        )
        .bind(brewery_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn tail_block(pool: &SqlitePool, brewery_id: &str) -> Result<Option<Block>, LedgerError> {
        let row = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT index_num, timestamp, data, previous_hash, hash, brewery_id
            FROM logs
            WHERE brewery_id = ?
            ORDER BY index_num DESC
            LIMIT 1
            "#,
        )
        .bind(brewery_id)
        .fetch_optional(pool)
        .await?;

        row.map(Block::try_from).transpose()
    }

    pub async fn block_at(
        pool: &SqlitePool,
        brewery_id: &str,
        index: u64,
    ) -> Result<Option<Block>, LedgerError> {
        let Ok(index_num) = i64::try_from(index) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT index_num, timestamp, data, previous_hash, hash, brewery_id
            FROM logs
            WHERE brewery_id = ? AND index_num = ?
            "#,
        )
        .bind(brewery_id)
        .bind(index_num)
        .fetch_optional(pool)
        .await?;

        row.map(Block::try_from).transpose()
    }

    /// Most recent blocks first
    pub async fn recent_blocks(
        pool: &SqlitePool,
        brewery_id: &str,
        limit: i64,
    ) -> Result<Vec<Block>, LedgerError> {
        let rows = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT index_num, timestamp, data, previous_hash, hash, brewery_id
            FROM logs
            WHERE brewery_id = ?
            ORDER BY index_num DESC
            LIMIT ?
            "#,
        )
        .bind(brewery_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Block::try_from).collect()
    }

    /// Insert a block. A taken `(index_num, brewery_id)` key is a `Conflict`.
    pub async fn insert_block(
        pool: &SqlitePool,
        brewery_id: &str,
        block: &Block,
    ) -> Result<(), LedgerError> {
        let row = LogRow::from_block(brewery_id, block)?;

        let result = sqlx::query(
            r#"
            INSERT INTO logs (index_num, timestamp, data, previous_hash, hash, brewery_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.index_num)
        .bind(&row.timestamp)
        .bind(&row.data)
        .bind(&row.previous_hash)
        .bind(&row.hash)
        .bind(&row.brewery_id)
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Stored block {} for brewery {}", block.index, brewery_id);
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(LedgerError::conflict(brewery_id, block.index))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_breweries(pool: &SqlitePool) -> Result<Vec<String>, LedgerError> {
        let breweries = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT brewery_id FROM logs ORDER BY brewery_id ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(breweries)
    }

    pub async fn count_blocks(pool: &SqlitePool, brewery_id: &str) -> Result<i64, LedgerError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM logs WHERE brewery_id = ?")
            .bind(brewery_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
