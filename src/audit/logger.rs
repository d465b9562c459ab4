//! Audit Logger
//!
//! Persistence side of the ledger. Owns the authoritative tail of each
//! brewery's chain and serializes appends per brewery, so that no two
//! blocks are ever computed off the same tail.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audit::chain::{append, create_genesis};
use crate::audit::entry::{ActionData, Block};
use crate::audit::events::DomainEvent;
use crate::audit::verify::{check_genesis, check_link, verify_decoded, ValidationResult};
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::LedgerError;

/// Per-brewery append fencing over the shared block store
#[derive(Clone)]
pub struct AuditLogger {
    database: Database,
    brewery_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    max_append_retries: u32,
}

impl AuditLogger {
    pub fn new(database: Database, max_append_retries: u32) -> Self {
        Self {
            database,
            brewery_locks: Arc::new(Mutex::new(HashMap::new())),
            max_append_retries,
        }
    }

    async fn brewery_lock(&self, brewery_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.brewery_locks.lock().await;
        // Entries only the map still references are idle.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(brewery_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Create the genesis block for a brewery if it has none yet
    pub async fn open_brewery(&self, brewery_id: &str) -> Result<Block, LedgerError> {
        validate_brewery_id(brewery_id)?;
        let lock = self.brewery_lock(brewery_id).await;
        let _guard = lock.lock().await;
        self.ensure_genesis(brewery_id).await
    }

    // Caller must hold the brewery lock.
    async fn ensure_genesis(&self, brewery_id: &str) -> Result<Block, LedgerError> {
        let pool = self.database.pool();
        if let Some(genesis) = Queries::block_at(pool, brewery_id, 0).await? {
            return Ok(genesis);
        }

        let genesis = create_genesis();
        match Queries::insert_block(pool, brewery_id, &genesis).await {
            Ok(()) => {
                info!("Started ledger for brewery {} ({})", brewery_id, genesis.hash);
                Ok(genesis)
            }
            Err(e) if e.is_conflict() => Queries::block_at(pool, brewery_id, 0)
                .await?
                .ok_or_else(|| LedgerError::conflict(brewery_id, 0)),
            Err(e) => Err(e),
        }
    }

    /// Append one block carrying `data` to the brewery's chain
    pub async fn record(&self, brewery_id: &str, data: ActionData) -> Result<Block, LedgerError> {
        validate_brewery_id(brewery_id)?;
        let lock = self.brewery_lock(brewery_id).await;
        let _guard = lock.lock().await;
        let pool = self.database.pool();

        let mut attempt = 0;
        loop {
            let tail = match Queries::tail_block(pool, brewery_id).await? {
                Some(tail) => tail,
                None => self.ensure_genesis(brewery_id).await?,
            };

            let block = append(&tail, data.clone());
            match Queries::insert_block(pool, brewery_id, &block).await {
                Ok(()) => {
                    debug!("Appended audit block: {}", block.summary());
                    return Ok(block);
                }
                Err(e) if e.is_conflict() && attempt < self.max_append_retries => {
                    attempt += 1;
                    warn!(
                        "Lost append race for brewery {} at index {}; retrying ({}/{})",
                        brewery_id, block.index, attempt, self.max_append_retries
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn record_event(
        &self,
        brewery_id: &str,
        event: &DomainEvent,
        user: &str,
    ) -> Result<Block, LedgerError> {
        self.record(brewery_id, event.to_action(user)).await
    }

    /// Store a block computed elsewhere, provided it extends the current tail
    pub async fn import_block(&self, brewery_id: &str, block: Block) -> Result<Block, LedgerError> {
        validate_brewery_id(brewery_id)?;
        let lock = self.brewery_lock(brewery_id).await;
        let _guard = lock.lock().await;
        let pool = self.database.pool();

        if let Some(stored) = Queries::block_at(pool, brewery_id, block.index).await? {
            if stored == block {
                debug!("Block {} already stored for brewery {}", block.index, brewery_id);
                return Ok(stored);
            }
            return Err(LedgerError::conflict(brewery_id, block.index));
        }

        let rejection = match Queries::tail_block(pool, brewery_id).await? {
            Some(tail) => check_link(&tail, &block),
            None => check_genesis(&block),
        };
        if let Some(reason) = rejection {
            warn!(
                "Rejected imported block {} for brewery {}: {}",
                block.index,
                brewery_id,
                reason.describe()
            );
            return Err(LedgerError::RejectedBlock(format!(
                "block {}: {}",
                block.index,
                reason.describe()
            )));
        }

        Queries::insert_block(pool, brewery_id, &block).await?;
        debug!("Imported audit block: {}", block.summary());
        Ok(block)
    }

    pub async fn chain(&self, brewery_id: &str) -> Result<Vec<Block>, LedgerError> {
        Queries::load_chain(self.database.pool(), brewery_id).await
    }

    pub async fn head(&self, brewery_id: &str) -> Result<Option<Block>, LedgerError> {
        Queries::tail_block(self.database.pool(), brewery_id).await
    }

    /// Most recent `limit` blocks, newest first
    pub async fn timeline(&self, brewery_id: &str, limit: i64) -> Result<Vec<Block>, LedgerError> {
        Queries::recent_blocks(self.database.pool(), brewery_id, limit.max(0)).await
    }

    /// Verify the stored chain. Rows that cannot be decoded are reported as
    /// breaks, not errors; only a failing store read is an `Err`.
    pub async fn verify_brewery(&self, brewery_id: &str) -> Result<ValidationResult, LedgerError> {
        let rows = Queries::load_rows(self.database.pool(), brewery_id).await?;
        let count = rows.len();
        let result = verify_decoded(rows.into_iter().map(Block::try_from));
        if result.valid {
            info!("Ledger for brewery {} intact ({} blocks)", brewery_id, count);
        } else {
            warn!("Ledger for brewery {}: {}", brewery_id, result.summary());
        }
        Ok(result)
    }

    pub async fn breweries(&self) -> Result<Vec<String>, LedgerError> {
        Queries::list_breweries(self.database.pool()).await
    }
}

fn validate_brewery_id(brewery_id: &str) -> Result<(), LedgerError> {
    if brewery_id.trim().is_empty() {
        return Err(LedgerError::ValidationError(
            "Brewery id must not be empty".to_string(),
        ));
    }
    Ok(())
}
