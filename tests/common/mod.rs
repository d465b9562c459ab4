#![allow(dead_code)]

use brewery_ledger::audit::{append_at, create_genesis_at, ActionData, ActionKind, AuditLogger, Block};
use brewery_ledger::database::Database;

pub const GENESIS_TIMESTAMP: &str = "2024-01-01T00:00:00.000Z";

/// Setup an in-memory SQLite database for testing
pub async fn setup_test_db() -> Database {
    Database::new_in_memory()
        .await
        .expect("Failed to create test database")
}

pub async fn setup_test_logger() -> AuditLogger {
    AuditLogger::new(setup_test_db().await, 3)
}

/// Payloads resembling a day at a small brewery
pub fn sample_payloads() -> Vec<ActionData> {
    vec![
        ActionData::new(ActionKind::NewItem, "Added: Pale Malt", "anna"),
        ActionData::new(ActionKind::InventoryIn, "Pale Malt: +25 (delivery)", "anna"),
        ActionData::new(ActionKind::InventoryOut, "Pale Malt: -5 (mash)", "oleg"),
        ActionData::new(ActionKind::Production, "Brewed 500l Hazy IPA", "oleg"),
        ActionData::new(ActionKind::EmployeeAdd, "Added employee: ivan (brewer)", "anna"),
        ActionData::new(ActionKind::Adjustment, "Yeast: 0 (stocktake)", "ivan"),
        ActionData::new(ActionKind::DeleteItem, "Removed item: Old Hops", "anna"),
        ActionData::new(ActionKind::EmployeeRemove, "Removed employee: ivan", "anna"),
    ]
}

/// Deterministic chain: genesis plus one block per sample payload
pub fn build_chain(len: usize) -> Vec<Block> {
    let mut chain = vec![create_genesis_at(GENESIS_TIMESTAMP)];
    let payloads = sample_payloads();
    for i in 1..len {
        let data = payloads[(i - 1) % payloads.len()].clone();
        let block = append_at(
            chain.last().expect("chain has genesis"),
            data,
            format!("2024-01-01T{:02}:{:02}:00.000Z", i / 60, i % 60),
        );
        chain.push(block);
    }
    chain
}
