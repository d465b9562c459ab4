// Database schema definitions and migrations

pub const LEDGER_SCHEMA: &str = include_str!("../../migrations/001_ledger.sql");
