//! Ledger Block
//!
//! Defines the immutable, hash-linked audit record and the semantic
//! payload it carries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::audit::digest::{canonical_json, digest};
use crate::error::LedgerError;

/// Fixed vocabulary of inventory-affecting actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Genesis,
    InventoryIn,
    InventoryOut,
    Adjustment,
    NewItem,
    DeleteItem,
    Production,
    EmployeeAdd,
    EmployeeRemove,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::Genesis,
        ActionKind::InventoryIn,
        ActionKind::InventoryOut,
        ActionKind::Adjustment,
        ActionKind::NewItem,
        ActionKind::DeleteItem,
        ActionKind::Production,
        ActionKind::EmployeeAdd,
        ActionKind::EmployeeRemove,
    ];

    /// Label written into the hashed payload
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Genesis => "GENESIS",
            ActionKind::InventoryIn => "INVENTORY_IN",
            ActionKind::InventoryOut => "INVENTORY_OUT",
            ActionKind::Adjustment => "ADJUSTMENT",
            ActionKind::NewItem => "NEW_ITEM",
            ActionKind::DeleteItem => "DELETE_ITEM",
            ActionKind::Production => "PRODUCTION",
            ActionKind::EmployeeAdd => "EMPLOYEE_ADD",
            ActionKind::EmployeeRemove => "EMPLOYEE_REMOVE",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LedgerError::ValidationError(format!("Unknown action kind: {}", s)))
    }
}

/// Semantic payload of a block. Field order is part of the hash input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionData {
    pub action: ActionKind,
    pub details: String,
    pub user: String,
}

impl ActionData {
    pub fn new(action: ActionKind, details: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            action,
            details: details.into(),
            user: user.into(),
        }
    }

    pub fn genesis() -> Self {
        Self::new(ActionKind::Genesis, "Blockchain Started", "SYSTEM")
    }

    /// Compact JSON with keys in `action`, `details`, `user` order
    pub fn canonical_json(&self) -> String {
        canonical_json(self)
    }
}

/// One hash-linked audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub data: ActionData,
    pub previous_hash: String,
    pub hash: String,
}

impl Block {
    /// Recompute the digest from this block's own fields
    pub fn calculate_hash(&self) -> String {
        digest(self.index, &self.previous_hash, &self.timestamp, &self.data)
    }

    pub fn verify_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "#{} {} by {}: {} [{}]",
            self.index, self.data.action, self.data.user, self.data.details, self.hash
        )
    }
}
