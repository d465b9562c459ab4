//! Domain Events
//!
//! Inventory, production and staff flows that append to a brewery's
//! ledger. Each event maps to exactly one `ActionData` payload.

use serde::{Deserialize, Serialize};

use crate::audit::entry::{ActionData, ActionKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Stock delta on an existing item; sign decides in/out/adjustment.
    InventoryChange {
        item: String,
        change: f64,
        reason: String,
    },
    NewItem {
        name: String,
    },
    DeleteItem {
        name: String,
    },
    Production {
        recipe: String,
        output_amount: f64,
    },
    EmployeeAdd {
        username: String,
        role: String,
    },
    EmployeeRemove {
        username: String,
    },
}

impl DomainEvent {
    pub fn action_kind(&self) -> ActionKind {
        match self {
            DomainEvent::InventoryChange { change, .. } => {
                if *change > 0.0 {
                    ActionKind::InventoryIn
                } else if *change < 0.0 {
                    ActionKind::InventoryOut
                } else {
                    ActionKind::Adjustment
                }
            }
            DomainEvent::NewItem { .. } => ActionKind::NewItem,
            DomainEvent::DeleteItem { .. } => ActionKind::DeleteItem,
            DomainEvent::Production { .. } => ActionKind::Production,
            DomainEvent::EmployeeAdd { .. } => ActionKind::EmployeeAdd,
            DomainEvent::EmployeeRemove { .. } => ActionKind::EmployeeRemove,
        }
    }

    pub fn details(&self) -> String {
        match self {
            DomainEvent::InventoryChange {
                item,
                change,
                reason,
            } => {
                let sign = if *change > 0.0 { "+" } else { "" };
                format!("{}: {}{} ({})", item, sign, format_amount(*change), reason)
            }
            DomainEvent::NewItem { name } => format!("Added: {}", name),
            DomainEvent::DeleteItem { name } => format!("Removed item: {}", name),
            DomainEvent::Production {
                recipe,
                output_amount,
            } => format!("Brewed {}l {}", format_amount(*output_amount), recipe),
            DomainEvent::EmployeeAdd { username, role } => {
                format!("Added employee: {} ({})", username, role)
            }
            DomainEvent::EmployeeRemove { username } => {
                format!("Removed employee: {}", username)
            }
        }
    }

    /// Payload recorded on behalf of `user`
    pub fn to_action(&self, user: &str) -> ActionData {
        ActionData::new(self.action_kind(), self.details(), user)
    }
}

// ECMAScript Number-to-String: integral values without a fractional part,
// -0 as 0, exponent form with an explicit sign outside [1e-6, 1e21).
fn format_amount(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", value);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_change_sign_selects_action() {
        let incoming = DomainEvent::InventoryChange {
            item: "Pale Malt".to_string(),
            change: 25.0,
            reason: "delivery".to_string(),
        };
        let action = incoming.to_action("brewer");
        assert_eq!(action.action, ActionKind::InventoryIn);
        assert_eq!(action.details, "Pale Malt: +25 (delivery)");
        assert_eq!(action.user, "brewer");

        let outgoing = DomainEvent::InventoryChange {
            item: "Cascade".to_string(),
            change: -1.5,
            reason: "dry hop".to_string(),
        };
        assert_eq!(outgoing.action_kind(), ActionKind::InventoryOut);
        assert_eq!(outgoing.details(), "Cascade: -1.5 (dry hop)");

        let correction = DomainEvent::InventoryChange {
            item: "Yeast".to_string(),
            change: -0.0,
            reason: "stocktake".to_string(),
        };
        assert_eq!(correction.action_kind(), ActionKind::Adjustment);
        assert_eq!(correction.details(), "Yeast: 0 (stocktake)");
    }

    #[test]
    fn test_item_and_staff_events() {
        let cases = [
            (
                DomainEvent::NewItem { name: "Wheat".to_string() },
                ActionKind::NewItem,
                "Added: Wheat",
            ),
            (
                DomainEvent::DeleteItem { name: "Wheat".to_string() },
                ActionKind::DeleteItem,
                "Removed item: Wheat",
            ),
            (
                DomainEvent::Production {
                    recipe: "Hazy IPA".to_string(),
                    output_amount: 500.0,
                },
                ActionKind::Production,
                "Brewed 500l Hazy IPA",
            ),
            (
                DomainEvent::EmployeeAdd {
                    username: "oleg".to_string(),
                    role: "brewer".to_string(),
                },
                ActionKind::EmployeeAdd,
                "Added employee: oleg (brewer)",
            ),
            (
                DomainEvent::EmployeeRemove { username: "oleg".to_string() },
                ActionKind::EmployeeRemove,
                "Removed employee: oleg",
            ),
        ];

        for (event, kind, details) in cases {
            let action = event.to_action("admin");
            assert_eq!(action.action, kind);
            assert_eq!(action.details, details);
        }
    }

    #[test]
    fn test_amount_formatting_extremes() {
        assert_eq!(format_amount(1e21), "1e+21");
        assert_eq!(format_amount(-2.5e22), "-2.5e+22");
        assert_eq!(format_amount(1.5e-7), "1.5e-7");
        assert_eq!(format_amount(0.000001), "0.000001");
        assert_eq!(format_amount(123456789012345680000.0), "123456789012345680000");
        assert_eq!(format_amount(f64::INFINITY), "Infinity");
        assert_eq!(format_amount(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_amount(f64::NAN), "NaN");

        let huge = DomainEvent::InventoryChange {
            item: "Water".to_string(),
            change: 1e21,
            reason: "reservoir".to_string(),
        };
        assert_eq!(huge.details(), "Water: +1e+21 (reservoir)");
    }

    #[test]
    fn test_event_json_shape() {
        let event: DomainEvent = serde_json::from_str(
            r#"{"type":"production","recipe":"Stout","output_amount":120.5}"#,
        )
        .unwrap();
        assert_eq!(event.details(), "Brewed 120.5l Stout");
    }
}
