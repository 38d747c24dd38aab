//! The per-type stock formula.
//!
//! `new_stock` is always computed here from `previous_stock` and `quantity`; nothing
//! else decides what a movement does to stock.

use super::LedgerError;
use crate::model::MovementType;

/// Applies `movement_type` to `previous` and returns the new stock, or why it is refused.
///
/// | type | new stock | guard |
/// |---|---|---|
/// | add, purchase | previous + quantity | quantity > 0, no overflow |
/// | subtract, sale | previous − quantity | quantity > 0, result ≥ 0 and ≥ `minimum_stock` |
/// | set, adjustment | quantity | none |
pub fn next_stock(
    movement_type: MovementType,
    previous: u32,
    quantity: u32,
    minimum_stock: u32,
) -> Result<u32, LedgerError> {
    match movement_type {
        MovementType::Add | MovementType::Purchase => {
            require_positive(movement_type, quantity)?;
            previous.checked_add(quantity).ok_or_else(|| {
                LedgerError::InvalidOperation(format!(
                    "{movement_type} of {quantity} overflows stock {previous}"
                ))
            })
        }
        MovementType::Subtract | MovementType::Sale => {
            require_positive(movement_type, quantity)?;
            let Some(new_stock) = previous.checked_sub(quantity) else {
                return Err(LedgerError::InsufficientStock {
                    current_stock: previous,
                    requested: quantity,
                    shortage: quantity - previous,
                    minimum_stock,
                });
            };
            if new_stock < minimum_stock {
                return Err(LedgerError::InsufficientStock {
                    current_stock: previous,
                    requested: quantity,
                    shortage: minimum_stock - new_stock,
                    minimum_stock,
                });
            }
            Ok(new_stock)
        }
        MovementType::Set | MovementType::Adjustment => Ok(quantity),
    }
}

fn require_positive(movement_type: MovementType, quantity: u32) -> Result<(), LedgerError> {
    if quantity == 0 {
        return Err(LedgerError::InvalidOperation(format!(
            "{movement_type} requires a quantity greater than zero"
        )));
    }
    Ok(())
}
