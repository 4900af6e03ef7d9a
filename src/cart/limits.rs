//! Per-product topping limits.
//!
//! Products may cap the units of a single topping (`maxQuantity`) and the
//! total units of a topping type (`maxToppingsPerType`). The customisation
//! screen checks a selection here before adding it; the cart itself accepts
//! any selection.

use std::fmt;

use super::selection::{ToppingSelection, type_label};
use crate::models::Product;

/// Reason a selection exceeds the product's limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    ToppingLimit {
        kind: String,
        topping: String,
        quantity: i64,
        max: u32,
    },
    TypeLimit {
        kind: String,
        quantity: i64,
        max: u32,
    },
    Unavailable {
        kind: String,
        topping: String,
    },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToppingLimit { topping, max, .. } => {
                write!(f, "Máximo {max} {topping} permitidos")
            }
            Self::TypeLimit { kind, max, .. } => {
                write!(f, "Máximo {max} {} permitidos", type_label(kind).to_lowercase())
            }
            Self::Unavailable { topping, .. } => {
                write!(f, "{topping} no está disponible")
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Validates a selection against the product's topping limits.
///
/// Toppings missing from the catalog are not checked; they are priced at
/// zero by the cart.
pub fn check_selection(
    product: &Product,
    selection: &ToppingSelection,
) -> Result<(), SelectionError> {
    for (kind, id, qty) in selection.entries() {
        let Some(topping) = product.topping(kind, id) else {
            continue;
        };

        if !topping.available {
            return Err(SelectionError::Unavailable {
                kind: kind.to_string(),
                topping: id.to_string(),
            });
        }

        if let Some(max) = topping.max_quantity
            && qty > i64::from(max)
        {
            return Err(SelectionError::ToppingLimit {
                kind: kind.to_string(),
                topping: id.to_string(),
                quantity: qty,
                max,
            });
        }
    }

    for (kind, max) in &product.max_toppings_per_type {
        let quantity = selection.units_of_type(kind);
        if quantity > i64::from(*max) {
            return Err(SelectionError::TypeLimit {
                kind: kind.clone(),
                quantity,
                max: *max,
            });
        }
    }

    Ok(())
}
